//! Protocols as tables of field descriptors.

use crate::protocol_field::ProtocolField;
use paris_core::{FieldError, FieldValue};
use std::collections::HashSet;
use tracing::trace;

/// A header layout: a fixed-length segment and its named fields.
#[derive(Debug)]
pub struct Protocol {
    pub name: &'static str,
    /// Minimum length of a segment of this protocol.
    pub header_len: usize,
    pub fields: &'static [ProtocolField],
    /// Field recomputed after every other field write, if any.
    pub checksum_key: Option<&'static str>,
}

impl Protocol {
    /// Looks up the descriptor named `key`.
    pub fn field(&self, key: &str) -> Result<&ProtocolField, FieldError> {
        self.fields
            .iter()
            .find(|f| f.key == key)
            .ok_or_else(|| FieldError::UnknownField(key.to_string()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|f| f.key)
    }

    pub fn get(&self, segment: &[u8], key: &str) -> Result<FieldValue, FieldError> {
        self.field(key)?.get(segment)
    }

    pub fn set(&self, segment: &mut [u8], key: &str, value: &FieldValue) -> Result<(), FieldError> {
        let field = self.field(key)?;
        trace!(protocol = self.name, field = %field, value = %value, "Setting field");
        field.set(segment, value)
    }

    /// Checks key uniqueness and that every field fits in the header.
    pub fn validate(&self) -> Result<(), FieldError> {
        let mut seen = HashSet::new();
        for field in self.fields {
            if !seen.insert(field.key) {
                return Err(FieldError::DuplicateKey(field.key.to_string()));
            }
            if field.size_in_bits() == 0 {
                return Err(FieldError::InvalidDescriptor {
                    key: field.key.to_string(),
                    reason: "zero width".to_string(),
                });
            }
            if field.end() > self.header_len {
                return Err(FieldError::InvalidDescriptor {
                    key: field.key.to_string(),
                    reason: format!("extends past the {}-byte header", self.header_len),
                });
            }
        }
        if let Some(key) = self.checksum_key {
            self.field(key)?;
        }
        Ok(())
    }
}
