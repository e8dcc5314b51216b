//! Static descriptors of protocol header fields.

use crate::codec::{DefaultCodec, FieldCodec};
use paris_core::{FieldError, FieldType, FieldValue};
use std::fmt;

const DEFAULT_CODEC: &DefaultCodec = &DefaultCodec;

/// Where a named field lives inside a segment and how to encode it.
#[derive(Debug, Clone, Copy)]
pub struct ProtocolField {
    /// Identifying key, unique within a protocol.
    pub key: &'static str,
    pub field_type: FieldType,
    /// Offset in bytes from the start of the segment.
    pub offset: usize,
    /// Additional offset in bits from the most significant bit of `offset`.
    pub offset_in_bits: u8,
    /// Width in bits, 0 for the natural width of `field_type`.
    pub size_in_bits: usize,
    codec: &'static dyn FieldCodec,
}

impl ProtocolField {
    /// Byte-aligned field of natural width.
    pub const fn new(key: &'static str, field_type: FieldType, offset: usize) -> Self {
        Self {
            key,
            field_type,
            offset,
            offset_in_bits: 0,
            size_in_bits: 0,
            codec: DEFAULT_CODEC,
        }
    }

    /// Bit-field of `size_in_bits` bits starting `offset_in_bits` bits into
    /// the byte at `offset`.
    pub const fn bits(
        key: &'static str,
        offset: usize,
        offset_in_bits: u8,
        size_in_bits: usize,
    ) -> Self {
        Self {
            key,
            field_type: FieldType::Bits,
            offset,
            offset_in_bits,
            size_in_bits,
            codec: DEFAULT_CODEC,
        }
    }

    pub const fn with_width(mut self, size_in_bits: usize) -> Self {
        self.size_in_bits = size_in_bits;
        self
    }

    /// Replaces the default codec.
    pub const fn with_codec(mut self, codec: &'static dyn FieldCodec) -> Self {
        self.codec = codec;
        self
    }

    /// Width of the field in bits.
    pub fn size_in_bits(&self) -> usize {
        if self.size_in_bits != 0 {
            self.size_in_bits
        } else {
            self.field_type.natural_bits()
        }
    }

    /// Width of the field rounded up to whole bytes.
    pub fn size_in_bytes(&self) -> usize {
        self.size_in_bits().div_ceil(8)
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn is_byte_aligned(&self) -> bool {
        self.offset_in_bits == 0 && self.size_in_bits() % 8 == 0
    }

    /// One past the last byte touched by the field.
    pub fn end(&self) -> usize {
        self.offset + (usize::from(self.offset_in_bits) + self.size_in_bits()).div_ceil(8)
    }

    /// Decodes the field from `segment`.
    pub fn get(&self, segment: &[u8]) -> Result<FieldValue, FieldError> {
        self.codec.get(self, segment)
    }

    /// Encodes `value` into `segment`.
    pub fn set(&self, segment: &mut [u8], value: &FieldValue) -> Result<(), FieldError> {
        self.codec.set(self, segment, value)
    }
}

impl fmt::Display for ProtocolField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}, offset {}",
            self.key,
            self.field_type,
            self.offset
        )?;
        if !self.is_byte_aligned() {
            write!(f, "+{}b, {} bits", self.offset_in_bits, self.size_in_bits())?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sizes() {
        let ttl = ProtocolField::new("ttl", FieldType::U8, 8);
        assert_eq!(ttl.size_in_bits(), 8);
        assert_eq!(ttl.size_in_bytes(), 1);
        assert_eq!(ttl.offset(), 8);
        assert!(ttl.is_byte_aligned());

        let addr = ProtocolField::new("dst", FieldType::Ipv6Addr, 24);
        assert_eq!(addr.size_in_bits(), 128);
        assert_eq!(addr.size_in_bytes(), 16);

        let flags = ProtocolField::bits("flags", 6, 0, 3);
        assert_eq!(flags.size_in_bits(), 3);
        assert_eq!(flags.size_in_bytes(), 1);
        assert!(!flags.is_byte_aligned());

        let frag = ProtocolField::bits("frag", 6, 3, 13);
        assert_eq!(frag.size_in_bytes(), 2);
        assert_eq!(frag.end(), 8);
    }

    #[test]
    fn test_explicit_width_overrides_type() {
        let short = ProtocolField::new("len", FieldType::U16, 0).with_width(12);
        assert_eq!(short.size_in_bits(), 12);
        assert_eq!(short.size_in_bytes(), 2);
        assert!(!short.is_byte_aligned());
    }

    #[test]
    fn test_display() {
        assert_eq!(
            ProtocolField::new("ttl", FieldType::U8, 8).to_string(),
            "ttl (u8, offset 8)"
        );
        assert_eq!(
            ProtocolField::bits("ihl", 0, 4, 4).to_string(),
            "ihl (bits, offset 0+4b, 4 bits)"
        );
    }
}
