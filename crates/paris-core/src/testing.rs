//! In-memory probe used by the unit tests of this crate.

use crate::error::FieldError;
use crate::field::FieldValue;
use crate::traits::Probe;
use crate::TracerouteError;
use std::net::Ipv4Addr;

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct TestProbe {
    pub ttl: Option<u8>,
    pub src_ip: Option<Ipv4Addr>,
    pub fail_duplicate: bool,
    pub fail_set: bool,
}

impl TestProbe {
    pub fn reply_from(addr: &str) -> Self {
        Self {
            src_ip: Some(addr.parse().unwrap()),
            ..Default::default()
        }
    }
}

impl Probe for TestProbe {
    fn duplicate(&self) -> Result<Self, TracerouteError> {
        if self.fail_duplicate {
            return Err(TracerouteError::ProbeDuplication("out of memory".into()));
        }
        Ok(self.clone())
    }

    fn set_field(&mut self, key: &str, value: FieldValue) -> Result<(), FieldError> {
        if self.fail_set {
            return Err(FieldError::CodecRejected {
                key: key.to_string(),
                reason: "read-only".to_string(),
            });
        }
        match (key, value) {
            ("ttl", FieldValue::U8(ttl)) => {
                self.ttl = Some(ttl);
                Ok(())
            }
            _ => Err(FieldError::UnknownField(key.to_string())),
        }
    }

    fn extract_field(&self, key: &str) -> Option<FieldValue> {
        match key {
            "ttl" => self.ttl.map(FieldValue::U8),
            "src_ip" => self.src_ip.map(FieldValue::Ipv4Addr),
            _ => None,
        }
    }
}
