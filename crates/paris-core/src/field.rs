//! Typed values carried by protocol fields.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Wire type of a protocol field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    U8,
    U16,
    U32,
    U64,
    /// Bit-field whose width is given by the descriptor.
    Bits,
    Ipv4Addr,
    Ipv6Addr,
}

impl FieldType {
    /// Width in bits implied by the type alone.
    ///
    /// Returns 0 for [`FieldType::Bits`], which has no natural width.
    pub const fn natural_bits(self) -> usize {
        match self {
            FieldType::U8 => 8,
            FieldType::U16 => 16,
            FieldType::U32 => 32,
            FieldType::U64 => 64,
            FieldType::Bits => 0,
            FieldType::Ipv4Addr => 32,
            FieldType::Ipv6Addr => 128,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::U8 => write!(f, "u8"),
            FieldType::U16 => write!(f, "u16"),
            FieldType::U32 => write!(f, "u32"),
            FieldType::U64 => write!(f, "u64"),
            FieldType::Bits => write!(f, "bits"),
            FieldType::Ipv4Addr => write!(f, "ipv4"),
            FieldType::Ipv6Addr => write!(f, "ipv6"),
        }
    }
}

/// A typed value read from or written to a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldValue {
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    Bits(u64),
    Ipv4Addr(Ipv4Addr),
    Ipv6Addr(Ipv6Addr),
}

impl FieldValue {
    pub fn field_type(&self) -> FieldType {
        match self {
            FieldValue::U8(_) => FieldType::U8,
            FieldValue::U16(_) => FieldType::U16,
            FieldValue::U32(_) => FieldType::U32,
            FieldValue::U64(_) => FieldType::U64,
            FieldValue::Bits(_) => FieldType::Bits,
            FieldValue::Ipv4Addr(_) => FieldType::Ipv4Addr,
            FieldValue::Ipv6Addr(_) => FieldType::Ipv6Addr,
        }
    }

    /// Raw bit pattern of the value, right-aligned.
    pub fn to_bits(&self) -> u128 {
        match *self {
            FieldValue::U8(v) => u128::from(v),
            FieldValue::U16(v) => u128::from(v),
            FieldValue::U32(v) => u128::from(v),
            FieldValue::U64(v) | FieldValue::Bits(v) => u128::from(v),
            FieldValue::Ipv4Addr(addr) => u128::from(u32::from(addr)),
            FieldValue::Ipv6Addr(addr) => u128::from(addr),
        }
    }

    /// Builds a value of `field_type` from a right-aligned bit pattern.
    ///
    /// Bits above the natural width of the type are discarded.
    pub fn from_bits(field_type: FieldType, bits: u128) -> Self {
        match field_type {
            FieldType::U8 => FieldValue::U8(bits as u8),
            FieldType::U16 => FieldValue::U16(bits as u16),
            FieldType::U32 => FieldValue::U32(bits as u32),
            FieldType::U64 => FieldValue::U64(bits as u64),
            FieldType::Bits => FieldValue::Bits(bits as u64),
            FieldType::Ipv4Addr => FieldValue::Ipv4Addr(Ipv4Addr::from(bits as u32)),
            FieldType::Ipv6Addr => FieldValue::Ipv6Addr(Ipv6Addr::from(bits)),
        }
    }

    /// Returns the integer payload, if this is an integer or bit-field value.
    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            FieldValue::U8(v) => Some(u64::from(v)),
            FieldValue::U16(v) => Some(u64::from(v)),
            FieldValue::U32(v) => Some(u64::from(v)),
            FieldValue::U64(v) | FieldValue::Bits(v) => Some(v),
            FieldValue::Ipv4Addr(_) | FieldValue::Ipv6Addr(_) => None,
        }
    }

    /// Returns the address payload, if this is an address value.
    pub fn as_ip(&self) -> Option<IpAddr> {
        match *self {
            FieldValue::Ipv4Addr(addr) => Some(IpAddr::V4(addr)),
            FieldValue::Ipv6Addr(addr) => Some(IpAddr::V6(addr)),
            _ => None,
        }
    }

    /// Checks whether this address value designates `addr`.
    ///
    /// `addr` is compared as an IP address when it parses as one, and
    /// textually otherwise.
    pub fn matches_address(&self, addr: &str) -> bool {
        let Some(ip) = self.as_ip() else {
            return false;
        };
        match addr.parse::<IpAddr>() {
            Ok(expected) => ip == expected,
            Err(_) => ip.to_string() == addr,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::U8(v) => write!(f, "{}", v),
            FieldValue::U16(v) => write!(f, "{}", v),
            FieldValue::U32(v) => write!(f, "{}", v),
            FieldValue::U64(v) => write!(f, "{}", v),
            FieldValue::Bits(v) => write!(f, "{:#b}", v),
            FieldValue::Ipv4Addr(addr) => write!(f, "{}", addr),
            FieldValue::Ipv6Addr(addr) => write!(f, "{}", addr),
        }
    }
}

impl From<u8> for FieldValue {
    fn from(v: u8) -> Self {
        FieldValue::U8(v)
    }
}

impl From<u16> for FieldValue {
    fn from(v: u16) -> Self {
        FieldValue::U16(v)
    }
}

impl From<u32> for FieldValue {
    fn from(v: u32) -> Self {
        FieldValue::U32(v)
    }
}

impl From<u64> for FieldValue {
    fn from(v: u64) -> Self {
        FieldValue::U64(v)
    }
}

impl From<Ipv4Addr> for FieldValue {
    fn from(addr: Ipv4Addr) -> Self {
        FieldValue::Ipv4Addr(addr)
    }
}

impl From<Ipv6Addr> for FieldValue {
    fn from(addr: Ipv6Addr) -> Self {
        FieldValue::Ipv6Addr(addr)
    }
}

impl From<IpAddr> for FieldValue {
    fn from(addr: IpAddr) -> Self {
        match addr {
            IpAddr::V4(v4) => FieldValue::Ipv4Addr(v4),
            IpAddr::V6(v6) => FieldValue::Ipv6Addr(v6),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_natural_bits() {
        assert_eq!(FieldType::U8.natural_bits(), 8);
        assert_eq!(FieldType::U16.natural_bits(), 16);
        assert_eq!(FieldType::Ipv4Addr.natural_bits(), 32);
        assert_eq!(FieldType::Ipv6Addr.natural_bits(), 128);
        assert_eq!(FieldType::Bits.natural_bits(), 0);
    }

    #[test]
    fn test_bits_conversion() {
        let addr: Ipv4Addr = "10.1.2.3".parse().unwrap();
        let value = FieldValue::from(addr);
        assert_eq!(value.to_bits(), 0x0a01_0203);
        assert_eq!(FieldValue::from_bits(FieldType::Ipv4Addr, 0x0a01_0203), value);

        let v6: Ipv6Addr = "2001:db8::1".parse().unwrap();
        let value = FieldValue::from(v6);
        assert_eq!(FieldValue::from_bits(FieldType::Ipv6Addr, value.to_bits()), value);

        assert_eq!(FieldValue::from_bits(FieldType::U8, 0x1ff), FieldValue::U8(0xff));
    }

    #[test]
    fn test_matches_address() {
        let value = FieldValue::Ipv4Addr(Ipv4Addr::new(8, 8, 8, 8));
        assert!(value.matches_address("8.8.8.8"));
        assert!(!value.matches_address("8.8.4.4"));
        assert!(!value.matches_address("dns.google"));
        assert!(!FieldValue::U8(8).matches_address("8.8.8.8"));

        let v6 = FieldValue::Ipv6Addr("2001:db8::1".parse().unwrap());
        assert!(v6.matches_address("2001:0db8:0000::0001"));
    }
}
