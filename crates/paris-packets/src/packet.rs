//! Probe packets: a segment buffer interpreted through a protocol table.

use crate::protocol::Protocol;
use crate::protocols::ipv4::{self, IPV4};
use paris_core::{FieldError, FieldValue, Probe, TracerouteError};
use std::fmt;
use std::net::Ipv4Addr;

/// Default TTL stamped into freshly built IPv4 packets.
pub const DEFAULT_TTL: u8 = 64;

/// IANA protocol numbers used by the packets built here.
pub const IPPROTO_ICMP: u8 = 1;
pub const IPPROTO_UDP: u8 = 17;

/// An owned segment and the protocol describing it.
#[derive(Clone)]
pub struct Packet {
    protocol: &'static Protocol,
    segment: Vec<u8>,
}

impl Packet {
    /// Zero-filled packet of `protocol`'s header length.
    pub fn new(protocol: &'static Protocol) -> Self {
        Self {
            protocol,
            segment: vec![0u8; protocol.header_len],
        }
    }

    /// Wraps received bytes.
    pub fn from_bytes(protocol: &'static Protocol, bytes: Vec<u8>) -> Result<Self, FieldError> {
        if bytes.len() < protocol.header_len {
            return Err(FieldError::SegmentTooShort {
                key: protocol.name.to_string(),
                expected: protocol.header_len,
                actual: bytes.len(),
            });
        }
        Ok(Self {
            protocol,
            segment: bytes,
        })
    }

    /// IPv4 header carrying `protocol_number`, ready to be stamped.
    pub fn ipv4(src: Ipv4Addr, dst: Ipv4Addr, protocol_number: u8) -> Result<Self, FieldError> {
        let mut packet = Self::new(&IPV4);
        // The checksum needs IHL, so the first byte is stamped without a refresh.
        IPV4.set(&mut packet.segment, ipv4::VERSION, &FieldValue::Bits(4))?;
        IPV4.set(&mut packet.segment, ipv4::IHL, &FieldValue::Bits(5))?;
        packet.set(ipv4::LENGTH, FieldValue::U16(ipv4::IPV4_HEADER_LEN as u16))?;
        packet.set(ipv4::TTL, FieldValue::U8(DEFAULT_TTL))?;
        packet.set(ipv4::PROTOCOL, FieldValue::U8(protocol_number))?;
        packet.set(ipv4::SRC_IP, FieldValue::Ipv4Addr(src))?;
        packet.set(ipv4::DST_IP, FieldValue::Ipv4Addr(dst))?;
        Ok(packet)
    }

    /// ICMP answer sent by `from` back to the source of this packet.
    pub fn reply_from(&self, from: Ipv4Addr) -> Result<Self, FieldError> {
        let to = match self.get(ipv4::SRC_IP)? {
            FieldValue::Ipv4Addr(addr) => addr,
            other => {
                return Err(FieldError::TypeMismatch {
                    key: ipv4::SRC_IP.to_string(),
                    expected: paris_core::FieldType::Ipv4Addr,
                    actual: other.field_type(),
                })
            }
        };
        Self::ipv4(from, to, IPPROTO_ICMP)
    }

    pub fn protocol(&self) -> &'static Protocol {
        self.protocol
    }

    pub fn get(&self, key: &str) -> Result<FieldValue, FieldError> {
        self.protocol.get(&self.segment, key)
    }

    /// Writes a field, then refreshes the protocol checksum if it has one.
    ///
    /// A checksum that cannot be recomputed fails the write, so a stamped
    /// packet never carries a stale checksum.
    pub fn set(&mut self, key: &str, value: FieldValue) -> Result<(), FieldError> {
        self.protocol.set(&mut self.segment, key, &value)?;

        match self.protocol.checksum_key {
            Some(checksum) if checksum != key => {
                self.protocol
                    .set(&mut self.segment, checksum, &FieldValue::U16(0))
            }
            _ => Ok(()),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.segment
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.segment
    }
}

impl PartialEq for Packet {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.protocol, other.protocol) && self.segment == other.segment
    }
}

impl Eq for Packet {}

impl fmt::Debug for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct("Packet");
        out.field("protocol", &self.protocol.name);
        for key in self.protocol.keys() {
            match self.get(key) {
                Ok(value) => out.field(key, &format_args!("{}", value)),
                Err(_) => out.field(key, &"?"),
            };
        }
        out.finish()
    }
}

impl Probe for Packet {
    fn duplicate(&self) -> Result<Self, TracerouteError> {
        Ok(self.clone())
    }

    fn set_field(&mut self, key: &str, value: FieldValue) -> Result<(), FieldError> {
        self.set(key, value)
    }

    fn extract_field(&self, key: &str) -> Option<FieldValue> {
        self.get(key).ok()
    }
}
