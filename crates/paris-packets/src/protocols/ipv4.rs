//! IPv4 header layout (RFC 791).

use crate::codec::{write_field, CustomCodec};
use crate::protocol::Protocol;
use crate::protocol_field::ProtocolField;
use paris_core::{FieldError, FieldType, FieldValue};

/// Length of an IPv4 header without options.
pub const IPV4_HEADER_LEN: usize = 20;

pub const VERSION: &str = "version";
pub const IHL: &str = "ihl";
pub const DSCP: &str = "dscp";
pub const ECN: &str = "ecn";
pub const LENGTH: &str = "length";
pub const IDENTIFICATION: &str = "identification";
pub const FLAGS: &str = "flags";
pub const FRAGMENT_OFFSET: &str = "fragment_offset";
pub const TTL: &str = "ttl";
pub const PROTOCOL: &str = "protocol";
pub const CHECKSUM: &str = "checksum";
pub const SRC_IP: &str = "src_ip";
pub const DST_IP: &str = "dst_ip";

/// Index of the checksum among the 16-bit words of the header.
const CHECKSUM_WORD: usize = 5;

static CHECKSUM_CODEC: CustomCodec = CustomCodec::setter(set_checksum);

static FIELDS: [ProtocolField; 13] = [
    ProtocolField::bits(VERSION, 0, 0, 4),
    ProtocolField::bits(IHL, 0, 4, 4),
    ProtocolField::bits(DSCP, 1, 0, 6),
    ProtocolField::bits(ECN, 1, 6, 2),
    ProtocolField::new(LENGTH, FieldType::U16, 2),
    ProtocolField::new(IDENTIFICATION, FieldType::U16, 4),
    ProtocolField::bits(FLAGS, 6, 0, 3),
    ProtocolField::bits(FRAGMENT_OFFSET, 6, 3, 13),
    ProtocolField::new(TTL, FieldType::U8, 8),
    ProtocolField::new(PROTOCOL, FieldType::U8, 9),
    ProtocolField::new(CHECKSUM, FieldType::U16, 10).with_codec(&CHECKSUM_CODEC),
    ProtocolField::new(SRC_IP, FieldType::Ipv4Addr, 12),
    ProtocolField::new(DST_IP, FieldType::Ipv4Addr, 16),
];

/// The IPv4 protocol table.
pub static IPV4: Protocol = Protocol {
    name: "ipv4",
    header_len: IPV4_HEADER_LEN,
    fields: &FIELDS,
    checksum_key: Some(CHECKSUM),
};

/// Writes the header checksum.
///
/// A value of 0 asks for the checksum to be computed over the header
/// length announced by the IHL field. Any other value is written as is.
fn set_checksum(
    field: &ProtocolField,
    segment: &mut [u8],
    value: &FieldValue,
) -> Result<(), FieldError> {
    if *value != FieldValue::U16(0) {
        return write_field(field, segment, value);
    }

    let header_len = match segment.first() {
        Some(first) => usize::from(first & 0x0f) * 4,
        None => 0,
    };
    if header_len < IPV4_HEADER_LEN {
        return Err(FieldError::CodecRejected {
            key: field.key.to_string(),
            reason: format!("invalid header length {}", header_len),
        });
    }
    if segment.len() < header_len {
        return Err(FieldError::SegmentTooShort {
            key: field.key.to_string(),
            expected: header_len,
            actual: segment.len(),
        });
    }

    let checksum = pnet_packet::util::checksum(&segment[..header_len], CHECKSUM_WORD);
    write_field(field, segment, &FieldValue::U16(checksum))
}
