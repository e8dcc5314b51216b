//! Bit-precise field codecs.
//!
//! Fields are addressed in network bit order: bit 0 is the most significant
//! bit of the byte at the field's byte offset. Byte-aligned fields whose
//! width is a multiple of 8 are copied as big-endian bytes. Every other
//! field goes through a read-modify-write of the bytes it spans, leaving
//! the surrounding bits untouched.

use crate::protocol_field::ProtocolField;
use paris_core::{FieldError, FieldType, FieldValue};
use std::fmt;

/// Decodes a field from a segment.
pub type GetFn = fn(&ProtocolField, &[u8]) -> Result<FieldValue, FieldError>;

/// Encodes a value into a segment.
pub type SetFn = fn(&ProtocolField, &mut [u8], &FieldValue) -> Result<(), FieldError>;

/// Strategy used by a descriptor to translate between values and bytes.
pub trait FieldCodec: Sync + fmt::Debug {
    fn get(&self, field: &ProtocolField, segment: &[u8]) -> Result<FieldValue, FieldError>;

    fn set(
        &self,
        field: &ProtocolField,
        segment: &mut [u8],
        value: &FieldValue,
    ) -> Result<(), FieldError>;
}

/// Big-endian, bit-precise codec used by most descriptors.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultCodec;

impl FieldCodec for DefaultCodec {
    fn get(&self, field: &ProtocolField, segment: &[u8]) -> Result<FieldValue, FieldError> {
        read_field(field, segment)
    }

    fn set(
        &self,
        field: &ProtocolField,
        segment: &mut [u8],
        value: &FieldValue,
    ) -> Result<(), FieldError> {
        write_field(field, segment, value)
    }
}

/// Codec built from user callbacks.
///
/// A missing callback falls back to [`DefaultCodec`].
#[derive(Clone, Copy)]
pub struct CustomCodec {
    get: Option<GetFn>,
    set: Option<SetFn>,
}

impl CustomCodec {
    pub const fn new(get: Option<GetFn>, set: Option<SetFn>) -> Self {
        Self { get, set }
    }

    pub const fn getter(get: GetFn) -> Self {
        Self::new(Some(get), None)
    }

    pub const fn setter(set: SetFn) -> Self {
        Self::new(None, Some(set))
    }
}

impl fmt::Debug for CustomCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomCodec")
            .field("get", &self.get.is_some())
            .field("set", &self.set.is_some())
            .finish()
    }
}

impl FieldCodec for CustomCodec {
    fn get(&self, field: &ProtocolField, segment: &[u8]) -> Result<FieldValue, FieldError> {
        match self.get {
            Some(get) => get(field, segment),
            None => read_field(field, segment),
        }
    }

    fn set(
        &self,
        field: &ProtocolField,
        segment: &mut [u8],
        value: &FieldValue,
    ) -> Result<(), FieldError> {
        match self.set {
            Some(set) => set(field, segment, value),
            None => write_field(field, segment, value),
        }
    }
}

/// Reads `field` from `segment` with the default rules.
pub fn read_field(field: &ProtocolField, segment: &[u8]) -> Result<FieldValue, FieldError> {
    let layout = Layout::of(field, segment.len())?;
    let window = &segment[layout.start..layout.end];

    let bits = if layout.is_aligned() {
        load(window)
    } else {
        (load(window) >> layout.shift) & mask(layout.width)
    };
    Ok(FieldValue::from_bits(field.field_type, bits))
}

/// Writes `value` into the bytes of `segment` covered by `field`.
///
/// Fails without touching `segment` on a type mismatch, a value wider than
/// the field or a segment too short to hold it.
pub fn write_field(
    field: &ProtocolField,
    segment: &mut [u8],
    value: &FieldValue,
) -> Result<(), FieldError> {
    if value.field_type() != field.field_type {
        return Err(FieldError::TypeMismatch {
            key: field.key.to_string(),
            expected: field.field_type,
            actual: value.field_type(),
        });
    }

    let layout = Layout::of(field, segment.len())?;
    let bits = value.to_bits();
    if bits & !mask(layout.width) != 0 {
        return Err(FieldError::ValueOutOfRange {
            key: field.key.to_string(),
            value: bits,
            width: layout.width,
        });
    }

    let window = &mut segment[layout.start..layout.end];
    if layout.is_aligned() {
        store(window, bits);
    } else {
        let field_mask = mask(layout.width) << layout.shift;
        let merged = (load(window) & !field_mask) | (bits << layout.shift);
        store(window, merged);
    }
    Ok(())
}

/// Byte window and bit position of a field inside a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Layout {
    start: usize,
    end: usize,
    width: usize,
    shift: usize,
}

impl Layout {
    fn of(field: &ProtocolField, segment_len: usize) -> Result<Self, FieldError> {
        let width = field.size_in_bits();
        let bit_offset = usize::from(field.offset_in_bits);
        let invalid = |reason: &str| FieldError::InvalidDescriptor {
            key: field.key.to_string(),
            reason: reason.to_string(),
        };

        if width == 0 {
            return Err(invalid("zero width"));
        }
        if bit_offset >= 8 {
            return Err(invalid("bit offset must be below 8"));
        }
        if bit_offset + width > 128 {
            return Err(invalid("field spans more than 128 bits"));
        }
        let max_width = match field.field_type {
            FieldType::Bits => 64,
            other => other.natural_bits(),
        };
        if width > max_width {
            return Err(invalid("width exceeds the field type"));
        }

        let span = (bit_offset + width).div_ceil(8);
        let start = field.offset();
        let end = start + span;
        if segment_len < end {
            return Err(FieldError::SegmentTooShort {
                key: field.key.to_string(),
                expected: end,
                actual: segment_len,
            });
        }

        Ok(Self {
            start,
            end,
            width,
            shift: span * 8 - bit_offset - width,
        })
    }

    fn is_aligned(&self) -> bool {
        self.shift == 0 && self.width % 8 == 0 && (self.end - self.start) * 8 == self.width
    }
}

fn mask(width: usize) -> u128 {
    if width >= 128 {
        u128::MAX
    } else {
        (1u128 << width) - 1
    }
}

fn load(window: &[u8]) -> u128 {
    window
        .iter()
        .fold(0u128, |acc, byte| (acc << 8) | u128::from(*byte))
}

fn store(window: &mut [u8], bits: u128) {
    let bytes = bits.to_be_bytes();
    let len = window.len();
    window.copy_from_slice(&bytes[bytes.len() - len..]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    const TTL: ProtocolField = ProtocolField::new("ttl", FieldType::U8, 1);
    const PORT: ProtocolField = ProtocolField::new("port", FieldType::U16, 2);
    const LOW_NIBBLE: ProtocolField = ProtocolField::bits("low", 0, 4, 4);
    const HIGH_NIBBLE: ProtocolField = ProtocolField::bits("high", 0, 0, 4);
    const STRADDLE: ProtocolField = ProtocolField::bits("frag", 0, 3, 13);

    #[test]
    fn test_aligned_write_is_big_endian() {
        let mut segment = [0u8; 4];
        write_field(&PORT, &mut segment, &FieldValue::U16(0x1234)).unwrap();
        assert_eq!(segment, [0x00, 0x00, 0x12, 0x34]);
        assert_eq!(read_field(&PORT, &segment).unwrap(), FieldValue::U16(0x1234));
    }

    #[test]
    fn test_aligned_integers_keep_surrounding_bytes() {
        const SENTINEL: u8 = 0xEE;
        let cases = [
            (
                ProtocolField::new("u8", FieldType::U8, 3),
                FieldValue::U8(0),
                FieldValue::U8(u8::MAX),
            ),
            (
                ProtocolField::new("u16", FieldType::U16, 3),
                FieldValue::U16(0),
                FieldValue::U16(u16::MAX),
            ),
            (
                ProtocolField::new("u32", FieldType::U32, 3),
                FieldValue::U32(0),
                FieldValue::U32(u32::MAX),
            ),
            (
                ProtocolField::new("u64", FieldType::U64, 3),
                FieldValue::U64(0),
                FieldValue::U64(u64::MAX),
            ),
        ];

        for (field, zero, max) in cases {
            let end = 3 + field.size_in_bytes();
            for value in [zero, max] {
                let mut segment = [SENTINEL; 16];
                write_field(&field, &mut segment, &value).unwrap();
                assert_eq!(read_field(&field, &segment).unwrap(), value, "{}", field.key);
                assert!(segment[..3].iter().all(|b| *b == SENTINEL), "{}", field.key);
                assert!(segment[end..].iter().all(|b| *b == SENTINEL), "{}", field.key);
            }
        }
    }

    #[test]
    fn test_aligned_u32_and_u64_layout() {
        let word = ProtocolField::new("word", FieldType::U32, 1);
        let quad = ProtocolField::new("quad", FieldType::U64, 5);
        let mut segment = [0u8; 14];

        write_field(&word, &mut segment, &FieldValue::U32(0x0102_0304)).unwrap();
        write_field(&quad, &mut segment, &FieldValue::U64(0x1122_3344_5566_7788)).unwrap();
        assert_eq!(
            segment,
            [0x00, 0x01, 0x02, 0x03, 0x04, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88, 0x00]
        );
        assert_eq!(read_field(&word, &segment).unwrap(), FieldValue::U32(0x0102_0304));
        assert_eq!(
            read_field(&quad, &segment).unwrap(),
            FieldValue::U64(0x1122_3344_5566_7788)
        );
    }

    #[test]
    fn test_low_nibble_preserves_high_nibble() {
        let mut segment = [0xA0u8];
        write_field(&LOW_NIBBLE, &mut segment, &FieldValue::Bits(0x5)).unwrap();
        assert_eq!(segment, [0xA5]);
        assert_eq!(read_field(&HIGH_NIBBLE, &segment).unwrap(), FieldValue::Bits(0xA));
        assert_eq!(read_field(&LOW_NIBBLE, &segment).unwrap(), FieldValue::Bits(0x5));
    }

    #[test]
    fn test_straddling_field_keeps_neighbours() {
        let mut segment = [0xFFu8, 0xFF];
        write_field(&STRADDLE, &mut segment, &FieldValue::Bits(0)).unwrap();
        assert_eq!(segment, [0xE0, 0x00]);

        write_field(&STRADDLE, &mut segment, &FieldValue::Bits(0x1ABC)).unwrap();
        assert_eq!(segment, [0xFA, 0xBC]);
        assert_eq!(read_field(&STRADDLE, &segment).unwrap(), FieldValue::Bits(0x1ABC));
    }

    #[test]
    fn test_type_mismatch_leaves_segment() {
        let mut segment = [0x11u8; 4];
        let err = write_field(&TTL, &mut segment, &FieldValue::U16(1)).unwrap_err();
        assert_eq!(
            err,
            FieldError::TypeMismatch {
                key: "ttl".to_string(),
                expected: FieldType::U8,
                actual: FieldType::U16,
            }
        );
        assert_eq!(segment, [0x11; 4]);
    }

    #[test]
    fn test_value_wider_than_field() {
        let mut segment = [0u8];
        let err = write_field(&LOW_NIBBLE, &mut segment, &FieldValue::Bits(0x10)).unwrap_err();
        assert!(matches!(err, FieldError::ValueOutOfRange { width: 4, .. }));
        assert_eq!(segment, [0]);
    }

    #[test]
    fn test_short_segment() {
        let mut segment = [0u8; 3];
        let err = write_field(&PORT, &mut segment, &FieldValue::U16(7)).unwrap_err();
        assert_eq!(
            err,
            FieldError::SegmentTooShort {
                key: "port".to_string(),
                expected: 4,
                actual: 3,
            }
        );
        assert!(read_field(&PORT, &segment).is_err());
    }

    #[test]
    fn test_invalid_descriptors() {
        let segment = [0u8; 16];
        let zero = ProtocolField::bits("zero", 0, 0, 0);
        let far = ProtocolField::bits("far", 0, 8, 4);
        let wide = ProtocolField::new("wide", FieldType::U8, 0).with_width(12);

        for field in [zero, far, wide] {
            assert!(matches!(
                read_field(&field, &segment),
                Err(FieldError::InvalidDescriptor { .. })
            ));
        }
    }

    #[test]
    fn test_address_round_trip() {
        let field = ProtocolField::new("src_ip", FieldType::Ipv4Addr, 0);
        let mut segment = [0u8; 4];
        let addr = Ipv4Addr::new(192, 0, 2, 1);
        write_field(&field, &mut segment, &FieldValue::Ipv4Addr(addr)).unwrap();
        assert_eq!(segment, [192, 0, 2, 1]);
        assert_eq!(read_field(&field, &segment).unwrap(), FieldValue::Ipv4Addr(addr));
    }

    fn always_seven(_: &ProtocolField, _: &[u8]) -> Result<FieldValue, FieldError> {
        Ok(FieldValue::U8(7))
    }

    fn read_only(field: &ProtocolField, _: &mut [u8], _: &FieldValue) -> Result<(), FieldError> {
        Err(FieldError::CodecRejected {
            key: field.key.to_string(),
            reason: "read-only".to_string(),
        })
    }

    #[test]
    fn test_custom_getter_falls_back_for_set() {
        static SEVEN: CustomCodec = CustomCodec::getter(always_seven);
        let field = ProtocolField::new("ttl", FieldType::U8, 0).with_codec(&SEVEN);

        let mut segment = [0u8];
        field.set(&mut segment, &FieldValue::U8(42)).unwrap();
        assert_eq!(segment, [42]);
        assert_eq!(field.get(&segment).unwrap(), FieldValue::U8(7));
    }

    #[test]
    fn test_custom_setter_overrides_default() {
        static READ_ONLY: CustomCodec = CustomCodec::setter(read_only);
        let field = ProtocolField::new("ttl", FieldType::U8, 0).with_codec(&READ_ONLY);

        let mut segment = [9u8];
        assert!(matches!(
            field.set(&mut segment, &FieldValue::U8(1)),
            Err(FieldError::CodecRejected { .. })
        ));
        assert_eq!(field.get(&segment).unwrap(), FieldValue::U8(9));
    }
}
