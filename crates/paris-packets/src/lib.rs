//! Protocol field descriptors and segment codecs for paris-traceroute.
//!
//! A [`Protocol`] is a static table of [`ProtocolField`] descriptors. Each
//! descriptor reads and writes its field through a [`FieldCodec`], either
//! the bit-precise [`DefaultCodec`] or a [`CustomCodec`] built from
//! callbacks. [`Packet`] ties a segment buffer to a protocol and is the
//! probe type driven by the traceroute core.

pub mod codec;
pub mod packet;
pub mod protocol;
pub mod protocol_field;
pub mod protocols;

pub use codec::{read_field, write_field, CustomCodec, DefaultCodec, FieldCodec, GetFn, SetFn};
pub use packet::{Packet, DEFAULT_TTL, IPPROTO_ICMP, IPPROTO_UDP};
pub use protocol::Protocol;
pub use protocol_field::ProtocolField;
pub use protocols::IPV4;
