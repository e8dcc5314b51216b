//! Built-in protocol tables.

pub mod ipv4;

pub use ipv4::IPV4;
