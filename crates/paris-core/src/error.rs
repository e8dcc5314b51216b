//! Error types for traceroute operations.

use crate::field::FieldType;
use thiserror::Error;

/// Error raised while reading or writing a protocol field.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    #[error("Unknown field '{0}'")]
    UnknownField(String),

    #[error("Type mismatch on field '{key}': expected {expected}, got {actual}")]
    TypeMismatch {
        key: String,
        expected: FieldType,
        actual: FieldType,
    },

    #[error("Value {value:#x} does not fit in the {width}-bit field '{key}'")]
    ValueOutOfRange { key: String, value: u128, width: usize },

    #[error("Segment too short for field '{key}': expected at least {expected} bytes, got {actual}")]
    SegmentTooShort {
        key: String,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid descriptor for field '{key}': {reason}")]
    InvalidDescriptor { key: String, reason: String },

    #[error("Duplicate field key '{0}'")]
    DuplicateKey(String),

    #[error("Codec rejected field '{key}': {reason}")]
    CodecRejected { key: String, reason: String },
}

/// Coarse classification of a [`TracerouteError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Invalid options, reported at INIT and never retried.
    Configuration,
    /// A probe or the instance state could not be allocated.
    Allocation,
    /// A field could not be stamped into a probe.
    FieldCodec,
    /// The transmission collaborator refused a probe.
    Transmission,
    /// Misuse of the event protocol or a failure of the loop itself.
    Internal,
}

/// Main error type for traceroute operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TracerouteError {
    // Configuration errors
    #[error("Invalid TTL range: min={min_ttl}, max={max_ttl}")]
    InvalidTtlRange { min_ttl: u8, max_ttl: u8 },

    #[error("Invalid number of probes per hop: {0}")]
    InvalidProbeCount(u32),

    #[error("No destination address configured")]
    MissingDestination,

    // Allocation errors
    #[error("Failed to duplicate probe: {0}")]
    ProbeDuplication(String),

    // Codec errors
    #[error("Failed to stamp probe field: {0}")]
    Field(#[from] FieldError),

    // Transmission errors
    #[error("Failed to send probe: {0}")]
    TransmissionFailed(String),

    // Event protocol errors
    #[error("Received {0} before the instance was initialized")]
    NotInitialized(&'static str),

    #[error("Instance already initialized")]
    AlreadyInitialized,

    #[error("Event source closed while exploring")]
    EventSourceClosed,

    #[error("Algorithm error: {0}")]
    Algorithm(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl TracerouteError {
    /// Returns the taxonomy bucket this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidTtlRange { .. }
            | Self::InvalidProbeCount(_)
            | Self::MissingDestination => ErrorKind::Configuration,
            Self::ProbeDuplication(_) => ErrorKind::Allocation,
            Self::Field(_) => ErrorKind::FieldCodec,
            Self::TransmissionFailed(_) => ErrorKind::Transmission,
            Self::NotInitialized(_)
            | Self::AlreadyInitialized
            | Self::EventSourceClosed
            | Self::Algorithm(_)
            | Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Returns true if this error was caused by the caller's options.
    pub fn is_configuration(&self) -> bool {
        self.kind() == ErrorKind::Configuration
    }
}

/// Result type alias for traceroute operations.
pub type TracerouteResult<T> = Result<T, TracerouteError>;
