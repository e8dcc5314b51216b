//! Core types for traceroute operations.

use crate::TracerouteError;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_MIN_TTL: u8 = 1;
pub const DEFAULT_MAX_TTL: u8 = 30;
pub const DEFAULT_NUM_PROBES: u32 = 3;

/// Number of consecutive all-star hops after which the algorithm gives up.
pub const MAX_UNDISCOVERED: u32 = 3;

/// Options of one traceroute instance.
///
/// Immutable for the lifetime of the instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TracerouteOptions {
    /// TTL of the first probed hop.
    pub min_ttl: u8,
    /// Last TTL that may be probed.
    pub max_ttl: u8,
    /// Probes sent per hop.
    pub num_probes: u32,
    /// Destination address, compared against reply sources.
    pub dst_ip: String,
}

impl Default for TracerouteOptions {
    fn default() -> Self {
        Self {
            min_ttl: DEFAULT_MIN_TTL,
            max_ttl: DEFAULT_MAX_TTL,
            num_probes: DEFAULT_NUM_PROBES,
            dst_ip: String::new(),
        }
    }
}

impl TracerouteOptions {
    /// Creates options toward `dst_ip` with default bounds.
    pub fn new(dst_ip: impl Into<String>) -> Self {
        Self {
            dst_ip: dst_ip.into(),
            ..Default::default()
        }
    }

    /// Validates the options.
    pub fn validate(&self) -> Result<(), TracerouteError> {
        if self.min_ttl > self.max_ttl {
            return Err(TracerouteError::InvalidTtlRange {
                min_ttl: self.min_ttl,
                max_ttl: self.max_ttl,
            });
        }
        if self.num_probes == 0 {
            return Err(TracerouteError::InvalidProbeCount(self.num_probes));
        }
        if self.dst_ip.is_empty() {
            return Err(TracerouteError::MissingDestination);
        }
        Ok(())
    }
}

/// How a successful exploration ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// A reply came from the destination.
    Succeeded,
    /// The TTL went past `max_ttl`.
    Exhausted,
    /// Too many consecutive hops answered with stars only.
    GivenUp,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Succeeded => write!(f, "succeeded"),
            Outcome::Exhausted => write!(f, "exhausted"),
            Outcome::GivenUp => write!(f, "given_up"),
        }
    }
}

/// Lifecycle state of a traceroute instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlgorithmState {
    #[default]
    Uninitialized,
    Exploring,
    Succeeded,
    Exhausted,
    GivenUp,
    Terminated,
    Failed,
}

impl AlgorithmState {
    /// True once the instance will not handle further events.
    pub fn is_finished(self) -> bool {
        matches!(self, AlgorithmState::Terminated | AlgorithmState::Failed)
    }
}

impl From<Outcome> for AlgorithmState {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Succeeded => AlgorithmState::Succeeded,
            Outcome::Exhausted => AlgorithmState::Exhausted,
            Outcome::GivenUp => AlgorithmState::GivenUp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_traceroute_options_validate() {
        let valid = TracerouteOptions::new("10.0.0.1");
        assert!(valid.validate().is_ok());

        let invalid = TracerouteOptions {
            min_ttl: 30,
            max_ttl: 1,
            ..TracerouteOptions::new("10.0.0.1")
        };
        assert_eq!(
            invalid.validate(),
            Err(TracerouteError::InvalidTtlRange {
                min_ttl: 30,
                max_ttl: 1
            })
        );

        let no_probes = TracerouteOptions {
            num_probes: 0,
            ..TracerouteOptions::new("10.0.0.1")
        };
        assert_eq!(
            no_probes.validate(),
            Err(TracerouteError::InvalidProbeCount(0))
        );

        assert_eq!(
            TracerouteOptions::default().validate(),
            Err(TracerouteError::MissingDestination)
        );
    }

    #[test]
    fn test_options_deserialize_defaults() {
        let options: TracerouteOptions =
            serde_json::from_str(r#"{"dst_ip": "8.8.8.8", "max_ttl": 12}"#).unwrap();
        assert_eq!(options.min_ttl, 1);
        assert_eq!(options.max_ttl, 12);
        assert_eq!(options.num_probes, 3);
    }

    #[test]
    fn test_finished_states() {
        assert!(AlgorithmState::Terminated.is_finished());
        assert!(AlgorithmState::Failed.is_finished());
        assert!(!AlgorithmState::Succeeded.is_finished());
        assert_eq!(AlgorithmState::from(Outcome::GivenUp), AlgorithmState::GivenUp);
    }
}
