//! Core types, traits, and the traceroute state machine for paris-traceroute.
//!
//! This crate provides:
//!
//! - [`Traceroute`], the event-driven algorithm deciding which hop to probe
//!   next and when to stop
//! - [`Probe`] and [`AlgorithmContext`], the seams to the probe and event
//!   loop collaborators
//! - [`FieldValue`] and [`FieldType`], the typed values stamped into probes
//! - [`TracerouteError`] for error handling
//! - An [`execution::EventLoop`] running an instance on tokio
//! - Result types for traceroute output

pub mod algorithm;
pub mod error;
pub mod event;
pub mod execution;
pub mod field;
pub mod lifecycle;
pub mod result;
pub mod traits;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use algorithm::{send_traceroute_probe, send_traceroute_probes, Traceroute, SRC_IP_FIELD, TTL_FIELD};
pub use error::{ErrorKind, FieldError, TracerouteError, TracerouteResult};
pub use event::{Event, ProbeReply, TracerouteEvent, TracerouteEventKind};
pub use field::{FieldType, FieldValue};
pub use lifecycle::ProbeLifecycleData;
pub use result::{HopReply, RunCollector, TracerouteHop, TracerouteRun};
pub use traits::{AlgorithmContext, Probe};
pub use types::{
    AlgorithmState, Outcome, TracerouteOptions, DEFAULT_MAX_TTL, DEFAULT_MIN_TTL,
    DEFAULT_NUM_PROBES, MAX_UNDISCOVERED,
};
