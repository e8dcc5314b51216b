//! Collaborator traits seen by the traceroute state machine.

use crate::error::FieldError;
use crate::field::FieldValue;
use crate::{TracerouteError, TracerouteEvent};

/// A probe packet whose fields can be stamped and inspected by key.
pub trait Probe: Sized {
    /// Returns an independent copy of this probe.
    fn duplicate(&self) -> Result<Self, TracerouteError>;

    /// Writes `value` into the field named `key`.
    fn set_field(&mut self, key: &str, value: FieldValue) -> Result<(), FieldError>;

    /// Reads the field named `key`, if present and decodable.
    fn extract_field(&self, key: &str) -> Option<FieldValue>;
}

/// The event loop as seen from inside an event handler.
///
/// Every method returns without blocking; notifications and raised events
/// are queued and delivered after the handler returns.
pub trait AlgorithmContext<P> {
    /// Hands a probe to the transmission collaborator.
    fn send_probe(&mut self, probe: &P) -> Result<(), TracerouteError>;

    /// Emits a notification produced by the algorithm itself.
    fn raise_event(&mut self, event: TracerouteEvent<P>);

    /// Forwards a handled event to the caller.
    fn forward_to_caller(&mut self, event: TracerouteEvent<P>);

    /// Schedules ALGORITHM_TERMINATED for the current instance.
    fn raise_terminated(&mut self);

    /// Schedules ALGORITHM_ERROR for the current instance.
    fn raise_error(&mut self, error: TracerouteError);
}
