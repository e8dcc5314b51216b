//! Execution of a traceroute instance on top of tokio.
//!
//! Provides the event loop and the transport plumbing it sends probes through.

pub mod event_loop;
pub mod transport;

pub use event_loop::EventLoop;
pub use transport::{event_channel, spawn_transport, EventSender, ProbeSink, ProbeTransmitter};
