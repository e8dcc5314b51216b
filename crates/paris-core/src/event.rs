//! Events consumed and emitted by a traceroute instance.

use crate::TracerouteError;
use std::fmt;

/// A probe paired with the reply it triggered.
#[derive(Debug, Clone)]
pub struct ProbeReply<P> {
    pub probe: P,
    pub reply: P,
}

/// Events delivered to a traceroute instance by the event loop.
#[derive(Debug)]
pub enum Event<P> {
    Init,
    ProbeReply(ProbeReply<P>),
    ProbeTimeout(P),
    AlgorithmTerminated,
    AlgorithmError(TracerouteError),
}

impl<P> Event<P> {
    pub fn name(&self) -> &'static str {
        match self {
            Event::Init => "INIT",
            Event::ProbeReply(_) => "PROBE_REPLY",
            Event::ProbeTimeout(_) => "PROBE_TIMEOUT",
            Event::AlgorithmTerminated => "ALGORITHM_TERMINATED",
            Event::AlgorithmError(_) => "ALGORITHM_ERROR",
        }
    }
}

/// Tag of a [`TracerouteEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TracerouteEventKind {
    ProbeReply,
    Star,
    DestinationReached,
    MaxTtlReached,
    TooManyStars,
    Terminated,
    Failed,
}

impl fmt::Display for TracerouteEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TracerouteEventKind::ProbeReply => "probe_reply",
            TracerouteEventKind::Star => "star",
            TracerouteEventKind::DestinationReached => "destination_reached",
            TracerouteEventKind::MaxTtlReached => "max_ttl_reached",
            TracerouteEventKind::TooManyStars => "too_many_stars",
            TracerouteEventKind::Terminated => "terminated",
            TracerouteEventKind::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Notifications sent by a traceroute instance to its caller.
#[derive(Debug)]
pub enum TracerouteEvent<P> {
    /// A probe got a reply.
    ProbeReply(ProbeReply<P>),
    /// A probe timed out.
    Star(P),
    DestinationReached,
    MaxTtlReached,
    TooManyStars,
    /// The instance released its state; carries every probe it sent.
    Terminated(Vec<P>),
    Failed(TracerouteError),
}

impl<P> TracerouteEvent<P> {
    pub fn kind(&self) -> TracerouteEventKind {
        match self {
            TracerouteEvent::ProbeReply(_) => TracerouteEventKind::ProbeReply,
            TracerouteEvent::Star(_) => TracerouteEventKind::Star,
            TracerouteEvent::DestinationReached => TracerouteEventKind::DestinationReached,
            TracerouteEvent::MaxTtlReached => TracerouteEventKind::MaxTtlReached,
            TracerouteEvent::TooManyStars => TracerouteEventKind::TooManyStars,
            TracerouteEvent::Terminated(_) => TracerouteEventKind::Terminated,
            TracerouteEvent::Failed(_) => TracerouteEventKind::Failed,
        }
    }
}
