//! Result types for traceroute output.

use crate::algorithm::{SRC_IP_FIELD, TTL_FIELD};
use crate::event::TracerouteEvent;
use crate::traits::Probe;
use crate::types::Outcome;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::IpAddr;
use tracing::trace;
use uuid::Uuid;

/// Answer to a single probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HopReply {
    /// The IP address that responded (None for a star).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<IpAddr>,
    /// Whether the probe got a reply.
    pub reachable: bool,
}

/// All answers collected for one TTL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TracerouteHop {
    pub ttl: u8,
    pub replies: Vec<HopReply>,
}

impl TracerouteHop {
    /// True if every probe of this hop timed out.
    pub fn is_silent(&self) -> bool {
        self.replies.iter().all(|r| !r.reachable)
    }

    /// Distinct addresses seen at this hop, in arrival order.
    pub fn addresses(&self) -> Vec<IpAddr> {
        let mut addresses = Vec::new();
        for ip in self.replies.iter().filter_map(|r| r.ip_address) {
            if !addresses.contains(&ip) {
                addresses.push(ip);
            }
        }
        addresses
    }
}

/// A single traceroute run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TracerouteRun {
    /// Unique identifier for this run.
    pub run_id: String,
    pub destination: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<Outcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Probes sent over the whole run.
    pub probes_sent: usize,
    pub hops: Vec<TracerouteHop>,
}

impl TracerouteRun {
    pub fn hop(&self, ttl: u8) -> Option<&TracerouteHop> {
        self.hops.iter().find(|h| h.ttl == ttl)
    }

    /// Serializes the run to JSON with indentation.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Folds the notifications of an instance into a [`TracerouteRun`].
#[derive(Debug, Default)]
pub struct RunCollector {
    destination: String,
    hops: BTreeMap<u8, Vec<HopReply>>,
    outcome: Option<Outcome>,
    error: Option<String>,
    probes_sent: usize,
}

impl RunCollector {
    pub fn new(destination: impl Into<String>) -> Self {
        Self {
            destination: destination.into(),
            ..Default::default()
        }
    }

    pub fn record<P: Probe>(&mut self, event: &TracerouteEvent<P>) {
        match event {
            TracerouteEvent::ProbeReply(pair) => {
                let ip_address = pair
                    .reply
                    .extract_field(SRC_IP_FIELD)
                    .and_then(|value| value.as_ip());
                self.push(
                    &pair.probe,
                    HopReply {
                        ip_address,
                        reachable: true,
                    },
                );
            }
            TracerouteEvent::Star(probe) => self.push(
                probe,
                HopReply {
                    ip_address: None,
                    reachable: false,
                },
            ),
            TracerouteEvent::DestinationReached => self.outcome = Some(Outcome::Succeeded),
            TracerouteEvent::MaxTtlReached => self.outcome = Some(Outcome::Exhausted),
            TracerouteEvent::TooManyStars => self.outcome = Some(Outcome::GivenUp),
            TracerouteEvent::Terminated(probes) => self.probes_sent = probes.len(),
            TracerouteEvent::Failed(error) => self.error = Some(error.to_string()),
        }
    }

    fn push<P: Probe>(&mut self, probe: &P, reply: HopReply) {
        let ttl = probe
            .extract_field(TTL_FIELD)
            .and_then(|value| value.as_u64())
            .and_then(|ttl| u8::try_from(ttl).ok());

        match ttl {
            Some(ttl) => self.hops.entry(ttl).or_default().push(reply),
            None => trace!("Dropping answer to a probe without TTL"),
        }
    }

    pub fn finish(self) -> TracerouteRun {
        TracerouteRun {
            run_id: Uuid::new_v4().to_string(),
            destination: self.destination,
            outcome: self.outcome,
            error: self.error,
            probes_sent: self.probes_sent,
            hops: self
                .hops
                .into_iter()
                .map(|(ttl, replies)| TracerouteHop { ttl, replies })
                .collect(),
        }
    }
}
