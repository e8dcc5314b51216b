//! Simulated network path.
//!
//! Stands in for the raw-socket transport: each probe is answered by the
//! router configured for its TTL, or by the destination once the TTL goes
//! past the listed routers.

use crate::error::CliError;
use async_trait::async_trait;
use paris_core::execution::{EventSender, ProbeSink};
use paris_core::{FieldValue, TracerouteError, TracerouteResult, TTL_FIELD};
use paris_packets::Packet;
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;
use std::path::Path;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

/// Routers between the source and the destination.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatedPath {
    /// Router answering at TTL `i + 1`, `null` for a silent hop.
    pub hops: Vec<Option<Ipv4Addr>>,
    /// Delay before a reply is delivered.
    pub latency_ms: u64,
}

impl SimulatedPath {
    pub fn from_json(json: &str) -> Result<Self, CliError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, CliError> {
        let json = std::fs::read_to_string(path).map_err(|source| CliError::PathFile {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Who answers a probe sent with `ttl`, if anyone.
    pub fn responder(&self, ttl: u8, destination: Ipv4Addr) -> Option<Ipv4Addr> {
        match usize::from(ttl).checked_sub(1) {
            Some(index) if index < self.hops.len() => self.hops[index],
            Some(_) => Some(destination),
            None => None,
        }
    }
}

/// [`ProbeSink`] answering probes according to a [`SimulatedPath`].
pub struct SimulatedNetwork {
    path: SimulatedPath,
    destination: Ipv4Addr,
    timeout: Duration,
    in_flight: Vec<JoinHandle<()>>,
}

impl SimulatedNetwork {
    pub fn new(path: SimulatedPath, destination: Ipv4Addr, timeout: Duration) -> Self {
        Self {
            path,
            destination,
            timeout,
            in_flight: Vec::new(),
        }
    }
}

#[async_trait]
impl ProbeSink<Packet> for SimulatedNetwork {
    async fn transmit(
        &mut self,
        probe: Packet,
        events: &EventSender<Packet>,
    ) -> TracerouteResult<()> {
        let ttl = match probe.get(TTL_FIELD) {
            Ok(FieldValue::U8(ttl)) => ttl,
            Ok(other) => {
                return Err(TracerouteError::TransmissionFailed(format!(
                    "unexpected TTL value {}",
                    other
                )))
            }
            Err(e) => return Err(TracerouteError::TransmissionFailed(e.to_string())),
        };

        let responder = self.path.responder(ttl, self.destination);
        trace!(ttl, responder = ?responder, "Probe on the wire");
        let reply = responder
            .map(|router| probe.reply_from(router))
            .transpose()?;

        let events = events.clone();
        let latency = Duration::from_millis(self.path.latency_ms);
        let timeout = self.timeout;

        self.in_flight.retain(|task| !task.is_finished());
        self.in_flight.push(tokio::spawn(async move {
            let delivered = match reply {
                Some(reply) => {
                    tokio::time::sleep(latency).await;
                    events.reply(probe, reply)
                }
                None => {
                    tokio::time::sleep(timeout).await;
                    events.timeout(probe)
                }
            };
            if delivered.is_err() {
                debug!(ttl, "Event loop gone, dropping answer");
            }
        }));
        Ok(())
    }

    async fn close(&mut self) -> TracerouteResult<()> {
        for task in self.in_flight.drain(..) {
            task.abort();
        }
        Ok(())
    }
}
