//! Traceroute runner wiring the state machine, the event loop and the
//! simulated network together.

use crate::error::CliError;
use crate::simulation::{SimulatedNetwork, SimulatedPath};
use paris_core::execution::{event_channel, spawn_transport, EventLoop};
use paris_core::{RunCollector, Traceroute, TracerouteOptions, TracerouteRun};
use paris_packets::{Packet, IPPROTO_UDP};
use std::net::Ipv4Addr;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Everything needed for one run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub options: TracerouteOptions,
    pub source: Ipv4Addr,
    pub destination: Ipv4Addr,
    pub path: SimulatedPath,
    /// How long a silent hop keeps a probe before it times out.
    pub timeout: Duration,
}

/// Runs a traceroute to completion and collects its notifications.
///
/// Failures of the instance are reported in the returned run rather than
/// as an error.
pub async fn run_traceroute(config: RunConfig) -> Result<TracerouteRun, CliError> {
    let skeleton = Packet::ipv4(config.source, config.destination, IPPROTO_UDP)?;

    let (events, inbound) = event_channel();
    let network = SimulatedNetwork::new(config.path, config.destination, config.timeout);
    let (transmitter, transport) = spawn_transport(network, events);
    let (caller_tx, mut caller_rx) = mpsc::unbounded_channel();

    let mut traceroute = Traceroute::new(config.options, skeleton);
    let mut event_loop = EventLoop::new(inbound, transmitter, caller_tx);

    match event_loop.run(&mut traceroute).await {
        Ok(outcome) => info!(outcome = %outcome, "Traceroute completed"),
        Err(e) => warn!(error = %e, "Traceroute failed"),
    }
    drop(event_loop);

    match transport.await {
        Ok(Ok(())) => debug!("Transport stopped"),
        Ok(Err(e)) => debug!(error = %e, "Transport stopped with error"),
        Err(e) => warn!(error = %e, "Transport task panicked"),
    }

    let mut collector = RunCollector::new(config.destination.to_string());
    while let Some(event) = caller_rx.recv().await {
        collector.record(&event);
    }
    Ok(collector.finish())
}
