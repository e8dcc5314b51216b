//! Probe transmission between the event loop and the network.
//!
//! The event loop hands probes to a [`ProbeTransmitter`] without blocking.
//! A spawned transport task forwards them to a [`ProbeSink`], which reports
//! replies and timeouts back through an [`EventSender`].

use crate::event::{Event, ProbeReply};
use crate::{TracerouteError, TracerouteResult};
use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

/// Injects probe events into a running event loop.
#[derive(Debug)]
pub struct EventSender<P> {
    tx: mpsc::UnboundedSender<Event<P>>,
}

impl<P> Clone for EventSender<P> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<P> EventSender<P> {
    pub fn send(&self, event: Event<P>) -> TracerouteResult<()> {
        self.tx
            .send(event)
            .map_err(|_| TracerouteError::Internal("event loop stopped".to_string()))
    }

    pub fn reply(&self, probe: P, reply: P) -> TracerouteResult<()> {
        self.send(Event::ProbeReply(ProbeReply { probe, reply }))
    }

    pub fn timeout(&self, probe: P) -> TracerouteResult<()> {
        self.send(Event::ProbeTimeout(probe))
    }

    pub fn error(&self, error: TracerouteError) -> TracerouteResult<()> {
        self.send(Event::AlgorithmError(error))
    }
}

/// Creates the inbound event channel of an event loop.
pub fn event_channel<P>() -> (EventSender<P>, mpsc::UnboundedReceiver<Event<P>>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (EventSender { tx }, rx)
}

/// Trait for probe transmission.
#[async_trait]
pub trait ProbeSink<P: Send + 'static>: Send {
    /// Puts a probe on the wire.
    ///
    /// The reply or timeout of the probe is reported later through `events`.
    async fn transmit(&mut self, probe: P, events: &EventSender<P>) -> TracerouteResult<()>;

    /// Closes the sink.
    async fn close(&mut self) -> TracerouteResult<()> {
        Ok(())
    }
}

/// Non-blocking handle to a transport task.
#[derive(Debug)]
pub struct ProbeTransmitter<P> {
    tx: mpsc::UnboundedSender<P>,
}

impl<P> Clone for ProbeTransmitter<P> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<P> ProbeTransmitter<P> {
    /// Queues a probe for transmission.
    ///
    /// Fails once the transport task has stopped.
    pub fn transmit(&self, probe: P) -> TracerouteResult<()> {
        self.tx
            .send(probe)
            .map_err(|_| TracerouteError::TransmissionFailed("transport stopped".to_string()))
    }
}

/// Spawns a task that feeds queued probes to `sink`.
///
/// The task stops at the first transmission failure, reporting it to the
/// event loop, or once every [`ProbeTransmitter`] has been dropped.
pub fn spawn_transport<P, S>(
    mut sink: S,
    events: EventSender<P>,
) -> (ProbeTransmitter<P>, JoinHandle<TracerouteResult<()>>)
where
    P: Send + 'static,
    S: ProbeSink<P> + 'static,
{
    let (tx, mut rx) = mpsc::unbounded_channel::<P>();

    let handle = tokio::spawn(async move {
        while let Some(probe) = rx.recv().await {
            trace!("Transmitting probe");
            if let Err(error) = sink.transmit(probe, &events).await {
                warn!(error = %error, "Transmission failed, stopping transport");
                rx.close();
                if events.error(error.clone()).is_err() {
                    debug!("Event loop already stopped");
                }
                if let Err(close_error) = sink.close().await {
                    debug!(error = %close_error, "Failed to close sink");
                }
                return Err(error);
            }
        }

        debug!("All transmitters dropped, closing sink");
        sink.close().await
    });

    (ProbeTransmitter { tx }, handle)
}
