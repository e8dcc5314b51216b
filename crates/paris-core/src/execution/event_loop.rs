//! Single-instance event loop.
//!
//! Delivers events to a [`Traceroute`] one at a time. Events raised by the
//! instance itself are queued locally and always handled before the next
//! inbound probe event is awaited.

use super::transport::ProbeTransmitter;
use crate::event::{Event, TracerouteEvent};
use crate::traits::{AlgorithmContext, Probe};
use crate::types::{AlgorithmState, Outcome};
use crate::{Traceroute, TracerouteError, TracerouteResult};
use std::collections::VecDeque;
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

/// Drives one traceroute instance from INIT to termination.
pub struct EventLoop<P> {
    pending: VecDeque<Event<P>>,
    inbound: mpsc::UnboundedReceiver<Event<P>>,
    transmitter: ProbeTransmitter<P>,
    caller: mpsc::UnboundedSender<TracerouteEvent<P>>,
}

impl<P: Probe + Clone> EventLoop<P> {
    /// Creates a loop.
    ///
    /// `inbound` carries replies and timeouts, `transmitter` sends probes and
    /// `caller` receives every notification of the instance.
    pub fn new(
        inbound: mpsc::UnboundedReceiver<Event<P>>,
        transmitter: ProbeTransmitter<P>,
        caller: mpsc::UnboundedSender<TracerouteEvent<P>>,
    ) -> Self {
        Self {
            pending: VecDeque::new(),
            inbound,
            transmitter,
            caller,
        }
    }

    /// Runs `traceroute` until it terminates or fails.
    pub async fn run(&mut self, traceroute: &mut Traceroute<P>) -> TracerouteResult<Outcome> {
        self.pending.push_back(Event::Init);

        loop {
            self.dispatch_pending(traceroute);
            if traceroute.state().is_finished() {
                break;
            }

            match self.inbound.recv().await {
                Some(event) => self.pending.push_back(event),
                None => {
                    warn!("Inbound event channel closed");
                    self.pending
                        .push_back(Event::AlgorithmError(TracerouteError::EventSourceClosed));
                }
            }
        }

        match traceroute.state() {
            AlgorithmState::Failed => Err(traceroute
                .error()
                .cloned()
                .unwrap_or_else(|| TracerouteError::Internal("failed without error".to_string()))),
            _ => traceroute.outcome().ok_or_else(|| {
                TracerouteError::Internal("terminated without outcome".to_string())
            }),
        }
    }

    fn dispatch_pending(&mut self, traceroute: &mut Traceroute<P>) {
        while let Some(event) = self.pending.pop_front() {
            let is_init = matches!(event, Event::Init);
            let mut ctx = LoopContext {
                pending: &mut self.pending,
                transmitter: &self.transmitter,
                caller: &self.caller,
            };

            if let Err(error) = traceroute.handle(&mut ctx, event) {
                debug!(error = %error, "Event handler failed");
                continue;
            }

            // The loop plays the caller and triggers the first batch.
            if is_init {
                if let Err(error) = traceroute.start(&mut ctx) {
                    debug!(error = %error, "First batch failed");
                }
            }
        }
    }
}

/// What a handler sees of the loop while it runs.
struct LoopContext<'a, P> {
    pending: &'a mut VecDeque<Event<P>>,
    transmitter: &'a ProbeTransmitter<P>,
    caller: &'a mpsc::UnboundedSender<TracerouteEvent<P>>,
}

impl<P> LoopContext<'_, P> {
    fn notify(&self, event: TracerouteEvent<P>) {
        if let Err(unsent) = self.caller.send(event) {
            trace!(kind = %unsent.0.kind(), "Caller stopped listening");
        }
    }
}

impl<P: Clone> AlgorithmContext<P> for LoopContext<'_, P> {
    fn send_probe(&mut self, probe: &P) -> Result<(), TracerouteError> {
        self.transmitter.transmit(probe.clone())
    }

    fn raise_event(&mut self, event: TracerouteEvent<P>) {
        self.notify(event);
    }

    fn forward_to_caller(&mut self, event: TracerouteEvent<P>) {
        self.notify(event);
    }

    fn raise_terminated(&mut self) {
        self.pending.push_back(Event::AlgorithmTerminated);
    }

    fn raise_error(&mut self, error: TracerouteError) {
        self.pending.push_back(Event::AlgorithmError(error));
    }
}
