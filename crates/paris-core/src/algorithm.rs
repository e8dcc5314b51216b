//! The traceroute algorithm state machine.
//!
//! A [`Traceroute`] instance turns probe lifecycle events into TTL
//! progression, termination decisions and caller notifications. Handlers
//! never block: probes, notifications and follow-up events all go through
//! the [`AlgorithmContext`] supplied by the event loop.
//!
//! Exploration proceeds in batches of `num_probes` probes sharing a TTL.
//! Once every probe of a batch has been answered or has timed out, the
//! instance either terminates (destination reached, `max_ttl` exceeded,
//! too many silent hops) or sends the batch for the next hop.

use crate::event::{Event, ProbeReply, TracerouteEvent};
use crate::field::FieldValue;
use crate::lifecycle::ProbeLifecycleData;
use crate::traits::{AlgorithmContext, Probe};
use crate::types::{AlgorithmState, Outcome, TracerouteOptions, MAX_UNDISCOVERED};
use crate::{TracerouteError, TracerouteResult};
use tracing::{debug, info, trace, warn};

/// Field stamped with the hop TTL on every probe.
pub const TTL_FIELD: &str = "ttl";

/// Field of a reply compared against the destination address.
pub const SRC_IP_FIELD: &str = "src_ip";

/// One running traceroute toward a single destination.
#[derive(Debug)]
pub struct Traceroute<P> {
    options: TracerouteOptions,
    /// Template for every probe; only ever duplicated.
    skeleton: P,
    state: AlgorithmState,
    data: Option<ProbeLifecycleData<P>>,
    outcome: Option<Outcome>,
    error: Option<TracerouteError>,
}

impl<P: Probe> Traceroute<P> {
    pub fn new(options: TracerouteOptions, skeleton: P) -> Self {
        Self {
            options,
            skeleton,
            state: AlgorithmState::Uninitialized,
            data: None,
            outcome: None,
            error: None,
        }
    }

    pub fn options(&self) -> &TracerouteOptions {
        &self.options
    }

    pub fn skeleton(&self) -> &P {
        &self.skeleton
    }

    pub fn state(&self) -> AlgorithmState {
        self.state
    }

    /// Lifecycle data, present from INIT until ALGORITHM_TERMINATED.
    pub fn data(&self) -> Option<&ProbeLifecycleData<P>> {
        self.data.as_ref()
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    /// The error that moved the instance to [`AlgorithmState::Failed`].
    pub fn error(&self) -> Option<&TracerouteError> {
        self.error.as_ref()
    }

    /// Handles one event.
    ///
    /// Failures are recorded, raised through [`AlgorithmContext::raise_error`]
    /// and also returned to the caller of this method.
    pub fn handle<C: AlgorithmContext<P>>(
        &mut self,
        ctx: &mut C,
        event: Event<P>,
    ) -> TracerouteResult<()> {
        trace!(event = event.name(), state = ?self.state, "Handling event");

        let result = match event {
            Event::Init => self.on_init(),
            Event::ProbeReply(reply) => self.on_probe_reply(ctx, reply),
            Event::ProbeTimeout(probe) => self.on_probe_timeout(ctx, probe),
            Event::AlgorithmTerminated => {
                self.on_terminated(ctx);
                Ok(())
            }
            Event::AlgorithmError(error) => {
                self.on_error(ctx, error);
                Ok(())
            }
        };

        result.or_else(|error| self.fail(ctx, error))
    }

    /// Sends the first probe batch, at `min_ttl`.
    ///
    /// Must be called once, after a successful INIT.
    pub fn start<C: AlgorithmContext<P>>(&mut self, ctx: &mut C) -> TracerouteResult<()> {
        let already_started = self.data.as_ref().map(|data| !data.probes().is_empty());

        let result = match (self.state, already_started) {
            (AlgorithmState::Exploring, Some(false)) => self.explore_next_hop(ctx),
            (AlgorithmState::Exploring, Some(true)) => Err(TracerouteError::Internal(
                "exploration already started".to_string(),
            )),
            _ => Err(TracerouteError::NotInitialized("start")),
        };

        result.or_else(|error| self.fail(ctx, error))
    }

    fn on_init(&mut self) -> TracerouteResult<()> {
        if self.state != AlgorithmState::Uninitialized {
            return Err(TracerouteError::AlreadyInitialized);
        }

        self.options.validate()?;

        self.data = Some(ProbeLifecycleData::new(self.options.min_ttl));
        self.state = AlgorithmState::Exploring;

        debug!(
            min_ttl = self.options.min_ttl,
            max_ttl = self.options.max_ttl,
            num_probes = self.options.num_probes,
            dst_ip = %self.options.dst_ip,
            "Traceroute initialized"
        );
        Ok(())
    }

    fn on_probe_reply<C: AlgorithmContext<P>>(
        &mut self,
        ctx: &mut C,
        reply: ProbeReply<P>,
    ) -> TracerouteResult<()> {
        if !self.accepts_probe_events("PROBE_REPLY")? {
            return Ok(());
        }
        let data = self
            .data
            .as_mut()
            .ok_or(TracerouteError::NotInitialized("PROBE_REPLY"))?;

        let from_destination = reply
            .reply
            .extract_field(SRC_IP_FIELD)
            .map_or(false, |src| src.matches_address(&self.options.dst_ip));

        // Replies never reset num_undiscovered.
        data.num_stars = 0;
        data.num_replies += 1;
        data.destination_reached |= from_destination;

        debug!(
            num_replies = data.num_replies,
            from_destination,
            "Probe reply"
        );

        ctx.forward_to_caller(TracerouteEvent::ProbeReply(reply));
        self.on_batch_progress(ctx)
    }

    fn on_probe_timeout<C: AlgorithmContext<P>>(
        &mut self,
        ctx: &mut C,
        probe: P,
    ) -> TracerouteResult<()> {
        if !self.accepts_probe_events("PROBE_TIMEOUT")? {
            return Ok(());
        }
        let data = self
            .data
            .as_mut()
            .ok_or(TracerouteError::NotInitialized("PROBE_TIMEOUT"))?;

        data.num_stars += 1;
        data.num_replies += 1;

        debug!(
            num_replies = data.num_replies,
            num_stars = data.num_stars,
            "Probe timeout"
        );

        ctx.forward_to_caller(TracerouteEvent::Star(probe));
        self.on_batch_progress(ctx)
    }

    fn on_terminated<C: AlgorithmContext<P>>(&mut self, ctx: &mut C) {
        let probes = self
            .data
            .take()
            .map(ProbeLifecycleData::into_probes)
            .unwrap_or_default();

        debug!(num_probes = probes.len(), "Releasing traceroute data");
        self.state = AlgorithmState::Terminated;
        ctx.forward_to_caller(TracerouteEvent::Terminated(probes));
    }

    fn on_error<C: AlgorithmContext<P>>(&mut self, ctx: &mut C, error: TracerouteError) {
        if self.state != AlgorithmState::Failed {
            warn!(error = %error, "Traceroute aborted by the event loop");
        }
        self.state = AlgorithmState::Failed;
        if self.error.is_none() {
            self.error = Some(error.clone());
        }
        ctx.forward_to_caller(TracerouteEvent::Failed(error));
    }

    /// Single exit for every failure detected inside a handler.
    fn fail<C: AlgorithmContext<P>>(
        &mut self,
        ctx: &mut C,
        error: TracerouteError,
    ) -> TracerouteResult<()> {
        warn!(error = %error, state = ?self.state, "Traceroute instance failed");
        self.state = AlgorithmState::Failed;
        self.error = Some(error.clone());
        ctx.raise_error(error.clone());
        Err(error)
    }

    /// Whether a reply or timeout should update the lifecycle data.
    ///
    /// Events arriving after a termination decision are ignored.
    fn accepts_probe_events(&self, event: &'static str) -> TracerouteResult<bool> {
        match self.state {
            AlgorithmState::Uninitialized => Err(TracerouteError::NotInitialized(event)),
            AlgorithmState::Exploring => Ok(true),
            state => {
                debug!(event, state = ?state, "Ignoring late probe event");
                Ok(false)
            }
        }
    }

    /// Decides what to do once a batch may have completed.
    fn on_batch_progress<C: AlgorithmContext<P>>(&mut self, ctx: &mut C) -> TracerouteResult<()> {
        let num_probes = self.options.num_probes;
        let max_ttl = self.options.max_ttl;
        let data = self
            .data
            .as_mut()
            .ok_or(TracerouteError::Internal("missing lifecycle data".to_string()))?;

        if !data.is_batch_complete(num_probes) {
            trace!(
                num_replies = data.num_replies,
                num_probes,
                "Batch still in flight"
            );
            return Ok(());
        }

        if data.destination_reached {
            self.finish(ctx, Outcome::Succeeded);
            return Ok(());
        }

        if data.ttl > u16::from(max_ttl) {
            self.finish(ctx, Outcome::Exhausted);
            return Ok(());
        }

        if data.num_stars == num_probes {
            data.num_undiscovered += 1;
            debug!(
                ttl = data.ttl - 1,
                num_undiscovered = data.num_undiscovered,
                "Only stars at this hop"
            );
            if data.num_undiscovered >= MAX_UNDISCOVERED {
                self.finish(ctx, Outcome::GivenUp);
                return Ok(());
            }
        }

        self.explore_next_hop(ctx)
    }

    /// Sends a batch at the current TTL, then moves to the next hop.
    fn explore_next_hop<C: AlgorithmContext<P>>(&mut self, ctx: &mut C) -> TracerouteResult<()> {
        let num_probes = self.options.num_probes;
        let data = self
            .data
            .as_mut()
            .ok_or(TracerouteError::NotInitialized("batch"))?;

        let ttl = u8::try_from(data.ttl)
            .map_err(|_| TracerouteError::Internal(format!("TTL {} out of range", data.ttl)))?;

        data.num_stars = 0;
        debug!(ttl, num_probes, "Sending probe batch");
        send_traceroute_probes(ctx, data, &self.skeleton, num_probes, ttl)?;
        data.ttl += 1;
        Ok(())
    }

    fn finish<C: AlgorithmContext<P>>(&mut self, ctx: &mut C, outcome: Outcome) {
        info!(
            outcome = %outcome,
            dst_ip = %self.options.dst_ip,
            "Traceroute finished"
        );

        self.state = outcome.into();
        self.outcome = Some(outcome);

        let notification = match outcome {
            Outcome::Succeeded => TracerouteEvent::DestinationReached,
            Outcome::Exhausted => TracerouteEvent::MaxTtlReached,
            Outcome::GivenUp => TracerouteEvent::TooManyStars,
        };
        ctx.raise_event(notification);
        ctx.raise_terminated();
    }
}

/// Sends `num_probes` probes with the given TTL.
///
/// Stops at the first failure; probes already recorded stay recorded.
pub fn send_traceroute_probes<P, C>(
    ctx: &mut C,
    data: &mut ProbeLifecycleData<P>,
    skeleton: &P,
    num_probes: u32,
    ttl: u8,
) -> TracerouteResult<()>
where
    P: Probe,
    C: AlgorithmContext<P>,
{
    for _ in 0..num_probes {
        send_traceroute_probe(ctx, data, skeleton, ttl)?;
    }
    Ok(())
}

/// Sends one probe crafted from `skeleton` with the given TTL.
///
/// The skeleton is never altered; the network layer only ever sees
/// private copies.
pub fn send_traceroute_probe<P, C>(
    ctx: &mut C,
    data: &mut ProbeLifecycleData<P>,
    skeleton: &P,
    ttl: u8,
) -> TracerouteResult<()>
where
    P: Probe,
    C: AlgorithmContext<P>,
{
    let mut probe = skeleton.duplicate()?;
    probe.set_field(TTL_FIELD, FieldValue::U8(ttl))?;

    trace!(ttl, "Sending probe");
    let probe = data.record_probe(probe);
    ctx.send_probe(probe)
}
