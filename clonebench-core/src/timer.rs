// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Round-trip timing sessions.
//!
//! A session posts the same payload across a channel pair again and again,
//! one trial at a time, and timestamps each trial in three places:
//!
//! ```text
//! send ──hand-off──> ready ──delivery + materialization──> complete
//! ```
//!
//! The first `warm_up_count` trials run but are discarded; exactly
//! `iteration_count` trials are then handed to the caller.

use uuid::Uuid;

use crate::channel::{Channel, ChannelCloser, Endpoint, Materialize, Subscription};
use crate::clock::{Clock, MonotonicClock};
use crate::codec;
use crate::error::{ConfigurationError, HarnessError, HarnessResult};
use crate::types::{MeasuredDimension, Transport};
use crate::value::Value;

/// Default number of discarded warm-up trials.
pub const DEFAULT_WARM_UP_COUNT: u32 = 10;

/// Default number of measured trials.
pub const DEFAULT_ITERATION_COUNT: u32 = 250;

/// Parameters of one session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub payload: Value,
    pub use_secondary_channel: bool,
    pub warm_up_count: u32,
    pub iteration_count: u32,
    pub measured_dimension: MeasuredDimension,
}

impl SessionConfig {
    /// Create a config with the default warm-up and iteration counts on the
    /// primary channel.
    pub fn new(payload: impl Into<Value>, measured_dimension: MeasuredDimension) -> Self {
        Self {
            payload: payload.into(),
            use_secondary_channel: false,
            warm_up_count: DEFAULT_WARM_UP_COUNT,
            iteration_count: DEFAULT_ITERATION_COUNT,
            measured_dimension,
        }
    }

    /// Set the number of warm-up trials.
    pub fn warm_up(mut self, count: u32) -> Self {
        self.warm_up_count = count;
        self
    }

    /// Set the number of measured trials.
    pub fn iterations(mut self, count: u32) -> Self {
        self.iteration_count = count;
        self
    }

    /// Exchange payloads with a worker endpoint instead of the loopback one.
    pub fn secondary_channel(mut self, enabled: bool) -> Self {
        self.use_secondary_channel = enabled;
        self
    }

    pub fn transport(&self) -> Transport {
        Transport::from_secondary(self.use_secondary_channel)
    }

    /// Total number of trials a complete session executes.
    pub fn total_trials(&self) -> u64 {
        u64::from(self.warm_up_count) + u64::from(self.iteration_count)
    }

    /// Check the parameters and that the payload can be structurally copied.
    ///
    /// Returns the encoded size of the payload.
    pub fn validate(&self) -> Result<usize, ConfigurationError> {
        if self.iteration_count == 0 {
            return Err(ConfigurationError::ZeroIterations);
        }

        Ok(codec::encode(&self.payload)?.len())
    }
}

/// One completed send/receive cycle. Immutable once recorded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trial {
    index: u64,
    warm_up: bool,
    send_timestamp: f64,
    ready_timestamp: f64,
    complete_timestamp: f64,
}

impl Trial {
    fn record(index: u64, warm_up: bool, send: f64, ready: f64, complete: f64) -> Self {
        debug_assert!(send <= ready && ready <= complete, "clock went backwards");
        Self {
            index,
            warm_up,
            send_timestamp: send,
            ready_timestamp: ready,
            complete_timestamp: complete,
        }
    }

    /// Zero-based position of the trial within its session, warm-up included.
    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn is_warm_up(&self) -> bool {
        self.warm_up
    }

    pub fn send_timestamp(&self) -> f64 {
        self.send_timestamp
    }

    pub fn ready_timestamp(&self) -> f64 {
        self.ready_timestamp
    }

    pub fn complete_timestamp(&self) -> f64 {
        self.complete_timestamp
    }

    /// Hand-off cost in milliseconds.
    pub fn send_duration(&self) -> f64 {
        self.ready_timestamp - self.send_timestamp
    }

    /// Delivery plus materialization cost in milliseconds.
    pub fn receive_duration(&self) -> f64 {
        self.complete_timestamp - self.ready_timestamp
    }

    pub fn duration(&self, dimension: MeasuredDimension) -> f64 {
        match dimension {
            MeasuredDimension::Send => self.send_duration(),
            MeasuredDimension::Receive => self.receive_duration(),
        }
    }
}

/// Receives accepted trials of a session.
pub trait Aggregator {
    /// Called once per accepted trial, in order. `value_ms` is the duration
    /// selected by the session's measured dimension.
    fn record(&mut self, trial: &Trial, value_ms: f64);

    /// Called exactly once, after the last accepted trial of a session that
    /// completed. Never called for an aborted session.
    fn done(&mut self);
}

/// Outcome of a session that ran to completion.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub session_id: Uuid,
    pub transport: Transport,
    pub measured_dimension: MeasuredDimension,
    pub executed: u64,
    pub accepted: u64,
    pub payload_bytes: usize,
}

/// Configured, not yet running, session.
pub struct RoundTripTimer<C: Clock = MonotonicClock> {
    config: SessionConfig,
    clock: C,
    session_id: Uuid,
    payload_bytes: usize,
}

impl RoundTripTimer<MonotonicClock> {
    /// Validate the configuration and build a session on the wall clock.
    ///
    /// Fails with a `ConfigurationError` before any trial runs.
    pub fn configure(config: SessionConfig) -> HarnessResult<Self> {
        Self::with_clock(config, MonotonicClock::new())
    }
}

impl<C: Clock> RoundTripTimer<C> {
    /// Validate the configuration and build a session on the given clock.
    pub fn with_clock(config: SessionConfig, clock: C) -> HarnessResult<Self> {
        let payload_bytes = config.validate()?;

        Ok(Self {
            config,
            clock,
            session_id: Uuid::new_v4(),
            payload_bytes,
        })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Encoded size of the payload, in bytes.
    pub fn payload_bytes(&self) -> usize {
        self.payload_bytes
    }

    /// Open the endpoint the configuration selects and start the session.
    ///
    /// The endpoint lives exactly as long as the returned stream.
    pub fn run(self) -> HarnessResult<TrialStream<Endpoint, C>> {
        let endpoint = Endpoint::open(self.config.transport())?;
        Ok(self.run_on(endpoint))
    }

    /// Start the session on a caller-supplied channel, which the session
    /// takes ownership of.
    pub fn run_on<Ch: Channel>(self, channel: Ch) -> TrialStream<Ch, C> {
        tracing::debug!(
            session = %self.session_id,
            transport = %self.config.transport(),
            measure = %self.config.measured_dimension,
            warm_up = self.config.warm_up_count,
            iterations = self.config.iteration_count,
            payload_bytes = self.payload_bytes,
            "Session started"
        );

        TrialStream {
            channel: Some(channel),
            config: self.config,
            clock: self.clock,
            session_id: self.session_id,
            payload_bytes: self.payload_bytes,
            executed: 0,
            accepted: 0,
            state: SessionState::Running,
        }
    }
}

/// Lifecycle of a [`TrialStream`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Running,
    /// Every accepted trial was handed out.
    Completed,
    /// A trial failed; no further trials run.
    Aborted,
}

/// Lazy, finite, non-restartable sequence of accepted trials.
///
/// Each call to [`TrialStream::next`] drives trials until one post-warm-up
/// trial completes. The channel is released once the sequence ends, fails,
/// or the stream is dropped.
pub struct TrialStream<Ch: Channel, C: Clock> {
    channel: Option<Ch>,
    config: SessionConfig,
    clock: C,
    session_id: Uuid,
    payload_bytes: usize,
    executed: u64,
    accepted: u64,
    state: SessionState,
}

impl<Ch: Channel, C: Clock> TrialStream<Ch, C> {
    /// Next accepted trial, or `None` once the session is over.
    ///
    /// After an error has been returned the sequence is over.
    pub async fn next(&mut self) -> Option<HarnessResult<Trial>> {
        loop {
            if self.state != SessionState::Running {
                return None;
            }

            if self.accepted >= u64::from(self.config.iteration_count) {
                self.state = SessionState::Completed;
                self.release();
                tracing::debug!(
                    session = %self.session_id,
                    executed = self.executed,
                    accepted = self.accepted,
                    "Session complete"
                );
                return None;
            }

            // Give other pending work a turn between trials
            if self.executed > 0 {
                tokio::task::yield_now().await;
            }

            let index = self.executed;
            let warm_up = index < u64::from(self.config.warm_up_count);
            let channel = self.channel.as_mut()?;

            match run_trial(channel, &self.clock, &self.config.payload, index, warm_up).await {
                Ok(trial) => {
                    self.executed += 1;
                    tracing::trace!(
                        session = %self.session_id,
                        trial = index,
                        warm_up,
                        send_ms = trial.send_duration(),
                        receive_ms = trial.receive_duration(),
                        "Trial complete"
                    );

                    if warm_up {
                        continue;
                    }
                    self.accepted += 1;
                    return Some(Ok(trial));
                }
                Err(e) => {
                    tracing::warn!(
                        session = %self.session_id,
                        trial = index,
                        error = %e,
                        "Session aborted"
                    );
                    self.state = SessionState::Aborted;
                    self.release();
                    return Some(Err(e));
                }
            }
        }
    }

    /// Drain the session into an aggregator.
    ///
    /// `done()` is signalled once after the last accepted trial; on failure
    /// the error is returned and `done()` is not signalled. The aggregator
    /// must see every accepted trial, so a stream already advanced through
    /// [`TrialStream::next`] is rejected with `SessionConsumed`.
    pub async fn drive<A: Aggregator + ?Sized>(
        mut self,
        aggregator: &mut A,
    ) -> HarnessResult<SessionSummary> {
        if self.state != SessionState::Running || self.accepted > 0 {
            return Err(HarnessError::SessionConsumed {
                reason: format!(
                    "session is {:?} with {} of {} trials already handed out",
                    self.state, self.accepted, self.config.iteration_count
                ),
            });
        }

        let dimension = self.config.measured_dimension;

        while let Some(result) = self.next().await {
            let trial = result?;
            aggregator.record(&trial, trial.duration(dimension));
        }

        aggregator.done();
        Ok(self.summary())
    }

    /// Handle that closes the session's channel; the in-flight or next trial
    /// then fails with `ChannelClosed`. `None` once the channel is released.
    pub fn closer(&self) -> Option<ChannelCloser> {
        self.channel.as_ref().map(Channel::closer)
    }

    /// Number of listeners currently attached to the session's channel.
    pub fn listener_count(&self) -> usize {
        self.channel.as_ref().map_or(0, Channel::listener_count)
    }

    /// Trials executed so far, warm-up included.
    pub fn executed(&self) -> u64 {
        self.executed
    }

    /// Trials handed to the caller so far.
    pub fn accepted(&self) -> u64 {
        self.accepted
    }

    pub fn is_finished(&self) -> bool {
        self.state != SessionState::Running
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            session_id: self.session_id,
            transport: self.config.transport(),
            measured_dimension: self.config.measured_dimension,
            executed: self.executed,
            accepted: self.accepted,
            payload_bytes: self.payload_bytes,
        }
    }

    fn release(&mut self) {
        // Dropping the channel tears down any endpoint the session opened
        self.channel.take();
    }
}

/// Run one trial with a single-use listener.
async fn run_trial<Ch: Channel, C: Clock>(
    channel: &mut Ch,
    clock: &C,
    payload: &Value,
    index: u64,
    warm_up: bool,
) -> HarnessResult<Trial> {
    let mut subscription = channel.subscribe()?;
    let listener = subscription.id();

    let outcome = exchange(channel, &mut subscription, clock, payload, index, warm_up).await;

    // Detach on every path so listeners never pile up across trials
    channel.unsubscribe(listener);
    outcome
}

async fn exchange<Ch: Channel, C: Clock>(
    channel: &mut Ch,
    subscription: &mut Subscription<Ch::Event>,
    clock: &C,
    payload: &Value,
    index: u64,
    warm_up: bool,
) -> HarnessResult<Trial> {
    let send = clock.now();
    channel.send(payload)?;
    let ready = clock.now();

    let event = subscription
        .recv()
        .await
        .ok_or_else(|| HarnessError::closed("channel closed while awaiting delivery"))?;

    // Some transports defer the deep copy until first access
    let materialized = event.materialize()?;
    let complete = clock.now();
    std::hint::black_box(materialized);

    Ok(Trial::record(index, warm_up, send, ready, complete))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SteppingClock;
    use crate::stats::SampleCollector;

    #[test]
    fn test_config_defaults() {
        let config = SessionConfig::new("ping", MeasuredDimension::Send);
        assert_eq!(config.warm_up_count, 10);
        assert_eq!(config.iteration_count, 250);
        assert!(!config.use_secondary_channel);
        assert_eq!(config.total_trials(), 260);
        assert_eq!(config.transport(), Transport::Loopback);
    }

    #[test]
    fn test_configure_rejects_zero_iterations() {
        let config = SessionConfig::new("x", MeasuredDimension::Receive).iterations(0);
        assert!(matches!(
            RoundTripTimer::configure(config),
            Err(HarnessError::Configuration(ConfigurationError::ZeroIterations))
        ));
    }

    #[test]
    fn test_configure_rejects_opaque_payload() {
        let payload = Value::Array(vec![Value::Opaque("function".to_string())]);
        let config = SessionConfig::new(payload, MeasuredDimension::Send);
        assert!(matches!(
            RoundTripTimer::configure(config),
            Err(HarnessError::Configuration(
                ConfigurationError::NotTransmissible { .. }
            ))
        ));
    }

    #[test]
    fn test_trial_durations() {
        let trial = Trial::record(3, false, 1.0, 1.25, 2.0);
        assert_eq!(trial.index(), 3);
        assert!(!trial.is_warm_up());
        assert_eq!(trial.send_duration(), 0.25);
        assert_eq!(trial.receive_duration(), 0.75);
        assert_eq!(trial.duration(MeasuredDimension::Send), 0.25);
        assert_eq!(trial.duration(MeasuredDimension::Receive), 0.75);
    }

    #[tokio::test]
    async fn test_loopback_session_counts() {
        let config = SessionConfig::new("ping", MeasuredDimension::Receive)
            .warm_up(2)
            .iterations(5);
        let timer = RoundTripTimer::with_clock(config, SteppingClock::new(0.5)).unwrap();
        let mut stream = timer.run().unwrap();

        let mut indices = Vec::new();
        while let Some(result) = stream.next().await {
            let trial = result.unwrap();
            assert!(!trial.is_warm_up());
            indices.push(trial.index());
        }

        assert_eq!(indices, vec![2, 3, 4, 5, 6]);
        assert_eq!(stream.executed(), 7);
        assert!(stream.is_finished());
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_drive_after_abort_skips_done() {
        let config = SessionConfig::new("ping", MeasuredDimension::Receive)
            .warm_up(0)
            .iterations(10);
        let mut stream = RoundTripTimer::configure(config).unwrap().run().unwrap();

        assert!(stream.next().await.unwrap().is_ok());
        stream.closer().unwrap().close();
        assert!(matches!(
            stream.next().await,
            Some(Err(HarnessError::ChannelClosed { .. }))
        ));
        assert_eq!(stream.state(), SessionState::Aborted);

        let mut collector = SampleCollector::new();
        assert!(matches!(
            stream.drive(&mut collector).await,
            Err(HarnessError::SessionConsumed { .. })
        ));
        assert_eq!(collector.done_signals(), 0);
        assert!(collector.is_empty());
    }

    #[tokio::test]
    async fn test_drive_after_partial_next_skips_done() {
        let config = SessionConfig::new("ping", MeasuredDimension::Send)
            .warm_up(1)
            .iterations(4);
        let mut stream = RoundTripTimer::configure(config).unwrap().run().unwrap();
        assert!(stream.next().await.unwrap().is_ok());
        assert_eq!(stream.state(), SessionState::Running);

        let mut collector = SampleCollector::new();
        assert!(matches!(
            stream.drive(&mut collector).await,
            Err(HarnessError::SessionConsumed { .. })
        ));
        assert!(!collector.is_done());
    }

    #[tokio::test]
    async fn test_completed_state() {
        let config = SessionConfig::new("ping", MeasuredDimension::Send)
            .warm_up(0)
            .iterations(2);
        let mut stream = RoundTripTimer::configure(config).unwrap().run().unwrap();
        while let Some(result) = stream.next().await {
            result.unwrap();
        }
        assert_eq!(stream.state(), SessionState::Completed);
        assert!(stream.closer().is_none());
    }
}
