// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! End-to-end integration tests for clonebench-core.
//!
//! These tests drive complete sessions from configuration to aggregation,
//! on the real endpoints and on in-process stub channels.

use std::io::Write;

use clonebench_core::channel::WorkerChannel;
use clonebench_core::{
    Aggregator, Channel, ChannelCloser, ClonedPayload, ConfigurationError, HarnessError,
    HarnessResult, ListenerId, ListenerTable, MaterializationError, MeasuredDimension,
    MessageEvent, RoundTripTimer, SampleCollector, SessionConfig, SteppingClock, Subscription,
    SuiteLoader, Transport, Trial, Value,
};
use tempfile::NamedTempFile;

/// What a stub channel delivers for each send.
#[derive(Clone, Copy)]
enum Reply {
    Echo,
    Corrupt,
    ReceiverError,
}

/// Channel that delivers synchronously from inside `send`.
struct StubChannel {
    listeners: ListenerTable<MessageEvent>,
    reply: Reply,
}

impl StubChannel {
    fn new(reply: Reply) -> Self {
        Self {
            listeners: ListenerTable::new(),
            reply,
        }
    }
}

impl Channel for StubChannel {
    type Event = MessageEvent;

    fn send(&mut self, payload: &Value) -> HarnessResult<()> {
        if self.listeners.is_closed() {
            return Err(HarnessError::ChannelClosed {
                reason: "stub closed".to_string(),
            });
        }

        let event = match self.reply {
            Reply::Echo => MessageEvent::Message(ClonedPayload::encode(payload)?),
            Reply::Corrupt => {
                let mut bytes = ClonedPayload::encode(payload)?.as_bytes().to_vec();
                let last = bytes.len() - 1;
                bytes[last] ^= 0xFF;
                MessageEvent::Message(ClonedPayload::from_bytes(bytes))
            }
            Reply::ReceiverError => MessageEvent::MessageError {
                reason: "cannot deserialize".to_string(),
            },
        };
        self.listeners.dispatch(event);
        Ok(())
    }

    fn subscribe(&mut self) -> HarnessResult<Subscription<MessageEvent>> {
        self.listeners.subscribe()
    }

    fn unsubscribe(&mut self, id: ListenerId) {
        self.listeners.unsubscribe(id);
    }

    fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    fn closer(&self) -> ChannelCloser {
        self.listeners.closer()
    }
}

/// Aggregator that closes the channel after a fixed number of records.
struct ClosingAggregator {
    inner: SampleCollector,
    closer: Option<ChannelCloser>,
    close_after: usize,
}

impl Aggregator for ClosingAggregator {
    fn record(&mut self, trial: &Trial, value_ms: f64) {
        self.inner.record(trial, value_ms);
        if self.inner.len() == self.close_after {
            if let Some(closer) = &self.closer {
                closer.close();
            }
        }
    }

    fn done(&mut self) {
        self.inner.done();
    }
}

#[tokio::test]
async fn test_warm_up_trials_are_excluded() {
    let config = SessionConfig::new("payload", MeasuredDimension::Receive);
    let timer = RoundTripTimer::configure(config).unwrap();
    let stream = timer.run().unwrap();

    let mut collector = SampleCollector::new();
    let summary = stream.drive(&mut collector).await.unwrap();

    assert_eq!(summary.executed, 260);
    assert_eq!(summary.accepted, 250);
    assert_eq!(collector.len(), 250);
    assert_eq!(collector.done_signals(), 1);
    assert!(collector.trials().iter().all(|t| !t.is_warm_up()));
    assert_eq!(collector.trials()[0].index(), 10);
}

#[tokio::test]
async fn test_trials_are_ordered_and_non_negative() {
    let config = SessionConfig::new(Value::from(vec![1u8, 2, 3]), MeasuredDimension::Send)
        .warm_up(3)
        .iterations(40);
    let mut stream = RoundTripTimer::configure(config).unwrap().run().unwrap();

    let mut trials = Vec::new();
    while let Some(result) = stream.next().await {
        trials.push(result.unwrap());
    }

    assert_eq!(trials.len(), 40);
    for trial in &trials {
        assert!(trial.send_duration() >= 0.0);
        assert!(trial.receive_duration() >= 0.0);
    }
    for pair in trials.windows(2) {
        assert!(pair[0].complete_timestamp() <= pair[1].send_timestamp());
        assert_eq!(pair[0].index() + 1, pair[1].index());
    }
}

#[tokio::test]
async fn test_identical_sessions_are_reproducible() {
    async fn session() -> Vec<Trial> {
        let config = SessionConfig::new("same", MeasuredDimension::Receive)
            .warm_up(4)
            .iterations(12);
        let timer = RoundTripTimer::with_clock(config, SteppingClock::new(0.25)).unwrap();
        let mut collector = SampleCollector::new();
        timer
            .run_on(StubChannel::new(Reply::Echo))
            .drive(&mut collector)
            .await
            .unwrap();
        collector.trials().to_vec()
    }

    let first = session().await;
    let second = session().await;
    assert_eq!(first.len(), 12);
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_single_ping_on_echo_stub() {
    let config = SessionConfig::new("ping", MeasuredDimension::Send)
        .warm_up(0)
        .iterations(1);
    let timer = RoundTripTimer::configure(config).unwrap();
    let mut stream = timer.run_on(StubChannel::new(Reply::Echo));

    let trial = stream.next().await.unwrap().unwrap();
    assert_eq!(trial.index(), 0);
    assert!(trial.send_duration() >= 0.0);
    assert!(trial.send_duration() < 100.0);
    assert!(trial.receive_duration() >= 0.0);
    assert!(stream.next().await.is_none());
}

#[tokio::test]
async fn test_stepping_clock_timestamps() {
    let config = SessionConfig::new("ping", MeasuredDimension::Send)
        .warm_up(0)
        .iterations(2);
    let timer = RoundTripTimer::with_clock(config, SteppingClock::new(1.0)).unwrap();
    let mut stream = timer.run_on(StubChannel::new(Reply::Echo));

    let first = stream.next().await.unwrap().unwrap();
    let second = stream.next().await.unwrap().unwrap();
    assert_eq!(first.send_duration(), 1.0);
    assert_eq!(first.receive_duration(), 1.0);
    assert_eq!(first.complete_timestamp() + 1.0, second.send_timestamp());
}

#[test]
fn test_zero_iterations_fail_before_any_trial() {
    let config = SessionConfig::new("ping", MeasuredDimension::Send).iterations(0);
    assert!(matches!(
        RoundTripTimer::configure(config),
        Err(HarnessError::Configuration(ConfigurationError::ZeroIterations))
    ));
}

#[tokio::test]
async fn test_close_after_third_trial_aborts_session() {
    for transport in [Transport::Loopback, Transport::Worker] {
        let config = SessionConfig::new("ping", MeasuredDimension::Receive)
            .warm_up(0)
            .iterations(10)
            .secondary_channel(transport == Transport::Worker);
        let stream = RoundTripTimer::configure(config).unwrap().run().unwrap();

        let mut aggregator = ClosingAggregator {
            inner: SampleCollector::new(),
            closer: stream.closer(),
            close_after: 3,
        };

        let result = stream.drive(&mut aggregator).await;
        assert!(matches!(result, Err(HarnessError::ChannelClosed { .. })));
        assert_eq!(aggregator.inner.len(), 3);
        assert!(!aggregator.inner.is_done());
    }
}

#[tokio::test]
async fn test_stub_close_after_third_trial() {
    let config = SessionConfig::new("ping", MeasuredDimension::Send)
        .warm_up(0)
        .iterations(10);
    let stream = RoundTripTimer::with_clock(config, SteppingClock::new(0.1))
        .unwrap()
        .run_on(StubChannel::new(Reply::Echo));

    let mut aggregator = ClosingAggregator {
        inner: SampleCollector::new(),
        closer: stream.closer(),
        close_after: 3,
    };

    assert!(matches!(
        stream.drive(&mut aggregator).await,
        Err(HarnessError::ChannelClosed { .. })
    ));
    assert_eq!(aggregator.inner.len(), 3);
    assert_eq!(aggregator.inner.done_signals(), 0);
}

#[tokio::test]
async fn test_listeners_detached_between_trials() {
    let config = SessionConfig::new("ping", MeasuredDimension::Receive)
        .warm_up(1)
        .iterations(5);
    let mut stream = RoundTripTimer::configure(config)
        .unwrap()
        .run_on(StubChannel::new(Reply::Echo));

    while let Some(result) = stream.next().await {
        result.unwrap();
        assert_eq!(stream.listener_count(), 0);
    }
    assert!(stream.is_finished());
    assert_eq!(stream.listener_count(), 0);
}

#[tokio::test]
async fn test_listener_detached_after_failed_trial() {
    let config = SessionConfig::new("ping", MeasuredDimension::Receive)
        .warm_up(0)
        .iterations(3);
    let timer = RoundTripTimer::configure(config).unwrap();

    let mut channel = StubChannel::new(Reply::Corrupt);
    let table = channel.listeners.clone();
    // Extra listener the session does not own
    let _observer = channel.subscribe().unwrap();

    let mut stream = timer.run_on(channel);
    assert!(stream.next().await.unwrap().is_err());
    assert_eq!(table.len(), 1);
}

#[tokio::test]
async fn test_worker_session_round_trip() {
    let payload = Value::Map(
        [
            ("id".to_string(), Value::Int(7)),
            ("tags".to_string(), Value::from(vec![Value::from("a")])),
        ]
        .into_iter()
        .collect(),
    );
    let config = SessionConfig::new(payload, MeasuredDimension::Receive)
        .warm_up(2)
        .iterations(20)
        .secondary_channel(true);
    let timer = RoundTripTimer::configure(config).unwrap();
    assert!(timer.payload_bytes() > 0);

    let stream = timer.run().unwrap();
    let mut collector = SampleCollector::new();
    let summary = stream.drive(&mut collector).await.unwrap();

    assert_eq!(summary.transport, Transport::Worker);
    assert_eq!(summary.executed, 22);
    assert_eq!(collector.len(), 20);
    assert!(collector.is_done());
    assert_eq!(collector.metrics(false).count, 20);
}

#[tokio::test]
async fn test_corrupted_delivery_is_materialization_error() {
    let config = SessionConfig::new("ping", MeasuredDimension::Receive)
        .warm_up(0)
        .iterations(5);
    let stream = RoundTripTimer::configure(config)
        .unwrap()
        .run_on(StubChannel::new(Reply::Corrupt));

    let mut collector = SampleCollector::new();
    match stream.drive(&mut collector).await {
        Err(HarnessError::Materialization(MaterializationError::ChecksumMismatch { .. })) => {}
        other => panic!("unexpected result: {:?}", other),
    }
    assert!(collector.is_empty());
    assert!(!collector.is_done());
}

#[tokio::test]
async fn test_receiver_error_event_aborts_session() {
    let config = SessionConfig::new("ping", MeasuredDimension::Receive)
        .warm_up(0)
        .iterations(5);
    let mut stream = RoundTripTimer::configure(config)
        .unwrap()
        .run_on(StubChannel::new(Reply::ReceiverError));

    assert!(matches!(
        stream.next().await,
        Some(Err(HarnessError::Materialization(
            MaterializationError::ReceiverFailed { .. }
        )))
    ));
    assert!(stream.is_finished());
    assert!(stream.next().await.is_none());
}

#[tokio::test]
async fn test_suite_file_drives_sessions() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
defaults:
  warm_up_count: 1
  iteration_count: 4
benchmarks:
  - name: tree/send/loopback
    payload: {{ kind: object_tree, depth: 2, fanout: 3 }}
    measure: send
  - name: records/receive/worker
    payload: {{ kind: records, count: 8 }}
    worker: true
    measure: deserialize
"#
    )
    .unwrap();

    let suite = SuiteLoader::load_file(file.path()).unwrap();
    assert_eq!(suite.len(), 2);

    for benchmark in suite.benchmarks {
        let timer = RoundTripTimer::configure(benchmark.session).unwrap();
        let mut collector = SampleCollector::new();
        let summary = timer.run().unwrap().drive(&mut collector).await.unwrap();
        assert_eq!(summary.executed, 5);
        assert_eq!(collector.len(), 4);
    }
}

#[test]
fn test_missing_suite_file() {
    let dir = tempfile::TempDir::new().unwrap();
    assert!(matches!(
        SuiteLoader::load_file(dir.path().join("absent.yaml")),
        Err(HarnessError::SuiteNotFound { .. })
    ));
}

#[tokio::test]
async fn test_worker_joined_after_completed_session() {
    let channel = WorkerChannel::spawn().unwrap();
    let monitor = channel.monitor();

    let config = SessionConfig::new("ping", MeasuredDimension::Receive)
        .warm_up(1)
        .iterations(3)
        .secondary_channel(true);
    let mut stream = RoundTripTimer::configure(config).unwrap().run_on(channel);

    while let Some(result) = stream.next().await {
        result.unwrap();
        assert!(!monitor.has_exited());
    }

    // The stream is still alive; the endpoint was released on completion
    assert!(stream.is_finished());
    assert!(monitor.has_exited());
}

#[tokio::test]
async fn test_worker_joined_after_aborted_session() {
    let channel = WorkerChannel::spawn().unwrap();
    let monitor = channel.monitor();

    let config = SessionConfig::new("ping", MeasuredDimension::Receive)
        .warm_up(0)
        .iterations(10)
        .secondary_channel(true);
    let mut stream = RoundTripTimer::configure(config).unwrap().run_on(channel);

    assert!(stream.next().await.unwrap().is_ok());
    stream.closer().unwrap().close();
    assert!(matches!(
        stream.next().await,
        Some(Err(HarnessError::ChannelClosed { .. }))
    ));

    assert!(stream.is_finished());
    assert!(monitor.has_exited());
}
