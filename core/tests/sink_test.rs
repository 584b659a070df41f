//! State sink dispatch tests
//!
//! The sink is exercised without any transport: events arrive as channel tag
//! plus raw payload, exactly as the stream client hands them over.

use async_trait::async_trait;
use qcmon_core::{Channel, MachineStatus, NamedEvent, StateSink};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Notifier that records every named event it receives
#[derive(Default)]
struct RecordingNotifier {
    seen: Mutex<Vec<NamedEvent>>,
}

#[async_trait]
impl qcmon_core::AlertNotifier for RecordingNotifier {
    async fn notify(&self, event: NamedEvent, _payload: &Value) {
        self.seen.lock().await.push(event);
    }
}

fn sink_with_recorder() -> (StateSink, Arc<RecordingNotifier>) {
    let notifier = Arc::new(RecordingNotifier::default());
    (StateSink::new(notifier.clone()), notifier)
}

// =============================================================================
// Channel routing
// =============================================================================

#[tokio::test]
async fn initial_then_update_flow() {
    let (sink, _) = sink_with_recorder();

    sink.dispatch(Channel::Initial, r#"{"kpis":{"totalTests":10}}"#)
        .await;
    assert_eq!(sink.snapshot().await.kpis.total_tests, 10);

    sink.dispatch(Channel::Update, r#"{"kpis":{"totalTests":12}}"#)
        .await;
    let snapshot = sink.snapshot().await;
    assert_eq!(snapshot.kpis.total_tests, 12);
    assert!(snapshot.last_updated.is_some());
}

#[tokio::test]
async fn generic_message_merges_like_an_update() {
    let (sink, _) = sink_with_recorder();

    sink.dispatch(Channel::Message, r#"{"alerts":{"expiredTeflon":2}}"#)
        .await;
    assert_eq!(sink.snapshot().await.alerts.expired_teflon, 2);
}

#[tokio::test]
async fn heartbeat_carries_no_application_data() {
    let (sink, _) = sink_with_recorder();

    sink.dispatch(Channel::Heartbeat, "").await;
    assert!(sink.snapshot().await.last_updated.is_none());
}

// =============================================================================
// Malformed payloads: log and continue
// =============================================================================

#[tokio::test]
async fn malformed_update_is_discarded_without_state_loss() {
    let (sink, _) = sink_with_recorder();

    sink.dispatch(Channel::Initial, r#"{"kpis":{"totalTests":7}}"#)
        .await;
    sink.dispatch(Channel::Update, "this is not json").await;
    sink.dispatch(Channel::Initial, "{ truncated").await;

    assert_eq!(sink.snapshot().await.kpis.total_tests, 7);
}

// =============================================================================
// Named events
// =============================================================================

#[tokio::test]
async fn recognized_named_events_reach_the_notifier() {
    let (sink, recorder) = sink_with_recorder();

    sink.dispatch(
        Channel::Event,
        r#"{"name":"machine_offline","payload":{"machineId":"m3"}}"#,
    )
    .await;
    sink.dispatch(Channel::Event, r#"{"name":"teflon_expired"}"#)
        .await;

    let seen = recorder.seen.lock().await;
    assert_eq!(
        *seen,
        vec![NamedEvent::MachineOffline, NamedEvent::TeflonExpired]
    );
}

#[tokio::test]
async fn unrecognized_named_event_is_ignored() {
    let (sink, recorder) = sink_with_recorder();

    sink.dispatch(Channel::Event, r#"{"name":"coffee_machine_empty"}"#)
        .await;

    assert!(recorder.seen.lock().await.is_empty());
}

// =============================================================================
// Refresh broadcast
// =============================================================================

#[tokio::test]
async fn successful_applies_broadcast_a_refresh() {
    let (sink, _) = sink_with_recorder();
    let mut refresh = sink.subscribe_refresh();

    sink.dispatch(Channel::Initial, "{}").await;
    sink.dispatch(Channel::Update, "{}").await;

    assert_eq!(refresh.try_recv().expect("initial refresh"), Channel::Initial);
    assert_eq!(refresh.try_recv().expect("update refresh"), Channel::Update);
}

#[tokio::test]
async fn malformed_payload_does_not_broadcast() {
    let (sink, _) = sink_with_recorder();
    let mut refresh = sink.subscribe_refresh();

    sink.dispatch(Channel::Update, "not json").await;

    assert!(refresh.try_recv().is_err());
}

// =============================================================================
// Poller refresh path
// =============================================================================

#[tokio::test]
async fn replace_machines_touches_only_the_machine_list() {
    let (sink, _) = sink_with_recorder();
    sink.dispatch(Channel::Initial, r#"{"kpis":{"totalTests":4}}"#)
        .await;

    sink.replace_machines(vec![MachineStatus {
        id: "m9".to_string(),
        name: "Horno 2".to_string(),
        status: "inactive".to_string(),
        ..Default::default()
    }])
    .await;

    let snapshot = sink.snapshot().await;
    assert_eq!(snapshot.machines.len(), 1);
    assert_eq!(snapshot.machines[0].id, "m9");
    assert_eq!(snapshot.kpis.total_tests, 4);
}
