// RequestCorrelator: id allocation, single resolution, timeouts and bulk failure

use fwmonitor::ClientError;
use fwmonitor::correlator::{Completion, RequestCorrelator, Resolution};
use fwmonitor::protocol::Action;
use serde_json::{Value, json};
use tokio::sync::oneshot;
use tokio::time::{Duration, Instant};

type Rx = oneshot::Receiver<Result<Value, ClientError>>;

fn caller() -> (Completion, Rx) {
    let (tx, rx) = oneshot::channel();
    (Completion::Caller(tx), rx)
}

#[tokio::test(start_paused = true)]
async fn ids_are_unique_and_increasing() {
    let mut c = RequestCorrelator::new();
    let mut last = 0u64;
    let mut receivers = Vec::new();
    for _ in 0..200 {
        let (completion, rx) = caller();
        receivers.push(rx);
        let frame = c.register(Action::Ping, Value::Null, Duration::from_secs(1), completion);
        let id: u64 = frame.id.parse().expect("numeric id");
        assert!(id > last, "{id} not above {last}");
        last = id;
    }
    assert_eq!(c.len(), 200);
}

#[tokio::test(start_paused = true)]
async fn register_builds_request_frame() {
    let mut c = RequestCorrelator::new();
    let (completion, _rx) = caller();
    let frame = c.register(
        Action::ChangeBroadcastStatus,
        json!(true),
        Duration::from_secs(1),
        completion,
    );
    assert_eq!(frame.action, "change_broadcast_status");
    assert_eq!(frame.payload, json!(true));
    assert!(c.contains(&frame.id));
}

#[tokio::test(start_paused = true)]
async fn response_resolves_exactly_once() {
    let mut c = RequestCorrelator::new();
    let (completion, rx) = caller();
    let frame = c.register(Action::Ping, Value::Null, Duration::from_secs(1), completion);

    assert_eq!(c.resolve(&frame.id, json!("pong")), Resolution::Delivered);
    assert_eq!(c.resolve(&frame.id, json!("again")), Resolution::Unmatched);
    assert!(c.is_empty());
    assert_eq!(rx.await.unwrap().unwrap(), json!("pong"));
}

#[tokio::test(start_paused = true)]
async fn unknown_id_is_ignored() {
    let mut c = RequestCorrelator::new();
    let (completion, _rx) = caller();
    c.register(Action::Ping, Value::Null, Duration::from_secs(1), completion);
    assert_eq!(c.resolve("12345", Value::Null), Resolution::Unmatched);
    assert_eq!(c.reject("12345", "boom".into()), Resolution::Unmatched);
    assert_eq!(c.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn server_error_rejects_caller() {
    let mut c = RequestCorrelator::new();
    let (completion, rx) = caller();
    let frame = c.register(Action::SetRules, json!([]), Duration::from_secs(1), completion);
    c.reject(&frame.id, "invalid rule".into());
    match rx.await.unwrap() {
        Err(ClientError::ServerError(msg)) => assert_eq!(msg, "invalid rule"),
        other => panic!("expected server error, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn expire_rejects_only_due_entries() {
    let mut c = RequestCorrelator::new();
    let (short, short_rx) = caller();
    let (long, _long_rx) = caller();
    c.register(Action::GetRules, Value::Null, Duration::from_millis(100), short);
    c.register(Action::GetBlackList, Value::Null, Duration::from_secs(5), long);

    let start = Instant::now();
    assert_eq!(c.next_deadline(), Some(start + Duration::from_millis(100)));
    assert_eq!(c.expire(start + Duration::from_millis(99)), 0);
    assert_eq!(c.expire(start + Duration::from_millis(100)), 1);
    assert_eq!(c.len(), 1);
    assert_eq!(c.next_deadline(), Some(start + Duration::from_secs(5)));

    let err = short_rx.await.unwrap().unwrap_err();
    assert!(err.is_timeout());
    match err {
        ClientError::Timeout { action, after_ms } => {
            assert_eq!(action, "get_rules");
            assert_eq!(after_ms, 100);
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn late_response_after_expiry_is_unmatched() {
    let mut c = RequestCorrelator::new();
    let (completion, rx) = caller();
    let frame = c.register(Action::Ping, Value::Null, Duration::from_millis(10), completion);
    c.expire(Instant::now() + Duration::from_millis(10));
    assert_eq!(c.resolve(&frame.id, json!("pong")), Resolution::Unmatched);
    assert!(rx.await.unwrap().is_err());
}

#[tokio::test(start_paused = true)]
async fn fail_all_reports_disconnected() {
    let mut c = RequestCorrelator::new();
    let (a, a_rx) = caller();
    let (b, b_rx) = caller();
    c.register(Action::Ping, Value::Null, Duration::from_secs(1), a);
    c.register(Action::GetLinkType, Value::Null, Duration::from_secs(1), b);
    assert_eq!(c.fail_all(), 2);
    assert!(c.is_empty());
    assert_eq!(c.next_deadline(), None);
    assert!(matches!(a_rx.await.unwrap(), Err(ClientError::Disconnected)));
    assert!(matches!(b_rx.await.unwrap(), Err(ClientError::Disconnected)));
}

#[tokio::test(start_paused = true)]
async fn refresh_payload_is_handed_back() {
    let mut c = RequestCorrelator::new();
    let frame = c.register(
        Action::GetSummary,
        Value::Null,
        Duration::from_secs(1),
        Completion::Refresh,
    );
    let payload = json!({"day_summary": {}});
    assert_eq!(c.resolve(&frame.id, payload.clone()), Resolution::Refresh(payload));
}

#[tokio::test(start_paused = true)]
async fn discard_refreshes_keeps_callers() {
    let mut c = RequestCorrelator::new();
    let (completion, _rx) = caller();
    let kept = c.register(Action::Ping, Value::Null, Duration::from_secs(1), completion);
    let dropped = c.register(
        Action::GetSummary,
        Value::Null,
        Duration::from_secs(1),
        Completion::Refresh,
    );
    assert_eq!(c.discard_refreshes(), 1);
    assert!(c.contains(&kept.id));
    assert!(!c.contains(&dropped.id));
}

#[tokio::test(start_paused = true)]
async fn dropped_receiver_does_not_break_resolution() {
    let mut c = RequestCorrelator::new();
    let (completion, rx) = caller();
    let frame = c.register(Action::Ping, Value::Null, Duration::from_secs(1), completion);
    drop(rx);
    assert_eq!(c.resolve(&frame.id, json!("pong")), Resolution::Delivered);
    assert!(c.is_empty());
}

#[tokio::test(start_paused = true)]
async fn oversized_timeout_gets_far_future_deadline() {
    let mut c = RequestCorrelator::new();
    let (completion, rx) = caller();
    let frame = c.register(Action::Ping, Value::Null, Duration::MAX, completion);

    let now = Instant::now();
    let deadline = c.next_deadline().expect("pending deadline");
    assert!(deadline > now + Duration::from_secs(86_400 * 365));
    assert_eq!(c.expire(now + Duration::from_secs(86_400)), 0);

    assert_eq!(c.resolve(&frame.id, json!("pong")), Resolution::Delivered);
    assert_eq!(rx.await.unwrap().unwrap(), json!("pong"));
}
