// tests/bot_session.rs
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use course_review_bot::reply::{NOT_FOUND, USAGE_HINT};
use course_review_bot::request_log::RequestLog;
use course_review_bot::store::memory::MemoryStore;
use course_review_bot::telegram::{text_update, Chat, Message, MockTransport, Update};
use course_review_bot::{
    run, PollOutcome, ReviewFilter, ReviewRecord, ReviewStore, Session, SessionSettings,
};

const CHAT: i64 = 4242;
const FALLBACK: i64 = -1;

fn settings() -> SessionSettings {
    SessionSettings {
        poll_error_pause: Duration::ZERO,
        max_consecutive_poll_failures: 3,
        ..SessionSettings::default()
    }
}

fn fixture_store() -> Arc<MemoryStore> {
    Arc::new(MemoryStore::from_json_str(include_str!("fixtures/reviews.json")).unwrap())
}

fn session(transport: &Arc<MockTransport>, store: Arc<dyn ReviewStore>) -> Session {
    Session::new(transport.clone(), store, settings()).with_fallback_chat(Some(FALLBACK))
}

struct BrokenStore;

#[async_trait::async_trait]
impl ReviewStore for BrokenStore {
    async fn count_exact(&self, _f: &ReviewFilter, _cap: usize) -> Result<usize> {
        Err(anyhow!("connection refused"))
    }
    async fn text_search_names(&self, _t: &str, _l: usize) -> Result<Vec<String>> {
        Err(anyhow!("connection refused"))
    }
    async fn find_reviews(&self, _f: &ReviewFilter) -> Result<Vec<ReviewRecord>> {
        Err(anyhow!("connection refused"))
    }
    fn name(&self) -> &'static str {
        "broken"
    }
}

#[tokio::test]
async fn empty_batch_is_idle_and_keeps_offset() {
    let t = Arc::new(MockTransport::new().with_batch(vec![]));
    let mut s = session(&t, fixture_store());

    assert_eq!(s.poll_once().await.unwrap(), PollOutcome::Idle);
    assert_eq!(s.cursor().offset(), 0);
    assert!(!s.cursor().has_seen_any());
    assert!(t.sent_texts().is_empty());
}

#[tokio::test]
async fn every_update_in_batch_is_answered_in_order() {
    let t = Arc::new(
        MockTransport::new()
            .with_batch(vec![
                text_update(10, CHAT, "Ada", "CS101"),
                text_update(11, CHAT, "Bob", "Nope 999"),
            ])
            .with_batch(vec![]),
    );
    let mut s = session(&t, fixture_store());

    assert_eq!(s.poll_once().await.unwrap(), PollOutcome::Processed(2));
    assert_eq!(s.cursor().offset(), 12);

    let sent = t.sent_texts();
    assert_eq!(sent.len(), 4, "{sent:#?}");
    assert!(sent[0].contains("*Here's the reviews for* CS101 (ETH):"));
    assert!(sent[1].ends_with("Great intro, tough \\*exercises\\*."));
    assert!(sent[2].ends_with("Solid lectures."));
    assert_eq!(sent[3], NOT_FOUND);
    assert!(t.sent.lock().unwrap().iter().all(|(chat, _)| *chat == CHAT));

    // next poll asks for updates after the last one seen
    s.poll_once().await.unwrap();
    assert_eq!(*t.offsets.lock().unwrap(), vec![0, 12]);
}

#[tokio::test]
async fn malformed_and_non_text_updates_get_usage_hint_and_advance() {
    let sticker = Update {
        update_id: 21,
        message: Some(Message {
            chat: Chat { id: CHAT },
            from: None,
            text: None,
        }),
    };
    let edited = Update {
        update_id: 22,
        message: None,
    };
    let t = Arc::new(MockTransport::new().with_batch(vec![
        text_update(20, CHAT, "Ada", "a, b, c"),
        sticker,
        edited,
        text_update(23, CHAT, "Ada", "/help"),
    ]));
    let mut s = session(&t, fixture_store());

    assert_eq!(s.poll_once().await.unwrap(), PollOutcome::Processed(4));
    assert_eq!(s.cursor().offset(), 24);
    assert_eq!(t.sent_texts(), vec![USAGE_HINT.to_string(); 3]);
}

#[tokio::test]
async fn send_failures_do_not_stop_the_cycle() {
    let t = Arc::new(
        MockTransport::new()
            .with_batch(vec![text_update(5, CHAT, "Ada", "CS101, ETH")])
            .failing_sends(),
    );
    let mut s = session(&t, fixture_store());

    assert_eq!(s.poll_once().await.unwrap(), PollOutcome::Processed(1));
    // all three blocks were attempted
    assert_eq!(t.sent_texts().len(), 3);
    assert_eq!(s.cursor().offset(), 6);
}

#[tokio::test]
async fn store_failure_is_fatal_but_cursor_moved() {
    let t = Arc::new(MockTransport::new().with_batch(vec![text_update(7, CHAT, "Ada", "CS101")]));
    let mut s = session(&t, Arc::new(BrokenStore));

    let err = s.poll_once().await.unwrap_err();
    assert!(format!("{err:#}").contains("connection refused"));
    assert_eq!(s.cursor().offset(), 8);
    assert!(t.sent_texts().is_empty());
}

#[tokio::test]
async fn poll_failures_are_tolerated_up_to_limit() {
    let t = Arc::new(
        MockTransport::new()
            .with_poll_error("timeout")
            .with_poll_error("timeout")
            .with_batch(vec![text_update(1, CHAT, "Ada", "/start")])
            .with_poll_error("timeout")
            .with_poll_error("timeout")
            .with_poll_error("timeout"),
    );
    let mut s = session(&t, fixture_store());

    assert_eq!(s.poll_once().await.unwrap(), PollOutcome::Idle);
    assert_eq!(s.poll_once().await.unwrap(), PollOutcome::Idle);
    // a good poll resets the failure count
    assert_eq!(s.poll_once().await.unwrap(), PollOutcome::Processed(1));
    assert_eq!(s.poll_once().await.unwrap(), PollOutcome::Idle);
    assert_eq!(s.poll_once().await.unwrap(), PollOutcome::Idle);
    let err = s.poll_once().await.unwrap_err();
    assert!(format!("{err:#}").contains("3 times in a row"));
}

#[tokio::test]
async fn run_reports_fatal_error_to_fallback_chat() {
    let t = Arc::new(MockTransport::new().with_batch(vec![text_update(3, CHAT, "Ada", "CS101")]));
    let s = session(&t, Arc::new(BrokenStore));

    let err = run(s).await.unwrap_err();
    assert!(format!("{err:#}").contains("connection refused"));

    let sent = t.sent.lock().unwrap().clone();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, FALLBACK);
    assert!(sent[0]
        .1
        .starts_with("I encountered an error. Shutting down. Error:"));
}

#[tokio::test]
async fn processed_requests_are_logged() {
    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("requests.log");
    let t = Arc::new(MockTransport::new().with_batch(vec![
        text_update(1, CHAT, "Ada", "CS101"),
        text_update(2, CHAT, "Bob", "Linear, uzh"),
    ]));
    let mut s = session(&t, fixture_store()).with_request_log(RequestLog::new(&log_path));

    s.poll_once().await.unwrap();

    let content = std::fs::read_to_string(&log_path).unwrap();
    let lines: Vec<_> = content.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].ends_with("\tAda\tCS101"));
    assert!(lines[1].ends_with("\tBob\tLinear, uzh"));
}
