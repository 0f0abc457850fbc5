//! End-to-end pipeline test
//!
//! Drives the real orchestrator and pollers against a wiremock page server,
//! with recording fakes standing in for the notification collaborators.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{page_spec, FakeBackend, RecordingNotifier, RecordingPublisher};
use pricewatch::config::ConfigState;
use pricewatch::orchestrator::Orchestrator;

use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Poll a page priced at 250 with a threshold of 300: the price is below
/// threshold, so every subscribed chat gets exactly one message.
#[tokio::test]
async fn test_watch_broadcasts_to_every_subscribed_chat() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><body><span id="price">250</span></body></html>"#,
        ))
        .mount(&server)
        .await;

    let notifier = Arc::new(RecordingNotifier::default());
    let backend = Arc::new(FakeBackend::with_chats(&[1, 2]));
    let publisher = Arc::new(RecordingPublisher::default());

    let state = ConfigState::new();
    state
        .set_pages(vec![page_spec("poller-id-1", &server.uri(), Some("iPhone 12"))])
        .unwrap();
    state.set_notifier_handle(notifier.clone()).unwrap();
    state.set_backend_handle(backend.clone()).unwrap();
    state.set_publisher_handle(publisher.clone()).unwrap();
    state.set_admin_chat_id(9).unwrap();

    let ctx = Arc::new(state.freeze(300.0, "My Website".to_string()));
    let handle = Orchestrator::new(ctx).start();
    assert_eq!(handle.started(), 1);

    // The first poll fires immediately; wait for both sends to land.
    let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
    loop {
        if notifier.sent().len() >= 2 {
            break;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "broadcast did not complete in time: {:?}",
            notifier.sent()
        );
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    handle.shutdown().await;

    let sent = notifier.sent();
    assert_eq!(sent.len(), 2, "exactly one send per chat");
    let chats: Vec<i64> = sent.iter().map(|(id, _)| *id).collect();
    assert_eq!(chats, vec![1, 2]);
    for (_, message) in &sent {
        assert!(message.contains("250"), "message should carry the price: {message}");
        assert!(message.contains("iPhone 12"));
    }

    assert_eq!(backend.call_count(), 1, "one chat-list fetch per broadcast");
    assert!(publisher.events().is_empty(), "no price event below threshold");
}

/// Above the threshold the event is published and no broadcast happens.
#[tokio::test]
async fn test_watch_publishes_price_event_above_threshold() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><body><span id="price">420</span></body></html>"#,
        ))
        .mount(&server)
        .await;

    let notifier = Arc::new(RecordingNotifier::default());
    let backend = Arc::new(FakeBackend::with_chats(&[1, 2]));
    let publisher = Arc::new(RecordingPublisher::default());

    let state = ConfigState::new();
    state
        .set_pages(vec![page_spec("poller-id-2", &server.uri(), None)])
        .unwrap();
    state.set_notifier_handle(notifier.clone()).unwrap();
    state.set_backend_handle(backend.clone()).unwrap();
    state.set_publisher_handle(publisher.clone()).unwrap();

    let ctx = Arc::new(state.freeze(300.0, "My Website".to_string()));
    let handle = Orchestrator::new(ctx).start();

    let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
    loop {
        if !publisher.events().is_empty() {
            break;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "price event was not published in time"
        );
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    handle.shutdown().await;

    let events = publisher.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].price, 420.0);
    assert!(notifier.sent().is_empty(), "no broadcast above threshold");
    assert_eq!(backend.call_count(), 0);
}
