//! Shared test doubles for the routing pipeline tests
#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use pricewatch::config::{PageSpec, WatchContext};
use pricewatch::notify::{Chat, ChatBackend, EventPublisher, Notifier, NotifyError, PriceEvent};
use pricewatch::poller::{FetchError, PollOutcome};

use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Notifier that records every send and can fail for selected chats
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<(i64, String)>>,
    pub fail_for: Vec<i64>,
}

impl RecordingNotifier {
    pub fn failing_for(chats: &[i64]) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail_for: chats.to_vec(),
        }
    }

    pub fn sent(&self) -> Vec<(i64, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, chat_id: i64, text: &str) -> Result<(), NotifyError> {
        if self.fail_for.contains(&chat_id) {
            return Err(NotifyError::Api(format!("chat {chat_id} refused")));
        }
        self.sent.lock().unwrap().push((chat_id, text.to_string()));
        Ok(())
    }
}

/// Backend that serves a fixed chat list and counts fetches
pub struct FakeBackend {
    pub chats: Vec<Chat>,
    pub fail: bool,
    pub calls: AtomicUsize,
}

impl FakeBackend {
    pub fn with_chats(ids: &[i64]) -> Self {
        Self {
            chats: ids.iter().map(|&id| Chat { id }).collect(),
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            chats: Vec::new(),
            fail: true,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatBackend for FakeBackend {
    async fn chat_list(&self, _timeout: Duration) -> Result<Vec<Chat>, NotifyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(NotifyError::Api("backend unavailable".into()));
        }
        Ok(self.chats.clone())
    }
}

/// Publisher that records every event
#[derive(Default)]
pub struct RecordingPublisher {
    pub events: Mutex<Vec<PriceEvent>>,
}

impl RecordingPublisher {
    pub fn events(&self) -> Vec<PriceEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventPublisher for RecordingPublisher {
    async fn publish(&self, event: &PriceEvent, _timeout: Duration) -> Result<(), NotifyError> {
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}

/// One page spec as the tests configure it
pub fn page_spec(id: &str, url: &str, product: Option<&str>) -> PageSpec {
    PageSpec {
        id: Some(id.to_string()),
        url: url.to_string(),
        product: product.map(String::from),
        interval_secs: 3600,
        random_delay: false,
    }
}

/// Context with every collaborator wired in
pub fn full_context(
    notifier: Arc<RecordingNotifier>,
    backend: Arc<FakeBackend>,
    publisher: Arc<RecordingPublisher>,
    admin_chat_id: i64,
    threshold: f64,
    pages: Vec<PageSpec>,
) -> Arc<WatchContext> {
    Arc::new(WatchContext {
        threshold,
        site_name: "My Website".to_string(),
        backend_endpoint: "backend.local:8989".to_string(),
        pages: pages
            .into_iter()
            .filter_map(|p| p.id.clone().map(|id| (id, p)))
            .collect(),
        notifier: Some(notifier),
        backend: Some(backend),
        publisher: Some(publisher),
        admin_chat_id,
    })
}

/// Serve one canned response and fetch it, yielding a real `reqwest::Response`
///
/// The mock server is returned so it outlives the streamed body.
pub async fn canned_response(status: u16, body: &str) -> (MockServer, reqwest::Response) {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(&server)
        .await;

    let response = reqwest::get(server.uri()).await.expect("mock fetch");
    (server, response)
}

/// Outcome carrying a successful fetch
pub fn ok_outcome(page_id: &str, response: reqwest::Response) -> PollOutcome {
    PollOutcome {
        page_id: page_id.to_string(),
        response: Some(response),
        error: None,
    }
}

/// Serve a response that declares more body than it sends
///
/// The headers arrive intact, so the router sees a 200, but the connection
/// closes mid-body and reading the text fails.
pub async fn truncated_response() -> reqwest::Response {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");

    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.expect("accept");
        let mut buf = [0u8; 1024];
        let _ = stream.read(&mut buf).await;
        let _ = stream
            .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 1000\r\n\r\n<html>")
            .await;
        let _ = stream.shutdown().await;
    });

    reqwest::get(format!("http://{addr}/"))
        .await
        .expect("headers should arrive")
}

/// Outcome carrying a transport error
pub fn error_outcome(page_id: &str) -> PollOutcome {
    PollOutcome {
        page_id: page_id.to_string(),
        response: None,
        error: Some(FetchError::InvalidUrl("connection refused".to_string())),
    }
}
