// Not every helper is used in every test, so we allow dead code
#![allow(dead_code)]

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chat_client::transport::{HttpRequest, HttpResponse, Transport, TransportError};
use chat_client::ChatService;
use common_types::AppConfig;
use tokio::time::Instant;
use url::Url;

/// What the mock transport does on one call
#[derive(Debug, Clone)]
pub enum Step {
    Respond(u16, &'static str),
    Fail(TransportError),
    /// Never completes, so the caller's deadline fires
    Hang,
}

/// Scripted transport recording every request and when it was made
#[derive(Default)]
pub struct MockTransport {
    script: Mutex<VecDeque<Step>>,
    /// Used once the script runs out
    fallback: Option<Step>,
    requests: Mutex<Vec<(Instant, HttpRequest)>>,
}

impl MockTransport {
    pub fn scripted(steps: impl IntoIterator<Item = Step>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(steps.into_iter().collect()),
            fallback: None,
            requests: Mutex::default(),
        })
    }

    pub fn always(step: Step) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::default(),
            fallback: Some(step),
            requests: Mutex::default(),
        })
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|(_, request)| request.clone())
            .collect()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Time between consecutive calls
    pub fn gaps(&self) -> Vec<Duration> {
        let requests = self.requests.lock().unwrap();
        requests
            .windows(2)
            .map(|pair| pair[1].0.duration_since(pair[0].0))
            .collect()
    }

    fn next_step(&self) -> Step {
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .or_else(|| self.fallback.clone())
            .expect("mock transport script exhausted")
    }
}

#[async_trait::async_trait]
impl Transport for MockTransport {
    async fn post(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests
            .lock()
            .unwrap()
            .push((Instant::now(), request));

        match self.next_step() {
            Step::Respond(status, body) => Ok(HttpResponse {
                status,
                reason: reason(status).to_string(),
                body: body.to_string(),
            }),
            Step::Fail(err) => Err(err),
            Step::Hang => std::future::pending().await,
        }
    }

    async fn get(&self, _url: Url) -> Result<HttpResponse, TransportError> {
        Err(TransportError::Network("GET is not scripted".to_string()))
    }
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        _ => "",
    }
}

pub fn network_error() -> Step {
    Step::Fail(TransportError::Network("connection refused".to_string()))
}

pub fn ok_reply(body: &'static str) -> Step {
    Step::Respond(200, body)
}

/// Test configuration: 1s base backoff, 2 retries, 5s timeout
pub fn test_config() -> AppConfig {
    AppConfig {
        app_url: Url::parse("http://localhost:3000").unwrap(),
        local_endpoint: Url::parse("http://127.0.0.1:8080/invocations").unwrap(),
        remote_endpoint: Some(Url::parse("https://remote.example.com/chat").unwrap()),
        timeout: Duration::from_secs(5),
        max_retries: 2,
        retry_delay: Duration::from_secs(1),
        headers: BTreeMap::from([(
            "Content-Type".to_string(),
            "application/json".to_string(),
        )]),
    }
}

pub fn service_with(config: AppConfig, transport: Arc<MockTransport>) -> ChatService {
    ChatService::new(config, transport)
}
