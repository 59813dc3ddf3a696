#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use axum::{
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri},
    response::IntoResponse,
    Json, Router,
};
use serde_json::{json, Value as JsonValue};

#[derive(Clone)]
pub struct MockResponse {
    pub status: StatusCode,
    pub body: MockBody,
    pub delay: Duration,
}

#[derive(Clone)]
pub enum MockBody {
    Json(JsonValue),
    Text(String),
}

impl MockResponse {
    pub fn json(status: StatusCode, body: JsonValue) -> Self {
        Self {
            status,
            body: MockBody::Json(body),
            delay: Duration::from_millis(0),
        }
    }

    pub fn text(status: StatusCode, body: &str) -> Self {
        Self {
            status,
            body: MockBody::Text(body.to_owned()),
            delay: Duration::from_millis(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[derive(Clone, Debug)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: String,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    pub fn json(&self) -> JsonValue {
        serde_json::from_str(&self.body).expect("request body must be JSON")
    }
}

#[derive(Clone)]
struct MockState {
    routes: Arc<HashMap<String, MockResponse>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    hits: Arc<AtomicUsize>,
}

async fn handler(
    State(state): State<MockState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> impl IntoResponse {
    state.hits.fetch_add(1, Ordering::SeqCst);
    state
        .requests
        .lock()
        .expect("request log mutex must not be poisoned")
        .push(RecordedRequest {
            method: method.clone(),
            path: uri.path().to_owned(),
            query: uri.query().map(str::to_owned),
            headers,
            body,
        });

    let key = format!("{method} {}", uri.path());
    let response = state.routes.get(&key).cloned().unwrap_or_else(|| {
        MockResponse::json(
            StatusCode::NOT_FOUND,
            json!({ "messages": [format!("no mock route for {key}")] }),
        )
    });

    if !response.delay.is_zero() {
        tokio::time::sleep(response.delay).await;
    }

    match response.body {
        MockBody::Json(body) => (response.status, Json(body)).into_response(),
        MockBody::Text(body) => (response.status, body).into_response(),
    }
}

pub struct TestServer {
    pub base_url: String,
    pub hits: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    task: tokio::task::JoinHandle<()>,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl TestServer {
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .expect("request log mutex must not be poisoned")
            .clone()
    }

    pub fn last_request(&self) -> RecordedRequest {
        self.requests()
            .pop()
            .expect("server must have received a request")
    }
}

/// Spawns a server answering `"METHOD /path"` keys with canned responses.
/// Unknown routes get a 404.
pub async fn spawn_server(routes: Vec<(&str, MockResponse)>) -> TestServer {
    let state = MockState {
        routes: Arc::new(
            routes
                .into_iter()
                .map(|(key, response)| (key.to_owned(), response))
                .collect(),
        ),
        requests: Arc::new(Mutex::new(Vec::new())),
        hits: Arc::new(AtomicUsize::new(0)),
    };

    let app = Router::new().fallback(handler).with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("must bind test listener");
    let address = listener.local_addr().expect("must have local addr");
    let task = tokio::spawn(async move {
        axum::serve(listener, app)
            .await
            .expect("mock server must run");
    });

    TestServer {
        base_url: format!("http://{address}"),
        hits: state.hits,
        requests: state.requests,
        task,
    }
}

/// Base URL of a port nothing listens on, so connecting is refused.
pub fn unreachable_host() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("must bind probe listener");
    let address = listener.local_addr().expect("must have local addr");
    drop(listener);
    format!("http://{address}")
}

/// A host that never completes a TCP handshake: its accept queue is full,
/// so the kernel drops further SYNs and connecting times out.
pub struct SilentHost {
    pub base_url: String,
    _listener: tokio::net::TcpListener,
    _backlog: Vec<tokio::net::TcpStream>,
}

pub async fn silent_host() -> SilentHost {
    let socket = tokio::net::TcpSocket::new_v4().expect("must create socket");
    socket
        .bind("127.0.0.1:0".parse().expect("must parse addr"))
        .expect("must bind silent host");
    let address = socket.local_addr().expect("must have local addr");
    let listener = socket.listen(1).expect("must listen");

    let mut backlog = Vec::new();
    for _ in 0..4 {
        let connect = tokio::net::TcpStream::connect(address);
        if let Ok(Ok(stream)) = tokio::time::timeout(Duration::from_millis(200), connect).await {
            backlog.push(stream);
        }
    }

    SilentHost {
        base_url: format!("http://{address}"),
        _listener: listener,
        _backlog: backlog,
    }
}

pub fn job_json(ws: &str, js: &str, name: &str, start_time: &str) -> JsonValue {
    json!({
        "name": name,
        "jobDefinition": {
            "jobDefinitionInPlanKey": { "workstationInPlanKey": { "name": ws } }
        },
        "jobStreamInPlan": { "name": js, "startTime": start_time },
        "status": { "internalStatus": "SUCC" }
    })
}
