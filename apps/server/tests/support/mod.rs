//! Shared test harness: a mock upstream server standing in for the FHIR
//! repository / payment gateway / blob storage, and a `TestApp` wrapping the
//! real router wired against it.

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
    Json, Router,
};
use pons::{api::create_router, AppState, Config};
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tower::ServiceExt as _;

/// One request seen by the mock upstream.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub body: Value,
}

#[derive(Clone, Default)]
struct MockState {
    requests: Arc<Mutex<Vec<Recorded>>>,
    // Keyed by "METHOD /path" (query ignored); responses pop in FIFO order.
    responses: Arc<Mutex<HashMap<String, VecDeque<(u16, Value)>>>>,
    raw_responses: Arc<Mutex<HashMap<String, VecDeque<(u16, String, String)>>>>,
}

/// Mock upstream bound on a random local port.
pub struct MockUpstream {
    pub base_url: String,
    state: MockState,
}

impl MockUpstream {
    pub async fn spawn() -> Self {
        let state = MockState::default();
        let app = Router::new().fallback(handle).with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind mock");
        let addr = listener.local_addr().expect("mock addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("mock serve");
        });

        Self {
            base_url: format!("http://{addr}"),
            state,
        }
    }

    /// Queue a JSON response for the next `METHOD path` request.
    pub fn enqueue(&self, method: &str, path: &str, status: u16, body: Value) {
        self.state
            .responses
            .lock()
            .unwrap()
            .entry(format!("{method} {path}"))
            .or_default()
            .push_back((status, body));
    }

    /// Queue a non-JSON response (e.g. the blob-list XML).
    pub fn enqueue_raw(&self, method: &str, path: &str, status: u16, content_type: &str, body: &str) {
        self.state
            .raw_responses
            .lock()
            .unwrap()
            .entry(format!("{method} {path}"))
            .or_default()
            .push_back((status, content_type.to_string(), body.to_string()));
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.state.requests.lock().unwrap().clone()
    }

    /// Count recorded requests by method and path prefix.
    pub fn count(&self, method: &str, path_prefix: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.method == method && r.path.starts_with(path_prefix))
            .count()
    }
}

async fn handle(State(state): State<MockState>, req: Request) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let query = req.uri().query().map(String::from);

    let bytes = axum::body::to_bytes(req.into_body(), usize::MAX)
        .await
        .unwrap_or_default();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

    state.requests.lock().unwrap().push(Recorded {
        method: method.to_string(),
        path: path.clone(),
        query,
        body: body.clone(),
    });

    let key = format!("{method} {path}");

    if let Some((status, content_type, raw)) = state
        .raw_responses
        .lock()
        .unwrap()
        .get_mut(&key)
        .and_then(VecDeque::pop_front)
    {
        return (
            StatusCode::from_u16(status).unwrap(),
            [(header::CONTENT_TYPE, content_type)],
            raw,
        )
            .into_response();
    }

    if let Some((status, response_body)) = state
        .responses
        .lock()
        .unwrap()
        .get_mut(&key)
        .and_then(VecDeque::pop_front)
    {
        return (StatusCode::from_u16(status).unwrap(), Json(response_body)).into_response();
    }

    // Defaults: searches find nothing, writes succeed, deletes are empty.
    match method.as_str() {
        "GET" => Json(json!({
            "resourceType": "Bundle",
            "type": "searchset",
            "entry": []
        }))
        .into_response(),
        "POST" => {
            let mut created = body;
            if created.is_object() && created.get("id").is_none() {
                created["id"] = json!("generated-id");
            }
            (StatusCode::CREATED, Json(created)).into_response()
        }
        // Azure-style: blob/container PUTs answer 201 Created.
        "PUT" => (StatusCode::CREATED, Json(body)).into_response(),
        "DELETE" => StatusCode::NO_CONTENT.into_response(),
        _ => StatusCode::METHOD_NOT_ALLOWED.into_response(),
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub upstream: MockUpstream,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::new_with_config(|_| {}).await
    }

    pub async fn new_with_config(configure: impl FnOnce(&mut Config)) -> Self {
        let upstream = MockUpstream::spawn().await;

        let mut config = Config::default();
        config.fhir.base_url = upstream.base_url.clone();
        config.fhir.static_token = Some("test-token".to_string());
        config.payments.base_url = upstream.base_url.clone();
        config.payments.key_id = "rzp_test_key".to_string();
        config.payments.key_secret = "rzp_test_secret".to_string();
        config.blobs.account_url = upstream.base_url.clone();
        config.blobs.account_name = "acct".to_string();
        config.blobs.account_key = "dGVzdC1hY2NvdW50LWtleQ==".to_string();
        configure(&mut config);

        let state = AppState::new(config).await.expect("initialize AppState");
        let router = create_router(state.clone());

        Self {
            router,
            state,
            upstream,
        }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(value) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(value.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("build request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router response");

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read response body");
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        (status, value)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(body)).await
    }

    pub async fn put(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::PUT, uri, Some(body)).await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, None).await
    }
}
