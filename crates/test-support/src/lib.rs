//! Shared test helpers: an in-process stub standing in for the partner API.
//!
//! `StubPartner` binds an ephemeral localhost port, records every request
//! it receives (method, path, auth header, JSON body), and answers each
//! path with a canned status/body, optionally after a delay. Tests point a
//! transport factory at `base_url()` and assert on both the returned
//! result and the recorded wire traffic.

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use parking_lot::Mutex;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// One request observed by the stub.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub body: Option<Value>,
}

/// Canned answer for one path.
#[derive(Debug, Clone)]
pub struct CannedResponse {
    pub status: u16,
    pub body: Value,
    pub delay: Option<Duration>,
}

impl CannedResponse {
    #[must_use]
    pub fn ok(body: Value) -> Self {
        Self {
            status: 200,
            body,
            delay: None,
        }
    }

    #[must_use]
    pub fn status(status: u16, body: Value) -> Self {
        Self {
            status,
            body,
            delay: None,
        }
    }

    #[must_use]
    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[derive(Clone)]
struct StubState {
    responses: Arc<HashMap<String, CannedResponse>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

/// An in-process partner stub. Shuts down when dropped.
pub struct StubPartner {
    base_url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    shutdown: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl StubPartner {
    /// Start a stub on an ephemeral localhost port with the given
    /// path → response table.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot bind.
    pub async fn start(responses: HashMap<String, CannedResponse>) -> anyhow::Result<Self> {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let state = StubState {
            responses: Arc::new(responses),
            requests: Arc::clone(&requests),
        };

        let app = Router::new()
            .route("/{*path}", any(handle_request))
            .with_state(state);
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let server = axum::serve(listener, app).with_graceful_shutdown(async move {
            let _ = shutdown_rx.await;
        });
        let handle = tokio::spawn(async move {
            let _ = server.await;
        });

        Ok(Self {
            base_url: format!("http://{addr}"),
            requests,
            shutdown: Some(shutdown_tx),
            handle,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Snapshot of every request seen so far, in arrival order.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }
}

impl Drop for StubPartner {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        self.handle.abort();
    }
}

async fn handle_request(
    State(state): State<StubState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri.path().to_string();
    let header_str = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    state.requests.lock().push(RecordedRequest {
        method: method.to_string(),
        path: path.clone(),
        authorization: header_str(header::AUTHORIZATION),
        content_type: header_str(header::CONTENT_TYPE),
        body: serde_json::from_slice(&body).ok(),
    });

    let Some(canned) = state.responses.get(&path).cloned() else {
        return (
            StatusCode::NOT_FOUND,
            axum::Json(json!({ "error": format!("no stub for path {path}") })),
        )
            .into_response();
    };

    if let Some(delay) = canned.delay {
        tokio::time::sleep(delay).await;
    }

    let status = StatusCode::from_u16(canned.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, axum::Json(canned.body)).into_response()
}
