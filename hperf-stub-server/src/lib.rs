use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub mod config;
use config::{DEFAULT_DELAY, HELLO_BODY, MAX_SLEEP_MS};

/// JSON error envelope returned for invalid requests
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Clone)]
pub struct AppState {
    /// Delay before answering `GET /`.
    pub delay: Duration,
    hits: Arc<AtomicU64>,
}

impl AppState {
    pub fn new(delay: Duration) -> Self {
        Self { delay, hits: Arc::new(AtomicU64::new(0)) }
    }

    /// Requests served by `GET /` so far.
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::SeqCst)
    }
}

/// Stub server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub address: SocketAddr,
    pub delay: Duration,
}

impl ServerConfig {
    /// Bind an ephemeral localhost port with the default delay.
    pub fn ephemeral() -> Self {
        Self {
            address: SocketAddr::from(([127, 0, 0, 1], 0)),
            delay: DEFAULT_DELAY,
        }
    }
}

/// Stub HTTP target for load runs
pub struct Server {
    config: ServerConfig,
    state: AppState,
}

impl Server {
    /// Create a new server with the given configuration
    pub fn new(config: ServerConfig) -> Self {
        let state = AppState::new(config.delay);
        Self { config, state }
    }

    /// Get the server's configured address
    pub fn address(&self) -> SocketAddr {
        self.config.address
    }

    /// Handle to the shared state, usable after the server has been moved into `run`.
    pub fn state(&self) -> AppState {
        self.state.clone()
    }

    /// Create the application router with the given state
    pub fn create_router(state: AppState) -> Router {
        Router::new()
            .route("/", get(handle_root))
            .route("/status/:code", get(handle_status))
            .route("/sleep/:ms", get(handle_sleep))
            .with_state(state)
    }

    /// Run the server, signalling `ready_tx` with the bound address once accepting connections
    pub async fn run(self, ready_tx: tokio::sync::oneshot::Sender<SocketAddr>) -> Result<(), Box<dyn std::error::Error>> {
        let app = Self::create_router(self.state);
        let listener = tokio::net::TcpListener::bind(self.config.address).await?;
        let local_addr = listener.local_addr()?;
        tracing::debug!(%local_addr, "stub server bound");
        ready_tx.send(local_addr).ok();
        axum::serve(listener, app).await?;
        Ok(())
    }
}

/// Reserve `count` free TCP ports by binding to port 0 for each, then
/// releasing them all at once. Nothing listens on the returned ports, which
/// makes them reliable connection-refused targets.
pub fn pick_free_ports(count: usize) -> std::io::Result<Vec<u16>> {
    let listeners = (0..count)
        .map(|_| std::net::TcpListener::bind("127.0.0.1:0"))
        .collect::<std::io::Result<Vec<_>>>()?;
    listeners.iter().map(|l| l.local_addr().map(|a| a.port())).collect()
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ErrorResponse { error: message.into() })).into_response()
}

/// Handler for GET /: waits the configured delay, then answers 200 with a short body.
pub async fn handle_root(State(state): State<AppState>) -> Response {
    state.hits.fetch_add(1, Ordering::SeqCst);
    if !state.delay.is_zero() {
        tokio::time::sleep(state.delay).await;
    }
    (StatusCode::OK, HELLO_BODY).into_response()
}

/// Handler for GET /status/:code: answers with the requested status code.
pub async fn handle_status(Path(code): Path<u16>) -> Response {
    match StatusCode::from_u16(code) {
        Ok(status) => (status, format!("status {code}\n")).into_response(),
        Err(_) => error_response(StatusCode::BAD_REQUEST, format!("Invalid status code: {code}")),
    }
}

/// Handler for GET /sleep/:ms: answers 200 after sleeping `ms` milliseconds.
pub async fn handle_sleep(Path(ms): Path<u64>) -> Response {
    if ms > MAX_SLEEP_MS {
        return error_response(
            StatusCode::BAD_REQUEST,
            format!("Sleep exceeds maximum of {MAX_SLEEP_MS} ms"),
        );
    }
    tokio::time::sleep(Duration::from_millis(ms)).await;
    (StatusCode::OK, format!("slept {ms} ms\n")).into_response()
}
