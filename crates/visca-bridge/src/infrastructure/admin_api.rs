//! Admin HTTP API served with axum.
//!
//! | Method | Path                  | Body / response                         |
//! |--------|-----------------------|-----------------------------------------|
//! | GET    | `/`                   | admin UI page                           |
//! | GET    | `/api/stats`          | [`StatsResponse`]                       |
//! | GET    | `/api/presets`        | preset table, name → hex                |
//! | POST   | `/api/cmd`            | [`CommandRequest`] → [`CommandResponse`]|
//! | POST   | `/api/presets/:name`  | → [`CommandResponse`], 404 if unknown   |
//!
//! Command failures (bad hex, serial timeout) are part of the normal response
//! (`{"ok":false,...}` with status 200) because the UI shows them inline.
//! Only an unknown preset name is an HTTP error.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::{get, post};
use axum::{Json, Router};
use tokio::net::TcpListener;
use visca_core::stats::unix_timestamp;
use visca_core::{BridgeError, PresetTable, StatsSink};

use crate::application::status::build_status;
use crate::application::submit_command::CommandService;
use crate::domain::config::BridgeConfig;
use crate::domain::messages::{CommandRequest, CommandResponse, StatsResponse};

/// How often graceful shutdown re-checks the running flag.
const SHUTDOWN_POLL: Duration = Duration::from_millis(100);

/// Served at `/` when no UI file was configured or it could not be read.
pub const FALLBACK_INDEX: &str = "<!DOCTYPE html>\n\
<html><head><meta charset=\"utf-8\"><title>VISCA Bridge</title></head>\n\
<body><h1>VISCA Bridge</h1>\n\
<p>Admin UI not installed. JSON status: <a href=\"/api/stats\">/api/stats</a>, \
presets: <a href=\"/api/presets\">/api/presets</a>.</p>\n\
</body></html>\n";

/// Everything the handlers need, cloned into each request.
#[derive(Clone)]
pub struct AdminState {
    pub commands: Arc<CommandService>,
    pub sink: Arc<StatsSink>,
    pub presets: Arc<PresetTable>,
    pub config: Arc<BridgeConfig>,
    pub running: Arc<AtomicBool>,
    pub index_html: Arc<str>,
}

/// Builds the admin router.
pub fn router(state: AdminState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/stats", get(stats))
        .route("/api/presets", get(presets))
        .route("/api/presets/:name", post(run_preset))
        .route("/api/cmd", post(command))
        .with_state(state)
}

async fn index(State(state): State<AdminState>) -> Html<String> {
    Html(state.index_html.to_string())
}

async fn stats(State(state): State<AdminState>) -> Json<StatsResponse> {
    let running = state.running.load(Ordering::SeqCst);
    Json(build_status(&state.sink, &state.config, running, unix_timestamp()))
}

async fn presets(State(state): State<AdminState>) -> Json<PresetTable> {
    Json(PresetTable::clone(&state.presets))
}

async fn command(
    State(state): State<AdminState>,
    Json(request): Json<CommandRequest>,
) -> Json<CommandResponse> {
    Json(submit(&state.commands, &request.hex).await)
}

async fn run_preset(
    State(state): State<AdminState>,
    Path(name): Path<String>,
) -> (StatusCode, Json<CommandResponse>) {
    let Some(hex) = state.presets.get(&name) else {
        return (
            StatusCode::NOT_FOUND,
            Json(CommandResponse::failure_message(format!("Unknown preset: {name}"))),
        );
    };
    (StatusCode::OK, Json(submit(&state.commands, hex).await))
}

async fn submit(commands: &CommandService, hex: &str) -> CommandResponse {
    match commands.submit(hex).await {
        Ok(resp) => CommandResponse::success(resp),
        Err(e) => CommandResponse::failure(&e),
    }
}

/// A bound admin listener, ready to serve.
pub struct AdminServer {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl AdminServer {
    /// Binds the admin HTTP port.
    ///
    /// # Errors
    ///
    /// [`BridgeError::ListenerBindFailure`] if the address cannot be bound.
    pub async fn bind(addr: SocketAddr) -> Result<Self, BridgeError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| BridgeError::ListenerBindFailure { addr, source })?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| BridgeError::ListenerBindFailure { addr, source })?;
        Ok(Self {
            listener,
            local_addr,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Serves until `running` is cleared, then finishes in-flight requests.
    pub async fn run(self, state: AdminState) -> std::io::Result<()> {
        let running = Arc::clone(&state.running);
        state.sink.info(format!("Admin: {}", self.local_addr));
        axum::serve(self.listener, router(state))
            .with_graceful_shutdown(wait_until_stopped(running))
            .await
    }
}

async fn wait_until_stopped(running: Arc<AtomicBool>) {
    while running.load(Ordering::SeqCst) {
        tokio::time::sleep(SHUTDOWN_POLL).await;
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
