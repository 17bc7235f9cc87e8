//! Web control surface.
//!
//! JSON API over the coordinator plus a single-page console. Commands go
//! through `submit_command`; reads use `snapshot()`, and `/api/events`
//! pushes every published state as a server-sent event. Theme and network
//! changes are written back to the config file when one is known.

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::{StatusCode, header};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use futures_util::{Stream, StreamExt};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use vampgotchi_ble::BleedingClient;
use vampgotchi_config::{Config, save_config};
use vampgotchi_core::{
    Ack, BackendError, Command, CommandError, Coordinator, CoreError, DeviceAddress, SystemState,
    Theme, format_uptime,
};
use vampgotchi_display::AddressSource;

use crate::api::{
    AttackRequest, ErrorBody, ErrorDetail, NetworkRequest, ScanRequest, StatusReport,
    TargetRequest, ThemeRequest, WaitQuery,
};
use crate::net::NetworkSwitcher;

const CONSOLE_HTML: &str = include_str!("console.html");

/// Limit for the adapter status command behind `/api/debug/bluetooth`.
const ADAPTER_STATUS_TIMEOUT: Duration = Duration::from_secs(5);

// ── State ────────────────────────────────────────────────────────────

/// What the console needs from the running daemon.
pub struct WebContext {
    pub coordinator: Coordinator,
    pub config: Config,
    /// Where theme/network changes are saved; `None` keeps them in memory.
    pub config_path: Option<PathBuf>,
    pub switcher: NetworkSwitcher,
    pub address: AddressSource,
    /// Source of `/api/debug/scan`.
    pub tool: Option<BleedingClient>,
    /// Program + args behind `/api/debug/bluetooth`.
    pub adapter_command: Vec<String>,
}

#[derive(Clone)]
pub struct AppState {
    inner: Arc<WebInner>,
}

struct WebInner {
    coordinator: Coordinator,
    config: Mutex<Config>,
    config_path: Option<PathBuf>,
    switcher: NetworkSwitcher,
    address: AddressSource,
    tool: Option<BleedingClient>,
    adapter_command: Vec<String>,
}

impl AppState {
    pub fn new(ctx: WebContext) -> Self {
        Self {
            inner: Arc::new(WebInner {
                coordinator: ctx.coordinator,
                config: Mutex::new(ctx.config),
                config_path: ctx.config_path,
                switcher: ctx.switcher,
                address: ctx.address,
                tool: ctx.tool,
                adapter_command: ctx.adapter_command,
            }),
        }
    }

    fn coordinator(&self) -> &Coordinator {
        &self.inner.coordinator
    }

    fn report(&self) -> StatusReport {
        self.report_for(&self.coordinator().snapshot())
    }

    fn report_for(&self, snapshot: &SystemState) -> StatusReport {
        StatusReport {
            uptime: format_uptime(snapshot.uptime(Utc::now())),
            ip: (self.inner.address)(),
            state: snapshot.clone(),
        }
    }

    /// Submit `command`; with `wait`, block until a started activity ends.
    async fn dispatch(&self, command: Command, wait: bool) -> Result<Accepted, ApiError> {
        if wait {
            return Ok(Accepted(self.coordinator().execute(command).await?));
        }
        self.coordinator().submit_command(command)?;
        Ok(Accepted(self.coordinator().snapshot()))
    }

    /// Apply `update` to the live config and save it.
    fn persist(&self, update: impl FnOnce(&mut Config)) {
        let mut config = self
            .inner
            .config
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        update(&mut config);
        if let Some(path) = &self.inner.config_path {
            match save_config(&config, path) {
                Ok(()) => debug!(path = %path.display(), "config saved"),
                Err(e) => warn!(path = %path.display(), error = %e, "failed to save config"),
            }
        }
    }

    fn config_snapshot(&self) -> Config {
        self.inner
            .config
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

// ── Responses ────────────────────────────────────────────────────────

/// 202 with the post-command snapshot.
struct Accepted(Arc<SystemState>);

impl IntoResponse for Accepted {
    fn into_response(self) -> Response {
        (StatusCode::ACCEPTED, Json(self.0.as_ref())).into_response()
    }
}

#[derive(Debug)]
enum ApiError {
    Command(CommandError),
    Backend(BackendError),
    BadRequest(String),
    NotFound(String),
    /// A helper program the console shells out to failed.
    Upstream(String),
}

impl From<CommandError> for ApiError {
    fn from(err: CommandError) -> Self {
        Self::Command(err)
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Command(e) => Self::Command(e),
            CoreError::Backend(e) => Self::Backend(e),
        }
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Command(CommandError::AlreadyBusy { .. } | CommandError::NoTargetSelected) => {
                StatusCode::CONFLICT
            }
            Self::Command(CommandError::UnknownDevice { .. }) | Self::NotFound(_) => {
                StatusCode::NOT_FOUND
            }
            Self::Command(CommandError::InvalidTheme { .. }) | Self::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Backend(_) | Self::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn detail(&self) -> ErrorDetail {
        let (code, message) = match self {
            Self::Command(e) => (e.code(), e.to_string()),
            Self::Backend(e) => (e.kind.code(), e.message.clone()),
            Self::BadRequest(m) => ("BAD_REQUEST", m.clone()),
            Self::NotFound(m) => ("NOT_FOUND", m.clone()),
            Self::Upstream(m) => ("COMMAND_FAILED", m.clone()),
        };
        ErrorDetail {
            code: code.to_owned(),
            message,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = self.detail();
        if status.is_server_error() {
            warn!(code = %detail.code, message = %detail.message, "request failed");
        } else {
            debug!(code = %detail.code, message = %detail.message, "request rejected");
        }
        (status, Json(ErrorBody { error: detail })).into_response()
    }
}

// ── Router ───────────────────────────────────────────────────────────

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/status", get(status))
        .route("/api/events", get(events))
        .route("/api/scan", post(scan))
        .route("/api/target", post(select_target))
        .route("/api/attack", post(attack))
        .route("/api/stop", post(stop))
        .route("/api/network", post(network))
        .route("/api/theme", post(theme))
        .route("/api/config", get(config).post(update_config))
        .route("/api/debug/scan", get(debug_scan))
        .route("/api/debug/bluetooth", get(debug_bluetooth))
        .with_state(state)
}

/// Serve the console on `listener` until `cancel` fires.
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    cancel: CancellationToken,
) -> std::io::Result<()> {
    let addr = listener.local_addr()?;
    info!(%addr, "web console listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(cancel.cancelled_owned())
        .await?;
    info!("web console stopped");
    Ok(())
}

// ── Handlers ─────────────────────────────────────────────────────────

async fn index() -> Html<&'static str> {
    Html(CONSOLE_HTML)
}

async fn status(State(app): State<AppState>) -> Json<StatusReport> {
    Json(app.report())
}

/// One `status` event per published state, current state first.
async fn events(
    State(app): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let states = app.coordinator().subscribe();
    let feed = states.map(move |snapshot| {
        Event::default()
            .event("status")
            .json_data(app.report_for(&snapshot))
    });
    Sse::new(feed).keep_alive(KeepAlive::default())
}

async fn scan(
    State(app): State<AppState>,
    Query(query): Query<WaitQuery>,
    Json(body): Json<ScanRequest>,
) -> Result<Accepted, ApiError> {
    let command = Command::StartScan {
        timeout: body.timeout.map(Duration::from_secs),
    };
    app.dispatch(command, query.wait).await
}

async fn select_target(
    State(app): State<AppState>,
    Json(body): Json<TargetRequest>,
) -> Result<Accepted, ApiError> {
    let command = Command::SelectTarget {
        address: DeviceAddress::new(&body.address),
    };
    app.dispatch(command, false).await
}

async fn attack(
    State(app): State<AppState>,
    Query(query): Query<WaitQuery>,
    Json(body): Json<AttackRequest>,
) -> Result<Accepted, ApiError> {
    let command = Command::StartAttack {
        duration: body.duration.map(Duration::from_secs),
        target: body.address.as_deref().map(DeviceAddress::new),
    };
    app.dispatch(command, query.wait).await
}

async fn stop(State(app): State<AppState>) -> Result<Accepted, ApiError> {
    app.dispatch(Command::StopActivity, false).await
}

async fn network(
    State(app): State<AppState>,
    Json(body): Json<NetworkRequest>,
) -> Result<Accepted, ApiError> {
    let mode = body.mode;
    let ack = app
        .coordinator()
        .submit_command(Command::SetNetworkMode { mode })?;
    if matches!(ack, Ack::Applied) {
        if app.inner.switcher.switch(mode).is_none() {
            debug!(%mode, "no switch command configured");
        }
        app.persist(|c| c.network.mode = mode);
    }
    Ok(Accepted(app.coordinator().snapshot()))
}

async fn theme(
    State(app): State<AppState>,
    Json(body): Json<ThemeRequest>,
) -> Result<Accepted, ApiError> {
    let theme = resolve_theme(body)?;
    let ack = app.coordinator().submit_command(Command::SetTheme { theme })?;
    if matches!(ack, Ack::Applied) {
        app.persist(|c| c.set_theme(theme));
    }
    Ok(Accepted(app.coordinator().snapshot()))
}

fn resolve_theme(body: ThemeRequest) -> Result<Theme, ApiError> {
    match body {
        ThemeRequest {
            preset: Some(preset),
            foreground: None,
            background: None,
        } => Ok(Theme::preset(preset)),
        ThemeRequest {
            preset: None,
            foreground: Some(foreground),
            background: Some(background),
        } => Ok(Theme {
            foreground,
            background,
        }),
        _ => Err(ApiError::BadRequest(
            "expected either `preset` or both `foreground` and `background`".into(),
        )),
    }
}

async fn config(State(app): State<AppState>) -> Json<Config> {
    Json(app.config_snapshot())
}

/// Replace and save the configuration. The theme applies at once; other
/// sections take effect on the next start.
async fn update_config(
    State(app): State<AppState>,
    Json(body): Json<Config>,
) -> Result<Json<Config>, ApiError> {
    body.validate()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    app.coordinator()
        .submit_command(Command::SetTheme {
            theme: body.theme(),
        })?;
    info!("configuration replaced from the console");
    app.persist(move |c| *c = body);
    Ok(Json(app.config_snapshot()))
}

async fn debug_scan(State(app): State<AppState>) -> Result<Response, ApiError> {
    let raw = app
        .inner
        .tool
        .as_ref()
        .and_then(BleedingClient::last_scan_output)
        .ok_or_else(|| ApiError::NotFound("no scan output captured yet".into()))?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        raw.as_str().to_owned(),
    )
        .into_response())
}

async fn debug_bluetooth(State(app): State<AppState>) -> Result<Response, ApiError> {
    let output = adapter_status(&app.inner.adapter_command, ADAPTER_STATUS_TIMEOUT).await?;
    Ok(([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], output).into_response())
}

/// Run `argv` and return its stdout. Killed once `limit` elapses.
async fn adapter_status(argv: &[String], limit: Duration) -> Result<String, ApiError> {
    let (program, args) = argv
        .split_first()
        .ok_or_else(|| ApiError::NotFound("no adapter status command configured".into()))?;

    let mut command = tokio::process::Command::new(program);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    match tokio::time::timeout(limit, command.output()).await {
        Ok(Ok(out)) if out.status.success() => {
            Ok(String::from_utf8_lossy(&out.stdout).into_owned())
        }
        Ok(Ok(out)) => Err(ApiError::Upstream(format!(
            "{program} exited with {}: {}",
            out.status,
            String::from_utf8_lossy(&out.stderr).trim()
        ))),
        Ok(Err(e)) => Err(ApiError::Upstream(format!("could not run {program}: {e}"))),
        Err(_) => Err(ApiError::Upstream(format!(
            "{program} did not answer within {}s",
            limit.as_secs()
        ))),
    }
}
