// ── Monitoring coordinator ──
//
// Sole owner of `SystemState`. Every mutation happens under one mutex and
// is published to a `watch` channel before the lock is released, so readers
// only ever see whole states. Backend calls run in spawned tasks outside the
// lock and report back through the completion path.

use std::future::Future;
use std::mem;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::backend::{AttackSummary, BleBackend};
use crate::command::{Ack, ActivityHandle, ActivityKind, Command, CompletionSlot};
use crate::config::CoordinatorConfig;
use crate::error::{BackendError, BackendErrorKind, CommandError, CoreError};
use crate::model::{
    ActivityEvent, DeviceAddress, DeviceRecord, LastError, Mode, NetworkMode, SystemState, Theme,
    dedup_by_address, merge_devices,
};
use crate::mood::{derive_mood, idle_decay};
use crate::stream::StateStream;

/// How long `shutdown()` waits for an in-flight operation to resolve.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

const SECS_PER_MINUTE: u64 = 60;

// ── Coordinator ──────────────────────────────────────────────────

/// The single serialization point for appliance state.
///
/// Cheaply cloneable via `Arc<CoordinatorInner>`. Commands are validated
/// and applied synchronously; scans and attacks are launched on the Tokio
/// runtime and resolved through [`on_scan_completed`](Self::on_scan_completed)
/// / [`on_attack_completed`](Self::on_attack_completed) semantics.
#[derive(Clone)]
pub struct Coordinator {
    inner: Arc<CoordinatorInner>,
}

struct CoordinatorInner {
    config: CoordinatorConfig,
    backend: Arc<dyn BleBackend>,
    core: Mutex<CoreState>,
    state_tx: watch::Sender<Arc<SystemState>>,
    cancel: CancellationToken,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

/// Everything guarded by the writer lock.
struct CoreState {
    state: SystemState,
    activity: Option<Activity>,
    next_activity_id: u64,
    idle_ticks: u32,
    idle_elapsed: Duration,
}

/// The in-flight scan or attack. `Some` exactly while mode is busy.
struct Activity {
    id: u64,
    kind: ActivityKind,
    cancel: CancellationToken,
    done: watch::Sender<CompletionSlot>,
}

enum Outcome {
    Scan(Result<Vec<DeviceRecord>, BackendError>),
    Attack(Result<AttackSummary, BackendError>),
}

impl Outcome {
    fn kind(&self) -> ActivityKind {
        match self {
            Self::Scan(_) => ActivityKind::Scan,
            Self::Attack(_) => ActivityKind::Attack,
        }
    }
}

impl Coordinator {
    /// Create a coordinator in `Idle`. Background tasks are not running
    /// until [`start()`](Self::start).
    pub fn new(config: CoordinatorConfig, backend: Arc<dyn BleBackend>) -> Self {
        let state = SystemState::new(Utc::now(), config.network_mode, config.theme);
        let (state_tx, _) = watch::channel(Arc::new(state.clone()));

        Self {
            inner: Arc::new(CoordinatorInner {
                config,
                backend,
                core: Mutex::new(CoreState {
                    state,
                    activity: None,
                    next_activity_id: 1,
                    idle_ticks: 0,
                    idle_elapsed: Duration::ZERO,
                }),
                state_tx,
                cancel: CancellationToken::new(),
                task_handles: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.inner.config
    }

    // ── Reads ────────────────────────────────────────────────────

    /// Immutable copy of the latest published state.
    pub fn snapshot(&self) -> Arc<SystemState> {
        self.inner.state_tx.borrow().clone()
    }

    /// Subscribe to every published state change.
    pub fn subscribe(&self) -> StateStream {
        StateStream::new(self.inner.state_tx.subscribe())
    }

    // ── Commands ─────────────────────────────────────────────────

    /// Validate and apply `command`.
    ///
    /// `StartScan` and `StartAttack` flip the mode here and launch the
    /// backend call on the current Tokio runtime; the returned
    /// [`ActivityHandle`] resolves once the outcome has been applied.
    pub fn submit_command(&self, command: Command) -> Result<Ack, CommandError> {
        let mut core = self.lock();
        let result = match command {
            Command::StartScan { timeout } => self.start_scan(&mut core, timeout),
            Command::StartAttack { duration, target } => {
                self.start_attack(&mut core, duration, target)
            }
            Command::SelectTarget { address } => select_target(&mut core.state, address),
            Command::StopActivity => Ok(stop_activity(&mut core)),
            Command::SetNetworkMode { mode } => Ok(set_network_mode(&mut core.state, mode)),
            Command::SetTheme { theme } => set_theme(&mut core.state, theme),
        };
        if matches!(result, Ok(Ack::Started(_) | Ack::Applied)) {
            self.publish(&core);
        }
        result
    }

    /// Submit `command` and, for scans and attacks, wait for the outcome.
    /// Returns the state published after the command (or its completion).
    pub async fn execute(&self, command: Command) -> Result<Arc<SystemState>, CoreError> {
        if let Some(handle) = self.submit_command(command)?.into_activity() {
            debug!(id = handle.id(), kind = %handle.kind(), "waiting for activity");
            handle.finished().await?;
        }
        Ok(self.snapshot())
    }

    // ── Completions ──────────────────────────────────────────────

    /// Resolve the in-flight scan with `outcome`.
    ///
    /// Ignored (with a warning) when no scan is in flight.
    pub fn on_scan_completed(&self, outcome: Result<Vec<DeviceRecord>, BackendError>) {
        self.complete_current(Outcome::Scan(outcome));
    }

    /// Resolve the in-flight attack with `outcome`.
    ///
    /// Ignored (with a warning) when no attack is in flight.
    pub fn on_attack_completed(&self, outcome: Result<AttackSummary, BackendError>) {
        self.complete_current(Outcome::Attack(outcome));
    }

    // ── Heartbeat ────────────────────────────────────────────────

    /// Advance idle bookkeeping by one heartbeat.
    ///
    /// Only counts while `Idle`: starves hunger one point per elapsed
    /// minute and lets upbeat moods fade to bored.
    pub fn tick(&self) {
        let mut core = self.lock();
        if core.state.mode != Mode::Idle {
            return;
        }
        let config = &self.inner.config;
        let mut changed = false;

        core.idle_ticks = core.idle_ticks.saturating_add(1);
        core.idle_elapsed += config.tick;

        let minutes = core.idle_elapsed.as_secs() / SECS_PER_MINUTE;
        if minutes > 0 {
            core.idle_elapsed -= Duration::from_secs(minutes * SECS_PER_MINUTE);
            core.state
                .vitals
                .on_idle_minutes(u32::try_from(minutes).unwrap_or(u32::MAX));
            changed = true;
        }

        let mood = idle_decay(core.state.mood, core.idle_ticks, config.idle_ticks_before_bored);
        if mood != core.state.mood {
            debug!(from = %core.state.mood, to = %mood, idle_ticks = core.idle_ticks, "mood faded");
            core.state.mood = mood;
            changed = true;
        }

        if changed {
            self.publish(&core);
        }
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Spawn the heartbeat and auto-scan tasks. Calling twice is a no-op.
    pub fn start(&self) {
        let mut handles = self
            .inner
            .task_handles
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if !handles.is_empty() {
            return;
        }

        let config = &self.inner.config;
        if !config.tick.is_zero() {
            let cancel = self.inner.cancel.clone();
            handles.push(tokio::spawn(heartbeat_task(self.clone(), config.tick, cancel)));
        }
        if !config.scan_interval.is_zero() {
            let cancel = self.inner.cancel.clone();
            handles.push(tokio::spawn(auto_scan_task(
                self.clone(),
                config.scan_interval,
                cancel,
            )));
        }
        info!(
            tick_secs = config.tick.as_secs(),
            scan_interval_secs = config.scan_interval.as_secs(),
            "coordinator started"
        );
    }

    /// Cancel background tasks and any in-flight operation, then wait
    /// (bounded) for that operation's completion to be applied.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();

        let handles = mem::take(
            &mut *self
                .inner
                .task_handles
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );
        for handle in handles {
            let _ = handle.await;
        }

        let pending = self.lock().activity.as_ref().map(|a| a.done.subscribe());
        if let Some(mut done) = pending {
            let timed_out = tokio::time::timeout(SHUTDOWN_GRACE, done.wait_for(Option::is_some))
                .await
                .is_err();
            if timed_out {
                warn!("in-flight operation did not stop within the shutdown grace period");
            }
        }
        debug!("coordinator stopped");
    }

    // ── Internals ────────────────────────────────────────────────

    fn lock(&self) -> MutexGuard<'_, CoreState> {
        self.inner.core.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Publish the guarded state. Must be called with the lock held.
    fn publish(&self, core: &CoreState) {
        self.inner.state_tx.send_replace(Arc::new(core.state.clone()));
    }

    fn start_scan(&self, core: &mut CoreState, timeout: Option<Duration>) -> Result<Ack, CommandError> {
        ensure_not_busy(&core.state)?;
        let timeout = timeout.unwrap_or(self.inner.config.scan_timeout);
        let (id, cancel, handle) = self.begin_activity(core, ActivityKind::Scan);

        let state = &mut core.state;
        state.mode = Mode::Scanning;
        state.mood = derive_mood(state.mood, state.mode, state.counters.devices_found_last_scan, false);
        state.vitals.on_scan_started();
        state.activity.push(ActivityEvent::ScanStarted);
        info!(id, timeout_secs = timeout.as_secs(), "scan started");

        let backend = Arc::clone(&self.inner.backend);
        let coordinator = self.clone();
        tokio::spawn(async move {
            let outcome = supervise(async move { backend.scan(timeout, cancel).await }).await;
            coordinator.complete(id, Outcome::Scan(outcome));
        });

        Ok(Ack::Started(handle))
    }

    /// Every check runs before the first mutation, so a rejected attack
    /// leaves the selection as it was.
    fn start_attack(
        &self,
        core: &mut CoreState,
        duration: Option<Duration>,
        requested: Option<DeviceAddress>,
    ) -> Result<Ack, CommandError> {
        let target = match requested {
            Some(address) if core.state.device(&address).is_none() => {
                return Err(CommandError::UnknownDevice { address });
            }
            Some(address) => address,
            None => core
                .state
                .selected_target
                .clone()
                .ok_or(CommandError::NoTargetSelected)?,
        };
        ensure_not_busy(&core.state)?;
        let duration = duration.unwrap_or(self.inner.config.attack_duration);
        let (id, cancel, handle) = self.begin_activity(core, ActivityKind::Attack);

        let state = &mut core.state;
        state.selected_target = Some(target.clone());
        state.mode = Mode::Attacking;
        state.mood = derive_mood(state.mood, state.mode, state.counters.devices_found_last_scan, false);
        state.activity.push(ActivityEvent::AttackStarted);
        if state.vitals.on_attack_started() {
            state.activity.push(ActivityEvent::LevelUp);
        }
        info!(id, target = %target, duration_secs = duration.as_secs(), "attack started");

        let backend = Arc::clone(&self.inner.backend);
        let coordinator = self.clone();
        tokio::spawn(async move {
            let outcome =
                supervise(async move { backend.attack(target, duration, cancel).await }).await;
            coordinator.complete(id, Outcome::Attack(outcome));
        });

        Ok(Ack::Started(handle))
    }

    fn begin_activity(
        &self,
        core: &mut CoreState,
        kind: ActivityKind,
    ) -> (u64, CancellationToken, ActivityHandle) {
        let id = core.next_activity_id;
        core.next_activity_id = core.next_activity_id.wrapping_add(1);

        let cancel = self.inner.cancel.child_token();
        let (done, done_rx) = watch::channel(None);
        core.activity = Some(Activity {
            id,
            kind,
            cancel: cancel.clone(),
            done,
        });
        (id, cancel, ActivityHandle::new(id, kind, done_rx))
    }

    /// Completion from the task spawned for activity `id`.
    fn complete(&self, id: u64, outcome: Outcome) {
        let mut core = self.lock();
        if core.activity.as_ref().map(|a| a.id) != Some(id) {
            debug!(id, kind = %outcome.kind(), "stale completion ignored");
            return;
        }
        self.apply(&mut core, outcome);
    }

    /// Completion reported from outside for whatever is in flight.
    fn complete_current(&self, outcome: Outcome) {
        let mut core = self.lock();
        let kind = outcome.kind();
        if core.activity.as_ref().map(|a| a.kind) != Some(kind) {
            warn!(%kind, mode = %core.state.mode, "completion without a matching operation in flight, ignored");
            return;
        }
        self.apply(&mut core, outcome);
    }

    fn apply(&self, core: &mut CoreState, outcome: Outcome) {
        let Some(activity) = core.activity.take() else {
            return;
        };
        // Stops a still-running backend call when the outcome came from outside.
        activity.cancel.cancel();

        let now = Utc::now();
        let result = match outcome {
            Outcome::Scan(r) => {
                apply_scan(&mut core.state, r, self.inner.config.device_retention, now)
            }
            Outcome::Attack(r) => apply_attack(&mut core.state, r, now),
        };
        core.idle_ticks = 0;
        core.idle_elapsed = Duration::ZERO;

        self.publish(core);
        activity.done.send_replace(Some(result));
    }
}

// ── State transitions ────────────────────────────────────────────

fn ensure_not_busy(state: &SystemState) -> Result<(), CommandError> {
    if state.mode.is_busy() {
        return Err(CommandError::AlreadyBusy { mode: state.mode });
    }
    Ok(())
}

/// Retargeting mid-attack is refused so the selection always names the
/// device under attack.
fn select_target(state: &mut SystemState, address: DeviceAddress) -> Result<Ack, CommandError> {
    if state.mode == Mode::Attacking {
        return Err(CommandError::AlreadyBusy { mode: state.mode });
    }
    if state.device(&address).is_none() {
        return Err(CommandError::UnknownDevice { address });
    }
    if state.selected_target.as_ref() == Some(&address) {
        return Ok(Ack::NoOp);
    }
    debug!(target = %address, "target selected");
    state.selected_target = Some(address);
    Ok(Ack::Applied)
}

fn stop_activity(core: &mut CoreState) -> Ack {
    if let Some(activity) = &core.activity {
        info!(id = activity.id, kind = %activity.kind, "stop requested");
        activity.cancel.cancel();
        return Ack::Applied;
    }
    if core.state.mode == Mode::Error {
        core.state.mode = Mode::Idle;
        return Ack::Applied;
    }
    Ack::NoOp
}

fn set_network_mode(state: &mut SystemState, mode: NetworkMode) -> Ack {
    if state.network_mode == mode {
        return Ack::NoOp;
    }
    info!(from = %state.network_mode, to = %mode, "network mode changed");
    state.network_mode = mode;
    Ack::Applied
}

fn set_theme(state: &mut SystemState, theme: Theme) -> Result<Ack, CommandError> {
    theme.validate()?;
    if state.theme == theme {
        return Ok(Ack::NoOp);
    }
    state.theme = theme;
    Ok(Ack::Applied)
}

fn apply_scan(
    state: &mut SystemState,
    result: Result<Vec<DeviceRecord>, BackendError>,
    retention: Option<Duration>,
    now: DateTime<Utc>,
) -> Result<(), BackendError> {
    let records = match result {
        Ok(records) => dedup_by_address(records),
        Err(err) => {
            record_failure(state, &err, ActivityEvent::ScanFailed, now);
            warn!(error = %err, kind = err.kind.code(), "scan failed");
            return Err(err);
        }
    };

    let found = records.len();
    state.devices = merge_devices(&state.devices, records, retention, now);
    if state
        .selected_target
        .as_ref()
        .is_some_and(|sel| state.device(sel).is_none())
    {
        debug!("selected target no longer present, selection cleared");
        state.selected_target = None;
    }

    state.counters.total_scans = state.counters.total_scans.saturating_add(1);
    state.counters.devices_found_last_scan = found;
    state.last_error = None;
    state.mode = Mode::Idle;
    state.mood = derive_mood(state.mood, state.mode, found, false);

    if found == 0 {
        state.activity.push(ActivityEvent::NoDevices);
    } else {
        state.activity.push(ActivityEvent::DevicesFound);
        if state.vitals.on_scan_completed(found) {
            state.activity.push(ActivityEvent::LevelUp);
        }
    }
    info!(found, listed = state.devices.len(), "scan completed");
    Ok(())
}

fn apply_attack(
    state: &mut SystemState,
    result: Result<AttackSummary, BackendError>,
    now: DateTime<Utc>,
) -> Result<(), BackendError> {
    let summary = match result {
        Ok(summary) => summary,
        Err(err) => {
            record_failure(state, &err, ActivityEvent::AttackFailed, now);
            warn!(error = %err, kind = err.kind.code(), "attack failed");
            return Err(err);
        }
    };

    state.counters.total_attacks = state.counters.total_attacks.saturating_add(1);
    state.last_error = None;
    state.mode = Mode::Idle;
    state.mood = derive_mood(
        state.mood,
        state.mode,
        state.counters.devices_found_last_scan,
        false,
    );
    state.activity.push(ActivityEvent::AttackCompleted);
    info!(
        target = %summary.target,
        elapsed_ms = u64::try_from(summary.elapsed.as_millis()).unwrap_or(u64::MAX),
        "attack completed"
    );
    Ok(())
}

/// Failure path shared by scans and attacks. Devices are left untouched.
fn record_failure(
    state: &mut SystemState,
    err: &BackendError,
    event: ActivityEvent,
    now: DateTime<Utc>,
) {
    let event = if err.is_cancelled() {
        ActivityEvent::Stopped
    } else {
        event
    };
    state.activity.push(event);
    state.last_error = Some(LastError::new(err.clone(), now));
    state.mode = Mode::Error;
    state.mood = derive_mood(state.mood, state.mode, state.counters.devices_found_last_scan, true);
}

// ── Background tasks ─────────────────────────────────────────────

/// Run a backend call in its own task so a panic inside it still resolves
/// the pending mode transition.
async fn supervise<T, F>(call: F) -> Result<T, BackendError>
where
    T: Send + 'static,
    F: Future<Output = Result<T, BackendError>> + Send + 'static,
{
    match tokio::spawn(call).await {
        Ok(outcome) => outcome,
        Err(join_err) => {
            warn!(error = %join_err, "backend task aborted");
            Err(BackendError::new(
                BackendErrorKind::ProcessFailed { exit_code: None },
                format!("backend task aborted: {join_err}"),
            ))
        }
    }
}

async fn heartbeat_task(coordinator: Coordinator, period: Duration, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(period);
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => coordinator.tick(),
        }
    }
}

async fn auto_scan_task(coordinator: Coordinator, period: Duration, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval.tick().await;

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                match coordinator.submit_command(Command::StartScan { timeout: None }) {
                    Ok(_) => debug!("auto-scan started"),
                    Err(CommandError::AlreadyBusy { mode }) => {
                        debug!(%mode, "auto-scan skipped, busy");
                    }
                    Err(e) => warn!(error = %e, "auto-scan rejected"),
                }
            }
        }
    }
}
