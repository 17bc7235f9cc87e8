#![allow(clippy::unwrap_used)]
// Coordinator behaviour against a scripted backend.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use futures_util::StreamExt;
use futures_util::future::BoxFuture;
use pretty_assertions::assert_eq;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use vampgotchi_core::{
    Ack, AttackSummary, BackendError, BackendErrorKind, BleBackend, Command, CommandError,
    Coordinator, CoordinatorConfig, DeviceAddress, DeviceRecord, Ink, Mode, Mood, NetworkMode,
    Theme,
};

// ── Scripted backend ────────────────────────────────────────────────

/// What the next backend call does.
enum Step<T> {
    /// Resolve immediately.
    Ready(Result<T, BackendError>),
    /// Resolve once the gate is notified (or report Cancelled).
    Gated(Arc<Notify>, Result<T, BackendError>),
    /// Run until cancelled.
    Hang,
}

#[derive(Default)]
struct ScriptedBackend {
    scans: Mutex<VecDeque<Step<Vec<DeviceRecord>>>>,
    attacks: Mutex<VecDeque<Step<()>>>,
    scan_calls: AtomicUsize,
    attack_calls: AtomicUsize,
}

impl ScriptedBackend {
    fn with_scans(steps: impl IntoIterator<Item = Step<Vec<DeviceRecord>>>) -> Arc<Self> {
        let backend = Self::default();
        backend.scans.lock().unwrap().extend(steps);
        Arc::new(backend)
    }

    fn push_attack(&self, step: Step<()>) {
        self.attacks.lock().unwrap().push_back(step);
    }
}

async fn play<T>(step: Step<T>, cancel: CancellationToken) -> Result<T, BackendError> {
    match step {
        Step::Ready(result) => result,
        Step::Gated(gate, result) => {
            tokio::select! {
                () = gate.notified() => result,
                () = cancel.cancelled() => Err(BackendError::cancelled()),
            }
        }
        Step::Hang => {
            cancel.cancelled().await;
            Err(BackendError::cancelled())
        }
    }
}

impl BleBackend for ScriptedBackend {
    fn scan(
        &self,
        _timeout: Duration,
        cancel: CancellationToken,
    ) -> BoxFuture<'_, Result<Vec<DeviceRecord>, BackendError>> {
        self.scan_calls.fetch_add(1, Ordering::SeqCst);
        let step = self
            .scans
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Step::Ready(Ok(Vec::new())));
        Box::pin(play(step, cancel))
    }

    fn attack(
        &self,
        target: DeviceAddress,
        duration: Duration,
        cancel: CancellationToken,
    ) -> BoxFuture<'_, Result<AttackSummary, BackendError>> {
        self.attack_calls.fetch_add(1, Ordering::SeqCst);
        let step = self
            .attacks
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Step::Ready(Ok(())));
        Box::pin(async move {
            play(step, cancel).await.map(|()| AttackSummary {
                target,
                requested: duration,
                elapsed: Duration::ZERO,
            })
        })
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

fn device(addr: &str, rssi: i32) -> DeviceRecord {
    DeviceRecord::new(DeviceAddress::new(addr), Some("Test"), rssi, Utc::now())
}

fn quiet_config() -> CoordinatorConfig {
    CoordinatorConfig {
        scan_interval: Duration::ZERO,
        tick: Duration::from_secs(3),
        ..CoordinatorConfig::default()
    }
}

fn coordinator(backend: Arc<ScriptedBackend>) -> Coordinator {
    Coordinator::new(quiet_config(), backend)
}

fn scan() -> Command {
    Command::StartScan {
        timeout: Some(Duration::from_secs(5)),
    }
}

fn attack() -> Command {
    Command::StartAttack {
        duration: Some(Duration::from_secs(10)),
        target: None,
    }
}

fn timeout_error() -> BackendError {
    BackendError::new(BackendErrorKind::Timeout, "BLE tool timed out after 7s")
}

async fn run(coord: &Coordinator, command: Command) -> Result<(), BackendError> {
    let ack = coord.submit_command(command).unwrap();
    ack.into_activity().unwrap().finished().await
}

// ── Scan scenarios ──────────────────────────────────────────────────

#[tokio::test]
async fn test_scan_success_updates_state() {
    let backend = ScriptedBackend::with_scans([Step::Ready(Ok(vec![device(
        "AA:BB:CC:DD:EE:FF",
        -60,
    )]))]);
    let coord = coordinator(backend);

    let ack = coord.submit_command(scan()).unwrap();
    let snap = coord.snapshot();
    assert_eq!(snap.mode, Mode::Scanning);
    assert_eq!(snap.mood, Mood::Excited);

    ack.into_activity().unwrap().finished().await.unwrap();

    let snap = coord.snapshot();
    assert_eq!(snap.mode, Mode::Idle);
    assert_eq!(snap.devices.len(), 1);
    assert_eq!(snap.devices[0].signal_strength, -60);
    assert_eq!(snap.counters.total_scans, 1);
    assert_eq!(snap.counters.devices_found_last_scan, 1);
    assert_eq!(snap.mood, Mood::Happy);
    assert_eq!(snap.last_error, None);
}

#[tokio::test]
async fn test_external_scan_completion_resolves_mode() {
    let coord = coordinator(ScriptedBackend::with_scans([Step::Hang]));
    let handle = coord.submit_command(scan()).unwrap().into_activity().unwrap();

    coord.on_scan_completed(Ok(vec![device("AA:BB:CC:DD:EE:FF", -60)]));

    handle.finished().await.unwrap();
    let snap = coord.snapshot();
    assert_eq!(snap.mode, Mode::Idle);
    assert_eq!(snap.devices.len(), 1);
    assert_eq!(snap.mood, Mood::Happy);

    // The hung backend call is cancelled; its late completion must not
    // clobber the applied state.
    tokio::task::yield_now().await;
    tokio::task::yield_now().await;
    let later = coord.snapshot();
    assert_eq!(later.mode, Mode::Idle);
    assert_eq!(later.last_error, None);
}

#[tokio::test]
async fn test_scan_while_scanning_is_already_busy() {
    let coord = coordinator(ScriptedBackend::with_scans([Step::Hang]));
    coord.submit_command(scan()).unwrap();
    let before = coord.snapshot();

    let err = coord.submit_command(scan()).unwrap_err();

    assert_eq!(
        err,
        CommandError::AlreadyBusy {
            mode: Mode::Scanning
        }
    );
    assert_eq!(*coord.snapshot(), *before);
}

#[tokio::test]
async fn test_scan_timeout_sets_error_and_keeps_devices() {
    let backend = ScriptedBackend::with_scans([
        Step::Ready(Ok(vec![device("AA:BB:CC:DD:EE:FF", -60)])),
        Step::Ready(Err(timeout_error())),
    ]);
    let coord = coordinator(backend);
    run(&coord, scan()).await.unwrap();
    let devices_before = coord.snapshot().devices.clone();

    let err = run(&coord, scan()).await.unwrap_err();

    assert_eq!(err.kind, BackendErrorKind::Timeout);
    let snap = coord.snapshot();
    assert_eq!(snap.mode, Mode::Error);
    assert_eq!(snap.mood, Mood::Sad);
    assert_eq!(snap.last_error.as_ref().unwrap().kind, BackendErrorKind::Timeout);
    assert_eq!(snap.devices, devices_before);
    assert_eq!(snap.counters.total_scans, 1);
}

#[tokio::test]
async fn test_error_is_not_terminal_and_success_clears_last_error() {
    let backend = ScriptedBackend::with_scans([
        Step::Ready(Err(timeout_error())),
        Step::Ready(Ok(vec![])),
    ]);
    let coord = coordinator(backend);

    run(&coord, scan()).await.unwrap_err();
    assert_eq!(coord.snapshot().mode, Mode::Error);

    run(&coord, scan()).await.unwrap();
    let snap = coord.snapshot();
    assert_eq!(snap.mode, Mode::Idle);
    assert_eq!(snap.last_error, None);
    assert_eq!(snap.mood, Mood::Bored);
}

#[tokio::test]
async fn test_empty_scan_is_success_and_bored() {
    let coord = coordinator(ScriptedBackend::with_scans([Step::Ready(Ok(vec![]))]));
    run(&coord, scan()).await.unwrap();

    let snap = coord.snapshot();
    assert_eq!(snap.mode, Mode::Idle);
    assert_eq!(snap.mood, Mood::Bored);
    assert_eq!(snap.counters.total_scans, 1);
    assert_eq!(snap.activity.recent(1).next(), Some("> No devices found"));
}

// ── Target selection ────────────────────────────────────────────────

#[tokio::test]
async fn test_select_target_requires_known_device() {
    let coord = coordinator(ScriptedBackend::with_scans([Step::Ready(Ok(vec![device(
        "AA:BB:CC:DD:EE:FF",
        -60,
    )]))]));
    run(&coord, scan()).await.unwrap();

    let err = coord
        .submit_command(Command::SelectTarget {
            address: DeviceAddress::new("11:22:33:44:55:66"),
        })
        .unwrap_err();
    assert!(matches!(err, CommandError::UnknownDevice { .. }));
    assert_eq!(coord.snapshot().selected_target, None);

    coord
        .submit_command(Command::SelectTarget {
            address: DeviceAddress::new("aa-bb-cc-dd-ee-ff"),
        })
        .unwrap();
    assert_eq!(
        coord.snapshot().selected_target,
        Some(DeviceAddress::new("AA:BB:CC:DD:EE:FF"))
    );
}

#[tokio::test]
async fn test_rescan_clears_missing_selection_and_keeps_present_one() {
    let backend = ScriptedBackend::with_scans([
        Step::Ready(Ok(vec![device("AA:00:00:00:00:01", -60), device("AA:00:00:00:00:02", -70)])),
        Step::Ready(Ok(vec![device("AA:00:00:00:00:01", -55)])),
        Step::Ready(Ok(vec![device("AA:00:00:00:00:02", -65)])),
    ]);
    let coord = coordinator(backend);
    run(&coord, scan()).await.unwrap();
    coord
        .submit_command(Command::SelectTarget {
            address: DeviceAddress::new("AA:00:00:00:00:01"),
        })
        .unwrap();

    run(&coord, scan()).await.unwrap();
    assert_eq!(
        coord.snapshot().selected_target,
        Some(DeviceAddress::new("AA:00:00:00:00:01"))
    );

    run(&coord, scan()).await.unwrap();
    assert_eq!(coord.snapshot().selected_target, None);
}

// ── Attack scenarios ────────────────────────────────────────────────

#[tokio::test]
async fn test_attack_without_target_is_rejected() {
    let coord = coordinator(ScriptedBackend::with_scans([]));
    let before = coord.snapshot();

    let err = coord.submit_command(attack()).unwrap_err();

    assert_eq!(err, CommandError::NoTargetSelected);
    assert_eq!(coord.snapshot().mode, before.mode);
}

#[tokio::test]
async fn test_no_target_selected_wins_over_busy() {
    let coord = coordinator(ScriptedBackend::with_scans([Step::Hang]));
    coord.submit_command(scan()).unwrap();

    let err = coord.submit_command(attack()).unwrap_err();
    assert_eq!(err, CommandError::NoTargetSelected);
}

#[tokio::test]
async fn test_attack_lifecycle() {
    let backend = ScriptedBackend::with_scans([Step::Ready(Ok(vec![device(
        "AA:BB:CC:DD:EE:FF",
        -60,
    )]))]);
    let gate = Arc::new(Notify::new());
    backend.push_attack(Step::Gated(Arc::clone(&gate), Ok(())));
    let coord = coordinator(Arc::clone(&backend));

    run(&coord, scan()).await.unwrap();
    coord
        .submit_command(Command::SelectTarget {
            address: DeviceAddress::new("AA:BB:CC:DD:EE:FF"),
        })
        .unwrap();

    let handle = coord.submit_command(attack()).unwrap().into_activity().unwrap();
    let snap = coord.snapshot();
    assert_eq!(snap.mode, Mode::Attacking);
    assert_eq!(snap.mood, Mood::Angry);
    assert!(snap.selected_target.is_some());

    // A scan cannot start while attacking.
    assert!(matches!(
        coord.submit_command(scan()),
        Err(CommandError::AlreadyBusy {
            mode: Mode::Attacking
        })
    ));

    gate.notify_one();
    handle.finished().await.unwrap();

    let snap = coord.snapshot();
    assert_eq!(snap.mode, Mode::Idle);
    assert_eq!(snap.counters.total_attacks, 1);
    assert_eq!(snap.mood, Mood::Happy);
    assert_eq!(backend.attack_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_attack_failure_returns_to_error_not_attacking() {
    let backend = ScriptedBackend::with_scans([Step::Ready(Ok(vec![device(
        "AA:BB:CC:DD:EE:FF",
        -60,
    )]))]);
    backend.push_attack(Step::Ready(Err(BackendError::new(
        BackendErrorKind::ProcessFailed { exit_code: Some(1) },
        "adapter busy",
    ))));
    let coord = coordinator(backend);
    run(&coord, scan()).await.unwrap();
    coord
        .submit_command(Command::SelectTarget {
            address: DeviceAddress::new("AA:BB:CC:DD:EE:FF"),
        })
        .unwrap();

    run(&coord, attack()).await.unwrap_err();

    let snap = coord.snapshot();
    assert_eq!(snap.mode, Mode::Error);
    assert_eq!(snap.counters.total_attacks, 0);
    assert_eq!(
        snap.last_error.as_ref().unwrap().kind,
        BackendErrorKind::ProcessFailed { exit_code: Some(1) }
    );
}

fn attack_on(address: &str) -> Command {
    Command::StartAttack {
        duration: Some(Duration::from_secs(10)),
        target: Some(DeviceAddress::new(address)),
    }
}

fn select(address: &str) -> Command {
    Command::SelectTarget {
        address: DeviceAddress::new(address),
    }
}

fn two_devices() -> Step<Vec<DeviceRecord>> {
    Step::Ready(Ok(vec![
        device("AA:BB:CC:DD:EE:01", -60),
        device("AA:BB:CC:DD:EE:02", -70),
    ]))
}

#[tokio::test]
async fn test_attack_with_target_selects_it() {
    let coord = coordinator(ScriptedBackend::with_scans([two_devices()]));
    run(&coord, scan()).await.unwrap();
    coord.submit_command(select("AA:BB:CC:DD:EE:01")).unwrap();

    run(&coord, attack_on("aa:bb:cc:dd:ee:02")).await.unwrap();

    let snap = coord.snapshot();
    assert_eq!(snap.selected_target, Some(DeviceAddress::new("AA:BB:CC:DD:EE:02")));
    assert_eq!(snap.counters.total_attacks, 1);
}

#[tokio::test]
async fn test_rejected_attack_leaves_selection_untouched() {
    let coord = coordinator(ScriptedBackend::with_scans([two_devices(), Step::Hang]));
    run(&coord, scan()).await.unwrap();
    coord.submit_command(select("AA:BB:CC:DD:EE:01")).unwrap();
    coord.submit_command(scan()).unwrap();
    let before = coord.snapshot();

    let err = coord.submit_command(attack_on("AA:BB:CC:DD:EE:02")).unwrap_err();
    assert_eq!(err, CommandError::AlreadyBusy { mode: Mode::Scanning });

    let err = coord.submit_command(attack_on("11:22:33:44:55:66")).unwrap_err();
    assert!(matches!(err, CommandError::UnknownDevice { .. }));

    assert_eq!(*coord.snapshot(), *before);
    assert_eq!(before.selected_target, Some(DeviceAddress::new("AA:BB:CC:DD:EE:01")));

    coord.submit_command(Command::StopActivity).unwrap();
}

#[tokio::test]
async fn test_target_is_locked_while_attacking() {
    let backend = ScriptedBackend::with_scans([two_devices()]);
    let gate = Arc::new(Notify::new());
    backend.push_attack(Step::Gated(Arc::clone(&gate), Ok(())));
    let coord = coordinator(Arc::clone(&backend));
    run(&coord, scan()).await.unwrap();
    coord.submit_command(select("AA:BB:CC:DD:EE:01")).unwrap();

    let handle = coord.submit_command(attack()).unwrap().into_activity().unwrap();

    let err = coord.submit_command(select("AA:BB:CC:DD:EE:02")).unwrap_err();
    assert_eq!(err, CommandError::AlreadyBusy { mode: Mode::Attacking });
    let err = coord.submit_command(attack_on("AA:BB:CC:DD:EE:02")).unwrap_err();
    assert_eq!(err, CommandError::AlreadyBusy { mode: Mode::Attacking });
    assert_eq!(
        coord.snapshot().selected_target,
        Some(DeviceAddress::new("AA:BB:CC:DD:EE:01"))
    );

    gate.notify_one();
    handle.finished().await.unwrap();
    coord.submit_command(select("AA:BB:CC:DD:EE:02")).unwrap();
    assert_eq!(
        coord.snapshot().selected_target,
        Some(DeviceAddress::new("AA:BB:CC:DD:EE:02"))
    );
}

// ── Stop ────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_stop_cancels_in_flight_scan() {
    let coord = coordinator(ScriptedBackend::with_scans([Step::Hang]));
    let handle = coord.submit_command(scan()).unwrap().into_activity().unwrap();

    let ack = coord.submit_command(Command::StopActivity).unwrap();
    assert!(matches!(ack, Ack::Applied));

    let err = handle.finished().await.unwrap_err();
    assert!(err.is_cancelled());

    let snap = coord.snapshot();
    assert_eq!(snap.mode, Mode::Error);
    assert_eq!(snap.last_error.as_ref().unwrap().kind, BackendErrorKind::Cancelled);
    assert_eq!(snap.activity.recent(1).next(), Some("> Stopped"));
}

#[tokio::test]
async fn test_stop_when_idle_is_noop_and_clears_error_mode() {
    let coord = coordinator(ScriptedBackend::with_scans([Step::Ready(Err(timeout_error()))]));
    assert!(matches!(
        coord.submit_command(Command::StopActivity).unwrap(),
        Ack::NoOp
    ));

    run(&coord, scan()).await.unwrap_err();
    coord.submit_command(Command::StopActivity).unwrap();

    let snap = coord.snapshot();
    assert_eq!(snap.mode, Mode::Idle);
    assert!(snap.last_error.is_some());
}

// ── Configuration commands ──────────────────────────────────────────

#[tokio::test]
async fn test_network_and_theme_changes_do_not_touch_mode() {
    let coord = coordinator(ScriptedBackend::with_scans([Step::Hang]));
    coord.submit_command(scan()).unwrap();

    coord
        .submit_command(Command::SetNetworkMode {
            mode: NetworkMode::AccessPoint,
        })
        .unwrap();
    coord
        .submit_command(Command::SetTheme {
            theme: Theme::WHITE,
        })
        .unwrap();

    let snap = coord.snapshot();
    assert_eq!(snap.mode, Mode::Scanning);
    assert_eq!(snap.network_mode, NetworkMode::AccessPoint);
    assert_eq!(snap.theme, Theme::WHITE);
}

#[tokio::test]
async fn test_invalid_theme_is_rejected() {
    let coord = coordinator(ScriptedBackend::with_scans([]));
    let err = coord
        .submit_command(Command::SetTheme {
            theme: Theme {
                foreground: Ink::White,
                background: Ink::White,
            },
        })
        .unwrap_err();
    assert!(matches!(err, CommandError::InvalidTheme { .. }));
    assert_eq!(coord.snapshot().theme, Theme::default());
}

// ── Concurrency ─────────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_scans_admit_exactly_one() {
    let gate = Arc::new(Notify::new());
    let backend = ScriptedBackend::with_scans([Step::Gated(Arc::clone(&gate), Ok(vec![]))]);
    let coord = coordinator(Arc::clone(&backend));

    let mut tasks = Vec::new();
    for _ in 0..16 {
        let coord = coord.clone();
        tasks.push(tokio::spawn(async move { coord.submit_command(scan()) }));
    }

    let mut accepted = Vec::new();
    let mut busy = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(ack) => accepted.push(ack),
            Err(CommandError::AlreadyBusy { .. }) => busy += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
    assert_eq!(accepted.len(), 1);
    assert_eq!(busy, 15);

    gate.notify_one();
    accepted.pop().unwrap().into_activity().unwrap().finished().await.unwrap();
    assert_eq!(backend.scan_calls.load(Ordering::SeqCst), 1);
    assert_eq!(coord.snapshot().mode, Mode::Idle);
}

#[tokio::test]
async fn test_subscribers_never_see_scanning_with_new_devices() {
    let gate = Arc::new(Notify::new());
    let coord = coordinator(ScriptedBackend::with_scans([Step::Gated(
        Arc::clone(&gate),
        Ok(vec![device("AA:BB:CC:DD:EE:FF", -60)]),
    )]));
    let mut stream = coord.subscribe();

    let handle = coord.submit_command(scan()).unwrap().into_activity().unwrap();
    let scanning = stream.next().await.unwrap();
    assert_eq!(scanning.mode, Mode::Scanning);
    assert!(scanning.devices.is_empty());

    gate.notify_one();
    handle.finished().await.unwrap();
    let done = stream.next().await.unwrap();
    assert_eq!(done.mode, Mode::Idle);
    assert_eq!(done.devices.len(), 1);
}

// ── Heartbeat & background tasks ────────────────────────────────────

#[tokio::test]
async fn test_idle_ticks_fade_happy_to_bored() {
    let config = CoordinatorConfig {
        idle_ticks_before_bored: 3,
        ..quiet_config()
    };
    let coord = Coordinator::new(
        config,
        ScriptedBackend::with_scans([Step::Ready(Ok(vec![device("AA:BB:CC:DD:EE:FF", -60)]))]),
    );
    run(&coord, scan()).await.unwrap();
    assert_eq!(coord.snapshot().mood, Mood::Happy);

    coord.tick();
    coord.tick();
    assert_eq!(coord.snapshot().mood, Mood::Happy);
    coord.tick();
    assert_eq!(coord.snapshot().mood, Mood::Bored);
}

#[tokio::test]
async fn test_idle_minutes_cost_hunger() {
    let config = CoordinatorConfig {
        tick: Duration::from_secs(30),
        ..quiet_config()
    };
    let coord = Coordinator::new(config, ScriptedBackend::with_scans([]));
    let start = coord.snapshot().vitals.hunger;

    coord.tick();
    assert_eq!(coord.snapshot().vitals.hunger, start);
    coord.tick();
    assert_eq!(coord.snapshot().vitals.hunger, start - 1);
}

#[tokio::test]
async fn test_ticks_do_not_count_while_busy() {
    let config = CoordinatorConfig {
        idle_ticks_before_bored: 1,
        ..quiet_config()
    };
    let coord = Coordinator::new(config, ScriptedBackend::with_scans([Step::Hang]));
    coord.submit_command(scan()).unwrap();

    coord.tick();
    assert_eq!(coord.snapshot().mood, Mood::Excited);
}

#[tokio::test]
async fn test_stray_completion_is_ignored() {
    let coord = coordinator(ScriptedBackend::with_scans([]));
    coord.on_attack_completed(Ok(AttackSummary {
        target: DeviceAddress::new("AA:BB:CC:DD:EE:FF"),
        requested: Duration::from_secs(1),
        elapsed: Duration::from_secs(1),
    }));
    coord.on_scan_completed(Err(timeout_error()));

    let snap = coord.snapshot();
    assert_eq!(snap.mode, Mode::Idle);
    assert_eq!(snap.counters.total_attacks, 0);
    assert_eq!(snap.last_error, None);
}

#[tokio::test(start_paused = true)]
async fn test_auto_scan_runs_on_interval() {
    let backend = ScriptedBackend::with_scans([]);
    let config = CoordinatorConfig {
        scan_interval: Duration::from_secs(60),
        ..quiet_config()
    };
    let coord = Coordinator::new(config, Arc::clone(&backend) as Arc<dyn BleBackend>);
    coord.start();

    tokio::time::sleep(Duration::from_secs(61)).await;
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    assert_eq!(backend.scan_calls.load(Ordering::SeqCst), 1);
    assert_eq!(coord.snapshot().counters.total_scans, 1);

    coord.shutdown().await;
}

#[tokio::test]
async fn test_shutdown_resolves_in_flight_scan() {
    let coord = coordinator(ScriptedBackend::with_scans([Step::Hang]));
    let handle = coord.submit_command(scan()).unwrap().into_activity().unwrap();

    coord.shutdown().await;

    assert!(handle.finished().await.unwrap_err().is_cancelled());
    assert_eq!(coord.snapshot().mode, Mode::Error);
}
