//! Monitoring core between `vampgotchi-ble` and the appliance's consumers
//! (render loop, web console, CLI).
//!
//! - **[`Coordinator`]**: sole owner of [`SystemState`]. Validates
//!   [`Command`]s, flips the mode synchronously, runs scans and attacks on
//!   the Tokio runtime outside its lock, and applies their outcomes. Also
//!   drives the idle heartbeat and the auto-scan timer.
//!
//! - **[`StateStream`]**: published snapshots as a `Stream`, feeding the
//!   console's live event endpoint.
//!
//! - **[`mood`]**: pure mood derivation and idle decay.
//!
//! - **[`BleBackend`]**: the narrow scan/attack contract. Implemented for
//!   [`vampgotchi_ble::BleedingClient`] in [`convert`].
//!
//! - **Domain model** ([`model`]): [`DeviceRecord`], [`DeviceAddress`],
//!   [`Vitals`], [`Theme`] and the state enums.

pub mod backend;
pub mod command;
pub mod config;
pub mod convert;
pub mod coordinator;
pub mod error;
pub mod model;
pub mod mood;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use backend::{AttackSummary, BleBackend};
pub use command::{Ack, ActivityHandle, ActivityKind, Command};
pub use config::CoordinatorConfig;
pub use coordinator::Coordinator;
pub use error::{BackendError, BackendErrorKind, CommandError, CoreError};
pub use mood::{derive_mood, idle_decay};
pub use stream::StateStream;

pub use model::{
    ActivityEvent, ActivityLog, Counters, DeviceAddress, DeviceRecord, Ink, LastError, Mode, Mood,
    NetworkMode, SystemState, Theme, ThemePreset, Vitals, format_uptime,
};
