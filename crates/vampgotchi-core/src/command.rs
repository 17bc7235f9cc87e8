// ── Command API ──
//
// All external mutations of `SystemState` flow through `Command`.
// Reads go through `Coordinator::snapshot()` instead.

use std::time::Duration;

use strum::Display;
use tokio::sync::watch;

use crate::error::BackendError;
use crate::model::{DeviceAddress, NetworkMode, Theme};

/// Every mutation an external caller can request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Scan for devices. `None` uses the configured scan timeout.
    StartScan { timeout: Option<Duration> },
    SelectTarget { address: DeviceAddress },
    /// Attack `target`, or the selected target when `None`. A given target
    /// becomes the selection only if the attack is accepted. `None` duration
    /// uses the configured one.
    StartAttack {
        duration: Option<Duration>,
        target: Option<DeviceAddress>,
    },
    /// Best-effort cancel of the in-flight scan or attack.
    StopActivity,
    SetNetworkMode { mode: NetworkMode },
    SetTheme { theme: Theme },
}

/// Kind of long-running backend operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum ActivityKind {
    Scan,
    Attack,
}

pub(crate) type CompletionSlot = Option<Result<(), BackendError>>;

/// Handle to an accepted scan or attack.
///
/// Cloneable; every clone resolves when the coordinator applies the
/// operation's completion.
#[derive(Debug, Clone)]
pub struct ActivityHandle {
    id: u64,
    kind: ActivityKind,
    done: watch::Receiver<CompletionSlot>,
}

impl ActivityHandle {
    pub(crate) fn new(id: u64, kind: ActivityKind, done: watch::Receiver<CompletionSlot>) -> Self {
        Self { id, kind, done }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn kind(&self) -> ActivityKind {
        self.kind
    }

    /// Wait until the coordinator has applied this operation's outcome.
    ///
    /// A coordinator dropped before completion reports `Cancelled`.
    pub async fn finished(mut self) -> Result<(), BackendError> {
        match self.done.wait_for(Option::is_some).await {
            Ok(slot) => slot.clone().unwrap_or_else(|| Err(BackendError::cancelled())),
            Err(_) => Err(BackendError::cancelled()),
        }
    }
}

/// Successful response to a command.
#[derive(Debug, Clone)]
pub enum Ack {
    /// A scan or attack was launched.
    Started(ActivityHandle),
    /// State was changed synchronously (or a cancel was signalled).
    Applied,
    /// Nothing to do.
    NoOp,
}

impl Ack {
    pub fn into_activity(self) -> Option<ActivityHandle> {
        match self {
            Self::Started(handle) => Some(handle),
            Self::Applied | Self::NoOp => None,
        }
    }
}
