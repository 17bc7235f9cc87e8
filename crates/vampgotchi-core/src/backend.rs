// ── BLE backend contract ──
//
// The coordinator only knows this trait. Production wires in the BLEeding
// process client (see `convert`); tests wire in scripted fakes.

use std::time::Duration;

use futures_util::future::BoxFuture;
use tokio_util::sync::CancellationToken;

use crate::error::BackendError;
use crate::model::{DeviceAddress, DeviceRecord};

/// What a finished attack reports back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttackSummary {
    pub target: DeviceAddress,
    pub requested: Duration,
    pub elapsed: Duration,
}

/// Scanning/attack backend.
///
/// Implementations enforce their own timeouts and must stop promptly once
/// `cancel` fires, reporting `BackendErrorKind::Cancelled`.
pub trait BleBackend: Send + Sync + 'static {
    /// Discover devices for up to `timeout`. An empty list is a successful scan.
    fn scan(
        &self,
        timeout: Duration,
        cancel: CancellationToken,
    ) -> BoxFuture<'_, Result<Vec<DeviceRecord>, BackendError>>;

    /// Disrupt `target` for `duration`.
    fn attack(
        &self,
        target: DeviceAddress,
        duration: Duration,
        cancel: CancellationToken,
    ) -> BoxFuture<'_, Result<AttackSummary, BackendError>>;
}
