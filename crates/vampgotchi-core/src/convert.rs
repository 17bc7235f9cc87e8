// ── Tool-to-domain conversions ──
//
// Bridges `vampgotchi_ble` output into `DeviceRecord`s and implements the
// backend contract for the real BLEeding client.

use std::time::Duration;

use chrono::{DateTime, Utc};
use futures_util::future::BoxFuture;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use vampgotchi_ble::{BleedingClient, RawDevice};

use crate::backend::{AttackSummary, BleBackend};
use crate::error::BackendError;
use crate::model::{DeviceAddress, DeviceRecord, dedup_by_address};

/// Normalize raw tool lines into records stamped with `seen_at`.
///
/// Entries without a well-formed address are dropped; repeats collapse by
/// address (later line wins, first position kept). Missing RSSI becomes 0.
pub fn records_from_raw(raw: Vec<RawDevice>, seen_at: DateTime<Utc>) -> Vec<DeviceRecord> {
    let records = raw
        .into_iter()
        .filter_map(|dev| {
            let address = DeviceAddress::new(&dev.address);
            address.is_well_formed().then(|| {
                DeviceRecord::new(address, dev.name.as_deref(), dev.rssi.unwrap_or(0), seen_at)
            })
        })
        .collect();
    dedup_by_address(records)
}

impl BleBackend for BleedingClient {
    fn scan(
        &self,
        timeout: Duration,
        cancel: CancellationToken,
    ) -> BoxFuture<'_, Result<Vec<DeviceRecord>, BackendError>> {
        Box::pin(async move {
            let output = BleedingClient::scan(self, timeout, &cancel).await?;
            if output.skipped_lines > 0 {
                debug!(skipped = output.skipped_lines, "ignored unrecognised tool lines");
            }
            Ok(records_from_raw(output.devices, Utc::now()))
        })
    }

    fn attack(
        &self,
        target: DeviceAddress,
        duration: Duration,
        cancel: CancellationToken,
    ) -> BoxFuture<'_, Result<AttackSummary, BackendError>> {
        Box::pin(async move {
            let output = self.deauth(target.as_str(), duration, &cancel).await?;
            Ok(AttackSummary {
                target,
                requested: duration,
                elapsed: output.elapsed,
            })
        })
    }
}
