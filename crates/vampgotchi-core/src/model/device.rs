// ── Discovered devices ──

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use super::address::DeviceAddress;

/// Longest display name kept on a record.
pub const MAX_NAME_CHARS: usize = 20;

/// One device seen by a scan.
///
/// Identity is `address`; two records with the same address describe the
/// same device and the more recent one wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceRecord {
    pub address: DeviceAddress,
    pub display_name: Option<String>,
    /// RSSI in dBm. `0` when the tool did not report one.
    pub signal_strength: i32,
    pub last_seen: DateTime<Utc>,
}

impl DeviceRecord {
    /// Build a record, trimming and truncating the name. Blank names become `None`.
    pub fn new(
        address: DeviceAddress,
        display_name: Option<&str>,
        signal_strength: i32,
        last_seen: DateTime<Utc>,
    ) -> Self {
        Self {
            address,
            display_name: display_name.and_then(normalize_name),
            signal_strength,
            last_seen,
        }
    }

    /// Name for humans; `"Unknown"` when the device did not advertise one.
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or("Unknown")
    }
}

fn normalize_name(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.chars().take(MAX_NAME_CHARS).collect())
}

/// Collapse duplicate addresses, keeping first-seen order.
///
/// When an address repeats, the record with the later `last_seen` replaces
/// the earlier one in place (ties go to the later record).
pub fn dedup_by_address(records: Vec<DeviceRecord>) -> Vec<DeviceRecord> {
    let mut out: Vec<DeviceRecord> = Vec::with_capacity(records.len());
    for record in records {
        upsert(&mut out, record);
    }
    out
}

/// Merge one scan's records into the current list.
///
/// - `retention == None`: the new scan replaces the list outright.
/// - `retention == Some(window)`: known addresses are updated in place,
///   new ones appended, and records missing from the scan survive while
///   `now - last_seen <= window`.
pub fn merge_devices(
    current: &[DeviceRecord],
    incoming: Vec<DeviceRecord>,
    retention: Option<Duration>,
    now: DateTime<Utc>,
) -> Vec<DeviceRecord> {
    let Some(window) = retention else {
        return dedup_by_address(incoming);
    };
    let window = TimeDelta::from_std(window).unwrap_or(TimeDelta::MAX);

    let mut merged: Vec<DeviceRecord> = current
        .iter()
        .filter(|r| now.signed_duration_since(r.last_seen) <= window)
        .cloned()
        .collect();
    for record in incoming {
        upsert(&mut merged, record);
    }
    merged
}

fn upsert(list: &mut Vec<DeviceRecord>, record: DeviceRecord) {
    match list.iter_mut().find(|r| r.address == record.address) {
        Some(existing) if record.last_seen >= existing.last_seen => *existing = record,
        Some(_) => {}
        None => list.push(record),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + secs, 0).unwrap()
    }

    fn rec(addr: &str, rssi: i32, seen: i64) -> DeviceRecord {
        DeviceRecord::new(DeviceAddress::new(addr), None, rssi, at(seen))
    }

    fn addrs(list: &[DeviceRecord]) -> Vec<&str> {
        list.iter().map(|r| r.address.as_str()).collect()
    }

    #[test]
    fn name_is_trimmed_and_truncated() {
        let r = DeviceRecord::new(
            DeviceAddress::new("aa:bb:cc:dd:ee:ff"),
            Some("  A Really Long Headphone Name  "),
            -50,
            at(0),
        );
        assert_eq!(r.display_name.as_deref(), Some("A Really Long Headph"));
    }

    #[test]
    fn blank_name_is_none_and_labelled_unknown() {
        let r = DeviceRecord::new(DeviceAddress::new("aa:bb:cc:dd:ee:ff"), Some("  "), 0, at(0));
        assert_eq!(r.display_name, None);
        assert_eq!(r.label(), "Unknown");
    }

    #[test]
    fn dedup_keeps_first_position_latest_value() {
        let list = dedup_by_address(vec![
            rec("AA:00:00:00:00:01", -80, 0),
            rec("AA:00:00:00:00:02", -70, 0),
            rec("aa:00:00:00:00:01", -40, 5),
        ]);
        assert_eq!(addrs(&list), vec!["AA:00:00:00:00:01", "AA:00:00:00:00:02"]);
        assert_eq!(list[0].signal_strength, -40);
    }

    #[test]
    fn dedup_ignores_older_duplicate() {
        let list = dedup_by_address(vec![
            rec("AA:00:00:00:00:01", -40, 10),
            rec("AA:00:00:00:00:01", -90, 2),
        ]);
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].signal_strength, -40);
    }

    #[test]
    fn merge_without_retention_replaces() {
        let current = vec![rec("AA:00:00:00:00:01", -80, 0)];
        let merged = merge_devices(&current, vec![rec("AA:00:00:00:00:02", -70, 60)], None, at(60));
        assert_eq!(addrs(&merged), vec!["AA:00:00:00:00:02"]);
    }

    #[test]
    fn merge_with_retention_ages_out_stale_records() {
        let current = vec![
            rec("AA:00:00:00:00:01", -80, 0),
            rec("AA:00:00:00:00:02", -70, 50),
            rec("AA:00:00:00:00:03", -60, 55),
        ];
        let incoming = vec![rec("AA:00:00:00:00:03", -30, 100), rec("AA:00:00:00:00:04", -50, 100)];

        let merged = merge_devices(&current, incoming, Some(Duration::from_secs(60)), at(100));

        assert_eq!(
            addrs(&merged),
            vec!["AA:00:00:00:00:02", "AA:00:00:00:00:03", "AA:00:00:00:00:04"]
        );
        assert_eq!(merged[1].signal_strength, -30);
    }
}
