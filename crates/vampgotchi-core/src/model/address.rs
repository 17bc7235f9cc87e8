// ── Device addresses ──
//
// Every device is identified by its BLE hardware address. The tool prints
// them in whatever case and separator it likes; the domain only ever sees
// the canonical `AA:BB:CC:DD:EE:FF` form.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// BLE hardware address, normalized to upper-case colon-separated form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct DeviceAddress(String);

impl DeviceAddress {
    /// Normalize any common spelling: `aa-bb-cc-dd-ee-ff`, `aa:bb:...`,
    /// surrounding whitespace. Does not validate the shape.
    pub fn new(raw: impl AsRef<str>) -> Self {
        let normalized = raw.as_ref().trim().to_ascii_uppercase().replace('-', ":");
        Self(normalized)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `true` for exactly six two-digit hex groups separated by colons.
    pub fn is_well_formed(&self) -> bool {
        let groups: Vec<&str> = self.0.split(':').collect();
        groups.len() == 6
            && groups
                .iter()
                .all(|g| g.len() == 2 && g.bytes().all(|b| b.is_ascii_hexdigit()))
    }
}

impl fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for DeviceAddress {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<String> for DeviceAddress {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

impl From<&str> for DeviceAddress {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<DeviceAddress> for String {
    fn from(addr: DeviceAddress) -> Self {
        addr.0
    }
}
