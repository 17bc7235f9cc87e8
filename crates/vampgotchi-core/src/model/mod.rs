// ── Domain model ──

pub mod address;
pub mod device;
pub mod state;
pub mod theme;
pub mod vitals;

pub use address::DeviceAddress;
pub use device::{DeviceRecord, MAX_NAME_CHARS, dedup_by_address, merge_devices};
pub use state::{
    ACTIVITY_LOG_LEN, ActivityEvent, ActivityLog, Counters, LastError, Mode, Mood, NetworkMode,
    SystemState, format_uptime,
};
pub use theme::{Ink, Theme, ThemePreset};
pub use vitals::{MAX_BLOOD, MAX_HUNGER, Vitals};
