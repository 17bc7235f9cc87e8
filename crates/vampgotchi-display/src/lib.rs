//! E-paper output for vampgotchi.
//!
//! - [`Frame`]: 1-bit frame buffer implementing `embedded-graphics`'
//!   `DrawTarget`.
//! - [`screen`]: composes a coordinator snapshot into a frame (face, mode,
//!   counters, target, network, uptime, activity, vitals).
//! - [`RefreshPolicy`]: full vs. partial refresh scheduling.
//! - [`DisplayDriver`]: the panel seam, with [`NullDisplay`] and
//!   [`PbmFileDisplay`].
//! - [`RenderLoop`]: the periodic snapshot → frame → driver task.

pub mod driver;
pub mod error;
pub mod frame;
pub mod refresh;
pub mod render;
pub mod screen;

pub use driver::{DisplayDriver, NullDisplay, PbmFileDisplay};
pub use error::DisplayError;
pub use frame::Frame;
pub use refresh::{RefreshKind, RefreshPolicy};
pub use render::{AddressSource, RenderLoop, RenderSettings, SharedDriver};
pub use screen::{ScreenText, compose, describe};
