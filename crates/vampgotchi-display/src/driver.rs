// ── Display drivers ──
//
// The panel seam. Hardware drivers live outside this crate; what ships here
// are a no-op driver and a PBM file sink for headless runs.

use std::path::{Path, PathBuf};

use tracing::trace;

use crate::error::DisplayError;
use crate::frame::Frame;
use crate::refresh::RefreshKind;

/// Something that can put a [`Frame`] on a panel.
///
/// Calls may block on I/O; the render loop makes them from Tokio's
/// blocking pool, never from an async worker.
pub trait DisplayDriver: Send {
    fn render(&mut self, frame: &Frame, refresh: RefreshKind) -> Result<(), DisplayError>;

    /// Put the panel to sleep on shutdown.
    fn sleep(&mut self) -> Result<(), DisplayError> {
        Ok(())
    }
}

impl<D: DisplayDriver + ?Sized> DisplayDriver for Box<D> {
    fn render(&mut self, frame: &Frame, refresh: RefreshKind) -> Result<(), DisplayError> {
        (**self).render(frame, refresh)
    }

    fn sleep(&mut self) -> Result<(), DisplayError> {
        (**self).sleep()
    }
}

/// Discards frames, counting them.
#[derive(Debug, Default)]
pub struct NullDisplay {
    full: u64,
    partial: u64,
    asleep: bool,
}

impl NullDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn full_refreshes(&self) -> u64 {
        self.full
    }

    pub fn partial_refreshes(&self) -> u64 {
        self.partial
    }

    pub fn is_asleep(&self) -> bool {
        self.asleep
    }
}

impl DisplayDriver for NullDisplay {
    fn render(&mut self, _frame: &Frame, refresh: RefreshKind) -> Result<(), DisplayError> {
        match refresh {
            RefreshKind::Full => self.full += 1,
            RefreshKind::Partial => self.partial += 1,
        }
        self.asleep = false;
        Ok(())
    }

    fn sleep(&mut self) -> Result<(), DisplayError> {
        self.asleep = true;
        Ok(())
    }
}

/// Writes every frame to a PBM (P4) file, replacing it atomically.
#[derive(Debug)]
pub struct PbmFileDisplay {
    path: PathBuf,
}

impl PbmFileDisplay {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> DisplayError {
        DisplayError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl DisplayDriver for PbmFileDisplay {
    fn render(&mut self, frame: &Frame, refresh: RefreshKind) -> Result<(), DisplayError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
            }
        }
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        std::fs::write(&tmp, frame.to_pbm()).map_err(|e| self.io_error(e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| self.io_error(e))?;
        trace!(path = %self.path.display(), %refresh, "frame written");
        Ok(())
    }
}
