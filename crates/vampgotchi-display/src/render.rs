// ── Render loop ──
//
// Periodically snapshots the coordinator and pushes a frame to the driver.
// Independent of scan/attack activity: a slow or failing panel never
// touches coordinator state. Driver calls block, so they run on Tokio's
// blocking pool.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::Utc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use vampgotchi_core::Coordinator;

use crate::driver::DisplayDriver;
use crate::error::DisplayError;
use crate::refresh::{RefreshKind, RefreshPolicy};
use crate::screen::compose;

/// Supplies the address shown on the network line.
pub type AddressSource = Arc<dyn Fn() -> String + Send + Sync>;

/// The driver, shared with the blocking task that is drawing on it.
pub type SharedDriver<D> = Arc<Mutex<D>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderSettings {
    pub period: Duration,
    /// Every Nth update is a full refresh.
    pub full_refresh_interval: u32,
    pub width: u32,
    pub height: u32,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            period: Duration::from_secs(3),
            full_refresh_interval: 30,
            width: 250,
            height: 122,
        }
    }
}

pub struct RenderLoop<D> {
    coordinator: Coordinator,
    driver: SharedDriver<D>,
    policy: RefreshPolicy,
    settings: RenderSettings,
    address: AddressSource,
}

impl<D: DisplayDriver + 'static> RenderLoop<D> {
    pub fn new(coordinator: Coordinator, driver: D, settings: RenderSettings) -> Self {
        Self {
            coordinator,
            driver: Arc::new(Mutex::new(driver)),
            policy: RefreshPolicy::new(settings.full_refresh_interval),
            settings,
            address: Arc::new(|| "127.0.0.1".to_owned()),
        }
    }

    pub fn with_address_source(mut self, source: AddressSource) -> Self {
        self.address = source;
        self
    }

    pub fn driver(&self) -> MutexGuard<'_, D> {
        lock(&self.driver)
    }

    /// Draw the current snapshot once.
    pub async fn render_once(&mut self) -> Result<RefreshKind, DisplayError> {
        let snapshot = self.coordinator.snapshot();
        let ip = (self.address)();
        let frame = compose(
            &snapshot,
            &ip,
            Utc::now(),
            self.settings.width,
            self.settings.height,
        );
        let kind = self.policy.next_update();
        let driver = Arc::clone(&self.driver);
        tokio::task::spawn_blocking(move || lock(&driver).render(&frame, kind))
            .await
            .map_err(|e| DisplayError::Driver(format!("render task failed: {e}")))??;
        debug!(refresh = %kind, update = self.policy.updates(), mode = %snapshot.mode, "display updated");
        Ok(kind)
    }

    /// Render every `period` until `cancel` fires, then put the panel to
    /// sleep and hand the driver back.
    pub async fn run(mut self, cancel: CancellationToken) -> SharedDriver<D> {
        if self.settings.period.is_zero() {
            warn!("render period is zero; display updates disabled");
            cancel.cancelled().await;
            return self.finish().await;
        }

        let mut interval = tokio::time::interval(self.settings.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(period = ?self.settings.period, "render loop started");

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                _ = interval.tick() => {
                    if let Err(e) = self.render_once().await {
                        warn!(error = %e, "display update failed");
                    }
                }
            }
        }

        self.finish().await
    }

    async fn finish(self) -> SharedDriver<D> {
        let driver = Arc::clone(&self.driver);
        let slept = tokio::task::spawn_blocking(move || lock(&driver).sleep()).await;
        match slept {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(error = %e, "failed to put display to sleep"),
            Err(e) => warn!(error = %e, "display sleep task failed"),
        }
        debug!(updates = self.policy.updates(), "render loop stopped");
        self.driver
    }
}

/// A driver that panicked mid-frame is still usable for the next one.
fn lock<D>(driver: &Mutex<D>) -> MutexGuard<'_, D> {
    driver.lock().unwrap_or_else(PoisonError::into_inner)
}
