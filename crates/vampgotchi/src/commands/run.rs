//! `vampgotchi run`: coordinator, render loop and web console in one process.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use vampgotchi_ble::BleedingClient;
use vampgotchi_config::Config;
use vampgotchi_core::{Coordinator, CoordinatorConfig};
use vampgotchi_display::{
    AddressSource, DisplayDriver, NullDisplay, PbmFileDisplay, RenderLoop, RenderSettings,
};

use crate::cli::RunArgs;
use crate::error::CliError;
use crate::net::{self, NetworkSwitcher};
use crate::web::{self, AppState, WebContext};

pub async fn handle(args: RunArgs, config: Config, config_path: PathBuf) -> Result<(), CliError> {
    info!(version = env!("CARGO_PKG_VERSION"), config = %config_path.display(), "vampgotchi starting");

    let bind = args.bind.unwrap_or(config.web.bind);
    let listener = TcpListener::bind(bind)
        .await
        .map_err(|source| CliError::Bind { addr: bind, source })?;

    let tool = BleedingClient::new(config.tool_config());
    let script = tool.config().script_path();
    if !script.exists() {
        warn!(path = %script.display(), "BLEeding script not found; scans will fail until it is installed");
    }

    let coordinator = Coordinator::new(
        coordinator_config(&config, args.no_auto_scan),
        Arc::new(tool.clone()),
    );
    coordinator.start();

    let address: AddressSource = Arc::new(net::primary_ip_string);
    let cancel = CancellationToken::new();

    let frame_file = args.frame_file.or_else(|| config.display.frame_file.clone());
    let driver: Box<dyn DisplayDriver> = match frame_file {
        Some(path) => {
            info!(path = %path.display(), "writing frames to PBM file");
            Box::new(PbmFileDisplay::new(path))
        }
        None => Box::new(NullDisplay::new()),
    };
    let render = tokio::spawn(
        RenderLoop::new(coordinator.clone(), driver, render_settings(&config))
            .with_address_source(Arc::clone(&address))
            .run(cancel.child_token()),
    );

    let state = AppState::new(WebContext {
        coordinator: coordinator.clone(),
        switcher: NetworkSwitcher::new(
            config.network.ap_command.clone(),
            config.network.client_command.clone(),
        ),
        adapter_command: config.backend.adapter_status_command.clone(),
        config,
        config_path: Some(config_path),
        address,
        tool: Some(tool),
    });
    let mut server = tokio::spawn(web::serve(listener, state, cancel.child_token()));

    let early_exit = tokio::select! {
        () = shutdown_signal() => {
            info!("shutdown requested");
            None
        }
        result = &mut server => {
            warn!("web console exited unexpectedly");
            Some(result)
        }
    };

    cancel.cancel();
    coordinator.shutdown().await;

    let server_result = match early_exit {
        Some(result) => result,
        None => server.await,
    };
    match render.await {
        Ok(_) => debug!("render loop joined"),
        Err(e) => warn!(error = %e, "render loop panicked"),
    }
    info!("vampgotchi stopped");

    match server_result {
        Ok(result) => result.map_err(CliError::Io),
        Err(e) => {
            error!(error = %e, "web console task failed");
            Err(CliError::Io(io::Error::other(e)))
        }
    }
}

/// Coordinator settings from the file, with the network mode taken from
/// the live interface when one is up.
fn coordinator_config(config: &Config, no_auto_scan: bool) -> CoordinatorConfig {
    let mut coordinator = config.coordinator_config();
    let ip = net::primary_ip();
    coordinator.network_mode = net::infer_mode(ip, config.network.ap_ip, config.network.mode);
    debug!(?ip, mode = %coordinator.network_mode, "initial network mode");
    if no_auto_scan {
        coordinator.scan_interval = Duration::ZERO;
    }
    coordinator
}

fn render_settings(config: &Config) -> RenderSettings {
    RenderSettings {
        period: Duration::from_secs(config.display.refresh_secs),
        full_refresh_interval: config.display.full_refresh_interval,
        width: config.display.width,
        height: config.display.height,
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "cannot listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_auto_scan_zeroes_the_interval() {
        let config = Config::default();
        assert_eq!(
            coordinator_config(&config, false).scan_interval,
            Duration::from_secs(60)
        );
        assert_eq!(coordinator_config(&config, true).scan_interval, Duration::ZERO);
    }

    #[test]
    fn render_settings_follow_display_section() {
        let mut config = Config::default();
        config.display.refresh_secs = 5;
        config.display.full_refresh_interval = 12;
        let settings = render_settings(&config);
        assert_eq!(settings.period, Duration::from_secs(5));
        assert_eq!(settings.full_refresh_interval, 12);
        assert_eq!((settings.width, settings.height), (250, 122));
    }
}
