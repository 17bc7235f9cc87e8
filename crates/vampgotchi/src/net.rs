//! Network helpers: primary address detection, initial mode inference and
//! the optional commands run when the console switches modes.

use std::net::{IpAddr, Ipv4Addr, UdpSocket};
use std::process::Stdio;

use tokio::task::JoinHandle;
use tracing::{info, warn};

use vampgotchi_core::NetworkMode;

/// Shown when no outbound interface is found.
pub const FALLBACK_IP: Ipv4Addr = Ipv4Addr::LOCALHOST;

/// Address of the interface holding the default route.
///
/// Connecting a UDP socket sends nothing; it only makes the kernel pick a
/// source address.
pub fn primary_ip() -> Option<IpAddr> {
    let socket = UdpSocket::bind("0.0.0.0:0").ok()?;
    socket.connect("8.8.8.8:80").ok()?;
    let ip = socket.local_addr().ok()?.ip();
    (!ip.is_unspecified()).then_some(ip)
}

pub fn primary_ip_string() -> String {
    primary_ip().map_or_else(|| FALLBACK_IP.to_string(), |ip| ip.to_string())
}

/// `AccessPoint` when `ip` shares the AP's /24, `Client` for any other
/// routable address, `configured` when nothing was detected.
pub fn infer_mode(ip: Option<IpAddr>, ap_ip: Ipv4Addr, configured: NetworkMode) -> NetworkMode {
    match ip {
        Some(IpAddr::V4(v4)) if v4.octets()[..3] == ap_ip.octets()[..3] => NetworkMode::AccessPoint,
        Some(ip) if !ip.is_loopback() => NetworkMode::Client,
        _ => configured,
    }
}

/// Runs the configured argv for a mode change in the background.
#[derive(Debug, Clone, Default)]
pub struct NetworkSwitcher {
    ap_command: Option<Vec<String>>,
    client_command: Option<Vec<String>>,
}

impl NetworkSwitcher {
    pub fn new(ap_command: Option<Vec<String>>, client_command: Option<Vec<String>>) -> Self {
        Self {
            ap_command,
            client_command,
        }
    }

    /// Spawn the command for `mode`, if one is configured. The request that
    /// triggered the switch does not wait for it.
    pub fn switch(&self, mode: NetworkMode) -> Option<JoinHandle<bool>> {
        let argv = match mode {
            NetworkMode::AccessPoint => self.ap_command.clone(),
            NetworkMode::Client => self.client_command.clone(),
        }?;
        let (program, args) = argv.split_first()?;
        let program = program.clone();
        let args = args.to_vec();

        Some(tokio::spawn(async move {
            info!(%mode, %program, "running network switch command");
            let output = tokio::process::Command::new(&program)
                .args(&args)
                .stdin(Stdio::null())
                .output()
                .await;
            match output {
                Ok(out) if out.status.success() => {
                    info!(%mode, "network switch command finished");
                    true
                }
                Ok(out) => {
                    warn!(
                        %mode,
                        status = %out.status,
                        stderr = %String::from_utf8_lossy(&out.stderr).trim(),
                        "network switch command failed"
                    );
                    false
                }
                Err(e) => {
                    warn!(%mode, %program, error = %e, "could not run network switch command");
                    false
                }
            }
        }))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const AP: Ipv4Addr = Ipv4Addr::new(192, 168, 4, 1);

    #[test]
    fn ap_subnet_means_access_point() {
        let ip = Some(IpAddr::V4(Ipv4Addr::new(192, 168, 4, 1)));
        assert_eq!(infer_mode(ip, AP, NetworkMode::Client), NetworkMode::AccessPoint);
    }

    #[test]
    fn other_addresses_mean_client() {
        let ip = Some(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 12)));
        assert_eq!(infer_mode(ip, AP, NetworkMode::AccessPoint), NetworkMode::Client);
    }

    #[test]
    fn undetected_address_keeps_configured_mode() {
        assert_eq!(infer_mode(None, AP, NetworkMode::AccessPoint), NetworkMode::AccessPoint);
        let loopback = Some(IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert_eq!(infer_mode(loopback, AP, NetworkMode::Client), NetworkMode::Client);
    }

    #[tokio::test]
    async fn switch_runs_configured_command() {
        let switcher = NetworkSwitcher::new(Some(vec!["true".into()]), Some(vec!["false".into()]));
        assert!(switcher.switch(NetworkMode::AccessPoint).unwrap().await.unwrap());
        assert!(!switcher.switch(NetworkMode::Client).unwrap().await.unwrap());
    }

    #[tokio::test]
    async fn switch_without_command_is_a_no_op() {
        let switcher = NetworkSwitcher::default();
        assert!(switcher.switch(NetworkMode::Client).is_none());
    }

    #[tokio::test]
    async fn missing_program_reports_failure() {
        let switcher =
            NetworkSwitcher::new(Some(vec!["/nonexistent/vampgotchi-ap-up".into()]), None);
        assert!(!switcher.switch(NetworkMode::AccessPoint).unwrap().await.unwrap());
    }
}
