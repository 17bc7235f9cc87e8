//! HTTP client for a running web console.
//!
//! Thin `reqwest` wrapper: one method per console endpoint, JSON in and out,
//! error envelopes mapped to [`CliError::Rejected`].

use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use vampgotchi_core::{NetworkMode, SystemState};

use crate::api::{
    AttackRequest, ErrorBody, NetworkRequest, ScanRequest, StatusReport, TargetRequest,
    ThemeRequest,
};
use crate::error::CliError;

pub struct ConsoleClient {
    http: reqwest::Client,
    base: Url,
    timeout: Duration,
}

impl ConsoleClient {
    pub fn new(base: &str, timeout: Duration) -> Result<Self, CliError> {
        let mut base: Url = base.parse().map_err(|e: url::ParseError| CliError::InvalidUrl {
            url: base.to_owned(),
            reason: e.to_string(),
        })?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| CliError::ConnectionFailed {
                url: base.to_string(),
                source,
            })?;
        Ok(Self {
            http,
            base,
            timeout,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    // ── Endpoints ────────────────────────────────────────────────────

    pub async fn status(&self) -> Result<StatusReport, CliError> {
        let url = self.endpoint("api/status", false)?;
        debug!(%url, "GET");
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        self.decode(response).await
    }

    pub async fn scan(&self, request: &ScanRequest, wait: bool) -> Result<SystemState, CliError> {
        self.post("api/scan", request, wait).await
    }

    pub async fn select(&self, address: &str) -> Result<SystemState, CliError> {
        let request = TargetRequest {
            address: address.to_owned(),
        };
        self.post("api/target", &request, false).await
    }

    pub async fn attack(
        &self,
        request: &AttackRequest,
        wait: bool,
    ) -> Result<SystemState, CliError> {
        self.post("api/attack", request, wait).await
    }

    pub async fn stop(&self) -> Result<SystemState, CliError> {
        self.post("api/stop", &serde_json::json!({}), false).await
    }

    pub async fn network(&self, mode: NetworkMode) -> Result<SystemState, CliError> {
        self.post("api/network", &NetworkRequest { mode }, false).await
    }

    pub async fn theme(&self, request: &ThemeRequest) -> Result<SystemState, CliError> {
        self.post("api/theme", request, false).await
    }

    // ── Plumbing ─────────────────────────────────────────────────────

    fn endpoint(&self, path: &str, wait: bool) -> Result<Url, CliError> {
        let mut url = self.base.join(path).map_err(|e| CliError::InvalidUrl {
            url: self.base.to_string(),
            reason: e.to_string(),
        })?;
        if wait {
            url.query_pairs_mut().append_pair("wait", "true");
        }
        Ok(url)
    }

    async fn post<B, T>(&self, path: &str, body: &B, wait: bool) -> Result<T, CliError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(path, wait)?;
        debug!(%url, "POST");
        let response = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        self.decode(response).await
    }

    async fn decode<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T, CliError> {
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| self.transport_error(e))?;

        if status.is_success() {
            return serde_json::from_slice(&body).map_err(|e| CliError::BadResponse {
                reason: e.to_string(),
            });
        }

        match serde_json::from_slice::<ErrorBody>(&body) {
            Ok(envelope) => Err(CliError::rejected(
                status.as_u16(),
                envelope.error.code,
                envelope.error.message,
            )),
            Err(_) => Err(CliError::rejected(
                status.as_u16(),
                "HTTP_ERROR",
                format!("HTTP {status}: {}", String::from_utf8_lossy(&body).trim()),
            )),
        }
    }

    fn transport_error(&self, source: reqwest::Error) -> CliError {
        if source.is_timeout() {
            CliError::Timeout {
                seconds: self.timeout.as_secs(),
            }
        } else {
            CliError::ConnectionFailed {
                url: self.base.to_string(),
                source,
            }
        }
    }
}
