//! CLI error types with miette diagnostics.
//!
//! Remote commands surface the console's `{ "error": { code, message } }`
//! bodies as [`CliError::Rejected`]; local failures carry their own variant.

use miette::Diagnostic;
use thiserror::Error;

use vampgotchi_config::ConfigError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
    pub const BACKEND: i32 = 9;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the web console at {url}")]
    #[diagnostic(
        code(vampgotchi::connection_failed),
        help(
            "Check that `vampgotchi run` is running and reachable.\n\
             Point at another console with --url or VAMPGOTCHI_URL."
        )
    )]
    ConnectionFailed {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Request timed out after {seconds}s")]
    #[diagnostic(
        code(vampgotchi::timeout),
        help("Increase the timeout with --timeout, or drop --wait.")
    )]
    Timeout { seconds: u64 },

    #[error("Invalid console URL '{url}': {reason}")]
    #[diagnostic(code(vampgotchi::invalid_url))]
    InvalidUrl { url: String, reason: String },

    // ── Console responses ───────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(code(vampgotchi::rejected))]
    Rejected {
        status: u16,
        code: String,
        message: String,
        #[help]
        hint: Option<&'static str>,
    },

    #[error("Unexpected response from console: {reason}")]
    #[diagnostic(code(vampgotchi::bad_response))]
    BadResponse { reason: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(vampgotchi::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(
        code(vampgotchi::config),
        help("Inspect the effective configuration with: vampgotchi config show")
    )]
    Config(#[from] ConfigError),

    #[error("Configuration file already exists at {path}")]
    #[diagnostic(
        code(vampgotchi::config_exists),
        help("Pass --force to overwrite it.")
    )]
    ConfigExists { path: String },

    // ── Daemon ───────────────────────────────────────────────────────
    #[error("Could not listen on {addr}")]
    #[diagnostic(
        code(vampgotchi::bind),
        help("Port 80 needs root or CAP_NET_BIND_SERVICE; try --bind 0.0.0.0:8080.")
    )]
    Bind {
        addr: std::net::SocketAddr,
        #[source]
        source: std::io::Error,
    },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("JSON serialization failed: {0}")]
    #[diagnostic(code(vampgotchi::json))]
    Json(#[from] serde_json::Error),

    #[error("YAML serialization failed: {0}")]
    #[diagnostic(code(vampgotchi::yaml))]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML serialization failed: {0}")]
    #[diagnostic(code(vampgotchi::toml))]
    Toml(#[from] toml::ser::Error),
}

fn rejection_help(code: &str) -> &'static str {
    match code {
        "ALREADY_BUSY" => "Wait for the running operation or stop it with: vampgotchi stop",
        "UNKNOWN_DEVICE" => "Run: vampgotchi devices to see addresses from the last scan",
        "NO_TARGET_SELECTED" => "Select one first: vampgotchi select <ADDRESS>",
        "TOOL_NOT_FOUND" | "PERMISSION_DENIED" => {
            "Check backend.bleeding_path and backend.python, and run the daemon as root"
        }
        _ => "See the daemon log for details",
    }
}

impl CliError {
    /// An error body returned by the console.
    pub fn rejected(status: u16, code: impl Into<String>, message: impl Into<String>) -> Self {
        let code = code.into();
        Self::Rejected {
            status,
            hint: Some(rejection_help(&code)),
            code,
            message: message.into(),
        }
    }

    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Rejected { status, .. } => match status {
                404 => exit_code::NOT_FOUND,
                409 => exit_code::CONFLICT,
                400 | 422 => exit_code::USAGE,
                502 => exit_code::BACKEND,
                _ => exit_code::GENERAL,
            },
            Self::Validation { .. } | Self::InvalidUrl { .. } | Self::ConfigExists { .. } => {
                exit_code::USAGE
            }
            _ => exit_code::GENERAL,
        }
    }
}
