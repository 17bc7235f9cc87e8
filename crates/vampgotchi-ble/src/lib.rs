//! Process-level client for the BLEeding tool.
//!
//! This crate knows how to *run* the external scanner/attack program and how
//! to read what it prints. It knows nothing about moods, modes or targets:
//!
//! - **[`BleedingClient`]** spawns the tool with a timeout argument, enforces
//!   a hard wall-clock limit, honours a [`CancellationToken`], and maps every
//!   failure into [`Error`].
//! - **[`parse`]** turns newline-delimited tool output into [`RawDevice`]
//!   values, skipping lines it cannot make sense of.
//!
//! `vampgotchi-core` converts these raw values into its domain model.
//!
//! [`CancellationToken`]: tokio_util::sync::CancellationToken

pub mod error;
pub mod parse;
pub mod tool;

pub use error::Error;
pub use parse::{ParsedScan, RawDevice, parse_line, parse_scan_output};
pub use tool::{BleedingClient, ScanOutput, ToolConfig, ToolOutput};
