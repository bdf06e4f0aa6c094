//! Scan configuration and constants.
//!
//! This module provides:
//! - Operational constants (timeouts, limits, batch sizes)
//! - Heuristic defaults and the overridable [`Tuning`] struct
//! - The immutable per-scan [`ScanConfig`]
//! - Command-line options ([`Opt`])

mod cli;
mod constants;
mod types;

// Re-export all constants
pub use cli::Opt;
pub use constants::*;
pub use types::{Endpoints, LogFormat, LogLevel, ScanConfig, ScanType, Tuning};
