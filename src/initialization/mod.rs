//! Shared resource initialization.
//!
//! This module provides functions to initialize the resources a [`crate::Scanner`]
//! shares across scans:
//! - HTTP client (timeouts, default User-Agent)
//! - DNS resolver
//! - Logger
//!
//! All initialization functions return proper error types for error handling.

mod client;
mod logger;
mod resolver;

// Re-export public API
pub use client::init_client;
pub use logger::init_logger_with;
pub use resolver::init_resolver;
