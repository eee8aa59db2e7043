// src/models/mod.rs

//! Domain models for the harvester.
//!
//! This module contains all data structures used throughout the crate,
//! organized by their primary purpose.

mod config;
mod record;
mod request;
mod stats;

// Re-export all public types
pub use config::{
    FilterConfig, HarvesterConfig, HttpConfig, PacingConfig, RetryConfig, RunConfig,
};
pub use record::{PageToken, RawPage, Record, UNKNOWN_DATE};
pub use request::{DateWindow, ExtractionRequest, LocaleSettings, PacingMode};
pub use stats::{ExtractionResult, RunStats, TerminalReason};
