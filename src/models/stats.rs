// src/models/stats.rs

//! Run statistics and result structures.

use serde::{Deserialize, Serialize};

use crate::error::FailureClass;
use crate::models::Record;

/// Counters for one harvesting run.
///
/// Each counter is bumped by the component that observes the event; the
/// whole struct is read-only once the run completes. Invariant:
/// `requests_succeeded + requests_failed() == requests_issued`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunStats {
    /// HTTP attempts issued, retries included
    pub requests_issued: u64,

    /// Attempts that returned a usable page
    pub requests_succeeded: u64,

    /// Failed attempts by class
    pub failed_rate_limited: u64,
    pub failed_server_error: u64,
    pub failed_timeout: u64,
    pub failed_network: u64,
    pub failed_other: u64,

    /// Retry attempts consumed across all logical calls
    pub retries: u64,

    /// Rate-limit responses observed (subset of failed_rate_limited)
    pub rate_limit_events: u64,

    /// Pages successfully fetched and decoded
    pub pages_walked: u64,

    /// Records kept after filtering and dedup
    pub records_kept: u64,

    /// Records dropped by the date filter
    pub records_filtered: u64,

    /// Records dropped for unresolvable identity
    pub records_discarded: u64,

    /// Records dropped as duplicate identities
    pub records_duplicate: u64,
}

impl RunStats {
    /// Total failed attempts across all classes.
    pub fn requests_failed(&self) -> u64 {
        self.failed_rate_limited
            + self.failed_server_error
            + self.failed_timeout
            + self.failed_network
            + self.failed_other
    }

    /// Record one failed attempt of the given class.
    pub fn record_failure(&mut self, class: FailureClass) {
        match class {
            FailureClass::RateLimited => {
                self.failed_rate_limited += 1;
                self.rate_limit_events += 1;
            }
            FailureClass::ServerError => self.failed_server_error += 1,
            FailureClass::Timeout => self.failed_timeout += 1,
            FailureClass::NetworkUnreachable => self.failed_network += 1,
            FailureClass::NonRetryable => self.failed_other += 1,
        }
    }
}

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminalReason {
    /// The provider stopped issuing continuation tokens
    Completed,
    /// The requested record cap was reached
    MaxRecordsReached,
    /// The early-stop heuristic found the window exhausted
    DateWindowExhausted,
    /// A page exhausted its retry budget or failed non-retryably
    TransportExhausted,
    /// The per-run wall-clock cap fired
    TimedOut,
    /// The caller's cancellation token fired between pages
    Cancelled,
}

/// Outcome of one harvesting run.
///
/// Always carries whatever records were accumulated; a run never returns
/// an unexplained empty result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub records: Vec<Record>,
    pub stats: RunStats,
    pub terminal_reason: TerminalReason,
}
