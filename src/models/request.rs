// src/models/request.rs

//! Extraction request structures.
//!
//! An [`ExtractionRequest`] describes one harvesting run and is immutable
//! once the run starts; it is validated synchronously before any network
//! call is made.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{HarvestError, Result};
use crate::services::proxy::ProxyPool;

/// Pacing preset trading extraction speed against detection risk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PacingMode {
    /// Short delays, suitable for low-volume extraction
    #[default]
    Fast,
    /// Human-like delays, slower but less conspicuous
    Human,
}

/// Locale sent with every RPC call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocaleSettings {
    /// Interface language (`hl` parameter), e.g. "en" or "zh-TW"
    pub language: String,

    /// Region bias (`gl` parameter), e.g. "us" or "hk"
    pub region: String,
}

impl Default for LocaleSettings {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            region: "us".to_string(),
        }
    }
}

/// Requested date window for kept records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DateWindow {
    /// Keep everything; never stops pagination for date reasons
    #[default]
    All,
    PastWeek,
    PastMonth,
    PastThreeMonths,
    PastSixMonths,
    PastYear,
    /// Explicit inclusive bounds
    Custom {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

impl DateWindow {
    /// Resolve the inclusive bounds of this window relative to `now`.
    ///
    /// Returns `None` for [`DateWindow::All`].
    pub fn bounds(&self, now: DateTime<Utc>) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let start = match self {
            Self::All => return None,
            Self::PastWeek => now - Duration::weeks(1),
            Self::PastMonth => now - Duration::days(30),
            Self::PastThreeMonths => now - Duration::days(90),
            Self::PastSixMonths => now - Duration::days(180),
            Self::PastYear => now - Duration::days(365),
            Self::Custom { start, end } => return Some((*start, *end)),
        };
        Some((start, now))
    }

    /// Whether `date` lies within this window relative to `now`.
    pub fn contains(&self, date: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        match self.bounds(now) {
            None => true,
            Some((start, end)) => start <= date && date <= end,
        }
    }
}

/// One harvesting run's inputs.
#[derive(Debug, Clone, Default)]
pub struct ExtractionRequest {
    /// Provider-side place identifier (feature id, e.g. "0x89c25...:0x6d7...")
    pub place_id: String,

    /// Maximum records to keep; `None` means unbounded
    pub max_records: Option<usize>,

    /// Date window for kept records
    pub window: DateWindow,

    /// Locale sent with every call
    pub locale: LocaleSettings,

    /// Pacing preset
    pub pacing: PacingMode,

    /// Whether to classify the language of free-text fields
    pub classify_language: bool,

    /// Optional shared proxy pool; a proxy is leased for the whole run
    pub proxies: Option<Arc<ProxyPool>>,
}

impl ExtractionRequest {
    /// Create a request for a place with default settings.
    pub fn new(place_id: impl Into<String>) -> Self {
        Self {
            place_id: place_id.into(),
            classify_language: true,
            ..Self::default()
        }
    }

    /// Validate the request before the run starts.
    pub fn validate(&self) -> Result<()> {
        if self.place_id.trim().is_empty() {
            return Err(HarvestError::configuration("place_id is empty"));
        }
        if self.max_records == Some(0) {
            return Err(HarvestError::configuration("max_records must be > 0"));
        }
        if let DateWindow::Custom { start, end } = self.window {
            if start > end {
                return Err(HarvestError::configuration(
                    "custom window start must not be after end",
                ));
            }
        }
        if self.locale.language.trim().is_empty() || self.locale.region.trim().is_empty() {
            return Err(HarvestError::configuration("locale fields must not be empty"));
        }
        Ok(())
    }
}
