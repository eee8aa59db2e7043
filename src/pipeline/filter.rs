// src/pipeline/filter.rs

//! Date-window filtering with an early-stop heuristic.
//!
//! Records usually arrive newest-first, but not in every locale, so the
//! filter never assumes order for correctness: every record is checked
//! against the window individually. The early-stop signal is purely an
//! optimization; once most of the trailing records fall outside the
//! window, further pages are unlikely to contain anything keepable.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};

use crate::models::{DateWindow, FilterConfig, Record};

/// Decision for one evaluated record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterDecision {
    /// Whether the record's resolved date lies within the window
    pub keep: bool,
    /// Whether the orchestrator should stop paginating
    pub stop: bool,
}

/// Per-run date filter.
#[derive(Debug)]
pub struct DateFilter {
    window: DateWindow,
    config: FilterConfig,
    /// Trailing out-of-window flags, newest at the back
    trailing: VecDeque<bool>,
}

impl DateFilter {
    pub fn new(window: DateWindow, config: FilterConfig) -> Self {
        Self {
            window,
            config,
            trailing: VecDeque::new(),
        }
    }

    /// Evaluate one record against the window.
    ///
    /// A record whose date no tier resolved cannot be proven in-window
    /// and is dropped under any bounded window.
    pub fn evaluate(&mut self, record: &Record, now: DateTime<Utc>) -> FilterDecision {
        if self.window == DateWindow::All {
            return FilterDecision {
                keep: true,
                stop: false,
            };
        }

        let keep = record
            .timestamp
            .map(|date| self.window.contains(date, now))
            .unwrap_or(false);

        self.trailing.push_back(!keep);
        while self.trailing.len() > self.config.early_stop_window {
            self.trailing.pop_front();
        }

        FilterDecision {
            keep,
            stop: self.window_exhausted(),
        }
    }

    /// Whether the trailing window is dominated by out-of-window records.
    ///
    /// Only meaningful once the buffer holds a full sample: provider
    /// order is not newest-first in every locale, so a few stale leading
    /// records must not end the run.
    fn window_exhausted(&self) -> bool {
        if self.trailing.len() < self.config.early_stop_window {
            return false;
        }
        let outside = self.trailing.iter().filter(|&&out| out).count();
        let fraction = outside as f64 / self.trailing.len() as f64;
        fraction > self.config.early_stop_fraction
    }
}
