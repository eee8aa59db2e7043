// src/services/pacing.rs

//! Adaptive request pacing.
//!
//! Decides the delay before the next request from the configured pacing
//! mode and a rolling window of recent response outcomes. When the
//! rate-limited fraction of the window crosses the configured threshold,
//! delays are multiplied by an escalating factor and the controller
//! signals the orchestrator to slow down.

use std::collections::VecDeque;
use std::time::Duration;

use tokio::time::Instant;

use crate::models::{PacingConfig, PacingMode};

/// Outcome of one HTTP attempt, as seen by the pacing window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    Ok,
    RateLimited,
    Failed,
}

/// Per-run pacing controller.
///
/// Owns a sliding log of `(instant, outcome)` pairs; entries older than
/// the window width are evicted from the front before each evaluation,
/// so eviction is O(stale entries), not O(window size).
#[derive(Debug)]
pub struct PacingController {
    mode: PacingMode,
    config: PacingConfig,
    window: VecDeque<(Instant, RequestOutcome)>,
    escalation: u32,
}

impl PacingController {
    pub fn new(mode: PacingMode, config: PacingConfig) -> Self {
        Self {
            mode,
            config,
            window: VecDeque::new(),
            escalation: 1,
        }
    }

    /// Record the outcome of one HTTP attempt.
    pub fn record(&mut self, outcome: RequestOutcome) {
        self.window.push_back((Instant::now(), outcome));
    }

    /// Delay to apply before the next request.
    ///
    /// Uniform random within the mode's range, multiplied by the current
    /// escalation factor when the recent window runs hot.
    pub fn next_delay(&mut self) -> Duration {
        let (min, max) = match self.mode {
            PacingMode::Fast => self.config.fast_delay_ms,
            PacingMode::Human => self.config.human_delay_ms,
        };
        let base = if max > min {
            fastrand::u64(min..=max)
        } else {
            min
        };

        self.evaluate();
        Duration::from_millis(base.saturating_mul(u64::from(self.escalation)))
    }

    /// Whether the controller is currently signalling slow-down.
    pub fn is_throttling(&self) -> bool {
        self.escalation > 1
    }

    /// Re-evaluate the rolling window and adjust the escalation factor.
    fn evaluate(&mut self) {
        self.evict_stale();
        if self.window.is_empty() {
            self.escalation = 1;
            return;
        }

        let limited = self
            .window
            .iter()
            .filter(|(_, o)| *o == RequestOutcome::RateLimited)
            .count();
        let fraction = limited as f64 / self.window.len() as f64;

        if fraction > self.config.rate_limit_threshold {
            let doubled = self.escalation.saturating_mul(2);
            self.escalation = doubled.min(self.config.escalation_cap.max(2));
            log::warn!(
                "pacing: {:.0}% of recent requests rate-limited, escalation x{}",
                fraction * 100.0,
                self.escalation
            );
        } else {
            self.escalation = 1;
        }
    }

    fn evict_stale(&mut self) {
        let width = Duration::from_secs(self.config.rate_limit_window_secs);
        let now = Instant::now();
        while let Some((at, _)) = self.window.front() {
            if now.duration_since(*at) > width {
                self.window.pop_front();
            } else {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller(mode: PacingMode) -> PacingController {
        PacingController::new(mode, PacingConfig::default())
    }

    #[tokio::test]
    async fn test_fast_delay_within_range() {
        let mut pacing = controller(PacingMode::Fast);
        for _ in 0..50 {
            let delay = pacing.next_delay();
            assert!(delay >= Duration::from_millis(50), "delay {delay:?} too short");
            assert!(delay <= Duration::from_millis(150), "delay {delay:?} too long");
        }
    }

    #[tokio::test]
    async fn test_human_delay_within_range() {
        let mut pacing = controller(PacingMode::Human);
        for _ in 0..50 {
            let delay = pacing.next_delay();
            assert!(delay >= Duration::from_millis(500));
            assert!(delay <= Duration::from_millis(1500));
        }
    }

    #[tokio::test]
    async fn test_hot_window_escalates_and_signals() {
        let mut pacing = controller(PacingMode::Fast);
        for _ in 0..6 {
            pacing.record(RequestOutcome::RateLimited);
        }
        for _ in 0..4 {
            pacing.record(RequestOutcome::Ok);
        }

        // 60% rate-limited exceeds the 0.3 default threshold
        let delay = pacing.next_delay();
        assert!(pacing.is_throttling());
        assert!(delay >= Duration::from_millis(100)); // 50ms floor x2

        // A second hot evaluation doubles again
        pacing.next_delay();
        assert!(pacing.is_throttling());
    }

    #[tokio::test]
    async fn test_escalation_caps() {
        let mut pacing = controller(PacingMode::Fast);
        for _ in 0..10 {
            pacing.record(RequestOutcome::RateLimited);
        }
        for _ in 0..10 {
            pacing.next_delay();
        }
        assert!(pacing.escalation <= PacingConfig::default().escalation_cap);
    }

    #[tokio::test]
    async fn test_cool_window_resets_escalation() {
        let mut pacing = controller(PacingMode::Fast);
        for _ in 0..5 {
            pacing.record(RequestOutcome::RateLimited);
        }
        pacing.next_delay();
        assert!(pacing.is_throttling());

        for _ in 0..30 {
            pacing.record(RequestOutcome::Ok);
        }
        pacing.next_delay();
        assert!(!pacing.is_throttling());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_entries_evicted() {
        let mut pacing = controller(PacingMode::Fast);
        for _ in 0..10 {
            pacing.record(RequestOutcome::RateLimited);
        }

        // Jump past the 60s window; the hot entries no longer count.
        tokio::time::advance(Duration::from_secs(61)).await;
        pacing.next_delay();
        assert!(!pacing.is_throttling());
        assert!(pacing.window.is_empty());
    }
}
