// src/pipeline/harvest.rs

//! Extraction orchestration.
//!
//! Composes pacing, transport, parsing, filtering, and classification
//! into one run: a strictly sequential page loop that always terminates
//! with an [`ExtractionResult`] carrying whatever records were
//! accumulated and an explicit terminal reason.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::models::{ExtractionRequest, ExtractionResult, HarvesterConfig, Record, RunStats, TerminalReason};
use crate::pipeline::cursor::{CursorAdvance, CursorManager};
use crate::pipeline::filter::DateFilter;
use crate::pipeline::parse;
use crate::services::language::LanguageClassifier;
use crate::services::pacing::PacingController;
use crate::services::translate::Translator;
use crate::services::transport::{Envelope, Transport};

/// Advisory progress event, emitted after each decoded page.
#[derive(Debug, Clone)]
pub struct ProgressUpdate {
    /// 1-based page number just decoded
    pub page_number: usize,
    /// Records kept so far across the run
    pub records_so_far: usize,
    /// Provider's total review count, when known
    pub total_hint: Option<u64>,
}

/// Harvesting engine for review extraction runs.
///
/// One instance may serve many runs; all per-run state (pacing window,
/// cursor, filter, stats) is created inside [`Harvester::run`], so
/// concurrent runs on separate requests share nothing mutable.
pub struct Harvester {
    config: HarvesterConfig,
    classifier: LanguageClassifier,
    translator: Option<Arc<dyn Translator>>,
    progress: Option<UnboundedSender<ProgressUpdate>>,
    cancel: CancellationToken,
}

impl Harvester {
    pub fn new(config: HarvesterConfig) -> Self {
        Self {
            config,
            classifier: LanguageClassifier::new(),
            translator: None,
            progress: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Replace the default classifier (e.g. to add a statistical fallback).
    pub fn with_classifier(mut self, classifier: LanguageClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Attach a translation collaborator for kept records.
    pub fn with_translator(mut self, translator: Arc<dyn Translator>) -> Self {
        self.translator = Some(translator);
        self
    }

    /// Attach an advisory progress sink.
    ///
    /// Events are pushed through an unbounded channel, so a slow
    /// consumer can never block the extraction loop.
    pub fn with_progress(mut self, sink: UnboundedSender<ProgressUpdate>) -> Self {
        self.progress = Some(sink);
        self
    }

    /// Token that cancels runs cooperatively between page fetches.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Execute one extraction run.
    ///
    /// Returns `Err` only for configuration rejection; once the run
    /// starts, every outcome (including transport exhaustion, timeout,
    /// and cancellation) is an `Ok` result with partial records and a
    /// terminal reason.
    pub async fn run(&self, request: &ExtractionRequest) -> Result<ExtractionResult> {
        request.validate()?;
        self.config.validate()?;

        let lease = request.proxies.as_ref().and_then(|pool| pool.checkout());
        if request.proxies.is_some() && lease.is_none() {
            log::warn!("proxy pool exhausted, continuing without proxy");
        }
        let transport = Transport::with_retry(
            &self.config.http,
            lease.as_ref().map(|l| l.url()),
            self.config.retry.clone(),
        )?;

        let mut pacing = PacingController::new(request.pacing, self.config.pacing.clone());
        let mut cursor = CursorManager::new();
        let mut filter = DateFilter::new(request.window, self.config.filter.clone());
        let mut stats = RunStats::default();
        let mut records: Vec<Record> = Vec::new();
        let mut seen_ids: HashSet<String> = HashSet::new();

        let now = Utc::now();
        let deadline = Instant::now() + self.config.run.run_timeout();

        log::info!(
            "harvest start: place {}, window {:?}, cap {:?}",
            request.place_id,
            request.window,
            request.max_records
        );

        let terminal_reason = 'run: loop {
            // Cancellation and the run deadline are honored between
            // pages, never mid-flight.
            if self.cancel.is_cancelled() {
                break TerminalReason::Cancelled;
            }

            let delay = pacing.next_delay();
            tokio::select! {
                _ = self.cancel.cancelled() => break TerminalReason::Cancelled,
                _ = tokio::time::sleep_until(deadline) => break TerminalReason::TimedOut,
                _ = tokio::time::sleep(delay) => {}
            }

            let envelope = Envelope::new(
                &self.config.http.endpoint_base,
                &request.place_id,
                &request.locale,
                self.config.run.page_size,
                cursor.token(),
                cursor.next_page_number(),
            )?;

            let send = transport.send(
                &envelope,
                &self.config.http.user_agents,
                &request.locale,
                &mut stats,
                &mut pacing,
            );
            let page = tokio::select! {
                outcome = send => match outcome {
                    Ok(page) => page,
                    Err(error) => {
                        log::error!(
                            "page {} abandoned ({}), returning partial results",
                            envelope.page_number(),
                            error
                        );
                        break TerminalReason::TransportExhausted;
                    }
                },
                _ = tokio::time::sleep_until(deadline) => break TerminalReason::TimedOut,
            };

            let parsed = match parse::parse_page(&page, now) {
                Ok(parsed) => parsed,
                Err(error) => {
                    log::error!("page {} undecodable: {error}", page.page_number);
                    break TerminalReason::TransportExhausted;
                }
            };
            stats.pages_walked += 1;
            stats.records_discarded += parsed.discarded as u64;

            let mut window_exhausted = false;
            for mut record in parsed.records {
                // Defense in depth: correct token handling already
                // prevents replays, but identity-set membership also
                // guarantees the no-duplicates invariant.
                if !seen_ids.insert(record.id.clone()) {
                    stats.records_duplicate += 1;
                    continue;
                }

                let decision = filter.evaluate(&record, now);
                if decision.stop {
                    window_exhausted = true;
                }
                if !decision.keep {
                    stats.records_filtered += 1;
                    continue;
                }

                if request.classify_language && !record.text.is_empty() {
                    let tag = self.classifier.classify(&record.text);
                    if let Some(translator) = &self.translator {
                        match translator.translate(&record.text, &tag).await {
                            Ok(translated) => record.translated_text = Some(translated),
                            Err(error) => {
                                log::warn!("translation failed for {}: {error}", record.id)
                            }
                        }
                    }
                    record.language = Some(tag);
                }

                records.push(record);
                stats.records_kept += 1;

                if let Some(max) = request.max_records {
                    if records.len() >= max {
                        break 'run TerminalReason::MaxRecordsReached;
                    }
                }
            }

            self.emit_progress(page.page_number, records.len(), parsed.total_hint);

            match cursor.advance(parsed.next_token) {
                CursorAdvance::Done => break TerminalReason::Completed,
                CursorAdvance::Next(_) => {}
            }
            if window_exhausted {
                break TerminalReason::DateWindowExhausted;
            }
        };

        log::info!(
            "harvest end: {:?}, {} kept / {} filtered over {} page(s)",
            terminal_reason,
            stats.records_kept,
            stats.records_filtered,
            stats.pages_walked
        );

        Ok(ExtractionResult {
            records,
            stats,
            terminal_reason,
        })
    }

    fn emit_progress(&self, page_number: usize, records_so_far: usize, total_hint: Option<u64>) {
        if let Some(sink) = &self.progress {
            // Fire-and-forget; a dropped receiver is not our problem.
            let _ = sink.send(ProgressUpdate {
                page_number,
                records_so_far,
                total_hint,
            });
        }
    }
}
