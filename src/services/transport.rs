// src/services/transport.rs

//! RPC transport with classed retry.
//!
//! Issues one logical RPC call per page, applying a deterministic,
//! failure-class-specific backoff schedule. A retry always replays the
//! identical envelope; pagination state never advances on retry.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use tokio::time::Instant;
use url::Url;

use crate::error::{FailureClass, Result, TransportError};
use crate::models::{HttpConfig, LocaleSettings, PageToken, RawPage, RetryConfig, RunStats};
use crate::services::fingerprint;
use crate::services::pacing::{PacingController, RequestOutcome};

/// One page's fully-built RPC request.
///
/// Built once per page and reused verbatim across retries.
#[derive(Debug, Clone)]
pub struct Envelope {
    url: Url,
    page_number: usize,
}

impl Envelope {
    /// Build the request envelope for one page of reviews.
    pub fn new(
        endpoint_base: &str,
        place_id: &str,
        locale: &LocaleSettings,
        page_size: usize,
        token: Option<&PageToken>,
        page_number: usize,
    ) -> Result<Self> {
        let mut url = Url::parse(endpoint_base)?;
        let pb = Self::pb_param(place_id, page_size, token);
        url.query_pairs_mut()
            .append_pair("authuser", "0")
            .append_pair("hl", &locale.language)
            .append_pair("gl", &locale.region)
            .append_pair("pb", &pb);
        Ok(Self { url, page_number })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn page_number(&self) -> usize {
        self.page_number
    }

    /// The provider's positional `pb` request blob.
    ///
    /// Positions observed from the provider's own client: `1s` carries the
    /// place feature id, `1i` the page size, `2s` the continuation token
    /// (empty on the first page).
    fn pb_param(place_id: &str, page_size: usize, token: Option<&PageToken>) -> String {
        let token = token.map(PageToken::as_str).unwrap_or("");
        format!(
            "!1m6!1s{place_id}!6m4!4m1!1e1!4m1!1e3!2m2!1i{page_size}!2s{token}\
             !5m2!1sreplay!7e81!8m5!1b1!2b1!3b1!5b1!7b1"
        )
    }
}

/// HTTP transport bound to one run.
pub struct Transport {
    client: Client,
    retry: RetryConfig,
}

impl Transport {
    /// Build a transport from HTTP settings and an optional proxy URL.
    pub fn new(http: &HttpConfig, proxy: Option<&str>) -> Result<Self> {
        Self::with_retry(http, proxy, RetryConfig::default())
    }

    /// Build a transport with an explicit retry schedule table.
    pub fn with_retry(http: &HttpConfig, proxy: Option<&str>, retry: RetryConfig) -> Result<Self> {
        let mut builder = Client::builder().timeout(http.request_timeout());
        if let Some(proxy_url) = proxy {
            builder = builder.proxy(reqwest::Proxy::all(proxy_url)?);
        }
        let client = builder.build()?;
        Ok(Self { client, retry })
    }

    /// Issue one logical RPC call, retrying per failure class.
    ///
    /// Every HTTP attempt is recorded into `stats` and the pacing window.
    /// Exhausting the class's schedule surfaces the last error.
    pub async fn send(
        &self,
        envelope: &Envelope,
        user_agents: &[String],
        locale: &LocaleSettings,
        stats: &mut RunStats,
        pacing: &mut PacingController,
    ) -> std::result::Result<RawPage, TransportError> {
        let mut retries_used = 0usize;

        loop {
            stats.requests_issued += 1;
            match self.attempt(envelope, user_agents, locale).await {
                Ok(page) => {
                    stats.requests_succeeded += 1;
                    pacing.record(RequestOutcome::Ok);
                    return Ok(page);
                }
                Err(error) => {
                    let class = error.class();
                    stats.record_failure(class);
                    pacing.record(match class {
                        FailureClass::RateLimited => RequestOutcome::RateLimited,
                        _ => RequestOutcome::Failed,
                    });

                    let schedule = self.schedule(class);
                    if retries_used >= schedule.len() {
                        log::warn!(
                            "page {}: {} after {} attempt(s), giving up",
                            envelope.page_number(),
                            class.as_str(),
                            retries_used + 1
                        );
                        return Err(error);
                    }

                    let delay = Duration::from_millis(schedule[retries_used]);
                    retries_used += 1;
                    stats.retries += 1;
                    log::warn!(
                        "page {}: {} ({}), retry {}/{} in {:?}",
                        envelope.page_number(),
                        class.as_str(),
                        error,
                        retries_used,
                        schedule.len(),
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    /// One HTTP attempt, classified on failure.
    async fn attempt(
        &self,
        envelope: &Envelope,
        user_agents: &[String],
        locale: &LocaleSettings,
    ) -> std::result::Result<RawPage, TransportError> {
        let headers = fingerprint::request_headers(user_agents, locale)
            .map_err(TransportError::non_retryable)?;

        let started = Instant::now();
        let response = self
            .client
            .get(envelope.url().clone())
            .headers(headers)
            .send()
            .await
            .map_err(|e| Self::classify_request_error(&e, started.elapsed()))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(TransportError::RateLimited {
                status: status.as_u16(),
            });
        }
        if status.is_server_error() {
            return Err(TransportError::ServerError {
                status: status.as_u16(),
            });
        }
        if !status.is_success() {
            return Err(TransportError::non_retryable(format!(
                "unexpected status {status}"
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Self::classify_request_error(&e, started.elapsed()))?;

        Ok(RawPage {
            body,
            status: status.as_u16(),
            latency: started.elapsed(),
            page_number: envelope.page_number(),
        })
    }

    /// The retry delay schedule for a failure class.
    ///
    /// An empty schedule means the class is not retryable.
    pub fn schedule(&self, class: FailureClass) -> &[u64] {
        match class {
            FailureClass::RateLimited => &self.retry.rate_limited_delays_ms,
            FailureClass::ServerError => &self.retry.server_error_delays_ms,
            FailureClass::Timeout => &self.retry.timeout_delays_ms,
            FailureClass::NetworkUnreachable | FailureClass::NonRetryable => &[],
        }
    }

    fn classify_request_error(error: &reqwest::Error, elapsed: Duration) -> TransportError {
        if error.is_timeout() {
            TransportError::Timeout { elapsed }
        } else if error.is_connect() {
            TransportError::NetworkUnreachable {
                message: error.to_string(),
            }
        } else {
            TransportError::non_retryable(error)
        }
    }
}
