//! Resilient HTTP fetching for HTML sources
//!
//! [`FetchClient`] wraps a pooled `reqwest::Client` with the politeness and
//! retry policy from [`FetchConfig`]:
//!
//! - a random pre-request delay drawn from `[min_delay_ms, max_delay_ms]`
//! - a fixed desktop-browser `User-Agent` on every request
//! - exponential backoff on 429, 5xx and network failures (timeouts included)
//! - immediate `Fatal` on any other non-success status or an unreadable body
//!
//! The client keeps no per-request state between calls, so several fetches may
//! run concurrently and each applies its own delay and backoff.

use std::time::Duration;

use rand::Rng;
use reqwest::{header, StatusCode};
use tracing::{debug, warn};

use crate::config::FetchConfig;
use crate::error::{CollectorError, FetchError, FetchErrorKind};


/// Result of a single HTTP round trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    Success,
    Retryable(FetchErrorKind),
    Fatal,
}

/// One round trip made while serving a `fetch` call.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchAttempt {
    pub url: String,
    /// 1-based attempt number.
    pub attempt: u32,
    /// Backoff slept before this attempt (zero for the first).
    pub backoff: Duration,
    pub status: Option<u16>,
    pub outcome: AttemptOutcome,
}

/// A fetched HTML page plus the attempts it took to get it.
#[derive(Debug, Clone)]
pub struct HtmlDocument {
    pub url: String,
    pub body: String,
    pub attempts: Vec<FetchAttempt>,
}

impl HtmlDocument {
    /// Wrap markup that did not come from the network (fixtures, cached pages).
    pub fn from_html(url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            body: body.into(),
            attempts: Vec::new(),
        }
    }

    /// Number of retries that were needed (attempts beyond the first).
    pub fn retries(&self) -> usize {
        self.attempts.len().saturating_sub(1)
    }
}

struct AttemptFailure {
    kind: FetchErrorKind,
    status: Option<u16>,
    message: String,
}

/// Map an HTTP status onto the retry taxonomy.
pub fn classify_status(status: StatusCode) -> AttemptOutcome {
    if status.is_success() {
        AttemptOutcome::Success
    } else if status == StatusCode::TOO_MANY_REQUESTS {
        AttemptOutcome::Retryable(FetchErrorKind::RateLimited)
    } else if status.is_server_error() {
        AttemptOutcome::Retryable(FetchErrorKind::ServerError)
    } else {
        AttemptOutcome::Fatal
    }
}

/// HTTP client with randomized delay, retries and a browser identity.
#[derive(Debug, Clone)]
pub struct FetchClient {
    http: reqwest::Client,
    config: FetchConfig,
}

impl FetchClient {
    pub fn new(config: FetchConfig) -> Result<Self, CollectorError> {
        config.validate()?;

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("text/html,application/xhtml+xml"),
        );
        headers.insert(
            header::ACCEPT_LANGUAGE,
            header::HeaderValue::from_static("en-GB,en;q=0.9"),
        );

        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .timeout(config.timeout())
            .build()?;

        Ok(Self { http, config })
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Fetch `url`, retrying transient failures per the configured policy.
    ///
    /// # Errors
    ///
    /// Always returns a [`FetchError`] of kind `Fatal`: either the response
    /// could never succeed, or the retry budget ran out. In the latter case
    /// `status` and `last_retryable` describe the last failure seen.
    pub async fn fetch(&self, url: &str) -> Result<HtmlDocument, FetchError> {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempts = Vec::new();
        let mut backoff = Duration::ZERO;
        let mut last_failure: Option<AttemptFailure> = None;

        for attempt in 1..=max_attempts {
            if !backoff.is_zero() {
                tokio::time::sleep(backoff).await;
            }
            let delay = self.politeness_delay();
            if !delay.is_zero() {
                debug!(url, ?delay, "sleeping before request");
                tokio::time::sleep(delay).await;
            }

            match self.send_once(url).await {
                Ok((status, body)) => {
                    attempts.push(FetchAttempt {
                        url: url.to_string(),
                        attempt,
                        backoff,
                        status: Some(status),
                        outcome: AttemptOutcome::Success,
                    });
                    return Ok(HtmlDocument {
                        url: url.to_string(),
                        body,
                        attempts,
                    });
                }
                Err(failure) => {
                    let outcome = if failure.kind.is_retryable() {
                        AttemptOutcome::Retryable(failure.kind)
                    } else {
                        AttemptOutcome::Fatal
                    };
                    attempts.push(FetchAttempt {
                        url: url.to_string(),
                        attempt,
                        backoff,
                        status: failure.status,
                        outcome,
                    });

                    if outcome == AttemptOutcome::Fatal {
                        return Err(FetchError {
                            kind: FetchErrorKind::Fatal,
                            url: url.to_string(),
                            attempts: attempt,
                            status: failure.status,
                            last_retryable: last_failure.map(|f| f.kind),
                            message: failure.message,
                        });
                    }

                    warn!(
                        url,
                        attempt,
                        max_attempts,
                        kind = %failure.kind,
                        "request failed: {}",
                        failure.message
                    );
                    backoff = self.config.backoff_for(attempt);
                    last_failure = Some(failure);
                }
            }
        }

        let (status, last_retryable, message) = match last_failure {
            Some(f) => (f.status, Some(f.kind), f.message),
            None => (None, None, "no attempt was made".to_string()),
        };
        Err(FetchError {
            kind: FetchErrorKind::Fatal,
            url: url.to_string(),
            attempts: max_attempts,
            status,
            last_retryable,
            message: format!("retry budget exhausted: {message}"),
        })
    }

    fn politeness_delay(&self) -> Duration {
        let (min, max) = (self.config.min_delay_ms, self.config.max_delay_ms);
        if max == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::thread_rng().gen_range(min..=max))
    }

    async fn send_once(&self, url: &str) -> Result<(u16, String), AttemptFailure> {
        let response = self.http.get(url).send().await.map_err(|e| AttemptFailure {
            kind: if e.is_builder() {
                FetchErrorKind::Fatal
            } else {
                FetchErrorKind::NetworkError
            },
            status: None,
            message: e.to_string(),
        })?;

        let status = response.status();
        match classify_status(status) {
            AttemptOutcome::Success => {}
            AttemptOutcome::Retryable(kind) => {
                return Err(AttemptFailure {
                    kind,
                    status: Some(status.as_u16()),
                    message: format!("unexpected status {status}"),
                })
            }
            AttemptOutcome::Fatal => {
                return Err(AttemptFailure {
                    kind: FetchErrorKind::Fatal,
                    status: Some(status.as_u16()),
                    message: format!("unexpected status {status}"),
                })
            }
        }

        let body = response.text().await.map_err(|e| AttemptFailure {
            kind: if e.is_timeout() {
                FetchErrorKind::NetworkError
            } else {
                FetchErrorKind::Fatal
            },
            status: Some(status.as_u16()),
            message: format!("malformed response body: {e}"),
        })?;

        Ok((status.as_u16(), body))
    }
}
