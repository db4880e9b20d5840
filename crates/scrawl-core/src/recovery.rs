//! Retry with backoff, and tiered render fallbacks
//!
//! Transient failures (resource reads, decodes) get retried with
//! exponential backoff; structural failures fail after a single attempt.
//! For rendering specifically, [`render_with_recovery`] walks a
//! primary → fallback → emergency ladder so the user sees *something*
//! whenever the failure is not capability-fatal.

use crate::error::{Result, ScrawlError};
use std::time::Duration;

/// Backoff schedule for [`with_retry`]
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Additional attempts after the first
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(100),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// A policy that never sleeps, for tests and interactive paths.
    pub fn immediate(max_retries: u32) -> Self {
        Self {
            max_retries,
            initial_delay: Duration::ZERO,
            multiplier: 1.0,
        }
    }

    fn delay_for(&self, attempt: u32) -> Duration {
        if self.initial_delay.is_zero() {
            return Duration::ZERO;
        }
        self.initial_delay
            .mul_f64(self.multiplier.powi(attempt as i32))
    }
}

/// How a retried operation ultimately resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryStrategy {
    /// Succeeded on the first attempt
    Direct,
    /// Succeeded after at least one retry
    Retry,
    /// Exhausted retries or hit a non-retryable error
    Failed,
}

/// The discriminated result of [`with_retry`]
#[derive(Debug)]
pub struct Recovered<T> {
    pub value: Result<T>,
    pub attempts: u32,
    pub strategy: RecoveryStrategy,
}

impl<T> Recovered<T> {
    pub fn is_success(&self) -> bool {
        self.value.is_ok()
    }
}

/// Run `op`, retrying transient failures with exponential backoff.
///
/// A transient error is retried up to `policy.max_retries` additional
/// times; a non-transient error returns after exactly one attempt.
pub fn with_retry<T>(
    mut op: impl FnMut() -> Result<T>,
    label: &str,
    policy: &RetryPolicy,
) -> Recovered<T> {
    let mut attempt = 0u32;
    loop {
        match op() {
            Ok(value) => {
                let strategy = if attempt == 0 {
                    RecoveryStrategy::Direct
                } else {
                    RecoveryStrategy::Retry
                };
                return Recovered {
                    value: Ok(value),
                    attempts: attempt + 1,
                    strategy,
                };
            },
            Err(err) if err.is_transient() && attempt < policy.max_retries => {
                let delay = policy.delay_for(attempt);
                log::warn!(
                    "{label}: attempt {} failed ({err}), retrying in {delay:?}",
                    attempt + 1
                );
                if !delay.is_zero() {
                    std::thread::sleep(delay);
                }
                attempt += 1;
            },
            Err(err) => {
                log::warn!("{label}: giving up after {} attempt(s): {err}", attempt + 1);
                return Recovered {
                    value: Err(err),
                    attempts: attempt + 1,
                    strategy: RecoveryStrategy::Failed,
                };
            },
        }
    }
}

/// Which render path finally produced output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderPath {
    Primary,
    Fallback,
    Emergency,
    AllFailed,
}

/// The result of a tiered render
#[derive(Debug)]
pub struct RecoveredRender<T> {
    pub value: Option<T>,
    pub path: RenderPath,
    /// The last error seen, kept for diagnostics even on fallback success
    pub error: Option<ScrawlError>,
}

impl<T> RecoveredRender<T> {
    pub fn is_success(&self) -> bool {
        self.value.is_some()
    }
}

/// Try the primary render; on failure the fallback (handed the primary's
/// error as context); on further failure an optional emergency path.
pub fn render_with_recovery<T, P, F, E>(
    primary: P,
    fallback: F,
    emergency: Option<E>,
) -> RecoveredRender<T>
where
    P: FnOnce() -> Result<T>,
    F: FnOnce(&ScrawlError) -> Result<T>,
    E: FnOnce() -> Result<T>,
{
    let primary_err = match primary() {
        Ok(value) => {
            return RecoveredRender {
                value: Some(value),
                path: RenderPath::Primary,
                error: None,
            }
        },
        Err(err) => err,
    };
    log::warn!("primary render failed ({primary_err}), trying fallback");

    let fallback_err = match fallback(&primary_err) {
        Ok(value) => {
            return RecoveredRender {
                value: Some(value),
                path: RenderPath::Fallback,
                error: Some(primary_err),
            }
        },
        Err(err) => err,
    };

    if let Some(emergency) = emergency {
        log::warn!("fallback render failed ({fallback_err}), trying emergency path");
        if let Ok(value) = emergency() {
            return RecoveredRender {
                value: Some(value),
                path: RenderPath::Emergency,
                error: Some(fallback_err),
            };
        }
    }

    RecoveredRender {
        value: None,
        path: RenderPath::AllFailed,
        error: Some(fallback_err),
    }
}
