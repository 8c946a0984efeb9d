//! Circuit Breaker
//!
//! Guards calls to the remote actor directories. After `failure_threshold`
//! consecutive failures the breaker opens and rejects calls outright for
//! `open_duration`; it then lets calls through half-open and closes again
//! after `success_threshold` consecutive successes.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

/// Breaker tuning
#[derive(Debug, Clone)]
pub struct BreakerConfig {
    /// Consecutive failures before opening
    pub failure_threshold: u32,
    /// Time spent open before probing again
    pub open_duration: Duration,
    /// Consecutive half-open successes before closing
    pub success_threshold: u32,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            open_duration: Duration::from_secs(30),
            success_threshold: 2,
        }
    }
}

/// Breaker state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    Closed,
    Open,
    HalfOpen,
}

/// Errors from a guarded call
#[derive(Debug, thiserror::Error)]
pub enum BreakerError<E> {
    #[error("Circuit breaker is open")]
    Open,

    #[error("{0}")]
    Inner(E),
}

#[derive(Debug)]
struct Inner {
    state: BreakerState,
    failures: u32,
    successes: u32,
    opened_at: Option<Instant>,
}

/// Shared-state circuit breaker; clones observe the same state.
#[derive(Debug, Clone)]
pub struct CircuitBreaker {
    name: &'static str,
    config: Arc<BreakerConfig>,
    inner: Arc<Mutex<Inner>>,
}

impl CircuitBreaker {
    pub fn new(name: &'static str, config: BreakerConfig) -> Self {
        Self {
            name,
            config: Arc::new(config),
            inner: Arc::new(Mutex::new(Inner {
                state: BreakerState::Closed,
                failures: 0,
                successes: 0,
                opened_at: None,
            })),
        }
    }

    pub async fn state(&self) -> BreakerState {
        self.inner.lock().await.state
    }

    /// Run `operation` unless the breaker is open.
    ///
    /// Only `Err` results count as failures.
    pub async fn call<F, Fut, T, E>(&self, operation: F) -> Result<T, BreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if !self.try_acquire().await {
            tracing::warn!(breaker = self.name, "Circuit breaker open, rejecting call");
            return Err(BreakerError::Open);
        }

        match operation().await {
            Ok(value) => {
                self.record_success().await;
                Ok(value)
            }
            Err(err) => {
                self.record_failure().await;
                Err(BreakerError::Inner(err))
            }
        }
    }

    async fn try_acquire(&self) -> bool {
        let mut inner = self.inner.lock().await;

        match inner.state {
            BreakerState::Closed | BreakerState::HalfOpen => true,
            BreakerState::Open => {
                let elapsed = inner
                    .opened_at
                    .map(|at| at.elapsed() >= self.config.open_duration)
                    .unwrap_or(true);

                if elapsed {
                    tracing::info!(breaker = self.name, "Circuit breaker OPEN -> HALF_OPEN");
                    inner.state = BreakerState::HalfOpen;
                    inner.successes = 0;
                }
                elapsed
            }
        }
    }

    async fn record_success(&self) {
        let mut inner = self.inner.lock().await;

        match inner.state {
            BreakerState::HalfOpen => {
                inner.successes += 1;
                if inner.successes >= self.config.success_threshold {
                    tracing::info!(breaker = self.name, "Circuit breaker HALF_OPEN -> CLOSED");
                    inner.state = BreakerState::Closed;
                    inner.failures = 0;
                    inner.successes = 0;
                    inner.opened_at = None;
                }
            }
            BreakerState::Closed | BreakerState::Open => {
                inner.failures = 0;
            }
        }
    }

    async fn record_failure(&self) {
        let mut inner = self.inner.lock().await;

        match inner.state {
            BreakerState::Closed => {
                inner.failures += 1;
                if inner.failures >= self.config.failure_threshold {
                    tracing::warn!(
                        breaker = self.name,
                        failures = inner.failures,
                        "Circuit breaker CLOSED -> OPEN"
                    );
                    inner.state = BreakerState::Open;
                    inner.opened_at = Some(Instant::now());
                }
            }
            BreakerState::HalfOpen => {
                tracing::warn!(breaker = self.name, "Circuit breaker HALF_OPEN -> OPEN");
                inner.state = BreakerState::Open;
                inner.failures = 1;
                inner.successes = 0;
                inner.opened_at = Some(Instant::now());
            }
            BreakerState::Open => {
                inner.failures += 1;
            }
        }
    }
}
