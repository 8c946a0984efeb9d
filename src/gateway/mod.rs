//! Existence Gateways
//!
//! Confirms that the driver and passenger referenced by a ride are real. Each
//! role has its own gateway: a remote directory behind a circuit breaker and a
//! per-call timeout. A "not found" answer is a healthy response and never
//! trips the breaker. There are no retries.

pub mod circuit_breaker;
pub mod directory;

use std::sync::Arc;
use std::time::Duration;

pub use circuit_breaker::{BreakerConfig, BreakerError, BreakerState, CircuitBreaker};
pub use directory::{ActorDirectory, HttpActorDirectory, Lookup, LookupError};

use crate::domain::ActorRole;

/// Why an existence check did not pass
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    #[error("{role} {id} not found")]
    NotFound { role: ActorRole, id: i64 },

    #[error("{role} service unavailable: {reason}")]
    Unavailable { role: ActorRole, reason: String },
}

/// Circuit-breaker protected existence check for one actor role
#[derive(Clone)]
pub struct ExistenceGateway {
    role: ActorRole,
    directory: Arc<dyn ActorDirectory>,
    breaker: CircuitBreaker,
    timeout: Duration,
}

impl ExistenceGateway {
    pub fn new(
        role: ActorRole,
        directory: Arc<dyn ActorDirectory>,
        breaker: CircuitBreaker,
        timeout: Duration,
    ) -> Self {
        Self {
            role,
            directory,
            breaker,
            timeout,
        }
    }

    pub async fn breaker_state(&self) -> BreakerState {
        self.breaker.state().await
    }

    /// Succeeds only if the directory confirms the actor exists.
    pub async fn check(&self, id: i64) -> Result<(), GatewayError> {
        let directory = &self.directory;
        let timeout = self.timeout;

        let outcome = self
            .breaker
            .call(|| async move {
                match tokio::time::timeout(timeout, directory.lookup(id)).await {
                    Ok(result) => result,
                    Err(_) => Err(LookupError::Timeout(timeout.as_millis())),
                }
            })
            .await;

        match outcome {
            Ok(Lookup::Found) => Ok(()),
            Ok(Lookup::Missing) => Err(GatewayError::NotFound {
                role: self.role,
                id,
            }),
            Err(BreakerError::Open) => Err(GatewayError::Unavailable {
                role: self.role,
                reason: "circuit breaker open".to_string(),
            }),
            Err(BreakerError::Inner(e)) => {
                tracing::warn!(role = %self.role, id, error = %e, "Existence check failed");
                Err(GatewayError::Unavailable {
                    role: self.role,
                    reason: e.to_string(),
                })
            }
        }
    }
}

impl std::fmt::Debug for ExistenceGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExistenceGateway")
            .field("role", &self.role)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
