//! Actor Directories
//!
//! Remote lookups answering "does this driver/passenger exist?".

use async_trait::async_trait;
use reqwest::StatusCode;

use crate::domain::ActorRole;

/// Answer from a directory that was reached successfully
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    Found,
    Missing,
}

/// The directory could not give an answer
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Unexpected response status {0}")]
    UnexpectedStatus(u16),

    #[error("Timed out after {0}ms")]
    Timeout(u128),
}

/// Source of truth for one actor role
#[async_trait]
pub trait ActorDirectory: Send + Sync {
    async fn lookup(&self, id: i64) -> Result<Lookup, LookupError>;
}

/// Directory backed by the actor's own HTTP service.
///
/// `GET {base_url}/api/v1/{drivers|passengers}/{id}`: 2xx means found, 404
/// means missing, anything else is an error.
#[derive(Debug, Clone)]
pub struct HttpActorDirectory {
    client: reqwest::Client,
    base_url: String,
    role: ActorRole,
}

impl HttpActorDirectory {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>, role: ActorRole) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            role,
        }
    }

    fn url(&self, id: i64) -> String {
        format!(
            "{}/api/v1/{}/{}",
            self.base_url.trim_end_matches('/'),
            self.role.collection(),
            id
        )
    }
}

#[async_trait]
impl ActorDirectory for HttpActorDirectory {
    async fn lookup(&self, id: i64) -> Result<Lookup, LookupError> {
        let url = self.url(id);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| LookupError::Transport(e.to_string()))?;

        match response.status() {
            status if status.is_success() => Ok(Lookup::Found),
            StatusCode::NOT_FOUND => Ok(Lookup::Missing),
            status => {
                tracing::debug!(%url, status = status.as_u16(), "Unexpected directory response");
                Err(LookupError::UnexpectedStatus(status.as_u16()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::Path, http::StatusCode as HttpStatus, routing::get, Router};
    use std::net::SocketAddr;

    /// Driver service stub: 1 exists, 2 is unknown, anything else fails
    async fn spawn_driver_service() -> SocketAddr {
        async fn driver(Path(id): Path<i64>) -> HttpStatus {
            match id {
                1 => HttpStatus::OK,
                2 => HttpStatus::NOT_FOUND,
                _ => HttpStatus::INTERNAL_SERVER_ERROR,
            }
        }

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = Router::new().route("/api/v1/drivers/:id", get(driver));
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        addr
    }

    fn drivers_at(addr: SocketAddr) -> HttpActorDirectory {
        HttpActorDirectory::new(
            reqwest::Client::new(),
            format!("http://{}", addr),
            ActorRole::Driver,
        )
    }

    #[tokio::test]
    async fn test_lookup_maps_response_status() {
        let directory = drivers_at(spawn_driver_service().await);

        assert_eq!(directory.lookup(1).await, Ok(Lookup::Found));
        assert_eq!(directory.lookup(2).await, Ok(Lookup::Missing));
        assert_eq!(
            directory.lookup(3).await,
            Err(LookupError::UnexpectedStatus(500))
        );
    }

    #[tokio::test]
    async fn test_lookup_connection_refused() {
        // Reserve a port, then close it so nothing is listening
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let result = drivers_at(addr).lookup(1).await;

        assert!(matches!(result, Err(LookupError::Transport(_))));
    }

    #[test]
    fn test_url_per_role() {
        let client = reqwest::Client::new();

        let drivers = HttpActorDirectory::new(client.clone(), "http://drivers:8081/", ActorRole::Driver);
        assert_eq!(drivers.url(7), "http://drivers:8081/api/v1/drivers/7");

        let passengers = HttpActorDirectory::new(client, "http://passengers:8082", ActorRole::Passenger);
        assert_eq!(passengers.url(3), "http://passengers:8082/api/v1/passengers/3");
    }
}
