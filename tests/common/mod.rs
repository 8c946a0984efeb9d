//! Common test utilities

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Request, Response},
    Router,
};
use serde::Serialize;
use serde_json::Value;

use ride_coordinator::api::{self, AppState};
use ride_coordinator::domain::ActorRole;
use ride_coordinator::gateway::{
    ActorDirectory, BreakerConfig, CircuitBreaker, ExistenceGateway, Lookup, LookupError,
};
use ride_coordinator::handlers::RideLifecycleService;
use ride_coordinator::notification::NotificationBus;
use ride_coordinator::pricing::RandomPriceGenerator;
use ride_coordinator::store::{InMemoryRideRepository, RideStore};

/// Actor directory answering from a fixed id set
pub struct StaticDirectory {
    known: HashSet<i64>,
}

impl StaticDirectory {
    pub fn new(ids: &[i64]) -> Arc<Self> {
        Arc::new(Self {
            known: ids.iter().copied().collect(),
        })
    }
}

#[async_trait]
impl ActorDirectory for StaticDirectory {
    async fn lookup(&self, id: i64) -> Result<Lookup, LookupError> {
        if self.known.contains(&id) {
            Ok(Lookup::Found)
        } else {
            Ok(Lookup::Missing)
        }
    }
}

pub struct TestApp {
    pub router: Router,
    pub notifications: NotificationBus,
}

/// Router over in-memory storage. Drivers 1 and 2 and passengers 1 and 2
/// exist. Must be called inside a Tokio runtime.
pub fn setup_test_app() -> TestApp {
    let gateway = |role: ActorRole| {
        ExistenceGateway::new(
            role,
            StaticDirectory::new(&[1, 2]),
            CircuitBreaker::new(role.as_str(), BreakerConfig::default()),
            Duration::from_secs(1),
        )
    };

    let store = Arc::new(RideStore::new(
        Arc::new(InMemoryRideRepository::new()),
        Duration::from_secs(60),
    ));
    let (notifications, _delivery) = NotificationBus::start(64);

    let rides = Arc::new(RideLifecycleService::new(
        store,
        gateway(ActorRole::Driver),
        gateway(ActorRole::Passenger),
        Arc::new(RandomPriceGenerator),
        Arc::new(notifications.clone()),
    ));

    TestApp {
        router: api::app(AppState::new(rides, notifications.clone())),
        notifications,
    }
}

pub fn json_request(method: &str, uri: &str, body: &impl Serialize) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(body).unwrap()))
        .unwrap()
}

pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
