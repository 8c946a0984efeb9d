//! In-memory ride repository.
//!
//! Same contract as the PostgreSQL repository, including the optimistic
//! version check. Used for local runs without a database and in tests.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::aggregate::Ride;

use super::repository::{Page, PageRequest, RideFilter, RideRepository};
use super::StoreError;

#[derive(Debug, Default)]
pub struct InMemoryRideRepository {
    rides: RwLock<HashMap<Uuid, Ride>>,
}

impl InMemoryRideRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.rides.read().await.len()
    }
}

#[async_trait]
impl RideRepository for InMemoryRideRepository {
    async fn insert(&self, ride: &Ride) -> Result<(), StoreError> {
        let mut rides = self.rides.write().await;
        if rides.contains_key(&ride.id) {
            return Err(StoreError::Duplicate(ride.id));
        }
        rides.insert(ride.id, ride.clone());
        Ok(())
    }

    async fn find(&self, id: Uuid) -> Result<Option<Ride>, StoreError> {
        Ok(self.rides.read().await.get(&id).cloned())
    }

    async fn update(&self, ride: &Ride) -> Result<Ride, StoreError> {
        let mut rides = self.rides.write().await;
        let stored = rides.get_mut(&ride.id).ok_or(StoreError::NotFound(ride.id))?;

        if stored.version != ride.version {
            return Err(StoreError::VersionConflict {
                ride_id: ride.id,
                expected: ride.version,
            });
        }

        let mut saved = ride.clone();
        saved.cost = stored.cost;
        saved.created_at = stored.created_at;
        saved.version = stored.version + 1;
        *stored = saved.clone();

        Ok(saved)
    }

    async fn list(&self, filter: RideFilter, page: PageRequest) -> Result<Page<Ride>, StoreError> {
        let rides = self.rides.read().await;

        let mut matching: Vec<&Ride> = rides.values().filter(|r| filter.matches(r)).collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));

        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .cloned()
            .collect();

        Ok(Page {
            items,
            page: page.page(),
            limit: page.limit(),
            total,
        })
    }
}
