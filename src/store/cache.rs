//! Read-through ride cache.
//!
//! `RideStore` is the only way the service touches persistence. Reads are
//! served from memory while an entry is fresh; every successful write
//! refreshes the entry with the saved ride, and a version conflict evicts it
//! so the next read goes back to the repository.
//!
//! An entry never moves to a lower version. A read that loaded an older row
//! while a save was in flight gets the newer cached ride back instead.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::aggregate::Ride;

use super::repository::{Page, PageRequest, RideFilter, RideRepository};
use super::StoreError;

#[derive(Debug, Clone)]
struct CacheEntry {
    ride: Ride,
    cached_at: Instant,
}

impl CacheEntry {
    fn new(ride: Ride) -> Self {
        Self {
            ride,
            cached_at: Instant::now(),
        }
    }
}

pub struct RideStore {
    repository: Arc<dyn RideRepository>,
    entries: RwLock<HashMap<Uuid, CacheEntry>>,
    ttl: Duration,
}

impl RideStore {
    pub fn new(repository: Arc<dyn RideRepository>, ttl: Duration) -> Self {
        Self {
            repository,
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Load a ride, from cache if fresh
    pub async fn get(&self, id: Uuid) -> Result<Option<Ride>, StoreError> {
        if let Some(entry) = self.entries.read().await.get(&id) {
            if entry.cached_at.elapsed() < self.ttl {
                tracing::trace!(ride_id = %id, "Ride cache hit");
                return Ok(Some(entry.ride.clone()));
            }
        }

        match self.repository.find(id).await? {
            Some(ride) => Ok(Some(self.put(ride).await)),
            None => {
                self.evict(id).await;
                Ok(None)
            }
        }
    }

    pub async fn create(&self, ride: &Ride) -> Result<(), StoreError> {
        self.repository.insert(ride).await?;
        self.put(ride.clone()).await;
        Ok(())
    }

    /// Persist a modified ride and return the saved copy
    pub async fn save(&self, ride: &Ride) -> Result<Ride, StoreError> {
        match self.repository.update(ride).await {
            Ok(saved) => {
                self.put(saved.clone()).await;
                Ok(saved)
            }
            Err(e) => {
                if e.is_version_conflict() {
                    tracing::debug!(ride_id = %ride.id(), "Evicting stale ride after conflict");
                }
                self.evict(ride.id()).await;
                Err(e)
            }
        }
    }

    /// Listings always go to the repository
    pub async fn list(&self, filter: RideFilter, page: PageRequest) -> Result<Page<Ride>, StoreError> {
        self.repository.list(filter, page).await
    }

    pub async fn evict(&self, id: Uuid) {
        self.entries.write().await.remove(&id);
    }

    /// Cache a ride unless a newer version is already held; returns the
    /// ride that ends up cached
    async fn put(&self, ride: Ride) -> Ride {
        let mut entries = self.entries.write().await;
        match entries.entry(ride.id()) {
            Entry::Occupied(slot) if slot.get().ride.version() > ride.version() => {
                tracing::debug!(
                    ride_id = %ride.id(),
                    loaded = ride.version(),
                    cached = slot.get().ride.version(),
                    "Keeping newer cached ride"
                );
                slot.get().ride.clone()
            }
            Entry::Occupied(mut slot) => {
                slot.insert(CacheEntry::new(ride.clone()));
                ride
            }
            Entry::Vacant(slot) => {
                slot.insert(CacheEntry::new(ride.clone()));
                ride
            }
        }
    }
}

impl std::fmt::Debug for RideStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RideStore").field("ttl", &self.ttl).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::RideDetails;
    use crate::domain::{Cost, DriverStatus, StatusChange};
    use crate::store::InMemoryRideRepository;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use tokio::sync::Notify;

    #[derive(Default)]
    struct CountingRepository {
        inner: InMemoryRideRepository,
        finds: AtomicUsize,
    }

    #[async_trait]
    impl RideRepository for CountingRepository {
        async fn insert(&self, ride: &Ride) -> Result<(), StoreError> {
            self.inner.insert(ride).await
        }

        async fn find(&self, id: Uuid) -> Result<Option<Ride>, StoreError> {
            self.finds.fetch_add(1, Ordering::SeqCst);
            self.inner.find(id).await
        }

        async fn update(&self, ride: &Ride) -> Result<Ride, StoreError> {
            self.inner.update(ride).await
        }

        async fn list(
            &self,
            filter: RideFilter,
            page: PageRequest,
        ) -> Result<Page<Ride>, StoreError> {
            self.inner.list(filter, page).await
        }
    }

    /// Holds the first `find` after it has read storage until released
    #[derive(Default)]
    struct SlowFindRepository {
        inner: InMemoryRideRepository,
        held: AtomicBool,
        loaded: Notify,
        release: Notify,
    }

    #[async_trait]
    impl RideRepository for SlowFindRepository {
        async fn insert(&self, ride: &Ride) -> Result<(), StoreError> {
            self.inner.insert(ride).await
        }

        async fn find(&self, id: Uuid) -> Result<Option<Ride>, StoreError> {
            let ride = self.inner.find(id).await;
            if !self.held.swap(true, Ordering::SeqCst) {
                self.loaded.notify_one();
                self.release.notified().await;
            }
            ride
        }

        async fn update(&self, ride: &Ride) -> Result<Ride, StoreError> {
            self.inner.update(ride).await
        }

        async fn list(
            &self,
            filter: RideFilter,
            page: PageRequest,
        ) -> Result<Page<Ride>, StoreError> {
            self.inner.list(filter, page).await
        }
    }

    fn ride() -> Ride {
        Ride::create(
            Uuid::new_v4(),
            RideDetails {
                driver_id: 3,
                passenger_id: 4,
                address_from: "North Gate".to_string(),
                address_to: "South Gate".to_string(),
            },
            Cost::from_cents(990),
        )
    }

    #[tokio::test]
    async fn test_fresh_entry_served_from_cache() {
        let repo = Arc::new(CountingRepository::default());
        let store = RideStore::new(repo.clone(), Duration::from_secs(60));
        let ride = ride();
        repo.inner.insert(&ride).await.unwrap();

        assert_eq!(store.get(ride.id()).await.unwrap(), Some(ride.clone()));
        assert_eq!(store.get(ride.id()).await.unwrap(), Some(ride.clone()));

        assert_eq!(repo.finds.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_expired_entry_reloaded() {
        let repo = Arc::new(CountingRepository::default());
        let store = RideStore::new(repo.clone(), Duration::ZERO);
        let ride = ride();
        store.create(&ride).await.unwrap();

        store.get(ride.id()).await.unwrap();
        store.get(ride.id()).await.unwrap();

        assert_eq!(repo.finds.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_save_refreshes_entry() {
        let repo = Arc::new(CountingRepository::default());
        let store = RideStore::new(repo.clone(), Duration::from_secs(60));
        let mut ride = ride();
        store.create(&ride).await.unwrap();

        ride.change_status(StatusChange::Driver(DriverStatus::Accepted))
            .unwrap();
        let saved = store.save(&ride).await.unwrap();

        let cached = store.get(ride.id()).await.unwrap().unwrap();
        assert_eq!(cached, saved);
        assert_eq!(cached.version(), 2);
        assert_eq!(repo.finds.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_conflict_evicts_entry() {
        let repo = Arc::new(CountingRepository::default());
        let store = RideStore::new(repo.clone(), Duration::from_secs(60));
        let ride = ride();
        store.create(&ride).await.unwrap();

        // Another writer moves the stored version on
        let mut other = ride.clone();
        other
            .change_status(StatusChange::Driver(DriverStatus::Accepted))
            .unwrap();
        repo.inner.update(&other).await.unwrap();

        let mut stale = store.get(ride.id()).await.unwrap().unwrap();
        stale
            .change_status(StatusChange::Driver(DriverStatus::Canceled))
            .unwrap();
        let err = store.save(&stale).await.unwrap_err();
        assert!(err.is_version_conflict());

        let reloaded = store.get(ride.id()).await.unwrap().unwrap();
        assert_eq!(reloaded.driver_status(), DriverStatus::Accepted);
        assert_eq!(repo.finds.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_slow_read_does_not_overwrite_newer_save() {
        let repo = Arc::new(SlowFindRepository::default());
        let store = Arc::new(RideStore::new(repo.clone(), Duration::from_secs(60)));
        let mut ride = ride();
        let id = ride.id();
        repo.inner.insert(&ride).await.unwrap();

        // Reader misses the cache and loads version 1
        let reader = tokio::spawn({
            let store = store.clone();
            async move { store.get(id).await }
        });
        repo.loaded.notified().await;

        ride.change_status(StatusChange::Driver(DriverStatus::Accepted))
            .unwrap();
        let saved = store.save(&ride).await.unwrap();
        assert_eq!(saved.version(), 2);

        repo.release.notify_one();
        let read = reader.await.unwrap().unwrap().unwrap();
        assert_eq!(read.version(), 2);

        let cached = store.get(id).await.unwrap().unwrap();
        assert_eq!(cached.version(), 2);
        assert_eq!(cached.driver_status(), DriverStatus::Accepted);
    }

    #[tokio::test]
    async fn test_equal_version_refreshes_entry() {
        let repo = Arc::new(CountingRepository::default());
        let store = RideStore::new(repo.clone(), Duration::ZERO);
        let ride = ride();
        store.create(&ride).await.unwrap();

        let loaded = store.get(ride.id()).await.unwrap().unwrap();

        assert_eq!(loaded, ride);
        assert_eq!(repo.finds.load(Ordering::SeqCst), 1);
    }
}
