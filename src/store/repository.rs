//! Ride Repository
//!
//! Durable storage contract for ride aggregates.

use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

use crate::aggregate::Ride;
use crate::domain::DomainError;
use crate::error::AppError;

use super::StoreError;

/// Largest page a caller may request
pub const MAX_PAGE_LIMIT: u32 = 100;

/// Listing filter; at most one actor may be selected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RideFilter {
    All,
    Driver(i64),
    Passenger(i64),
}

impl RideFilter {
    /// Build a filter from optional query parameters.
    ///
    /// Supplying both ids is a client error.
    pub fn from_params(
        driver_id: Option<i64>,
        passenger_id: Option<i64>,
    ) -> Result<Self, DomainError> {
        match (driver_id, passenger_id) {
            (Some(_), Some(_)) => Err(DomainError::InvalidParameterCount),
            (Some(id), None) => Ok(RideFilter::Driver(id)),
            (None, Some(id)) => Ok(RideFilter::Passenger(id)),
            (None, None) => Ok(RideFilter::All),
        }
    }

    pub fn driver_id(&self) -> Option<i64> {
        match self {
            RideFilter::Driver(id) => Some(*id),
            _ => None,
        }
    }

    pub fn passenger_id(&self) -> Option<i64> {
        match self {
            RideFilter::Passenger(id) => Some(*id),
            _ => None,
        }
    }

    pub fn matches(&self, ride: &Ride) -> bool {
        match self {
            RideFilter::All => true,
            RideFilter::Driver(id) => ride.driver_id() == *id,
            RideFilter::Passenger(id) => ride.passenger_id() == *id,
        }
    }
}

/// 1-based page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    limit: u32,
}

impl PageRequest {
    pub fn new(page: u32, limit: u32) -> Result<Self, AppError> {
        if page == 0 {
            return Err(AppError::InvalidRequest("page must be at least 1".to_string()));
        }
        if limit == 0 || limit > MAX_PAGE_LIMIT {
            return Err(AppError::InvalidRequest(format!(
                "limit must be between 1 and {}",
                MAX_PAGE_LIMIT
            )));
        }
        Ok(Self { page, limit })
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }
}

/// One page of results
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub limit: u32,
    pub total: u64,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            limit: self.limit,
            total: self.total,
        }
    }
}

/// Durable ride storage.
///
/// `update` is an optimistic compare-and-swap on `Ride::version`: it succeeds
/// only if the stored version still equals the version the caller loaded, and
/// returns the ride with its new version.
#[async_trait]
pub trait RideRepository: Send + Sync {
    async fn insert(&self, ride: &Ride) -> Result<(), StoreError>;

    async fn find(&self, id: Uuid) -> Result<Option<Ride>, StoreError>;

    async fn update(&self, ride: &Ride) -> Result<Ride, StoreError>;

    /// Newest first
    async fn list(&self, filter: RideFilter, page: PageRequest) -> Result<Page<Ride>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_rejects_both_ids() {
        assert_eq!(
            RideFilter::from_params(Some(1), Some(1)),
            Err(DomainError::InvalidParameterCount)
        );
        assert_eq!(RideFilter::from_params(Some(1), None), Ok(RideFilter::Driver(1)));
        assert_eq!(RideFilter::from_params(None, Some(2)), Ok(RideFilter::Passenger(2)));
        assert_eq!(RideFilter::from_params(None, None), Ok(RideFilter::All));
    }

    #[test]
    fn test_page_request_bounds() {
        assert!(PageRequest::new(0, 10).is_err());
        assert!(PageRequest::new(1, 0).is_err());
        assert!(PageRequest::new(1, MAX_PAGE_LIMIT + 1).is_err());

        let page = PageRequest::new(3, 20).unwrap();
        assert_eq!(page.offset(), 40);
    }
}
