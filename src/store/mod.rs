//! Ride Persistence
//!
//! Repository implementations and the cached store in front of them.

mod cache;
mod error;
mod memory;
mod postgres;
mod repository;

pub use cache::RideStore;
pub use error::StoreError;
pub use memory::InMemoryRideRepository;
pub use postgres::PgRideRepository;
pub use repository::{Page, PageRequest, RideFilter, RideRepository, MAX_PAGE_LIMIT};
