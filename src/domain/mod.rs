//! Domain module
//!
//! Core domain types and the ride status rules.

pub mod context;
pub mod cost;
pub mod error;
pub mod role;
pub mod status;
pub mod transition;

pub use context::OperationContext;
pub use cost::{Cost, CostError};
pub use error::DomainError;
pub use role::ActorRole;
pub use status::{DriverStatus, PassengerStatus, StatusTrack, UnknownStatus};
pub use transition::{StatusChange, StatusError, Transition};
