//! rideCoordinator Library
//!
//! Re-exports modules for integration testing and the server binary.

pub mod aggregate;
pub mod api;
pub mod config;
pub mod db;
pub mod domain;
pub mod gateway;
pub mod handlers;
pub mod notification;
pub mod pricing;
pub mod store;

mod error;

pub use config::Config;
pub use domain::{Cost, CostError, DomainError, DriverStatus, OperationContext, PassengerStatus};
pub use error::{AppError, AppResult, ErrorResponse};
