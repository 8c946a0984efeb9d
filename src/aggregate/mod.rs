//! Aggregate module
//!
//! Aggregate roots and their read views.

pub mod ride;

pub use ride::{Ride, RideDetails, RideSnapshot};
