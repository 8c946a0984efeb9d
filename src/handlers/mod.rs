//! Command Handlers module
//!
//! Commands and the service that applies them to ride aggregates.

mod commands;
mod lifecycle;


pub use commands::*;
pub use lifecycle::RideLifecycleService;
