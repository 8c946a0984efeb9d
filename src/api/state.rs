//! Shared router state.

use std::sync::Arc;

use crate::handlers::RideLifecycleService;
use crate::notification::NotificationBus;

#[derive(Debug, Clone)]
pub struct AppState {
    pub rides: Arc<RideLifecycleService>,
    /// Source of the SSE notification streams
    pub notifications: NotificationBus,
}

impl AppState {
    pub fn new(rides: Arc<RideLifecycleService>, notifications: NotificationBus) -> Self {
        Self {
            rides,
            notifications,
        }
    }
}
