//! Ride Notifications
//!
//! Every status change is announced to the counterpart of the actor whose
//! axis moved: a driver-side move goes to the passenger channel, a
//! passenger-side move to the driver channel. A cascaded transition moves
//! both axes and therefore reaches both channels.
//!
//! Publication is best-effort: it happens after the ride is saved and a
//! failure to publish never undoes or fails the status change.

mod bus;

pub use bus::NotificationBus;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::aggregate::RideSnapshot;
use crate::domain::ActorRole;

/// Message placed on a role channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RideNotification {
    pub id: Uuid,
    /// Channel the message is addressed to
    pub recipient: ActorRole,
    pub ride: RideSnapshot,
    pub published_at: DateTime<Utc>,
}

impl RideNotification {
    pub fn new(recipient: ActorRole, ride: RideSnapshot) -> Self {
        Self {
            id: Uuid::new_v4(),
            recipient,
            ride,
            published_at: Utc::now(),
        }
    }

    /// Id of the actor this message is meant for
    pub fn recipient_id(&self) -> i64 {
        match self.recipient {
            ActorRole::Driver => self.ride.driver_id,
            ActorRole::Passenger => self.ride.passenger_id,
        }
    }
}

/// Fire-and-forget publisher of ride snapshots
pub trait NotificationDispatcher: Send + Sync {
    /// Enqueue a message; must not block and must not fail the caller.
    fn publish(&self, notification: RideNotification);

    fn notify_driver(&self, ride: RideSnapshot) {
        self.publish(RideNotification::new(ActorRole::Driver, ride));
    }

    fn notify_passenger(&self, ride: RideSnapshot) {
        self.publish(RideNotification::new(ActorRole::Passenger, ride));
    }
}
