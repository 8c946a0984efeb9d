//! In-process notification bus.
//!
//! `publish` only enqueues onto a bounded queue; a background delivery task
//! fans messages out to the broadcast channel of the addressed role, where
//! any number of subscribers (SSE clients) can listen.

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use crate::domain::ActorRole;

use super::{NotificationDispatcher, RideNotification};

#[derive(Debug, Clone)]
pub struct NotificationBus {
    queue: mpsc::Sender<RideNotification>,
    driver: broadcast::Sender<RideNotification>,
    passenger: broadcast::Sender<RideNotification>,
}

impl NotificationBus {
    /// Create the bus and spawn its delivery task.
    ///
    /// The task stops once every clone of the bus has been dropped. Must be
    /// called inside a Tokio runtime.
    pub fn start(capacity: usize) -> (Self, JoinHandle<()>) {
        let capacity = capacity.max(1);
        let (queue, mut inbox) = mpsc::channel::<RideNotification>(capacity);
        let (driver, _) = broadcast::channel(capacity);
        let (passenger, _) = broadcast::channel(capacity);

        let driver_out = driver.clone();
        let passenger_out = passenger.clone();

        let delivery = tokio::spawn(async move {
            while let Some(notification) = inbox.recv().await {
                let channel = match notification.recipient {
                    ActorRole::Driver => &driver_out,
                    ActorRole::Passenger => &passenger_out,
                };

                let ride_id = notification.ride.id;
                let recipient = notification.recipient;
                match channel.send(notification) {
                    Ok(receivers) => {
                        tracing::debug!(%ride_id, %recipient, receivers, "Ride notification delivered");
                    }
                    Err(_) => {
                        tracing::debug!(%ride_id, %recipient, "No subscribers for ride notification");
                    }
                }
            }
            tracing::info!("Notification delivery stopped");
        });

        (
            Self {
                queue,
                driver,
                passenger,
            },
            delivery,
        )
    }

    /// Listen to one role channel
    pub fn subscribe(&self, role: ActorRole) -> broadcast::Receiver<RideNotification> {
        match role {
            ActorRole::Driver => self.driver.subscribe(),
            ActorRole::Passenger => self.passenger.subscribe(),
        }
    }
}

impl NotificationDispatcher for NotificationBus {
    fn publish(&self, notification: RideNotification) {
        let ride_id = notification.ride.id;
        let recipient = notification.recipient;

        if let Err(e) = self.queue.try_send(notification) {
            tracing::warn!(%ride_id, %recipient, error = %e, "Dropped ride notification");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{Ride, RideDetails};
    use crate::domain::Cost;
    use std::time::Duration;
    use uuid::Uuid;

    fn snapshot() -> crate::aggregate::RideSnapshot {
        Ride::create(
            Uuid::new_v4(),
            RideDetails {
                driver_id: 10,
                passenger_id: 20,
                address_from: "A".to_string(),
                address_to: "B".to_string(),
            },
            Cost::from_cents(100),
        )
        .snapshot()
    }

    #[tokio::test]
    async fn test_messages_reach_only_addressed_channel() {
        let (bus, _delivery) = NotificationBus::start(8);
        let mut drivers = bus.subscribe(ActorRole::Driver);
        let mut passengers = bus.subscribe(ActorRole::Passenger);

        let ride = snapshot();
        bus.notify_passenger(ride.clone());

        let received = tokio::time::timeout(Duration::from_secs(1), passengers.recv())
            .await
            .expect("delivery timed out")
            .unwrap();
        assert_eq!(received.recipient, ActorRole::Passenger);
        assert_eq!(received.recipient_id(), 20);
        assert_eq!(received.ride, ride);

        assert!(matches!(
            drivers.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_harmless() {
        let (bus, _delivery) = NotificationBus::start(1);
        for _ in 0..10 {
            bus.notify_driver(snapshot());
        }
    }

    #[tokio::test]
    async fn test_delivery_stops_when_bus_dropped() {
        let (bus, delivery) = NotificationBus::start(4);
        drop(bus);

        tokio::time::timeout(Duration::from_secs(1), delivery)
            .await
            .expect("delivery task did not stop")
            .unwrap();
    }
}
