//! Ride Lifecycle Service
//!
//! Orchestrates ride creation, edits and the two status-change entry points.
//! Every operation validates before writing: a rejected transition or a
//! failed existence check leaves storage and notifications untouched.

use std::sync::Arc;

use uuid::Uuid;

use crate::aggregate::{Ride, RideSnapshot};
use crate::domain::{
    DomainError, DriverStatus, OperationContext, PassengerStatus, StatusChange,
};
use crate::error::AppResult;
use crate::gateway::ExistenceGateway;
use crate::notification::NotificationDispatcher;
use crate::pricing::PriceGenerator;
use crate::store::{Page, PageRequest, RideFilter, RideStore};

use super::{CreateRideCommand, ListRidesQuery, UpdateRideCommand};

pub struct RideLifecycleService {
    store: Arc<RideStore>,
    drivers: ExistenceGateway,
    passengers: ExistenceGateway,
    pricing: Arc<dyn PriceGenerator>,
    notifier: Arc<dyn NotificationDispatcher>,
}

impl RideLifecycleService {
    pub fn new(
        store: Arc<RideStore>,
        drivers: ExistenceGateway,
        passengers: ExistenceGateway,
        pricing: Arc<dyn PriceGenerator>,
        notifier: Arc<dyn NotificationDispatcher>,
    ) -> Self {
        Self {
            store,
            drivers,
            passengers,
            pricing,
            notifier,
        }
    }

    // =========================================================================
    // create
    // =========================================================================

    /// Create a ride after both actors are confirmed.
    ///
    /// The driver is checked before the passenger; no notification is sent.
    pub async fn create(
        &self,
        command: CreateRideCommand,
        context: &OperationContext,
    ) -> AppResult<RideSnapshot> {
        command.validate()?;

        self.drivers.check(command.driver_id).await?;
        self.passengers.check(command.passenger_id).await?;

        let cost = self.pricing.generate();
        let ride = Ride::create(Uuid::new_v4(), command.into_details(), cost);

        self.store.create(&ride).await?;

        tracing::info!(
            correlation_id = ?context.correlation_id,
            ride_id = %ride.id(),
            driver_id = ride.driver_id(),
            passenger_id = ride.passenger_id(),
            cost = %ride.cost(),
            "Ride created"
        );

        Ok(ride.snapshot())
    }

    // =========================================================================
    // update
    // =========================================================================

    /// Replace actors and addresses. Status and cost are left alone.
    pub async fn update(
        &self,
        command: UpdateRideCommand,
        context: &OperationContext,
    ) -> AppResult<RideSnapshot> {
        command.validate()?;

        let ride_id = command.ride_id;
        let mut ride = self.load(ride_id).await?;
        if ride.is_closed() {
            return Err(DomainError::RideClosed(ride_id).into());
        }

        self.drivers.check(command.driver_id).await?;
        self.passengers.check(command.passenger_id).await?;

        ride.edit(command.into_details())?;
        let saved = self.store.save(&ride).await?;

        tracing::info!(
            correlation_id = ?context.correlation_id,
            ride_id = %ride_id,
            version = saved.version(),
            "Ride updated"
        );

        Ok(saved.snapshot())
    }

    // =========================================================================
    // Status changes
    // =========================================================================

    /// Driver-initiated change. Notifies the passenger; a cascade that also
    /// moves the passenger to `IN_CAR` notifies the driver too.
    pub async fn update_driver_status(
        &self,
        ride_id: Uuid,
        proposed: DriverStatus,
        context: &OperationContext,
    ) -> AppResult<RideSnapshot> {
        self.change_status(ride_id, StatusChange::Driver(proposed), context)
            .await
    }

    /// Passenger-initiated change. Notifies the driver only.
    pub async fn update_passenger_status(
        &self,
        ride_id: Uuid,
        proposed: PassengerStatus,
        context: &OperationContext,
    ) -> AppResult<RideSnapshot> {
        self.change_status(ride_id, StatusChange::Passenger(proposed), context)
            .await
    }

    async fn change_status(
        &self,
        ride_id: Uuid,
        change: StatusChange,
        context: &OperationContext,
    ) -> AppResult<RideSnapshot> {
        let mut ride = self.load(ride_id).await?;

        let transition = ride.change_status(change).map_err(|e| {
            tracing::info!(
                correlation_id = ?context.correlation_id,
                ride_id = %ride_id,
                role = %change.role(),
                proposed = change.proposed(),
                error = %e,
                "Status change rejected"
            );
            e
        })?;

        // Both axes go out in one write; the cache is refreshed before any
        // notification leaves.
        let saved = self.store.save(&ride).await?;
        let snapshot = saved.snapshot();

        if transition.driver_moved() {
            self.notifier.notify_passenger(snapshot.clone());
        }
        if transition.passenger_moved() {
            self.notifier.notify_driver(snapshot.clone());
        }

        tracing::info!(
            correlation_id = ?context.correlation_id,
            ride_id = %ride_id,
            role = %change.role(),
            driver_from = %transition.previous_driver,
            driver_to = %transition.driver,
            passenger_from = %transition.previous_passenger,
            passenger_to = %transition.passenger,
            cascade = transition.is_cascade(),
            "Ride status changed"
        );

        Ok(snapshot)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub async fn get(&self, ride_id: Uuid) -> AppResult<RideSnapshot> {
        Ok(self.load(ride_id).await?.snapshot())
    }

    pub async fn list(&self, query: ListRidesQuery) -> AppResult<Page<RideSnapshot>> {
        let filter = RideFilter::from_params(query.driver_id, query.passenger_id)?;
        let page = PageRequest::new(query.page, query.limit)?;

        let rides = self.store.list(filter, page).await?;
        Ok(rides.map(|ride| ride.snapshot()))
    }

    async fn load(&self, ride_id: Uuid) -> AppResult<Ride> {
        self.store
            .get(ride_id)
            .await?
            .ok_or_else(|| DomainError::RideNotFound(ride_id).into())
    }
}

impl std::fmt::Debug for RideLifecycleService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RideLifecycleService")
            .field("store", &self.store)
            .field("drivers", &self.drivers)
            .field("passengers", &self.passengers)
            .finish_non_exhaustive()
    }
}
