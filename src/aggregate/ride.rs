//! Ride Aggregate
//!
//! The ride is the unit of consistency: both status axes, the actor references
//! and the fare are loaded, validated and saved together.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::transition::{self, StatusChange, Transition};
use crate::domain::{Cost, DomainError, DriverStatus, PassengerStatus, StatusTrack};

/// Editable fields of a ride
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RideDetails {
    pub driver_id: i64,
    pub passenger_id: i64,
    pub address_from: String,
    pub address_to: String,
}

/// Ride Aggregate
#[derive(Debug, Clone, PartialEq)]
pub struct Ride {
    pub(crate) id: Uuid,
    pub(crate) details: RideDetails,
    pub(crate) driver_status: DriverStatus,
    pub(crate) passenger_status: PassengerStatus,
    pub(crate) cost: Cost,
    /// Persisted version, used for optimistic locking
    pub(crate) version: i64,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
}

impl Ride {
    // =========================================================================
    // Ride::create()
    // =========================================================================

    /// Create a new ride in its initial state (`CREATED` / `WAITING`)
    pub fn create(id: Uuid, details: RideDetails, cost: Cost) -> Self {
        let now = Utc::now();

        Self {
            id,
            details,
            driver_status: DriverStatus::Created,
            passenger_status: PassengerStatus::Waiting,
            cost,
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }

    // =========================================================================
    // Ride::edit()
    // =========================================================================

    /// Replace the editable fields. Status and cost are untouched.
    pub fn edit(&mut self, details: RideDetails) -> Result<(), DomainError> {
        if self.is_closed() {
            return Err(DomainError::RideClosed(self.id));
        }

        self.details = details;
        self.updated_at = Utc::now();
        Ok(())
    }

    // =========================================================================
    // Ride::change_status()
    // =========================================================================

    /// Validate and apply a status change, including any cascade.
    ///
    /// On error the aggregate is left exactly as it was.
    pub fn change_status(&mut self, change: StatusChange) -> Result<Transition, DomainError> {
        let transition = transition::validate(self.driver_status, self.passenger_status, change)
            .map_err(|e| DomainError::from_status(self.id, e))?;

        self.driver_status = transition.driver;
        self.passenger_status = transition.passenger;
        self.updated_at = Utc::now();

        Ok(transition)
    }

    /// Neither side can make further progress
    pub fn is_closed(&self) -> bool {
        self.driver_status.is_terminal() || self.passenger_status.is_terminal()
    }

    pub fn snapshot(&self) -> RideSnapshot {
        RideSnapshot::from(self)
    }

    // =========================================================================
    // Getters
    // =========================================================================

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn details(&self) -> &RideDetails {
        &self.details
    }

    pub fn driver_id(&self) -> i64 {
        self.details.driver_id
    }

    pub fn passenger_id(&self) -> i64 {
        self.details.passenger_id
    }

    pub fn driver_status(&self) -> DriverStatus {
        self.driver_status
    }

    pub fn passenger_status(&self) -> PassengerStatus {
        self.passenger_status
    }

    pub fn cost(&self) -> Cost {
        self.cost
    }

    pub fn version(&self) -> i64 {
        self.version
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

/// Full read view of a ride.
///
/// Returned by the API and published to the notification channels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RideSnapshot {
    pub id: Uuid,
    pub driver_id: i64,
    pub passenger_id: i64,
    pub address_from: String,
    pub address_to: String,
    pub driver_status: DriverStatus,
    pub passenger_status: PassengerStatus,
    pub cost: Cost,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Ride> for RideSnapshot {
    fn from(ride: &Ride) -> Self {
        Self {
            id: ride.id,
            driver_id: ride.details.driver_id,
            passenger_id: ride.details.passenger_id,
            address_from: ride.details.address_from.clone(),
            address_to: ride.details.address_to.clone(),
            driver_status: ride.driver_status,
            passenger_status: ride.passenger_status,
            cost: ride.cost,
            created_at: ride.created_at,
            updated_at: ride.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn details() -> RideDetails {
        RideDetails {
            driver_id: 1,
            passenger_id: 2,
            address_from: "Main St 1".to_string(),
            address_to: "Harbour Rd 9".to_string(),
        }
    }

    #[test]
    fn test_ride_create() {
        let id = Uuid::new_v4();
        let ride = Ride::create(id, details(), Cost::from_cents(1999));

        assert_eq!(ride.id(), id);
        assert_eq!(ride.driver_status(), DriverStatus::Created);
        assert_eq!(ride.passenger_status(), PassengerStatus::Waiting);
        assert_eq!(ride.cost().to_string(), "19.99");
        assert_eq!(ride.version(), 1);
        assert!(!ride.is_closed());
    }

    #[test]
    fn test_edit_keeps_status_and_cost() {
        let mut ride = Ride::create(Uuid::new_v4(), details(), Cost::from_cents(700));
        ride.change_status(StatusChange::Driver(DriverStatus::Accepted))
            .unwrap();

        let mut changed = details();
        changed.address_to = "Airport".to_string();
        ride.edit(changed.clone()).unwrap();

        assert_eq!(ride.details(), &changed);
        assert_eq!(ride.driver_status(), DriverStatus::Accepted);
        assert_eq!(ride.cost(), Cost::from_cents(700));
    }

    #[test]
    fn test_closed_ride_cannot_be_edited() {
        let mut ride = Ride::create(Uuid::new_v4(), details(), Cost::from_cents(700));
        ride.change_status(StatusChange::Driver(DriverStatus::Canceled))
            .unwrap();

        assert!(ride.is_closed());
        assert_eq!(ride.edit(details()), Err(DomainError::RideClosed(ride.id())));
    }

    #[test]
    fn test_rejected_change_leaves_ride_untouched() {
        let mut ride = Ride::create(Uuid::new_v4(), details(), Cost::from_cents(700));
        let before = ride.clone();

        let err = ride
            .change_status(StatusChange::Driver(DriverStatus::Completed))
            .unwrap_err();

        assert!(matches!(err, DomainError::InvalidProposedStatus { .. }));
        assert_eq!(ride, before);
    }

    #[test]
    fn test_snapshot_carries_all_fields() {
        let ride = Ride::create(Uuid::new_v4(), details(), Cost::from_cents(42));
        let snapshot = ride.snapshot();

        assert_eq!(snapshot.id, ride.id());
        assert_eq!(snapshot.driver_id, 1);
        assert_eq!(snapshot.passenger_id, 2);
        assert_eq!(snapshot.address_from, "Main St 1");
        assert_eq!(snapshot.driver_status, DriverStatus::Created);
        assert_eq!(snapshot.cost, Cost::from_cents(42));
    }
}
