//! Domain Error Types
//!
//! Pure domain errors that don't depend on infrastructure.

use thiserror::Error;
use uuid::Uuid;

use super::role::ActorRole;
use super::status::{DriverStatus, PassengerStatus};
use super::transition::StatusError;

/// Ride-level business rule violations.
///
/// Every variant carries enough context (ride id, offending statuses) to
/// reconstruct the failure from a log line.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    #[error("Ride not found: {0}")]
    RideNotFound(Uuid),

    #[error("Driver not found: {0}")]
    DriverNotFound(i64),

    #[error("Passenger not found: {0}")]
    PassengerNotFound(i64),

    /// Proposed status is not the next step (or a cancel)
    #[error("Ride {ride_id}: invalid proposed {role} status {current} -> {proposed}")]
    InvalidProposedStatus {
        ride_id: Uuid,
        role: ActorRole,
        current: &'static str,
        proposed: &'static str,
    },

    /// Mutation attempted on a canceled ride
    #[error("Ride {ride_id} is canceled: {role} status {proposed} rejected")]
    CanceledStatus {
        ride_id: Uuid,
        role: ActorRole,
        proposed: &'static str,
    },

    /// Passenger change attempted before the driver picked them up
    #[error("Ride {ride_id}: status cannot be changed now (driver {driver_status}, proposed {proposed})")]
    IrrelevantDriverStatus {
        ride_id: Uuid,
        driver_status: DriverStatus,
        proposed: PassengerStatus,
    },

    /// Ride reached a terminal status and can no longer be edited
    #[error("Ride {0} is closed")]
    RideClosed(Uuid),

    /// Both driver and passenger filters supplied to a listing
    #[error("Only one of driver_id or passenger_id may be supplied")]
    InvalidParameterCount,

    /// Optimistic locking failure
    #[error("Ride {ride_id} was modified concurrently (expected version {expected})")]
    VersionConflict { ride_id: Uuid, expected: i64 },
}

impl DomainError {
    /// Attach the ride id to a validator rejection
    pub fn from_status(ride_id: Uuid, error: StatusError) -> Self {
        match error {
            StatusError::InvalidProposedStatus {
                role,
                current,
                proposed,
            } => Self::InvalidProposedStatus {
                ride_id,
                role,
                current,
                proposed,
            },
            StatusError::CanceledStatus { role, proposed } => Self::CanceledStatus {
                ride_id,
                role,
                proposed,
            },
            StatusError::IrrelevantDriverStatus { driver, proposed } => {
                Self::IrrelevantDriverStatus {
                    ride_id,
                    driver_status: driver,
                    proposed,
                }
            }
        }
    }
}
