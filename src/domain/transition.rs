//! Ride Status Transitions
//!
//! Pure decision table for the dual state machine. Given the current pair of
//! statuses and a proposed change on one axis, returns the resulting pair or
//! the reason the change is rejected. Never mutates and never performs I/O.
//!
//! Rules:
//! - each axis only moves one step forward, or to `CANCELED` from a
//!   non-terminal state
//! - a canceled driver freezes the whole ride; a canceled passenger freezes
//!   the passenger axis
//! - the passenger axis may only move once the driver has picked the
//!   passenger up (`ON_WAY_TO_DESTINATION` or later)
//! - the driver entering `ON_WAY_TO_DESTINATION` forces the passenger into
//!   `IN_CAR` in the same transition

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::role::ActorRole;
use super::status::{DriverStatus, PassengerStatus, StatusTrack};

/// A requested change on one axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "axis", content = "status", rename_all = "snake_case")]
pub enum StatusChange {
    Driver(DriverStatus),
    Passenger(PassengerStatus),
}

impl StatusChange {
    /// The actor whose axis is being changed
    pub fn role(&self) -> ActorRole {
        match self {
            StatusChange::Driver(_) => ActorRole::Driver,
            StatusChange::Passenger(_) => ActorRole::Passenger,
        }
    }

    pub fn proposed(&self) -> &'static str {
        match self {
            StatusChange::Driver(status) => status.as_str(),
            StatusChange::Passenger(status) => status.as_str(),
        }
    }
}

/// Outcome of a legal change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub previous_driver: DriverStatus,
    pub previous_passenger: PassengerStatus,
    pub driver: DriverStatus,
    pub passenger: PassengerStatus,
}

impl Transition {
    pub fn driver_moved(&self) -> bool {
        self.previous_driver != self.driver
    }

    pub fn passenger_moved(&self) -> bool {
        self.previous_passenger != self.passenger
    }

    /// Both axes moved as a result of a single driver-side request
    pub fn is_cascade(&self) -> bool {
        self.driver_moved() && self.passenger_moved()
    }
}

/// Why a proposed change was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatusError {
    /// Skipping a step, moving backwards, or leaving a terminal state
    #[error("Invalid proposed {role} status: {current} -> {proposed}")]
    InvalidProposedStatus {
        role: ActorRole,
        current: &'static str,
        proposed: &'static str,
    },

    /// The ride (or the passenger side of it) has been canceled
    #[error("Ride is canceled: {role} status {proposed} rejected")]
    CanceledStatus {
        role: ActorRole,
        proposed: &'static str,
    },

    /// Passenger change attempted before pick-up
    #[error("Status cannot be changed now: driver is {driver}, passenger proposed {proposed}")]
    IrrelevantDriverStatus {
        driver: DriverStatus,
        proposed: PassengerStatus,
    },
}

/// Validate `change` against the current statuses.
pub fn validate(
    driver: DriverStatus,
    passenger: PassengerStatus,
    change: StatusChange,
) -> Result<Transition, StatusError> {
    if driver == DriverStatus::Canceled {
        return Err(StatusError::CanceledStatus {
            role: change.role(),
            proposed: change.proposed(),
        });
    }

    let (next_driver, next_passenger) = match change {
        StatusChange::Driver(proposed) => {
            let next_driver = step(driver, proposed).ok_or(StatusError::InvalidProposedStatus {
                role: ActorRole::Driver,
                current: driver.as_str(),
                proposed: proposed.as_str(),
            })?;

            // Cascade is checked against the post-driver state
            let next_passenger = if next_driver == DriverStatus::OnWayToDestination {
                passenger_step(next_driver, passenger, PassengerStatus::InCar)?
            } else {
                passenger
            };

            (next_driver, next_passenger)
        }
        StatusChange::Passenger(proposed) => {
            (driver, passenger_step(driver, passenger, proposed)?)
        }
    };

    Ok(Transition {
        previous_driver: driver,
        previous_passenger: passenger,
        driver: next_driver,
        passenger: next_passenger,
    })
}

fn passenger_step(
    driver: DriverStatus,
    passenger: PassengerStatus,
    proposed: PassengerStatus,
) -> Result<PassengerStatus, StatusError> {
    if passenger == PassengerStatus::Canceled {
        return Err(StatusError::CanceledStatus {
            role: ActorRole::Passenger,
            proposed: proposed.as_str(),
        });
    }

    if !driver.has_picked_up_passenger() {
        return Err(StatusError::IrrelevantDriverStatus { driver, proposed });
    }

    step(passenger, proposed).ok_or(StatusError::InvalidProposedStatus {
        role: ActorRole::Passenger,
        current: passenger.as_str(),
        proposed: proposed.as_str(),
    })
}

/// Single forward step or cancel, from a non-terminal state only.
fn step<S: StatusTrack>(current: S, proposed: S) -> Option<S> {
    if current.is_terminal() {
        return None;
    }

    if proposed == S::CANCELED || current.next() == Some(proposed) {
        Some(proposed)
    } else {
        None
    }
}
