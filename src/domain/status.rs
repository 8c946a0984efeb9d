//! Ride Status Axes
//!
//! Each participant advances its own half of the ride through a fixed,
//! forward-only sequence. `CANCELED` sits outside the sequence and can be
//! reached from any non-terminal state.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Behaviour shared by both status axes
pub trait StatusTrack: Copy + Eq + fmt::Debug {
    /// The cancel state of this axis
    const CANCELED: Self;

    /// The single legal forward step, if any
    fn next(self) -> Option<Self>;

    /// Whether no further transition is possible
    fn is_terminal(self) -> bool;

    /// Stored tag
    fn as_str(&self) -> &'static str;
}

/// Unknown status tag (storage or request)
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown status: {0}")]
pub struct UnknownStatus(pub String);

// =========================================================================
// Driver axis
// =========================================================================

/// Driver-side status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DriverStatus {
    Created,
    Accepted,
    OnWayForPassenger,
    Waiting,
    OnWayToDestination,
    Completed,
    Canceled,
}

impl DriverStatus {
    pub const ALL: [DriverStatus; 7] = [
        DriverStatus::Created,
        DriverStatus::Accepted,
        DriverStatus::OnWayForPassenger,
        DriverStatus::Waiting,
        DriverStatus::OnWayToDestination,
        DriverStatus::Completed,
        DriverStatus::Canceled,
    ];

    /// The passenger is in the car (or has already been dropped off).
    /// Passenger-side transitions are gated on this.
    pub fn has_picked_up_passenger(self) -> bool {
        matches!(
            self,
            DriverStatus::OnWayToDestination | DriverStatus::Completed
        )
    }
}

impl StatusTrack for DriverStatus {
    const CANCELED: Self = DriverStatus::Canceled;

    fn next(self) -> Option<Self> {
        match self {
            DriverStatus::Created => Some(DriverStatus::Accepted),
            DriverStatus::Accepted => Some(DriverStatus::OnWayForPassenger),
            DriverStatus::OnWayForPassenger => Some(DriverStatus::Waiting),
            DriverStatus::Waiting => Some(DriverStatus::OnWayToDestination),
            DriverStatus::OnWayToDestination => Some(DriverStatus::Completed),
            DriverStatus::Completed | DriverStatus::Canceled => None,
        }
    }

    fn is_terminal(self) -> bool {
        matches!(self, DriverStatus::Completed | DriverStatus::Canceled)
    }

    fn as_str(&self) -> &'static str {
        match self {
            DriverStatus::Created => "CREATED",
            DriverStatus::Accepted => "ACCEPTED",
            DriverStatus::OnWayForPassenger => "ON_WAY_FOR_PASSENGER",
            DriverStatus::Waiting => "WAITING",
            DriverStatus::OnWayToDestination => "ON_WAY_TO_DESTINATION",
            DriverStatus::Completed => "COMPLETED",
            DriverStatus::Canceled => "CANCELED",
        }
    }
}

impl fmt::Display for DriverStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DriverStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DriverStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

// =========================================================================
// Passenger axis
// =========================================================================

/// Passenger-side status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PassengerStatus {
    Waiting,
    InCar,
    GettingOut,
    Canceled,
}

impl PassengerStatus {
    pub const ALL: [PassengerStatus; 4] = [
        PassengerStatus::Waiting,
        PassengerStatus::InCar,
        PassengerStatus::GettingOut,
        PassengerStatus::Canceled,
    ];
}

impl StatusTrack for PassengerStatus {
    const CANCELED: Self = PassengerStatus::Canceled;

    fn next(self) -> Option<Self> {
        match self {
            PassengerStatus::Waiting => Some(PassengerStatus::InCar),
            PassengerStatus::InCar => Some(PassengerStatus::GettingOut),
            PassengerStatus::GettingOut | PassengerStatus::Canceled => None,
        }
    }

    fn is_terminal(self) -> bool {
        matches!(self, PassengerStatus::GettingOut | PassengerStatus::Canceled)
    }

    fn as_str(&self) -> &'static str {
        match self {
            PassengerStatus::Waiting => "WAITING",
            PassengerStatus::InCar => "IN_CAR",
            PassengerStatus::GettingOut => "GETTING_OUT",
            PassengerStatus::Canceled => "CANCELED",
        }
    }
}

impl fmt::Display for PassengerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PassengerStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PassengerStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_driver_sequence_ends_at_completed() {
        let mut status = DriverStatus::Created;
        let mut walked = vec![status];
        while let Some(next) = status.next() {
            status = next;
            walked.push(status);
        }

        assert_eq!(walked.len(), 6);
        assert_eq!(status, DriverStatus::Completed);
        assert!(!walked.contains(&DriverStatus::Canceled));
    }

    #[test]
    fn test_passenger_sequence_ends_at_getting_out() {
        assert_eq!(PassengerStatus::Waiting.next(), Some(PassengerStatus::InCar));
        assert_eq!(PassengerStatus::InCar.next(), Some(PassengerStatus::GettingOut));
        assert_eq!(PassengerStatus::GettingOut.next(), None);
        assert_eq!(PassengerStatus::Canceled.next(), None);
    }

    #[test]
    fn test_tags_round_trip_through_from_str() {
        for status in DriverStatus::ALL {
            assert_eq!(status.as_str().parse::<DriverStatus>(), Ok(status));
        }
        for status in PassengerStatus::ALL {
            assert_eq!(status.as_str().parse::<PassengerStatus>(), Ok(status));
        }
        assert!("IN_CAR".parse::<DriverStatus>().is_err());
    }

    #[test]
    fn test_serde_uses_screaming_snake_case() {
        let json = serde_json::to_string(&DriverStatus::OnWayToDestination).unwrap();
        assert_eq!(json, "\"ON_WAY_TO_DESTINATION\"");

        let parsed: PassengerStatus = serde_json::from_str("\"GETTING_OUT\"").unwrap();
        assert_eq!(parsed, PassengerStatus::GettingOut);
    }

    #[test]
    fn test_pickup_gate() {
        let picked_up: Vec<_> = DriverStatus::ALL
            .into_iter()
            .filter(|s| s.has_picked_up_passenger())
            .collect();
        assert_eq!(
            picked_up,
            vec![DriverStatus::OnWayToDestination, DriverStatus::Completed]
        );
    }
}
