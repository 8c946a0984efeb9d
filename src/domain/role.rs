//! Actor Role
//!
//! The two parties sharing a ride. Each role owns one status axis and one
//! notification channel.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Ride participant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    Driver,
    Passenger,
}

impl ActorRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActorRole::Driver => "driver",
            ActorRole::Passenger => "passenger",
        }
    }

    /// Path segment of the remote directory serving this role
    pub fn collection(&self) -> &'static str {
        match self {
            ActorRole::Driver => "drivers",
            ActorRole::Passenger => "passengers",
        }
    }
}

impl fmt::Display for ActorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActorRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "driver" => Ok(ActorRole::Driver),
            "passenger" => Ok(ActorRole::Passenger),
            other => Err(format!("unknown actor role: {}", other)),
        }
    }
}
