//! Command definitions
//!
//! Commands represent intentions to change the system state.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::aggregate::RideDetails;
use crate::error::AppError;

/// Longest accepted address
pub const MAX_ADDRESS_LEN: usize = 255;

// =========================================================================
// CreateRideCommand
// =========================================================================

/// Command to create a new ride
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRideCommand {
    pub driver_id: i64,
    pub passenger_id: i64,
    pub address_from: String,
    pub address_to: String,
}

impl CreateRideCommand {
    pub fn new(
        driver_id: i64,
        passenger_id: i64,
        address_from: impl Into<String>,
        address_to: impl Into<String>,
    ) -> Self {
        Self {
            driver_id,
            passenger_id,
            address_from: address_from.into(),
            address_to: address_to.into(),
        }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        validate_fields(
            self.driver_id,
            self.passenger_id,
            &self.address_from,
            &self.address_to,
        )
    }

    pub fn into_details(self) -> RideDetails {
        RideDetails {
            driver_id: self.driver_id,
            passenger_id: self.passenger_id,
            address_from: self.address_from,
            address_to: self.address_to,
        }
    }
}

// =========================================================================
// UpdateRideCommand
// =========================================================================

/// Command to replace the editable fields of a ride
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateRideCommand {
    pub ride_id: Uuid,
    pub driver_id: i64,
    pub passenger_id: i64,
    pub address_from: String,
    pub address_to: String,
}

impl UpdateRideCommand {
    pub fn new(ride_id: Uuid, fields: CreateRideCommand) -> Self {
        Self {
            ride_id,
            driver_id: fields.driver_id,
            passenger_id: fields.passenger_id,
            address_from: fields.address_from,
            address_to: fields.address_to,
        }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        validate_fields(
            self.driver_id,
            self.passenger_id,
            &self.address_from,
            &self.address_to,
        )
    }

    pub fn into_details(self) -> RideDetails {
        RideDetails {
            driver_id: self.driver_id,
            passenger_id: self.passenger_id,
            address_from: self.address_from,
            address_to: self.address_to,
        }
    }
}

// =========================================================================
// ListRidesQuery
// =========================================================================

/// Paged listing, optionally narrowed to one actor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListRidesQuery {
    pub driver_id: Option<i64>,
    pub passenger_id: Option<i64>,
    pub page: u32,
    pub limit: u32,
}

impl ListRidesQuery {
    pub const DEFAULT_PAGE: u32 = 1;
    pub const DEFAULT_LIMIT: u32 = 10;

    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            driver_id: None,
            passenger_id: None,
            page,
            limit,
        }
    }

    pub fn for_driver(mut self, driver_id: i64) -> Self {
        self.driver_id = Some(driver_id);
        self
    }

    pub fn for_passenger(mut self, passenger_id: i64) -> Self {
        self.passenger_id = Some(passenger_id);
        self
    }
}

impl Default for ListRidesQuery {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PAGE, Self::DEFAULT_LIMIT)
    }
}

fn validate_fields(
    driver_id: i64,
    passenger_id: i64,
    address_from: &str,
    address_to: &str,
) -> Result<(), AppError> {
    if driver_id <= 0 {
        return Err(AppError::InvalidRequest(
            "driver_id must be positive".to_string(),
        ));
    }
    if passenger_id <= 0 {
        return Err(AppError::InvalidRequest(
            "passenger_id must be positive".to_string(),
        ));
    }

    for (name, value) in [("address_from", address_from), ("address_to", address_to)] {
        if value.trim().is_empty() {
            return Err(AppError::InvalidRequest(format!("{} must not be blank", name)));
        }
        if value.chars().count() > MAX_ADDRESS_LEN {
            return Err(AppError::InvalidRequest(format!(
                "{} must be at most {} characters",
                name, MAX_ADDRESS_LEN
            )));
        }
    }

    Ok(())
}
