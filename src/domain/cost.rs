//! Cost type
//!
//! Domain primitive for the fare of a ride. Validated at construction time so
//! an out-of-range fare cannot exist in the system.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Largest fare, in cents (9999.99)
pub const MAX_COST_CENTS: u32 = 999_999;

/// Fixed scale of every fare
pub const COST_SCALE: u32 = 2;

/// Cost represents a validated ride fare.
///
/// # Invariants
/// - Value is within `[0, 9999.99]`
/// - At most 2 decimal places; always rendered with exactly 2
///
/// # Example
/// ```
/// use rust_decimal::Decimal;
/// use ride_coordinator::domain::Cost;
///
/// let cost = Cost::new(Decimal::new(1250, 2)).unwrap();
/// assert_eq!(cost.to_string(), "12.50");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Cost(Decimal);

/// Errors that can occur when creating a Cost
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CostError {
    #[error("Cost must not be negative (got {0})")]
    Negative(Decimal),

    #[error("Cost has too many decimal places (max {COST_SCALE}, got {0})")]
    TooManyDecimals(u32),

    #[error("Cost exceeds maximum allowed value (9999.99)")]
    Overflow,

    #[error("Invalid cost format: {0}")]
    ParseError(String),
}

impl Cost {
    /// Create a new Cost with validation.
    ///
    /// # Errors
    /// - `CostError::Negative` if value < 0
    /// - `CostError::TooManyDecimals` if more than 2 decimal places
    /// - `CostError::Overflow` if value > 9999.99
    pub fn new(value: Decimal) -> Result<Self, CostError> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(CostError::Negative(value));
        }

        // Trailing zeros beyond the scale are harmless (e.g. 1.500)
        let normalized = value.normalize();
        if normalized.scale() > COST_SCALE {
            return Err(CostError::TooManyDecimals(normalized.scale()));
        }

        if normalized > Self::max().0 {
            return Err(CostError::Overflow);
        }

        let mut fixed = normalized;
        fixed.rescale(COST_SCALE);
        Ok(Self(fixed))
    }

    /// Build a cost from whole cents, clamped to the allowed range.
    pub fn from_cents(cents: u32) -> Self {
        Self(Decimal::new(i64::from(cents.min(MAX_COST_CENTS)), COST_SCALE))
    }

    /// Largest representable fare
    pub fn max() -> Self {
        Self(Decimal::new(i64::from(MAX_COST_CENTS), COST_SCALE))
    }

    /// Get the underlying Decimal value.
    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Cost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl FromStr for Cost {
    type Err = CostError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let decimal = Decimal::from_str(s).map_err(|e| CostError::ParseError(e.to_string()))?;
        Cost::new(decimal)
    }
}

impl TryFrom<String> for Cost {
    type Error = CostError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Cost::from_str(&value)
    }
}

impl TryFrom<Decimal> for Cost {
    type Error = CostError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Cost::new(value)
    }
}

impl From<Cost> for String {
    fn from(cost: Cost) -> Self {
        cost.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_cost_zero_allowed() {
        let cost = Cost::new(Decimal::ZERO).unwrap();
        assert_eq!(cost.to_string(), "0.00");
    }

    #[test]
    fn test_cost_negative_rejected() {
        assert!(matches!(Cost::new(dec!(-0.01)), Err(CostError::Negative(_))));
    }

    #[test]
    fn test_cost_too_many_decimals() {
        assert!(matches!(
            Cost::new(dec!(1.001)),
            Err(CostError::TooManyDecimals(3))
        ));
    }

    #[test]
    fn test_cost_trailing_zeros_accepted() {
        let cost = Cost::new(dec!(1.500)).unwrap();
        assert_eq!(cost.value(), dec!(1.50));
        assert_eq!(cost.value().scale(), 2);
    }

    #[test]
    fn test_cost_bounds() {
        assert!(Cost::new(dec!(9999.99)).is_ok());
        assert!(matches!(Cost::new(dec!(10000.00)), Err(CostError::Overflow)));
    }

    #[test]
    fn test_from_cents_clamps() {
        assert_eq!(Cost::from_cents(1234).value(), dec!(12.34));
        assert_eq!(Cost::from_cents(u32::MAX), Cost::max());
    }

    #[test]
    fn test_cost_serializes_as_string() {
        let cost = Cost::from_cents(500);
        assert_eq!(serde_json::to_string(&cost).unwrap(), "\"5.00\"");

        let parsed: Cost = serde_json::from_str("\"5.00\"").unwrap();
        assert_eq!(parsed, cost);
    }
}
