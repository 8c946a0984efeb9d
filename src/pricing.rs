//! Pricing
//!
//! Fare generation at ride creation time.

use rand::Rng;

use crate::domain::cost::{Cost, MAX_COST_CENTS};

/// Produces the fare for a new ride
pub trait PriceGenerator: Send + Sync {
    fn generate(&self) -> Cost;
}

/// Uniformly random fare in `[0, 9999.99]`.
///
/// Stateless; does not look at the ride.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomPriceGenerator;

impl PriceGenerator for RandomPriceGenerator {
    fn generate(&self) -> Cost {
        let cents = rand::thread_rng().gen_range(0..=MAX_COST_CENTS);
        Cost::from_cents(cents)
    }
}
