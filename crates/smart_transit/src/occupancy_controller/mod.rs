//! Occupancy controller.
//!
//! A stateless, tiered proportional controller. Given a route snapshot, the
//! effective rule and the values last applied through the policy sink, it
//! returns the new ticket price and fleet size. The only memory between
//! passes is what the sink reports back.
//!
//! ## Tiers (ratio vs. target `t` and margin `m`)
//! - `ratio > t + 2m`: very high, price +2, fleet rounded up
//! - `t + m < ratio <= t + 2m`: high, price +1, fleet rounded up
//! - `t - 2m <= ratio < t - m`: low, price -1, fleet rounded down
//! - `ratio < t - 2m`: very low, price -2, fleet rounded down
//!
//! Fleet changes are rate limited and held back while too many vehicles run
//! empty; every written value is clamped last.

pub mod calculations;
pub mod types;

pub use calculations::*;
pub use types::*;
