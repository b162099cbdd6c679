use super::types::{
    ControlDecision, ControlInput, ControlParams, LoadTier, PolicyChange, RuleConfig, SkipReason,
};
use crate::rule_store::RuleOrigin;
use crate::telemetry::{FleetRange, RouteSnapshot};

/// Lower bound on the effective target ratio used for fleet sizing.
pub const MIN_EFFECTIVE_TARGET: f64 = 0.01;

// =============================================================================
// Load tiers
// =============================================================================

/// Place `ratio` into a load band around `occupancy_pct`.
///
/// Bands are computed as `(occupancy ± k * threshold) / 100`. The upper
/// inner band is inclusive at its top (`ratio == occ + 2m` is `High`) and the
/// lower inner band is inclusive at its bottom (`ratio == occ - 2m` is `Low`).
pub fn classify_load(ratio: f64, occupancy_pct: i32, threshold_pct: f64) -> LoadTier {
    let occ = f64::from(occupancy_pct);
    let very_high = (occ + 2.0 * threshold_pct) / 100.0;
    let high = (occ + threshold_pct) / 100.0;
    let low = (occ - threshold_pct) / 100.0;
    let very_low = (occ - 2.0 * threshold_pct) / 100.0;

    if ratio > very_high {
        LoadTier::VeryHigh
    } else if ratio > high {
        LoadTier::High
    } else if ratio < very_low {
        LoadTier::VeryLow
    } else if ratio < low {
        LoadTier::Low
    } else {
        LoadTier::Normal
    }
}

/// True when the route sits above the "very high" band.
pub fn is_route_overloaded(ratio: f64, occupancy_pct: i32, threshold_pct: f64) -> bool {
    ratio > (f64::from(occupancy_pct) + 2.0 * threshold_pct) / 100.0
}

// =============================================================================
// Price
// =============================================================================

/// `(floor, cap)` of the ticket price for a rule.
///
/// The exact limits are `std * (100 - dec) / 100` and `std * (100 + inc) / 100`.
/// The floor rounds up and the cap rounds down, so both stay inside them.
/// Computed in i64 so no percentage can overflow.
pub fn price_bounds(rule: &RuleConfig) -> (i32, i32) {
    let std = i64::from(rule.standard_ticket_price.max(0));
    let inc = i64::from(rule.max_ticket_increase_pct.max(0));
    let dec = i64::from(rule.max_ticket_discount_pct.clamp(0, 100));

    let cap = std * (100 + inc) / 100;
    let floor = (std * (100 - dec) + 99) / 100;
    let narrow = |v: i64| i32::try_from(v).unwrap_or(i32::MAX);
    (narrow(floor), narrow(cap))
}

/// Step the previously applied price by the tier's delta, then clamp.
/// Free transit (`standard == 0`) always yields 0.
pub fn next_ticket_price(tier: LoadTier, previous: i32, rule: &RuleConfig) -> i32 {
    if rule.standard_ticket_price <= 0 {
        return 0;
    }
    let (floor, cap) = price_bounds(rule);
    previous
        .saturating_add(tier.price_step())
        .clamp(floor, cap)
}

// =============================================================================
// Fleet size
// =============================================================================

/// Vehicles needed to carry the current load at the target ratio. Rounds up
/// when the route runs hot and down when it runs cold; inside the band the
/// previous count stands.
pub fn proposed_vehicle_count(
    tier: LoadTier,
    snapshot: &RouteSnapshot,
    rule: &RuleConfig,
    params: &ControlParams,
    previous: u32,
) -> u32 {
    let target = (f64::from(rule.occupancy_target_pct) / 100.0).max(MIN_EFFECTIVE_TARGET);
    let per_vehicle = f64::from(snapshot.capacity_per_vehicle) * target;
    if per_vehicle <= 0.0 {
        return previous;
    }
    let needed = snapshot.weighted_load(params.waiting_weight) / per_vehicle;
    let rounded = match tier {
        LoadTier::VeryHigh | LoadTier::High => needed.ceil(),
        LoadTier::Low | LoadTier::VeryLow => needed.floor(),
        LoadTier::Normal => return previous,
    };
    rounded.clamp(0.0, f64::from(u32::MAX)) as u32
}

/// Largest change allowed in one pass: `max(1, round(previous * pct / 100))`.
pub fn rate_limit_step(previous: u32, rate_limit_pct: u32) -> u32 {
    let step = (f64::from(previous) * f64::from(rate_limit_pct) / 100.0).round() as u32;
    step.max(1)
}

pub fn apply_rate_limit(proposed: u32, previous: u32, rate_limit_pct: u32) -> u32 {
    let step = rate_limit_step(previous, rate_limit_pct);
    proposed.clamp(previous.saturating_sub(step), previous.saturating_add(step))
}

/// `(min, max)` fleet size for a route after rule adjustment.
///
/// Type-default rules scale both ends; custom rules only scale the minimum.
/// The minimum is at least 1 and the maximum never falls below it.
pub fn vehicle_bounds(range: FleetRange, rule: &RuleConfig) -> (u32, u32) {
    let base_min = f64::from(range.min);
    let base_max = f64::from(range.max.max(range.min));

    let min = (base_min * (1.0 - f64::from(rule.min_vehicle_adj_pct) / 100.0)).round();
    let max = match rule.origin {
        RuleOrigin::TypeDefault => {
            (base_max * (1.0 + f64::from(rule.max_vehicle_adj_pct) / 100.0)).round()
        }
        RuleOrigin::Custom => base_max,
    };

    let min = (min.max(1.0).min(f64::from(u32::MAX))) as u32;
    let max = (max.max(0.0).min(f64::from(u32::MAX))) as u32;
    (min, max.max(min))
}

/// True when too many vehicles run empty for a reduction to be trusted.
pub fn idle_brake_engaged(snapshot: &RouteSnapshot, idle_brake_ratio: f64) -> bool {
    snapshot.empty_share() > idle_brake_ratio
}

// =============================================================================
// Decision
// =============================================================================

/// Decide new ticket price and fleet size for one route.
///
/// Steps, in order: skip checks, load tier, price step, fleet proposal, rate
/// limit, idle-fleet brake, then the bounds clamp. Only dimensions that
/// differ from the applied values are returned.
pub fn decide(input: &ControlInput<'_>) -> ControlDecision {
    let snapshot = input.snapshot;
    let rule = input.rule;

    if !rule.is_active() {
        return ControlDecision::Skip(SkipReason::InactiveRule);
    }
    if snapshot.vehicle_count == 0 {
        return ControlDecision::Skip(SkipReason::NoVehicles);
    }
    if !snapshot.carries_passengers {
        return ControlDecision::Skip(SkipReason::NotPassengerRoute);
    }
    if snapshot.capacity_per_vehicle == 0 {
        return ControlDecision::Skip(SkipReason::NoCapacity);
    }

    let tier = classify_load(
        snapshot.weighted_ratio,
        rule.occupancy_target_pct,
        input.params.threshold_pct,
    );

    let price = next_ticket_price(tier, input.applied.ticket_price, rule);

    let previous = input.applied.vehicle_count;
    let proposed = proposed_vehicle_count(tier, snapshot, rule, &input.params, previous);
    let mut vehicles = apply_rate_limit(proposed, previous, input.params.rate_limit_pct);
    if vehicles < previous && idle_brake_engaged(snapshot, input.params.idle_brake_ratio) {
        vehicles = previous;
    }
    let (min, max) = vehicle_bounds(input.fleet_range, rule);
    let vehicles = vehicles.clamp(min, max);

    ControlDecision::Apply(PolicyChange {
        tier,
        ticket_price: (price != input.applied.ticket_price).then_some(price),
        vehicle_count: (vehicles != previous).then_some(vehicles),
    })
}
