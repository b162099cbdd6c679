use serde::{Deserialize, Serialize};

use crate::rule_store::{Rule, RuleOrigin};
use crate::settings::TransitSettings;
use crate::telemetry::{AppliedPolicy, FleetRange, RouteSnapshot};

/// The rule values the controller works from, with their origin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleConfig {
    pub occupancy_target_pct: i32,
    pub standard_ticket_price: i32,
    pub max_ticket_increase_pct: i32,
    pub max_ticket_discount_pct: i32,
    pub max_vehicle_adj_pct: i32,
    pub min_vehicle_adj_pct: i32,
    pub origin: RuleOrigin,
}

impl RuleConfig {
    pub fn from_rule(rule: &Rule, origin: RuleOrigin) -> Self {
        Self {
            occupancy_target_pct: rule.occupancy_target_pct,
            standard_ticket_price: rule.standard_ticket_price,
            max_ticket_increase_pct: rule.max_ticket_increase_pct,
            max_ticket_discount_pct: rule.max_ticket_discount_pct,
            max_vehicle_adj_pct: rule.max_vehicle_adj_pct,
            min_vehicle_adj_pct: rule.min_vehicle_adj_pct,
            origin,
        }
    }

    pub fn is_active(&self) -> bool {
        self.occupancy_target_pct > 0
    }
}

/// Global control parameters taken from settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlParams {
    pub threshold_pct: f64,
    pub waiting_weight: f64,
    pub rate_limit_pct: u32,
    pub idle_brake_ratio: f64,
}

impl ControlParams {
    pub fn from_settings(settings: &TransitSettings) -> Self {
        Self {
            threshold_pct: settings.threshold_pct,
            waiting_weight: settings.waiting_weight,
            rate_limit_pct: settings.rate_limit_pct,
            idle_brake_ratio: settings.idle_brake_ratio,
        }
    }
}

impl Default for ControlParams {
    fn default() -> Self {
        Self::from_settings(&TransitSettings::default())
    }
}

/// Everything `decide` needs for one route.
#[derive(Debug, Clone, Copy)]
pub struct ControlInput<'a> {
    pub snapshot: &'a RouteSnapshot,
    pub rule: &'a RuleConfig,
    pub applied: AppliedPolicy,
    pub fleet_range: FleetRange,
    pub params: ControlParams,
}

/// Load band of a route relative to its occupancy target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoadTier {
    VeryHigh,
    High,
    Normal,
    Low,
    VeryLow,
}

impl LoadTier {
    /// Price step for this tier before clamping.
    pub fn price_step(self) -> i32 {
        match self {
            LoadTier::VeryHigh => 2,
            LoadTier::High => 1,
            LoadTier::Normal => 0,
            LoadTier::Low => -1,
            LoadTier::VeryLow => -2,
        }
    }
}

/// Why a route was left alone this pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    InactiveRule,
    NoVehicles,
    NotPassengerRoute,
    NoCapacity,
}

/// New values for the dimensions that changed. `None` means keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyChange {
    pub tier: LoadTier,
    pub ticket_price: Option<i32>,
    pub vehicle_count: Option<u32>,
}

impl PolicyChange {
    pub fn is_empty(&self) -> bool {
        self.ticket_price.is_none() && self.vehicle_count.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControlDecision {
    Skip(SkipReason),
    Apply(PolicyChange),
}
