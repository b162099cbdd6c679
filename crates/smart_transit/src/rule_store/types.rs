use serde::{Deserialize, Serialize};

use crate::ids::{RuleId, TransportType};
use crate::settings::{clamp_to, TransportDefaults, TICKET_INCREASE_RANGE, VEHICLE_ADJ_RANGE};

/// Name of the all-zero rule offered for disabled transport types.
pub const DISABLED_RULE_NAME: &str = "Disabled";

/// Name given to rules created by `RuleStore::add_rule`.
pub const UNNAMED_RULE_NAME: &str = "Unnamed";

/// True when `name` belongs to a built-in rule (a transport type or "Disabled").
pub fn is_builtin_name(name: &str) -> bool {
    name == DISABLED_RULE_NAME || TransportType::ALL.iter().any(|t| t.name() == name)
}

/// A named, reusable policy bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub id: RuleId,
    pub name: String,
    /// Desired load ratio in percent. Zero marks the rule inactive.
    pub occupancy_target_pct: i32,
    /// Baseline fare. Zero means free transit and disables pricing.
    pub standard_ticket_price: i32,
    pub max_ticket_increase_pct: i32,
    pub max_ticket_discount_pct: i32,
    pub max_vehicle_adj_pct: i32,
    pub min_vehicle_adj_pct: i32,
}

impl Rule {
    /// The fresh record `add_rule` creates.
    pub fn unnamed(id: RuleId) -> Self {
        Self::empty(id, UNNAMED_RULE_NAME)
    }

    /// An inactive record with every numeric field zero.
    pub fn empty(id: RuleId, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            occupancy_target_pct: 0,
            standard_ticket_price: 0,
            max_ticket_increase_pct: 0,
            max_ticket_discount_pct: 0,
            max_vehicle_adj_pct: 0,
            min_vehicle_adj_pct: 0,
        }
    }

    /// The built-in rule of a transport type, built from its configured defaults.
    pub fn builtin(transport_type: TransportType, defaults: &TransportDefaults) -> Self {
        Self {
            id: transport_type.builtin_rule_id(),
            name: transport_type.name().to_string(),
            occupancy_target_pct: defaults.occupancy_pct,
            standard_ticket_price: defaults.standard_ticket,
            max_ticket_increase_pct: defaults.max_ticket_increase_pct,
            max_ticket_discount_pct: defaults.max_ticket_discount_pct,
            max_vehicle_adj_pct: defaults.max_vehicle_adj_pct,
            min_vehicle_adj_pct: defaults.min_vehicle_adj_pct,
        }
    }

    pub fn disabled() -> Self {
        Self::empty(RuleId::DISABLED, DISABLED_RULE_NAME)
    }

    pub fn is_active(&self) -> bool {
        self.occupancy_target_pct > 0
    }

    /// Copy `params` in, clamping each field to its allowed range.
    pub fn apply(&mut self, params: &RuleParams) {
        self.name = params.name.clone();
        self.occupancy_target_pct = params.occupancy_target_pct.clamp(0, 100);
        self.standard_ticket_price = params.standard_ticket_price.max(0);
        self.max_ticket_increase_pct = clamp_to(params.max_ticket_increase_pct, &TICKET_INCREASE_RANGE);
        self.max_ticket_discount_pct = params.max_ticket_discount_pct.clamp(0, 100);
        self.max_vehicle_adj_pct = clamp_to(params.max_vehicle_adj_pct, &VEHICLE_ADJ_RANGE);
        self.min_vehicle_adj_pct = clamp_to(params.min_vehicle_adj_pct, &VEHICLE_ADJ_RANGE);
    }
}

/// Editable fields of a rule, as supplied to `set_rule`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleParams {
    pub name: String,
    pub occupancy_target_pct: i32,
    pub standard_ticket_price: i32,
    pub max_ticket_increase_pct: i32,
    pub max_ticket_discount_pct: i32,
    pub max_vehicle_adj_pct: i32,
    pub min_vehicle_adj_pct: i32,
}

impl Default for RuleParams {
    fn default() -> Self {
        Self {
            name: UNNAMED_RULE_NAME.to_string(),
            occupancy_target_pct: 0,
            standard_ticket_price: 0,
            max_ticket_increase_pct: 0,
            max_ticket_discount_pct: 0,
            max_vehicle_adj_pct: 0,
            min_vehicle_adj_pct: 0,
        }
    }
}

/// Where an effective rule came from; decides how fleet bounds are scaled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RuleOrigin {
    TypeDefault,
    Custom,
}

/// An entry of `list_applicable_rules`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleChoice {
    pub id: RuleId,
    pub name: String,
}
