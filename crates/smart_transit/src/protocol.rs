//! Newline-delimited JSON protocol of the headless `transit_manager` binary.
//!
//! Each stdin line is one `TransitCommand` with a `"cmd"` discriminator.
//! Each stdout line is a `TransitResponse` carrying `"protocol_version"` and
//! a `"type"` tag. The I/O loop itself lives in the app crate.

use serde::{Deserialize, Serialize};

use crate::commands::RouteOverview;
use crate::driver::PassReport;
use crate::error::TransitError;
use crate::ids::{RouteKey, RuleId, TransportType};
use crate::notifications::NotificationEvent;
use crate::route_bindings::EffectiveRule;
use crate::rule_store::{Rule, RuleChoice, RuleParams};
use crate::settings::TransitSettings;
use crate::telemetry::{RouteSnapshot, TransitRoute, VehicleModel, VehicleModelId};

// ---------------------------------------------------------------------------
// Commands (stdin → controller)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum TransitCommand {
    AddRule,
    SetRule {
        rule_id: RuleId,
        #[serde(default)]
        params: RuleParams,
    },
    GetRule {
        rule_id: RuleId,
    },
    ListRules,
    RemoveRule {
        rule_id: RuleId,
    },
    /// `rule_id: null` (or absent) unbinds the route.
    BindRoute {
        route: RouteKey,
        #[serde(default)]
        rule_id: Option<RuleId>,
    },
    EffectiveRule {
        route: RouteKey,
    },
    ApplicableRules {
        transport_type: TransportType,
    },
    ListRoutes,
    RouteSnapshot {
        route: RouteKey,
    },
    UpsertRoute {
        route: TransitRoute,
    },
    RemoveRoute {
        route: RouteKey,
    },
    RegisterModel {
        model_id: VehicleModelId,
        model: VehicleModel,
    },
    /// Replace settings; values are sanitized before use.
    UpdateSettings {
        settings: TransitSettings,
    },
    SetAlertsAvailable {
        available: bool,
    },
    /// Raw UI payload for the route-rule selector.
    SetRouteRulePayload {
        payload: String,
    },
    /// Raw UI payload for the add-rule panel.
    AddCustomRulePayload {
        payload: String,
    },
    /// Force one controller pass now.
    Tick,
    /// Advance the fixed schedule by `ticks` ticks.
    Step {
        ticks: u64,
    },
    Notifications,
    Save {
        path: String,
    },
    Load {
        path: String,
    },
    Quit,
}

// ---------------------------------------------------------------------------
// Responses (controller → stdout)
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct TransitResponse {
    pub protocol_version: u32,
    #[serde(flatten)]
    pub payload: ResponsePayload,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponsePayload {
    Ready,
    RuleAdded { rule_id: RuleId },
    Rule { rule: Rule },
    Rules { rules: Vec<Rule> },
    EffectiveRule { effective: EffectiveRule },
    RuleChoices { choices: Vec<RuleChoice> },
    Routes { routes: Vec<RouteOverview> },
    Snapshot { snapshot: RouteSnapshot },
    RouteBound { route: RouteKey },
    PassComplete { report: PassReport },
    StepComplete { tick: u64, passes: u32 },
    Notifications { notifications: Vec<NotificationEvent> },
    Ok,
    Error { message: String },
    Goodbye,
}

/// Bump when the command/response schema changes.
pub const PROTOCOL_VERSION: u32 = 1;

pub fn make_response(payload: ResponsePayload) -> TransitResponse {
    TransitResponse {
        protocol_version: PROTOCOL_VERSION,
        payload,
    }
}

impl From<TransitError> for ResponsePayload {
    fn from(e: TransitError) -> Self {
        ResponsePayload::Error {
            message: e.to_string(),
        }
    }
}
