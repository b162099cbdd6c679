//! Rule and route operations exposed to a UI or the command protocol.
//!
//! Every function takes the `World` directly so it can be called from an
//! exclusive system, a test harness or the headless command loop alike.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::busy_stop_alerts::{AlertBuffer, AlertChannel, BusyStopAlerter};
use crate::driver::{run_controller_pass, LastPassReport, PassContext, PassReport};
use crate::error::TransitError;
use crate::ids::{RouteKey, RuleId, TransportType};
use crate::notifications::{NotificationEvent, NotificationLog};
use crate::route_bindings::{resolve_effective_rule, EffectiveRule, RouteBindings};
use crate::rule_store::{is_builtin_name, Rule, RuleChoice, RuleParams, RuleStore};
use crate::settings::TransitSettings;
use crate::telemetry::{
    build_snapshot, RouteSnapshot, TransitNetwork, TransitRoute, VehicleModel, VehicleModelId,
};
use crate::TickCounter;

// =============================================================================
// Rules
// =============================================================================

pub fn add_rule(world: &mut World) -> RuleId {
    let id = world.resource_mut::<RuleStore>().add_rule();
    debug!("added rule {id}");
    id
}

/// Create-or-update; see `RuleStore::set_rule`.
pub fn set_rule(world: &mut World, id: RuleId, params: &RuleParams) {
    world.resource_mut::<RuleStore>().set_rule(id, params);
}

pub fn get_rule(world: &World, id: RuleId) -> Result<Rule, TransitError> {
    world
        .resource::<RuleStore>()
        .get_rule(id)
        .cloned()
        .ok_or(TransitError::UnknownRule(id))
}

/// Every rule, sorted by name for display.
pub fn list_rules(world: &World) -> Vec<Rule> {
    world.resource::<RuleStore>().sorted_for_display()
}

/// Rules a rules panel shows: customs plus defaults of enabled types.
pub fn visible_rules(world: &World) -> Vec<Rule> {
    world
        .resource::<RuleStore>()
        .visible_rules(world.resource::<TransitSettings>())
}

/// Remove a custom rule and unbind the routes that used it. Built-in rules
/// are refused; an unknown id is a no-op.
pub fn remove_custom_rule(world: &mut World, id: RuleId) -> Result<(), TransitError> {
    let Some(rule) = world.resource::<RuleStore>().get_rule(id) else {
        return Ok(());
    };
    if id.is_builtin() || is_builtin_name(&rule.name) {
        warn!("refusing to remove built-in rule '{}'", rule.name);
        return Err(TransitError::ProtectedRule(rule.name.clone()));
    }
    world.resource_mut::<RuleStore>().remove_rule(id);
    let unbound = world.resource_mut::<RouteBindings>().forget_rule(id);
    debug!("removed rule {id}, {unbound} route(s) back on type defaults");
    Ok(())
}

// =============================================================================
// Routes
// =============================================================================

/// Bind a route to a rule, or unbind it with `None`.
///
/// Of the built-ins only "Disabled" and the route's own type default are
/// accepted.
pub fn bind_route_to_rule(
    world: &mut World,
    route: RouteKey,
    rule: Option<RuleId>,
) -> Result<(), TransitError> {
    if let Some(id) = rule {
        if id.builtin_type().is_some_and(|t| t != route.transport_type) {
            warn!("{route}: cannot bind the {id} default of another type");
            return Err(TransitError::ForeignBuiltinRule { route, rule: id });
        }
        if !id.is_builtin() && !world.resource::<RuleStore>().contains(id) {
            warn!("{route}: cannot bind unknown rule {id}");
            return Err(TransitError::UnknownRule(id));
        }
    }
    world.resource_mut::<RouteBindings>().bind(route, rule);
    Ok(())
}

pub fn effective_rule(world: &World, route: RouteKey) -> EffectiveRule {
    resolve_effective_rule(
        route,
        world.resource::<RouteBindings>(),
        world.resource::<RuleStore>(),
        world.resource::<TransitSettings>(),
    )
}

pub fn applicable_rules(world: &World, transport_type: TransportType) -> Vec<RuleChoice> {
    let disabled = world
        .resource::<TransitSettings>()
        .is_type_disabled(transport_type);
    world
        .resource::<RuleStore>()
        .list_applicable_rules(transport_type, disabled)
}

/// One row of the route list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteOverview {
    pub route_number: u32,
    pub route_name: String,
    pub transport_type: TransportType,
    pub rule_name: String,
    pub rule_id: RuleId,
}

pub fn list_routes(world: &World) -> Vec<RouteOverview> {
    let network = world.resource::<TransitNetwork>();
    network
        .routes
        .values()
        .map(|route| {
            let effective = effective_rule(world, route.key);
            RouteOverview {
                route_number: route.key.number,
                route_name: route.name.clone(),
                transport_type: route.key.transport_type,
                rule_name: effective.rule.name,
                rule_id: effective.rule.id,
            }
        })
        .collect()
}

pub fn route_snapshot(world: &World, route: RouteKey) -> Result<RouteSnapshot, TransitError> {
    let network = world.resource::<TransitNetwork>();
    let data = network
        .routes
        .get(&route)
        .ok_or(TransitError::UnknownRoute(route))?;
    let weight = world.resource::<TransitSettings>().waiting_weight;
    Ok(build_snapshot(data, network, weight))
}

pub fn upsert_route(world: &mut World, route: TransitRoute) {
    world.resource_mut::<TransitNetwork>().upsert_route(route);
}

/// Remove a route together with its binding.
pub fn remove_route(world: &mut World, route: RouteKey) -> Result<(), TransitError> {
    world
        .resource_mut::<TransitNetwork>()
        .remove_route(route)
        .ok_or(TransitError::UnknownRoute(route))?;
    world.resource_mut::<RouteBindings>().bind(route, None);
    Ok(())
}

pub fn register_vehicle_model(world: &mut World, id: VehicleModelId, model: VehicleModel) {
    world
        .resource_mut::<TransitNetwork>()
        .register_model(id, model);
}

// =============================================================================
// Controller
// =============================================================================

/// Force one controller pass now, outside the fixed schedule. Alerts go
/// straight into the `NotificationLog` since no collector runs in between.
pub fn tick(world: &mut World) -> PassReport {
    world.resource_scope(|world, mut rules: Mut<RuleStore>| {
        rules.sync_defaults_from_config(world.resource::<TransitSettings>());
    });

    let mut sink = AlertBuffer::new(world.resource::<AlertChannel>().available);
    let report = world.resource_scope(|world, mut network: Mut<TransitNetwork>| {
        world.resource_scope(|world, mut alerter: Mut<BusyStopAlerter>| {
            run_controller_pass(&mut PassContext {
                network: &mut *network,
                rules: world.resource::<RuleStore>(),
                bindings: world.resource::<RouteBindings>(),
                settings: world.resource::<TransitSettings>(),
                alerter: &mut *alerter,
                sink: &mut sink,
            })
        })
    });

    let now = world.resource::<TickCounter>().0;
    let mut log = world.resource_mut::<NotificationLog>();
    for alert in sink.into_alerts() {
        log.record(&NotificationEvent::from(alert), now);
    }
    world.resource_mut::<LastPassReport>().0 = Some(report.clone());
    report
}

// =============================================================================
// UI payloads
// =============================================================================

/// Route-rule selection as the routes panel sends it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RouteRuleSelection {
    route_number: u32,
    transport_type: String,
    rule_id: String,
}

/// New custom rule as the add-rule panel sends it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct NewCustomRule {
    rule_name: String,
    occupancy: i32,
    std_ticket: i32,
    max_ticket_inc: i32,
    max_ticket_dec: i32,
    max_veh_adj: i32,
    min_veh_adj: i32,
}

/// Apply `{"transportType", "routeNumber", "ruleId"}`. An empty or
/// malformed rule id unbinds the route.
pub fn set_route_rule_from_payload(world: &mut World, json: &str) -> Result<RouteKey, TransitError> {
    let selection: RouteRuleSelection = serde_json::from_str(json)?;
    let transport_type = TransportType::from_name(&selection.transport_type).ok_or_else(|| {
        TransitError::InvalidPayload(format!(
            "unknown transport type '{}'",
            selection.transport_type
        ))
    })?;
    let route = RouteKey::new(transport_type, selection.route_number);
    if !world.resource::<TransitNetwork>().contains_route(route) {
        return Err(TransitError::UnknownRoute(route));
    }

    let rule = if selection.rule_id.trim().is_empty() {
        None
    } else {
        RuleId::parse_or_none(&selection.rule_id)
    };
    bind_route_to_rule(world, route, rule)?;
    Ok(route)
}

/// Create a custom rule from the add-rule panel's payload.
pub fn add_custom_rule_from_payload(world: &mut World, json: &str) -> Result<RuleId, TransitError> {
    let payload: NewCustomRule = serde_json::from_str(json)?;
    let id = add_rule(world);
    set_rule(
        world,
        id,
        &RuleParams {
            name: payload.rule_name,
            occupancy_target_pct: payload.occupancy,
            standard_ticket_price: payload.std_ticket,
            max_ticket_increase_pct: payload.max_ticket_inc,
            max_ticket_discount_pct: payload.max_ticket_dec,
            max_vehicle_adj_pct: payload.max_veh_adj,
            min_vehicle_adj_pct: payload.min_veh_adj,
        },
    );
    Ok(id)
}
