use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::busy_stop_alerts::{AlertInput, AlertOutcome, AlertSink, BusyStopAlerter};
use crate::ids::RouteKey;
use crate::occupancy_controller::{
    decide, ControlDecision, ControlInput, ControlParams, LoadTier, SkipReason,
};
use crate::route_bindings::{resolve_effective_rule, RouteBindings};
use crate::rule_store::RuleStore;
use crate::settings::TransitSettings;
use crate::telemetry::{build_snapshot, PolicySink, TelemetrySource};

/// Values written for one route during a pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteChange {
    pub route: RouteKey,
    pub rule_name: String,
    pub tier: LoadTier,
    pub weighted_ratio: f64,
    pub ticket_price: Option<i32>,
    pub vehicle_count: Option<u32>,
}

/// Summary of one controller pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PassReport {
    pub routes_seen: u32,
    pub routes_skipped: u32,
    pub alerts_emitted: u32,
    pub changes: Vec<RouteChange>,
}

/// The most recent pass report, for the command protocol.
#[derive(Resource, Debug, Clone, Default)]
pub struct LastPassReport(pub Option<PassReport>);

/// Everything one pass reads and writes. The host holds exclusive access to
/// all of it until the pass returns.
pub struct PassContext<'a, N, S> {
    pub network: &'a mut N,
    pub rules: &'a RuleStore,
    pub bindings: &'a RouteBindings,
    pub settings: &'a TransitSettings,
    pub alerter: &'a mut BusyStopAlerter,
    pub sink: &'a mut S,
}

/// Run the controller once over every route the source knows.
pub fn run_controller_pass<N, S>(ctx: &mut PassContext<'_, N, S>) -> PassReport
where
    N: TelemetrySource + PolicySink,
    S: AlertSink,
{
    let settings = ctx.settings;
    let params = ControlParams::from_settings(settings);
    let mut report = PassReport::default();

    ctx.alerter.configure(settings);
    ctx.alerter.begin_cycle();
    {
        let network = &*ctx.network;
        ctx.alerter.retain_existing(|stop| network.stop_exists(stop));
    }

    for key in ctx.network.route_keys() {
        let Some(route) = ctx.network.route(key) else {
            continue;
        };
        report.routes_seen += 1;

        let effective = resolve_effective_rule(key, ctx.bindings, ctx.rules, settings);
        let config = effective.config();
        let snapshot = build_snapshot(route, &*ctx.network, settings.waiting_weight);
        let fleet_range = route.fleet_range;

        let mut applied = ctx.network.applied_policy(key).unwrap_or_default();
        // Nothing written yet: start from the fleet the route actually runs.
        if applied.vehicle_count == 0 {
            applied.vehicle_count = snapshot.vehicle_count;
        }

        let decision = decide(&ControlInput {
            snapshot: &snapshot,
            rule: &config,
            applied,
            fleet_range,
            params,
        });

        let evaluate_alerts = settings.alerts_enabled
            && !matches!(
                decision,
                ControlDecision::Skip(
                    SkipReason::InactiveRule | SkipReason::NotPassengerRoute | SkipReason::NoCapacity
                )
            );
        if evaluate_alerts {
            let network = &*ctx.network;
            let outcome = ctx.alerter.evaluate(
                &AlertInput {
                    route: key,
                    snapshot: &snapshot,
                    occupancy_target_pct: config.occupancy_target_pct,
                    threshold_pct: params.threshold_pct,
                },
                |stop| network.stop_exists(stop),
                &mut *ctx.sink,
            );
            if outcome == AlertOutcome::Emitted {
                report.alerts_emitted += 1;
            }
        }

        let change = match decision {
            ControlDecision::Skip(reason) => {
                debug!("{key}: skipped ({reason:?})");
                report.routes_skipped += 1;
                continue;
            }
            ControlDecision::Apply(change) => change,
        };
        if change.is_empty() {
            continue;
        }

        if let Some(price) = change.ticket_price {
            ctx.network.set_ticket_price(key, price);
        }
        if let Some(count) = change.vehicle_count {
            ctx.network.set_vehicle_count(key, count);
        }
        if settings.debug_log {
            info!(
                "{key} [{}]: ratio {:.2} ({:?}), ticket {} -> {}, vehicles {} -> {}",
                effective.rule.name,
                snapshot.weighted_ratio,
                change.tier,
                applied.ticket_price,
                change.ticket_price.unwrap_or(applied.ticket_price),
                applied.vehicle_count,
                change.vehicle_count.unwrap_or(applied.vehicle_count),
            );
        }
        report.changes.push(RouteChange {
            route: key,
            rule_name: effective.rule.name,
            tier: change.tier,
            weighted_ratio: snapshot.weighted_ratio,
            ticket_price: change.ticket_price,
            vehicle_count: change.vehicle_count,
        });
    }

    if settings.debug_log {
        info!(
            "transit pass: {} routes, {} changed, {} skipped, {} alerts",
            report.routes_seen,
            report.changes.len(),
            report.routes_skipped,
            report.alerts_emitted
        );
    }
    report
}
