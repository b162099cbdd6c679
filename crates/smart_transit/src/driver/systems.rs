use bevy::prelude::*;

use super::pass::{run_controller_pass, LastPassReport, PassContext};
use super::schedule::ControllerSchedule;
use crate::busy_stop_alerts::{AlertBuffer, AlertChannel, BusyStopAlerter};
use crate::notifications::NotificationEvent;
use crate::route_bindings::RouteBindings;
use crate::rule_store::RuleStore;
use crate::settings::TransitSettings;
use crate::telemetry::TransitNetwork;
use crate::TickCounter;

pub fn advance_controller_schedule(
    settings: Res<TransitSettings>,
    mut schedule: ResMut<ControllerSchedule>,
    mut tick: ResMut<TickCounter>,
) {
    tick.0 = tick.0.wrapping_add(1);
    schedule.set_interval(settings.controller_interval());
    schedule.tick();
}

/// Re-derive the built-in rules when settings change or a load dropped them.
pub fn sync_builtin_rules(settings: Res<TransitSettings>, mut rules: ResMut<RuleStore>) {
    if !settings.is_changed() && rules.has_all_builtins() {
        return;
    }
    if rules.sync_defaults_from_config(&settings) {
        debug!("built-in transit rules synced from settings");
    }
}

#[allow(clippy::too_many_arguments)]
pub fn run_controller(
    mut network: ResMut<TransitNetwork>,
    rules: Res<RuleStore>,
    bindings: Res<RouteBindings>,
    settings: Res<TransitSettings>,
    channel: Res<AlertChannel>,
    mut alerter: ResMut<BusyStopAlerter>,
    mut last: ResMut<LastPassReport>,
    mut notifications: EventWriter<NotificationEvent>,
) {
    let mut sink = AlertBuffer::new(channel.available);
    let report = run_controller_pass(&mut PassContext {
        network: &mut *network,
        rules: &*rules,
        bindings: &*bindings,
        settings: &*settings,
        alerter: &mut *alerter,
        sink: &mut sink,
    });
    for alert in sink.into_alerts() {
        notifications.send(NotificationEvent::from(alert));
    }
    last.0 = Some(report);
}
