use crate::busy_stop_alerts::{AlertChannel, BusyStopAlerter};
use crate::ids::StopId;
use crate::notifications::NotificationPriority;
use crate::occupancy_controller::LoadTier;
use crate::rule_store::DISABLED_RULE_NAME;
use crate::test_harness::{bus, TestTransit};

/// Ten buses at 60% load under the Bus default (target 30%, ticket 8).
fn hot_bus_line() -> TestTransit {
    TestTransit::new()
        .with_pass_interval(4)
        .with_route(bus(1), &[60; 10], &[])
        .with_applied(bus(1), 8, 10)
        .with_fleet_range(bus(1), 1, 20)
}

// ===========================================================================
// Cadence
// ===========================================================================

#[test]
fn test_no_pass_before_interval_elapses() {
    let mut transit = hot_bus_line();
    transit.tick(3);
    assert!(transit.last_report().is_none());
    transit.assert_ticket_price(bus(1), 8);

    transit.tick(1);
    let report = transit.last_report().expect("pass on the 4th tick");
    assert_eq!(report.routes_seen, 1);
    assert_eq!(transit.current_tick(), 4);
}

#[test]
fn test_consecutive_passes_step_from_applied_values() {
    let mut transit = hot_bus_line();

    transit.tick_until_pass();
    let change = transit.last_report().unwrap().changes[0].clone();
    assert_eq!(change.tier, LoadTier::VeryHigh);
    transit.assert_ticket_price(bus(1), 9);
    transit.assert_vehicle_count(bus(1), 11);

    transit.tick_until_pass();
    // Price already sits at the cap of floor(8 * 1.2).
    transit.assert_ticket_price(bus(1), 9);
    transit.assert_vehicle_count(bus(1), 12);
    let change = &transit.last_report().unwrap().changes[0];
    assert_eq!(change.ticket_price, None);
    assert_eq!(change.vehicle_count, Some(12));
}

#[test]
fn test_interval_change_restarts_countdown() {
    let mut transit = hot_bus_line();
    transit.tick(3);
    {
        let mut settings = transit.settings_mut();
        settings.base_interval_ticks = 8 * settings.update_frequency.divisor();
    }

    transit.tick(7);
    assert!(transit.last_report().is_none(), "old count must not carry over");
    transit.tick(1);
    assert!(transit.last_report().is_some());
}

#[test]
fn test_disabled_type_leaves_routes_alone() {
    let mut transit = hot_bus_line();
    transit
        .settings_mut()
        .transport
        .get_mut(crate::TransportType::Bus)
        .disabled = true;

    transit.tick_until_pass();
    let report = transit.last_report().unwrap();
    assert_eq!(report.routes_skipped, 1);
    assert!(report.changes.is_empty());
    transit.assert_ticket_price(bus(1), 8);
    assert_eq!(transit.effective_rule(bus(1)).rule.name, DISABLED_RULE_NAME);
}

// ===========================================================================
// Alerts
// ===========================================================================

#[test]
fn test_busy_stop_alert_reaches_notification_log() {
    let mut transit = TestTransit::new()
        .with_pass_interval(2)
        .with_route(bus(2), &[10, 10], &[(5, 80)]);

    transit.tick_until_pass();
    transit.assert_notification_count(1);
    let note = &transit.notifications()[0];
    assert_eq!(note.priority, NotificationPriority::Attention);
    assert_eq!(note.location, Some(StopId(5)));
    assert_eq!(note.text, "Bus Line 2: a stop is very busy, 80 passengers waiting.");

    transit.tick_until_pass();
    transit.assert_notification_count(1);
    assert!(transit.world().resource::<BusyStopAlerter>().is_latched(StopId(5)));
}

#[test]
fn test_unavailable_channel_posts_nothing() {
    let mut transit = TestTransit::new()
        .with_pass_interval(2)
        .with_route(bus(2), &[10, 10], &[(5, 80)]);
    transit.world_mut().resource_mut::<AlertChannel>().available = false;

    transit.tick_until_pass();
    transit.assert_notification_count(0);
    assert!(!transit.world().resource::<BusyStopAlerter>().is_latched(StopId(5)));

    // Once the channel is back the stop alerts on the next pass.
    transit.world_mut().resource_mut::<AlertChannel>().available = true;
    transit.tick_until_pass();
    transit.assert_notification_count(1);
}

#[test]
fn test_forced_pass_records_alerts_immediately() {
    let mut transit = TestTransit::new().with_route(bus(3), &[10, 10], &[(9, 90)]);
    let report = transit.force_pass();
    assert_eq!(report.alerts_emitted, 1);
    transit.assert_notification_count(1);
    assert_eq!(transit.current_tick(), 0);
}
