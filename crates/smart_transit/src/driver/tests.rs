//! Tests for the controller pass over an in-memory network.

#[cfg(test)]
mod tests {
    use crate::busy_stop_alerts::{AlertBuffer, BusyStopAlerter};
    use crate::driver::*;
    use crate::ids::{RouteKey, StopId, TransportType};
    use crate::occupancy_controller::LoadTier;
    use crate::route_bindings::RouteBindings;
    use crate::rule_store::{RuleParams, RuleStore};
    use crate::settings::TransitSettings;
    use crate::telemetry::{
        AppliedPolicy, FleetRange, RouteVehicle, RouteWaypoint, TransitNetwork, TransitRoute,
        VehicleModel, VehicleModelId,
    };

    const MODEL: VehicleModelId = VehicleModelId(1);

    fn bus(n: u32) -> RouteKey {
        RouteKey::new(TransportType::Bus, n)
    }

    fn route(key: RouteKey, passengers: &[u32], stops: &[(u32, u32)]) -> TransitRoute {
        let mut route = TransitRoute::new(key);
        route.model_slots = vec![Some(MODEL)];
        route.vehicles = passengers
            .iter()
            .map(|p| RouteVehicle {
                passengers: Some(*p),
            })
            .collect();
        route.waypoints = stops
            .iter()
            .map(|(stop, waiting)| RouteWaypoint {
                waiting: Some(*waiting),
                stop: Some(StopId(*stop)),
            })
            .collect();
        route
    }

    fn network(routes: Vec<TransitRoute>) -> TransitNetwork {
        let mut network = TransitNetwork::default();
        network.register_model(MODEL, VehicleModel::single(100));
        for route in routes {
            network.upsert_route(route);
        }
        network
    }

    struct Fixture {
        network: TransitNetwork,
        rules: RuleStore,
        bindings: RouteBindings,
        settings: TransitSettings,
        alerter: BusyStopAlerter,
    }

    impl Fixture {
        fn new(network: TransitNetwork) -> Self {
            let settings = TransitSettings::default();
            let mut rules = RuleStore::with_seed(7);
            rules.sync_defaults_from_config(&settings);
            Self {
                network,
                rules,
                bindings: RouteBindings::default(),
                alerter: BusyStopAlerter::from_settings(&settings),
                settings,
            }
        }

        fn pass(&mut self) -> (PassReport, AlertBuffer) {
            let mut sink = AlertBuffer::new(true);
            let report = run_controller_pass(&mut PassContext {
                network: &mut self.network,
                rules: &self.rules,
                bindings: &self.bindings,
                settings: &self.settings,
                alerter: &mut self.alerter,
                sink: &mut sink,
            });
            (report, sink)
        }
    }

    #[test]
    fn test_hot_route_under_custom_rule() {
        let mut hot = route(bus(1), &[80; 10], &[]);
        hot.applied = AppliedPolicy {
            ticket_price: 10,
            vehicle_count: 10,
        };
        hot.fleet_range = FleetRange { min: 1, max: 20 };
        let mut world = Fixture::new(network(vec![hot]));

        let id = world.rules.add_rule();
        world.rules.set_rule(
            id,
            &RuleParams {
                name: "Downtown".to_string(),
                occupancy_target_pct: 50,
                standard_ticket_price: 10,
                max_ticket_increase_pct: 20,
                max_ticket_discount_pct: 20,
                ..Default::default()
            },
        );
        world.bindings.bind(bus(1), Some(id));

        let (report, _) = world.pass();
        assert_eq!(report.routes_seen, 1);
        assert_eq!(report.changes.len(), 1);
        let change = &report.changes[0];
        assert_eq!(change.rule_name, "Downtown");
        assert_eq!(change.tier, LoadTier::VeryHigh);
        assert_eq!(change.ticket_price, Some(12), "0.80 > 0.70 steps by 2 up to the cap");
        assert_eq!(change.vehicle_count, Some(11), "growth is rate limited to one vehicle");

        let applied = world.network.routes[&bus(1)].applied;
        assert_eq!(applied.ticket_price, 12);
        assert_eq!(applied.vehicle_count, 11);
    }

    #[test]
    fn test_removed_rule_falls_back_to_type_default() {
        let mut hot = route(bus(1), &[80; 10], &[]);
        hot.applied = AppliedPolicy {
            ticket_price: 8,
            vehicle_count: 10,
        };
        let mut world = Fixture::new(network(vec![hot]));
        let id = world.rules.add_rule();
        world.bindings.bind(bus(1), Some(id));
        world.rules.remove_rule(id);

        let (report, _) = world.pass();
        assert_eq!(report.changes.len(), 1);
        assert_eq!(report.changes[0].rule_name, "Bus");
        assert_eq!(report.changes[0].ticket_price, Some(9), "floor(8 * 1.2) caps the step");
    }

    #[test]
    fn test_idle_fleet_keeps_vehicles_on_first_pass() {
        // Nothing applied yet: the running fleet of 4 is the baseline.
        let world_route = route(bus(3), &[0; 4], &[]);
        let mut world = Fixture::new(network(vec![world_route]));

        let (report, _) = world.pass();
        assert_eq!(report.changes.len(), 1);
        let change = &report.changes[0];
        assert_eq!(change.tier, LoadTier::VeryLow);
        assert_eq!(change.ticket_price, Some(5), "clamped up to ceil(8 * 0.6)");
        assert_eq!(change.vehicle_count, None, "every vehicle is empty, so no reduction");
    }

    #[test]
    fn test_disabled_type_and_missing_capacity_are_skipped() {
        let disabled = route(RouteKey::new(TransportType::Tram, 1), &[50; 3], &[]);
        let mut no_model = route(bus(2), &[50; 3], &[]);
        no_model.model_slots = vec![None];
        let mut world = Fixture::new(network(vec![disabled, no_model]));
        world
            .settings
            .transport
            .get_mut(TransportType::Tram)
            .disabled = true;

        let (report, sink) = world.pass();
        assert_eq!(report.routes_seen, 2);
        assert_eq!(report.routes_skipped, 2);
        assert!(report.changes.is_empty());
        assert!(sink.into_alerts().is_empty());
    }

    #[test]
    fn test_busy_stop_alerts_once_per_latch() {
        let crowded = route(bus(1), &[10, 10], &[(1, 80)]);
        let mut world = Fixture::new(network(vec![crowded]));

        let (report, sink) = world.pass();
        assert_eq!(report.alerts_emitted, 1);
        let alerts = sink.into_alerts();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].subject, StopId(1));
        assert_eq!(alerts[0].waiting, 80);

        let (report, sink) = world.pass();
        assert_eq!(report.alerts_emitted, 0, "latched stop stays quiet");
        assert!(sink.into_alerts().is_empty());
    }

    #[test]
    fn test_alert_budget_spreads_over_passes() {
        let first = route(bus(1), &[10, 10], &[(1, 80)]);
        let second = route(bus(2), &[10, 10], &[(2, 80)]);
        let mut world = Fixture::new(network(vec![first, second]));

        let (_, sink) = world.pass();
        let alerts = sink.into_alerts();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].subject, StopId(1));

        let (_, sink) = world.pass();
        let alerts = sink.into_alerts();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].subject, StopId(2));
    }

    #[test]
    fn test_alerts_disabled_in_settings() {
        let crowded = route(bus(1), &[10, 10], &[(1, 80)]);
        let mut world = Fixture::new(network(vec![crowded]));
        world.settings.alerts_enabled = false;

        let (report, sink) = world.pass();
        assert_eq!(report.alerts_emitted, 0);
        assert!(sink.into_alerts().is_empty());
        assert!(!world.alerter.is_latched(StopId(1)));
    }

    #[test]
    fn test_removed_stop_latch_is_collected() {
        let crowded = route(bus(1), &[10, 10], &[(1, 80)]);
        let mut world = Fixture::new(network(vec![crowded]));
        world.pass();
        assert!(world.alerter.is_latched(StopId(1)));

        world.network.remove_stop(StopId(1));
        world.pass();
        assert_eq!(world.alerter.latch_count(), 0);
    }
}
