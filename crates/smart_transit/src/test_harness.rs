//! # TestTransit: headless harness for the transit controller
//!
//! Wraps a `bevy::app::App` with `SmartTransitPlugin` so tests and benches
//! can seed routes and rules, drive the fixed schedule tick by tick and
//! inspect the resulting state.

use bevy::app::App;
use bevy::prelude::*;

use crate::commands;
use crate::driver::{ControllerSchedule, LastPassReport, PassReport};
use crate::ids::{RouteKey, RuleId, StopId, TransportType};
use crate::notifications::{NotificationEvent, NotificationLog};
use crate::route_bindings::{EffectiveRule, RouteBindings};
use crate::rule_store::{RuleParams, RuleStore};
use crate::settings::TransitSettings;
use crate::telemetry::{
    AppliedPolicy, FleetRange, RouteVehicle, RouteWaypoint, TransitNetwork, TransitRoute,
    VehicleModel, VehicleModelId,
};
use crate::{SmartTransitPlugin, TickCounter};

/// Model every `with_route` line runs unless told otherwise.
pub const DEFAULT_MODEL: VehicleModelId = VehicleModelId(1);
pub const DEFAULT_CAPACITY: u32 = 100;

/// A headless App running the controller in `FixedUpdate`.
pub struct TestTransit {
    app: App,
}

impl Default for TestTransit {
    fn default() -> Self {
        Self::new()
    }
}

impl TestTransit {
    // -----------------------------------------------------------------------
    // Constructors
    // -----------------------------------------------------------------------

    /// Default settings, a deterministic rule-id stream and one vehicle
    /// model of capacity 100 registered as `DEFAULT_MODEL`.
    pub fn new() -> Self {
        Self::with_settings(TransitSettings::default())
    }

    pub fn with_settings(settings: TransitSettings) -> Self {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.insert_resource(settings);
        app.add_plugins(SmartTransitPlugin);
        app.insert_resource(RuleStore::with_seed(0x5eed));

        let world = app.world_mut();
        world
            .resource_mut::<TransitNetwork>()
            .register_model(DEFAULT_MODEL, VehicleModel::single(DEFAULT_CAPACITY));
        world.resource_scope(|world, mut rules: Mut<RuleStore>| {
            rules.sync_defaults_from_config(world.resource::<TransitSettings>());
        });
        let interval = world.resource::<TransitSettings>().controller_interval();
        world.insert_resource(ControllerSchedule::new(interval));

        Self { app }
    }

    // -----------------------------------------------------------------------
    // Setup (builder pattern, consumes and returns Self)
    // -----------------------------------------------------------------------

    /// Run a pass every `interval` ticks by shrinking the base interval.
    pub fn with_pass_interval(mut self, interval: u32) -> Self {
        let world = self.app.world_mut();
        {
            let mut settings = world.resource_mut::<TransitSettings>();
            settings.base_interval_ticks = interval * settings.update_frequency.divisor();
        }
        world.insert_resource(ControllerSchedule::new(interval));
        self
    }

    pub fn with_model(mut self, id: VehicleModelId, model: VehicleModel) -> Self {
        commands::register_vehicle_model(self.app.world_mut(), id, model);
        self
    }

    /// A passenger route on `DEFAULT_MODEL`: one vehicle per entry of
    /// `passengers`, one stop per `(stop, waiting)` pair.
    pub fn with_route(
        self,
        key: RouteKey,
        passengers: &[u32],
        stops: &[(u32, u32)],
    ) -> Self {
        let route = Self::route(key, passengers, stops);
        self.with_transit_route(route)
    }

    pub fn with_transit_route(mut self, route: TransitRoute) -> Self {
        commands::upsert_route(self.app.world_mut(), route);
        self
    }

    /// Add a custom rule and return its id alongside the harness.
    pub fn with_rule(mut self, params: RuleParams) -> (Self, RuleId) {
        let world = self.app.world_mut();
        let id = commands::add_rule(world);
        commands::set_rule(world, id, &params);
        (self, id)
    }

    pub fn with_binding(mut self, route: RouteKey, rule: RuleId) -> Self {
        self.app
            .world_mut()
            .resource_mut::<RouteBindings>()
            .bind(route, Some(rule));
        self
    }

    pub fn with_applied(mut self, route: RouteKey, ticket_price: i32, vehicle_count: u32) -> Self {
        if let Some(r) = self
            .app
            .world_mut()
            .resource_mut::<TransitNetwork>()
            .routes
            .get_mut(&route)
        {
            r.applied = AppliedPolicy {
                ticket_price,
                vehicle_count,
            };
        }
        self
    }

    pub fn with_fleet_range(mut self, route: RouteKey, min: u32, max: u32) -> Self {
        if let Some(r) = self
            .app
            .world_mut()
            .resource_mut::<TransitNetwork>()
            .routes
            .get_mut(&route)
        {
            r.fleet_range = FleetRange { min, max };
        }
        self
    }

    /// Raw route with the same layout `with_route` uses.
    pub fn route(key: RouteKey, passengers: &[u32], stops: &[(u32, u32)]) -> TransitRoute {
        let mut route = TransitRoute::new(key);
        route.model_slots = vec![Some(DEFAULT_MODEL)];
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

    // -----------------------------------------------------------------------
    // Simulation
    // -----------------------------------------------------------------------

    /// Run `FixedUpdate` `n` times. The schedule is invoked directly so a
    /// tick never depends on wall-clock time.
    pub fn tick(&mut self, n: u32) {
        for _ in 0..n {
            self.app.world_mut().run_schedule(FixedUpdate);
        }
    }

    /// Tick until the next scheduled pass has run.
    pub fn tick_until_pass(&mut self) {
        let due = self
            .app
            .world()
            .resource::<ControllerSchedule>()
            .ticks_until_due();
        self.tick(due);
    }

    /// Run one pass immediately, outside the schedule.
    pub fn force_pass(&mut self) -> PassReport {
        commands::tick(self.app.world_mut())
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn world(&self) -> &World {
        self.app.world()
    }

    pub fn world_mut(&mut self) -> &mut World {
        self.app.world_mut()
    }

    pub fn current_tick(&self) -> u64 {
        self.app.world().resource::<TickCounter>().0
    }

    pub fn settings_mut(&mut self) -> Mut<'_, TransitSettings> {
        self.app.world_mut().resource_mut::<TransitSettings>()
    }

    pub fn applied(&self, route: RouteKey) -> AppliedPolicy {
        self.app
            .world()
            .resource::<TransitNetwork>()
            .routes
            .get(&route)
            .map(|r| r.applied)
            .unwrap_or_default()
    }

    pub fn last_report(&self) -> Option<&PassReport> {
        self.app.world().resource::<LastPassReport>().0.as_ref()
    }

    pub fn effective_rule(&self, route: RouteKey) -> EffectiveRule {
        commands::effective_rule(self.app.world(), route)
    }

    /// Every notification collected so far, oldest first.
    pub fn notifications(&self) -> &[NotificationEvent] {
        &self.app.world().resource::<NotificationLog>().journal
    }

    pub fn rule_count(&self) -> usize {
        self.app.world().resource::<RuleStore>().len()
    }

    // -----------------------------------------------------------------------
    // Assertions
    // -----------------------------------------------------------------------

    pub fn assert_ticket_price(&self, route: RouteKey, expected: i32) {
        let actual = self.applied(route).ticket_price;
        assert_eq!(actual, expected, "{route}: ticket price");
    }

    pub fn assert_vehicle_count(&self, route: RouteKey, expected: u32) {
        let actual = self.applied(route).vehicle_count;
        assert_eq!(actual, expected, "{route}: vehicle count");
    }

    pub fn assert_notification_count(&self, expected: usize) {
        let actual = self.notifications().len();
        assert_eq!(actual, expected, "notifications: {:?}", self.notifications());
    }
}

/// Shorthand for a bus line key.
pub fn bus(number: u32) -> RouteKey {
    RouteKey::new(TransportType::Bus, number)
}
