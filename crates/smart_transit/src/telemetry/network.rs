use std::collections::{BTreeMap, BTreeSet};

use bevy::prelude::*;

use super::types::{AppliedPolicy, TransitRoute, VehicleCatalog, VehicleModel, VehicleModelId};
use crate::ids::{RouteKey, StopId};

// =============================================================================
// Seams
// =============================================================================

/// Read-only view of the host's transit world.
pub trait TelemetrySource {
    fn route_keys(&self) -> Vec<RouteKey>;
    fn route(&self, key: RouteKey) -> Option<&TransitRoute>;
    fn vehicle_model(&self, id: VehicleModelId) -> Option<&VehicleModel>;
    fn stop_exists(&self, stop: StopId) -> bool;
}

/// Where controller decisions are written. Each setter is one idempotent
/// "set policy" call for a single dimension.
pub trait PolicySink {
    fn applied_policy(&self, key: RouteKey) -> Option<AppliedPolicy>;
    fn set_ticket_price(&mut self, key: RouteKey, price: i32);
    fn set_vehicle_count(&mut self, key: RouteKey, count: u32);
}

// =============================================================================
// In-memory host tables
// =============================================================================

/// In-memory route, vehicle-model and stop tables. Acts as both the
/// telemetry source and the policy sink when no external host is attached.
#[derive(Resource, Default, Debug, Clone)]
pub struct TransitNetwork {
    pub routes: BTreeMap<RouteKey, TransitRoute>,
    pub catalog: VehicleCatalog,
    pub stops: BTreeSet<StopId>,
}

impl TransitNetwork {
    /// Insert or replace a route. Stops it references are registered too.
    pub fn upsert_route(&mut self, route: TransitRoute) {
        for waypoint in &route.waypoints {
            if let Some(stop) = waypoint.stop {
                self.stops.insert(stop);
            }
        }
        self.routes.insert(route.key, route);
    }

    pub fn remove_route(&mut self, key: RouteKey) -> Option<TransitRoute> {
        self.routes.remove(&key)
    }

    pub fn register_model(&mut self, id: VehicleModelId, model: VehicleModel) {
        self.catalog.insert(id, model);
    }

    pub fn remove_stop(&mut self, stop: StopId) {
        self.stops.remove(&stop);
    }

    pub fn contains_route(&self, key: RouteKey) -> bool {
        self.routes.contains_key(&key)
    }
}

impl TelemetrySource for TransitNetwork {
    fn route_keys(&self) -> Vec<RouteKey> {
        self.routes.keys().copied().collect()
    }

    fn route(&self, key: RouteKey) -> Option<&TransitRoute> {
        self.routes.get(&key)
    }

    fn vehicle_model(&self, id: VehicleModelId) -> Option<&VehicleModel> {
        self.catalog.get(&id)
    }

    fn stop_exists(&self, stop: StopId) -> bool {
        self.stops.contains(&stop)
    }
}

impl PolicySink for TransitNetwork {
    fn applied_policy(&self, key: RouteKey) -> Option<AppliedPolicy> {
        self.routes.get(&key).map(|r| r.applied)
    }

    fn set_ticket_price(&mut self, key: RouteKey, price: i32) {
        if let Some(route) = self.routes.get_mut(&key) {
            route.applied.ticket_price = price;
        }
    }

    fn set_vehicle_count(&mut self, key: RouteKey, count: u32) {
        if let Some(route) = self.routes.get_mut(&key) {
            route.applied.vehicle_count = count;
        }
    }
}
