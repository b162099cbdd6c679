use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::ids::{RouteKey, StopId};

/// Catalog key of a vehicle model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VehicleModelId(pub u32);

/// Coupled units of one model attached behind the lead unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Carriage {
    pub model: VehicleModelId,
    pub count: u32,
}

/// Passenger layout of a vehicle model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleModel {
    pub passenger_capacity: u32,
    /// Powered units in a multi-unit consist. Zero or one means a single vehicle.
    #[serde(default)]
    pub engine_units: u32,
    #[serde(default)]
    pub carriages: Vec<Carriage>,
}

impl VehicleModel {
    pub fn single(passenger_capacity: u32) -> Self {
        Self {
            passenger_capacity,
            engine_units: 1,
            carriages: Vec::new(),
        }
    }
}

pub type VehicleCatalog = HashMap<VehicleModelId, VehicleModel>;

/// One vehicle currently assigned to a route. `passengers` is `None` when the
/// host could not read the passenger list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RouteVehicle {
    pub passengers: Option<u32>,
}

/// A waypoint on a route. Only waypoints connected to a stop can become the
/// route's busiest stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RouteWaypoint {
    pub waiting: Option<u32>,
    pub stop: Option<StopId>,
}

/// Fleet-size range the host computes for a route before rule adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FleetRange {
    pub min: u32,
    pub max: u32,
}

impl Default for FleetRange {
    fn default() -> Self {
        Self { min: 1, max: 10 }
    }
}

/// Values last written through the policy sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AppliedPolicy {
    pub ticket_price: i32,
    pub vehicle_count: u32,
}

/// Raw telemetry for one route, as the host exposes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitRoute {
    pub key: RouteKey,
    #[serde(default)]
    pub name: String,
    /// False for cargo-only lines; those are never adjusted.
    #[serde(default = "default_true")]
    pub carries_passengers: bool,
    /// Vehicle models configured for the line, first usable one wins.
    #[serde(default)]
    pub model_slots: Vec<Option<VehicleModelId>>,
    #[serde(default)]
    pub vehicles: Vec<RouteVehicle>,
    #[serde(default)]
    pub waypoints: Vec<RouteWaypoint>,
    #[serde(default)]
    pub fleet_range: FleetRange,
    #[serde(default)]
    pub applied: AppliedPolicy,
}

fn default_true() -> bool {
    true
}

impl TransitRoute {
    pub fn new(key: RouteKey) -> Self {
        Self {
            key,
            name: key.to_string(),
            carries_passengers: true,
            model_slots: Vec::new(),
            vehicles: Vec::new(),
            waypoints: Vec::new(),
            fleet_range: FleetRange::default(),
            applied: AppliedPolicy::default(),
        }
    }
}

/// The stop with the most waiting passengers on a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusiestStop {
    pub stop: StopId,
    pub waiting: u32,
}

/// Normalized per-route telemetry, rebuilt every pass and never persisted.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RouteSnapshot {
    pub vehicle_count: u32,
    pub empty_vehicles: u32,
    pub onboard: u32,
    pub waiting: u32,
    pub capacity_per_vehicle: u32,
    pub busiest_stop: Option<BusiestStop>,
    pub weighted_ratio: f64,
    pub carries_passengers: bool,
}

impl RouteSnapshot {
    /// Onboard passengers plus weighted waiting passengers.
    pub fn weighted_load(&self, waiting_weight: f64) -> f64 {
        f64::from(self.onboard) + f64::from(self.waiting) * waiting_weight
    }

    /// Share of assigned vehicles that carry nobody.
    pub fn empty_share(&self) -> f64 {
        if self.vehicle_count == 0 {
            return 0.0;
        }
        f64::from(self.empty_vehicles) / f64::from(self.vehicle_count)
    }
}
