use super::network::TelemetrySource;
use super::types::{BusiestStop, RouteSnapshot, TransitRoute};

/// Effective passenger capacity of one vehicle on the route.
///
/// The first slot whose model resolves in the catalog decides. A multi-unit
/// consist counts its lead capacity once per powered unit plus every coupled
/// carriage. Returns 0 when no slot resolves.
pub fn capacity_per_vehicle<S: TelemetrySource + ?Sized>(route: &TransitRoute, source: &S) -> u32 {
    let Some(model) = route
        .model_slots
        .iter()
        .flatten()
        .find_map(|id| source.vehicle_model(*id))
    else {
        return 0;
    };

    let units = model.engine_units.max(1);
    let carriages: u32 = model
        .carriages
        .iter()
        .map(|c| {
            let per_unit = source
                .vehicle_model(c.model)
                .map_or(0, |m| m.passenger_capacity);
            c.count.saturating_mul(per_unit)
        })
        .fold(0, u32::saturating_add);

    model
        .passenger_capacity
        .saturating_mul(units)
        .saturating_add(carriages)
}

/// Normalize a route's raw counts into a `RouteSnapshot`.
pub fn build_snapshot<S: TelemetrySource + ?Sized>(
    route: &TransitRoute,
    source: &S,
    waiting_weight: f64,
) -> RouteSnapshot {
    let capacity = capacity_per_vehicle(route, source);

    let mut onboard = 0u32;
    let mut empty = 0u32;
    for vehicle in &route.vehicles {
        match vehicle.passengers {
            Some(0) | None => empty += 1,
            Some(n) => onboard = onboard.saturating_add(n),
        }
    }

    let mut waiting = 0u32;
    let mut busiest: Option<BusiestStop> = None;
    for waypoint in &route.waypoints {
        let Some(count) = waypoint.waiting else {
            continue;
        };
        waiting = waiting.saturating_add(count);
        let Some(stop) = waypoint.stop else {
            continue;
        };
        // Strictly greater: ties keep the earlier stop, and an empty stop
        // never becomes the busiest.
        if count > busiest.map_or(0, |b| b.waiting) {
            busiest = Some(BusiestStop {
                stop,
                waiting: count,
            });
        }
    }

    let vehicle_count = route.vehicles.len() as u32;
    let mut snapshot = RouteSnapshot {
        vehicle_count,
        empty_vehicles: empty,
        onboard,
        waiting,
        capacity_per_vehicle: capacity,
        busiest_stop: busiest,
        weighted_ratio: 0.0,
        carries_passengers: route.carries_passengers,
    };

    let denominator = f64::from(vehicle_count) * f64::from(capacity);
    if denominator > 0.0 {
        snapshot.weighted_ratio = snapshot.weighted_load(waiting_weight) / denominator;
    }
    snapshot
}
