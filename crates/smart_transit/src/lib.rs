use bevy::prelude::*;
use std::collections::BTreeMap;

pub mod busy_stop_alerts;
pub mod commands;
pub mod driver;
pub mod error;
pub mod ids;
pub mod notifications;
pub mod occupancy_controller;
pub mod protocol;
pub mod route_bindings;
pub mod rule_store;
pub mod settings;
pub mod telemetry;

#[cfg(test)]
mod integration_tests;
#[cfg(any(test, feature = "bench"))]
pub mod test_harness;

pub use error::TransitError;
pub use ids::{RouteKey, RuleId, StopId, TransportType};

use busy_stop_alerts::{AlertChannel, BusyStopAlerter};
use driver::{
    advance_controller_schedule, controller_due, run_controller, sync_builtin_rules,
    ControllerSchedule, LastPassReport, TransitSet,
};
use notifications::{collect_notifications, NotificationEvent, NotificationLog};
use route_bindings::RouteBindings;
use rule_store::RuleStore;
use settings::TransitSettings;
use telemetry::TransitNetwork;

// ---------------------------------------------------------------------------
// Saveable trait + registry for the extension map save pattern
// ---------------------------------------------------------------------------

/// A resource that persists itself into the save file's extension map.
///
/// Registering a type with `SaveableRegistry` is all the save crate needs;
/// it never names individual resources.
pub trait Saveable: Resource + Default + Send + Sync + 'static {
    /// Key in the extension map. Must stay stable across versions.
    const SAVE_KEY: &'static str;

    /// Return `None` to skip saving (e.g. when the resource is at its default state).
    fn save_to_bytes(&self) -> Option<Vec<u8>>;

    fn load_from_bytes(bytes: &[u8]) -> Self;
}

/// Decode bytes via `bitcode::decode`, logging a warning and returning `Default` on failure.
pub fn decode_or_warn<T: bitcode::DecodeOwned + Default>(key: &str, bytes: &[u8]) -> T {
    match bitcode::decode(bytes) {
        Ok(v) => v,
        Err(e) => {
            warn!(
                "Saveable {}: failed to decode {} bytes, falling back to default: {}",
                key,
                bytes.len(),
                e
            );
            T::default()
        }
    }
}

pub type SaveFn = Box<dyn Fn(&World) -> Option<Vec<u8>> + Send + Sync>;
pub type LoadFn = Box<dyn Fn(&mut World, &[u8]) + Send + Sync>;
pub type ResetFn = Box<dyn Fn(&mut World) + Send + Sync>;

/// Type-erased save/load/reset operations for a single registered resource.
pub struct SaveableEntry {
    pub key: String,
    pub save_fn: SaveFn,
    pub load_fn: LoadFn,
    pub reset_fn: ResetFn,
}

#[derive(Resource, Default)]
pub struct SaveableRegistry {
    pub entries: Vec<SaveableEntry>,
}

impl SaveableRegistry {
    /// Register a resource type that implements `Saveable`.
    ///
    /// Panics in debug builds if the `SAVE_KEY` is already taken.
    pub fn register<T: Saveable>(&mut self) {
        let key = T::SAVE_KEY.to_string();
        if self.entries.iter().any(|e| e.key == key) {
            warn!("SaveableRegistry: duplicate key '{}', ignoring", key);
            debug_assert!(false, "SaveableRegistry: duplicate key '{}'", key);
            return;
        }
        self.entries.push(SaveableEntry {
            key,
            save_fn: Box::new(|world: &World| {
                world.get_resource::<T>().and_then(|r| r.save_to_bytes())
            }),
            load_fn: Box::new(|world: &mut World, bytes: &[u8]| {
                world.insert_resource(T::load_from_bytes(bytes));
            }),
            reset_fn: Box::new(|world: &mut World| {
                world.insert_resource(T::default());
            }),
        });
    }

    pub fn save_all(&self, world: &World) -> BTreeMap<String, Vec<u8>> {
        let mut extensions = BTreeMap::new();
        for entry in &self.entries {
            if let Some(bytes) = (entry.save_fn)(world) {
                extensions.insert(entry.key.clone(), bytes);
            }
        }
        extensions
    }

    /// Load registered resources from an extension map. Absent keys leave
    /// the resource unchanged.
    pub fn load_all(&self, world: &mut World, extensions: &BTreeMap<String, Vec<u8>>) {
        for entry in &self.entries {
            if let Some(bytes) = extensions.get(&entry.key) {
                (entry.load_fn)(world, bytes);
            }
        }
    }

    pub fn reset_all(&self, world: &mut World) {
        for entry in &self.entries {
            (entry.reset_fn)(world);
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.key.as_str())
    }
}

// ---------------------------------------------------------------------------
// Core resources
// ---------------------------------------------------------------------------

/// Fixed ticks since startup.
#[derive(Resource, Default)]
pub struct TickCounter(pub u64);

pub struct SmartTransitPlugin;

impl Plugin for SmartTransitPlugin {
    fn build(&self, app: &mut App) {
        // Settings may already be inserted by the host from an override file.
        app.init_resource::<TransitSettings>()
            .init_resource::<TickCounter>()
            .init_resource::<RuleStore>()
            .init_resource::<RouteBindings>()
            .init_resource::<TransitNetwork>()
            .init_resource::<BusyStopAlerter>()
            .init_resource::<AlertChannel>()
            .init_resource::<ControllerSchedule>()
            .init_resource::<LastPassReport>()
            .init_resource::<NotificationLog>()
            .add_event::<NotificationEvent>()
            .configure_sets(
                FixedUpdate,
                (TransitSet::Prepare, TransitSet::Control, TransitSet::Report).chain(),
            )
            .add_systems(
                FixedUpdate,
                (advance_controller_schedule, sync_builtin_rules)
                    .chain()
                    .in_set(TransitSet::Prepare),
            )
            .add_systems(
                FixedUpdate,
                run_controller
                    .run_if(controller_due)
                    .in_set(TransitSet::Control),
            )
            .add_systems(
                FixedUpdate,
                collect_notifications.in_set(TransitSet::Report),
            );

        app.init_resource::<SaveableRegistry>();
        let mut registry = app.world_mut().resource_mut::<SaveableRegistry>();
        registry.register::<TransitSettings>();
        registry.register::<RuleStore>();
        registry.register::<RouteBindings>();
    }
}
