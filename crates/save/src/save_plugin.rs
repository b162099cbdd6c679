use std::path::PathBuf;

use bevy::prelude::*;
use smart_transit::notifications::NotificationEvent;
use smart_transit::SaveableRegistry;

use crate::save_codec::{load_from_path, save_to_path};

const NOTIFICATION_SENDER: &str = "Save";

// ---------------------------------------------------------------------------
// Resources and events
// ---------------------------------------------------------------------------

/// Where saves go when an event does not name a path.
#[derive(Resource, Debug, Clone)]
pub struct SaveFilePath(pub PathBuf);

impl Default for SaveFilePath {
    fn default() -> Self {
        Self(PathBuf::from("smart_transit_save.bin"))
    }
}

#[derive(Event, Debug, Clone, Default)]
pub struct SaveTransitEvent {
    pub path: Option<PathBuf>,
}

#[derive(Event, Debug, Clone, Default)]
pub struct LoadTransitEvent {
    pub path: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Plugin
// ---------------------------------------------------------------------------

pub struct SavePlugin;

impl Plugin for SavePlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<SaveTransitEvent>()
            .add_event::<LoadTransitEvent>()
            .init_resource::<SaveableRegistry>()
            .init_resource::<SaveFilePath>()
            .add_systems(Update, (handle_save_events, handle_load_events).chain());
    }
}

// ---------------------------------------------------------------------------
// Exclusive handlers
// ---------------------------------------------------------------------------

fn requested_paths<E: Event>(world: &mut World, path_of: fn(&E) -> Option<PathBuf>) -> Vec<PathBuf> {
    let default = world.resource::<SaveFilePath>().0.clone();
    world
        .resource_mut::<Events<E>>()
        .drain()
        .map(|event| path_of(&event).unwrap_or_else(|| default.clone()))
        .collect()
}

/// Failures become warning notifications instead of being swallowed.
fn handle_save_events(world: &mut World) {
    for path in requested_paths::<SaveTransitEvent>(world, |e| e.path.clone()) {
        if let Err(e) = save_to_path(world, &path) {
            let msg = format!("Save failed: {e}");
            error!("{msg}");
            world.send_event(NotificationEvent::warning(msg, NOTIFICATION_SENDER));
        }
    }
}

fn handle_load_events(world: &mut World) {
    // Only the most recent request matters; earlier loads would be overwritten.
    let Some(path) = requested_paths::<LoadTransitEvent>(world, |e| e.path.clone()).pop() else {
        return;
    };
    if let Err(e) = load_from_path(world, &path) {
        let msg = format!("Load failed: {e}");
        error!("{msg}");
        world.send_event(NotificationEvent::warning(msg, NOTIFICATION_SENDER));
    }
}
