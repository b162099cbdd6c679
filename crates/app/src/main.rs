use bevy::log::LogPlugin;
use bevy::prelude::*;

use smart_transit::settings::TransitSettings;

mod command_loop;

/// Path of an optional JSON settings override.
const SETTINGS_ENV: &str = "TRANSIT_SETTINGS";

fn load_settings() -> TransitSettings {
    let Ok(path) = std::env::var(SETTINGS_ENV) else {
        return TransitSettings::default();
    };
    let json = match std::fs::read_to_string(&path) {
        Ok(json) => json,
        Err(e) => {
            warn!("{SETTINGS_ENV}: cannot read {path}: {e}; using defaults");
            return TransitSettings::default();
        }
    };
    match TransitSettings::from_json_str(&json) {
        Ok(settings) => {
            info!("Loaded transit settings from {path}");
            settings
        }
        Err(e) => {
            warn!("{SETTINGS_ENV}: {path} is not valid settings JSON: {e}; using defaults");
            TransitSettings::default()
        }
    }
}

fn main() {
    let mut app = App::new();
    // LogPlugin writes to stderr, keeping stdout for the protocol.
    app.add_plugins((MinimalPlugins, LogPlugin::default()));

    let settings = load_settings();
    command_loop::install(&mut app, settings);

    // Initial update so startup systems run and resources initialize.
    app.update();

    command_loop::run_command_loop(&mut app);
}
