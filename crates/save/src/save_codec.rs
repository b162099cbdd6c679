// ---------------------------------------------------------------------------
// save_codec: world <-> save bytes <-> file
// ---------------------------------------------------------------------------
//
// Save:  SaveableRegistry::save_all -> TransitSaveData -> bitcode -> header
// Load:  header check -> bitcode -> migrate -> reset_all -> load_all

use std::path::Path;

use bevy::prelude::*;
use smart_transit::rule_store::RuleStore;
use smart_transit::settings::TransitSettings;
use smart_transit::SaveableRegistry;

use crate::atomic_write::atomic_write;
use crate::file_header::{unwrap_header, wrap_with_header, UnwrapResult};
use crate::save_error::SaveError;
use crate::save_migrate::{migrate_save, MigrationReport};
use crate::save_types::TransitSaveData;

/// Encode every registered `Saveable` into a headed save file image.
pub fn encode_world(world: &World) -> Result<Vec<u8>, SaveError> {
    let registry = world
        .get_resource::<SaveableRegistry>()
        .ok_or_else(|| SaveError::MissingResource("SaveableRegistry".to_string()))?;
    let data = TransitSaveData::new(registry.save_all(world));
    Ok(wrap_with_header(&data.encode()))
}

/// Validate, decode and migrate a save file image.
pub fn decode_save(bytes: &[u8]) -> Result<(TransitSaveData, MigrationReport), SaveError> {
    if bytes.is_empty() {
        return Err(SaveError::NoData);
    }

    let payload = match unwrap_header(bytes)? {
        UnwrapResult::WithHeader { header, payload } => {
            debug!(
                "Save file header: format v{}, timestamp {}, payload {} bytes, checksum {:#010X}",
                header.format_version, header.timestamp, header.payload_size, header.checksum,
            );
            payload
        }
        UnwrapResult::Legacy(payload) => {
            info!("Loading legacy transit save (no header)");
            payload
        }
    };

    let mut save = TransitSaveData::decode(payload)?;
    let report = migrate_save(&mut save)?;
    if report.steps_applied > 0 {
        info!(
            "Migrated transit save from v{} to v{} ({} steps applied)",
            report.original_version, report.final_version, report.steps_applied,
        );
        for desc in &report.step_descriptions {
            info!("  - {desc}");
        }
    }
    Ok((save, report))
}

/// Replace the persisted resources with the contents of `save`.
///
/// Every registered resource is reset first, so keys missing from the save
/// come back at their defaults. Built-in rules are re-derived from the
/// loaded settings before returning.
pub fn apply_save(world: &mut World, save: &TransitSaveData) -> Result<(), SaveError> {
    let registry = world
        .remove_resource::<SaveableRegistry>()
        .ok_or_else(|| SaveError::MissingResource("SaveableRegistry".to_string()))?;
    registry.reset_all(world);
    registry.load_all(world, &save.extensions);
    world.insert_resource(registry);

    if world.contains_resource::<TransitSettings>() && world.contains_resource::<RuleStore>() {
        world.resource_scope(|world, mut rules: Mut<RuleStore>| {
            rules.sync_defaults_from_config(world.resource::<TransitSettings>());
        });
    }
    Ok(())
}

/// Write the current state to `path` atomically. Returns the file size.
pub fn save_to_path(world: &World, path: impl AsRef<Path>) -> Result<usize, SaveError> {
    let path = path.as_ref();
    let bytes = encode_world(world)?;
    atomic_write(path, &bytes)?;
    info!("Saved transit state to {} ({} bytes)", path.display(), bytes.len());
    Ok(bytes.len())
}

/// Read, migrate and apply the save at `path`.
pub fn load_from_path(
    world: &mut World,
    path: impl AsRef<Path>,
) -> Result<MigrationReport, SaveError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    let (save, report) = decode_save(&bytes)?;
    apply_save(world, &save)?;
    info!("Loaded transit state from {}", path.display());
    Ok(report)
}
