// ---------------------------------------------------------------------------
// Save migration steps
// ---------------------------------------------------------------------------
//
// Extension payloads are self-describing (each `Saveable` decodes its own
// legacy records, e.g. 32-bit rule ids), so a step only has to touch the
// container when the set of extension keys changes.

use crate::save_error::SaveError;
pub use crate::save_migrate_registry::MigrationReport;
use crate::save_migrate_registry::{MigrationRegistry, MigrationStep};
use crate::save_types::{TransitSaveData, CURRENT_SAVE_VERSION};

pub(crate) fn build_migration_registry() -> MigrationRegistry {
    let steps = vec![
        // v0 -> v1: stamp a version on saves written before versioning.
        MigrationStep {
            from_version: 0,
            description: "Unversioned save -> v1 baseline",
            migrate_fn: |_save| {},
        },
    ];
    MigrationRegistry::new(steps, CURRENT_SAVE_VERSION)
}

/// Bring `save` up to `CURRENT_SAVE_VERSION`.
pub fn migrate_save(save: &mut TransitSaveData) -> Result<MigrationReport, SaveError> {
    build_migration_registry().migrate(save)
}
