// ---------------------------------------------------------------------------
// Migration registry: a validated, contiguous chain of version steps
// ---------------------------------------------------------------------------
//
// Each step is a `fn(&mut TransitSaveData)` taking a save from version N to
// N+1. The registry checks at construction that steps cover every version
// from 0 up to the target with no gaps or duplicates.

use std::collections::BTreeSet;

use crate::save_error::SaveError;
use crate::save_types::TransitSaveData;

pub(crate) struct MigrationStep {
    pub from_version: u32,
    pub description: &'static str,
    pub migrate_fn: fn(&mut TransitSaveData),
}

/// What the migration chain did to a loaded save.
#[derive(Debug, Clone)]
pub struct MigrationReport {
    pub original_version: u32,
    pub final_version: u32,
    pub steps_applied: u32,
    /// Descriptions of each applied step, in order.
    pub step_descriptions: Vec<&'static str>,
}

pub(crate) struct MigrationRegistry {
    steps: Vec<MigrationStep>,
    current_version: u32,
}

impl MigrationRegistry {
    /// # Panics
    ///
    /// Panics if two steps share a source version or if any version between
    /// 0 and `current_version - 1` has no step.
    pub fn new(mut steps: Vec<MigrationStep>, current_version: u32) -> Self {
        let mut seen = BTreeSet::new();
        for step in &steps {
            assert!(
                seen.insert(step.from_version),
                "Duplicate migration step for version {}",
                step.from_version
            );
        }
        for v in 0..current_version {
            assert!(
                seen.contains(&v),
                "Missing migration step from v{} to v{}",
                v,
                v + 1
            );
        }

        steps.sort_by_key(|s| s.from_version);
        Self {
            steps,
            current_version,
        }
    }

    /// Run every step from the save's version up to the target.
    ///
    /// # Errors
    ///
    /// `SaveError::VersionMismatch` if the save is from a future version.
    pub fn migrate(&self, save: &mut TransitSaveData) -> Result<MigrationReport, SaveError> {
        let original_version = save.version;
        if save.version > self.current_version {
            return Err(SaveError::VersionMismatch {
                expected_max: self.current_version,
                found: save.version,
            });
        }

        let mut step_descriptions = Vec::new();
        for step in &self.steps {
            if save.version >= self.current_version {
                break;
            }
            if step.from_version == save.version {
                (step.migrate_fn)(save);
                save.version = step.from_version + 1;
                step_descriptions.push(step.description);
            }
        }

        if save.version != self.current_version {
            return Err(SaveError::MigrationFailed(format!(
                "chain stopped at v{} instead of v{}",
                save.version, self.current_version
            )));
        }

        Ok(MigrationReport {
            original_version,
            final_version: save.version,
            steps_applied: step_descriptions.len() as u32,
            step_descriptions,
        })
    }

    #[cfg(test)]
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }
}
