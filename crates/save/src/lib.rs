//! Save-file container for the smart transit controller.
//!
//! A save is the `SaveableRegistry` extension map wrapped in a
//! `TransitSaveData`, bitcode-encoded and prefixed with a checksummed
//! header. Older saves are brought forward by the migration registry
//! before any resource is touched.

mod atomic_write;
pub mod file_header;
pub mod save_codec;
pub mod save_error;
mod save_migrate;
mod save_migrate_registry;
mod save_plugin;
mod save_types;

pub use save_codec::{load_from_path, save_to_path};
pub use save_error::SaveError;
pub use save_migrate::{migrate_save, MigrationReport};
pub use save_plugin::{LoadTransitEvent, SaveFilePath, SavePlugin, SaveTransitEvent};
pub use save_types::{TransitSaveData, CURRENT_SAVE_VERSION};
