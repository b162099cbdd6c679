//! Rule registry.
//!
//! Named, reusable policy rules keyed by an opaque 128-bit `RuleId`. The
//! store owns id generation, built-in rule synchronization from
//! `TransitSettings` and the persisted record layout. Refusing to delete a
//! built-in rule is left to callers (see `commands::remove_custom_rule`).

pub mod persistence;
pub mod store;
pub mod types;

pub use persistence::{StoredRule, RULE_SCHEMA_VERSION};
pub use store::RuleStore;
pub use types::*;
