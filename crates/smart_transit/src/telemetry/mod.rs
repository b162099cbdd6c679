//! Route telemetry.
//!
//! The host world is reached only through the `TelemetrySource` and
//! `PolicySink` traits. `TransitNetwork` is the in-memory implementation the
//! headless driver and the tests use. `build_snapshot` is the pure read path
//! that turns raw per-route counts into a `RouteSnapshot`.

pub mod network;
pub mod snapshot;
pub mod types;

pub use network::{PolicySink, TelemetrySource, TransitNetwork};
pub use snapshot::{build_snapshot, capacity_per_vehicle};
pub use types::*;
