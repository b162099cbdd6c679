//! Busy-stop alerts.
//!
//! Emits at most a configured number of "stop is very busy" alerts per
//! controller pass, with enter/exit hysteresis per stop so a stop hovering
//! around the threshold does not spam the player.

pub mod sink;
pub mod state;

pub use sink::{AlertBuffer, AlertChannel, AlertSink, TransitAlert, ALERT_SOURCE_LABEL};
pub use state::{AlertInput, AlertLatch, AlertOutcome, BusyStopAlerter};
