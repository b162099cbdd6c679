//! Controller scheduling and the per-pass driver.
//!
//! Once every `controller_interval()` fixed ticks the pass walks all routes:
//! resolve the effective rule, build the snapshot, evaluate busy-stop alerts,
//! decide, and write changed values through the policy sink. Passes never
//! overlap; the schedule only fires on whole intervals.

pub mod pass;
pub mod schedule;
pub mod systems;
mod tests;

pub use pass::{run_controller_pass, LastPassReport, PassContext, PassReport, RouteChange};
pub use schedule::{controller_due, ControllerSchedule, TransitSet};
pub use systems::{advance_controller_schedule, run_controller, sync_builtin_rules};
