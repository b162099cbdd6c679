//! Integration tests for the transit controller using the `TestTransit`
//! harness.
//!
//! These run the full plugin in a headless App and check behavior that spans
//! the schedule, the rule store, bindings, alerts and notifications.

mod payload_tests;
mod schedule_tests;
