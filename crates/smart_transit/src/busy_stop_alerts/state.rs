use std::collections::HashMap;

use bevy::prelude::*;

use super::sink::{AlertSink, TransitAlert};
use crate::ids::{RouteKey, StopId};
use crate::occupancy_controller::is_route_overloaded;
use crate::settings::TransitSettings;
use crate::telemetry::RouteSnapshot;

/// Latch for one stop; present while its alert condition has not cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertLatch {
    pub route: RouteKey,
    pub waiting_at_trigger: u32,
}

/// What one evaluation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertOutcome {
    /// The route has no stop with waiting passengers.
    NoStop,
    /// The stop vanished from the host; its latch was dropped.
    StopGone,
    /// Alert posted and latch set.
    Emitted,
    /// Route overload alone armed the latch without a message.
    Armed,
    /// Condition holds but the stop is already latched.
    Held,
    /// Condition holds but this cycle's alert budget is spent.
    BudgetExhausted,
    /// The stop is busy but the sink is unavailable; nothing changed.
    SinkUnavailable,
    /// Both exit conditions held; latch removed.
    Cleared,
    /// Nothing to do.
    Quiet,
}

/// Per-route inputs for one evaluation.
#[derive(Debug, Clone, Copy)]
pub struct AlertInput<'a> {
    pub route: RouteKey,
    pub snapshot: &'a RouteSnapshot,
    pub occupancy_target_pct: i32,
    pub threshold_pct: f64,
}

/// Hysteresis state machine for busy-stop alerts.
///
/// A stop latches when it becomes busy (`waiting >= capacity * enter%`) or
/// its route runs above the very-high band, and unlatches only once waiting
/// drops to `capacity * exit%` while the route is no longer overloaded. At
/// most `max_per_cycle` messages go out per controller pass.
#[derive(Resource, Debug)]
pub struct BusyStopAlerter {
    latches: HashMap<StopId, AlertLatch>,
    remaining: u32,
    max_per_cycle: u32,
    enter_pct: u32,
    exit_pct: u32,
}

impl Default for BusyStopAlerter {
    fn default() -> Self {
        Self::from_settings(&TransitSettings::default())
    }
}

impl BusyStopAlerter {
    pub fn new(enter_pct: u32, exit_pct: u32, max_per_cycle: u32) -> Self {
        Self {
            latches: HashMap::new(),
            remaining: max_per_cycle,
            max_per_cycle,
            enter_pct,
            exit_pct: exit_pct.min(enter_pct),
        }
    }

    pub fn from_settings(settings: &TransitSettings) -> Self {
        Self::new(
            settings.busy_stop_enter_pct,
            settings.busy_stop_exit_pct,
            settings.max_alerts_per_cycle,
        )
    }

    /// Pick up new thresholds without dropping existing latches.
    pub fn configure(&mut self, settings: &TransitSettings) {
        self.enter_pct = settings.busy_stop_enter_pct;
        self.exit_pct = settings.busy_stop_exit_pct.min(self.enter_pct);
        self.max_per_cycle = settings.max_alerts_per_cycle;
    }

    /// Refill the alert budget. Called once at the start of every pass.
    pub fn begin_cycle(&mut self) {
        self.remaining = self.max_per_cycle;
    }

    pub fn remaining_budget(&self) -> u32 {
        self.remaining
    }

    pub fn is_latched(&self, stop: StopId) -> bool {
        self.latches.contains_key(&stop)
    }

    pub fn latch(&self, stop: StopId) -> Option<&AlertLatch> {
        self.latches.get(&stop)
    }

    pub fn latch_count(&self) -> usize {
        self.latches.len()
    }

    /// Drop latches of stops the host no longer has.
    pub fn retain_existing(&mut self, mut exists: impl FnMut(StopId) -> bool) {
        self.latches.retain(|stop, _| exists(*stop));
    }

    /// Evaluate the busiest stop of one route.
    pub fn evaluate(
        &mut self,
        input: &AlertInput<'_>,
        stop_exists: impl Fn(StopId) -> bool,
        sink: &mut impl AlertSink,
    ) -> AlertOutcome {
        let Some(busiest) = input.snapshot.busiest_stop else {
            return AlertOutcome::NoStop;
        };
        if !stop_exists(busiest.stop) {
            self.latches.remove(&busiest.stop);
            return AlertOutcome::StopGone;
        }

        let capacity = u64::from(input.snapshot.capacity_per_vehicle);
        let waiting = u64::from(busiest.waiting);
        let is_busy = waiting * 100 >= capacity * u64::from(self.enter_pct);
        let is_overloaded = is_route_overloaded(
            input.snapshot.weighted_ratio,
            input.occupancy_target_pct,
            input.threshold_pct,
        );
        let latched = self.latches.contains_key(&busiest.stop);

        if is_busy || is_overloaded {
            if latched {
                return AlertOutcome::Held;
            }
            if self.remaining == 0 {
                return AlertOutcome::BudgetExhausted;
            }
            let latch = AlertLatch {
                route: input.route,
                waiting_at_trigger: busiest.waiting,
            };
            if !is_busy {
                self.latches.insert(busiest.stop, latch);
                return AlertOutcome::Armed;
            }
            if !sink.is_available() {
                return AlertOutcome::SinkUnavailable;
            }
            sink.post_alert(TransitAlert::busy_stop(
                input.route,
                busiest.stop,
                busiest.waiting,
            ));
            self.latches.insert(busiest.stop, latch);
            self.remaining -= 1;
            debug!(
                "busy stop alert for {} at stop {:?} ({} waiting)",
                input.route, busiest.stop, busiest.waiting
            );
            return AlertOutcome::Emitted;
        }

        if latched {
            if waiting * 100 <= capacity * u64::from(self.exit_pct) && !is_overloaded {
                self.latches.remove(&busiest.stop);
                return AlertOutcome::Cleared;
            }
            return AlertOutcome::Held;
        }
        AlertOutcome::Quiet
    }
}
