use bevy::prelude::*;

use crate::settings::TransitSettings;

/// Ordered phases of the controller in `FixedUpdate`.
///
/// Configured as a chain: `Prepare` → `Control` → `Report`.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum TransitSet {
    /// Tick counters, schedule and built-in rule sync.
    Prepare,
    /// The controller pass itself.
    Control,
    /// Notification collection.
    Report,
}

/// Fixed-tick countdown to the next controller pass.
///
/// The interval is `base_interval_ticks / update_frequency.divisor()`; the
/// pass runs on every tick whose count is a multiple of it.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerSchedule {
    pub counter: u32,
    interval: u32,
}

impl Default for ControllerSchedule {
    fn default() -> Self {
        Self::new(TransitSettings::default().controller_interval())
    }
}

impl ControllerSchedule {
    pub fn new(interval: u32) -> Self {
        Self {
            counter: 0,
            interval: interval.max(1),
        }
    }

    pub fn interval(&self) -> u32 {
        self.interval
    }

    /// Pick up a new interval. The counter restarts so a shorter interval
    /// does not fire immediately on a stale count.
    pub fn set_interval(&mut self, interval: u32) {
        let interval = interval.max(1);
        if interval != self.interval {
            self.interval = interval;
            self.counter = 0;
        }
    }

    pub fn tick(&mut self) {
        self.counter = self.counter.wrapping_add(1);
    }

    pub fn should_run(&self) -> bool {
        self.counter != 0 && self.counter % self.interval == 0
    }

    pub fn ticks_until_due(&self) -> u32 {
        self.interval - self.counter % self.interval
    }
}

/// Run condition for the controller pass.
pub fn controller_due(schedule: Res<ControllerSchedule>) -> bool {
    schedule.should_run()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_interval_follows_settings() {
        let schedule = ControllerSchedule::default();
        assert_eq!(schedule.interval(), 16_384 / 32);
    }

    #[test]
    fn test_runs_every_interval_ticks() {
        let mut schedule = ControllerSchedule::new(4);
        let due: Vec<bool> = (0..9)
            .map(|_| {
                schedule.tick();
                schedule.should_run()
            })
            .collect();
        assert_eq!(
            due,
            vec![false, false, false, true, false, false, false, true, false]
        );
    }

    #[test]
    fn test_interval_change_restarts_count() {
        let mut schedule = ControllerSchedule::new(8);
        for _ in 0..5 {
            schedule.tick();
        }
        schedule.set_interval(4);
        assert!(!schedule.should_run());
        assert_eq!(schedule.ticks_until_due(), 4);
    }
}
