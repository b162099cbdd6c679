//! Controller configuration.
//!
//! `TransitSettings` is the read-only configuration source for the whole
//! controller: per-transport-type defaults (collapsed into one
//! `TransportTable` so lookups never branch on the type), the global control
//! thresholds, the update cadence and the busy-stop alert parameters. The
//! binary loads it from JSON; saves carry it through the `Saveable` registry.

use std::ops::RangeInclusive;

use bevy::prelude::*;
use bitcode::{Decode, Encode};
use serde::{Deserialize, Serialize};

use crate::error::TransitError;
use crate::ids::TransportType;

// =============================================================================
// Per-type defaults
// =============================================================================

/// Allowed range of `max_ticket_increase_pct`, for defaults and custom rules.
pub const TICKET_INCREASE_RANGE: RangeInclusive<i32> = 0..=300;

/// Allowed range of the two vehicle adjustment percentages.
pub const VEHICLE_ADJ_RANGE: RangeInclusive<i32> = -50..=100;

/// Default rule values for one transport type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
#[serde(default)]
pub struct TransportDefaults {
    pub occupancy_pct: i32,
    pub standard_ticket: i32,
    pub max_ticket_increase_pct: i32,
    pub max_ticket_discount_pct: i32,
    pub max_vehicle_adj_pct: i32,
    pub min_vehicle_adj_pct: i32,
    /// Routes of a disabled type are never adjusted.
    pub disabled: bool,
}

impl Default for TransportDefaults {
    fn default() -> Self {
        Self::new(30, 8, 20, 40, 0, 25)
    }
}

impl TransportDefaults {
    const fn new(
        occupancy_pct: i32,
        standard_ticket: i32,
        max_ticket_increase_pct: i32,
        max_ticket_discount_pct: i32,
        max_vehicle_adj_pct: i32,
        min_vehicle_adj_pct: i32,
    ) -> Self {
        Self {
            occupancy_pct,
            standard_ticket,
            max_ticket_increase_pct,
            max_ticket_discount_pct,
            max_vehicle_adj_pct,
            min_vehicle_adj_pct,
            disabled: false,
        }
    }

    fn sanitize(&mut self) {
        self.occupancy_pct = self.occupancy_pct.clamp(10, 90);
        self.standard_ticket = self.standard_ticket.clamp(0, 30);
        self.max_ticket_increase_pct = clamp_to(self.max_ticket_increase_pct, &TICKET_INCREASE_RANGE);
        self.max_ticket_discount_pct = self.max_ticket_discount_pct.clamp(0, 100);
        self.max_vehicle_adj_pct = clamp_to(self.max_vehicle_adj_pct, &VEHICLE_ADJ_RANGE);
        self.min_vehicle_adj_pct = clamp_to(self.min_vehicle_adj_pct, &VEHICLE_ADJ_RANGE);
    }
}

pub fn clamp_to(value: i32, range: &RangeInclusive<i32>) -> i32 {
    value.clamp(*range.start(), *range.end())
}

/// One `TransportDefaults` per transport type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
#[serde(default)]
pub struct TransportTable {
    pub bus: TransportDefaults,
    pub tram: TransportDefaults,
    pub subway: TransportDefaults,
    pub train: TransportDefaults,
    pub ship: TransportDefaults,
    pub airplane: TransportDefaults,
    pub ferry: TransportDefaults,
}

impl Default for TransportTable {
    fn default() -> Self {
        Self {
            bus: TransportDefaults::new(30, 8, 20, 40, 0, 25),
            tram: TransportDefaults::new(40, 8, 30, 20, 0, 30),
            subway: TransportDefaults::new(50, 9, 40, 20, 0, -20),
            train: TransportDefaults::new(60, 10, 40, 20, 0, 30),
            ship: TransportDefaults::new(65, 12, 40, 20, 50, 30),
            airplane: TransportDefaults::new(70, 20, 60, 30, 30, 40),
            ferry: TransportDefaults::new(40, 8, 30, 30, 30, 40),
        }
    }
}

impl TransportTable {
    pub fn get(&self, transport_type: TransportType) -> &TransportDefaults {
        match transport_type {
            TransportType::Bus => &self.bus,
            TransportType::Tram => &self.tram,
            TransportType::Subway => &self.subway,
            TransportType::Train => &self.train,
            TransportType::Ship => &self.ship,
            TransportType::Airplane => &self.airplane,
            TransportType::Ferry => &self.ferry,
        }
    }

    pub fn get_mut(&mut self, transport_type: TransportType) -> &mut TransportDefaults {
        match transport_type {
            TransportType::Bus => &mut self.bus,
            TransportType::Tram => &mut self.tram,
            TransportType::Subway => &mut self.subway,
            TransportType::Train => &mut self.train,
            TransportType::Ship => &mut self.ship,
            TransportType::Airplane => &mut self.airplane,
            TransportType::Ferry => &mut self.ferry,
        }
    }
}

// =============================================================================
// Update cadence
// =============================================================================

/// How often the controller pass runs, in in-game minutes per pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Encode, Decode)]
pub enum UpdateFrequency {
    Min22,
    #[default]
    Min45,
    Min90,
}

impl UpdateFrequency {
    /// Divisor applied to the base interval.
    pub fn divisor(self) -> u32 {
        match self {
            UpdateFrequency::Min22 => 64,
            UpdateFrequency::Min45 => 32,
            UpdateFrequency::Min90 => 16,
        }
    }
}

// =============================================================================
// Settings resource
// =============================================================================

#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode)]
#[serde(default)]
pub struct TransitSettings {
    pub transport: TransportTable,
    /// Weight of a waiting passenger relative to an onboard one.
    pub waiting_weight: f64,
    /// Margin around the occupancy target, in percentage points.
    pub threshold_pct: f64,
    pub update_frequency: UpdateFrequency,
    /// Ticks per day-equivalent; the pass interval is this divided by the
    /// update frequency divisor.
    pub base_interval_ticks: u32,
    /// Largest fleet change per pass, as a percentage of the previous count.
    pub rate_limit_pct: u32,
    /// Share of empty vehicles above which fleet reductions are suppressed.
    pub idle_brake_ratio: f64,
    pub alerts_enabled: bool,
    pub busy_stop_enter_pct: u32,
    pub busy_stop_exit_pct: u32,
    pub max_alerts_per_cycle: u32,
    /// Log every route change at info level.
    pub debug_log: bool,
}

impl Default for TransitSettings {
    fn default() -> Self {
        Self {
            transport: TransportTable::default(),
            waiting_weight: 1.0,
            threshold_pct: 10.0,
            update_frequency: UpdateFrequency::Min45,
            base_interval_ticks: 16_384,
            rate_limit_pct: 10,
            idle_brake_ratio: 0.30,
            alerts_enabled: true,
            busy_stop_enter_pct: 70,
            busy_stop_exit_pct: 55,
            max_alerts_per_cycle: 1,
            debug_log: false,
        }
    }
}

impl TransitSettings {
    /// Parse settings from JSON. Missing fields keep their defaults and the
    /// result is sanitized.
    pub fn from_json_str(json: &str) -> Result<Self, TransitError> {
        let mut settings: TransitSettings = serde_json::from_str(json)?;
        settings.sanitize();
        Ok(settings)
    }

    /// Clamp every value into the range the settings UI allows.
    pub fn sanitize(&mut self) {
        for t in TransportType::ALL {
            self.transport.get_mut(t).sanitize();
        }
        if !self.waiting_weight.is_finite() {
            self.waiting_weight = 1.0;
        }
        self.waiting_weight = self.waiting_weight.clamp(0.0, 2.0);
        if !self.threshold_pct.is_finite() {
            self.threshold_pct = 10.0;
        }
        self.threshold_pct = self.threshold_pct.clamp(5.0, 25.0);
        if !self.idle_brake_ratio.is_finite() {
            self.idle_brake_ratio = 0.30;
        }
        self.idle_brake_ratio = self.idle_brake_ratio.clamp(0.0, 1.0);
        self.base_interval_ticks = self.base_interval_ticks.max(1);
        self.busy_stop_enter_pct = self.busy_stop_enter_pct.min(100);
        self.busy_stop_exit_pct = self.busy_stop_exit_pct.min(self.busy_stop_enter_pct);
    }

    /// Ticks between controller passes, never zero.
    pub fn controller_interval(&self) -> u32 {
        (self.base_interval_ticks / self.update_frequency.divisor()).max(1)
    }

    pub fn is_type_disabled(&self, transport_type: TransportType) -> bool {
        self.transport.get(transport_type).disabled
    }
}

impl crate::Saveable for TransitSettings {
    const SAVE_KEY: &'static str = "transit_settings";

    fn save_to_bytes(&self) -> Option<Vec<u8>> {
        if *self == Self::default() {
            return None;
        }
        Some(bitcode::encode(self))
    }

    fn load_from_bytes(bytes: &[u8]) -> Self {
        let mut settings: Self = crate::decode_or_warn(Self::SAVE_KEY, bytes);
        settings.sanitize();
        settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Saveable;

    #[test]
    fn test_default_table_matches_shipped_values() {
        let table = TransportTable::default();
        assert_eq!(table.get(TransportType::Subway).min_vehicle_adj_pct, -20);
        assert_eq!(table.get(TransportType::Ship).max_vehicle_adj_pct, 50);
        assert_eq!(table.get(TransportType::Airplane).standard_ticket, 20);
        assert_eq!(table.get(TransportType::Ferry).occupancy_pct, 40);
        assert!(TransportType::ALL
            .into_iter()
            .all(|t| !table.get(t).disabled));
    }

    #[test]
    fn test_controller_interval_follows_frequency() {
        let mut settings = TransitSettings::default();
        assert_eq!(settings.controller_interval(), 16_384 / 32);
        settings.update_frequency = UpdateFrequency::Min22;
        assert_eq!(settings.controller_interval(), 16_384 / 64);
        settings.update_frequency = UpdateFrequency::Min90;
        assert_eq!(settings.controller_interval(), 16_384 / 16);
        settings.base_interval_ticks = 3;
        assert_eq!(settings.controller_interval(), 1, "interval never reaches zero");
    }

    #[test]
    fn test_from_json_keeps_defaults_for_missing_fields() {
        let json = r#"{ "threshold_pct": 15.0, "transport": { "tram": { "disabled": true } } }"#;
        let settings = TransitSettings::from_json_str(json).unwrap();
        assert_eq!(settings.threshold_pct, 15.0);
        assert!(settings.is_type_disabled(TransportType::Tram));
        assert!(!settings.is_type_disabled(TransportType::Bus));
        assert_eq!(settings.busy_stop_enter_pct, 70);
        assert_eq!(settings.transport.bus.standard_ticket, 8);
    }

    #[test]
    fn test_from_json_rejects_malformed_input() {
        let result = TransitSettings::from_json_str("{ not json");
        assert!(matches!(result, Err(TransitError::InvalidPayload(_))));
    }

    #[test]
    fn test_sanitize_clamps_out_of_range_values() {
        let mut settings = TransitSettings {
            threshold_pct: 80.0,
            waiting_weight: f64::NAN,
            busy_stop_enter_pct: 60,
            busy_stop_exit_pct: 90,
            base_interval_ticks: 0,
            ..Default::default()
        };
        settings.transport.bus.max_ticket_discount_pct = 250;
        settings.sanitize();
        assert_eq!(settings.threshold_pct, 25.0);
        assert_eq!(settings.waiting_weight, 1.0);
        assert_eq!(settings.busy_stop_exit_pct, 60, "exit never exceeds enter");
        assert_eq!(settings.base_interval_ticks, 1);
        assert_eq!(settings.transport.bus.max_ticket_discount_pct, 100);
    }

    #[test]
    fn test_saveable_skips_defaults_and_restores_changes() {
        assert!(TransitSettings::default().save_to_bytes().is_none());
        let mut settings = TransitSettings::default();
        settings.transport.train.disabled = true;
        settings.rate_limit_pct = 25;
        let bytes = settings.save_to_bytes().expect("non-default settings are saved");
        let restored = TransitSettings::load_from_bytes(&bytes);
        assert_eq!(restored, settings);
    }
}
