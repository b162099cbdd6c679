use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::ids::{RouteKey, StopId};

/// Sender label attached to every alert.
pub const ALERT_SOURCE_LABEL: &str = "Smart Transit";

/// A user-facing alert about one crowded stop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitAlert {
    pub message: String,
    pub subject: StopId,
    pub source: String,
    pub route: RouteKey,
    pub waiting: u32,
}

impl TransitAlert {
    pub fn busy_stop(route: RouteKey, stop: StopId, waiting: u32) -> Self {
        Self {
            message: format!("{route}: a stop is very busy, {waiting} passengers waiting."),
            subject: stop,
            source: ALERT_SOURCE_LABEL.to_string(),
            route,
            waiting,
        }
    }
}

/// Delivery channel for alerts. `is_available` is consulted before every
/// post; an unavailable sink is skipped silently.
pub trait AlertSink {
    fn is_available(&self) -> bool;
    fn post_alert(&mut self, alert: TransitAlert);
}

/// Host-controlled availability of the alert channel.
#[derive(Resource, Debug, Clone, Copy)]
pub struct AlertChannel {
    pub available: bool,
}

impl Default for AlertChannel {
    fn default() -> Self {
        Self { available: true }
    }
}

/// Collects alerts during a pass; they are forwarded as notification events
/// once the pass has finished.
#[derive(Debug, Default)]
pub struct AlertBuffer {
    available: bool,
    alerts: Vec<TransitAlert>,
}

impl AlertBuffer {
    pub fn new(available: bool) -> Self {
        Self {
            available,
            alerts: Vec::new(),
        }
    }

    pub fn into_alerts(self) -> Vec<TransitAlert> {
        self.alerts
    }
}

impl AlertSink for AlertBuffer {
    fn is_available(&self) -> bool {
        self.available
    }

    fn post_alert(&mut self, alert: TransitAlert) {
        self.alerts.push(alert);
    }
}
