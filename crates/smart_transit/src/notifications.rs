//! Player-facing notifications.
//!
//! Busy-stop alerts and save/load failures are sent as `NotificationEvent`s
//! and collected into `NotificationLog`. Lower-priority entries auto-dismiss
//! after a number of ticks; the journal keeps a bounded history.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::busy_stop_alerts::TransitAlert;
use crate::ids::StopId;
use crate::TickCounter;

// =============================================================================
// Priority Levels
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum NotificationPriority {
    /// Save or load failures. Persists until dismissed.
    Warning,
    /// Crowded stops.
    Attention,
}

impl NotificationPriority {
    /// Auto-dismiss duration in ticks. `None` means persist until dismissed.
    pub fn auto_dismiss_ticks(&self) -> Option<u64> {
        match self {
            NotificationPriority::Warning => None,
            NotificationPriority::Attention => Some(30_000),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            NotificationPriority::Warning => "WARNING",
            NotificationPriority::Attention => "ATTENTION",
        }
    }
}

// =============================================================================
// Event and log entries
// =============================================================================

#[derive(Event, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationEvent {
    pub text: String,
    pub priority: NotificationPriority,
    /// Stop the notification points at, if any.
    pub location: Option<StopId>,
    pub sender: String,
}

impl From<TransitAlert> for NotificationEvent {
    fn from(alert: TransitAlert) -> Self {
        Self {
            text: alert.message,
            priority: NotificationPriority::Attention,
            location: Some(alert.subject),
            sender: alert.source,
        }
    }
}

impl NotificationEvent {
    pub fn warning(text: impl Into<String>, sender: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            priority: NotificationPriority::Warning,
            location: None,
            sender: sender.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: u64,
    pub event: NotificationEvent,
    pub created_tick: u64,
    pub dismissed: bool,
}

#[derive(Resource)]
pub struct NotificationLog {
    pub active: Vec<Notification>,
    pub journal: Vec<NotificationEvent>,
    pub max_journal: usize,
    next_id: u64,
}

impl Default for NotificationLog {
    fn default() -> Self {
        Self {
            active: Vec::new(),
            journal: Vec::new(),
            max_journal: 200,
            next_id: 1,
        }
    }
}

impl NotificationLog {
    pub fn push(&mut self, event: &NotificationEvent, tick: u64) {
        let id = self.next_id;
        self.next_id += 1;
        self.active.push(Notification {
            id,
            event: event.clone(),
            created_tick: tick,
            dismissed: false,
        });

        self.journal.push(event.clone());
        if self.journal.len() > self.max_journal {
            let excess = self.journal.len() - self.max_journal;
            self.journal.drain(0..excess);
        }
    }

    /// Log and push in one step; used by the collector system and by passes
    /// forced outside the schedule.
    pub fn record(&mut self, event: &NotificationEvent, tick: u64) {
        info!("[{}] {}: {}", event.priority.label(), event.sender, event.text);
        self.push(event, tick);
    }

    pub fn dismiss(&mut self, id: u64) {
        if let Some(n) = self.active.iter_mut().find(|n| n.id == id) {
            n.dismissed = true;
        }
    }

    /// Remove dismissed and expired notifications from the active list.
    pub fn sweep(&mut self, current_tick: u64) {
        self.active.retain(|n| {
            if n.dismissed {
                return false;
            }
            match n.event.priority.auto_dismiss_ticks() {
                Some(ttl) => current_tick.saturating_sub(n.created_tick) < ttl,
                None => true,
            }
        });
    }
}

// =============================================================================
// Systems
// =============================================================================

pub fn collect_notifications(
    mut events: EventReader<NotificationEvent>,
    mut log: ResMut<NotificationLog>,
    tick: Res<TickCounter>,
) {
    for event in events.read() {
        log.record(event, tick.0);
    }
    log.sweep(tick.0);
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::{RouteKey, TransportType};

    fn attention(text: &str) -> NotificationEvent {
        NotificationEvent {
            text: text.to_string(),
            priority: NotificationPriority::Attention,
            location: None,
            sender: "test".to_string(),
        }
    }

    #[test]
    fn test_alert_becomes_attention_notification() {
        let alert = TransitAlert::busy_stop(RouteKey::new(TransportType::Tram, 2), StopId(9), 80);
        let event = NotificationEvent::from(alert);
        assert_eq!(event.priority, NotificationPriority::Attention);
        assert_eq!(event.location, Some(StopId(9)));
        assert_eq!(event.sender, "Smart Transit");
    }

    #[test]
    fn test_sweep_expires_by_priority() {
        let mut log = NotificationLog::default();
        log.push(&attention("crowded"), 100);
        log.push(&NotificationEvent::warning("disk full", "save"), 100);

        log.sweep(5_000);
        assert_eq!(log.active.len(), 2);

        log.sweep(100 + 30_000);
        assert_eq!(log.active.len(), 1);
        assert_eq!(log.active[0].event.priority, NotificationPriority::Warning);
    }

    #[test]
    fn test_dismiss_keeps_journal() {
        let mut log = NotificationLog::default();
        log.push(&attention("dismiss me"), 0);
        let id = log.active[0].id;
        log.dismiss(id);
        log.sweep(0);
        assert!(log.active.is_empty());
        assert_eq!(log.journal.len(), 1);
    }

    #[test]
    fn test_journal_trimming() {
        let mut log = NotificationLog {
            max_journal: 3,
            ..Default::default()
        };
        for i in 0..6 {
            log.push(&attention(&format!("Event {i}")), i);
        }
        assert_eq!(log.journal.len(), 3);
        assert_eq!(log.journal[0].text, "Event 3");
        assert_eq!(log.journal[2].text, "Event 5");
    }
}
