//! Emits audit events when a drone's evaluated risk escalates.

use std::sync::Arc;

use dashmap::DashMap;
use fleet_core::risk::{RiskFactor, RiskLevel, RiskSummary};
use fleet_core::models::{EventLevel, EventSource};

use crate::events::EventBus;

/// Tracks the last-observed risk level per drone and turns strict
/// escalations into audit events. The map is never pruned; the fleet is
/// fixed for the process lifetime.
pub struct RiskMonitor {
    events: Arc<EventBus>,
    last_level: DashMap<String, RiskLevel>,
}

impl RiskMonitor {
    pub fn new(events: Arc<EventBus>) -> Self {
        Self {
            events,
            last_level: DashMap::new(),
        }
    }

    /// Record `summary` and emit exactly one event when the level strictly
    /// escalated since the previous evaluation of the same drone. First
    /// sightings, downgrades, and repeats stay silent.
    pub fn observe(&self, summary: &RiskSummary) {
        let previous = self
            .last_level
            .insert(summary.drone_id.clone(), summary.level);
        let Some(previous) = previous else {
            return;
        };
        if summary.level <= previous {
            return;
        }

        let leading = leading_factor(&summary.factors);
        let title = match (summary.level, leading) {
            (RiskLevel::High, Some(f)) => format!(
                "High predicted risk for drone {}. {}",
                summary.drone_code, f.label
            ),
            (RiskLevel::High, None) => {
                format!("High predicted risk for drone {}", summary.drone_code)
            }
            (_, Some(f)) => format!(
                "Predicted risk for drone {} rose to medium. {}",
                summary.drone_code, f.label
            ),
            (_, None) => format!(
                "Predicted risk for drone {} rose to medium",
                summary.drone_code
            ),
        };
        let level = match summary.level {
            RiskLevel::High => EventLevel::Error,
            _ => EventLevel::Warning,
        };
        self.events.publish(title, level, EventSource::Monitoring);
    }
}

/// Most severe factor, first one winning ties; `None` for an empty list.
fn leading_factor(factors: &[RiskFactor]) -> Option<&RiskFactor> {
    factors.iter().fold(None, |best, f| match best {
        Some(b) if f.level > b.level => Some(f),
        None => Some(f),
        other => other,
    })
}
