//! Bounded audit log with live fan-out.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use chrono::Utc;
use fleet_core::models::{EventLevel, EventSource, SystemEvent};
use tokio::sync::broadcast;

/// Buffer of the fan-out channel. Slow subscribers observe
/// `RecvError::Lagged` and pick up again with newer events.
const FANOUT_BUFFER: usize = 256;

/// Append-only, capacity-bounded audit log plus a live event stream.
///
/// Publishing with zero subscribers is fine; the log records the event
/// either way. On overflow the oldest entry is evicted first.
pub struct EventBus {
    log: Mutex<VecDeque<SystemEvent>>,
    capacity: usize,
    next_id: AtomicU64,
    tx: broadcast::Sender<SystemEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(FANOUT_BUFFER);
        Self {
            log: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            next_id: AtomicU64::new(1),
            tx,
        }
    }

    /// Append a new event and hand it to every current subscriber.
    pub fn publish(
        &self,
        title: impl Into<String>,
        level: EventLevel,
        source: EventSource,
    ) -> SystemEvent {
        let timestamp = Utc::now();
        let event = SystemEvent {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            timestamp,
            time: timestamp.format("%Y-%m-%d %H:%M").to_string(),
            title: title.into(),
            level,
            source,
        };

        if let Ok(mut log) = self.log.lock() {
            log.push_back(event.clone());
            while log.len() > self.capacity {
                log.pop_front();
            }
        }

        // New events only; subscribers never get historical backfill.
        let _ = self.tx.send(event.clone());
        event
    }

    /// Up to `limit` most recent events, newest first.
    pub fn recent(&self, limit: usize) -> Vec<SystemEvent> {
        match self.log.lock() {
            Ok(log) => log.iter().rev().take(limit).cloned().collect(),
            Err(_) => Vec::new(),
        }
    }

    /// Number of retained events.
    pub fn len(&self) -> usize {
        self.log.lock().map(|log| log.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Live stream of events published after this call. Dropping the
    /// receiver is the unsubscribe.
    pub fn subscribe(&self) -> broadcast::Receiver<SystemEvent> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill(bus: &EventBus, count: usize) {
        for i in 0..count {
            bus.publish(format!("event {}", i + 1), EventLevel::Info, EventSource::System);
        }
    }

    #[test]
    fn overflow_evicts_the_oldest_entry_first() {
        let bus = EventBus::new(300);
        fill(&bus, 301);

        assert_eq!(bus.len(), 300);
        let recent = bus.recent(300);
        // Event ids are 1-based; #1 is gone and #2 is the oldest survivor.
        assert_eq!(recent.last().unwrap().id, 2);
        assert_eq!(recent.first().unwrap().id, 301);
    }

    #[test]
    fn recent_returns_newest_first() {
        let bus = EventBus::new(300);
        fill(&bus, 80);

        let recent = bus.recent(50);
        assert_eq!(recent.len(), 50);
        assert_eq!(recent[0].id, 80);
        assert_eq!(recent[49].id, 31);
    }

    #[test]
    fn publishing_without_subscribers_still_logs() {
        let bus = EventBus::new(10);
        let event = bus.publish("lonely", EventLevel::Warning, EventSource::Monitoring);
        assert_eq!(event.level, EventLevel::Warning);
        assert_eq!(bus.recent(1)[0].title, "lonely");
    }

    #[tokio::test]
    async fn subscribers_see_only_new_events() {
        let bus = EventBus::new(10);
        bus.publish("before", EventLevel::Info, EventSource::System);

        let mut rx = bus.subscribe();
        bus.publish("after", EventLevel::Info, EventSource::System);

        let received = rx.recv().await.unwrap();
        assert_eq!(received.title, "after");
    }
}
