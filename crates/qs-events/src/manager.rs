//! Event dispatcher and two stock handlers.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use crate::event::Event;

// ── EventHandler ──────────────────────────────────────────────────────────────

/// Receives every event of a run in timestamp order.
///
/// Handlers are owned by the [`EventsManager`].  To read results after the
/// run, register an `Arc<Mutex<H>>` and keep a clone of the `Arc`.
pub trait EventHandler: Send {
    fn handle_event(&mut self, event: &Event);

    /// Called before a new iteration starts.
    fn reset(&mut self, _iteration: u32) {}

    /// Called once after the last event was delivered.
    fn finish(&mut self) {}
}

impl<H: EventHandler> EventHandler for Arc<Mutex<H>> {
    fn handle_event(&mut self, event: &Event) {
        self.lock().unwrap_or_else(|p| p.into_inner()).handle_event(event);
    }

    fn reset(&mut self, iteration: u32) {
        self.lock().unwrap_or_else(|p| p.into_inner()).reset(iteration);
    }

    fn finish(&mut self) {
        self.lock().unwrap_or_else(|p| p.into_inner()).finish();
    }
}

// ── EventsManager ─────────────────────────────────────────────────────────────

/// Buffers the events produced during a tick and delivers them in order.
///
/// Producers call [`process_event`](Self::process_event) in any order during
/// a tick; [`flush`](Self::flush) sorts the buffer by time (stable, so
/// events with equal time keep production order) and hands each event to
/// every handler in registration order.
#[derive(Default)]
pub struct EventsManager {
    handlers: Vec<Box<dyn EventHandler>>,
    pending:  Vec<Event>,
    delivered: usize,
}

impl EventsManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_handler<H: EventHandler + 'static>(&mut self, handler: H) {
        self.handlers.push(Box::new(handler));
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    #[inline]
    pub fn process_event(&mut self, event: Event) {
        self.pending.push(event);
    }

    /// Append a batch produced elsewhere (e.g. a per-link buffer).
    pub fn extend<I: IntoIterator<Item = Event>>(&mut self, events: I) {
        self.pending.extend(events);
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Total number of events delivered since the last reset.
    pub fn delivered(&self) -> usize {
        self.delivered
    }

    /// Deliver all buffered events.  Returns how many were delivered.
    pub fn flush(&mut self) -> usize {
        if self.pending.is_empty() {
            return 0;
        }
        self.pending.sort_by_key(|e| e.time);
        for event in &self.pending {
            for handler in &mut self.handlers {
                handler.handle_event(event);
            }
        }
        let n = self.pending.len();
        self.pending.clear();
        self.delivered += n;
        n
    }

    /// Drop buffered events without delivering them.
    pub fn discard_pending(&mut self) -> usize {
        let n = self.pending.len();
        if n > 0 {
            log::debug!("discarding {n} undelivered events");
        }
        self.pending.clear();
        n
    }

    pub fn reset(&mut self, iteration: u32) {
        self.pending.clear();
        self.delivered = 0;
        for handler in &mut self.handlers {
            handler.reset(iteration);
        }
    }

    pub fn finish(&mut self) {
        for handler in &mut self.handlers {
            handler.finish();
        }
    }
}

// ── Stock handlers ────────────────────────────────────────────────────────────

/// Keeps a copy of every event.
#[derive(Default, Debug, Clone)]
pub struct EventCollector {
    pub events: Vec<Event>,
}

impl EventCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_stream(self) -> Vec<Event> {
        self.events
    }
}

impl EventHandler for EventCollector {
    fn handle_event(&mut self, event: &Event) {
        self.events.push(event.clone());
    }

    fn reset(&mut self, _iteration: u32) {
        self.events.clear();
    }
}

/// Counts events per type label.
#[derive(Default, Debug, Clone)]
pub struct EventCounter {
    pub counts: BTreeMap<&'static str, usize>,
}

impl EventCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, name: &str) -> usize {
        self.counts.get(name).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }
}

impl EventHandler for EventCounter {
    fn handle_event(&mut self, event: &Event) {
        *self.counts.entry(event.kind.name()).or_insert(0) += 1;
    }

    fn reset(&mut self, _iteration: u32) {
        self.counts.clear();
    }
}
