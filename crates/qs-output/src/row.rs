//! Flat rows written by the output backends.

use qs_core::{SimClock, Tick};
use qs_events::Event;
use qs_sim::TickStats;
use qs_traffic::LinkQueue;
use serde::Serialize;

/// One event, flattened to id columns plus a free-form `detail` string.
/// Columns that do not apply to the event kind are left empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventRow {
    pub time_secs: u64,
    #[serde(rename = "type")]
    pub kind:      &'static str,
    pub agent:     Option<u32>,
    pub vehicle:   Option<u32>,
    pub link:      Option<u32>,
    pub stop:      Option<u32>,
    pub detail:    String,
}

impl EventRow {
    pub const HEADER: [&'static str; 7] = ["time_secs", "type", "agent", "vehicle", "link", "stop", "detail"];

    pub fn from_event(event: &Event, clock: &SimClock) -> Self {
        let kind = &event.kind;
        Self {
            time_secs: clock.secs_at(event.time),
            kind:      kind.name(),
            agent:     kind.agent().map(|a| a.0),
            vehicle:   kind.vehicle().map(|v| v.0),
            link:      kind.link().map(|l| l.0),
            stop:      kind.stop().map(|s| s.0),
            detail:    kind.detail(),
        }
    }
}

/// Counters for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TickSummaryRow {
    pub tick:       u64,
    pub time_secs:  u64,
    pub woken:      u64,
    pub departures: u64,
    pub arrivals:   u64,
    pub moved:      u64,
    pub aborted:    u64,
    pub events:     u64,
    pub en_route:   u64,
}

impl TickSummaryRow {
    pub const HEADER: [&'static str; 9] = [
        "tick", "time_secs", "woken", "departures", "arrivals", "moved", "aborted", "events", "en_route",
    ];

    pub fn new(tick: Tick, time_secs: u64, stats: &TickStats) -> Self {
        Self {
            tick: tick.0,
            time_secs,
            woken:      stats.woken as u64,
            departures: stats.departures as u64,
            arrivals:   stats.arrivals as u64,
            moved:      stats.moved as u64,
            aborted:    stats.aborted as u64,
            events:     stats.events as u64,
            en_route:   stats.en_route as u64,
        }
    }
}

/// State of one occupied link at a snapshot tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LinkSnapshotRow {
    pub tick:         u64,
    pub link:         u32,
    pub queued:       u64,
    pub buffered:     u64,
    pub waiting:      u64,
    pub held:         u64,
    /// PCE currently charged against storage.
    pub occupied_pce: f64,
    pub storage_pce:  f64,
    pub density:      f64,
}

impl LinkSnapshotRow {
    pub const HEADER: [&'static str; 9] = [
        "tick", "link", "queued", "buffered", "waiting", "held", "occupied_pce", "storage_pce", "density",
    ];

    pub fn new(tick: Tick, queue: &LinkQueue) -> Self {
        Self {
            tick:         tick.0,
            link:         queue.link().0,
            queued:       queue.queue_len() as u64,
            buffered:     queue.buffer_len() as u64,
            waiting:      queue.waiting_len() as u64,
            held:         queue.held_len() as u64,
            occupied_pce: queue.occupied_storage(),
            storage_pce:  queue.storage_capacity(),
            density:      queue.density(),
        }
    }
}
