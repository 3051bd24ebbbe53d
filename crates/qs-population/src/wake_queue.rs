//! `WakeQueue`: sparse per-tick agent activation queue.
//!
//! Most agents spend most ticks inside an activity.  Instead of polling
//! every agent each tick, an agent registers the tick at which it next needs
//! attention (end of an activity, end of a teleported leg) and the scheduler
//! drains only that tick's entries.
//!
//! `BTreeMap` gives O(log W) insert and pop where W is the number of distinct
//! wake ticks currently enqueued.

use std::collections::BTreeMap;

use qs_core::{AgentId, SimClock, Tick};

use crate::Population;

#[derive(Default)]
pub struct WakeQueue {
    inner: BTreeMap<Tick, Vec<AgentId>>,
    /// Cached total entry count for O(1) `len()`.
    total: usize,
}

impl WakeQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule every person at the end of their first activity.
    ///
    /// The first activity is taken to start at the simulation start; persons
    /// whose first activity never ends are not inserted.
    pub fn build_from_population(population: &Population, clock: &SimClock) -> Self {
        let mut queue = Self::new();
        for (agent, person) in population.iter() {
            let end = person
                .plan
                .activity_at(0)
                .and_then(|a| a.end_after(clock.start_secs));
            if let (Some(end), false) = (end, person.plan.is_last(0)) {
                queue.push(clock.tick_at_or_after(end), agent);
            }
        }
        queue
    }

    /// Schedule `agent` to wake at `tick`.
    pub fn push(&mut self, tick: Tick, agent: AgentId) {
        self.inner.entry(tick).or_default().push(agent);
        self.total += 1;
    }

    /// Remove and return all agents scheduled for exactly `tick`, in
    /// ascending `AgentId` order.
    ///
    /// Returns `None` if nothing is queued for that tick.
    pub fn drain_tick(&mut self, tick: Tick) -> Option<Vec<AgentId>> {
        let mut agents = self.inner.remove(&tick)?;
        self.total -= agents.len();
        agents.sort_unstable();
        Some(agents)
    }

    /// The earliest tick with at least one queued agent.
    pub fn next_tick(&self) -> Option<Tick> {
        self.inner.keys().next().copied()
    }

    /// Total number of (tick, agent) entries across all future ticks.
    pub fn len(&self) -> usize {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Number of distinct future ticks with at least one queued agent.
    pub fn tick_count(&self) -> usize {
        self.inner.len()
    }
}
