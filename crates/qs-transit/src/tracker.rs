//! Passengers waiting at stops.

use std::collections::VecDeque;

use qs_core::{AgentId, StopId};
use qs_population::TransitPassengerRoute;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct WaitingPassenger {
    pub agent: AgentId,
    pub trip:  TransitPassengerRoute,
}

/// One FIFO per stop, indexed by `StopId`.
#[derive(Clone, Debug, Default)]
pub struct StopAgentTracker {
    queues: Vec<VecDeque<WaitingPassenger>>,
    total:  usize,
}

impl StopAgentTracker {
    pub fn new(stop_count: usize) -> Self {
        Self { queues: vec![VecDeque::new(); stop_count], total: 0 }
    }

    /// Append `agent` to the queue of `trip.access_stop`.
    ///
    /// Returns `false` (and does nothing) if the stop is unknown.
    pub fn add_agent(&mut self, agent: AgentId, trip: TransitPassengerRoute) -> bool {
        match self.queues.get_mut(trip.access_stop.index()) {
            Some(q) => {
                q.push_back(WaitingPassenger { agent, trip });
                self.total += 1;
                true
            }
            None => false,
        }
    }

    /// Remove `agent` from the queue at `stop`.  Returns `true` if it was
    /// there.
    pub fn remove_agent(&mut self, stop: StopId, agent: AgentId) -> bool {
        let Some(q) = self.queues.get_mut(stop.index()) else { return false };
        match q.iter().position(|w| w.agent == agent) {
            Some(pos) => {
                q.remove(pos);
                self.total -= 1;
                true
            }
            None => false,
        }
    }

    /// Waiting passengers at `stop`, longest waiting first.
    pub fn waiting_at(&self, stop: StopId) -> impl Iterator<Item = &WaitingPassenger> {
        self.queues.get(stop.index()).into_iter().flatten()
    }

    pub fn len_at(&self, stop: StopId) -> usize {
        self.queues.get(stop.index()).map_or(0, VecDeque::len)
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Remove every waiting passenger, in stop order.
    pub fn drain(&mut self) -> Vec<(StopId, AgentId)> {
        self.total = 0;
        self.queues
            .iter_mut()
            .enumerate()
            .flat_map(|(i, q)| q.drain(..).map(move |w| (StopId(i as u32), w.agent)))
            .collect()
    }
}
