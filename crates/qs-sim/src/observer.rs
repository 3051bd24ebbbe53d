//! Simulation observer trait for progress reporting and data collection.

use qs_agent::AgentStore;
use qs_core::Tick;
use qs_traffic::LinkQueue;

/// Counters for one tick, handed to [`SimObserver::on_tick_end`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct TickStats {
    /// Agents drained from the wake queue (activity ends, teleport arrivals).
    pub woken:      usize,
    /// Legs started, transit drivers included.
    pub departures: usize,
    /// Legs finished.
    pub arrivals:   usize,
    /// Vehicles that crossed a node.
    pub moved:      usize,
    /// Agents that entered ABORT.
    pub aborted:    usize,
    /// Events delivered to the handlers.
    pub events:     usize,
    /// Agents travelling after the tick.
    pub en_route:   usize,
}

/// Callbacks invoked by [`Sim::run`][crate::Sim::run] at key points in the
/// tick loop.
///
/// All methods have default no-op implementations so implementors only need
/// to override what they care about.
///
/// # Example: progress printer
///
/// ```rust,ignore
/// struct Progress;
///
/// impl SimObserver for Progress {
///     fn on_tick_end(&mut self, tick: Tick, stats: &TickStats) {
///         if stats.arrivals > 0 {
///             println!("{tick}: {} arrivals", stats.arrivals);
///         }
///     }
/// }
/// ```
pub trait SimObserver {
    /// Called at the very start of each tick, before any processing.
    fn on_tick_start(&mut self, _tick: Tick) {}

    /// Called after the tick's events have been delivered.
    fn on_tick_end(&mut self, _tick: Tick, _stats: &TickStats) {}

    /// Called every `config.output_interval_ticks` ticks with read-only
    /// access to every link queue (indexed by `LinkId`) and the agents.
    fn on_snapshot(&mut self, _tick: Tick, _links: &[LinkQueue], _agents: &AgentStore) {}

    /// Called once after the run has been closed.
    fn on_sim_end(&mut self, _final_tick: Tick) {}
}

/// A [`SimObserver`] that does nothing.
pub struct NoopObserver;

impl SimObserver for NoopObserver {}
