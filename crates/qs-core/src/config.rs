//! Run configuration.
//!
//! `SimConfig` is a plain struct with sensible defaults.  Applications
//! typically deserialize it (feature `serde`) or start from
//! `SimConfig::default()` and override fields; `validate` is called by the
//! simulation builder before any tick runs.

use crate::{CoreError, CoreResult, SimClock, Tick, TransportMode};

/// What a transit vehicle does with waiting passengers once it is full.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BoardingPolicy {
    /// Stop looking at candidates as soon as no seat is left.
    #[default]
    StopAtCapacity,
    /// Look at every matching candidate and emit one `BoardingDenied` event
    /// for each passenger who could not get on, once per stop visit.
    EmitDenied,
}

/// Top-level simulation configuration.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimConfig {
    /// Seconds after midnight at tick 0.
    pub start_secs: u64,

    /// Seconds after midnight at which the run stops (exclusive).
    pub end_secs: u64,

    /// Simulated seconds per tick.  Default: 1.
    pub tick_duration_secs: u32,

    /// Scales every link's flow capacity (e.g. 0.1 for a 10 % sample).
    pub flow_capacity_factor: f64,

    /// Scales every link's storage capacity.
    pub storage_capacity_factor: f64,

    /// Road space one vehicle-equivalent occupies in a jam, in metres.
    pub effective_cell_size_m: f64,

    /// Remove a vehicle (and abort its occupants) once it has been unable to
    /// leave a link buffer for this many seconds.  `None` waits forever.
    pub stuck_threshold_secs: Option<u64>,

    /// Behaviour of full transit vehicles, see [`BoardingPolicy`].
    pub boarding: BoardingPolicy,

    /// Modes simulated on the network through link queues.  Every other
    /// mode except `Pt` is teleported.
    pub network_modes: Vec<TransportMode>,

    /// Stop before `end_secs` once no agent is travelling and nothing is
    /// scheduled any more.
    pub end_when_idle: bool,

    /// Worker thread count for the parallel link phase (`parallel` feature
    /// of `qs-sim`).  `None` uses all logical cores.
    pub num_threads: Option<usize>,

    /// Emit a link snapshot every N ticks.  0 disables snapshots.
    pub output_interval_ticks: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            start_secs:              0,
            end_secs:                30 * 3_600,
            tick_duration_secs:      1,
            flow_capacity_factor:    1.0,
            storage_capacity_factor: 1.0,
            effective_cell_size_m:   7.5,
            stuck_threshold_secs:    None,
            boarding:                BoardingPolicy::default(),
            network_modes:           vec![TransportMode::Car],
            end_when_idle:           true,
            num_threads:             None,
            output_interval_ticks:   3_600,
        }
    }
}

impl SimConfig {
    /// The tick at which the simulation ends (exclusive upper bound).
    pub fn end_tick(&self) -> Tick {
        self.make_clock()
            .tick_at_or_after(self.end_secs)
    }

    pub fn make_clock(&self) -> SimClock {
        SimClock::new(self.start_secs, self.tick_duration_secs)
    }

    /// `true` if `mode` moves through link queues.
    #[inline]
    pub fn is_network_mode(&self, mode: TransportMode) -> bool {
        self.network_modes.contains(&mode)
    }

    /// Stuck threshold converted to ticks.
    pub fn stuck_threshold_ticks(&self) -> Option<u64> {
        self.stuck_threshold_secs
            .map(|secs| self.make_clock().ticks_for_secs(secs).max(1))
    }

    /// Reject configurations the simulation cannot run with.
    pub fn validate(&self) -> CoreResult<()> {
        if self.tick_duration_secs == 0 {
            return Err(CoreError::Config("tick_duration_secs must be positive".into()));
        }
        if self.end_secs <= self.start_secs {
            return Err(CoreError::Config(format!(
                "end_secs ({}) must be after start_secs ({})",
                self.end_secs, self.start_secs
            )));
        }
        for (name, value) in [
            ("flow_capacity_factor", self.flow_capacity_factor),
            ("storage_capacity_factor", self.storage_capacity_factor),
            ("effective_cell_size_m", self.effective_cell_size_m),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(CoreError::Config(format!("{name} must be positive, got {value}")));
            }
        }
        if self.network_modes.contains(&TransportMode::Pt) {
            return Err(CoreError::Config(
                "pt is served by the transit engine and cannot be a network mode".into(),
            ));
        }
        if self.num_threads == Some(0) {
            return Err(CoreError::Config("num_threads must be at least 1".into()));
        }
        Ok(())
    }
}
