//! Parameters every link queue of a run shares.

use qs_core::SimConfig;

use crate::{TrafficError, TrafficResult};

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct QueueConfig {
    /// Simulated seconds per tick.
    pub tick_secs: f64,
    pub flow_capacity_factor: f64,
    pub storage_capacity_factor: f64,
    /// Road length one vehicle-equivalent occupies in a jam.
    pub effective_cell_size_m: f64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            tick_secs:               1.0,
            flow_capacity_factor:    1.0,
            storage_capacity_factor: 1.0,
            effective_cell_size_m:   7.5,
        }
    }
}

impl QueueConfig {
    pub fn from_sim(config: &SimConfig) -> Self {
        Self {
            tick_secs:               config.tick_duration_secs as f64,
            flow_capacity_factor:    config.flow_capacity_factor,
            storage_capacity_factor: config.storage_capacity_factor,
            effective_cell_size_m:   config.effective_cell_size_m,
        }
    }

    pub fn validate(&self) -> TrafficResult<()> {
        for (name, value) in [
            ("tick_secs", self.tick_secs),
            ("flow_capacity_factor", self.flow_capacity_factor),
            ("storage_capacity_factor", self.storage_capacity_factor),
            ("effective_cell_size_m", self.effective_cell_size_m),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(TrafficError::Config(format!("{name} must be positive, got {value}")));
            }
        }
        Ok(())
    }
}
