//! Per-agent state values.

use std::fmt;

use qs_core::{StopId, Tick, VehicleId};

/// What a travelling agent is doing right now.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LegStage {
    /// Driving its own vehicle, or a transit vehicle as its driver.
    Driving(VehicleId),
    /// Teleported; reappears at the destination at the given tick.
    Teleporting(Tick),
    /// Waiting for a transit vehicle.
    WaitingAtStop(StopId),
    /// Passenger in a transit vehicle.
    Riding(VehicleId),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AgentState {
    /// Performing a plan activity (also the final, open-ended one).
    #[default]
    Activity,
    Leg(LegStage),
    /// Removed from the simulation.  Terminal.
    Abort,
}

impl AgentState {
    #[inline]
    pub fn is_leg(self) -> bool {
        matches!(self, AgentState::Leg(_))
    }

    pub fn name(self) -> &'static str {
        match self {
            AgentState::Activity => "activity",
            AgentState::Leg(_) => "leg",
            AgentState::Abort => "abort",
        }
    }
}

impl fmt::Display for AgentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentState::Leg(stage) => write!(f, "leg({stage:?})"),
            other => f.write_str(other.name()),
        }
    }
}
