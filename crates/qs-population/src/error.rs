use thiserror::Error;

use qs_core::AgentId;

#[derive(Debug, Error)]
pub enum PopulationError {
    #[error("plan of {agent} is malformed: {reason}")]
    MalformedPlan { agent: AgentId, reason: &'static str },
}

pub type PopulationResult<T> = Result<T, PopulationError>;
