use qs_core::AgentId;
use thiserror::Error;

use crate::AgentState;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("unknown agent {0:?}")]
    UnknownAgent(AgentId),

    #[error("agent {agent:?} must be in state {expected} but is in {found}")]
    WrongState { agent: AgentId, expected: &'static str, found: AgentState },
}

pub type AgentResult<T> = Result<T, AgentError>;
