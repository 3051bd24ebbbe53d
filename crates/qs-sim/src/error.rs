use qs_agent::AgentError;
use qs_core::{AgentId, CoreError, Tick, TransportMode};
use qs_network::NetworkError;
use qs_population::PopulationError;
use qs_traffic::TrafficError;
use qs_transit::TransitError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("simulation configuration error: {0}")]
    Config(#[from] CoreError),

    #[error("invalid population: {0}")]
    Population(#[from] PopulationError),

    #[error("network error: {0}")]
    Network(#[from] NetworkError),

    #[error("transit error: {0}")]
    Transit(#[from] TransitError),

    #[error("traffic error: {0}")]
    Traffic(#[from] TrafficError),

    #[error("agent state error: {0}")]
    Agent(#[from] AgentError),

    #[error("no router or travel-time estimator registered for mode {0}")]
    MissingRouter(TransportMode),

    #[error("agent {agent:?}, plan element {element}: {reason}")]
    InvalidPlan { agent: AgentId, element: usize, reason: String },

    /// The run reached a state it must never be in.  Events of the tick in
    /// which this happened are discarded.
    #[error("invariant violated at {tick}: {source}")]
    Invariant {
        tick: Tick,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl SimError {
    pub(crate) fn invariant<E>(tick: Tick, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        SimError::Invariant { tick, source: Box::new(source) }
    }
}

pub type SimResult<T> = Result<T, SimError>;
