//! Network error type.

use thiserror::Error;

use qs_core::{LinkId, NodeId};

#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("no route from {from} to {to}")]
    NoRoute { from: LinkId, to: LinkId },

    #[error("node {0} not found in network")]
    NodeNotFound(NodeId),

    #[error("link {0} not found in network")]
    LinkNotFound(LinkId),

    #[error("link {link} is invalid: {reason}")]
    InvalidLink { link: LinkId, reason: String },

    #[error("route is not connected: {from} does not lead to {to}")]
    Disconnected { from: LinkId, to: LinkId },

    #[error("route has no links")]
    EmptyRoute,
}

pub type NetworkResult<T> = Result<T, NetworkError>;
