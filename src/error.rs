use thiserror::Error;

use crate::schema::NodeId;

/// Failure reported by an async child loader.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("{0}")]
    Message(String),
    #[error(transparent)]
    Source(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl LoadError {
    pub fn msg(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }
}

impl From<String> for LoadError {
    fn from(message: String) -> Self {
        Self::Message(message)
    }
}

impl From<&str> for LoadError {
    fn from(message: &str) -> Self {
        Self::Message(message.to_owned())
    }
}

/// Errors raised by tree state operations.
#[derive(Debug, Error)]
pub enum TreeError {
    #[error("unknown node {0}")]
    UnknownNode(NodeId),
    #[error("node {0} is async but no loader is configured")]
    MissingLoader(NodeId),
    #[error("node {id} no longer exists at {path}")]
    StaleNode { id: NodeId, path: String },
    #[error("node {0} cannot hold children")]
    NotAContainer(NodeId),
    #[error("loading children of node {id} failed")]
    Load {
        id: NodeId,
        #[source]
        source: LoadError,
    },
}
