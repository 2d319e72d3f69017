use std::fmt;
use std::rc::Rc;

use futures::future::LocalBoxFuture;

use crate::error::LoadError;
use crate::schema::NodeId;

/// Children produced by an async load.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Loaded<N> {
    Node(N),
    Nodes(Vec<N>),
    /// The loader had nothing to add; the node is left untouched.
    Empty,
}

impl<N> Loaded<N> {
    pub fn into_vec(self) -> Vec<N> {
        match self {
            Self::Node(node) => vec![node],
            Self::Nodes(nodes) => nodes,
            Self::Empty => Vec::new(),
        }
    }
}

impl<N> From<Vec<N>> for Loaded<N> {
    fn from(nodes: Vec<N>) -> Self {
        Self::Nodes(nodes)
    }
}

impl<N> From<Option<N>> for Loaded<N> {
    fn from(node: Option<N>) -> Self {
        node.map_or(Self::Empty, Self::Node)
    }
}

/// Future returned by a loader.
pub type LoadFuture<N> = LocalBoxFuture<'static, Result<Loaded<N>, LoadError>>;

/// Loader callback: receives the clicked node and its identifier.
pub type LoadFn<N> = dyn Fn(&N, NodeId) -> LoadFuture<N>;

/// Async child loading configuration.
pub struct AsyncLoad<N> {
    pub(crate) loader: Rc<LoadFn<N>>,
    pub(crate) cache: bool,
}

impl<N> AsyncLoad<N> {
    /// Creates a configuration with caching enabled.
    pub fn new<F>(loader: F) -> Self
    where
        F: Fn(&N, NodeId) -> LoadFuture<N> + 'static,
    {
        Self {
            loader: Rc::new(loader),
            cache: true,
        }
    }

    /// When disabled, every expansion of an async node calls the loader again.
    #[must_use]
    pub const fn cache(mut self, cache: bool) -> Self {
        self.cache = cache;
        self
    }

    pub const fn is_cached(&self) -> bool {
        self.cache
    }

    pub(crate) fn load(&self, node: &N, id: NodeId) -> LoadFuture<N> {
        (self.loader)(node, id)
    }
}

impl<N> Clone for AsyncLoad<N> {
    fn clone(&self) -> Self {
        Self {
            loader: Rc::clone(&self.loader),
            cache: self.cache,
        }
    }
}

impl<N> fmt::Debug for AsyncLoad<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncLoad")
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

/// Result of one settled load, as reported to the host loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Children were appended (count may be zero for an empty response).
    Loaded { id: NodeId, added: usize },
    /// The loader failed; the node may be retried.
    Failed { id: NodeId },
    /// The node disappeared before the load settled.
    Discarded { id: NodeId },
}

impl LoadOutcome {
    pub const fn id(self) -> NodeId {
        match self {
            Self::Loaded { id, .. } | Self::Failed { id } | Self::Discarded { id } => id,
        }
    }
}
