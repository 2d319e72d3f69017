//! Lazy-loading tree view widget for ratatui.
//!
//! The tree owns a nested data set, flattens it into a pre-order list with a
//! per-node schema (path, depth, open/checked/cached/loading flags), renders
//! the visible rows with optional connector lines and row virtualization, and
//! loads children of async nodes through a user-supplied future.
//!
//! Feature flags:
//! - `mouse`: crossterm mouse routing via `TreeViewState::handle_mouse`.
//! - `serde`: serde support for `TreeItem` and a `TreeNode` impl for
//!   `serde_json::Value` with configurable field names.

mod action;
mod context;
mod error;
mod flatten;
mod glyphs;
mod lines;
mod loader;
mod model;
#[cfg(feature = "mouse")]
mod mouse;
mod options;
pub mod prelude;
mod schema;
mod state;
mod style;
mod visibility;
mod widget;

pub use action::{TreeAction, TreeEvent, TreeHit, TreeHitArea};
pub use context::TreeRowContext;
pub use error::{LoadError, TreeError};
pub use flatten::{FlatEntry, flatten, node_at, node_at_mut};
pub use glyphs::{TreeGlyphs, TreeLabelParts, tree_label_line};
pub use lines::{connector_at, connectors, is_last_sibling};
pub use loader::{AsyncLoad, LoadFn, LoadFuture, LoadOutcome, Loaded};
pub use model::{TreeFields, TreeItem, TreeNode};
pub use options::{IconChoice, IconContext, IconFn, IconKind, IconValue, PrefixIcon, TreeOptions};
pub use schema::{NodeAttr, NodeId, NodeKey, NodePath, Schema, SchemaEntry};
pub use state::TreeViewState;
pub use style::TreeViewStyle;
pub use visibility::{VisibleNode, is_visible, visible_ids};
pub use widget::TreeView;
