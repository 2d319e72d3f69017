use crate::schema::{NodeId, SchemaEntry};

/// Actions that a user or application can initiate on the tree view.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TreeAction {
    /// Expander click: toggle the node and load its children if needed.
    Toggle(NodeId),
    /// Content click: make the node the single checked node.
    Check(NodeId),
    /// Toggle drawing of connector lines.
    ToggleLines,
    /// Scroll the view up by the given number of tree rows.
    ScrollUp(u16),
    /// Scroll the view down by the given number of tree rows.
    ScrollDown(u16),
}

/// Result of handling an action or click.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TreeEvent {
    /// The action was handled internally and state was updated.
    Handled,
    /// The action was ignored (unknown node, click outside the rows, ...).
    Unhandled,
    /// The checked node changed.
    Checked { id: NodeId, entry: SchemaEntry },
}

/// Region of a row under a click.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TreeHitArea {
    /// Connector lines and the expander.
    Action,
    /// Icons and label.
    Content,
}

/// Row and region resolved from screen coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TreeHit {
    pub id: NodeId,
    pub area: TreeHitArea,
}
