pub use crate::{
    AsyncLoad, IconChoice, IconContext, IconKind, IconValue, LoadError, LoadFuture, LoadOutcome,
    Loaded, NodeAttr, NodeId, NodeKey, NodePath, PrefixIcon, SchemaEntry, TreeAction, TreeError,
    TreeEvent, TreeFields, TreeGlyphs, TreeHit, TreeHitArea, TreeItem, TreeNode, TreeOptions,
    TreeView, TreeViewState, TreeViewStyle,
};
