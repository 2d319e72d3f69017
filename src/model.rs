use std::borrow::Cow;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::schema::NodeKey;

/// Names of the node fields the tree reads.
///
/// Typed nodes such as [`TreeItem`] ignore these; dynamic nodes
/// (`serde_json::Value` with the `serde` feature) look the fields up by name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TreeFields<'a> {
    /// Field holding the display label.
    pub label: &'a str,
    /// Field holding the children collection.
    pub children: &'a str,
    /// Field flagging a node whose children are loaded on demand.
    pub is_async: &'a str,
    /// Field holding a stable node key (number or string).
    pub key: &'a str,
}

impl TreeFields<'static> {
    /// Default field names: `label`, `children`, `async`, `key`.
    pub const fn new() -> Self {
        Self {
            label: "label",
            children: "children",
            is_async: "async",
            key: "key",
        }
    }
}

impl Default for TreeFields<'static> {
    fn default() -> Self {
        Self::new()
    }
}

/// Minimal node contract required by the tree.
///
/// Nodes are owned by the tree state and addressed by position, so the
/// implementation must return children in a deterministic order. Node state
/// follows [`TreeNode::key`] across data updates; keyless nodes keep the
/// state of whatever node previously sat at their position.
pub trait TreeNode: Sized {
    /// Returns the display label.
    fn label(&self, fields: &TreeFields<'_>) -> Cow<'_, str>;
    /// Returns the node's children (empty for leaves).
    fn children(&self, fields: &TreeFields<'_>) -> &[Self];
    /// Returns the children collection for in-place edits, if the node has one.
    fn children_mut(&mut self, fields: &TreeFields<'_>) -> Option<&mut Vec<Self>>;
    /// Appends children, creating the collection when missing.
    ///
    /// Returns `false` if this node cannot hold children.
    fn append_children(&mut self, fields: &TreeFields<'_>, nodes: Vec<Self>) -> bool;
    /// Returns `true` if the children of this node are fetched on demand.
    fn is_async(&self, _fields: &TreeFields<'_>) -> bool {
        false
    }
    /// Returns the node's stable identity, if it has one.
    fn key(&self, _fields: &TreeFields<'_>) -> Option<NodeKey> {
        None
    }
}

/// Owned tree node with a label, children and an async flag.
///
/// Every item gets a fresh [`NodeKey`] on construction; clones share it.
/// Equality compares the label, children and async flag only.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug)]
pub struct TreeItem {
    pub label: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub children: Vec<Self>,
    #[cfg_attr(feature = "serde", serde(default, rename = "async"))]
    pub is_async: bool,
    #[cfg_attr(feature = "serde", serde(skip, default = "NodeKey::fresh"))]
    key: NodeKey,
}

impl Default for TreeItem {
    fn default() -> Self {
        Self::new(String::new())
    }
}

impl PartialEq for TreeItem {
    fn eq(&self, other: &Self) -> bool {
        self.label == other.label
            && self.is_async == other.is_async
            && self.children == other.children
    }
}

impl Eq for TreeItem {}

impl TreeItem {
    /// Creates a leaf node.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            children: Vec::new(),
            is_async: false,
            key: NodeKey::fresh(),
        }
    }

    /// Creates a node whose children are loaded on first expansion.
    pub fn lazy(label: impl Into<String>) -> Self {
        Self {
            is_async: true,
            ..Self::new(label)
        }
    }

    #[must_use]
    pub fn with_children(mut self, children: Vec<Self>) -> Self {
        self.children = children;
        self
    }

    /// Replaces the generated key, e.g. with a database id.
    #[must_use]
    pub fn with_key(mut self, key: impl Into<NodeKey>) -> Self {
        self.key = key.into();
        self
    }

    pub const fn node_key(&self) -> &NodeKey {
        &self.key
    }
}

impl TreeNode for TreeItem {
    fn label(&self, _fields: &TreeFields<'_>) -> Cow<'_, str> {
        Cow::Borrowed(&self.label)
    }

    fn children(&self, _fields: &TreeFields<'_>) -> &[Self] {
        &self.children
    }

    fn children_mut(&mut self, _fields: &TreeFields<'_>) -> Option<&mut Vec<Self>> {
        Some(&mut self.children)
    }

    fn append_children(&mut self, _fields: &TreeFields<'_>, nodes: Vec<Self>) -> bool {
        self.children.extend(nodes);
        true
    }

    fn is_async(&self, _fields: &TreeFields<'_>) -> bool {
        self.is_async
    }

    fn key(&self, _fields: &TreeFields<'_>) -> Option<NodeKey> {
        Some(self.key.clone())
    }
}

#[cfg(feature = "serde")]
impl TreeNode for serde_json::Value {
    fn label(&self, fields: &TreeFields<'_>) -> Cow<'_, str> {
        match self.get(fields.label) {
            Some(Self::String(text)) => Cow::Borrowed(text.as_str()),
            Some(Self::Null) | None => Cow::Borrowed(""),
            Some(other) => Cow::Owned(other.to_string()),
        }
    }

    fn children(&self, fields: &TreeFields<'_>) -> &[Self] {
        self.get(fields.children)
            .and_then(Self::as_array)
            .map_or(&[], Vec::as_slice)
    }

    fn children_mut(&mut self, fields: &TreeFields<'_>) -> Option<&mut Vec<Self>> {
        self.get_mut(fields.children).and_then(Self::as_array_mut)
    }

    fn append_children(&mut self, fields: &TreeFields<'_>, nodes: Vec<Self>) -> bool {
        let Some(object) = self.as_object_mut() else {
            return false;
        };
        let slot = object
            .entry(fields.children)
            .or_insert_with(|| Self::Array(Vec::new()));
        if !slot.is_array() {
            *slot = Self::Array(Vec::new());
        }
        slot.as_array_mut()
            .is_some_and(|children| {
                children.extend(nodes);
                true
            })
    }

    fn is_async(&self, fields: &TreeFields<'_>) -> bool {
        self.get(fields.is_async)
            .and_then(Self::as_bool)
            .unwrap_or(false)
    }

    fn key(&self, fields: &TreeFields<'_>) -> Option<NodeKey> {
        match self.get(fields.key)? {
            Self::String(name) => Some(NodeKey::Name(name.clone())),
            Self::Number(number) => number.as_u64().map(NodeKey::Id),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tree_item_appends_children() {
        let fields = TreeFields::default();
        let mut node = TreeItem::lazy("remote");
        assert!(node.is_async(&fields));
        assert!(node.children(&fields).is_empty());

        assert!(node.append_children(&fields, vec![TreeItem::new("a"), TreeItem::new("b")]));

        let labels: Vec<_> = node
            .children(&fields)
            .iter()
            .map(|child| child.label(&fields).into_owned())
            .collect();
        assert_eq!(labels, vec!["a", "b"]);
    }

    #[test]
    fn tree_item_keys_are_unique_but_ignored_by_equality() {
        let fields = TreeFields::default();
        let a = TreeItem::new("same");
        let b = TreeItem::new("same");

        assert_eq!(a, b);
        assert_ne!(a.node_key(), b.node_key());
        assert_eq!(a.clone().node_key(), a.node_key());
        assert_eq!(
            TreeItem::new("db").with_key(42_u64).key(&fields),
            Some(NodeKey::Id(42))
        );
    }

    #[cfg(feature = "serde")]
    #[test]
    fn json_node_uses_configured_fields() {
        use serde_json::json;

        let fields = TreeFields {
            label: "name",
            children: "items",
            is_async: "lazy",
            key: "uid",
        };
        let mut node = json!({
            "name": "root",
            "uid": 7,
            "lazy": true,
            "items": [{ "name": "leaf", "uid": "x" }]
        });

        assert_eq!(node.label(&fields), "root");
        assert_eq!(node.key(&fields), Some(NodeKey::Id(7)));
        assert_eq!(node.children(&fields)[0].key(&fields), Some(NodeKey::from("x")));
        assert!(node.is_async(&fields));
        assert_eq!(node.children(&fields).len(), 1);

        assert!(node.append_children(&fields, vec![json!({ "name": "extra" })]));
        assert_eq!(node.children(&fields)[1].label(&fields), "extra");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn json_leaf_gains_children_collection() {
        use serde_json::json;

        let fields = TreeFields::default();
        let mut node = json!({ "label": "leaf" });
        assert!(node.children_mut(&fields).is_none());

        assert!(node.append_children(&fields, vec![json!({ "label": "child" })]));
        assert_eq!(node.children(&fields).len(), 1);
        assert!(!json!("scalar").append_children(&fields, Vec::new()));
    }
}
