use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use rustc_hash::{FxBuildHasher, FxHashMap};
use smallvec::SmallVec;

/// Synthetic node identifier assigned during flattening.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    #[inline]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

static NEXT_AUTO_KEY: AtomicU64 = AtomicU64::new(0);

/// Identity of a data node that survives re-flattening.
///
/// Nodes carrying a key keep their [`NodeId`] and flags wherever they move;
/// keyless nodes are matched by path.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum NodeKey {
    /// Allocated by [`NodeKey::fresh`].
    Auto(u64),
    Id(u64),
    Name(String),
}

impl NodeKey {
    /// A process-unique key.
    pub fn fresh() -> Self {
        Self::Auto(NEXT_AUTO_KEY.fetch_add(1, Ordering::Relaxed))
    }
}

impl From<u64> for NodeKey {
    fn from(id: u64) -> Self {
        Self::Id(id)
    }
}

impl From<&str> for NodeKey {
    fn from(name: &str) -> Self {
        Self::Name(name.to_owned())
    }
}

impl From<String> for NodeKey {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

/// Sibling indices from a root to a node, written as `0-2-1`.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodePath(SmallVec<[u32; 8]>);

impl NodePath {
    pub fn root(index: u32) -> Self {
        let mut segments = SmallVec::new();
        segments.push(index);
        Self(segments)
    }

    /// Path of the `index`-th child of this node.
    #[must_use]
    pub fn child(&self, index: u32) -> Self {
        let mut segments = self.0.clone();
        segments.push(index);
        Self(segments)
    }

    pub fn segments(&self) -> &[u32] {
        &self.0
    }

    /// Depth of the addressed node (roots are at depth 0).
    pub fn depth(&self) -> u16 {
        u16::try_from(self.0.len().saturating_sub(1)).unwrap_or(u16::MAX)
    }

    /// Segment-wise prefix test; `0-1` is not a prefix of `0-10`.
    pub fn starts_with(&self, prefix: &Self) -> bool {
        self.0.starts_with(&prefix.0)
    }

    /// Path of the ancestor at `depth`, or `None` if deeper than this node.
    #[must_use]
    pub fn truncated(&self, depth: u16) -> Option<Self> {
        let len = usize::from(depth) + 1;
        (len <= self.0.len()).then(|| Self(SmallVec::from_slice(&self.0[..len])))
    }

    /// Path of the following sibling (last index incremented).
    #[must_use]
    pub fn next_sibling(&self) -> Option<Self> {
        let mut segments = self.0.clone();
        let last = segments.last_mut()?;
        *last = last.checked_add(1)?;
        Some(Self(segments))
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, segment) in self.0.iter().enumerate() {
            if idx > 0 {
                f.write_str("-")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

impl FromStr for NodePath {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split('-')
            .map(str::parse::<u32>)
            .collect::<Result<SmallVec<_>, _>>()
            .map(Self)
    }
}

/// Computed metadata and mutable flags of one flattened node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SchemaEntry {
    pub key: Option<NodeKey>,
    pub path: NodePath,
    pub depth: u16,
    pub parent: Option<NodeId>,
    pub is_root: bool,
    pub has_child: bool,
    pub is_async: bool,
    pub is_open: bool,
    pub checked: bool,
    pub cached: bool,
    pub loading: bool,
}

impl SchemaEntry {
    /// Whether the node shows an expander (children or on-demand children).
    #[inline]
    pub const fn is_expandable(&self) -> bool {
        self.has_child || self.is_async
    }

    const fn flag(&self, attr: NodeAttr) -> bool {
        match attr {
            NodeAttr::Open => self.is_open,
            NodeAttr::Checked => self.checked,
            NodeAttr::Cached => self.cached,
            NodeAttr::Loading => self.loading,
        }
    }

    const fn flag_mut(&mut self, attr: NodeAttr) -> &mut bool {
        match attr {
            NodeAttr::Open => &mut self.is_open,
            NodeAttr::Checked => &mut self.checked,
            NodeAttr::Cached => &mut self.cached,
            NodeAttr::Loading => &mut self.loading,
        }
    }
}

/// Mutable per-node flags.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeAttr {
    Open,
    Checked,
    Cached,
    Loading,
}

/// Side-table of per-node metadata keyed by [`NodeId`].
///
/// Also indexes entries by path and by [`NodeKey`], which the connector
/// calculator and the state-preserving re-flatten rely on.
#[derive(Clone, Debug, Default)]
pub struct Schema {
    entries: FxHashMap<NodeId, SchemaEntry>,
    by_path: FxHashMap<NodePath, NodeId>,
    by_key: FxHashMap<NodeKey, NodeId>,
    next_id: u32,
}

impl Schema {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: FxHashMap::with_capacity_and_hasher(capacity, FxBuildHasher),
            by_path: FxHashMap::with_capacity_and_hasher(capacity, FxBuildHasher),
            by_key: FxHashMap::default(),
            next_id: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn get(&self, id: NodeId) -> Option<&SchemaEntry> {
        self.entries.get(&id)
    }

    #[inline]
    pub fn contains(&self, id: NodeId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Looks up the node at `path`.
    #[inline]
    pub fn id_at(&self, path: &NodePath) -> Option<NodeId> {
        self.by_path.get(path).copied()
    }

    /// Looks up the node carrying `key`.
    #[inline]
    pub fn id_for_key(&self, key: &NodeKey) -> Option<NodeId> {
        self.by_key.get(key).copied()
    }

    #[inline]
    pub fn contains_path(&self, path: &NodePath) -> bool {
        self.by_path.contains_key(path)
    }

    /// Reads a flag; `None` for unknown nodes.
    pub fn attr(&self, id: NodeId, attr: NodeAttr) -> Option<bool> {
        self.entries.get(&id).map(|entry| entry.flag(attr))
    }

    /// Writes a flag on a single node. Returns `false` for unknown nodes.
    pub fn set_attr(&mut self, id: NodeId, attr: NodeAttr, value: bool) -> bool {
        match self.entries.get_mut(&id) {
            Some(entry) => {
                *entry.flag_mut(attr) = value;
                true
            }
            None => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &SchemaEntry)> {
        self.entries.iter().map(|(id, entry)| (*id, entry))
    }

    pub(crate) const fn next_id(&self) -> u32 {
        self.next_id
    }

    pub(crate) const fn set_next_id(&mut self, next_id: u32) {
        self.next_id = next_id;
    }

    pub(crate) fn alloc_id(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        id
    }

    pub(crate) fn insert(&mut self, id: NodeId, entry: SchemaEntry) {
        self.by_path.insert(entry.path.clone(), id);
        if let Some(key) = &entry.key {
            self.by_key.entry(key.clone()).or_insert(id);
        }
        self.entries.insert(id, entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(text: &str) -> NodePath {
        text.parse().unwrap()
    }

    #[test]
    fn path_round_trips_through_text() {
        let parsed = path("0-2-1");
        assert_eq!(parsed.segments(), &[0, 2, 1]);
        assert_eq!(parsed.depth(), 2);
        assert_eq!(parsed.to_string(), "0-2-1");
        assert!("0--1".parse::<NodePath>().is_err());
    }

    #[test]
    fn prefix_test_is_segment_wise() {
        assert!(path("0-1-3").starts_with(&path("0-1")));
        assert!(path("0-1").starts_with(&path("0-1")));
        assert!(!path("0-10").starts_with(&path("0-1")));
        assert!(!path("0").starts_with(&path("0-1")));
    }

    #[test]
    fn truncation_and_next_sibling() {
        let node = path("0-1-0");
        assert_eq!(node.truncated(1), Some(path("0-1")));
        assert_eq!(node.truncated(2), Some(node.clone()));
        assert_eq!(node.truncated(3), None);
        assert_eq!(path("0-1").next_sibling(), Some(path("0-2")));
        assert_eq!(NodePath::default().next_sibling(), None);
    }

    #[test]
    fn set_attr_touches_only_the_addressed_node() {
        let mut schema = Schema::default();
        let entry = |p: &str| SchemaEntry {
            key: None,
            path: path(p),
            depth: path(p).depth(),
            parent: None,
            is_root: true,
            has_child: false,
            is_async: false,
            is_open: false,
            checked: false,
            cached: false,
            loading: false,
        };
        let a = schema.alloc_id();
        let b = schema.alloc_id();
        schema.insert(a, entry("0"));
        schema.insert(b, entry("1"));

        assert!(schema.set_attr(a, NodeAttr::Loading, true));

        assert_eq!(schema.attr(a, NodeAttr::Loading), Some(true));
        assert_eq!(schema.attr(b, NodeAttr::Loading), Some(false));
        assert_eq!(schema.id_at(&path("1")), Some(b));
        assert!(!schema.set_attr(NodeId(99), NodeAttr::Open, true));
        assert_eq!(schema.attr(NodeId(99), NodeAttr::Open), None);
    }

    #[test]
    fn keys_index_the_first_holder() {
        let mut schema = Schema::default();
        let entry = |p: &str, key: &str| SchemaEntry {
            key: Some(NodeKey::from(key)),
            path: path(p),
            depth: path(p).depth(),
            parent: None,
            is_root: true,
            has_child: false,
            is_async: false,
            is_open: true,
            checked: false,
            cached: false,
            loading: false,
        };
        let a = schema.alloc_id();
        let b = schema.alloc_id();
        schema.insert(a, entry("0", "dup"));
        schema.insert(b, entry("1", "dup"));

        assert_eq!(schema.id_for_key(&NodeKey::from("dup")), Some(a));
        assert_eq!(schema.id_for_key(&NodeKey::from(7_u64)), None);
        assert_ne!(NodeKey::fresh(), NodeKey::fresh());
    }
}
