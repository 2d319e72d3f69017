use crate::model::{TreeFields, TreeNode};
use crate::schema::{NodeId, NodeKey, NodePath, Schema, SchemaEntry};

/// One flattened node: its identifier and the position it is read from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FlatEntry {
    pub id: NodeId,
    pub path: NodePath,
}

/// Flattens `roots` in pre-order into a node sequence and its schema.
///
/// With a `previous` schema, a node keeps its identifier and its
/// open/checked/cached/loading flags when its [`TreeNode::key`] was seen
/// before, or, for keyless nodes, when a keyless node sat at the same path.
/// All other nodes receive fresh identifiers and default flags (roots start
/// open).
pub fn flatten<N: TreeNode>(
    roots: &[N],
    fields: &TreeFields<'_>,
    previous: Option<&Schema>,
) -> (Vec<FlatEntry>, Schema) {
    flatten_from(roots, fields, previous, previous.map_or(0, Schema::next_id))
}

/// Like [`flatten`], with fresh identifiers starting at `first_id`.
pub(crate) fn flatten_from<N: TreeNode>(
    roots: &[N],
    fields: &TreeFields<'_>,
    previous: Option<&Schema>,
    first_id: u32,
) -> (Vec<FlatEntry>, Schema) {
    let capacity = previous.map_or(roots.len(), Schema::len);
    let mut flat = Vec::with_capacity(capacity);
    let mut schema = Schema::with_capacity(capacity);
    schema.set_next_id(first_id);

    for (index, node) in roots.iter().enumerate() {
        let path = NodePath::root(sibling_index(index));
        push_node(node, fields, path, None, previous, &mut flat, &mut schema);
    }
    (flat, schema)
}

fn push_node<N: TreeNode>(
    node: &N,
    fields: &TreeFields<'_>,
    path: NodePath,
    parent: Option<NodeId>,
    previous: Option<&Schema>,
    flat: &mut Vec<FlatEntry>,
    schema: &mut Schema,
) {
    let children = node.children(fields);
    let is_root = parent.is_none();
    let key = node.key(fields);
    let reused = previous.and_then(|prev| reuse(prev, schema, key.as_ref(), &path));

    let (id, is_open, checked, cached, loading) = match reused {
        Some((id, entry)) => (id, entry.is_open, entry.checked, entry.cached, entry.loading),
        None => (schema.alloc_id(), is_root, false, false, false),
    };

    flat.push(FlatEntry {
        id,
        path: path.clone(),
    });
    schema.insert(
        id,
        SchemaEntry {
            key,
            depth: path.depth(),
            path: path.clone(),
            parent,
            is_root,
            has_child: !children.is_empty(),
            is_async: node.is_async(fields),
            is_open,
            checked,
            cached,
            loading,
        },
    );

    for (index, child) in children.iter().enumerate() {
        let child_path = path.child(sibling_index(index));
        push_node(child, fields, child_path, Some(id), previous, flat, schema);
    }
}

// An id is handed out once per pass, so duplicated keys fall back to fresh ids.
fn reuse<'p>(
    prev: &'p Schema,
    current: &Schema,
    key: Option<&NodeKey>,
    path: &NodePath,
) -> Option<(NodeId, &'p SchemaEntry)> {
    let id = match key {
        Some(key) => prev.id_for_key(key)?,
        None => prev.id_at(path)?,
    };
    let entry = prev.get(id)?;
    if current.contains(id) || (key.is_none() && entry.key.is_some()) {
        return None;
    }
    Some((id, entry))
}

fn sibling_index(index: usize) -> u32 {
    u32::try_from(index).unwrap_or(u32::MAX)
}

/// Resolves the node at `path`.
pub fn node_at<'a, N: TreeNode>(
    roots: &'a [N],
    fields: &TreeFields<'_>,
    path: &NodePath,
) -> Option<&'a N> {
    let (first, rest) = path.segments().split_first()?;
    let mut node = roots.get(*first as usize)?;
    for index in rest {
        node = node.children(fields).get(*index as usize)?;
    }
    Some(node)
}

/// Resolves the node at `path` for mutation.
pub fn node_at_mut<'a, N: TreeNode>(
    roots: &'a mut [N],
    fields: &TreeFields<'_>,
    path: &NodePath,
) -> Option<&'a mut N> {
    let (first, rest) = path.segments().split_first()?;
    let mut node = roots.get_mut(*first as usize)?;
    for index in rest {
        node = node.children_mut(fields)?.get_mut(*index as usize)?;
    }
    Some(node)
}
