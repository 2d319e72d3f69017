use smallvec::SmallVec;

use crate::flatten::FlatEntry;
use crate::lines;
use crate::schema::{NodeId, Schema, SchemaEntry};

/// A visible node row with metadata used for rendering and hit-testing.
#[derive(Clone, Debug)]
pub struct VisibleNode {
    pub(crate) id: NodeId,
    pub(crate) depth: u16,
    pub(crate) is_last: bool,
    pub(crate) connectors: SmallVec<[bool; 8]>,
}

impl VisibleNode {
    #[inline]
    pub const fn id(&self) -> NodeId {
        self.id
    }

    #[inline]
    pub const fn depth(&self) -> u16 {
        self.depth
    }
}

/// Row filter: roots, open nodes and children of open nodes are shown.
///
/// Only the direct parent is consulted; collapsing cascades to descendants,
/// so a closed ancestor further up never leaves an open node behind.
pub fn is_visible(schema: &Schema, entry: &SchemaEntry) -> bool {
    entry.is_root
        || entry.is_open
        || entry
            .parent
            .and_then(|parent| schema.get(parent))
            .is_some_and(|parent| parent.is_open)
}

/// Identifiers of the visible nodes, in flattened order.
pub fn visible_ids<'a>(
    flat: &'a [FlatEntry],
    schema: &'a Schema,
) -> impl Iterator<Item = NodeId> + 'a {
    flat.iter()
        .filter(|entry| {
            schema
                .get(entry.id)
                .is_some_and(|meta| is_visible(schema, meta))
        })
        .map(|entry| entry.id)
}

/// Rebuilds `out` with the visible rows and their connector masks.
pub(crate) fn collect_visible(flat: &[FlatEntry], schema: &Schema, out: &mut Vec<VisibleNode>) {
    out.clear();
    for entry in flat {
        let Some(meta) = schema.get(entry.id) else {
            continue;
        };
        if !is_visible(schema, meta) {
            continue;
        }
        out.push(VisibleNode {
            id: entry.id,
            depth: meta.depth,
            is_last: lines::is_last_sibling(schema, &meta.path),
            connectors: lines::connectors(schema, &meta.path),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flatten::flatten;
    use crate::model::{TreeFields, TreeItem};
    use crate::schema::NodeAttr;

    fn sample() -> Vec<TreeItem> {
        vec![TreeItem::new("r").with_children(vec![
            TreeItem::new("a").with_children(vec![
                TreeItem::new("a1").with_children(vec![TreeItem::new("a1x")]),
            ]),
            TreeItem::new("b"),
        ])]
    }

    #[test]
    fn open_root_shows_its_children_only() {
        let roots = sample();
        let (flat, schema) = flatten(&roots, &TreeFields::default(), None);

        let ids: Vec<_> = visible_ids(&flat, &schema).collect();
        assert_eq!(ids, vec![flat[0].id, flat[1].id, flat[4].id]);
    }

    #[test]
    fn opening_a_child_reveals_grandchildren() {
        let roots = sample();
        let (flat, mut schema) = flatten(&roots, &TreeFields::default(), None);
        schema.set_attr(flat[1].id, NodeAttr::Open, true);

        let mut rows = Vec::new();
        collect_visible(&flat, &schema, &mut rows);

        let ids: Vec<_> = rows.iter().map(VisibleNode::id).collect();
        assert_eq!(ids, vec![flat[0].id, flat[1].id, flat[2].id, flat[4].id]);
        assert_eq!(rows[2].depth(), 2);
        assert_eq!(rows[2].connectors.as_slice(), &[true, true]);
        assert!(rows[2].is_last);
        assert!(!rows[1].is_last);
    }

    #[test]
    fn closed_root_hides_everything_below() {
        let roots = sample();
        let (flat, mut schema) = flatten(&roots, &TreeFields::default(), None);
        schema.set_attr(flat[0].id, NodeAttr::Open, false);

        let ids: Vec<_> = visible_ids(&flat, &schema).collect();
        assert_eq!(ids, vec![flat[0].id]);
    }
}
