use smallvec::SmallVec;

use crate::schema::{NodePath, Schema};

/// Returns `true` if the vertical connector at `depth` is drawn on the row
/// of the node at `path`.
///
/// The segment at the node's own depth is always drawn. Above that, the line
/// continues while the ancestor at `depth` still has a following sibling.
pub fn connector_at(schema: &Schema, path: &NodePath, depth: u16) -> bool {
    let node_depth = path.depth();
    if node_depth == 0 || depth == 0 || depth > node_depth {
        return false;
    }
    if depth == node_depth {
        return true;
    }
    path.truncated(depth)
        .and_then(|ancestor| ancestor.next_sibling())
        .is_some_and(|next| schema.contains_path(&next))
}

/// Connector mask for levels `1..=depth` (index `0` is level 1).
///
/// Roots yield an empty mask.
pub fn connectors(schema: &Schema, path: &NodePath) -> SmallVec<[bool; 8]> {
    (1..=path.depth())
        .map(|depth| connector_at(schema, path, depth))
        .collect()
}

/// Returns `true` if no sibling follows the node at `path`.
pub fn is_last_sibling(schema: &Schema, path: &NodePath) -> bool {
    path.next_sibling()
        .is_none_or(|next| !schema.contains_path(&next))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flatten::flatten;
    use crate::model::{TreeFields, TreeItem};

    fn leaf(label: &str) -> TreeItem {
        TreeItem::new(label)
    }

    fn branch(label: &str, children: Vec<TreeItem>) -> TreeItem {
        TreeItem::new(label).with_children(children)
    }

    fn path(text: &str) -> NodePath {
        text.parse().unwrap()
    }

    #[test]
    fn ancestor_line_continues_while_siblings_follow() {
        // 0 { 0-0, 0-1 { 0-1-0 }, 0-2 }
        let roots = vec![branch(
            "root",
            vec![leaf("a"), branch("b", vec![leaf("b0")]), leaf("c")],
        )];
        let (_, schema) = flatten(&roots, &TreeFields::default(), None);

        assert!(connector_at(&schema, &path("0-1-0"), 1));
        assert!(connector_at(&schema, &path("0-1-0"), 2));
        assert_eq!(connectors(&schema, &path("0-1-0")).as_slice(), &[true, true]);
    }

    #[test]
    fn ancestor_line_stops_after_last_sibling() {
        // 0 { 0-0, 0-1 { 0-1-0 } }
        let roots = vec![branch("root", vec![leaf("a"), branch("b", vec![leaf("b0")])])];
        let (_, schema) = flatten(&roots, &TreeFields::default(), None);

        assert!(!connector_at(&schema, &path("0-1-0"), 1));
        assert_eq!(connectors(&schema, &path("0-1-0")).as_slice(), &[false, true]);
        assert!(is_last_sibling(&schema, &path("0-1")));
        assert!(!is_last_sibling(&schema, &path("0-0")));
    }

    #[test]
    fn roots_draw_no_connector() {
        let roots = vec![branch("root", vec![leaf("a")]), leaf("other")];
        let (_, schema) = flatten(&roots, &TreeFields::default(), None);

        assert!(connectors(&schema, &path("0")).is_empty());
        assert!(!connector_at(&schema, &path("0"), 0));
        assert!(!connector_at(&schema, &path("0-0"), 0));
    }
}
