use std::borrow::Cow;

use ratatui::text::{Line, Span};

use crate::context::TreeRowContext;

#[derive(Clone, Copy, Debug)]
pub struct TreeGlyphs<'a> {
    pub indent: &'a str,
    pub branch_last: &'a str,
    pub branch: &'a str,
    pub vert: &'a str,
    pub empty: &'a str,
    pub expanded: &'a str,
    pub collapsed: &'a str,
    /// Placeholder in the expander slot of nodes that cannot expand.
    pub blank: &'a str,
    pub folder: &'a str,
    pub folder_open: &'a str,
    pub file: &'a str,
    pub loading: &'a str,
}

impl TreeGlyphs<'static> {
    pub const fn unicode() -> Self {
        Self {
            indent: "   ",
            branch_last: "└──",
            branch: "├──",
            vert: "│  ",
            empty: "   ",
            expanded: "▼",
            collapsed: "▶",
            blank: " ",
            folder: "▸",
            folder_open: "▾",
            file: "•",
            loading: "⟳",
        }
    }

    pub const fn ascii() -> Self {
        Self {
            indent: "   ",
            branch_last: "`--",
            branch: "|--",
            vert: "|  ",
            empty: "   ",
            expanded: "v",
            collapsed: ">",
            blank: " ",
            folder: "+",
            folder_open: "-",
            file: "*",
            loading: "~",
        }
    }
}

impl Default for TreeGlyphs<'static> {
    fn default() -> Self {
        Self::unicode()
    }
}

/// Resolved pieces of a row label.
#[derive(Clone, Debug, Default)]
pub struct TreeLabelParts<'a> {
    pub label: Cow<'a, str>,
    pub action: Option<Vec<Span<'a>>>,
    pub node_type: Option<Vec<Span<'a>>>,
    pub loading: bool,
}

/// Composes a row label.
///
/// Returns the line and the width of its action area (guides and expander),
/// which is what a click must land in to toggle the node.
pub fn tree_label_line<'a>(
    ctx: &TreeRowContext<'_>,
    parts: TreeLabelParts<'a>,
    glyphs: &TreeGlyphs<'a>,
) -> (Line<'a>, u16) {
    let TreeLabelParts {
        label,
        action,
        node_type,
        loading,
    } = parts;
    let mut spans = Vec::with_capacity(usize::from(ctx.depth) + 8);

    if ctx.draw_lines && ctx.depth > 0 {
        for level in 1..=ctx.depth {
            let part = if level == ctx.depth {
                if ctx.is_last {
                    glyphs.branch_last
                } else {
                    glyphs.branch
                }
            } else if ctx
                .connectors
                .get(usize::from(level) - 1)
                .copied()
                .unwrap_or(false)
            {
                glyphs.vert
            } else {
                glyphs.indent
            };
            spans.push(Span::styled(part, ctx.line_style));
        }
    } else {
        for _ in 0..ctx.depth {
            spans.push(Span::raw(glyphs.empty));
        }
    }

    if let Some(action) = action {
        spans.extend(action);
        spans.push(Span::raw(" "));
    }
    let action_width = spans_width(&spans);

    if let Some(node_type) = node_type {
        spans.extend(node_type);
        spans.push(Span::raw(" "));
    }
    if loading {
        spans.push(Span::styled(glyphs.loading, ctx.loading_style));
        spans.push(Span::raw(" "));
    }

    spans.push(Span::raw(label));
    (Line::from(spans), action_width)
}

fn spans_width(spans: &[Span<'_>]) -> u16 {
    let width: usize = spans.iter().map(Span::width).sum();
    u16::try_from(width).unwrap_or(u16::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::style::Style;

    fn ctx(depth: u16, connectors: &[bool], is_last: bool, draw_lines: bool) -> TreeRowContext<'_> {
        TreeRowContext {
            depth,
            connectors,
            is_last,
            draw_lines,
            line_style: Style::default(),
            loading_style: Style::default(),
        }
    }

    fn text(line: &Line<'_>) -> String {
        line.spans.iter().map(|span| span.content.as_ref()).collect()
    }

    #[test]
    fn draws_guides_from_connector_mask() {
        let glyphs = TreeGlyphs::ascii();
        let parts = TreeLabelParts {
            label: "leaf".into(),
            action: Some(vec![Span::raw(glyphs.blank)]),
            node_type: Some(vec![Span::raw(glyphs.file)]),
            loading: false,
        };

        let (line, action_width) = tree_label_line(&ctx(2, &[true, true], true, true), parts, &glyphs);

        assert_eq!(text(&line), "|  `--  * leaf");
        assert_eq!(action_width, 8);
    }

    #[test]
    fn indents_without_guides_and_shows_loading() {
        let glyphs = TreeGlyphs::ascii();
        let parts = TreeLabelParts {
            label: "remote".into(),
            action: Some(vec![Span::raw(glyphs.collapsed)]),
            node_type: None,
            loading: true,
        };

        let (line, action_width) = tree_label_line(&ctx(1, &[true], false, false), parts, &glyphs);

        assert_eq!(text(&line), "   > ~ remote");
        assert_eq!(action_width, 5);
    }

    #[test]
    fn bare_label_has_no_action_area() {
        let glyphs = TreeGlyphs::unicode();
        let parts = TreeLabelParts {
            label: "root".into(),
            ..TreeLabelParts::default()
        };

        let (line, action_width) = tree_label_line(&ctx(0, &[], true, true), parts, &glyphs);

        assert_eq!(text(&line), "root");
        assert_eq!(action_width, 0);
    }
}
