use std::marker::PhantomData;

use ratatui::layout::{Constraint, Rect};
use ratatui::prelude::Buffer;
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Block, Borders, Cell, HighlightSpacing, Row, Scrollbar, ScrollbarOrientation,
    ScrollbarState, StatefulWidget, Table, TableState,
};

use crate::context::TreeRowContext;
use crate::flatten::node_at;
use crate::glyphs::{TreeGlyphs, TreeLabelParts, tree_label_line};
use crate::model::TreeNode;
use crate::options::{IconChoice, IconContext, IconKind, TreeOptions};
use crate::schema::{NodeId, SchemaEntry};
use crate::state::{RenderedRows, TreeViewState};
use crate::style::TreeViewStyle;
use crate::visibility::VisibleNode;

/// Основной виджет дерева (table + stateful) поверх [`TreeViewState`].
pub struct TreeView<'a, N> {
    style: TreeViewStyle<'a>,
    glyphs: TreeGlyphs<'a>,
    _node: PhantomData<fn() -> N>,
}

impl<'a, N> TreeView<'a, N> {
    pub const fn new(style: TreeViewStyle<'a>) -> Self {
        Self {
            style,
            glyphs: TreeGlyphs::unicode(),
            _node: PhantomData,
        }
    }

    #[must_use]
    pub const fn glyphs(mut self, glyphs: TreeGlyphs<'a>) -> Self {
        self.glyphs = glyphs;
        self
    }
}

impl<'a, N: TreeNode + 'static> TreeView<'a, N> {
    fn icon<'s>(
        &self,
        options: &TreeOptions<N>,
        ctx: &IconContext<'_, N>,
        entry: &SchemaEntry,
        glyphs: &TreeGlyphs<'s>,
    ) -> Option<Vec<Span<'s>>> {
        match options.prefix_icon.resolve(ctx) {
            IconChoice::Hidden => None,
            IconChoice::Value(value) => Some(value.into_spans()),
            IconChoice::Default => {
                let glyph = match ctx.kind {
                    IconKind::Action if entry.is_expandable() => {
                        if entry.is_open {
                            glyphs.expanded
                        } else {
                            glyphs.collapsed
                        }
                    }
                    IconKind::Action => glyphs.blank,
                    IconKind::NodeType if entry.is_root || entry.has_child => {
                        if entry.is_open {
                            glyphs.folder_open
                        } else {
                            glyphs.folder
                        }
                    }
                    IconKind::NodeType => glyphs.file,
                };
                Some(vec![Span::raw(glyph)])
            }
        }
    }

    #[inline]
    fn build_rows<'s>(
        &self,
        nodes: &[VisibleNode],
        state: &'s TreeViewState<N>,
        glyphs: &TreeGlyphs<'s>,
        line_height: u16,
    ) -> (Vec<Row<'s>>, Vec<(NodeId, u16)>) {
        let options = state.options();
        let fields = &options.fields;
        let mut rows = Vec::with_capacity(nodes.len());
        let mut hits = Vec::with_capacity(nodes.len());
        for visible in nodes {
            let Some(entry) = state.schema().get(visible.id) else {
                continue;
            };
            let Some(node) = node_at(state.data(), fields, &entry.path) else {
                continue;
            };
            let mut icon_ctx = IconContext {
                is_root: entry.is_root,
                expandable: entry.is_expandable(),
                is_open: entry.is_open,
                kind: IconKind::Action,
                node,
            };
            let action = self.icon(options, &icon_ctx, entry, glyphs);
            icon_ctx.kind = IconKind::NodeType;
            let node_type = self.icon(options, &icon_ctx, entry, glyphs);

            let ctx = TreeRowContext {
                depth: visible.depth,
                connectors: visible.connectors.as_slice(),
                is_last: visible.is_last,
                draw_lines: state.draw_lines(),
                line_style: self.style.line_style,
                loading_style: self.style.loading_style,
            };
            let parts = TreeLabelParts {
                label: node.label(fields),
                action,
                node_type,
                loading: entry.loading,
            };
            let (line, action_width) = tree_label_line(&ctx, parts, glyphs);
            rows.push(Row::new([Cell::from(line)]).height(line_height));
            hits.push((visible.id, action_width));
        }
        (rows, hits)
    }

    #[inline]
    fn render_scrollbar(
        &self,
        area: Rect,
        buf: &mut Buffer,
        offset: usize,
        viewport_rows: usize,
        scroll_rows: usize,
    ) {
        let scroll_len = scroll_rows.saturating_add(1);
        let position = offset.min(scroll_len.saturating_sub(1));
        let mut scrollbar_state = ScrollbarState::new(scroll_len)
            .position(position)
            .viewport_content_length(viewport_rows);
        Scrollbar::default()
            .orientation(ScrollbarOrientation::VerticalRight)
            .render(area, buf, &mut scrollbar_state);
    }
}

impl<N: TreeNode + 'static> StatefulWidget for TreeView<'_, N> {
    type State = TreeViewState<N>;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        state.ensure_visible_nodes();

        let mut block = Block::default().borders(self.style.borders);
        if let Some(title) = self.style.title.clone() {
            block = block.title(title);
        }
        block = block
            .style(self.style.block_style)
            .border_style(self.style.border_style);

        let line_height = state.options().line_height.max(1);
        let viewport_rows = usize::from((block.inner(area).height / line_height).max(1));
        let total_rows = state.visible_len();
        let scroll_rows = total_rows.saturating_sub(viewport_rows);
        let offset = state.offset().min(scroll_rows);
        state.set_offset(offset);
        let view_end = (offset + viewport_rows).min(total_rows);

        // Virtualized: only the viewport slice is built. Otherwise every row
        // is built and the table skips to the offset itself.
        let (range_start, range_end) = if state.options().virtual_render {
            (offset, view_end)
        } else {
            (0, total_rows)
        };

        let (table_area, table_block, scrollbar_area) = if scroll_rows > 0 {
            let table_area = Rect {
                width: area.width.saturating_sub(1),
                ..area
            };
            let scrollbar_area = Rect {
                x: area.x + area.width.saturating_sub(1),
                y: area.y,
                width: 1,
                height: area.height,
            };
            let mut table_borders = self.style.borders;
            table_borders.remove(Borders::RIGHT);
            (table_area, block.borders(table_borders), Some(scrollbar_area))
        } else {
            (area, block, None)
        };
        let inner = table_block.inner(table_area);
        let symbol_width = u16::try_from(Line::from(self.style.highlight_symbol).width())
            .unwrap_or(u16::MAX);

        let state_ref: &TreeViewState<N> = state;
        let nodes = &state_ref.visible_nodes()[range_start..range_end];
        let (rows, hits) = self.build_rows(nodes, state_ref, &self.glyphs, line_height);

        // Only select the checked row when it is on screen, so the table
        // never scrolls away from the offset.
        let checked_row = state_ref.checked().and_then(|checked| {
            nodes
                .iter()
                .position(|node| node.id == checked)
                .filter(|&idx| (offset..view_end).contains(&(range_start + idx)))
        });
        let mut table_state = TableState::default()
            .with_offset(offset - range_start)
            .with_selected(checked_row);

        let table = Table::new(rows, [Constraint::Percentage(100)])
            .style(self.style.block_style)
            .block(table_block)
            .row_highlight_style(self.style.highlight_style)
            .highlight_symbol(self.style.highlight_symbol)
            .highlight_spacing(HighlightSpacing::Always);
        StatefulWidget::render(table, table_area, buf, &mut table_state);

        let shown = offset - range_start..view_end - range_start;
        let rendered = RenderedRows {
            area: inner,
            content_x: inner.x.saturating_add(symbol_width),
            line_height,
            rows: hits.get(shown).map_or_else(Vec::new, <[_]>::to_vec),
        };
        state.set_rendered(rendered);

        if let Some(scrollbar_area) = scrollbar_area {
            self.render_scrollbar(scrollbar_area, buf, offset, viewport_rows, scroll_rows);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{TreeEvent, TreeHitArea};
    use crate::model::TreeItem;
    use crate::options::{IconValue, PrefixIcon};

    fn sample(children: usize) -> Vec<TreeItem> {
        let kids = (0..children)
            .map(|idx| TreeItem::new(format!("node-{idx}")))
            .collect();
        vec![TreeItem::new("root").with_children(kids)]
    }

    fn row_text(buffer: &Buffer, y: u16) -> String {
        let area = buffer.area;
        (area.x..area.x + area.width)
            .map(|x| buffer[(x, y)].symbol())
            .collect::<String>()
    }

    fn render(state: &mut TreeViewState<TreeItem>, area: Rect) -> Buffer {
        let widget = TreeView::new(TreeViewStyle::default()).glyphs(TreeGlyphs::ascii());
        let mut buffer = Buffer::empty(area);
        widget.render(area, &mut buffer, state);
        buffer
    }

    #[test]
    fn render_smoke_with_scrollbar() {
        let mut state = TreeViewState::new(sample(12), TreeOptions::default());
        let area = Rect::new(0, 0, 20, 6);

        let buffer = render(&mut state, area);

        assert!(row_text(&buffer, 1).contains("root"));
        assert!(row_text(&buffer, 2).contains("node-0"));
        assert_eq!(state.rendered_len(), 4);
    }

    #[test]
    fn draws_connector_lines() {
        let options = TreeOptions::default().level_line(true);
        let mut state = TreeViewState::new(sample(2), options);

        let buffer = render(&mut state, Rect::new(0, 0, 30, 5));

        assert_eq!(row_text(&buffer, 1).trim_end_matches(['│', '┐', '┘', ' ']), "│   v - root");
        assert!(row_text(&buffer, 2).starts_with("│   |--  * node-0"));
        assert!(row_text(&buffer, 3).starts_with("│   `--  * node-1"));
    }

    #[test]
    fn virtualized_and_full_render_agree() {
        let area = Rect::new(0, 0, 24, 6);
        let mut virtual_state =
            TreeViewState::new(sample(20), TreeOptions::default().virtual_render(true));
        let mut full_state =
            TreeViewState::new(sample(20), TreeOptions::default().virtual_render(false));
        virtual_state.scroll_down_by(5);
        full_state.scroll_down_by(5);

        let virtual_buffer = render(&mut virtual_state, area);
        let full_buffer = render(&mut full_state, area);

        assert_eq!(virtual_buffer, full_buffer);
        assert!(row_text(&virtual_buffer, 1).contains("node-4"));
    }

    #[test]
    fn click_on_rendered_rows() {
        let mut state = TreeViewState::new(sample(3), TreeOptions::default());
        render(&mut state, Rect::new(0, 0, 30, 8));

        // Border (1) + highlight spacing (3), then the expander of the root.
        let hit = state.hit_test(4, 1).unwrap();
        assert_eq!(hit.area, TreeHitArea::Action);
        let node_1 = state.find_by_label("node-1").unwrap();
        assert!(matches!(state.handle_click(12, 3), TreeEvent::Checked { id, .. } if id == node_1));

        let buffer = render(&mut state, Rect::new(0, 0, 30, 8));
        assert!(row_text(&buffer, 3).starts_with("│>> "));

        state.handle_click(4, 1);
        assert_eq!(state.visible_ids().len(), 1);
    }

    #[test]
    fn custom_icons_replace_defaults() {
        let options = TreeOptions::default().prefix_icon(PrefixIcon::<TreeItem>::custom(|ctx| {
            match ctx.kind {
                IconKind::NodeType if ctx.is_root => IconChoice::Value(IconValue::Text("@".into())),
                IconKind::NodeType => IconChoice::Hidden,
                IconKind::Action => IconChoice::Default,
            }
        }));
        let mut state = TreeViewState::new(sample(1), options);

        let buffer = render(&mut state, Rect::new(0, 0, 30, 5));

        assert!(row_text(&buffer, 1).starts_with("│   v @ root"));
        assert!(row_text(&buffer, 2).starts_with("│        node-0"));
    }

    #[test]
    fn taller_rows_fit_fewer_nodes() {
        let options = TreeOptions::default().line_height(2);
        let mut state = TreeViewState::new(sample(5), options);

        let buffer = render(&mut state, Rect::new(0, 0, 20, 6));

        assert_eq!(state.rendered_len(), 2);
        assert!(row_text(&buffer, 3).contains("node-0"));
        let node_0 = state.find_by_label("node-0").unwrap();
        assert_eq!(state.hit_test(12, 4).map(|hit| hit.id), Some(node_0));
    }
}
