use std::future::poll_fn;
use std::task::{Context, Poll};

use futures::FutureExt;
use futures::future::LocalBoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use ratatui::layout::{Position, Rect};
use ratatui::widgets::TableState;

use crate::action::{TreeAction, TreeEvent, TreeHit, TreeHitArea};
use crate::error::{LoadError, TreeError};
use crate::flatten::{FlatEntry, flatten, flatten_from, node_at, node_at_mut};
use crate::loader::{LoadOutcome, Loaded};
use crate::model::TreeNode;
use crate::options::TreeOptions;
use crate::schema::{NodeAttr, NodeId, NodeKey, Schema, SchemaEntry};
use crate::visibility::{VisibleNode, collect_visible};

// The key identifies the node the load was issued for.
type PendingLoad<N> =
    LocalBoxFuture<'static, (NodeId, Option<NodeKey>, Result<Loaded<N>, LoadError>)>;

/// Rows drawn by the last render, used to map clicks back to nodes.
#[derive(Clone, Debug, Default)]
pub(crate) struct RenderedRows {
    pub(crate) area: Rect,
    pub(crate) content_x: u16,
    pub(crate) line_height: u16,
    // (node, width of the action area) per drawn row.
    pub(crate) rows: Vec<(NodeId, u16)>,
}

/// Tree state: the owned data set, its flattened form, per-node flags,
/// the single checked node, the scroll offset and in-flight child loads.
pub struct TreeViewState<N> {
    data: Vec<N>,
    options: TreeOptions<N>,
    flat: Vec<FlatEntry>,
    schema: Schema,
    // At most one checked node; the schema flag mirrors this.
    checked: Option<NodeId>,
    list_state: TableState,
    // Cached visible rows to avoid refiltering every render.
    visible_nodes: Vec<VisibleNode>,
    dirty: bool,
    draw_lines: bool,
    pending: FuturesUnordered<PendingLoad<N>>,
    rendered: RenderedRows,
}

impl<N: TreeNode + 'static> Default for TreeViewState<N> {
    fn default() -> Self {
        Self::new(Vec::new(), TreeOptions::default())
    }
}

impl<N: TreeNode + 'static> TreeViewState<N> {
    /// Creates a state over `data`; roots start open, everything else closed.
    pub fn new(data: Vec<N>, options: TreeOptions<N>) -> Self {
        let (flat, schema) = flatten(&data, &options.fields, None);
        let draw_lines = options.level_line;
        Self {
            visible_nodes: Vec::with_capacity(flat.len()),
            data,
            options,
            flat,
            schema,
            checked: None,
            list_state: TableState::default(),
            dirty: true,
            draw_lines,
            pending: FuturesUnordered::new(),
            rendered: RenderedRows::default(),
        }
    }

    pub fn data(&self) -> &[N] {
        &self.data
    }

    pub const fn options(&self) -> &TreeOptions<N> {
        &self.options
    }

    pub const fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Flattened nodes in pre-order.
    pub fn flat(&self) -> &[FlatEntry] {
        &self.flat
    }

    pub fn entry(&self, id: NodeId) -> Option<&SchemaEntry> {
        self.schema.get(id)
    }

    pub fn node(&self, id: NodeId) -> Option<&N> {
        let entry = self.schema.get(id)?;
        node_at(&self.data, &self.options.fields, &entry.path)
    }

    /// Returns the first node whose label equals `label`, in pre-order.
    pub fn find_by_label(&self, label: &str) -> Option<NodeId> {
        self.flat
            .iter()
            .find(|entry| {
                node_at(&self.data, &self.options.fields, &entry.path)
                    .is_some_and(|node| node.label(&self.options.fields) == label)
            })
            .map(|entry| entry.id)
    }

    pub const fn checked(&self) -> Option<NodeId> {
        self.checked
    }

    /// The checked node together with its schema entry.
    pub fn checked_node(&self) -> Option<(&N, &SchemaEntry)> {
        let id = self.checked?;
        Some((self.node(id)?, self.schema.get(id)?))
    }

    /// Reads a node flag.
    pub fn attr(&self, id: NodeId, attr: NodeAttr) -> Option<bool> {
        self.schema.attr(id, attr)
    }

    /// Writes a node flag.
    ///
    /// `Open` goes through [`Self::toggle_open`], so closing cascades to
    /// descendants. Opening a node under a closed ancestor is not refused and
    /// makes the node visible there, as the row filter only checks the direct
    /// parent. Writing `Checked` bypasses the single-selection bookkeeping;
    /// use [`Self::check`] for selection.
    pub fn set_attr(&mut self, id: NodeId, attr: NodeAttr, value: bool) -> Result<(), TreeError> {
        let current = self.schema.attr(id, attr).ok_or(TreeError::UnknownNode(id))?;
        if attr == NodeAttr::Open {
            if current != value {
                self.toggle_open(id);
            }
            return Ok(());
        }
        self.schema.set_attr(id, attr, value);
        self.dirty = true;
        Ok(())
    }

    /// Replaces the data set; all node state is reset.
    pub fn set_data(&mut self, data: Vec<N>) {
        self.data = data;
        let (flat, schema) =
            flatten_from(&self.data, &self.options.fields, None, self.schema.next_id());
        self.flat = flat;
        self.schema = schema;
        self.checked = None;
        self.list_state = TableState::default();
        self.dirty = true;
    }

    /// Mutates the data set in place, then re-flattens keeping node state.
    pub fn update_data<F>(&mut self, update: F)
    where
        F: FnOnce(&mut Vec<N>),
    {
        update(&mut self.data);
        self.reflatten();
    }

    fn reflatten(&mut self) {
        let (flat, schema) = flatten(&self.data, &self.options.fields, Some(&self.schema));
        self.flat = flat;
        self.schema = schema;
        if let Some(id) = self.checked
            && self.schema.attr(id, NodeAttr::Checked) != Some(true)
        {
            self.checked = None;
        }
        self.dirty = true;
    }

    /// Returns whether connector lines are drawn.
    #[inline]
    pub const fn draw_lines(&self) -> bool {
        self.draw_lines
    }

    pub const fn set_draw_lines(&mut self, draw: bool) {
        self.draw_lines = draw;
    }

    /// Marks the visible-node cache as dirty.
    pub const fn invalidate(&mut self) {
        self.dirty = true;
    }

    /// Ensures the visible node list is up to date (if marked dirty).
    pub fn ensure_visible_nodes(&mut self) {
        if !self.dirty {
            return;
        }
        collect_visible(&self.flat, &self.schema, &mut self.visible_nodes);
        self.dirty = false;
        self.clamp_offset();
    }

    /// Visible rows as of the last [`Self::ensure_visible_nodes`].
    pub fn visible_nodes(&self) -> &[VisibleNode] {
        &self.visible_nodes
    }

    /// Identifiers of the currently visible nodes.
    pub fn visible_ids(&mut self) -> Vec<NodeId> {
        self.ensure_visible_nodes();
        self.visible_nodes.iter().map(VisibleNode::id).collect()
    }

    pub const fn visible_len(&self) -> usize {
        self.visible_nodes.len()
    }

    /// Index of the first row in the viewport.
    pub fn offset(&self) -> usize {
        self.list_state.offset()
    }

    pub(crate) fn set_offset(&mut self, offset: usize) {
        *self.list_state.offset_mut() = offset;
    }

    /// Scrolls the view down by the given number of rows.
    pub fn scroll_down_by(&mut self, amount: u16) {
        self.ensure_visible_nodes();
        let offset = self.offset().saturating_add(usize::from(amount));
        self.set_offset(offset);
        self.clamp_offset();
    }

    /// Scrolls the view up by the given number of rows.
    pub fn scroll_up_by(&mut self, amount: u16) {
        let offset = self.offset().saturating_sub(usize::from(amount));
        self.set_offset(offset);
    }

    fn clamp_offset(&mut self) {
        let max = self.visible_nodes.len().saturating_sub(1);
        if self.list_state.offset() > max {
            *self.list_state.offset_mut() = max;
        }
    }

    pub(crate) fn set_rendered(&mut self, rendered: RenderedRows) {
        self.rendered = rendered;
    }

    /// Number of rows drawn by the last render.
    pub fn rendered_len(&self) -> usize {
        self.rendered.rows.len()
    }

    /// Flips the open flag of a node.
    ///
    /// Closing cascades: every flattened descendant is closed as well.
    /// Opening affects only the node itself.
    pub fn toggle_open(&mut self, id: NodeId) -> bool {
        let Some(entry) = self.schema.get(id) else {
            return false;
        };
        let open = !entry.is_open;
        let path = entry.path.clone();
        self.schema.set_attr(id, NodeAttr::Open, open);
        if !open {
            for entry in &self.flat {
                if entry.path.starts_with(&path) {
                    self.schema.set_attr(entry.id, NodeAttr::Open, false);
                }
            }
        }
        self.dirty = true;
        true
    }

    /// Expander click: starts a child load for uncached async nodes, then
    /// toggles nodes that have children.
    ///
    /// Loads are only issued when the click expands the node, and never
    /// while a load for the same node is in flight.
    pub fn activate(&mut self, id: NodeId) -> bool {
        let Some(entry) = self.schema.get(id) else {
            return false;
        };
        let has_child = entry.has_child;
        let loading = entry.loading;
        let wants_load = entry.is_async && !entry.cached && !(has_child && entry.is_open);
        if wants_load {
            if loading {
                log::debug!("node {id} is already loading, skipping load");
            } else if let Err(err) = self.start_load(id) {
                log::error!("{err}");
            }
        }
        if has_child {
            self.toggle_open(id);
        }
        true
    }

    /// Content click: makes `id` the single checked node.
    ///
    /// A node that was not open is activated as by an expander click.
    /// Clicking the already-checked node does nothing.
    pub fn check(&mut self, id: NodeId) -> TreeEvent {
        if self.checked == Some(id) {
            return TreeEvent::Unhandled;
        }
        let Some(is_open) = self.schema.attr(id, NodeAttr::Open) else {
            return TreeEvent::Unhandled;
        };
        if let Some(previous) = self.checked.take() {
            self.schema.set_attr(previous, NodeAttr::Checked, false);
        }
        self.schema.set_attr(id, NodeAttr::Checked, true);
        self.checked = Some(id);
        if !is_open {
            self.activate(id);
        }
        self.dirty = true;

        match self.schema.get(id) {
            Some(entry) => TreeEvent::Checked {
                id,
                entry: entry.clone(),
            },
            None => TreeEvent::Handled,
        }
    }

    /// Issues the configured loader for `id` and marks the node as loading.
    pub fn start_load(&mut self, id: NodeId) -> Result<(), TreeError> {
        let Some(async_load) = self.options.async_load.as_ref() else {
            return Err(TreeError::MissingLoader(id));
        };
        let entry = self.schema.get(id).ok_or(TreeError::UnknownNode(id))?;
        let node = node_at(&self.data, &self.options.fields, &entry.path).ok_or_else(|| {
            TreeError::StaleNode {
                id,
                path: entry.path.to_string(),
            }
        })?;
        let load = async_load.load(node, id);
        let key = entry.key.clone();
        log::debug!("loading children of node {id} at {}", entry.path);

        self.pending
            .push(async move { (id, key, load.await) }.boxed_local());
        self.schema.set_attr(id, NodeAttr::Loading, true);
        self.dirty = true;
        Ok(())
    }

    /// Number of loads still in flight.
    pub fn pending_loads(&self) -> usize {
        self.pending.len()
    }

    /// Settles one load: appends the children, opens the node when its
    /// parent is open, clears `loading` and, with caching on, sets `cached`.
    ///
    /// Failures only clear `loading`, so the next click retries. Results for
    /// a node that is gone, or whose id now belongs to another node, are
    /// discarded.
    fn apply_load(
        &mut self,
        id: NodeId,
        key: Option<&NodeKey>,
        result: Result<Loaded<N>, LoadError>,
    ) -> LoadOutcome {
        let cache = self
            .options
            .async_load
            .as_ref()
            .is_none_or(|async_load| async_load.is_cached());

        match self.settle_load(id, key, result, cache) {
            Ok(added) => {
                log::debug!("node {id} loaded {added} children");
                LoadOutcome::Loaded { id, added }
            }
            Err(err @ (TreeError::UnknownNode(_) | TreeError::StaleNode { .. })) => {
                log::warn!("dropping load result: {err}");
                LoadOutcome::Discarded { id }
            }
            Err(TreeError::Load { id, source }) => {
                log::error!("load remote data error for node {id}: {source}");
                LoadOutcome::Failed { id }
            }
            Err(err) => {
                log::error!("{err}");
                LoadOutcome::Failed { id }
            }
        }
    }

    fn settle_load(
        &mut self,
        id: NodeId,
        key: Option<&NodeKey>,
        result: Result<Loaded<N>, LoadError>,
        cache: bool,
    ) -> Result<usize, TreeError> {
        let entry = self.schema.get(id).ok_or(TreeError::UnknownNode(id))?;
        let path = entry.path.clone();
        if entry.key.as_ref() != key {
            return Err(TreeError::StaleNode {
                id,
                path: path.to_string(),
            });
        }
        // A collapsed parent keeps its subtree hidden until the next click.
        let reveal = entry.is_root
            || entry
                .parent
                .and_then(|parent| self.schema.attr(parent, NodeAttr::Open))
                .unwrap_or(false);
        self.schema.set_attr(id, NodeAttr::Loading, false);
        self.dirty = true;

        let loaded = result.map_err(|source| TreeError::Load { id, source })?;
        if matches!(loaded, Loaded::Empty) {
            if cache {
                self.schema.set_attr(id, NodeAttr::Cached, true);
            }
            return Ok(0);
        }

        let fields = self.options.fields;
        let node = node_at_mut(&mut self.data, &fields, &path).ok_or_else(|| {
            TreeError::StaleNode {
                id,
                path: path.to_string(),
            }
        })?;
        let nodes = loaded.into_vec();
        let added = nodes.len();
        if !node.append_children(&fields, nodes) {
            return Err(TreeError::NotAContainer(id));
        }

        if reveal {
            self.schema.set_attr(id, NodeAttr::Open, true);
        }
        if cache {
            self.schema.set_attr(id, NodeAttr::Cached, true);
        }
        self.reflatten();
        Ok(added)
    }

    /// Polls in-flight loads and applies the next one that settles.
    ///
    /// Returns `Ready(None)` when nothing is in flight.
    pub fn poll_loads(&mut self, cx: &mut Context<'_>) -> Poll<Option<LoadOutcome>> {
        match self.pending.poll_next_unpin(cx) {
            Poll::Ready(Some((id, key, result))) => {
                Poll::Ready(Some(self.apply_load(id, key.as_ref(), result)))
            }
            Poll::Ready(None) => Poll::Ready(None),
            Poll::Pending => Poll::Pending,
        }
    }

    /// Waits for the next load to settle and applies it.
    pub async fn next_load(&mut self) -> Option<LoadOutcome> {
        poll_fn(|cx| self.poll_loads(cx)).await
    }

    /// Applies every load that has already settled, without blocking.
    ///
    /// Meant to be called once per frame from a synchronous event loop.
    pub fn drain_ready_loads(&mut self) -> Vec<LoadOutcome> {
        let mut cx = Context::from_waker(futures::task::noop_waker_ref());
        let mut outcomes = Vec::new();
        while let Poll::Ready(Some(outcome)) = self.poll_loads(&mut cx) {
            outcomes.push(outcome);
        }
        outcomes
    }

    /// Handles a tree action and returns the resulting event.
    pub fn handle_action(&mut self, action: TreeAction) -> TreeEvent {
        match action {
            TreeAction::Toggle(id) => {
                if self.activate(id) {
                    TreeEvent::Handled
                } else {
                    TreeEvent::Unhandled
                }
            }
            TreeAction::Check(id) => self.check(id),
            TreeAction::ToggleLines => {
                self.draw_lines = !self.draw_lines;
                TreeEvent::Handled
            }
            TreeAction::ScrollUp(amount) => {
                self.scroll_up_by(amount);
                TreeEvent::Handled
            }
            TreeAction::ScrollDown(amount) => {
                self.scroll_down_by(amount);
                TreeEvent::Handled
            }
        }
    }

    /// Resolves screen coordinates against the last rendered frame.
    pub fn hit_test(&self, column: u16, row: u16) -> Option<TreeHit> {
        let rendered = &self.rendered;
        if !rendered.area.contains(Position::new(column, row)) {
            return None;
        }
        let line_height = rendered.line_height.max(1);
        let idx = usize::from((row - rendered.area.y) / line_height);
        let (id, action_width) = rendered.rows.get(idx).copied()?;
        let action_end = rendered.content_x.saturating_add(action_width);
        let area = if (rendered.content_x..action_end).contains(&column) {
            TreeHitArea::Action
        } else {
            TreeHitArea::Content
        };
        Some(TreeHit { id, area })
    }

    /// Handles a click: the action area toggles, the content area checks.
    pub fn handle_click(&mut self, column: u16, row: u16) -> TreeEvent {
        match self.hit_test(column, row) {
            Some(TreeHit {
                id,
                area: TreeHitArea::Action,
            }) => self.handle_action(TreeAction::Toggle(id)),
            Some(TreeHit {
                id,
                area: TreeHitArea::Content,
            }) => self.handle_action(TreeAction::Check(id)),
            None => TreeEvent::Unhandled,
        }
    }
}
