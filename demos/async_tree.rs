// Async example: a lazy folder fetches its children through a future, and the
// result is rendered into an in-memory buffer (no terminal required).
use futures::FutureExt;
use futures::executor::block_on;
use ratatui::layout::Rect;
use ratatui::prelude::Buffer;
use ratatui::widgets::StatefulWidget;

use tui_lazytree::{
    AsyncLoad, Loaded, TreeAction, TreeEvent, TreeItem, TreeNode, TreeOptions, TreeView,
    TreeViewState, TreeViewStyle,
};

fn main() {
    env_logger::init();

    // A static branch next to a lazy one.
    let data = vec![TreeItem::new("workspace").with_children(vec![
        TreeItem::new("src").with_children(vec![TreeItem::new("lib.rs")]),
        TreeItem::lazy("remote"),
        TreeItem::new("Cargo.toml"),
    ])];

    // The loader receives the clicked node; here it answers immediately.
    let loader = AsyncLoad::new(|node: &TreeItem, _id| {
        let prefix = node.label.clone();
        async move {
            Ok(Loaded::Nodes(vec![
                TreeItem::new(format!("{prefix}/a.txt")),
                TreeItem::lazy(format!("{prefix}/nested")),
            ]))
        }
        .boxed_local()
    });

    let options = TreeOptions::default().level_line(true).async_load(loader);
    let mut state = TreeViewState::new(data, options);

    // Selecting the lazy node starts its load.
    if let Some(remote) = state.find_by_label("remote")
        && let TreeEvent::Checked { entry, .. } = state.handle_action(TreeAction::Check(remote))
    {
        println!("checked {} (loading: {})", entry.path, entry.loading);
    }
    while let Some(outcome) = block_on(state.next_load()) {
        println!("settled: {outcome:?}");
    }

    if let Some((node, entry)) = state.checked_node() {
        let fields = state.options().fields;
        println!("{} has {} children", entry.path, node.children(&fields).len());
    }

    let area = Rect::new(0, 0, 40, 10);
    let mut buffer = Buffer::empty(area);
    TreeView::new(TreeViewStyle::default()).render(area, &mut buffer, &mut state);

    for y in area.top()..area.bottom() {
        let line: String = (area.left()..area.right())
            .map(|x| buffer[(x, y)].symbol())
            .collect();
        println!("{line}");
    }
}
