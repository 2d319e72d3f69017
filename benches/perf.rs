use std::hint::black_box;

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::widgets::StatefulWidget;
use tui_lazytree::{
    TreeFields, TreeItem, TreeOptions, TreeView, TreeViewState, TreeViewStyle, flatten,
    visible_ids,
};

fn build(depth: usize, fanout: usize, prefix: &str) -> Vec<TreeItem> {
    (0..fanout)
        .map(|idx| {
            let label = format!("{prefix}{idx}");
            if depth == 0 {
                TreeItem::new(label)
            } else {
                let children = build(depth - 1, fanout, &format!("{label}-"));
                TreeItem::new(label).with_children(children)
            }
        })
        .collect()
}

// 8^5 leaves under 8 roots, roughly 37k nodes.
fn large_tree() -> Vec<TreeItem> {
    build(4, 8, "n")
}

fn bench_flatten(c: &mut Criterion) {
    let data = large_tree();
    let fields = TreeFields::new();
    c.bench_function("flatten_fresh", |b| {
        b.iter(|| black_box(flatten(black_box(&data), &fields, None)));
    });

    let (_, previous) = flatten(&data, &fields, None);
    c.bench_function("flatten_preserving", |b| {
        b.iter(|| black_box(flatten(black_box(&data), &fields, Some(&previous))));
    });
}

fn bench_visibility(c: &mut Criterion) {
    let data = large_tree();
    let (flat, schema) = flatten(&data, &TreeFields::new(), None);
    c.bench_function("visible_ids", |b| {
        b.iter(|| black_box(visible_ids(&flat, &schema).count()));
    });
}

fn bench_expand_all(c: &mut Criterion) {
    let data = large_tree();
    c.bench_function("expand_all_and_render", |b| {
        b.iter_batched(
            || TreeViewState::new(data.clone(), TreeOptions::default().level_line(true)),
            |mut state| {
                let ids: Vec<_> = state.flat().iter().map(|entry| entry.id).collect();
                for id in ids {
                    if state.entry(id).is_some_and(|entry| entry.has_child && !entry.is_open) {
                        state.toggle_open(id);
                    }
                }
                let area = Rect::new(0, 0, 80, 40);
                let mut buffer = Buffer::empty(area);
                TreeView::new(TreeViewStyle::default()).render(area, &mut buffer, &mut state);
                black_box(state.visible_len())
            },
            BatchSize::LargeInput,
        );
    });
}

criterion_group!(benches, bench_flatten, bench_visibility, bench_expand_all);
criterion_main!(benches);
