use std::collections::{HashMap, HashSet};

use arbor_tree::{
    CollapsePolicy, NodeState, TreeDataSource, TreeEngine, TreeEvent,
    TreeOptions,
};
use proptest::prelude::*;

/// Tree described by a parent list: `parents[i]` is the parent of item `i`.
///
/// Parents always precede their children, so the list describes a forest.
struct ParentTree {
    parents: Vec<Option<usize>>,
    children: HashMap<Option<usize>, Vec<usize>>,
}

impl ParentTree {
    fn new(parents: &[Option<usize>]) -> Self {
        let mut children: HashMap<Option<usize>, Vec<usize>> = HashMap::new();
        for (item, parent) in parents.iter().enumerate() {
            children.entry(*parent).or_default().push(item);
        }
        Self {
            parents: parents.to_vec(),
            children,
        }
    }

    /// Re-parent `item` as the last child of `parent`; returns the old
    /// parent.
    fn move_item(
        &mut self,
        item: usize,
        parent: Option<usize>,
    ) -> Option<usize> {
        let old = std::mem::replace(&mut self.parents[item], parent);
        if let Some(siblings) = self.children.get_mut(&old) {
            siblings.retain(|child| *child != item);
        }
        self.children.entry(parent).or_default().push(item);
        old
    }

    fn children(&self, item: Option<usize>) -> &[usize] {
        self.children.get(&item).map_or(&[], Vec::as_slice)
    }
}

impl TreeDataSource<usize> for ParentTree {
    fn number_of_children(&self, item: Option<&usize>) -> usize {
        self.children(item.copied()).len()
    }

    fn child(&self, index: usize, item: Option<&usize>) -> usize {
        self.children(item.copied())[index]
    }
}

/// Independent flattening: pre-order walk that descends only into items the
/// engine reports as expanded.
fn reference_rows(
    tree: &ParentTree,
    engine: &TreeEngine<usize>,
) -> Vec<(usize, usize)> {
    fn walk(
        tree: &ParentTree,
        engine: &TreeEngine<usize>,
        parent: Option<usize>,
        depth: usize,
        out: &mut Vec<(usize, usize)>,
    ) {
        for &child in tree.children(parent) {
            out.push((child, depth));
            if engine.is_expanded(&child) {
                walk(tree, engine, Some(child), depth + 1, out);
            }
        }
    }

    let mut out = Vec::new();
    walk(tree, engine, None, 0, &mut out);
    out
}

fn engine_rows(engine: &TreeEngine<usize>) -> Vec<(usize, usize)> {
    engine
        .visible_rows()
        .iter()
        .map(|row| (row.item, row.depth))
        .collect()
}

/// Every visible row is unique, indexed and backed by a node record.
fn assert_indexed(engine: &TreeEngine<usize>) {
    let mut seen = HashSet::new();
    for (index, row) in engine.visible_rows().iter().enumerate() {
        assert!(seen.insert(row.item), "duplicate row for item {}", row.item);
        assert_eq!(engine.index_of_item(&row.item), Some(index));
        assert_eq!(engine.item_at_index(index), Some(&row.item));
        assert_eq!(engine.depth_of(&row.item), Some(row.depth));
    }
}

fn assert_consistent(tree: &ParentTree, engine: &TreeEngine<usize>) {
    assert_eq!(engine_rows(engine), reference_rows(tree, engine));
    assert_indexed(engine);
}

fn parents_strategy() -> impl Strategy<Value = Vec<Option<usize>>> {
    (1usize..24).prop_flat_map(|len| {
        (0..len)
            .map(|item| {
                if item == 0 {
                    Just(None).boxed()
                } else {
                    prop::option::weighted(0.8, 0..item).boxed()
                }
            })
            .collect::<Vec<_>>()
    })
}

#[derive(Clone, Copy, Debug)]
enum Op {
    Expand,
    Collapse,
    Toggle,
    ExpandSubtree,
    CollapseSubtree,
    InvalidateAndRecompute,
    ReloadChildren,
    Move,
}

fn op_strategy() -> impl Strategy<Value = (Op, usize)> {
    let op = prop_oneof![
        3 => Just(Op::Expand),
        2 => Just(Op::Collapse),
        2 => Just(Op::Toggle),
        1 => Just(Op::ExpandSubtree),
        1 => Just(Op::CollapseSubtree),
        1 => Just(Op::InvalidateAndRecompute),
        1 => Just(Op::ReloadChildren),
        2 => Just(Op::Move),
    ];
    (op, 0usize..64)
}

proptest! {
    #[test]
    fn visible_rows_match_reference_flattening(
        parents in parents_strategy(),
        ops in prop::collection::vec(op_strategy(), 0..48),
        initially_expanded in any::<bool>(),
        discard in any::<bool>(),
    ) {
        let mut tree = ParentTree::new(&parents);
        let policy = if discard {
            CollapsePolicy::Discard
        } else {
            CollapsePolicy::Retain
        };
        let options = TreeOptions::default()
            .with_initially_expanded(initially_expanded)
            .with_collapse_policy(policy);
        let mut engine = TreeEngine::with_options(options);

        engine.compute_visible_rows(&tree);
        assert_consistent(&tree, &engine);

        for (op, seed) in ops {
            let item = seed % parents.len();
            let before = engine_rows(&engine);
            match op {
                Op::Expand => {
                    let range = engine.expand(&tree, &item);
                    prop_assert_eq!(engine.len(), before.len() + range.len());
                    prop_assert!(engine.expand(&tree, &item).is_empty());
                },
                Op::Collapse => {
                    let at = engine.index_of_item(&item);
                    let range = engine.collapse(&item);
                    prop_assert_eq!(engine.len(), before.len() - range.len());
                    if let Some(at) = at.filter(|_| !range.is_empty()) {
                        prop_assert_eq!(range.start, at + 1);
                        let depth = before[at].1;
                        let block = &before[range.clone()];
                        prop_assert!(block.iter().all(|row| row.1 > depth));
                        if let Some(next) = before.get(range.end) {
                            prop_assert!(next.1 <= depth);
                        }
                    }
                    prop_assert!(engine.collapse(&item).is_empty());
                },
                Op::Toggle => {
                    engine.toggle(&tree, &item);
                },
                Op::ExpandSubtree => {
                    engine.expand_subtree(&tree, &item);
                },
                Op::CollapseSubtree => {
                    engine.collapse_subtree(&item);
                },
                Op::InvalidateAndRecompute => {
                    engine.invalidate(&item);
                    engine.compute_visible_rows(&tree);
                },
                Op::ReloadChildren => {
                    engine.reload_children(&tree, &item);
                },
                Op::Move => {
                    let target = (seed / 7) % (item + 1);
                    let parent = (target != item).then_some(target);
                    match (tree.move_item(item, parent), parent) {
                        (Some(old), Some(new)) => {
                            engine.invalidate(&old);
                            engine.invalidate(&new);
                            engine.expand(&tree, &new);
                            assert_indexed(&engine);
                            engine.compute_visible_rows(&tree);
                        },
                        _ => {
                            engine.reload_data(&tree);
                        },
                    }
                },
            }
            assert_consistent(&tree, &engine);
        }
    }

    #[test]
    fn replaying_events_reproduces_rows(
        parents in parents_strategy(),
        seeds in prop::collection::vec(0usize..64, 0..32),
    ) {
        let tree = ParentTree::new(&parents);
        let mut engine = TreeEngine::new();
        engine.compute_visible_rows(&tree);
        let mut mirror = engine_rows(&engine);
        engine.drain_events().for_each(drop);

        for seed in seeds {
            let item = seed % parents.len();
            engine.toggle(&tree, &item);

            let current = engine_rows(&engine);
            for event in engine.drain_events() {
                match event {
                    TreeEvent::RowsInserted(range) => {
                        let inserted = current[range.clone()].to_vec();
                        mirror.splice(range.start..range.start, inserted);
                    },
                    TreeEvent::RowsRemoved(range) => {
                        mirror.drain(range);
                    },
                    TreeEvent::ReloadAll => mirror = current.clone(),
                    TreeEvent::SelectionChanged { .. } => {},
                }
            }
            prop_assert_eq!(&mirror, &current);
        }
    }
}

#[test]
fn invalidated_leaf_drops_its_rows() {
    let mut tree = ParentTree::new(&[None, Some(0), Some(0), Some(1)]);
    let mut engine = TreeEngine::new();
    engine.compute_visible_rows(&tree);
    engine.expand(&tree, &0);
    engine.expand(&tree, &1);
    assert_eq!(engine_rows(&engine), vec![(0, 0), (1, 1), (3, 2), (2, 1)]);

    tree.children.remove(&Some(1));
    engine.invalidate(&1);
    engine.compute_visible_rows(&tree);

    assert_eq!(engine_rows(&engine), vec![(0, 0), (1, 1), (2, 1)]);
    assert_eq!(engine.state_of(&1), Some(NodeState::Collapsed));
    assert_eq!(engine.state_of(&3), None);
}
