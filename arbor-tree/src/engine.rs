//! Tree flattener and expand/collapse row-state engine.
//!
//! [`TreeEngine`] turns a hierarchy that is only reachable through a
//! [`TreeDataSource`] into the flat, ordered list of rows a list widget
//! renders. Children are queried lazily and cached in per-item node records
//! until the host invalidates them. Expanding or collapsing an item splices
//! rows in place, so rows outside the affected block keep their relative
//! order, and every splice is reported as a [`TreeEvent`].
//!
//! Contract violations by the data source (an item reported twice) are fatal:
//! the plain methods panic, the `try_*` methods return [`TreeError`].

mod selection;

use std::collections::{HashMap, HashSet, VecDeque};
use std::hash::Hash;
use std::ops::Range;

use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TreeError, fail_fast};
use crate::node::{NodeRecord, NodeState, ParkedState};
use crate::options::{CollapsePolicy, TreeOptions};
use crate::rows::{TreeEvent, VisibleRow, VisibleRows};
use crate::source::{NoDelegate, TreeDataSource, TreeDelegate};

/// Range returned by operations that did not touch the visible rows.
const NO_ROWS: Range<usize> = 0..0;

/// Expanded items captured by [`TreeEngine::snapshot`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeSnapshot<I> {
    /// Expanded items in pre-order of the loaded tree.
    pub expanded: Vec<I>,
}

/// Maps an item hierarchy to visible rows and owns per-item expansion state.
#[derive(Debug)]
pub struct TreeEngine<I> {
    options: TreeOptions,
    /// Root items, `None` until loaded.
    roots: Option<Vec<I>>,
    nodes: HashMap<I, NodeRecord<I>>,
    rows: VisibleRows<I>,
    /// States waiting for their item to be reported by the data source.
    pending: HashMap<I, ParkedState<I>>,
    selected: Option<I>,
    events: VecDeque<TreeEvent<I>>,
}

impl<I: Clone + Eq + Hash> Default for TreeEngine<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: Clone + Eq + Hash> TreeEngine<I> {
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(TreeOptions::default())
    }

    #[must_use]
    pub fn with_options(options: TreeOptions) -> Self {
        Self {
            options,
            roots: None,
            nodes: HashMap::new(),
            rows: VisibleRows::default(),
            pending: HashMap::new(),
            selected: None,
            events: VecDeque::new(),
        }
    }

    pub fn options(&self) -> &TreeOptions {
        &self.options
    }

    /// Rows produced by the last recomputation or splice.
    pub fn visible_rows(&self) -> &[VisibleRow<I>] {
        self.rows.as_slice()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.len() == 0
    }

    /// Current row of `item`, or `None` when it is not visible.
    pub fn index_of_item(&self, item: &I) -> Option<usize> {
        self.rows.position(item)
    }

    pub fn item_at_index(&self, index: usize) -> Option<&I> {
        self.rows.get(index).map(|row| &row.item)
    }

    pub fn row_at_index(&self, index: usize) -> Option<&VisibleRow<I>> {
        self.rows.get(index)
    }

    /// State of `item`, `None` for items the engine has not seen.
    pub fn state_of(&self, item: &I) -> Option<NodeState> {
        self.nodes.get(item).map(|record| record.state)
    }

    pub fn is_expanded(&self, item: &I) -> bool {
        self.nodes
            .get(item)
            .is_some_and(|record| record.state.is_expanded())
    }

    /// Parent of `item`; `None` for roots and for items the engine has not
    /// seen.
    pub fn parent_of(&self, item: &I) -> Option<&I> {
        self.nodes.get(item).and_then(|record| record.parent.as_ref())
    }

    pub fn depth_of(&self, item: &I) -> Option<usize> {
        self.nodes.get(item).map(|record| record.depth)
    }

    /// Indentation level of `item` as decided by `delegate`; `None` for
    /// items the engine has not seen.
    pub fn indentation_level<D>(
        &self,
        delegate: &D,
        item: &I,
    ) -> Option<usize>
    where
        D: TreeDelegate<I> + ?Sized,
    {
        let depth = self.depth_of(item)?;
        Some(delegate.indentation_level(item, depth))
    }

    /// Cached child count, `None` while the children were never loaded.
    pub fn child_count(&self, item: &I) -> Option<usize> {
        self.nodes
            .get(item)
            .and_then(|record| record.children.as_ref())
            .map(Vec::len)
    }

    /// Cached child `index` of `parent` (`None` addresses the roots).
    #[track_caller]
    pub fn child_at(&self, parent: Option<&I>, index: usize) -> &I {
        fail_fast(self.try_child_at(parent, index))
    }

    pub fn try_child_at(&self, parent: Option<&I>, index: usize) -> Result<&I> {
        let children = match parent {
            None => self.roots.as_deref().unwrap_or(&[]),
            Some(parent) => self
                .nodes
                .get(parent)
                .map(NodeRecord::loaded_children)
                .unwrap_or(&[]),
        };
        children.get(index).ok_or(TreeError::ChildIndexOutOfRange {
            index,
            count: children.len(),
        })
    }

    /// Pop the oldest pending change event.
    pub fn next_event(&mut self) -> Option<TreeEvent<I>> {
        self.events.pop_front()
    }

    pub fn drain_events(&mut self) -> impl Iterator<Item = TreeEvent<I>> + '_ {
        self.events.drain(..)
    }

    /// Rebuild the whole visible row sequence from the roots.
    #[track_caller]
    pub fn compute_visible_rows<S>(&mut self, source: &S) -> &[VisibleRow<I>]
    where
        S: TreeDataSource<I> + ?Sized,
    {
        fail_fast(self.try_compute_visible_rows(source))
    }

    pub fn try_compute_visible_rows<S>(
        &mut self,
        source: &S,
    ) -> Result<&[VisibleRow<I>]>
    where
        S: TreeDataSource<I> + ?Sized,
    {
        let mut rows = Vec::new();
        self.collect_rows(source, None, &mut rows)?;
        self.rows.replace(rows);
        self.prune_pending();
        debug!("tree recomputed: {} visible rows", self.rows.len());
        self.events.push_back(TreeEvent::ReloadAll);
        self.sync_selection();
        Ok(self.rows.as_slice())
    }

    /// Expand `item` and return the range of inserted rows.
    ///
    /// The range is empty when the item is unknown, already expanded, has no
    /// children or is not currently visible. In the last case the new state
    /// is still recorded. The delegate is asked before the children are
    /// loaded, so `should_expand` may also see items that turn out to be
    /// leaves.
    #[track_caller]
    pub fn expand<S>(&mut self, source: &S, item: &I) -> Range<usize>
    where
        S: TreeDataSource<I> + ?Sized,
    {
        fail_fast(self.try_expand_with(source, &mut NoDelegate, item))
    }

    #[track_caller]
    pub fn expand_with<S, D>(
        &mut self,
        source: &S,
        delegate: &mut D,
        item: &I,
    ) -> Range<usize>
    where
        S: TreeDataSource<I> + ?Sized,
        D: TreeDelegate<I> + ?Sized,
    {
        fail_fast(self.try_expand_with(source, delegate, item))
    }

    pub fn try_expand<S>(
        &mut self,
        source: &S,
        item: &I,
    ) -> Result<Range<usize>>
    where
        S: TreeDataSource<I> + ?Sized,
    {
        self.try_expand_with(source, &mut NoDelegate, item)
    }

    pub fn try_expand_with<S, D>(
        &mut self,
        source: &S,
        delegate: &mut D,
        item: &I,
    ) -> Result<Range<usize>>
    where
        S: TreeDataSource<I> + ?Sized,
        D: TreeDelegate<I> + ?Sized,
    {
        match self.nodes.get(item) {
            Some(record) if !record.state.is_expanded() => {},
            _ => return Ok(NO_ROWS),
        }
        if self.child_count(item) == Some(0) {
            return Ok(NO_ROWS);
        }

        // Vetoed expansions never reach the data source.
        if !delegate.should_expand(item) {
            trace!("expand vetoed by delegate");
            return Ok(NO_ROWS);
        }

        self.ensure_children(source, item)?;
        if self.nodes[item].loaded_children().is_empty() {
            return Ok(NO_ROWS);
        }

        delegate.will_expand(item);

        let range = match self.rows.position(item) {
            Some(at) => {
                let mut rows = Vec::new();
                self.collect_rows(source, Some(item), &mut rows)?;
                self.set_state(item, NodeState::Expanded);
                self.insert_rows(at + 1, rows)
            },
            None => {
                self.set_state(item, NodeState::Expanded);
                NO_ROWS
            },
        };

        delegate.did_expand(item);
        Ok(range)
    }

    /// Collapse `item` and return the range of removed rows.
    pub fn collapse(&mut self, item: &I) -> Range<usize> {
        self.collapse_with(&mut NoDelegate, item)
    }

    pub fn collapse_with<D>(
        &mut self,
        delegate: &mut D,
        item: &I,
    ) -> Range<usize>
    where
        D: TreeDelegate<I> + ?Sized,
    {
        if !self.is_expanded(item) {
            return NO_ROWS;
        }

        if !delegate.should_collapse(item) {
            trace!("collapse vetoed by delegate");
            return NO_ROWS;
        }

        delegate.will_collapse(item);

        let range = match self.rows.position(item) {
            Some(at) => {
                let span = self.rows.descendant_span(at);
                self.remove_rows(at + 1..at + 1 + span)
            },
            None => NO_ROWS,
        };

        self.set_state(item, NodeState::Collapsed);
        if self.options.collapse_policy == CollapsePolicy::Discard {
            self.drop_descendants(item, false);
        }
        self.sync_selection();

        delegate.did_collapse(item);
        range
    }

    /// Collapse when expanded, expand otherwise.
    #[track_caller]
    pub fn toggle<S>(&mut self, source: &S, item: &I) -> Range<usize>
    where
        S: TreeDataSource<I> + ?Sized,
    {
        if self.is_expanded(item) {
            self.collapse(item)
        } else {
            self.expand(source, item)
        }
    }

    /// Expand `item` and every descendant, loading the whole subtree.
    ///
    /// Returns the range of rows now shown under `item`; rows it already
    /// showed are reported as removed first.
    #[track_caller]
    pub fn expand_subtree<S>(&mut self, source: &S, item: &I) -> Range<usize>
    where
        S: TreeDataSource<I> + ?Sized,
    {
        fail_fast(self.try_expand_subtree(source, item))
    }

    pub fn try_expand_subtree<S>(
        &mut self,
        source: &S,
        item: &I,
    ) -> Result<Range<usize>>
    where
        S: TreeDataSource<I> + ?Sized,
    {
        if !self.nodes.contains_key(item) {
            return Ok(NO_ROWS);
        }

        let mut stack = vec![item.clone()];
        while let Some(current) = stack.pop() {
            self.ensure_children(source, &current)?;
            let children = self.nodes[&current].loaded_children().to_vec();
            if !children.is_empty() {
                self.set_state(&current, NodeState::Expanded);
                stack.extend(children);
            }
        }

        self.refresh_block(source, item)
    }

    /// Collapse `item` and mark every loaded descendant collapsed.
    pub fn collapse_subtree(&mut self, item: &I) -> Range<usize> {
        let range = self.collapse(item);

        let mut stack: Vec<I> = self
            .nodes
            .get(item)
            .map(|record| record.loaded_children().to_vec())
            .unwrap_or_default();
        while let Some(current) = stack.pop() {
            if let Some(record) = self.nodes.get_mut(&current) {
                record.state = NodeState::Collapsed;
                stack.extend(record.loaded_children().iter().cloned());
            }
        }

        range
    }

    /// Drop the cached children of `item` and all records below it.
    ///
    /// The visible descendants of `item` are removed right away; the next
    /// visibility computation queries the data source again and shows them
    /// anew. The state of dropped descendants is kept aside and reapplied if
    /// the same items are reported again.
    pub fn invalidate(&mut self, item: &I) {
        if !self.nodes.contains_key(item) {
            return;
        }
        if let Some(at) = self.rows.position(item) {
            let span = self.rows.descendant_span(at);
            self.remove_rows(at + 1..at + 1 + span);
        }
        let dropped = self.drop_descendants(item, true);
        self.sync_selection();
        debug!("tree invalidated: {dropped} cached records dropped");
    }

    /// Invalidate `item` and immediately refresh its visible block.
    #[track_caller]
    pub fn reload_children<S>(&mut self, source: &S, item: &I)
    where
        S: TreeDataSource<I> + ?Sized,
    {
        fail_fast(self.try_reload_children(source, item));
    }

    pub fn try_reload_children<S>(&mut self, source: &S, item: &I) -> Result<()>
    where
        S: TreeDataSource<I> + ?Sized,
    {
        if !self.nodes.contains_key(item) {
            return Ok(());
        }
        self.invalidate(item);
        if self.is_expanded(item) {
            self.ensure_children(source, item)?;
            if self.nodes[item].loaded_children().is_empty() {
                self.set_state(item, NodeState::Collapsed);
            }
        }
        self.refresh_block(source, item)?;
        self.sync_selection();
        Ok(())
    }

    /// Forget every record and rebuild from the data source.
    ///
    /// Items reported again keep their expansion state.
    #[track_caller]
    pub fn reload_data<S>(&mut self, source: &S) -> &[VisibleRow<I>]
    where
        S: TreeDataSource<I> + ?Sized,
    {
        fail_fast(self.try_reload_data(source))
    }

    pub fn try_reload_data<S>(&mut self, source: &S) -> Result<&[VisibleRow<I>]>
    where
        S: TreeDataSource<I> + ?Sized,
    {
        for (item, record) in self.nodes.drain() {
            let parked = ParkedState::under(record.parent, record.state);
            self.pending.insert(item, parked);
        }
        self.roots = None;
        self.try_compute_visible_rows(source)
    }

    /// Capture the expanded items of the loaded tree.
    pub fn snapshot(&self) -> TreeSnapshot<I> {
        let mut expanded = Vec::new();
        let mut stack: Vec<&I> = self
            .roots
            .as_deref()
            .unwrap_or(&[])
            .iter()
            .rev()
            .collect();
        while let Some(item) = stack.pop() {
            let Some(record) = self.nodes.get(item) else {
                continue;
            };
            if record.state.is_expanded() {
                expanded.push(item.clone());
            }
            stack.extend(record.loaded_children().iter().rev());
        }
        TreeSnapshot { expanded }
    }

    /// Apply a snapshot and recompute the visible rows.
    ///
    /// Items that are not loaded yet receive their state when the data
    /// source first reports them.
    #[track_caller]
    pub fn restore<S>(&mut self, source: &S, snapshot: TreeSnapshot<I>)
    where
        S: TreeDataSource<I> + ?Sized,
    {
        fail_fast(self.try_restore(source, snapshot));
    }

    pub fn try_restore<S>(
        &mut self,
        source: &S,
        snapshot: TreeSnapshot<I>,
    ) -> Result<()>
    where
        S: TreeDataSource<I> + ?Sized,
    {
        self.pending.clear();
        for record in self.nodes.values_mut() {
            record.state = NodeState::Collapsed;
        }

        let mut deferred = 0usize;
        for item in snapshot.expanded {
            match self.nodes.get_mut(&item) {
                Some(record) => record.state = NodeState::Expanded,
                None => {
                    deferred += 1;
                    let parked = ParkedState::unanchored(NodeState::Expanded);
                    self.pending.insert(item, parked);
                },
            }
        }
        if deferred > 0 {
            warn!("tree restore: {deferred} expanded items are not loaded yet");
        }

        self.try_compute_visible_rows(source)?;
        Ok(())
    }

    fn set_state(&mut self, item: &I, state: NodeState) {
        if let Some(record) = self.nodes.get_mut(item) {
            record.state = state;
        }
    }

    fn insert_rows(
        &mut self,
        at: usize,
        rows: Vec<VisibleRow<I>>,
    ) -> Range<usize> {
        let range = self.rows.insert(at, rows);
        if !range.is_empty() {
            trace!("rows inserted: {range:?}");
            self.events.push_back(TreeEvent::RowsInserted(range.clone()));
        }
        range
    }

    fn remove_rows(&mut self, range: Range<usize>) -> Range<usize> {
        self.rows.remove(range.clone());
        if !range.is_empty() {
            trace!("rows removed: {range:?}");
            self.events.push_back(TreeEvent::RowsRemoved(range.clone()));
        }
        range
    }

    /// Replace the visible descendants of `item` with freshly collected rows.
    fn refresh_block<S>(&mut self, source: &S, item: &I) -> Result<Range<usize>>
    where
        S: TreeDataSource<I> + ?Sized,
    {
        let Some(at) = self.rows.position(item) else {
            return Ok(NO_ROWS);
        };

        let span = self.rows.descendant_span(at);
        self.remove_rows(at + 1..at + 1 + span);

        if !self.is_expanded(item) {
            return Ok(NO_ROWS);
        }
        let mut rows = Vec::new();
        self.collect_rows(source, Some(item), &mut rows)?;
        Ok(self.insert_rows(at + 1, rows))
    }

    /// Remove every record below `item` and forget its children.
    ///
    /// With `keep_state`, the states of dropped records are parked in
    /// `pending`.
    fn drop_descendants(&mut self, item: &I, keep_state: bool) -> usize {
        let mut stack = match self.nodes.get_mut(item) {
            Some(record) => record.children.take().unwrap_or_default(),
            None => return 0,
        };

        let mut dropped = 0;
        while let Some(current) = stack.pop() {
            let Some(record) = self.nodes.remove(&current) else {
                continue;
            };
            dropped += 1;
            stack.extend(record.children.unwrap_or_default());
            if keep_state {
                let parked = ParkedState::under(record.parent, record.state);
                self.pending.insert(current, parked);
            }
        }
        dropped
    }

    /// Forget parked states of items that were removed from the tree.
    ///
    /// A parked item is gone once its parent's children were queried again
    /// without it, or once its parent is gone as well. Items whose parent
    /// was not queried yet stay parked.
    fn prune_pending(&mut self) {
        loop {
            let stale: Vec<I> = self
                .pending
                .iter()
                .filter(|(_, parked)| match &parked.parent {
                    None => false,
                    Some(None) => self.roots.is_some(),
                    Some(Some(parent)) => match self.nodes.get(parent) {
                        Some(record) => record.children.is_some(),
                        None => !self.pending.contains_key(parent),
                    },
                })
                .map(|(item, _)| item.clone())
                .collect();
            if stale.is_empty() {
                break;
            }
            trace!("pruned {} parked states", stale.len());
            for item in &stale {
                self.pending.remove(item);
            }
        }
    }

    /// Pre-order walk below `parent` (the roots for `None`), descending only
    /// into expanded nodes.
    fn collect_rows<S>(
        &mut self,
        source: &S,
        parent: Option<&I>,
        out: &mut Vec<VisibleRow<I>>,
    ) -> Result<()>
    where
        S: TreeDataSource<I> + ?Sized,
    {
        let first = self.children_of(source, parent)?;
        let mut stack = vec![first.into_iter()];

        while let Some(siblings) = stack.last_mut() {
            let Some(item) = siblings.next() else {
                stack.pop();
                continue;
            };

            let record = &self.nodes[&item];
            let depth = record.depth;
            let expanded = record.state.is_expanded();
            out.push(VisibleRow::new(item.clone(), depth));

            if expanded {
                let children = self.children_of(source, Some(&item))?;
                if children.is_empty() {
                    self.set_state(&item, NodeState::Collapsed);
                } else {
                    stack.push(children.into_iter());
                }
            }
        }

        Ok(())
    }

    fn children_of<S>(
        &mut self,
        source: &S,
        parent: Option<&I>,
    ) -> Result<Vec<I>>
    where
        S: TreeDataSource<I> + ?Sized,
    {
        match parent {
            None => {
                if self.roots.is_none() {
                    self.roots = Some(self.load_children(source, None)?);
                }
                Ok(self.roots.clone().unwrap_or_default())
            },
            Some(parent) => {
                self.ensure_children(source, parent)?;
                Ok(self.nodes[parent].loaded_children().to_vec())
            },
        }
    }

    fn ensure_children<S>(&mut self, source: &S, item: &I) -> Result<()>
    where
        S: TreeDataSource<I> + ?Sized,
    {
        let loaded = self
            .nodes
            .get(item)
            .is_some_and(|record| record.children.is_some());
        if loaded {
            return Ok(());
        }
        let children = self.load_children(source, Some(item))?;
        if let Some(record) = self.nodes.get_mut(item) {
            record.children = Some(children);
        }
        Ok(())
    }

    /// Query the data source for the children of `parent` and create records
    /// for new ones.
    fn load_children<S>(
        &mut self,
        source: &S,
        parent: Option<&I>,
    ) -> Result<Vec<I>>
    where
        S: TreeDataSource<I> + ?Sized,
    {
        let parent_depth = parent
            .and_then(|parent| self.nodes.get(parent))
            .map(|record| record.depth);
        let depth = parent_depth.map_or(0, |depth| depth + 1);

        let count = source.number_of_children(parent);
        let mut children = Vec::with_capacity(count);
        let mut seen = HashSet::with_capacity(count);
        for index in 0..count {
            let child = source.child(index, parent);
            let owned_elsewhere = self
                .nodes
                .get(&child)
                .is_some_and(|record| record.parent.as_ref() != parent);
            if owned_elsewhere || !seen.insert(child.clone()) {
                return Err(TreeError::DuplicateItem { parent_depth });
            }
            children.push(child);
        }

        let initial = NodeState::initial(self.options.initially_expanded);
        for child in &children {
            if !self.nodes.contains_key(child) {
                let state = self
                    .pending
                    .remove(child)
                    .map_or(initial, |parked| parked.state);
                let record = NodeRecord::new(parent.cloned(), depth, state);
                self.nodes.insert(child.clone(), record);
            }
        }

        trace!("loaded {count} children at depth {depth}");
        Ok(children)
    }
}
