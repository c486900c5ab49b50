//! The flat visible row sequence and its reverse index.
//!
//! [`VisibleRows`] keeps `rows[i].item -> i` in a hash map so that both
//! directions of lookup stay O(1). Every splice re-indexes only the rows at
//! or after the splice point.

use std::collections::HashMap;
use std::hash::Hash;
use std::ops::Range;

/// A row eligible for rendering.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VisibleRow<I> {
    pub item: I,
    /// Number of ancestors (`0` for roots).
    pub depth: usize,
}

impl<I> VisibleRow<I> {
    #[inline]
    pub fn new(item: I, depth: usize) -> Self {
        Self { item, depth }
    }
}

/// Incremental updates a list widget applies to stay in sync with the engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TreeEvent<I> {
    RowsInserted(Range<usize>),
    RowsRemoved(Range<usize>),
    /// The whole row sequence changed; re-read it.
    ReloadAll,
    SelectionChanged {
        previous: Option<I>,
        current: Option<I>,
    },
}

#[derive(Debug)]
pub(crate) struct VisibleRows<I> {
    rows: Vec<VisibleRow<I>>,
    index: HashMap<I, usize>,
}

impl<I> Default for VisibleRows<I> {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<I: Clone + Eq + Hash> VisibleRows<I> {
    pub(crate) fn as_slice(&self) -> &[VisibleRow<I>] {
        &self.rows
    }

    pub(crate) fn len(&self) -> usize {
        self.rows.len()
    }

    pub(crate) fn get(&self, index: usize) -> Option<&VisibleRow<I>> {
        self.rows.get(index)
    }

    pub(crate) fn position(&self, item: &I) -> Option<usize> {
        self.index.get(item).copied()
    }

    /// Replace every row and rebuild the index.
    pub(crate) fn replace(&mut self, rows: Vec<VisibleRow<I>>) {
        self.rows = rows;
        self.index.clear();
        self.reindex_from(0);
    }

    /// Insert `rows` starting at `at` and return the inserted range.
    pub(crate) fn insert(
        &mut self,
        at: usize,
        rows: Vec<VisibleRow<I>>,
    ) -> Range<usize> {
        let range = at..at + rows.len();
        if range.is_empty() {
            return range;
        }
        self.rows.splice(at..at, rows);
        self.reindex_from(at);
        range
    }

    /// Remove the rows in `range` and return them.
    pub(crate) fn remove(&mut self, range: Range<usize>) -> Vec<VisibleRow<I>> {
        if range.is_empty() {
            return Vec::new();
        }
        let start = range.start;
        let removed: Vec<_> = self.rows.drain(range).collect();
        for row in &removed {
            self.index.remove(&row.item);
        }
        self.reindex_from(start);
        removed
    }

    /// Number of rows directly after `at` that are deeper than `at`'s row,
    /// i.e. its visible descendants.
    pub(crate) fn descendant_span(&self, at: usize) -> usize {
        let Some(row) = self.rows.get(at) else {
            return 0;
        };
        self.rows[at + 1..]
            .iter()
            .take_while(|next| next.depth > row.depth)
            .count()
    }

    fn reindex_from(&mut self, start: usize) {
        for (offset, row) in self.rows[start..].iter().enumerate() {
            self.index.insert(row.item.clone(), start + offset);
        }
    }
}
