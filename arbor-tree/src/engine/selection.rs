//! Single-row selection keyed by item.
//!
//! The selection always refers to a visible row: selecting a hidden item is
//! refused, and a selected row that disappears (collapse, invalidation,
//! reload) clears the selection with a [`TreeEvent::SelectionChanged`].

use std::hash::Hash;

use log::trace;

use super::TreeEngine;
use crate::rows::TreeEvent;
use crate::source::{NoDelegate, TreeDelegate};

impl<I: Clone + Eq + Hash> TreeEngine<I> {
    pub fn selected_item(&self) -> Option<&I> {
        self.selected.as_ref()
    }

    pub fn selected_row(&self) -> Option<usize> {
        self.selected
            .as_ref()
            .and_then(|item| self.rows.position(item))
    }

    /// Select the item shown at `index`; returns the selected row.
    pub fn select_row(&mut self, index: usize) -> Option<usize> {
        let item = self.item_at_index(index)?.clone();
        self.select_with(&mut NoDelegate, &item)
    }

    pub fn select_item(&mut self, item: &I) -> Option<usize> {
        self.select_with(&mut NoDelegate, item)
    }

    /// Select `item`, letting the delegate redirect or cancel.
    ///
    /// Returns the row of the item that ended up selected, or `None` when
    /// nothing was selected.
    pub fn select_with<D>(
        &mut self,
        delegate: &mut D,
        item: &I,
    ) -> Option<usize>
    where
        D: TreeDelegate<I> + ?Sized,
    {
        self.rows.position(item)?;

        let Some(target) = delegate.will_select(item) else {
            trace!("selection cancelled by delegate");
            return None;
        };
        let row = self.rows.position(&target)?;

        if self.selected.as_ref() == Some(&target) {
            return Some(row);
        }

        let previous = self.selected.replace(target.clone());
        self.events.push_back(TreeEvent::SelectionChanged {
            previous,
            current: Some(target.clone()),
        });
        delegate.did_select(&target);
        Some(row)
    }

    /// Clear the selection; returns the previously selected item.
    pub fn deselect(&mut self) -> Option<I> {
        self.deselect_with(&mut NoDelegate)
    }

    pub fn deselect_with<D>(&mut self, delegate: &mut D) -> Option<I>
    where
        D: TreeDelegate<I> + ?Sized,
    {
        let current = self.selected.as_ref()?;
        if !delegate.will_deselect(current) {
            return None;
        }

        let previous = self.selected.take()?;
        self.events.push_back(TreeEvent::SelectionChanged {
            previous: Some(previous.clone()),
            current: None,
        });
        delegate.did_deselect(&previous);
        Some(previous)
    }

    /// Drop the selection when its row is no longer visible.
    pub(super) fn sync_selection(&mut self) {
        let hidden = self
            .selected
            .as_ref()
            .is_some_and(|item| self.rows.position(item).is_none());
        if hidden {
            let previous = self.selected.take();
            self.events.push_back(TreeEvent::SelectionChanged {
                previous,
                current: None,
            });
        }
    }
}
