//! Shared engine handle for hosts whose collaborators call back into the
//! tree.
//!
//! A data source or delegate that holds a [`SharedTree`] clone can reach the
//! engine while the engine is still busy calling it. Every mutating method
//! takes the `RefCell` borrow with `try_borrow_mut`, so such a nested call is
//! reported as [`TreeError::Reentrant`] instead of corrupting the row state.

use std::cell::{Ref, RefCell};
use std::hash::Hash;
use std::ops::Range;
use std::rc::Rc;

use crate::engine::TreeEngine;
use crate::error::{Result, TreeError, fail_fast};
use crate::options::TreeOptions;
use crate::rows::TreeEvent;
use crate::source::{NoDelegate, TreeDataSource, TreeDelegate};

/// Cloneable, single-threaded handle to a [`TreeEngine`].
#[derive(Debug)]
pub struct SharedTree<I> {
    inner: Rc<RefCell<TreeEngine<I>>>,
}

impl<I> Clone for SharedTree<I> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<I: Clone + Eq + Hash> Default for SharedTree<I> {
    fn default() -> Self {
        Self::new(TreeEngine::new())
    }
}

impl<I: Clone + Eq + Hash> SharedTree<I> {
    pub fn new(engine: TreeEngine<I>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(engine)),
        }
    }

    pub fn with_options(options: TreeOptions) -> Self {
        Self::new(TreeEngine::with_options(options))
    }

    /// Borrow the engine for reading.
    ///
    /// Fails while a mutation is in flight.
    pub fn read(&self) -> Result<Ref<'_, TreeEngine<I>>> {
        self.inner.try_borrow().map_err(|_| TreeError::Reentrant {
            operation: "read",
        })
    }

    /// Run `f` with exclusive access to the engine.
    pub fn try_update<R>(
        &self,
        operation: &'static str,
        f: impl FnOnce(&mut TreeEngine<I>) -> Result<R>,
    ) -> Result<R> {
        let mut engine = self
            .inner
            .try_borrow_mut()
            .map_err(|_| TreeError::Reentrant { operation })?;
        f(&mut *engine)
    }

    pub fn index_of_item(&self, item: &I) -> Option<usize> {
        self.read().ok()?.index_of_item(item)
    }

    pub fn item_at_index(&self, index: usize) -> Option<I> {
        self.read().ok()?.item_at_index(index).cloned()
    }

    pub fn len(&self) -> usize {
        self.read().map_or(0, |engine| engine.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[track_caller]
    pub fn compute_visible_rows<S>(&self, source: &S) -> usize
    where
        S: TreeDataSource<I> + ?Sized,
    {
        fail_fast(self.try_compute_visible_rows(source))
    }

    /// Recompute the rows and return their count.
    pub fn try_compute_visible_rows<S>(&self, source: &S) -> Result<usize>
    where
        S: TreeDataSource<I> + ?Sized,
    {
        self.try_update("compute_visible_rows", |engine| {
            engine.try_compute_visible_rows(source).map(<[_]>::len)
        })
    }

    #[track_caller]
    pub fn expand<S>(&self, source: &S, item: &I) -> Range<usize>
    where
        S: TreeDataSource<I> + ?Sized,
    {
        fail_fast(self.try_expand_with(source, &mut NoDelegate, item))
    }

    pub fn try_expand_with<S, D>(
        &self,
        source: &S,
        delegate: &mut D,
        item: &I,
    ) -> Result<Range<usize>>
    where
        S: TreeDataSource<I> + ?Sized,
        D: TreeDelegate<I> + ?Sized,
    {
        self.try_update("expand", |engine| {
            engine.try_expand_with(source, delegate, item)
        })
    }

    #[track_caller]
    pub fn collapse(&self, item: &I) -> Range<usize> {
        fail_fast(self.try_collapse_with(&mut NoDelegate, item))
    }

    pub fn try_collapse_with<D>(
        &self,
        delegate: &mut D,
        item: &I,
    ) -> Result<Range<usize>>
    where
        D: TreeDelegate<I> + ?Sized,
    {
        self.try_update("collapse", |engine| {
            Ok(engine.collapse_with(delegate, item))
        })
    }

    #[track_caller]
    pub fn invalidate(&self, item: &I) {
        fail_fast(self.try_update("invalidate", |engine| {
            engine.invalidate(item);
            Ok(())
        }));
    }

    #[track_caller]
    pub fn next_event(&self) -> Option<TreeEvent<I>> {
        fail_fast(self.try_next_event())
    }

    /// Pop the oldest pending change event.
    ///
    /// Fails while a mutation is in flight, which is distinct from an empty
    /// queue (`Ok(None)`).
    pub fn try_next_event(&self) -> Result<Option<TreeEvent<I>>> {
        self.try_update("next_event", |engine| Ok(engine.next_event()))
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    /// Flat list of `width` roots. With `reenter` set, the first
    /// `number_of_children` call tries to collapse root `0` through the
    /// shared handle.
    struct CallbackSource {
        width: usize,
        tree: SharedTree<usize>,
        reenter: Cell<bool>,
        observed: RefCell<Option<TreeError>>,
    }

    impl TreeDataSource<usize> for CallbackSource {
        fn number_of_children(&self, item: Option<&usize>) -> usize {
            if self.reenter.replace(false) {
                let nested = self.tree.try_collapse_with(&mut NoDelegate, &0);
                *self.observed.borrow_mut() = nested.err();
            }
            match item {
                None => self.width,
                Some(_) => 0,
            }
        }

        fn child(&self, index: usize, _item: Option<&usize>) -> usize {
            index
        }
    }

    fn source(tree: &SharedTree<usize>, reenter: bool) -> CallbackSource {
        CallbackSource {
            width: 3,
            tree: tree.clone(),
            reenter: Cell::new(reenter),
            observed: RefCell::new(None),
        }
    }

    #[test]
    fn handle_forwards_to_engine() {
        let tree = SharedTree::default();
        let source = source(&tree, false);

        assert_eq!(tree.compute_visible_rows(&source), 3);
        assert_eq!(tree.item_at_index(2), Some(2));
        assert_eq!(tree.index_of_item(&1), Some(1));
        assert_eq!(tree.next_event(), Some(TreeEvent::ReloadAll));
        assert!(!tree.is_empty());
    }

    #[test]
    fn nested_mutation_from_data_source_is_rejected() {
        let tree = SharedTree::default();
        let source = source(&tree, true);

        assert_eq!(tree.compute_visible_rows(&source), 3);
        assert!(matches!(
            source.observed.borrow().as_ref(),
            Some(TreeError::Reentrant {
                operation: "collapse"
            })
        ));
    }

    #[test]
    fn reads_during_mutation_are_rejected() {
        let tree: SharedTree<usize> = SharedTree::default();
        let result = tree.try_update("outer", |_| {
            Ok(tree.read().is_err() && tree.index_of_item(&0).is_none())
        });
        assert!(result.unwrap());
    }

    #[test]
    fn event_polling_during_mutation_is_an_error() {
        let tree: SharedTree<usize> = SharedTree::default();
        let source = source(&tree, false);
        tree.compute_visible_rows(&source);

        let nested = tree.try_update("outer", |_| Ok(tree.try_next_event()));
        assert!(matches!(
            nested.unwrap(),
            Err(TreeError::Reentrant {
                operation: "next_event"
            })
        ));

        assert_eq!(tree.try_next_event().unwrap(), Some(TreeEvent::ReloadAll));
        assert_eq!(tree.try_next_event().unwrap(), None);
    }

    #[test]
    #[should_panic(expected = "re-entrant tree mutation during `expand`")]
    fn plain_api_fails_fast_on_reentrancy() {
        let tree: SharedTree<usize> = SharedTree::default();
        let source = source(&tree, false);
        let _ = tree.try_update("outer", |_| {
            tree.expand(&source, &0);
            Ok(())
        });
    }
}
