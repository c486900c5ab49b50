//! Collaborator contracts supplied by the host application.
//!
//! [`TreeDataSource`] is the required structural interface. Everything else
//! a host may want to observe or veto lives on [`TreeDelegate`], whose methods
//! all have defaults, so implementing only the hooks you care about is enough.

/// Structural queries the engine issues while flattening the tree.
///
/// `item == None` addresses the invisible super-root: its children are the
/// root items. Answers must stay stable between calls until the host issues
/// [`crate::TreeEngine::invalidate`] or [`crate::TreeEngine::reload_data`].
pub trait TreeDataSource<I> {
    /// Number of children of `item`.
    fn number_of_children(&self, item: Option<&I>) -> usize;

    /// Child `index` of `item`. The engine only asks for indices below
    /// [`TreeDataSource::number_of_children`].
    fn child(&self, index: usize, item: Option<&I>) -> I;
}

/// Optional expansion and selection hooks.
///
/// Hooks only receive the item, so they cannot reach back into the engine
/// that is calling them.
pub trait TreeDelegate<I> {
    fn should_expand(&mut self, _item: &I) -> bool {
        true
    }

    fn will_expand(&mut self, _item: &I) {}

    fn did_expand(&mut self, _item: &I) {}

    fn should_collapse(&mut self, _item: &I) -> bool {
        true
    }

    fn will_collapse(&mut self, _item: &I) {}

    fn did_collapse(&mut self, _item: &I) {}

    /// Confirm, redirect or cancel (`None`) a pending selection.
    fn will_select(&mut self, item: &I) -> Option<I>
    where
        I: Clone,
    {
        Some(item.clone())
    }

    fn did_select(&mut self, _item: &I) {}

    /// Return `false` to keep the current selection.
    fn will_deselect(&mut self, _item: &I) -> bool {
        true
    }

    fn did_deselect(&mut self, _item: &I) {}

    /// Indentation level used by list adapters; defaults to the tree depth.
    fn indentation_level(&self, _item: &I, depth: usize) -> usize {
        depth
    }
}

/// Delegate that accepts every request.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoDelegate;

impl<I> TreeDelegate<I> for NoDelegate {}
