/// Expansion state of a single node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NodeState {
    #[default]
    Collapsed,
    Expanded,
}

impl NodeState {
    pub(crate) fn initial(expanded: bool) -> Self {
        if expanded {
            Self::Expanded
        } else {
            Self::Collapsed
        }
    }

    #[inline]
    pub fn is_expanded(self) -> bool {
        self == Self::Expanded
    }
}

/// Engine-side bookkeeping for one item.
#[derive(Clone, Debug)]
pub(crate) struct NodeRecord<I> {
    /// `None` for root items.
    pub parent: Option<I>,
    /// Children as last reported by the data source; `None` until loaded.
    pub children: Option<Vec<I>>,
    pub state: NodeState,
    pub depth: usize,
}

impl<I> NodeRecord<I> {
    pub(crate) fn new(
        parent: Option<I>,
        depth: usize,
        state: NodeState,
    ) -> Self {
        Self {
            parent,
            children: None,
            state,
            depth,
        }
    }

    /// Children slice, empty when not loaded yet.
    pub(crate) fn loaded_children(&self) -> &[I] {
        self.children.as_deref().unwrap_or(&[])
    }
}

/// State kept aside for an item whose record was dropped.
#[derive(Clone, Debug)]
pub(crate) struct ParkedState<I> {
    /// Parent the item was last reported under (`Some(None)` for roots).
    /// `None` for states restored from a snapshot, whose parent is unknown.
    pub parent: Option<Option<I>>,
    pub state: NodeState,
}

impl<I> ParkedState<I> {
    pub(crate) fn under(parent: Option<I>, state: NodeState) -> Self {
        Self {
            parent: Some(parent),
            state,
        }
    }

    pub(crate) fn unanchored(state: NodeState) -> Self {
        Self {
            parent: None,
            state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_state_follows_flag() {
        assert_eq!(NodeState::initial(true), NodeState::Expanded);
        assert_eq!(NodeState::initial(false), NodeState::Collapsed);
        assert!(!NodeState::default().is_expanded());
    }

    #[test]
    fn unloaded_record_reports_no_children() {
        let record: NodeRecord<u8> =
            NodeRecord::new(None, 0, NodeState::Expanded);
        assert!(record.children.is_none());
        assert!(record.loaded_children().is_empty());
    }
}
