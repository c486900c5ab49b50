use thiserror::Error;

/// Contract violations and configuration failures reported by the tree
/// engine.
///
/// The plain engine API treats the collaborator and re-entrancy variants as
/// fatal and panics with their message; the `try_*` API returns them.
#[derive(Debug, Error)]
pub enum TreeError {
    #[error("child index {index} out of range ({count} children)")]
    ChildIndexOutOfRange { index: usize, count: usize },

    #[error(
        "data source reported an item already in the tree \
         (parent depth {parent_depth:?})"
    )]
    DuplicateItem { parent_depth: Option<usize> },

    #[error("re-entrant tree mutation during `{operation}`")]
    Reentrant { operation: &'static str },

    #[error("invalid tree options: {0}")]
    Options(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TreeError>;

/// Abort on a contract violation.
#[track_caller]
pub(crate) fn fail_fast<T>(result: Result<T>) -> T {
    match result {
        Ok(value) => value,
        Err(err) => panic!("tree contract violation: {err}"),
    }
}
