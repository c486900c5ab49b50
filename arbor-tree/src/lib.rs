//! Tree flattening and expand/collapse row state for flat list widgets.
//!
//! A list widget renders a flat sequence of rows. This crate maps a
//! hierarchy, reachable only through a [`TreeDataSource`], onto such a
//! sequence:
//! - [`TreeEngine`] owns per-item expansion state, computes the visible rows
//!   as a pre-order walk over expanded nodes, and keeps an item to row index
//!   so that both lookups are O(1);
//! - [`TreeEngine::expand`] and [`TreeEngine::collapse`] splice rows in place
//!   and report the touched range, also queued as a [`TreeEvent`] for the
//!   widget to animate;
//! - [`TreeDelegate`] carries the optional hooks (vetoes, will/did
//!   notifications, selection redirects);
//! - [`SharedTree`] wraps the engine for hosts whose collaborators call back
//!   into it and rejects re-entrant mutation.
//!
//! # Quick Example
//!
//! ```
//! use arbor_tree::{TreeDataSource, TreeEngine};
//!
//! struct Outline;
//!
//! impl TreeDataSource<&'static str> for Outline {
//!     fn number_of_children(&self, item: Option<&&'static str>) -> usize {
//!         match item.copied() {
//!             None => 1,
//!             Some("book") => 2,
//!             Some(_) => 0,
//!         }
//!     }
//!
//!     fn child(
//!         &self,
//!         index: usize,
//!         item: Option<&&'static str>,
//!     ) -> &'static str {
//!         match item.copied() {
//!             None => "book",
//!             Some(_) => ["intro", "outro"][index],
//!         }
//!     }
//! }
//!
//! let mut engine = TreeEngine::new();
//! engine.compute_visible_rows(&Outline);
//! assert_eq!(engine.expand(&Outline, &"book"), 1..3);
//! assert_eq!(engine.index_of_item(&"outro"), Some(2));
//! assert_eq!(engine.visible_rows()[2].depth, 1);
//! ```

mod engine;
mod error;
mod node;
mod options;
mod rows;
mod shared;
mod source;

pub use engine::{TreeEngine, TreeSnapshot};
pub use error::{Result, TreeError};
pub use node::NodeState;
pub use options::{CollapsePolicy, TreeOptions};
pub use rows::{TreeEvent, VisibleRow};
pub use shared::SharedTree;
pub use source::{NoDelegate, TreeDataSource, TreeDelegate};
