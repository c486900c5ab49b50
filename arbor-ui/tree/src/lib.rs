//! [`iced`] list adapter for [`arbor_tree::TreeEngine`].
//!
//! The engine owns the tree state and the visible row sequence; this crate
//! renders those rows. The recommended flow for interactive trees:
//! 1. keep a [`arbor_tree::TreeEngine`] and your data source in app state;
//! 2. build a [`TreeView`] from the engine in `view`;
//! 3. route [`TreeView::on_toggle`] and [`TreeView::on_press`] messages back
//!    to [`arbor_tree::TreeEngine::toggle`] and
//!    [`arbor_tree::TreeEngine::select_item`] in `update`.
//!
//! See `examples/tree_view.rs` for a complete runnable example.
//!
//! # Quick Example
//!
//! ```no_run
//! use arbor_tree::{TreeDataSource, TreeEngine};
//! use arbor_ui_tree::TreeView;
//! use iced::widget::text;
//! use iced::Element;
//!
//! struct Numbers;
//!
//! impl TreeDataSource<u32> for Numbers {
//!     fn number_of_children(&self, item: Option<&u32>) -> usize {
//!         if item.is_some_and(|value| *value >= 100) { 0 } else { 3 }
//!     }
//!
//!     fn child(&self, index: usize, item: Option<&u32>) -> u32 {
//!         item.map_or(0, |value| value * 10) + index as u32 + 1
//!     }
//! }
//!
//! #[derive(Clone)]
//! enum Message {
//!     Toggle(u32),
//! }
//!
//! fn view(engine: &TreeEngine<u32>) -> Element<'_, Message> {
//!     TreeView::new(engine, |ctx| text(ctx.item().to_string()).into())
//!         .on_toggle(Message::Toggle)
//!         .toggle_width(16.0)
//!         .indent_width(14.0)
//!         .view()
//! }
//! ```

mod view;

pub use view::{TreeRowContext, TreeView};
