use std::hash::Hash;

use arbor_tree::{TreeEngine, VisibleRow};
use iced::alignment;
use iced::widget::{Column, Row, Space, container, mouse_area};
use iced::{Element, Length, mouse};

/// Rendering context passed to row callbacks.
pub struct TreeRowContext<'a, I> {
    pub row: &'a VisibleRow<I>,
    /// Position of the row in the engine's visible sequence.
    pub index: usize,
    pub is_expanded: bool,
    /// Cached child count; `None` until the engine loaded the children.
    pub child_count: Option<usize>,
    pub is_selected: bool,
    pub is_hovered: bool,
}

impl<I> TreeRowContext<'_, I> {
    #[inline]
    pub fn item(&self) -> &I {
        &self.row.item
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.row.depth
    }

    /// Whether the row may have children: known non-empty or not loaded yet.
    pub fn may_expand(&self) -> bool {
        self.child_count != Some(0)
    }
}

type RowRenderer<'a, I, Message> =
    dyn Fn(&TreeRowContext<'a, I>) -> Element<'a, Message> + 'a;
type RowStyle<'a, I> = dyn Fn(&TreeRowContext<'a, I>) -> container::Style + 'a;
type RowPredicate<'a, I> = dyn Fn(&TreeRowContext<'a, I>) -> bool + 'a;
type RowIndent<'a, I> = dyn Fn(&TreeRowContext<'a, I>) -> usize + 'a;
type ItemAction<'a, I, Message> = dyn Fn(I) -> Message + 'a;
type HoverAction<'a, I, Message> = dyn Fn(Option<I>) -> Message + 'a;

/// List adapter that renders the visible rows of a [`TreeEngine`].
///
/// The engine decides which rows exist; this view only lays them out with
/// indentation, a toggle slot and mouse handlers keyed by item.
pub struct TreeView<'a, I, Message: Clone + 'a> {
    engine: &'a TreeEngine<I>,
    hovered: Option<&'a I>,
    render_row: Box<RowRenderer<'a, I, Message>>,
    row_style: Option<Box<RowStyle<'a, I>>>,
    toggle_content: Option<Box<RowRenderer<'a, I, Message>>>,
    row_interactive: Option<Box<RowPredicate<'a, I>>>,
    indentation: Option<Box<RowIndent<'a, I>>>,
    on_press: Option<Box<ItemAction<'a, I, Message>>>,
    on_right_press: Option<Box<ItemAction<'a, I, Message>>>,
    on_toggle: Option<Box<ItemAction<'a, I, Message>>>,
    on_hover: Option<Box<HoverAction<'a, I, Message>>>,
    spacing: f32,
    indent_width: f32,
    toggle_width: f32,
}

impl<'a, I, Message> TreeView<'a, I, Message>
where
    I: Clone + Eq + Hash + 'a,
    Message: Clone + 'a,
{
    /// Create a view over `engine`; `render_row` builds the cell of a row.
    pub fn new(
        engine: &'a TreeEngine<I>,
        render_row: impl Fn(&TreeRowContext<'a, I>) -> Element<'a, Message>
        + 'a,
    ) -> Self {
        Self {
            engine,
            hovered: None,
            render_row: Box::new(render_row),
            row_style: None,
            toggle_content: None,
            row_interactive: None,
            indentation: None,
            on_press: None,
            on_right_press: None,
            on_toggle: None,
            on_hover: None,
            spacing: 0.0,
            indent_width: 0.0,
            toggle_width: 0.0,
        }
    }

    /// Provide the hovered item to inform row rendering.
    pub fn hovered(mut self, item: Option<&'a I>) -> Self {
        self.hovered = item;
        self
    }

    /// Emit a message when a row receives a left press.
    pub fn on_press(mut self, on_press: impl Fn(I) -> Message + 'a) -> Self {
        self.on_press = Some(Box::new(on_press));
        self
    }

    /// Emit a message when a row receives a right press.
    pub fn on_right_press(
        mut self,
        on_right_press: impl Fn(I) -> Message + 'a,
    ) -> Self {
        self.on_right_press = Some(Box::new(on_right_press));
        self
    }

    /// Emit a message when the toggle slot of an expandable row is pressed.
    pub fn on_toggle(mut self, on_toggle: impl Fn(I) -> Message + 'a) -> Self {
        self.on_toggle = Some(Box::new(on_toggle));
        self
    }

    /// Emit a message when the pointer enters or leaves a row.
    pub fn on_hover(
        mut self,
        on_hover: impl Fn(Option<I>) -> Message + 'a,
    ) -> Self {
        self.on_hover = Some(Box::new(on_hover));
        self
    }

    /// Provide a row style callback for background/text styling.
    pub fn row_style(
        mut self,
        row_style: impl Fn(&TreeRowContext<'a, I>) -> container::Style + 'a,
    ) -> Self {
        self.row_style = Some(Box::new(row_style));
        self
    }

    /// Provide content to render inside the toggle slot.
    pub fn toggle_content(
        mut self,
        toggle_content: impl Fn(&TreeRowContext<'a, I>) -> Element<'a, Message>
        + 'a,
    ) -> Self {
        self.toggle_content = Some(Box::new(toggle_content));
        self
    }

    /// Control whether a row receives mouse handlers.
    pub fn row_interactive(
        mut self,
        row_interactive: impl Fn(&TreeRowContext<'a, I>) -> bool + 'a,
    ) -> Self {
        self.row_interactive = Some(Box::new(row_interactive));
        self
    }

    /// Override the indentation level of a row (defaults to its depth).
    pub fn indentation(
        mut self,
        indentation: impl Fn(&TreeRowContext<'a, I>) -> usize + 'a,
    ) -> Self {
        self.indentation = Some(Box::new(indentation));
        self
    }

    /// Set indentation width per level.
    pub fn indent_width(mut self, width: f32) -> Self {
        self.indent_width = width.max(0.0);
        self
    }

    /// Set the width reserved for the toggle slot.
    pub fn toggle_width(mut self, width: f32) -> Self {
        self.toggle_width = width.max(0.0);
        self
    }

    /// Vertical spacing between rows.
    pub fn spacing(mut self, spacing: f32) -> Self {
        self.spacing = spacing;
        self
    }

    /// Build the `Element` for the tree view.
    pub fn view(self) -> Element<'a, Message> {
        let mut column = Column::new().spacing(self.spacing);
        let engine = self.engine;
        let selected = engine.selected_item();

        for (index, row) in engine.visible_rows().iter().enumerate() {
            let context = TreeRowContext {
                row,
                index,
                is_expanded: engine.is_expanded(&row.item),
                child_count: engine.child_count(&row.item),
                is_selected: selected == Some(&row.item),
                is_hovered: self.hovered == Some(&row.item),
            };
            column = column.push(self.build_row(&context));
        }

        column.into()
    }

    fn build_row(
        &self,
        context: &TreeRowContext<'a, I>,
    ) -> Element<'a, Message> {
        let is_interactive = self
            .row_interactive
            .as_ref()
            .is_none_or(|predicate| predicate(context));

        let content = (self.render_row)(context);
        let content = if is_interactive {
            wrap_mouse_area(
                content,
                self.on_press.as_deref(),
                self.on_right_press.as_deref(),
                self.on_hover.as_deref(),
                context.item(),
            )
        } else {
            content
        };

        let mut row = Row::new().spacing(0.0);

        let level = self
            .indentation
            .as_ref()
            .map_or(context.depth(), |indentation| indentation(context));
        let indent = level as f32 * self.indent_width;
        if indent > 0.0 {
            row = row.push(Space::new().width(Length::Fixed(indent)));
        }

        if self.toggle_width > 0.0 || self.toggle_content.is_some() {
            row = row.push(self.build_toggle_slot(context, is_interactive));
        }

        row = row.push(content);

        let mut element: Element<'a, Message> = row.into();
        if let Some(ref row_style) = self.row_style {
            let style = row_style(context);
            element = container(element).style(move |_| style).into();
        }
        element
    }

    fn build_toggle_slot(
        &self,
        context: &TreeRowContext<'a, I>,
        is_interactive: bool,
    ) -> Element<'a, Message> {
        let content = self
            .toggle_content
            .as_ref()
            .map(|toggle| toggle(context))
            .unwrap_or_else(|| Space::new().into());

        let content: Element<'a, Message> = container(content)
            .width(Length::Fixed(self.toggle_width))
            .height(Length::Fill)
            .align_x(alignment::Horizontal::Center)
            .align_y(alignment::Vertical::Center)
            .into();

        match self.on_toggle.as_deref() {
            Some(on_toggle) if is_interactive && context.may_expand() => {
                wrap_mouse_area(
                    content,
                    Some(on_toggle),
                    None,
                    self.on_hover.as_deref(),
                    context.item(),
                )
            },
            _ => content,
        }
    }
}

fn wrap_mouse_area<'a, I: Clone, Message: Clone + 'a>(
    element: Element<'a, Message>,
    on_press: Option<&(dyn Fn(I) -> Message + 'a)>,
    on_right_press: Option<&(dyn Fn(I) -> Message + 'a)>,
    on_hover: Option<&(dyn Fn(Option<I>) -> Message + 'a)>,
    item: &I,
) -> Element<'a, Message> {
    if on_press.is_none() && on_right_press.is_none() && on_hover.is_none() {
        return element;
    }

    let mut area = mouse_area(element);

    if let Some(on_press) = on_press {
        area = area.on_press(on_press(item.clone()));
    }

    if let Some(on_right_press) = on_right_press {
        area = area.on_right_press(on_right_press(item.clone()));
    }

    if let Some(on_hover) = on_hover {
        area = area
            .on_enter(on_hover(Some(item.clone())))
            .on_exit(on_hover(None));
    }

    area.interaction(mouse::Interaction::Pointer).into()
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use arbor_tree::TreeDataSource;

    use super::*;

    struct Pair;

    impl TreeDataSource<u8> for Pair {
        fn number_of_children(&self, item: Option<&u8>) -> usize {
            match item {
                None => 1,
                Some(0) => 2,
                Some(_) => 0,
            }
        }

        fn child(&self, index: usize, item: Option<&u8>) -> u8 {
            match item {
                None => 0,
                Some(_) => index as u8 + 1,
            }
        }
    }

    fn context<'a>(
        row: &'a VisibleRow<u8>,
        child_count: Option<usize>,
    ) -> TreeRowContext<'a, u8> {
        TreeRowContext {
            row,
            index: 0,
            is_expanded: false,
            child_count,
            is_selected: false,
            is_hovered: false,
        }
    }

    #[test]
    fn unknown_or_non_empty_rows_may_expand() {
        let row = VisibleRow::new(3u8, 2);
        assert!(context(&row, None).may_expand());
        assert!(context(&row, Some(4)).may_expand());
        assert!(!context(&row, Some(0)).may_expand());
        assert_eq!(context(&row, None).depth(), 2);
        assert_eq!(*context(&row, None).item(), 3);
    }

    #[test]
    fn view_builds_for_every_visible_row() {
        let mut engine = TreeEngine::new();
        engine.compute_visible_rows(&Pair);
        engine.expand(&Pair, &0);
        engine.select_row(1);

        let rendered = RefCell::new(Vec::new());
        {
            let _element: Element<'_, ()> = TreeView::new(&engine, |context| {
                rendered.borrow_mut().push((
                    *context.item(),
                    context.depth(),
                    context.is_selected,
                ));
                Space::new().into()
            })
            .indent_width(12.0)
            .toggle_width(16.0)
            .on_press(|_| ())
            .view();
        }

        assert_eq!(
            rendered.into_inner(),
            vec![(0, 0, false), (1, 1, true), (2, 1, false)]
        );
    }
}
