use arbor_tree::{TreeDataSource, TreeEngine, TreeOptions};
use arbor_ui_tree::{TreeRowContext, TreeView};
use iced::widget::{Space, column, container, row, text};
use iced::{Color, Element, Length};
use log::debug;

#[derive(Debug, Clone)]
enum Message {
    Toggle(usize),
    Select(usize),
    Hover(Option<usize>),
}

struct Entry {
    title: &'static str,
    children: Vec<usize>,
}

/// Flat arena of entries; items are indices into it.
struct Outline {
    entries: Vec<Entry>,
    roots: Vec<usize>,
}

impl Outline {
    fn sample() -> Self {
        let entry = |title, children: &[usize]| Entry {
            title,
            children: children.to_vec(),
        };
        Self {
            entries: vec![
                entry("General", &[1, 2]),
                entry("Terminal", &[3, 4]),
                entry("Theme", &[]),
                entry("Fonts", &[]),
                entry("Cursor", &[]),
                entry("About", &[]),
            ],
            roots: vec![0, 5],
        }
    }

    fn title(&self, item: usize) -> &'static str {
        self.entries[item].title
    }

    fn is_folder(&self, item: usize) -> bool {
        !self.entries[item].children.is_empty()
    }
}

impl TreeDataSource<usize> for Outline {
    fn number_of_children(&self, item: Option<&usize>) -> usize {
        match item {
            None => self.roots.len(),
            Some(item) => self.entries[*item].children.len(),
        }
    }

    fn child(&self, index: usize, item: Option<&usize>) -> usize {
        match item {
            None => self.roots[index],
            Some(item) => self.entries[*item].children[index],
        }
    }
}

struct AppState {
    outline: Outline,
    engine: TreeEngine<usize>,
    hovered: Option<usize>,
}

impl Default for AppState {
    fn default() -> Self {
        let outline = Outline::sample();
        let options = TreeOptions::default().with_initially_expanded(false);
        let mut engine = TreeEngine::with_options(options);
        engine.compute_visible_rows(&outline);
        engine.expand(&outline, &0);

        Self {
            outline,
            engine,
            hovered: None,
        }
    }
}

fn update(state: &mut AppState, message: Message) {
    match message {
        Message::Toggle(item) => {
            let range = state.engine.toggle(&state.outline, &item);
            debug!("toggled {item}: rows {range:?}");
        },
        Message::Select(item) => {
            if state.outline.is_folder(item) {
                state.engine.toggle(&state.outline, &item);
            } else {
                state.engine.select_item(&item);
            }
        },
        Message::Hover(item) => {
            state.hovered = item;
        },
    }

    for event in state.engine.drain_events() {
        debug!("tree event: {event:?}");
    }
}

fn view(state: &AppState) -> Element<'_, Message> {
    let outline = &state.outline;

    TreeView::new(&state.engine, move |context| render_row(outline, context))
        .hovered(state.hovered.as_ref())
        .on_press(Message::Select)
        .on_toggle(Message::Toggle)
        .on_hover(Message::Hover)
        .row_style(row_style)
        .toggle_content(toggle_icon)
        .toggle_width(16.0)
        .indent_width(14.0)
        .spacing(0.0)
        .view()
}

fn render_row<'a>(
    outline: &Outline,
    context: &TreeRowContext<'a, usize>,
) -> Element<'a, Message> {
    let item = *context.item();
    let label = if outline.is_folder(item) {
        format!("Folder: {}", outline.title(item))
    } else {
        format!("File: {}", outline.title(item))
    };

    let row = row![text(label)].spacing(6);
    container(column![row])
        .padding([4, 8])
        .width(Length::Fill)
        .into()
}

fn row_style(context: &TreeRowContext<'_, usize>) -> container::Style {
    let background = if context.is_selected {
        Some(Color::from_rgb(0.12, 0.26, 0.46).into())
    } else if context.is_hovered {
        Some(Color::from_rgb(0.18, 0.18, 0.18).into())
    } else {
        None
    };

    container::Style {
        background,
        text_color: Some(Color::from_rgb(0.9, 0.9, 0.9)),
        ..Default::default()
    }
}

fn toggle_icon<'a>(
    context: &TreeRowContext<'a, usize>,
) -> Element<'a, Message> {
    if !context.may_expand() {
        return Space::new().width(Length::Fixed(16.0)).into();
    }

    let label = if context.is_expanded { "[-]" } else { "[+]" };
    text(label).into()
}

fn main() -> iced::Result {
    env_logger::init();
    iced::run(update, view)
}
