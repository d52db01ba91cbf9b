use crate::core::models::label_of;
use crate::core::types::Row;
use crate::tui::components::overlay::{Overlay, OverlayCommand, OverlayShell};
use crate::tui::draw::{fill, fit, put_str, to_box, text_width};
use crate::tui::{Action, Theme};
use crate::ui::tree::{Element, ElementId, ElementTree, Role};
use ratatui::{
    layout::Rect,
    style::Modifier,
    widgets::{Block, Borders, Clear},
    Frame,
};
use textwrap::wrap;

const DRAWER_WIDTH: u16 = 48;

/// Side drawer listing every field of one row
pub struct DetailDrawer {
    shell: OverlayShell,
    row: Row,
    close_button: ElementId,
    fields: ElementId,
    scroll: usize,
    /// Content lines from the last layout, used to bound scrolling
    line_count: usize,
    page: usize,
}

impl DetailDrawer {
    pub fn open(tree: &mut ElementTree, parent: ElementId, row: Row, on_close: impl FnMut() + 'static) -> Self {
        let container = tree.append(parent, Element::new(Role::Container).with_label("detail"));
        let close_button = tree.append(container, Element::new(Role::Button).with_label("Close"));
        let fields = tree.append(
            container,
            Element::new(Role::Container).with_label("fields").with_tab_index(0),
        );
        let shell = OverlayShell::open(tree, container, Some(close_button), false, on_close);
        Self {
            shell,
            row,
            close_button,
            fields,
            scroll: 0,
            line_count: 0,
            page: 1,
        }
    }

    pub fn row(&self) -> &Row {
        &self.row
    }

    /// Drawer title: the row's student id
    pub fn title(&self) -> String {
        let id = self.row.text("student_id");
        if id.is_empty() {
            "Student detail".to_string()
        } else {
            id
        }
    }

    fn lines(&self, width: usize) -> Vec<(String, bool)> {
        let mut lines = Vec::new();
        for (key, value) in self.row.fields() {
            let label = label_of(key);
            let heading = if label == key.as_str() {
                key.clone()
            } else {
                format!("{label} ({key})")
            };
            lines.push((heading, true));
            let text = value.display();
            if text.is_empty() {
                lines.push((String::new(), false));
            } else {
                for line in wrap(&text, width.max(1)) {
                    lines.push((line.into_owned(), false));
                }
            }
        }
        lines
    }

    fn scroll_by(&mut self, delta: isize) {
        let max = self.line_count.saturating_sub(self.page);
        self.scroll = self.scroll.saturating_add_signed(delta).min(max);
    }
}

impl Overlay for DetailDrawer {
    fn shell(&self) -> &OverlayShell {
        &self.shell
    }

    fn shell_mut(&mut self) -> &mut OverlayShell {
        &mut self.shell
    }

    fn activate(&mut self, _tree: &mut ElementTree, element: ElementId) -> OverlayCommand {
        if element == self.close_button {
            OverlayCommand::Close
        } else {
            OverlayCommand::None
        }
    }

    fn handle_action(&mut self, tree: &mut ElementTree, action: Action) -> OverlayCommand {
        match action {
            Action::MoveDown => self.scroll_by(1),
            Action::MoveUp => self.scroll_by(-1),
            Action::PageDown => self.scroll_by(self.page as isize),
            Action::PageUp => self.scroll_by(-(self.page as isize)),
            Action::GoToTop => self.scroll = 0,
            Action::GoToBottom => self.scroll_by(isize::MAX / 2),
            Action::Confirm | Action::OpenDetail => {
                if tree.active_element() == Some(self.close_button) {
                    return OverlayCommand::Close;
                }
            }
            Action::Cancel => return OverlayCommand::Close,
            _ => {}
        }
        OverlayCommand::None
    }

    fn render(&mut self, frame: &mut Frame, tree: &mut ElementTree, theme: &Theme) {
        let screen = frame.area();
        let width = DRAWER_WIDTH.min(screen.width);
        let area = Rect::new(screen.right() - width, screen.y, width, screen.height);
        tree.set_rect(self.shell.container(), to_box(area));

        frame.render_widget(Clear, area);
        let block = Block::default()
            .borders(Borders::LEFT)
            .border_style(theme.focused_border_style());
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let close_label = "[ Close ]";
        let close_x = inner.right().saturating_sub(text_width(close_label) as u16 + 1);
        tree.set_rect(
            self.close_button,
            to_box(Rect::new(close_x, inner.y, text_width(close_label) as u16, 1)),
        );
        let body = Rect::new(inner.x + 1, inner.y + 2, inner.width.saturating_sub(2), inner.height.saturating_sub(2));
        tree.set_rect(self.fields, to_box(body));

        let lines = self.lines(body.width.saturating_sub(2) as usize);
        self.line_count = lines.len();
        self.page = (body.height as usize).max(1);
        self.scroll_by(0);

        let focused = tree.active_element();
        let buf = frame.buffer_mut();
        fill(buf, inner, theme.normal_style());
        put_str(
            buf,
            inner,
            inner.x as i32 + 1,
            inner.y as i32,
            &fit(&self.title(), close_x.saturating_sub(inner.x + 2) as usize),
            theme.header_style(),
        );
        let close_style = if focused == Some(self.close_button) {
            theme.focus_style()
        } else {
            theme.normal_style()
        };
        put_str(buf, inner, close_x as i32, inner.y as i32, close_label, close_style);

        for (i, (text, heading)) in lines.iter().skip(self.scroll).take(body.height as usize).enumerate() {
            let y = body.y as i32 + i as i32;
            if *heading {
                put_str(buf, body, body.x as i32, y, text, theme.info_style().add_modifier(Modifier::BOLD));
            } else {
                put_str(buf, body, body.x as i32 + 2, y, text, theme.normal_style());
            }
        }
        if focused == Some(self.fields) {
            put_str(buf, inner, inner.x as i32, body.y as i32, "▌", theme.focused_border_style());
        }
    }
}
