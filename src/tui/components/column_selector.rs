use crate::core::models::label_of;
use crate::tui::components::overlay::{Overlay, OverlayCommand, OverlayShell};
use crate::tui::draw::{centered_rect, fill, fit, put_str, to_box};
use crate::tui::Theme;
use crate::ui::geometry::Rect as BoxRect;
use crate::ui::tree::{Element, ElementId, ElementTree, InputType, Role};
use ratatui::{
    layout::Rect,
    style::Modifier,
    widgets::{Block, BorderType, Borders, Clear},
    Frame,
};

const MAX_WIDTH: u16 = 56;

/// Modal checkbox list of every report column; checked means visible
pub struct ColumnSelector {
    shell: OverlayShell,
    columns: Vec<(ElementId, String)>,
    close_button: ElementId,
    list_scroll: usize,
}

impl ColumnSelector {
    pub fn open(
        tree: &mut ElementTree,
        parent: ElementId,
        all_columns: &[String],
        visible: &[String],
        on_close: impl FnMut() + 'static,
    ) -> Self {
        let container = tree.append(parent, Element::new(Role::Container).with_label("columns"));
        let columns = all_columns
            .iter()
            .map(|column| {
                let checkbox = Element::new(Role::Input(InputType::Checkbox))
                    .with_label(column.clone())
                    .with_value(column.clone())
                    .checked(visible.contains(column));
                (tree.append(container, checkbox), column.clone())
            })
            .collect();
        let close_button = tree.append(container, Element::new(Role::Button).with_label("Close"));
        let shell = OverlayShell::open(tree, container, None, true, on_close);
        Self {
            shell,
            columns,
            close_button,
            list_scroll: 0,
        }
    }

    /// Mirror the current visible column list
    pub fn sync_visible(&self, tree: &mut ElementTree, visible: &[String]) {
        for (id, column) in &self.columns {
            if let Some(el) = tree.get_mut(*id) {
                el.checked = visible.contains(column);
            }
        }
    }

    fn layout(&mut self, tree: &mut ElementTree, screen: Rect) -> Rect {
        let width = MAX_WIDTH.min(screen.width * 92 / 100).max(10);
        let max_height = (screen.height * 80 / 100).max(6);
        // title, blank, list, blank, close button and the borders
        let height = (self.columns.len() as u16 + 6).min(max_height);
        let area = centered_rect(screen, width, height);
        tree.set_rect(self.shell.container(), to_box(area));

        let list_rows = height.saturating_sub(6).max(1) as usize;
        let focused = tree.active_element();
        if let Some(index) = self.columns.iter().position(|(id, _)| Some(*id) == focused) {
            if index < self.list_scroll {
                self.list_scroll = index;
            } else if index >= self.list_scroll + list_rows {
                self.list_scroll = index + 1 - list_rows;
            }
        }
        self.list_scroll = self.list_scroll.min(self.columns.len().saturating_sub(list_rows));

        let list_top = area.y as f64 + 3.0;
        for (i, (id, _)) in self.columns.iter().enumerate() {
            let y = list_top + i as f64 - self.list_scroll as f64;
            tree.set_rect(*id, BoxRect::new(area.x as f64 + 2.0, y, width as f64 - 4.0, 1.0));
        }
        tree.set_rect(
            self.close_button,
            BoxRect::new(area.x as f64 + 2.0, area.bottom() as f64 - 2.0, 9.0, 1.0),
        );
        area
    }
}

impl Overlay for ColumnSelector {
    fn shell(&self) -> &OverlayShell {
        &self.shell
    }

    fn shell_mut(&mut self) -> &mut OverlayShell {
        &mut self.shell
    }

    fn activate(&mut self, _tree: &mut ElementTree, element: ElementId) -> OverlayCommand {
        if element == self.close_button {
            return OverlayCommand::Close;
        }
        self.columns
            .iter()
            .find(|(id, _)| *id == element)
            .map(|(_, column)| OverlayCommand::ToggleColumn(column.clone()))
            .unwrap_or(OverlayCommand::None)
    }

    fn render(&mut self, frame: &mut Frame, tree: &mut ElementTree, theme: &Theme) {
        let screen = frame.area();
        frame
            .buffer_mut()
            .set_style(screen, theme.backdrop_style().add_modifier(Modifier::DIM));

        let area = self.layout(tree, screen);
        frame.render_widget(Clear, area);
        let block = Block::default()
            .title(" Columns ")
            .borders(Borders::ALL)
            .border_type(BorderType::Double)
            .border_style(theme.focused_border_style());
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let buf = frame.buffer_mut();
        fill(buf, inner, theme.normal_style());
        put_str(
            buf,
            inner,
            inner.x as i32 + 1,
            inner.y as i32,
            "Toggle the columns shown in the table",
            theme.info_style(),
        );

        let focused = tree.active_element();
        let list_top = area.y as i32 + 3;
        let list_bottom = area.bottom() as i32 - 3;
        for (id, column) in &self.columns {
            let Some(el) = tree.get(*id) else {
                continue;
            };
            let y = el.rect.y as i32;
            if y < list_top || y >= list_bottom {
                continue;
            }
            let mark = if el.checked { "[x]" } else { "[ ]" };
            let label = label_of(column);
            let text = if label == column.as_str() {
                format!("{mark} {column}")
            } else {
                format!("{mark} {label} ({column})")
            };
            let style = if focused == Some(*id) {
                theme.focus_style()
            } else {
                theme.normal_style()
            };
            put_str(buf, inner, el.rect.x as i32, y, &fit(&text, el.rect.width as usize), style);
        }

        if let Some(r) = tree.rect(self.close_button) {
            let style = if focused == Some(self.close_button) {
                theme.focus_style()
            } else {
                theme.normal_style()
            };
            put_str(buf, inner, r.x as i32, r.y as i32, "[ Close ]", style);
        }
    }
}
