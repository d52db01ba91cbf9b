//! Column filter popover: sort buttons, one checkbox per distinct value and a
//! button that hides the column. It floats under the header cell it was
//! opened from; the host feeds it the anchor rectangle the table filter
//! engine keeps up to date.

use crate::core::models::label_of;
use crate::core::types::{SortDirection, SortState};
use crate::table::popover::FilterPopoverConfig;
use crate::tui::components::overlay::{Overlay, OverlayCommand, OverlayShell};
use crate::tui::draw::{fill, fit, put_str, to_cells};
use crate::tui::Theme;
use crate::ui::geometry::Rect as BoxRect;
use crate::ui::tree::{Element, ElementId, ElementTree, InputType, Role};
use ratatui::{
    style::Modifier,
    widgets::{Block, BorderType, Borders, Clear},
    Frame,
};
use std::collections::BTreeSet;

/// Rows of chrome around the value list: title, sort buttons, list caption,
/// hide button, and the two border lines
const FIXED_ROWS: f64 = 6.0;
const MAX_LIST_ROWS: usize = 12;

/// Label shown for the empty display string
pub const EMPTY_VALUE_LABEL: &str = "(empty)";

pub struct FilterPopover {
    shell: OverlayShell,
    column: String,
    config: FilterPopoverConfig,
    close_button: ElementId,
    sort_asc: ElementId,
    sort_desc: ElementId,
    hide_button: ElementId,
    values: Vec<(ElementId, String)>,
    anchor: Option<BoxRect>,
    sort: Option<SortState>,
    list_scroll: usize,
}

impl FilterPopover {
    /// Mount the popover for `column`. A value is checked when it is shown.
    pub fn open(
        tree: &mut ElementTree,
        parent: ElementId,
        column: &str,
        values: Vec<String>,
        hidden: &BTreeSet<String>,
        config: FilterPopoverConfig,
        on_close: impl FnMut() + 'static,
    ) -> Self {
        let container = tree.append(
            parent,
            Element::new(Role::Container).with_label(format!("filter {column}")),
        );
        let close_button = tree.append(container, Element::new(Role::Button).with_label("✕"));
        let sort_asc = tree.append(container, Element::new(Role::Button).with_label("▲ Asc"));
        let sort_desc = tree.append(container, Element::new(Role::Button).with_label("▼ Desc"));
        let values = values
            .into_iter()
            .map(|value| {
                let label = if value.is_empty() {
                    EMPTY_VALUE_LABEL.to_string()
                } else {
                    value.clone()
                };
                let checkbox = Element::new(Role::Input(InputType::Checkbox))
                    .with_label(label)
                    .with_value(value.clone())
                    .checked(!hidden.contains(&value));
                (tree.append(container, checkbox), value)
            })
            .collect();
        let hide_button = tree.append(container, Element::new(Role::Button).with_label("Hide column"));

        let shell = OverlayShell::open(tree, container, None, false, on_close);
        Self {
            shell,
            column: column.to_string(),
            config,
            close_button,
            sort_asc,
            sort_desc,
            hide_button,
            values,
            anchor: None,
            sort: None,
            list_scroll: 0,
        }
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn set_anchor(&mut self, anchor: Option<BoxRect>) {
        self.anchor = anchor;
    }

    pub fn set_sort(&mut self, sort: Option<SortState>) {
        self.sort = sort;
    }

    /// Reflect the engine's hidden set in the checkboxes
    pub fn sync_hidden(&self, tree: &mut ElementTree, hidden: &BTreeSet<String>) {
        for (id, value) in &self.values {
            if let Some(el) = tree.get_mut(*id) {
                el.checked = !hidden.contains(value);
            }
        }
    }

    pub fn value_of(&self, id: ElementId) -> Option<&str> {
        self.values
            .iter()
            .find(|(v, _)| *v == id)
            .map(|(_, value)| value.as_str())
    }

    fn layout(&mut self, tree: &mut ElementTree) -> Option<BoxRect> {
        let anchor = self.anchor?;
        let viewport = tree.viewport();
        let (left, top) = self.config.place(&anchor, viewport.width);
        let width = self.config.width;

        let room = (viewport.bottom() - top - FIXED_ROWS).floor().max(1.0) as usize;
        let list_rows = self.values.len().clamp(1, MAX_LIST_ROWS).min(room);
        let height = FIXED_ROWS + list_rows as f64;
        let outer = BoxRect::new(left, top, width, height);
        tree.set_rect(self.shell.container(), outer);

        let inner_left = left + 1.0;
        let inner_width = width - 2.0;
        tree.set_rect(self.close_button, BoxRect::new(left + width - 4.0, top + 1.0, 3.0, 1.0));
        tree.set_rect(self.sort_asc, BoxRect::new(inner_left + 1.0, top + 2.0, 8.0, 1.0));
        tree.set_rect(self.sort_desc, BoxRect::new(inner_left + 10.0, top + 2.0, 9.0, 1.0));

        // keep the focused value inside the visible window
        let focused = tree.active_element();
        if let Some(index) = self.values.iter().position(|(id, _)| Some(*id) == focused) {
            if index < self.list_scroll {
                self.list_scroll = index;
            } else if index >= self.list_scroll + list_rows {
                self.list_scroll = index + 1 - list_rows;
            }
        }
        self.list_scroll = self.list_scroll.min(self.values.len().saturating_sub(list_rows));

        let list_top = top + 4.0;
        for (i, (id, _)) in self.values.iter().enumerate() {
            let y = list_top + i as f64 - self.list_scroll as f64;
            tree.set_rect(*id, BoxRect::new(inner_left, y, inner_width, 1.0));
        }
        tree.set_rect(
            self.hide_button,
            BoxRect::new(inner_left + 1.0, list_top + list_rows as f64, 13.0, 1.0),
        );
        Some(outer)
    }
}

impl Overlay for FilterPopover {
    fn shell(&self) -> &OverlayShell {
        &self.shell
    }

    fn shell_mut(&mut self) -> &mut OverlayShell {
        &mut self.shell
    }

    fn activate(&mut self, _tree: &mut ElementTree, element: ElementId) -> OverlayCommand {
        if element == self.close_button {
            OverlayCommand::Close
        } else if element == self.sort_asc {
            OverlayCommand::Sort(SortDirection::Asc)
        } else if element == self.sort_desc {
            OverlayCommand::Sort(SortDirection::Desc)
        } else if element == self.hide_button {
            OverlayCommand::HideColumn
        } else if let Some(value) = self.value_of(element) {
            OverlayCommand::ToggleValue(value.to_string())
        } else {
            OverlayCommand::None
        }
    }

    fn render(&mut self, frame: &mut Frame, tree: &mut ElementTree, theme: &Theme) {
        let Some(outer) = self.layout(tree) else {
            return;
        };
        let clip = frame.area();
        let Some(area) = to_cells(&outer, clip) else {
            return;
        };
        frame.render_widget(Clear, area);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme.focused_border_style());
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let focused = tree.active_element();
        let style_of = |id: ElementId, base| {
            if focused == Some(id) {
                theme.focus_style()
            } else {
                base
            }
        };
        let buf = frame.buffer_mut();
        fill(buf, inner, theme.normal_style());

        let x = inner.x as i32;
        let top = outer.y as i32;
        put_str(
            buf,
            inner,
            x + 1,
            top + 1,
            label_of(&self.column),
            theme.header_style(),
        );
        if let Some(r) = tree.rect(self.close_button) {
            put_str(buf, inner, r.x as i32, r.y as i32, " ✕ ", style_of(self.close_button, theme.normal_style()));
        }

        let active_sort = self
            .sort
            .as_ref()
            .filter(|s| s.column == self.column)
            .map(|s| s.direction);
        for (id, text, dir) in [
            (self.sort_asc, "[▲ Asc]", SortDirection::Asc),
            (self.sort_desc, "[▼ Desc]", SortDirection::Desc),
        ] {
            let base = if active_sort == Some(dir) {
                theme.info_style().add_modifier(Modifier::BOLD)
            } else {
                theme.normal_style()
            };
            if let Some(r) = tree.rect(id) {
                put_str(buf, inner, r.x as i32, r.y as i32, text, style_of(id, base));
            }
        }
        put_str(buf, inner, x + 1, top + 3, "Values", theme.border_style());

        let list_top = top + 4;
        let list_bottom = tree.rect(self.hide_button).map(|r| r.y as i32).unwrap_or(list_top);
        for (id, _) in &self.values {
            let Some(el) = tree.get(*id) else {
                continue;
            };
            let y = el.rect.y as i32;
            if y < list_top || y >= list_bottom {
                continue;
            }
            let mark = if el.checked { "[x]" } else { "[ ]" };
            let text = fit(&format!("{mark} {}", el.label), inner.width.saturating_sub(1) as usize);
            put_str(buf, inner, x + 1, y, &text, style_of(*id, theme.normal_style()));
        }
        if let Some(r) = tree.rect(self.hide_button) {
            put_str(
                buf,
                inner,
                r.x as i32,
                r.y as i32,
                "[Hide column]",
                style_of(self.hide_button, theme.warning_style()),
            );
        }
    }
}
