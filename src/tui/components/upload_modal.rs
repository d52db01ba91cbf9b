//! Upload modal: CSV path plus the evaluation policy.
//!
//! Every field keeps the raw text the user typed; the policy is parsed and
//! validated on each render so errors show up while typing. Submitting hands
//! the parsed policy to the host, which runs the request and reports back
//! through [`UploadModal::fail`] or by closing the modal.

use crate::core::policy::{PolicyField, PolicyForm, ValidationReport};
use crate::tui::components::overlay::{Overlay, OverlayCommand, OverlayShell};
use crate::tui::draw::{centered_rect, fill, fit, put_str, to_box};
use crate::tui::Theme;
use crate::ui::geometry::Rect as BoxRect;
use crate::ui::tree::{Element, ElementId, ElementTree, InputType, Role};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::Rect,
    style::Modifier,
    widgets::{Block, BorderType, Borders, Clear},
    Frame,
};
use std::path::PathBuf;
use strum::IntoEnumIterator;
use tracing::debug;

const MAX_WIDTH: u16 = 72;
const LABEL_WIDTH: u16 = 24;

pub struct UploadModal {
    shell: OverlayShell,
    close_button: ElementId,
    file_input: ElementId,
    fields: Vec<(ElementId, PolicyField)>,
    submit_button: ElementId,
    cancel_button: ElementId,
    file_path: String,
    form: PolicyForm,
    submitting: bool,
    submit_error: Option<String>,
}

impl UploadModal {
    /// Mount the modal; `file_path` pre-fills the path input
    pub fn open(
        tree: &mut ElementTree,
        parent: ElementId,
        file_path: Option<String>,
        on_close: impl FnMut() + 'static,
    ) -> Self {
        let container = tree.append(
            parent,
            Element::new(Role::Container).with_label("upload").with_tab_index(-1),
        );
        let close_button = tree.append(container, Element::new(Role::Button).with_label("Close"));
        let file_path = file_path.unwrap_or_default();
        let file_input = tree.append(
            container,
            Element::new(Role::Input(InputType::File))
                .with_label("CSV file")
                .with_value(file_path.clone()),
        );
        let form = PolicyForm::default();
        let fields = PolicyField::iter()
            .map(|field| {
                let input = Element::new(Role::Input(InputType::Text))
                    .with_label(field.to_string())
                    .with_value(form.get(field));
                (tree.append(container, input), field)
            })
            .collect();
        let submit_button = tree.append(container, Element::new(Role::Button).with_label("Upload"));
        let cancel_button = tree.append(container, Element::new(Role::Button).with_label("Cancel"));

        let shell = OverlayShell::open(tree, container, Some(file_input), true, on_close);
        let mut modal = Self {
            shell,
            close_button,
            file_input,
            fields,
            submit_button,
            cancel_button,
            file_path,
            form,
            submitting: false,
            submit_error: None,
        };
        modal.sync_elements(tree);
        modal
    }

    pub fn form(&self) -> &PolicyForm {
        &self.form
    }

    pub fn file_path(&self) -> &str {
        &self.file_path
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn submit_error(&self) -> Option<&str> {
        self.submit_error.as_deref()
    }

    pub fn validation(&self) -> ValidationReport {
        self.form.validate()
    }

    /// A file is chosen, the policy is valid and nothing is in flight
    pub fn can_submit(&self) -> bool {
        !self.file_path.trim().is_empty() && self.validation().is_ok() && !self.submitting
    }

    /// Request failed: show the message and unlock the form
    pub fn fail(&mut self, tree: &mut ElementTree, message: impl Into<String>) {
        self.submit_error = Some(message.into());
        self.submitting = false;
        self.sync_elements(tree);
    }

    fn submit(&mut self, tree: &mut ElementTree) -> OverlayCommand {
        if !self.can_submit() {
            return OverlayCommand::None;
        }
        let Some(policy) = self.form.to_policy() else {
            return OverlayCommand::None;
        };
        self.submit_error = None;
        self.submitting = true;
        self.sync_elements(tree);
        let file = PathBuf::from(self.file_path.trim());
        debug!("submitting {}", file.display());
        OverlayCommand::Submit { file, policy }
    }

    fn edit(&mut self, tree: &mut ElementTree, target: ElementId, edit: impl FnOnce(&mut String)) -> bool {
        if target == self.file_input {
            edit(&mut self.file_path);
        } else if let Some((_, field)) = self.fields.iter().find(|(id, _)| *id == target) {
            let mut value = self.form.get(*field).to_string();
            edit(&mut value);
            self.form.set(*field, value);
        } else {
            return false;
        }
        self.sync_elements(tree);
        true
    }

    /// Push values and the disabled state into the tree
    fn sync_elements(&self, tree: &mut ElementTree) {
        if let Some(el) = tree.get_mut(self.file_input) {
            el.value = self.file_path.clone();
            el.disabled = self.submitting;
        }
        for (id, field) in &self.fields {
            if let Some(el) = tree.get_mut(*id) {
                el.value = self.form.get(*field).to_string();
                el.disabled = self.submitting;
            }
        }
        let can_submit = self.can_submit();
        if let Some(el) = tree.get_mut(self.submit_button) {
            el.disabled = !can_submit;
        }
    }

    fn layout(&self, tree: &mut ElementTree, screen: Rect, report: &ValidationReport) -> Rect {
        let width = MAX_WIDTH.min(screen.width * 92 / 100).max(20);
        let error_lines = if report.is_ok() { 0 } else { report.errors.len() as u16 + 1 };
        let submit_lines = if self.submit_error.is_some() { 2 } else { 0 };
        // title, file, four field rows, buttons, spacing and borders
        let height = 13 + error_lines + submit_lines;
        let area = centered_rect(screen, width, height);
        tree.set_rect(self.shell.container(), to_box(area));

        let x = area.x as f64 + 2.0;
        let inner_width = width as f64 - 4.0;
        let top = area.y as f64;
        tree.set_rect(self.close_button, BoxRect::new(area.right() as f64 - 6.0, top + 1.0, 3.0, 1.0));
        tree.set_rect(
            self.file_input,
            BoxRect::new(x + LABEL_WIDTH as f64, top + 3.0, inner_width - LABEL_WIDTH as f64, 1.0),
        );

        let column_width = inner_width / 2.0;
        let input_width = (column_width - 15.0).max(4.0);
        for (i, (id, _)) in self.fields.iter().enumerate() {
            let row = (i / 2) as f64;
            let col = (i % 2) as f64;
            let input_x = x + col * column_width + 14.0;
            tree.set_rect(*id, BoxRect::new(input_x, top + 5.0 + row, input_width - 1.0, 1.0));
        }

        let buttons_y = area.bottom() as f64 - 2.0;
        tree.set_rect(self.submit_button, BoxRect::new(x, buttons_y, 12.0, 1.0));
        tree.set_rect(self.cancel_button, BoxRect::new(x + 13.0, buttons_y, 10.0, 1.0));
        area
    }

    fn is_text_input(&self, id: ElementId) -> bool {
        id == self.file_input || self.fields.iter().any(|(f, _)| *f == id)
    }
}

/// Short label used in the two-column field grid
fn short_label(field: PolicyField) -> &'static str {
    match field {
        PolicyField::Threshold => "Threshold",
        PolicyField::TotalClasses => "Classes",
        PolicyField::MidtermMax => "Midterm max",
        PolicyField::MidtermWeight => "Midterm %",
        PolicyField::FinalMax => "Final max",
        PolicyField::FinalWeight => "Final %",
        PolicyField::PerformanceMax => "Perf. max",
        PolicyField::PerformanceWeight => "Perf. %",
    }
}

impl Overlay for UploadModal {
    fn shell(&self) -> &OverlayShell {
        &self.shell
    }

    fn shell_mut(&mut self) -> &mut OverlayShell {
        &mut self.shell
    }

    fn activate(&mut self, tree: &mut ElementTree, element: ElementId) -> OverlayCommand {
        if element == self.close_button || element == self.cancel_button {
            OverlayCommand::Close
        } else if element == self.submit_button || self.is_text_input(element) {
            self.submit(tree)
        } else {
            OverlayCommand::None
        }
    }

    fn handle_input(&mut self, tree: &mut ElementTree, key: &KeyEvent) -> Option<OverlayCommand> {
        let focused = tree.active_element()?;
        if !self.is_text_input(focused) || self.submitting {
            return None;
        }
        if key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) {
            return None;
        }
        match key.code {
            KeyCode::Char(c) => {
                self.edit(tree, focused, |value| value.push(c));
                Some(OverlayCommand::None)
            }
            KeyCode::Backspace => {
                self.edit(tree, focused, |value| {
                    value.pop();
                });
                Some(OverlayCommand::None)
            }
            KeyCode::Enter => Some(self.submit(tree)),
            _ => None,
        }
    }

    fn can_close(&self) -> bool {
        !self.submitting
    }

    fn render(&mut self, frame: &mut Frame, tree: &mut ElementTree, theme: &Theme) {
        self.sync_elements(tree);
        let report = self.validation();

        let screen = frame.area();
        frame
            .buffer_mut()
            .set_style(screen, theme.backdrop_style().add_modifier(Modifier::DIM));
        let area = self.layout(tree, screen, &report);
        frame.render_widget(Clear, area);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Double)
            .border_style(theme.focused_border_style());
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let focused = tree.active_element();
        let style_for = |id: ElementId, base| {
            if focused == Some(id) {
                theme.focus_style()
            } else {
                base
            }
        };
        let buf = frame.buffer_mut();
        fill(buf, inner, theme.normal_style());

        let x = area.x as i32 + 2;
        let top = area.y as i32;
        let title = if self.submitting {
            "Upload file · uploading…"
        } else {
            "Upload file"
        };
        put_str(buf, inner, x, top + 1, title, theme.header_style());
        if let Some(r) = tree.rect(self.close_button) {
            put_str(buf, inner, r.x as i32, r.y as i32, " ✕ ", style_for(self.close_button, theme.normal_style()));
        }

        put_str(buf, inner, x, top + 3, "CSV file path", theme.normal_style());
        if let Some(el) = tree.get(self.file_input) {
            let text = if el.value.is_empty() && focused != Some(self.file_input) {
                "(type a path to a .csv file)".to_string()
            } else {
                el.value.clone()
            };
            render_input(buf, inner, &el.rect, &text, focused == Some(self.file_input), false, theme);
        }

        for (id, field) in &self.fields {
            let Some(el) = tree.get(*id) else {
                continue;
            };
            let invalid = report.has_error(*field);
            let label_style = if invalid {
                theme.error_style()
            } else {
                theme.normal_style()
            };
            put_str(buf, inner, el.rect.x as i32 - 14, el.rect.y as i32, short_label(*field), label_style);
            render_input(buf, inner, &el.rect, &el.value, focused == Some(*id), invalid, theme);
        }

        let mut y = top + 10;
        if !report.is_ok() {
            put_str(buf, inner, x, y, "Input errors", theme.error_style().add_modifier(Modifier::BOLD));
            for error in &report.errors {
                y += 1;
                put_str(buf, inner, x + 1, y, &format!("• {error}"), theme.error_style());
            }
            y += 1;
        }
        if let Some(message) = &self.submit_error {
            put_str(buf, inner, x, y, "Upload failed", theme.error_style().add_modifier(Modifier::BOLD));
            put_str(buf, inner, x + 1, y + 1, message, theme.error_style());
        }

        let submit_text = if self.submitting { "[Uploading]" } else { "[ Upload ]" };
        let submit_base = if self.can_submit() {
            theme.success_style().add_modifier(Modifier::BOLD)
        } else {
            theme.border_style()
        };
        if let Some(r) = tree.rect(self.submit_button) {
            put_str(buf, inner, r.x as i32, r.y as i32, submit_text, style_for(self.submit_button, submit_base));
        }
        if let Some(r) = tree.rect(self.cancel_button) {
            put_str(buf, inner, r.x as i32, r.y as i32, "[ Cancel ]", style_for(self.cancel_button, theme.normal_style()));
        }
    }
}

fn render_input(
    buf: &mut ratatui::buffer::Buffer,
    clip: Rect,
    rect: &BoxRect,
    value: &str,
    focused: bool,
    invalid: bool,
    theme: &Theme,
) {
    let width = rect.width.max(1.0) as usize;
    let style = if focused {
        theme.selected_style()
    } else if invalid {
        theme.error_style().add_modifier(Modifier::UNDERLINED)
    } else {
        theme.normal_style().add_modifier(Modifier::UNDERLINED)
    };
    // keep the end of long values (and the cursor) in view
    let shown: String = if focused {
        let chars: Vec<char> = value.chars().collect();
        let keep = width.saturating_sub(1);
        let start = chars.len().saturating_sub(keep);
        let mut tail: String = chars[start..].iter().collect();
        tail.push('▏');
        tail
    } else {
        value.to_string()
    };
    put_str(buf, clip, rect.x as i32, rect.y as i32, &fit(&shown, width), style);
}
