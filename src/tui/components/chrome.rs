//! Top navigation bar with the dashboard's global actions.
//!
//! The bar collapses to a single line once the page is scrolled. The height
//! change is not instant: it completes `transition_ms` later and is announced
//! with a `TransitionEnd` event on the bar, which is what the sticky header
//! and the filter popover listen for to pick up the new top offset.

use crate::tui::draw::{fill, put_str, text_width};
use crate::tui::screen::ScreenBreakpoints;
use crate::tui::{Action, Component, Theme};
use crate::ui::chrome::ViewportChrome;
use crate::ui::geometry::Rect as BoxRect;
use crate::ui::schedule::Debounce;
use crate::ui::tree::{Element, ElementId, ElementTree, Role, UiEvent};
use color_eyre::Result;
use ratatui::{layout::Rect, style::Modifier, Frame};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChromeConfig {
    pub expanded_height: u16,
    pub compact_height: u16,
    pub transition_ms: u64,
}

impl Default for ChromeConfig {
    fn default() -> Self {
        Self {
            expanded_height: 3,
            compact_height: 1,
            transition_ms: 180,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct ChromeButton {
    id: ElementId,
    action: Action,
    label: &'static str,
    short: &'static str,
}

pub struct TopChrome {
    config: ChromeConfig,
    breakpoints: ScreenBreakpoints,
    theme: Theme,
    element: ElementId,
    buttons: Vec<ChromeButton>,
    compact: bool,
    target_compact: bool,
    transition: Debounce,
    report_label: Option<String>,
}

impl TopChrome {
    /// Mount the bar and its buttons under `parent`
    pub fn mount(
        tree: &mut ElementTree,
        parent: ElementId,
        config: ChromeConfig,
        breakpoints: ScreenBreakpoints,
        theme: Theme,
    ) -> Self {
        let element = tree.append(parent, Element::new(Role::Container).with_label("chrome"));
        let specs = [
            (Action::OpenUpload, "Upload CSV", "Upload"),
            (Action::OpenColumnSelector, "+ Columns", "+Col"),
            (Action::Download, "Download CSV", "CSV"),
            (Action::DownloadSample, "Sample CSV", "Sample"),
        ];
        let buttons = specs
            .into_iter()
            .map(|(action, label, short)| {
                let role = if action == Action::Download {
                    Role::Link
                } else {
                    Role::Button
                };
                let id = tree.append(element, Element::new(role).with_label(label));
                ChromeButton {
                    id,
                    action,
                    label,
                    short,
                }
            })
            .collect();
        Self {
            config,
            breakpoints,
            theme,
            element,
            buttons,
            compact: false,
            target_compact: false,
            transition: Debounce::new(Duration::from_millis(config.transition_ms)),
            report_label: None,
        }
    }

    pub fn height(&self) -> u16 {
        if self.compact {
            self.config.compact_height
        } else {
            self.config.expanded_height
        }
    }

    pub fn is_compact(&self) -> bool {
        self.compact
    }

    /// Show the current report and point the download link at it
    pub fn set_report(&mut self, tree: &mut ElementTree, label: Option<String>, href: Option<String>) {
        self.report_label = label;
        if let Some(link) = self.button(Action::Download).and_then(|b| tree.get_mut(b.id)) {
            link.href = href;
        }
    }

    /// Start (or cancel) the collapse transition for the page scroll state
    pub fn set_page_scrolled(&mut self, scrolled: bool, now: Instant) {
        if scrolled == self.target_compact {
            return;
        }
        self.target_compact = scrolled;
        if self.target_compact == self.compact {
            self.transition.cancel();
        } else {
            self.transition.schedule(now);
        }
    }

    /// Finish a due transition. Returns the event the host must dispatch.
    pub fn on_tick(&mut self, now: Instant) -> Option<UiEvent> {
        if !self.transition.fire_due(now) {
            return None;
        }
        self.compact = self.target_compact;
        debug!("chrome transition finished, height {}", self.height());
        Some(UiEvent::TransitionEnd(self.element))
    }

    /// Action bound to a chrome button
    pub fn action_for(&self, id: ElementId) -> Option<Action> {
        self.buttons.iter().find(|b| b.id == id).map(|b| b.action)
    }

    fn button(&self, action: Action) -> Option<&ChromeButton> {
        self.buttons.iter().find(|b| b.action == action)
    }

    fn layout(&self, tree: &mut ElementTree, area: Rect) {
        tree.set_rect(self.element, area.into());

        let mobile = self.breakpoints.classify(area.width as f64).is_mobile();
        let y = area.y as f64 + (area.height / 2) as f64;
        let mut right = area.right() as f64 - 1.0;
        for button in self.buttons.iter().rev() {
            let available = tree.get(button.id).is_some_and(|e| e.role != Role::Link || e.href.is_some());
            if !available {
                tree.set_rect(button.id, BoxRect::default());
                continue;
            }
            let text = if mobile { button.short } else { button.label };
            let width = text_width(text) as f64 + 2.0;
            right -= width;
            tree.set_rect(button.id, BoxRect::new(right, y, width, 1.0));
            right -= 1.0;
        }
    }
}

impl ViewportChrome for TopChrome {
    fn element(&self) -> Option<ElementId> {
        Some(self.element)
    }
}

impl Component for TopChrome {
    fn handle_action(&mut self, _tree: &mut ElementTree, _action: Action) -> Result<bool> {
        Ok(false)
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, tree: &mut ElementTree) {
        let area = Rect::new(area.x, area.y, area.width, self.height().min(area.height));
        self.layout(tree, area);

        let style = self.theme.chrome_style();
        let buf = frame.buffer_mut();
        fill(buf, area, style);

        let mobile = self.breakpoints.classify(area.width as f64).is_mobile();
        let y = (area.y + area.height / 2) as i32;
        let title = match (&self.report_label, mobile) {
            (Some(report), false) => format!(" Riskboard · {report}"),
            _ => " Riskboard".to_string(),
        };
        put_str(buf, area, area.x as i32, y, &title, style.add_modifier(Modifier::BOLD));

        let focused = tree.active_element();
        for button in &self.buttons {
            let Some(rect) = tree.rect(button.id).filter(|r| !r.is_empty()) else {
                continue;
            };
            let text = if mobile { button.short } else { button.label };
            let button_style = if focused == Some(button.id) {
                self.theme.focus_style()
            } else {
                style.add_modifier(Modifier::REVERSED)
            };
            put_str(buf, area, rect.x as i32, rect.y as i32, &format!(" {text} "), button_style);
        }
    }

    fn supported_actions(&self) -> &[Action] {
        &[]
    }

    fn name(&self) -> &str {
        "TopChrome"
    }
}
