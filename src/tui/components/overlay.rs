//! Shared shell of the dashboard overlays (popover, modals, drawer).
//!
//! A shell owns the overlay container in the element tree, a focus trap on
//! it and a window-level Escape binding. Closing goes through the host: the
//! Escape callback only posts a close request, and the host decides whether
//! the overlay may close right now.

use crate::core::policy::EvaluationPolicy;
use crate::core::types::SortDirection;
use crate::tui::{Action, Theme};
use crate::ui::escape::EscapeBinding;
use crate::ui::focus_trap::{FocusTrap, FocusTrapOptions};
use crate::ui::tree::{tab_direction, ElementId, ElementTree, UiEvent};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::Frame;
use std::path::PathBuf;
use tracing::debug;

/// What an overlay asks the host to do after an interaction
#[derive(Debug, Clone, PartialEq)]
pub enum OverlayCommand {
    None,
    Close,
    /// Filter popover: flip a value of the active column
    ToggleValue(String),
    Sort(SortDirection),
    HideColumn,
    /// Column selector: show or hide a column
    ToggleColumn(String),
    /// Upload modal: form passed validation
    Submit {
        file: PathBuf,
        policy: EvaluationPolicy,
    },
}

pub struct OverlayShell {
    container: ElementId,
    trap: FocusTrap,
    escape: EscapeBinding,
    modal: bool,
}

impl OverlayShell {
    /// Trap focus in `container` and bind Escape to `on_close`
    pub fn open(
        tree: &mut ElementTree,
        container: ElementId,
        initial_focus: Option<ElementId>,
        modal: bool,
        on_close: impl FnMut() + 'static,
    ) -> Self {
        let trap = FocusTrap::activate(tree, container, initial_focus, FocusTrapOptions::default());
        let escape = EscapeBinding::bind(tree, on_close);
        Self {
            container,
            trap,
            escape,
            modal,
        }
    }

    pub fn container(&self) -> ElementId {
        self.container
    }

    /// Modal overlays lock page scrolling and close on a backdrop click
    pub fn is_modal(&self) -> bool {
        self.modal
    }

    /// Whether (x, y) lies on the overlay's own box
    pub fn hit(&self, tree: &ElementTree, x: f64, y: f64) -> bool {
        tree.rect(self.container).is_some_and(|r| r.contains(x, y))
    }

    /// Escape and Tab handling. Returns whether the key was consumed.
    pub fn handle_key(&mut self, tree: &mut ElementTree, key: &KeyEvent) -> bool {
        let event = UiEvent::Key(*key);
        if self.escape.handle_event(tree, &event) {
            return true;
        }
        let Some(reverse) = tab_direction(key) else {
            return false;
        };
        let inside = tree
            .active_element()
            .is_some_and(|a| tree.contains(self.container, a));
        let trapped = if inside {
            self.trap.handle_event(tree, &event)
        } else {
            self.trap.handle_key(tree, key)
        };
        if !trapped {
            tree.advance_focus(reverse);
        }
        true
    }

    /// Move focus as Tab / Shift+Tab would
    pub fn cycle_focus(&mut self, tree: &mut ElementTree, reverse: bool) {
        let key = if reverse {
            KeyEvent::new(KeyCode::BackTab, KeyModifiers::SHIFT)
        } else {
            KeyEvent::new(KeyCode::Tab, KeyModifiers::NONE)
        };
        self.handle_key(tree, &key);
    }

    pub fn on_frame(&mut self, tree: &mut ElementTree) {
        self.trap.on_frame(tree);
    }

    /// Release the trap and the Escape listener, then drop the container
    pub fn close(&mut self, tree: &mut ElementTree) {
        self.escape.unbind(tree);
        self.trap.deactivate(tree);
        tree.remove(self.container);
        debug!("overlay {:?} closed", self.container);
    }
}

/// Behavior every overlay shares; the host drives these through the shell
pub trait Overlay {
    fn shell(&self) -> &OverlayShell;

    fn shell_mut(&mut self) -> &mut OverlayShell;

    /// Click or Enter/Space on one of the overlay's elements
    fn activate(&mut self, tree: &mut ElementTree, element: ElementId) -> OverlayCommand;

    /// Raw key input (text entry). `None` lets the key fall through to the
    /// key bindings.
    fn handle_input(&mut self, _tree: &mut ElementTree, _key: &KeyEvent) -> Option<OverlayCommand> {
        None
    }

    /// Bound action while the overlay is open
    fn handle_action(&mut self, tree: &mut ElementTree, action: Action) -> OverlayCommand {
        match action {
            Action::MoveDown | Action::MoveRight => {
                self.shell_mut().cycle_focus(tree, false);
                OverlayCommand::None
            }
            Action::MoveUp | Action::MoveLeft => {
                self.shell_mut().cycle_focus(tree, true);
                OverlayCommand::None
            }
            Action::Confirm | Action::OpenDetail => match tree.active_element() {
                Some(focused) if tree.contains(self.shell().container(), focused) => {
                    self.activate(tree, focused)
                }
                _ => OverlayCommand::None,
            },
            Action::Cancel => OverlayCommand::Close,
            _ => OverlayCommand::None,
        }
    }

    /// Closing is refused while work is in flight
    fn can_close(&self) -> bool {
        true
    }

    fn render(&mut self, frame: &mut Frame, tree: &mut ElementTree, theme: &Theme);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::geometry::Rect;
    use crate::ui::tree::{Element, Role};
    use std::cell::Cell;
    use std::rc::Rc;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn setup() -> (ElementTree, ElementId, ElementId, ElementId, ElementId) {
        let mut tree = ElementTree::new(Rect::new(0.0, 0.0, 80.0, 24.0));
        let root = tree.root();
        let page = tree.append(root, Element::new(Role::Button).with_rect(Rect::new(0.0, 0.0, 5.0, 1.0)));
        let container = tree.append(
            root,
            Element::new(Role::Container).with_rect(Rect::new(10.0, 5.0, 20.0, 6.0)),
        );
        let a = tree.append(container, Element::new(Role::Button).with_rect(Rect::new(11.0, 6.0, 4.0, 1.0)));
        let b = tree.append(container, Element::new(Role::Button).with_rect(Rect::new(11.0, 7.0, 4.0, 1.0)));
        (tree, page, container, a, b)
    }

    #[test]
    fn test_tab_stays_inside_and_escape_requests_close() {
        let (mut tree, page, container, a, b) = setup();
        tree.focus(page);
        let closed = Rc::new(Cell::new(0));
        let counter = closed.clone();
        let mut shell = OverlayShell::open(&mut tree, container, None, true, move || {
            counter.set(counter.get() + 1)
        });
        shell.on_frame(&mut tree);
        assert_eq!(tree.active_element(), Some(a));

        assert!(shell.handle_key(&mut tree, &key(KeyCode::Tab)));
        assert_eq!(tree.active_element(), Some(b));
        assert!(shell.handle_key(&mut tree, &key(KeyCode::Tab)));
        assert_eq!(tree.active_element(), Some(a));
        shell.cycle_focus(&mut tree, true);
        assert_eq!(tree.active_element(), Some(b));

        assert!(shell.handle_key(&mut tree, &key(KeyCode::Esc)));
        assert_eq!(closed.get(), 1);
        assert!(!shell.handle_key(&mut tree, &key(KeyCode::Char('x'))));

        assert!(shell.hit(&tree, 12.0, 6.0));
        assert!(!shell.hit(&tree, 2.0, 0.0));

        shell.close(&mut tree);
        assert!(!tree.exists(container));
        assert_eq!(tree.active_element(), Some(page));
        assert_eq!(tree.listener_count(), 0);
    }

    #[test]
    fn test_tab_from_outside_enters_the_overlay() {
        let (mut tree, page, container, a, _b) = setup();
        let mut shell = OverlayShell::open(&mut tree, container, None, false, || {});
        shell.on_frame(&mut tree);
        tree.focus(page);
        assert!(shell.handle_key(&mut tree, &key(KeyCode::Tab)));
        assert_eq!(tree.active_element(), Some(a));
        shell.close(&mut tree);
    }
}
