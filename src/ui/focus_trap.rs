//! Focus trap for overlays (modals, drawers, popovers).
//!
//! Activation remembers what had focus, moves focus into the container on the
//! next frame, and keeps Tab / Shift+Tab cycling inside the container until the
//! trap is deactivated, at which point focus goes back where it came from.

use crate::ui::schedule::FrameSlot;
use crate::ui::tree::{tab_direction, ElementId, ElementTree, EventKind, EventTarget, ListenerId, UiEvent};
use crossterm::event::KeyEvent;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FocusTrapOptions {
    pub enabled: bool,
    /// Return focus to the previously focused element on deactivation
    pub restore_focus: bool,
}

impl Default for FocusTrapOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            restore_focus: true,
        }
    }
}

#[derive(Debug)]
pub struct FocusTrap {
    container: ElementId,
    initial_focus: Option<ElementId>,
    options: FocusTrapOptions,
    previous: Option<ElementId>,
    listener: Option<ListenerId>,
    frame: FrameSlot,
}

impl FocusTrap {
    /// Activate a trap on `container`. Disabled options or a container that is
    /// not mounted yield an inert trap.
    pub fn activate(
        tree: &mut ElementTree,
        container: ElementId,
        initial_focus: Option<ElementId>,
        options: FocusTrapOptions,
    ) -> Self {
        let mut trap = Self {
            container,
            initial_focus,
            options,
            previous: None,
            listener: None,
            frame: FrameSlot::new(),
        };
        if !options.enabled || !tree.is_attached(container) {
            return trap;
        }
        trap.previous = tree.active_element();
        trap.frame.request();
        trap.listener = Some(tree.add_listener(
            EventTarget::Element(container),
            EventKind::KeyDown,
            false,
        ));
        debug!(
            "focus trap on {:?} (previous focus {:?})",
            container, trap.previous
        );
        trap
    }

    pub fn is_active(&self) -> bool {
        self.listener.is_some()
    }

    pub fn container(&self) -> ElementId {
        self.container
    }

    /// Run the deferred initial focus once the container has been laid out
    pub fn on_frame(&mut self, tree: &mut ElementTree) {
        if self.frame.take() {
            self.focus_initial(tree);
        }
    }

    fn focus_initial(&self, tree: &mut ElementTree) {
        if let Some(preferred) = self.initial_focus {
            let enabled = tree.get(preferred).is_some_and(|e| !e.disabled);
            if enabled && tree.focus(preferred) {
                return;
            }
        }
        if let Some(first) = tree.focusable_descendants(self.container).first().copied() {
            tree.focus(first);
            return;
        }
        tree.focus(self.container);
    }

    /// Handle an event if it reaches the container's key listener.
    ///
    /// Returns true when the default Tab navigation must be suppressed.
    pub fn handle_event(&mut self, tree: &mut ElementTree, event: &UiEvent) -> bool {
        let Some(listener) = self.listener else {
            return false;
        };
        match event {
            UiEvent::Key(key) if tree.delivers(listener, event) => self.handle_key(tree, key),
            _ => false,
        }
    }

    /// Apply the Tab policy regardless of where focus currently is
    pub fn handle_key(&mut self, tree: &mut ElementTree, key: &KeyEvent) -> bool {
        if !self.is_active() {
            return false;
        }
        let Some(shift) = tab_direction(key) else {
            return false;
        };
        if !tree.is_attached(self.container) {
            return false;
        }

        let focusables = tree.focusable_descendants(self.container);
        let (Some(&first), Some(&last)) = (focusables.first(), focusables.last()) else {
            tree.focus(self.container);
            return true;
        };

        let active = tree.active_element();
        let inside = active.is_some_and(|a| tree.contains(self.container, a));
        if !inside {
            tree.focus(first);
            return true;
        }
        if !shift && active == Some(last) {
            tree.focus(first);
            return true;
        }
        if shift && active == Some(first) {
            tree.focus(last);
            return true;
        }
        false
    }

    /// Release the listener and pending frame, then restore focus
    pub fn deactivate(&mut self, tree: &mut ElementTree) {
        self.frame.cancel();
        let Some(listener) = self.listener.take() else {
            return;
        };
        tree.remove_listener(listener);

        if !self.options.restore_focus {
            return;
        }
        if let Some(previous) = self.previous.take() {
            if tree.is_attached(previous) {
                tree.focus(previous);
                debug!("focus restored to {:?}", previous);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::geometry::Rect;
    use crate::ui::tree::{Element, Role};
    use crossterm::event::{KeyCode, KeyModifiers};

    fn tab() -> KeyEvent {
        KeyEvent::new(KeyCode::Tab, KeyModifiers::NONE)
    }

    fn shift_tab() -> KeyEvent {
        KeyEvent::new(KeyCode::BackTab, KeyModifiers::SHIFT)
    }

    fn button(label: &str) -> Element {
        Element::new(Role::Button)
            .with_label(label)
            .with_rect(Rect::new(0.0, 0.0, 4.0, 1.0))
    }

    struct Fixture {
        tree: ElementTree,
        opener: ElementId,
        dialog: ElementId,
        items: Vec<ElementId>,
    }

    fn fixture(count: usize) -> Fixture {
        let mut tree = ElementTree::new(Rect::new(0.0, 0.0, 80.0, 24.0));
        let root = tree.root();
        let opener = tree.append(root, button("open"));
        let dialog = tree.append(
            root,
            Element::new(Role::Container)
                .with_tab_index(-1)
                .with_rect(Rect::new(10.0, 5.0, 30.0, 10.0)),
        );
        let items = (0..count)
            .map(|i| tree.append(dialog, button(&format!("b{i}"))))
            .collect();
        tree.focus(opener);
        Fixture {
            tree,
            opener,
            dialog,
            items,
        }
    }

    #[test]
    fn test_initial_focus_is_deferred() {
        let mut f = fixture(2);
        let mut trap = FocusTrap::activate(&mut f.tree, f.dialog, None, FocusTrapOptions::default());
        assert_eq!(f.tree.active_element(), Some(f.opener));
        trap.on_frame(&mut f.tree);
        assert_eq!(f.tree.active_element(), Some(f.items[0]));
    }

    #[test]
    fn test_preferred_focus_unless_disabled() {
        let mut f = fixture(2);
        let mut trap =
            FocusTrap::activate(&mut f.tree, f.dialog, Some(f.items[1]), FocusTrapOptions::default());
        trap.on_frame(&mut f.tree);
        assert_eq!(f.tree.active_element(), Some(f.items[1]));

        let mut f = fixture(2);
        f.tree.get_mut(f.items[1]).unwrap().disabled = true;
        let mut trap =
            FocusTrap::activate(&mut f.tree, f.dialog, Some(f.items[1]), FocusTrapOptions::default());
        trap.on_frame(&mut f.tree);
        assert_eq!(f.tree.active_element(), Some(f.items[0]));
    }

    #[test]
    fn test_wrap_around() {
        let mut f = fixture(3);
        let mut trap = FocusTrap::activate(&mut f.tree, f.dialog, None, FocusTrapOptions::default());
        trap.on_frame(&mut f.tree);

        f.tree.focus(f.items[2]);
        assert!(trap.handle_event(&mut f.tree, &UiEvent::Key(tab())));
        assert_eq!(f.tree.active_element(), Some(f.items[0]));

        assert!(trap.handle_event(&mut f.tree, &UiEvent::Key(shift_tab())));
        assert_eq!(f.tree.active_element(), Some(f.items[2]));

        // middle of the ring: default navigation applies
        f.tree.focus(f.items[1]);
        assert!(!trap.handle_event(&mut f.tree, &UiEvent::Key(tab())));
    }

    #[test]
    fn test_empty_container_pins_focus() {
        let mut f = fixture(0);
        let mut trap = FocusTrap::activate(&mut f.tree, f.dialog, None, FocusTrapOptions::default());
        trap.on_frame(&mut f.tree);
        assert_eq!(f.tree.active_element(), Some(f.dialog));
        assert!(trap.handle_event(&mut f.tree, &UiEvent::Key(tab())));
        assert_eq!(f.tree.active_element(), Some(f.dialog));
    }

    #[test]
    fn test_focus_outside_is_pulled_in() {
        let mut f = fixture(2);
        let mut trap = FocusTrap::activate(&mut f.tree, f.dialog, None, FocusTrapOptions::default());
        f.tree.focus(f.opener);
        assert!(trap.handle_key(&mut f.tree, &tab()));
        assert_eq!(f.tree.active_element(), Some(f.items[0]));
    }

    #[test]
    fn test_restore_on_deactivate() {
        let mut f = fixture(2);
        let mut trap = FocusTrap::activate(&mut f.tree, f.dialog, None, FocusTrapOptions::default());
        trap.on_frame(&mut f.tree);
        assert_eq!(f.tree.listener_count(), 1);
        trap.deactivate(&mut f.tree);
        assert_eq!(f.tree.active_element(), Some(f.opener));
        assert_eq!(f.tree.listener_count(), 0);
    }

    #[test]
    fn test_restore_skipped_when_opener_detached() {
        let mut f = fixture(2);
        let mut trap = FocusTrap::activate(&mut f.tree, f.dialog, None, FocusTrapOptions::default());
        trap.on_frame(&mut f.tree);
        f.tree.detach(f.opener);
        trap.deactivate(&mut f.tree);
        assert_eq!(f.tree.active_element(), Some(f.items[0]));
    }

    #[test]
    fn test_disabled_trap_is_inert() {
        let mut f = fixture(2);
        let options = FocusTrapOptions {
            enabled: false,
            ..Default::default()
        };
        let mut trap = FocusTrap::activate(&mut f.tree, f.dialog, None, options);
        trap.on_frame(&mut f.tree);
        assert!(!trap.is_active());
        assert_eq!(f.tree.active_element(), Some(f.opener));
        assert_eq!(f.tree.listener_count(), 0);
    }

    #[test]
    fn test_deactivate_before_frame_cancels_initial_focus() {
        let mut f = fixture(2);
        let options = FocusTrapOptions {
            restore_focus: false,
            ..Default::default()
        };
        let mut trap = FocusTrap::activate(&mut f.tree, f.dialog, None, options);
        trap.deactivate(&mut f.tree);
        trap.on_frame(&mut f.tree);
        assert_eq!(f.tree.active_element(), Some(f.opener));
    }
}
