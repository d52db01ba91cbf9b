use crate::ui::tree::{ElementTree, EventKind, EventTarget, ListenerId, UiEvent};
use crossterm::event::KeyCode;

/// Window-level Escape listener that calls a close callback.
///
/// The callback runs once per Escape press no matter which element has focus.
/// Replacing the callback re-binds the listener.
pub struct EscapeBinding {
    on_close: Box<dyn FnMut()>,
    listener: Option<ListenerId>,
}

impl std::fmt::Debug for EscapeBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EscapeBinding")
            .field("listener", &self.listener)
            .finish()
    }
}

impl EscapeBinding {
    pub fn bind(tree: &mut ElementTree, on_close: impl FnMut() + 'static) -> Self {
        let listener = tree.add_listener(EventTarget::Window, EventKind::KeyDown, false);
        Self {
            on_close: Box::new(on_close),
            listener: Some(listener),
        }
    }

    /// Swap the callback; the old listener is dropped and a fresh one bound
    pub fn rebind(&mut self, tree: &mut ElementTree, on_close: impl FnMut() + 'static) {
        if let Some(old) = self.listener.take() {
            tree.remove_listener(old);
        }
        self.on_close = Box::new(on_close);
        self.listener = Some(tree.add_listener(EventTarget::Window, EventKind::KeyDown, false));
    }

    pub fn is_bound(&self) -> bool {
        self.listener.is_some()
    }

    /// Invoke the callback for an Escape press. Returns whether it ran.
    pub fn handle_event(&mut self, tree: &ElementTree, event: &UiEvent) -> bool {
        let Some(listener) = self.listener else {
            return false;
        };
        match event {
            UiEvent::Key(key) if key.code == KeyCode::Esc && tree.delivers(listener, event) => {
                (self.on_close)();
                true
            }
            _ => false,
        }
    }

    pub fn unbind(&mut self, tree: &mut ElementTree) {
        if let Some(listener) = self.listener.take() {
            tree.remove_listener(listener);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::geometry::Rect;
    use crate::ui::tree::{Element, Role};
    use crossterm::event::{KeyEvent, KeyModifiers};
    use std::cell::Cell;
    use std::rc::Rc;

    fn esc() -> UiEvent {
        UiEvent::Key(KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE))
    }

    #[test]
    fn test_escape_calls_once_per_press_regardless_of_focus() {
        let mut tree = ElementTree::new(Rect::new(0.0, 0.0, 80.0, 24.0));
        let root = tree.root();
        let el = tree.append(root, Element::new(Role::Button).with_rect(Rect::new(0.0, 0.0, 3.0, 1.0)));
        let count = Rc::new(Cell::new(0));
        let c = count.clone();
        let mut binding = EscapeBinding::bind(&mut tree, move || c.set(c.get() + 1));

        assert!(binding.handle_event(&tree, &esc()));
        tree.focus(el);
        assert!(binding.handle_event(&tree, &esc()));
        assert_eq!(count.get(), 2);

        let enter = UiEvent::Key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE));
        assert!(!binding.handle_event(&tree, &enter));
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn test_rebind_and_unbind() {
        let mut tree = ElementTree::new(Rect::new(0.0, 0.0, 80.0, 24.0));
        let first = Rc::new(Cell::new(0));
        let second = Rc::new(Cell::new(0));
        let f = first.clone();
        let mut binding = EscapeBinding::bind(&mut tree, move || f.set(f.get() + 1));
        let s = second.clone();
        binding.rebind(&mut tree, move || s.set(s.get() + 1));
        assert_eq!(tree.listener_count(), 1);

        binding.handle_event(&tree, &esc());
        assert_eq!((first.get(), second.get()), (0, 1));

        binding.unbind(&mut tree);
        assert_eq!(tree.listener_count(), 0);
        assert!(!binding.handle_event(&tree, &esc()));
        assert_eq!(second.get(), 1);
    }
}
