//! ElementTree: retained, headless model of everything on screen.
//!
//! The terminal renderer lays the tree out every frame (rectangles, scroll
//! offsets, visibility) and the interactive subsystems only ever talk to the
//! tree: they query bounding boxes, enumerate focusable descendants, move focus
//! and register event listeners. Nothing here touches the terminal, which keeps
//! the focus trap, the filter engine and the sticky header testable on a bare
//! tree.

use crate::ui::geometry::Rect;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::collections::HashMap;
use tracing::trace;

/// Stable handle of an element. Handles stay valid after the element is
/// detached so that callers can ask whether it is still attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputType {
    Text,
    Checkbox,
    File,
    Hidden,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Document,
    Container,
    Text,
    Button,
    Link,
    Input(InputType),
    Select,
    TextArea,
    Table,
    HeaderRow,
    HeaderCell,
    Body,
    Row,
    Cell,
}

/// A node of the tree with the attributes the core subsystems read
#[derive(Debug, Clone)]
pub struct Element {
    pub role: Role,
    pub label: String,
    /// Text value for inputs
    pub value: String,
    pub checked: bool,
    pub disabled: bool,
    pub tab_index: Option<i32>,
    /// Link target; links without one are not focusable
    pub href: Option<String>,
    pub content_editable: bool,
    pub display_none: bool,
    pub visibility_hidden: bool,
    pub aria_hidden: bool,
    /// Logical column this element belongs to (header cells)
    pub column: Option<String>,
    pub rect: Rect,
    pub scroll_left: f64,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
}

impl Element {
    pub fn new(role: Role) -> Self {
        Self {
            role,
            label: String::new(),
            value: String::new(),
            checked: false,
            disabled: false,
            tab_index: None,
            href: None,
            content_editable: false,
            display_none: false,
            visibility_hidden: false,
            aria_hidden: false,
            column: None,
            rect: Rect::default(),
            scroll_left: 0.0,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    pub fn with_tab_index(mut self, tab_index: i32) -> Self {
        self.tab_index = Some(tab_index);
        self
    }

    pub fn with_href(mut self, href: impl Into<String>) -> Self {
        self.href = Some(href.into());
        self
    }

    pub fn with_rect(mut self, rect: Rect) -> Self {
        self.rect = rect;
        self
    }

    pub fn checked(mut self, checked: bool) -> Self {
        self.checked = checked;
        self
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    pub fn parent(&self) -> Option<ElementId> {
        self.parent
    }

    pub fn children(&self) -> &[ElementId] {
        &self.children
    }

    /// Matches the interactive-element selector, ignoring visibility
    fn is_interactive(&self) -> bool {
        let native = match self.role {
            Role::Link => self.href.is_some(),
            Role::Button | Role::Select | Role::TextArea => !self.disabled,
            Role::Input(kind) => !self.disabled && kind != InputType::Hidden,
            _ => false,
        };
        native || self.tab_index.is_some_and(|t| t >= 0) || self.content_editable
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    KeyDown,
    Scroll,
    Resize,
    TransitionEnd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventTarget {
    Window,
    Element(ElementId),
}

/// Events the host feeds into the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiEvent {
    /// Targets the focused element, or the document when nothing has focus
    Key(KeyEvent),
    Scroll(EventTarget),
    Resize,
    TransitionEnd(ElementId),
}

impl UiEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            UiEvent::Key(_) => EventKind::KeyDown,
            UiEvent::Scroll(_) => EventKind::Scroll,
            UiEvent::Resize => EventKind::Resize,
            UiEvent::TransitionEnd(_) => EventKind::TransitionEnd,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Listener {
    id: ListenerId,
    target: EventTarget,
    kind: EventKind,
    capture: bool,
}

/// Tab direction of a key event, if it is a Tab press
pub fn tab_direction(key: &KeyEvent) -> Option<bool> {
    match key.code {
        KeyCode::Tab => Some(key.modifiers.contains(KeyModifiers::SHIFT)),
        KeyCode::BackTab => Some(true),
        _ => None,
    }
}

#[derive(Debug)]
pub struct ElementTree {
    nodes: HashMap<ElementId, Element>,
    root: ElementId,
    next_id: u64,
    active: Option<ElementId>,
    listeners: Vec<Listener>,
    next_listener: u64,
    viewport: Rect,
}

impl ElementTree {
    pub fn new(viewport: Rect) -> Self {
        let root = ElementId(0);
        let mut nodes = HashMap::new();
        nodes.insert(root, Element::new(Role::Document).with_rect(viewport));
        Self {
            nodes,
            root,
            next_id: 1,
            active: None,
            listeners: Vec::new(),
            next_listener: 1,
            viewport,
        }
    }

    pub fn root(&self) -> ElementId {
        self.root
    }

    pub fn viewport(&self) -> Rect {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Rect) {
        self.viewport = viewport;
        if let Some(root) = self.nodes.get_mut(&self.root) {
            root.rect = viewport;
        }
    }

    // ---- structure -------------------------------------------------------

    /// Create an element under `parent` (appended last)
    pub fn append(&mut self, parent: ElementId, mut element: Element) -> ElementId {
        let id = ElementId(self.next_id);
        self.next_id += 1;
        element.parent = Some(parent);
        element.children.clear();
        self.nodes.insert(id, element);
        if let Some(p) = self.nodes.get_mut(&parent) {
            p.children.push(id);
        }
        id
    }

    /// Unlink an element (and its subtree) from its parent. The handles stay
    /// valid; focus inside the subtree falls back to nothing.
    pub fn detach(&mut self, id: ElementId) {
        if id == self.root {
            return;
        }
        if let Some(active) = self.active {
            if self.contains(id, active) {
                self.active = None;
            }
        }
        let parent = self.nodes.get_mut(&id).and_then(|e| e.parent.take());
        if let Some(parent) = parent.and_then(|p| self.nodes.get_mut(&p)) {
            parent.children.retain(|c| *c != id);
        }
    }

    /// Detach and drop an element and its subtree
    pub fn remove(&mut self, id: ElementId) {
        if id == self.root {
            return;
        }
        self.detach(id);
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if let Some(el) = self.nodes.remove(&next) {
                stack.extend(el.children);
            }
        }
    }

    /// Drop every child of `id`
    pub fn clear_children(&mut self, id: ElementId) {
        let children = self
            .nodes
            .get(&id)
            .map(|e| e.children.clone())
            .unwrap_or_default();
        for child in children {
            self.remove(child);
        }
    }

    pub fn get(&self, id: ElementId) -> Option<&Element> {
        self.nodes.get(&id)
    }

    pub fn get_mut(&mut self, id: ElementId) -> Option<&mut Element> {
        self.nodes.get_mut(&id)
    }

    pub fn exists(&self, id: ElementId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Whether the element is connected to the document
    pub fn is_attached(&self, id: ElementId) -> bool {
        let mut current = Some(id);
        while let Some(cur) = current {
            if cur == self.root {
                return true;
            }
            current = self.nodes.get(&cur).and_then(|e| e.parent);
        }
        false
    }

    /// Inclusive ancestry test
    pub fn contains(&self, ancestor: ElementId, id: ElementId) -> bool {
        let mut current = Some(id);
        while let Some(cur) = current {
            if cur == ancestor {
                return true;
            }
            current = self.nodes.get(&cur).and_then(|e| e.parent);
        }
        false
    }

    /// Descendants of `id` in document order, excluding `id`
    pub fn descendants(&self, id: ElementId) -> Vec<ElementId> {
        let mut out = Vec::new();
        let mut stack: Vec<ElementId> = self
            .nodes
            .get(&id)
            .map(|e| e.children.iter().rev().copied().collect())
            .unwrap_or_default();
        while let Some(next) = stack.pop() {
            out.push(next);
            if let Some(el) = self.nodes.get(&next) {
                stack.extend(el.children.iter().rev().copied());
            }
        }
        out
    }

    /// First direct or nested descendant with the given role
    pub fn find_descendant(&self, id: ElementId, role: Role) -> Option<ElementId> {
        self.descendants(id)
            .into_iter()
            .find(|d| self.nodes.get(d).is_some_and(|e| e.role == role))
    }

    /// Header cell currently rendering `column`, if any. When both the real
    /// header and the fixed overlay header carry the column, the overlay wins:
    /// it is painted later and is the one the user sees.
    pub fn find_header_cell(&self, column: &str) -> Option<ElementId> {
        self.descendants(self.root).into_iter().rev().find(|id| {
            self.nodes.get(id).is_some_and(|e| {
                e.role == Role::HeaderCell && e.column.as_deref() == Some(column)
            })
        })
    }

    // ---- layout ----------------------------------------------------------

    /// Bounding box of an attached element
    pub fn rect(&self, id: ElementId) -> Option<Rect> {
        if !self.is_attached(id) {
            return None;
        }
        self.nodes.get(&id).map(|e| e.rect)
    }

    pub fn set_rect(&mut self, id: ElementId, rect: Rect) {
        if let Some(el) = self.nodes.get_mut(&id) {
            el.rect = rect;
        }
    }

    pub fn scroll_left(&self, id: ElementId) -> Option<f64> {
        if !self.is_attached(id) {
            return None;
        }
        self.nodes.get(&id).map(|e| e.scroll_left)
    }

    pub fn set_scroll_left(&mut self, id: ElementId, scroll_left: f64) {
        if let Some(el) = self.nodes.get_mut(&id) {
            el.scroll_left = scroll_left;
        }
    }

    /// Rendered with a layout box and not hidden by itself or an ancestor
    pub fn is_visible(&self, id: ElementId) -> bool {
        let Some(el) = self.nodes.get(&id) else {
            return false;
        };
        if el.rect.is_empty() || !self.is_attached(id) {
            return false;
        }
        let mut current = Some(id);
        while let Some(cur) = current {
            let Some(node) = self.nodes.get(&cur) else {
                return false;
            };
            if node.display_none || node.visibility_hidden {
                return false;
            }
            current = node.parent;
        }
        true
    }

    /// Deepest visible element under a point; later siblings paint on top
    pub fn hit_test(&self, x: f64, y: f64) -> Option<ElementId> {
        self.descendants(self.root)
            .into_iter()
            .filter(|id| self.is_visible(*id))
            .filter(|id| self.nodes.get(id).is_some_and(|e| e.rect.contains(x, y)))
            .last()
    }

    // ---- focus -----------------------------------------------------------

    pub fn active_element(&self) -> Option<ElementId> {
        self.active.filter(|id| self.is_attached(*id))
    }

    /// Programmatic focus; refuses detached or disabled elements
    pub fn focus(&mut self, id: ElementId) -> bool {
        if !self.is_attached(id) {
            return false;
        }
        if self.nodes.get(&id).is_some_and(|e| e.disabled) {
            return false;
        }
        self.active = Some(id);
        trace!("focus -> {:?}", id);
        true
    }

    pub fn blur(&mut self) {
        self.active = None;
    }

    pub fn is_focusable(&self, id: ElementId) -> bool {
        self.nodes
            .get(&id)
            .is_some_and(|e| e.is_interactive() && !e.aria_hidden)
            && self.is_visible(id)
    }

    /// Focusable, visible, non-hidden descendants of `container` in tree order
    pub fn focusable_descendants(&self, container: ElementId) -> Vec<ElementId> {
        self.descendants(container)
            .into_iter()
            .filter(|id| self.is_focusable(*id))
            .collect()
    }

    /// Default Tab navigation over the whole document, wrapping at the ends
    pub fn advance_focus(&mut self, reverse: bool) -> Option<ElementId> {
        let order = self.focusable_descendants(self.root);
        if order.is_empty() {
            return None;
        }
        let current = self
            .active_element()
            .and_then(|a| order.iter().position(|id| *id == a));
        let next = match (current, reverse) {
            (None, false) => 0,
            (None, true) => order.len() - 1,
            (Some(i), false) => (i + 1) % order.len(),
            (Some(i), true) => (i + order.len() - 1) % order.len(),
        };
        let id = order[next];
        self.focus(id);
        Some(id)
    }

    // ---- events ----------------------------------------------------------

    pub fn add_listener(&mut self, target: EventTarget, kind: EventKind, capture: bool) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push(Listener {
            id,
            target,
            kind,
            capture,
        });
        id
    }

    pub fn remove_listener(&mut self, id: ListenerId) {
        self.listeners.retain(|l| l.id != id);
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn has_listener(&self, id: ListenerId) -> bool {
        self.listeners.iter().any(|l| l.id == id)
    }

    /// Whether `event` reaches listener `id`.
    ///
    /// Key events bubble from the focused element to the window. Scroll does
    /// not bubble, so a window listener only sees nested scrolling in the
    /// capture phase. Transition ends bubble.
    pub fn delivers(&self, id: ListenerId, event: &UiEvent) -> bool {
        let Some(listener) = self.listeners.iter().find(|l| l.id == id) else {
            return false;
        };
        if listener.kind != event.kind() {
            return false;
        }
        match (listener.target, event) {
            (EventTarget::Window, UiEvent::Scroll(EventTarget::Element(el))) => {
                listener.capture && self.is_attached(*el)
            }
            (EventTarget::Window, _) => true,
            (EventTarget::Element(owner), UiEvent::Key(_)) => {
                let target = self.active_element().unwrap_or(self.root);
                self.is_attached(owner) && self.contains(owner, target)
            }
            (EventTarget::Element(owner), UiEvent::Scroll(EventTarget::Element(el))) => {
                if listener.capture {
                    self.is_attached(*el) && self.contains(owner, *el)
                } else {
                    owner == *el && self.is_attached(owner)
                }
            }
            (EventTarget::Element(owner), UiEvent::TransitionEnd(el)) => {
                self.is_attached(owner) && self.contains(owner, *el)
            }
            _ => false,
        }
    }
}
