pub mod chrome;
pub mod escape;
pub mod focus_trap;
pub mod geometry;
pub mod schedule;
pub mod tree;

pub use chrome::{TreeChrome, ViewportChrome};
pub use escape::EscapeBinding;
pub use focus_trap::{FocusTrap, FocusTrapOptions};
pub use geometry::Rect;
pub use schedule::{Debounce, FrameSlot};
pub use tree::{Element, ElementId, ElementTree, EventKind, EventTarget, InputType, Role, UiEvent};
