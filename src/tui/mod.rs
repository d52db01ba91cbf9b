pub mod action;
pub mod app;
pub mod component;
pub mod components;
pub mod draw;
pub mod keybindings;
pub mod screen;
pub mod theme;

pub use action::{Action, ActionCategory};
pub use app::{App, AppMessage, OverlayKind, StatusKind};
pub use component::Component;
pub use components::{DashboardTable, TopChrome};
pub use keybindings::{KeyBinding, KeyBindings, KeyPattern};
pub use screen::{ScreenBreakpoints, ScreenType};
pub use theme::{Theme, ThemeName};
