use crate::ui::tree::{ElementId, ElementTree};

/// Page-level chrome the table subsystems depend on: the top navigation bar
/// whose height pushes the fixed header down, and the viewport it lives in.
pub trait ViewportChrome {
    /// The chrome element, if mounted. Its transition ends change the top offset.
    fn element(&self) -> Option<ElementId>;

    /// Live rendered height of the chrome
    fn height(&self, tree: &ElementTree) -> Option<f64> {
        self.element().and_then(|el| tree.rect(el)).map(|r| r.height)
    }

    fn viewport_width(&self, tree: &ElementTree) -> f64 {
        tree.viewport().width
    }
}

/// Chrome backed by an element of the tree
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TreeChrome {
    element: Option<ElementId>,
}

impl TreeChrome {
    pub fn new(element: Option<ElementId>) -> Self {
        Self { element }
    }
}

impl ViewportChrome for TreeChrome {
    fn element(&self) -> Option<ElementId> {
        self.element
    }
}
