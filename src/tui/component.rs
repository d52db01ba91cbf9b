use crate::tui::action::Action;
use crate::ui::tree::ElementTree;
use color_eyre::Result;
use ratatui::{layout::Rect, Frame};
use std::time::Instant;

/// Base trait for the dashboard's page-level components
///
/// Components own elements of the shared [`ElementTree`]: rendering lays those
/// elements out (rectangles, scroll offsets) before painting, so the focus and
/// layout subsystems always see what is on screen.
pub trait Component {
    /// Handle an action
    ///
    /// Returns Ok(true) if the action was handled and consumed.
    /// Returns Ok(false) if the action was not handled and should propagate.
    fn handle_action(&mut self, tree: &mut ElementTree, action: Action) -> Result<bool>;

    /// Lay out the component's elements within `area` and paint them
    fn render(&mut self, frame: &mut Frame, area: Rect, tree: &mut ElementTree);

    /// Get list of actions this component supports
    fn supported_actions(&self) -> &[Action];

    /// Get component name for debugging/logging
    fn name(&self) -> &str;

    /// Advance timers (called on every tick)
    fn update(&mut self, _tree: &mut ElementTree, _now: Instant) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::geometry::Rect as BoxRect;
    use crate::ui::tree::{Element, ElementId, Role};

    struct MockComponent {
        name: String,
        actions: Vec<Action>,
        button: Option<ElementId>,
    }

    impl MockComponent {
        fn new(name: &str) -> Self {
            Self {
                name: name.to_string(),
                actions: vec![Action::MoveUp, Action::MoveDown],
                button: None,
            }
        }
    }

    impl Component for MockComponent {
        fn handle_action(&mut self, _tree: &mut ElementTree, action: Action) -> Result<bool> {
            Ok(self.supported_actions().contains(&action))
        }

        fn render(&mut self, _frame: &mut Frame, area: Rect, tree: &mut ElementTree) {
            let root = tree.root();
            let button = *self
                .button
                .get_or_insert_with(|| tree.append(root, Element::new(Role::Button)));
            tree.set_rect(button, area.into());
        }

        fn supported_actions(&self) -> &[Action] {
            &self.actions
        }

        fn name(&self) -> &str {
            &self.name
        }
    }

    #[test]
    fn test_component_action_handling() {
        let mut tree = ElementTree::new(BoxRect::new(0.0, 0.0, 10.0, 10.0));
        let mut comp = MockComponent::new("test");
        assert!(comp.handle_action(&mut tree, Action::MoveUp).unwrap());
        assert!(!comp.handle_action(&mut tree, Action::Quit).unwrap());
    }

    #[test]
    fn test_render_lays_out_elements() {
        let mut tree = ElementTree::new(BoxRect::new(0.0, 0.0, 10.0, 4.0));
        let mut comp = MockComponent::new("test_comp");
        let mut terminal = ratatui::Terminal::new(ratatui::backend::TestBackend::new(10, 4)).unwrap();
        terminal
            .draw(|f| comp.render(f, Rect::new(1, 1, 3, 1), &mut tree))
            .unwrap();

        let button = comp.button.unwrap();
        assert!(tree.is_focusable(button));
        assert_eq!(tree.hit_test(2.0, 1.0), Some(button));
        assert_eq!(comp.name(), "test_comp");
        assert_eq!(comp.supported_actions().len(), 2);
    }
}
