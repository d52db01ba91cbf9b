use crate::ui::geometry::Rect;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Size and spacing of the column filter popover
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterPopoverConfig {
    pub width: f64,
    /// Minimum distance kept from the viewport's left and right edges
    pub viewport_padding: f64,
    /// Vertical distance between the anchor cell and the popover
    pub gap: f64,
    pub settle_delay_ms: u64,
}

impl Default for FilterPopoverConfig {
    fn default() -> Self {
        Self {
            width: 260.0,
            viewport_padding: 8.0,
            gap: 6.0,
            settle_delay_ms: 240,
        }
    }
}

impl FilterPopoverConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    /// Top-left corner of the popover for an anchor cell. The popover sits under
    /// the anchor and is pulled back inside the viewport horizontally; when the
    /// viewport is narrower than the popover the left padding wins.
    pub fn place(&self, anchor: &Rect, viewport_width: f64) -> (f64, f64) {
        let top = anchor.bottom() + self.gap;
        let min_left = self.viewport_padding;
        let max_left = (viewport_width - self.width - self.viewport_padding).max(min_left);
        (anchor.left().clamp(min_left, max_left), top)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_place_under_anchor() {
        let config = FilterPopoverConfig::default();
        let anchor = Rect::new(100.0, 40.0, 80.0, 30.0);
        assert_eq!(config.place(&anchor, 1024.0), (100.0, 76.0));
    }

    #[test]
    fn test_place_clamps_to_viewport() {
        let config = FilterPopoverConfig::default();
        assert_eq!(config.place(&Rect::new(-50.0, 0.0, 80.0, 10.0), 1024.0).0, 8.0);
        assert_eq!(config.place(&Rect::new(900.0, 0.0, 80.0, 10.0), 1024.0).0, 756.0);
        // narrower than the popover: stick to the left padding
        assert_eq!(config.place(&Rect::new(100.0, 0.0, 80.0, 10.0), 200.0).0, 8.0);
    }
}
