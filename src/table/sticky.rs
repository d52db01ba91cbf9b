//! Fixed overlay header for long tables.
//!
//! Once the real header row scrolls above the top chrome while body rows are
//! still visible beneath it, a copy of the header is drawn pinned under the
//! chrome. [`StickyHeader`] decides when that happens and measures everything
//! the renderer needs to make the copy line up with the real columns.

use crate::ui::chrome::ViewportChrome;
use crate::ui::geometry::nearly_equal;
use crate::ui::schedule::FrameSlot;
use crate::ui::tree::{ElementId, ElementTree, EventKind, EventTarget, ListenerId, Role, UiEvent};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StickyHeaderConfig {
    /// Viewports at most this wide use the mobile fallback offset
    pub mobile_breakpoint: f64,
    pub mobile_top_offset: f64,
    pub desktop_top_offset: f64,
    /// Measurements closer than this to the previous ones are ignored
    pub tolerance: f64,
}

impl Default for StickyHeaderConfig {
    fn default() -> Self {
        Self {
            mobile_breakpoint: 768.0,
            mobile_top_offset: 40.0,
            desktop_top_offset: 60.0,
            tolerance: 0.5,
        }
    }
}

impl StickyHeaderConfig {
    /// Offset used when there is no chrome to measure
    pub fn fallback_top_offset(&self, viewport_width: f64) -> f64 {
        if viewport_width <= self.mobile_breakpoint {
            self.mobile_top_offset
        } else {
            self.desktop_top_offset
        }
    }
}

/// The elements of one rendered table the synchronizer measures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableParts {
    /// Horizontally scrolling wrapper around the table
    pub scroll_container: ElementId,
    pub table: ElementId,
    pub header_row: ElementId,
    pub body: ElementId,
}

/// Geometry of the overlay header
#[derive(Debug, Clone, PartialEq)]
pub struct FixedHeader {
    pub top: f64,
    pub left: f64,
    pub viewport_width: f64,
    pub table_width: f64,
    pub col_widths: Vec<f64>,
}

impl FixedHeader {
    fn nearly_equals(&self, other: &FixedHeader, tolerance: f64) -> bool {
        nearly_equal(self.top, other.top, tolerance)
            && nearly_equal(self.left, other.left, tolerance)
            && nearly_equal(self.viewport_width, other.viewport_width, tolerance)
            && nearly_equal(self.table_width, other.table_width, tolerance)
            && self.col_widths.len() == other.col_widths.len()
            && self
                .col_widths
                .iter()
                .zip(&other.col_widths)
                .all(|(a, b)| nearly_equal(*a, *b, tolerance))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StickyState {
    Inactive,
    Fixed,
}

/// Whether the header must be pinned: the table has reached the chrome and
/// more than one header height of body is still below it
pub fn should_fix(table_top: f64, body_bottom: f64, top_offset: f64, header_height: f64) -> bool {
    table_top <= top_offset && body_bottom > top_offset + header_height
}

/// Measure the overlay geometry, or None when the header should not be pinned
/// or part of the table is not mounted
pub fn measure(
    tree: &ElementTree,
    chrome: &dyn ViewportChrome,
    parts: &TableParts,
    config: &StickyHeaderConfig,
) -> Option<FixedHeader> {
    let scroll = tree.rect(parts.scroll_container)?;
    let table = tree.rect(parts.table)?;
    let body = tree.rect(parts.body)?;
    let head = tree.rect(parts.header_row)?;

    let top_offset = chrome
        .height(tree)
        .map(f64::round)
        .unwrap_or_else(|| config.fallback_top_offset(chrome.viewport_width(tree)));

    if !should_fix(table.top(), body.bottom(), top_offset, head.height) {
        return None;
    }

    let col_widths = tree
        .get(parts.header_row)?
        .children()
        .iter()
        .filter(|id| tree.get(**id).is_some_and(|e| e.role == Role::HeaderCell))
        .filter_map(|id| tree.rect(*id))
        .map(|r| r.width)
        .collect();

    Some(FixedHeader {
        top: top_offset,
        left: scroll.left(),
        viewport_width: scroll.width,
        table_width: table.width,
        col_widths,
    })
}

#[derive(Debug)]
pub struct StickyHeader {
    parts: TableParts,
    config: StickyHeaderConfig,
    listeners: Vec<ListenerId>,
    frame: FrameSlot,
    fixed: Option<FixedHeader>,
    overlay_offset: f64,
}

impl StickyHeader {
    /// Start observing `parts`. The first measurement runs on the next frame.
    pub fn attach(
        tree: &mut ElementTree,
        chrome: &dyn ViewportChrome,
        parts: TableParts,
        config: StickyHeaderConfig,
    ) -> Self {
        let mut listeners = vec![
            tree.add_listener(EventTarget::Window, EventKind::Scroll, true),
            tree.add_listener(EventTarget::Window, EventKind::Resize, false),
            tree.add_listener(
                EventTarget::Element(parts.scroll_container),
                EventKind::Scroll,
                false,
            ),
        ];
        if let Some(el) = chrome.element() {
            listeners.push(tree.add_listener(EventTarget::Element(el), EventKind::TransitionEnd, false));
        }
        let mut frame = FrameSlot::new();
        frame.request();
        Self {
            parts,
            config,
            listeners,
            frame,
            fixed: None,
            overlay_offset: 0.0,
        }
    }

    pub fn parts(&self) -> &TableParts {
        &self.parts
    }

    pub fn state(&self) -> StickyState {
        if self.fixed.is_some() {
            StickyState::Fixed
        } else {
            StickyState::Inactive
        }
    }

    pub fn fixed_header(&self) -> Option<&FixedHeader> {
        self.fixed.as_ref()
    }

    /// Horizontal shift for the overlay content; cancels the container scroll
    pub fn overlay_offset(&self) -> f64 {
        self.overlay_offset
    }

    pub fn has_pending_frame(&self) -> bool {
        self.frame.is_pending()
    }

    /// Schedule a remeasure, e.g. after the visible columns or row count changed
    pub fn invalidate(&mut self) {
        self.frame.request();
    }

    /// Coalesce a layout event into the next frame. Returns whether it applied.
    pub fn handle_event(&mut self, tree: &ElementTree, event: &UiEvent) -> bool {
        if !self.listeners.iter().any(|l| tree.delivers(*l, event)) {
            return false;
        }
        if matches!(event, UiEvent::Scroll(EventTarget::Element(el)) if *el == self.parts.scroll_container)
            && self.fixed.is_some()
        {
            self.sync_offset(tree);
        }
        self.frame.request();
        true
    }

    /// Run the pending measurement. Returns whether the emitted geometry changed.
    pub fn on_frame(&mut self, tree: &ElementTree, chrome: &dyn ViewportChrome) -> bool {
        if !self.frame.take() {
            return false;
        }
        self.recompute(tree, chrome)
    }

    fn recompute(&mut self, tree: &ElementTree, chrome: &dyn ViewportChrome) -> bool {
        let Some(next) = measure(tree, chrome, &self.parts, &self.config) else {
            if self.fixed.take().is_some() {
                debug!("sticky header released");
                return true;
            }
            return false;
        };

        self.sync_offset(tree);
        match &self.fixed {
            Some(prev) if prev.nearly_equals(&next, self.config.tolerance) => {
                trace!("sticky header unchanged");
                false
            }
            prev => {
                if prev.is_none() {
                    debug!("sticky header fixed at top {}", next.top);
                }
                self.fixed = Some(next);
                true
            }
        }
    }

    fn sync_offset(&mut self, tree: &ElementTree) {
        if let Some(scroll_left) = tree.scroll_left(self.parts.scroll_container) {
            self.overlay_offset = -scroll_left;
        }
    }

    /// Release every listener and the pending frame
    pub fn detach(&mut self, tree: &mut ElementTree) {
        self.frame.cancel();
        for listener in self.listeners.drain(..) {
            tree.remove_listener(listener);
        }
        self.fixed = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::chrome::TreeChrome;
    use crate::ui::geometry::Rect;
    use crate::ui::tree::Element;
    use pretty_assertions::assert_eq;

    struct Fixture {
        tree: ElementTree,
        chrome: TreeChrome,
        parts: TableParts,
        cells: Vec<ElementId>,
    }

    /// Chrome 60 high; table starting at `table_y` with a 20 high header and
    /// a body `body_height` tall
    fn fixture(table_y: f64, body_height: f64) -> Fixture {
        let mut tree = ElementTree::new(Rect::new(0.0, 0.0, 1024.0, 800.0));
        let root = tree.root();
        let nav = tree.append(root, Element::new(Role::Container).with_rect(Rect::new(0.0, 0.0, 1024.0, 60.0)));
        let scroll_container = tree.append(
            root,
            Element::new(Role::Container).with_rect(Rect::new(16.0, table_y, 900.0, 20.0 + body_height)),
        );
        let table = tree.append(
            scroll_container,
            Element::new(Role::Table).with_rect(Rect::new(16.0, table_y, 1200.0, 20.0 + body_height)),
        );
        let header_row = tree.append(
            table,
            Element::new(Role::HeaderRow).with_rect(Rect::new(16.0, table_y, 1200.0, 20.0)),
        );
        let cells = [500.0, 300.0, 400.0]
            .iter()
            .scan(16.0, |x, w| {
                let rect = Rect::new(*x, table_y, *w, 20.0);
                *x += w;
                Some(rect)
            })
            .enumerate()
            .map(|(i, rect)| {
                tree.append(
                    header_row,
                    Element::new(Role::HeaderCell)
                        .with_column(format!("c{i}"))
                        .with_rect(rect),
                )
            })
            .collect();
        let body = tree.append(
            table,
            Element::new(Role::Body).with_rect(Rect::new(16.0, table_y + 20.0, 1200.0, body_height)),
        );
        Fixture {
            tree,
            chrome: TreeChrome::new(Some(nav)),
            parts: TableParts {
                scroll_container,
                table,
                header_row,
                body,
            },
            cells,
        }
    }

    #[test]
    fn test_tie_break_boundary() {
        // table top at the offset, body bottom exactly at offset + header height
        let f = fixture(60.0, 0.0);
        let config = StickyHeaderConfig::default();
        assert_eq!(measure(&f.tree, &f.chrome, &f.parts, &config), None);
        assert!(!should_fix(60.0, 80.0, 60.0, 20.0));
        assert!(should_fix(60.0, 80.01, 60.0, 20.0));

        let f = fixture(60.0, 0.5);
        assert!(measure(&f.tree, &f.chrome, &f.parts, &config).is_some());
    }

    #[test]
    fn test_geometry_mirrors_live_header() {
        let f = fixture(-100.0, 600.0);
        let fixed = measure(&f.tree, &f.chrome, &f.parts, &StickyHeaderConfig::default()).unwrap();
        assert_eq!(
            fixed,
            FixedHeader {
                top: 60.0,
                left: 16.0,
                viewport_width: 900.0,
                table_width: 1200.0,
                col_widths: vec![500.0, 300.0, 400.0],
            }
        );
    }

    #[test]
    fn test_fallback_offset_by_breakpoint() {
        let mut f = fixture(-100.0, 600.0);
        let headless = TreeChrome::new(None);
        let config = StickyHeaderConfig::default();
        let fixed = measure(&f.tree, &headless, &f.parts, &config).unwrap();
        assert_eq!(fixed.top, 60.0);

        f.tree.set_viewport(Rect::new(0.0, 0.0, 768.0, 800.0));
        let fixed = measure(&f.tree, &headless, &f.parts, &config).unwrap();
        assert_eq!(fixed.top, 40.0);
    }

    #[test]
    fn test_state_machine_and_tolerance() {
        let mut f = fixture(100.0, 600.0);
        let mut sticky =
            StickyHeader::attach(&mut f.tree, &f.chrome, f.parts, StickyHeaderConfig::default());
        assert!(!sticky.on_frame(&f.tree, &f.chrome));
        assert_eq!(sticky.state(), StickyState::Inactive);

        // page scrolls the table under the chrome
        for id in [f.parts.scroll_container, f.parts.table, f.parts.header_row] {
            let r = f.tree.rect(id).unwrap();
            f.tree.set_rect(id, r.offset(0.0, -200.0));
        }
        let body = f.tree.rect(f.parts.body).unwrap();
        f.tree.set_rect(f.parts.body, body.offset(0.0, -200.0));
        assert!(sticky.handle_event(&f.tree, &UiEvent::Scroll(EventTarget::Window)));
        assert!(sticky.on_frame(&f.tree, &f.chrome));
        assert_eq!(sticky.state(), StickyState::Fixed);

        // sub-tolerance jitter keeps the previous geometry
        let cell = f.tree.rect(f.cells[0]).unwrap();
        f.tree.set_rect(f.cells[0], Rect { width: cell.width + 0.3, ..cell });
        sticky.invalidate();
        assert!(!sticky.on_frame(&f.tree, &f.chrome));
        assert_eq!(sticky.fixed_header().unwrap().col_widths[0], 500.0);

        // unmounting the body releases the overlay
        f.tree.detach(f.parts.body);
        sticky.invalidate();
        assert!(sticky.on_frame(&f.tree, &f.chrome));
        assert_eq!(sticky.state(), StickyState::Inactive);
    }

    #[test]
    fn test_overlay_tracks_horizontal_scroll() {
        let mut f = fixture(-100.0, 600.0);
        let mut sticky =
            StickyHeader::attach(&mut f.tree, &f.chrome, f.parts, StickyHeaderConfig::default());
        sticky.on_frame(&f.tree, &f.chrome);
        assert_eq!(sticky.overlay_offset(), 0.0);

        f.tree.set_scroll_left(f.parts.scroll_container, 120.0);
        let event = UiEvent::Scroll(EventTarget::Element(f.parts.scroll_container));
        assert!(sticky.handle_event(&f.tree, &event));
        assert_eq!(sticky.overlay_offset(), -120.0);
        assert!(sticky.has_pending_frame());
    }

    #[test]
    fn test_events_coalesce_and_detach_releases_everything() {
        let mut f = fixture(-100.0, 600.0);
        let mut sticky =
            StickyHeader::attach(&mut f.tree, &f.chrome, f.parts, StickyHeaderConfig::default());
        assert_eq!(f.tree.listener_count(), 4);
        sticky.handle_event(&f.tree, &UiEvent::Resize);
        sticky.handle_event(&f.tree, &UiEvent::Scroll(EventTarget::Window));
        assert!(sticky.on_frame(&f.tree, &f.chrome));
        assert!(!sticky.has_pending_frame());

        sticky.handle_event(&f.tree, &UiEvent::Resize);
        sticky.detach(&mut f.tree);
        assert_eq!(f.tree.listener_count(), 0);
        assert!(!sticky.on_frame(&f.tree, &f.chrome));
        assert_eq!(sticky.state(), StickyState::Inactive);
    }
}
