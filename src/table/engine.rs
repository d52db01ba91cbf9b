//! Row table state: per-column value filters, a single-column sort, and the
//! filter popover's anchor.
//!
//! The popover floats next to the header cell it was opened from. Scrolling,
//! resizing or the top chrome changing height all move that cell, so while a
//! filter is open the engine listens for those events, remeasures on the next
//! frame and runs one more measurement after things settle. If the table has
//! been re-rendered and the anchor element is gone, the header cell for the
//! same column is looked up again; when none exists the popover closes.

use crate::core::types::{Row, SortDirection, SortState};
use crate::ui::chrome::ViewportChrome;
use crate::ui::geometry::Rect;
use crate::ui::schedule::{Debounce, FrameSlot};
use crate::ui::tree::{ElementId, ElementTree, EventKind, EventTarget, ListenerId, UiEvent};
use std::cmp::Reverse;
use std::collections::{BTreeSet, HashMap};
use std::time::{Duration, Instant};
use tracing::{debug, trace};

pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(240);

/// Outcome of a frame-time anchor refresh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorUpdate {
    /// No frame was pending or no filter is open
    Idle,
    Measured,
    /// The anchor was gone and a header cell for the same column took over
    Reanchored(ElementId),
    /// Nothing renders the column any more; the filter was closed
    Closed,
}

#[derive(Debug)]
struct OpenFilter {
    column: String,
    anchor: ElementId,
    rect: Rect,
    listeners: Vec<ListenerId>,
}

#[derive(Debug)]
pub struct TableFilter {
    hidden: HashMap<String, BTreeSet<String>>,
    sort: Option<SortState>,
    open: Option<OpenFilter>,
    frame: FrameSlot,
    settle: Debounce,
}

impl Default for TableFilter {
    fn default() -> Self {
        Self::new(DEFAULT_SETTLE_DELAY)
    }
}

impl TableFilter {
    pub fn new(settle_delay: Duration) -> Self {
        Self {
            hidden: HashMap::new(),
            sort: None,
            open: None,
            frame: FrameSlot::new(),
            settle: Debounce::new(settle_delay),
        }
    }

    // ---- filters and sort ------------------------------------------------

    /// Toggle whether rows whose `column` displays as `value` are hidden
    pub fn set_hidden_value(&mut self, column: &str, value: &str) {
        let set = self.hidden.entry(column.to_string()).or_default();
        if !set.remove(value) {
            set.insert(value.to_string());
        }
    }

    /// Toggle a value of the column whose filter is open
    pub fn toggle_active_value(&mut self, value: &str) {
        if let Some(column) = self.active_column().map(str::to_string) {
            self.set_hidden_value(&column, value);
        }
    }

    pub fn hidden_values(&self, column: &str) -> Option<&BTreeSet<String>> {
        self.hidden.get(column)
    }

    pub fn hidden_values_for_active_column(&self) -> BTreeSet<String> {
        self.active_column()
            .and_then(|c| self.hidden.get(c))
            .cloned()
            .unwrap_or_default()
    }

    pub fn is_filtered(&self, column: &str) -> bool {
        self.hidden.get(column).is_some_and(|s| !s.is_empty())
    }

    pub fn set_sort(&mut self, column: &str, direction: SortDirection) {
        self.sort = Some(SortState::new(column, direction));
    }

    pub fn sort_active_column(&mut self, direction: SortDirection) {
        if let Some(column) = self.active_column().map(str::to_string) {
            self.set_sort(&column, direction);
        }
    }

    pub fn sort(&self) -> Option<&SortState> {
        self.sort.as_ref()
    }

    /// Rows passing every column filter, stably sorted by the sort column's
    /// display string when a sort is set
    pub fn visible_rows<'a>(&self, rows: &'a [Row]) -> Vec<&'a Row> {
        let mut out: Vec<&Row> = rows
            .iter()
            .filter(|row| {
                self.hidden
                    .iter()
                    .all(|(column, hidden)| !hidden.contains(&row.text(column)))
            })
            .collect();

        if let Some(sort) = &self.sort {
            match sort.direction {
                SortDirection::Asc => {
                    out.sort_by_cached_key(|row| utf16_key(&row.text(&sort.column)))
                }
                SortDirection::Desc => {
                    out.sort_by_cached_key(|row| Reverse(utf16_key(&row.text(&sort.column))))
                }
            }
        }
        out
    }

    /// Distinct display strings of the open column over all rows, ascending
    pub fn distinct_values_for_active_column(&self, rows: &[Row]) -> Vec<String> {
        let Some(column) = self.active_column() else {
            return Vec::new();
        };
        let mut values: Vec<String> = rows
            .iter()
            .map(|row| row.text(column))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        values.sort_by_cached_key(|v| utf16_key(v));
        values
    }

    // ---- popover anchor --------------------------------------------------

    pub fn active_column(&self) -> Option<&str> {
        self.open.as_ref().map(|o| o.column.as_str())
    }

    pub fn anchor_element(&self) -> Option<ElementId> {
        self.open.as_ref().map(|o| o.anchor)
    }

    pub fn anchor_rect(&self) -> Option<Rect> {
        self.open.as_ref().map(|o| o.rect)
    }

    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    /// Open the filter for `column` anchored at `anchor`. Replaces any open filter.
    pub fn open_filter(
        &mut self,
        tree: &mut ElementTree,
        chrome: &dyn ViewportChrome,
        column: &str,
        anchor: ElementId,
    ) {
        self.close_filter(tree);

        let mut listeners = vec![
            tree.add_listener(EventTarget::Window, EventKind::Scroll, true),
            tree.add_listener(EventTarget::Window, EventKind::Resize, false),
        ];
        if let Some(el) = chrome.element() {
            listeners.push(tree.add_listener(EventTarget::Element(el), EventKind::TransitionEnd, false));
        }

        let rect = tree.rect(anchor).unwrap_or_default();
        debug!("opening filter for '{column}' at {rect:?}");
        self.open = Some(OpenFilter {
            column: column.to_string(),
            anchor,
            rect,
            listeners,
        });
        self.frame.request();
    }

    /// Close the filter and release every listener, frame and timer it holds
    pub fn close_filter(&mut self, tree: &mut ElementTree) {
        self.frame.cancel();
        self.settle.cancel();
        if let Some(open) = self.open.take() {
            for listener in open.listeners {
                tree.remove_listener(listener);
            }
            debug!("closed filter for '{}'", open.column);
        }
    }

    /// Ask the caller to drop `column` from the visible set, then close
    pub fn hide_column(&mut self, tree: &mut ElementTree, column: &str, on_hide: impl FnOnce(&str)) {
        on_hide(column);
        self.close_filter(tree);
    }

    pub fn hide_active_column(&mut self, tree: &mut ElementTree, on_hide: impl FnOnce(&str)) {
        if let Some(column) = self.active_column().map(str::to_string) {
            self.hide_column(tree, &column, on_hide);
        }
    }

    /// React to a scroll, resize or chrome transition while a filter is open.
    /// Returns whether the event concerned the anchor.
    pub fn handle_event(&mut self, tree: &ElementTree, event: &UiEvent, now: Instant) -> bool {
        let Some(open) = &self.open else {
            return false;
        };
        if !open.listeners.iter().any(|l| tree.delivers(*l, event)) {
            return false;
        }
        trace!("anchor invalidated by {:?}", event.kind());
        self.frame.request();
        self.settle.schedule(now);
        true
    }

    /// Fire the settle timer once its delay has passed
    pub fn on_tick(&mut self, now: Instant) {
        if self.open.is_some() && self.settle.fire_due(now) {
            self.frame.request();
        }
    }

    pub fn has_pending_frame(&self) -> bool {
        self.frame.is_pending()
    }

    /// Remeasure the anchor on the next frame, e.g. after the header was rebuilt
    pub fn invalidate_anchor(&mut self) {
        if self.open.is_some() {
            self.frame.request();
        }
    }

    /// Remeasure the anchor if a frame was requested
    pub fn on_frame(&mut self, tree: &mut ElementTree) -> AnchorUpdate {
        if !self.frame.take() {
            return AnchorUpdate::Idle;
        }
        self.refresh_anchor(tree)
    }

    fn refresh_anchor(&mut self, tree: &mut ElementTree) -> AnchorUpdate {
        let Some(open) = self.open.as_mut() else {
            return AnchorUpdate::Idle;
        };
        if let Some(rect) = tree.rect(open.anchor) {
            open.rect = rect;
            return AnchorUpdate::Measured;
        }
        match tree.find_header_cell(&open.column) {
            Some(cell) => {
                debug!("re-anchoring filter for '{}' to {:?}", open.column, cell);
                open.anchor = cell;
                open.rect = tree.rect(cell).unwrap_or(open.rect);
                AnchorUpdate::Reanchored(cell)
            }
            None => {
                debug!("anchor for '{}' is gone, closing filter", open.column);
                self.close_filter(tree);
                AnchorUpdate::Closed
            }
        }
    }
}

/// Strings order by UTF-16 code units, which differs from byte order above U+FFFF
fn utf16_key(text: &str) -> Vec<u16> {
    text.encode_utf16().collect()
}
