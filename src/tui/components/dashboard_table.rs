//! The report page: a short summary followed by the row table.
//!
//! The page scrolls vertically under the top chrome and the table scrolls
//! horizontally inside its own container. Both are modelled in the element
//! tree exactly as laid out, so the sticky header can pin a copy of the
//! header row under the chrome once the real one has scrolled away, and the
//! filter popover can follow whichever header cell is on screen.

use crate::core::models::{format_cell, label_of, PredictResponse, RiskLevel};
use crate::core::types::{Row, SortDirection};
use crate::table::{AnchorUpdate, StickyHeader, StickyHeaderConfig, TableFilter, TableParts, VisibleColumns};
use crate::tui::draw::{fit, put_str, text_width};
use crate::tui::{Action, Component, Theme};
use crate::ui::chrome::ViewportChrome;
use crate::ui::geometry::Rect as BoxRect;
use crate::ui::tree::{Element, ElementId, ElementTree, EventTarget, Role, UiEvent};
use color_eyre::Result;
use ratatui::{layout::Rect, style::Modifier, Frame};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// Lines above the table: two summary lines and a spacer
pub const SUMMARY_ROWS: u16 = 3;
const MIN_COLUMN_WIDTH: u16 = 6;
const MAX_COLUMN_WIDTH: u16 = 36;
/// Rows sampled when sizing columns
const WIDTH_SAMPLE: usize = 500;
const HORIZONTAL_STEP: f64 = 8.0;

#[derive(Debug, Clone, Copy)]
struct TableElements {
    parts: TableParts,
    overlay_row: ElementId,
}

pub struct DashboardTable {
    theme: Theme,
    sticky_config: StickyHeaderConfig,
    settle_delay: Duration,
    page: ElementId,
    report: Option<PredictResponse>,
    all_columns: Vec<String>,
    columns: VisibleColumns,
    visible: Vec<String>,
    widths: HashMap<String, u16>,
    filter: TableFilter,
    sticky: Option<StickyHeader>,
    elements: Option<TableElements>,
    header_cells: Vec<(ElementId, String)>,
    overlay_cells: Vec<(ElementId, String)>,
    row_elements: Vec<(ElementId, usize)>,
    cursor: usize,
    selected_column: usize,
    page_scroll: usize,
    scroll_left: f64,
    content: Rect,
}

impl DashboardTable {
    pub fn new(page: ElementId, theme: Theme, sticky_config: StickyHeaderConfig, settle_delay: Duration) -> Self {
        Self {
            theme,
            sticky_config,
            settle_delay,
            page,
            report: None,
            all_columns: Vec::new(),
            columns: VisibleColumns::new(),
            visible: Vec::new(),
            widths: HashMap::new(),
            filter: TableFilter::new(settle_delay),
            sticky: None,
            elements: None,
            header_cells: Vec::new(),
            overlay_cells: Vec::new(),
            row_elements: Vec::new(),
            cursor: 0,
            selected_column: 0,
            page_scroll: 0,
            scroll_left: 0.0,
            content: Rect::default(),
        }
    }

    // ---- report --------------------------------------------------------

    /// Show a new report. Filters, sort and scroll positions start over; the
    /// visible columns reset when the report key changes.
    pub fn set_report(&mut self, tree: &mut ElementTree, chrome: &dyn ViewportChrome, report: PredictResponse) {
        self.unmount(tree);
        self.filter = TableFilter::new(self.settle_delay);
        self.all_columns = report.columns();
        self.visible = self.columns.resolve(report.report_key(), &self.all_columns);
        self.widths = column_widths(&self.all_columns, &report.data);
        debug!(
            "report '{}' loaded: {} rows, {} columns",
            report.report_key(),
            report.data.len(),
            self.all_columns.len()
        );
        self.report = Some(report);
        self.cursor = 0;
        self.selected_column = 0;
        self.page_scroll = 0;
        self.scroll_left = 0.0;
        self.mount(tree, chrome);
    }

    pub fn report(&self) -> Option<&PredictResponse> {
        self.report.as_ref()
    }

    pub fn all_columns(&self) -> &[String] {
        &self.all_columns
    }

    pub fn visible_columns(&self) -> &[String] {
        &self.visible
    }

    fn report_key(&self) -> String {
        self.report
            .as_ref()
            .map(|r| r.report_key().to_string())
            .unwrap_or_default()
    }

    fn mount(&mut self, tree: &mut ElementTree, chrome: &dyn ViewportChrome) {
        let scroll_container = tree.append(self.page, Element::new(Role::Container).with_label("table scroll"));
        let table = tree.append(scroll_container, Element::new(Role::Table));
        let header_row = tree.append(table, Element::new(Role::HeaderRow));
        let body = tree.append(table, Element::new(Role::Body));
        // after the real table so the pinned copy is found first and painted on top
        let overlay_row = tree.append(self.page, Element::new(Role::HeaderRow).with_label("fixed header"));
        let parts = TableParts {
            scroll_container,
            table,
            header_row,
            body,
        };
        self.elements = Some(TableElements { parts, overlay_row });
        self.rebuild_header(tree);
        self.sticky = Some(StickyHeader::attach(tree, chrome, parts, self.sticky_config));
    }

    fn unmount(&mut self, tree: &mut ElementTree) {
        self.filter.close_filter(tree);
        if let Some(mut sticky) = self.sticky.take() {
            sticky.detach(tree);
        }
        if let Some(elements) = self.elements.take() {
            tree.remove(elements.parts.scroll_container);
            tree.remove(elements.overlay_row);
        }
        self.header_cells.clear();
        self.overlay_cells.clear();
        self.row_elements.clear();
    }

    /// Recreate the header cells for the current visible columns
    fn rebuild_header(&mut self, tree: &mut ElementTree) {
        let Some(elements) = self.elements else {
            return;
        };
        tree.clear_children(elements.parts.header_row);
        self.header_cells = self
            .visible
            .iter()
            .map(|column| {
                let cell = Element::new(Role::HeaderCell)
                    .with_label(label_of(column))
                    .with_column(column.clone());
                (tree.append(elements.parts.header_row, cell), column.clone())
            })
            .collect();
        tree.clear_children(elements.overlay_row);
        self.overlay_cells.clear();
        self.selected_column = self.selected_column.min(self.visible.len().saturating_sub(1));
        if let Some(sticky) = &mut self.sticky {
            sticky.invalidate();
        }
        self.filter.invalidate_anchor();
    }

    fn set_visible(&mut self, tree: &mut ElementTree, visible: Vec<String>) {
        if visible != self.visible {
            self.visible = visible;
            self.rebuild_header(tree);
        }
    }

    /// Column selector toggle: hide a shown column or append a hidden one
    pub fn toggle_column(&mut self, tree: &mut ElementTree, column: &str) {
        let key = self.report_key();
        self.columns.toggle(&key, &self.all_columns, column);
        let visible = self.columns.resolve(&key, &self.all_columns);
        self.set_visible(tree, visible);
    }

    pub fn hide_column(&mut self, tree: &mut ElementTree, column: &str) {
        let key = self.report_key();
        if self.columns.hide(&key, &self.all_columns, column) {
            let visible = self.columns.resolve(&key, &self.all_columns);
            self.set_visible(tree, visible);
        }
    }

    /// Hide the column whose filter is open and close the filter
    pub fn hide_active_column(&mut self, tree: &mut ElementTree) {
        let key = self.report_key();
        let Self {
            filter,
            columns,
            all_columns,
            ..
        } = self;
        let mut changed = false;
        filter.hide_active_column(tree, |column| {
            changed = columns.hide(&key, all_columns.as_slice(), column);
        });
        if changed {
            let visible = self.columns.resolve(&key, &self.all_columns);
            self.set_visible(tree, visible);
        }
    }

    // ---- filter --------------------------------------------------------

    pub fn filter(&self) -> &TableFilter {
        &self.filter
    }

    /// Open the filter for `column`, anchored at the header cell on screen
    pub fn open_filter(&mut self, tree: &mut ElementTree, chrome: &dyn ViewportChrome, column: &str) -> bool {
        let Some(anchor) = tree.find_header_cell(column) else {
            return false;
        };
        self.filter.open_filter(tree, chrome, column, anchor);
        true
    }

    pub fn close_filter(&mut self, tree: &mut ElementTree) {
        self.filter.close_filter(tree);
    }

    pub fn toggle_filter_value(&mut self, value: &str) {
        self.filter.toggle_active_value(value);
        self.clamp_cursor();
        self.invalidate_layout();
    }

    pub fn sort_active_column(&mut self, direction: SortDirection) {
        self.filter.sort_active_column(direction);
    }

    /// Distinct display values of the open filter's column
    pub fn filter_values(&self) -> Vec<String> {
        self.report
            .as_ref()
            .map(|r| self.filter.distinct_values_for_active_column(&r.data))
            .unwrap_or_default()
    }

    // ---- rows and selection -------------------------------------------

    pub fn visible_rows(&self) -> Vec<&Row> {
        self.report
            .as_ref()
            .map(|r| self.filter.visible_rows(&r.data))
            .unwrap_or_default()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn selected_row(&self) -> Option<Row> {
        self.visible_rows().get(self.cursor).map(|r| (*r).clone())
    }

    pub fn selected_column(&self) -> Option<&str> {
        self.visible.get(self.selected_column).map(String::as_str)
    }

    /// Row rendered by a row element, selecting it
    pub fn select_row_element(&mut self, id: ElementId) -> Option<Row> {
        let index = self.row_elements.iter().find(|(e, _)| *e == id)?.1;
        self.cursor = index;
        self.selected_row()
    }

    /// Column of a header cell (real or pinned)
    pub fn header_column(&self, tree: &ElementTree, id: ElementId) -> Option<String> {
        tree.get(id)
            .filter(|e| e.role == Role::HeaderCell)
            .and_then(|e| e.column.clone())
    }

    fn clamp_cursor(&mut self) {
        let len = self.visible_rows().len();
        self.cursor = self.cursor.min(len.saturating_sub(1));
    }

    fn invalidate_layout(&mut self) {
        if let Some(sticky) = &mut self.sticky {
            sticky.invalidate();
        }
    }

    // ---- scrolling -----------------------------------------------------

    pub fn page_scroll(&self) -> usize {
        self.page_scroll
    }

    pub fn scroll_left(&self) -> f64 {
        self.scroll_left
    }

    /// Page lines: summary, header, one per visible row and a bottom margin
    fn page_height(&self) -> usize {
        SUMMARY_ROWS as usize + 1 + self.visible_rows().len() + 1
    }

    fn max_page_scroll(&self) -> usize {
        self.page_height().saturating_sub(self.content.height as usize)
    }

    /// Scroll the page by `delta` rows, emitting a window scroll
    pub fn scroll_page(&mut self, tree: &mut ElementTree, delta: i32) {
        let step = delta.unsigned_abs() as usize;
        let target = if delta < 0 {
            self.page_scroll.saturating_sub(step)
        } else {
            self.page_scroll.saturating_add(step)
        };
        self.scroll_page_to(tree, target);
    }

    fn scroll_page_to(&mut self, tree: &mut ElementTree, target: usize) {
        let next = target.min(self.max_page_scroll());
        if next != self.page_scroll {
            self.page_scroll = next;
            self.dispatch(tree, &UiEvent::Scroll(EventTarget::Window), Instant::now());
        }
    }

    /// Terminal row of a page line under the current scroll
    fn screen_y(&self, page_line: usize) -> i32 {
        let y = self.content.y as i64 + page_line as i64 - self.page_scroll as i64;
        y.clamp(i32::MIN as i64, i32::MAX as i64) as i32
    }

    fn table_width(&self) -> f64 {
        self.visible
            .iter()
            .map(|c| self.column_width(c) as f64 + 1.0)
            .sum()
    }

    /// Scroll the table container horizontally, emitting a container scroll
    pub fn scroll_horizontal(&mut self, tree: &mut ElementTree, delta: f64) {
        let max = (self.table_width() - self.content.width as f64).max(0.0);
        let next = (self.scroll_left + delta).clamp(0.0, max);
        if next == self.scroll_left {
            return;
        }
        self.scroll_left = next;
        if let Some(elements) = self.elements {
            tree.set_scroll_left(elements.parts.scroll_container, next);
            self.layout(tree);
            self.dispatch(
                tree,
                &UiEvent::Scroll(EventTarget::Element(elements.parts.scroll_container)),
                Instant::now(),
            );
        }
    }

    fn column_width(&self, column: &str) -> u16 {
        self.widths
            .get(column)
            .copied()
            .unwrap_or_else(|| header_width(column))
    }

    /// Keep the cursor row between the (possibly pinned) header and the bottom
    fn ensure_cursor_visible(&mut self, tree: &mut ElementTree) {
        let height = self.content.height as usize;
        if height == 0 {
            return;
        }
        // row position relative to the top of the page
        let row_top = SUMMARY_ROWS as usize + 1 + self.cursor;
        let pinned = usize::from(self.page_scroll >= SUMMARY_ROWS as usize);
        let first_visible = self.page_scroll + pinned;
        let last_visible = self.page_scroll + height - 1;
        if row_top < first_visible {
            // scrolling up may unpin the header; aim for the row under a pinned one
            let target = if self.cursor == 0 { 0 } else { row_top - 1 };
            self.scroll_page_to(tree, target);
        } else if row_top > last_visible {
            self.scroll_page_to(tree, self.page_scroll + (row_top - last_visible));
        }
    }

    fn ensure_column_visible(&mut self, tree: &mut ElementTree) {
        let mut left = 0.0;
        for (i, column) in self.visible.iter().enumerate() {
            let width = self.column_width(column) as f64 + 1.0;
            if i == self.selected_column {
                let view = self.content.width as f64;
                let delta = if left < self.scroll_left {
                    left - self.scroll_left
                } else if left + width > self.scroll_left + view {
                    left + width - (self.scroll_left + view)
                } else {
                    0.0
                };
                if delta != 0.0 {
                    self.scroll_horizontal(tree, delta);
                }
                return;
            }
            left += width;
        }
    }

    // ---- events and frames --------------------------------------------

    /// Route a layout event to the sticky header and the open filter
    pub fn dispatch(&mut self, tree: &mut ElementTree, event: &UiEvent, now: Instant) {
        if let Some(sticky) = &mut self.sticky {
            sticky.handle_event(tree, event);
        }
        self.filter.handle_event(tree, event, now);
    }

    pub fn on_tick(&mut self, now: Instant) {
        self.filter.on_tick(now);
    }

    pub fn has_pending_frame(&self) -> bool {
        self.filter.has_pending_frame() || self.sticky.as_ref().is_some_and(|s| s.has_pending_frame())
    }

    /// Run the measurements requested since the last frame
    pub fn on_frame(&mut self, tree: &mut ElementTree, chrome: &dyn ViewportChrome) -> AnchorUpdate {
        if let Some(sticky) = &mut self.sticky {
            if sticky.on_frame(tree, chrome) {
                trace!("sticky header geometry changed: {:?}", sticky.state());
            }
        }
        self.sync_overlay_header(tree);
        self.filter.on_frame(tree)
    }

    pub fn sticky(&self) -> Option<&StickyHeader> {
        self.sticky.as_ref()
    }

    /// Create or drop the pinned header cells to match the sticky state
    fn sync_overlay_header(&mut self, tree: &mut ElementTree) {
        let Some(elements) = self.elements else {
            return;
        };
        let fixed = self.sticky.as_ref().and_then(|s| s.fixed_header()).is_some();
        let current: Vec<&String> = self.overlay_cells.iter().map(|(_, c)| c).collect();
        let wanted: Vec<&String> = if fixed { self.visible.iter().collect() } else { Vec::new() };
        if current == wanted {
            self.layout_overlay(tree);
            return;
        }
        tree.clear_children(elements.overlay_row);
        self.overlay_cells = wanted
            .into_iter()
            .map(|column| {
                let cell = Element::new(Role::HeaderCell)
                    .with_label(label_of(column))
                    .with_column(column.clone());
                (tree.append(elements.overlay_row, cell), column.clone())
            })
            .collect();
        self.layout_overlay(tree);
    }

    fn layout_overlay(&self, tree: &mut ElementTree) {
        let Some(elements) = self.elements else {
            return;
        };
        let Some((fixed, offset)) = self
            .sticky
            .as_ref()
            .and_then(|s| s.fixed_header().map(|f| (f.clone(), s.overlay_offset())))
        else {
            tree.set_rect(elements.overlay_row, BoxRect::default());
            return;
        };
        tree.set_rect(
            elements.overlay_row,
            BoxRect::new(fixed.left, fixed.top, fixed.viewport_width, 1.0),
        );
        let mut x = fixed.left + offset;
        for (i, (id, column)) in self.overlay_cells.iter().enumerate() {
            let width = fixed
                .col_widths
                .get(i)
                .copied()
                .unwrap_or(self.column_width(column) as f64);
            tree.set_rect(*id, BoxRect::new(x, fixed.top, width, 1.0));
            x += width + 1.0;
        }
    }

    /// Place the table elements for the current scroll positions
    fn layout(&mut self, tree: &mut ElementTree) {
        let Some(elements) = self.elements else {
            return;
        };
        let parts = elements.parts;
        let area = self.content;
        let rows = self.visible_rows().len();
        let table_top = area.y as f64 + SUMMARY_ROWS as f64 - self.page_scroll as f64;
        let table_width = self.table_width();
        let table_left = area.x as f64 - self.scroll_left;

        tree.set_rect(
            parts.scroll_container,
            BoxRect::new(area.x as f64, table_top, area.width as f64, 1.0 + rows as f64),
        );
        tree.set_scroll_left(parts.scroll_container, self.scroll_left);
        tree.set_rect(parts.table, BoxRect::new(table_left, table_top, table_width, 1.0 + rows as f64));
        tree.set_rect(parts.header_row, BoxRect::new(table_left, table_top, table_width, 1.0));
        let mut x = table_left;
        for (id, column) in &self.header_cells {
            let width = self.column_width(column) as f64;
            tree.set_rect(*id, BoxRect::new(x, table_top, width, 1.0));
            x += width + 1.0;
        }
        tree.set_rect(parts.body, BoxRect::new(table_left, table_top + 1.0, table_width, rows as f64));

        // one element per row on screen
        tree.clear_children(parts.body);
        self.row_elements.clear();
        let first = (area.y as f64 - (table_top + 1.0)).max(0.0) as usize;
        let last = ((area.bottom() as f64 - (table_top + 1.0)).max(0.0) as usize).min(rows);
        for index in first..last {
            let y = table_top + 1.0 + index as f64;
            let id = tree.append(
                parts.body,
                Element::new(Role::Row).with_rect(BoxRect::new(area.x as f64, y, area.width as f64, 1.0)),
            );
            self.row_elements.push((id, index));
        }
        self.layout_overlay(tree);
    }

    fn header_text(&self, column: &str, width: u16) -> String {
        let mut text = label_of(column).to_string();
        if let Some(sort) = self.filter.sort().filter(|s| s.column == column) {
            text.push_str(match sort.direction {
                SortDirection::Asc => " ▲",
                SortDirection::Desc => " ▼",
            });
        }
        if self.filter.is_filtered(column) {
            text.push_str(" ⊘");
        }
        fit(&text, width as usize)
    }

    fn paint_header(&self, frame: &mut Frame, y: i32, left: f64) {
        let area = self.content;
        let buf = frame.buffer_mut();
        buf.set_style(
            Rect::new(area.x, y.max(0) as u16, area.width, 1).intersection(area),
            self.theme.header_style(),
        );
        let mut x = left;
        for (i, column) in self.visible.iter().enumerate() {
            let width = self.column_width(column);
            let mut style = self.theme.header_style();
            if i == self.selected_column {
                style = style.add_modifier(Modifier::UNDERLINED);
            }
            if self.filter.active_column() == Some(column.as_str()) {
                style = style.add_modifier(Modifier::REVERSED);
            }
            put_str(buf, area, x as i32, y, &self.header_text(column, width), style);
            x += width as f64 + 1.0;
        }
    }

    fn paint_summary(&self, frame: &mut Frame) {
        let area = self.content;
        let top = self.screen_y(0);
        let buf = frame.buffer_mut();
        let Some(report) = &self.report else {
            return;
        };
        let shown = self.visible_rows().len();
        let line = format!(
            "rows: {} · showing {} · {}",
            report.rows, shown, report.report_filename
        );
        put_str(buf, area, area.x as i32 + 1, top, &line, self.theme.normal_style().add_modifier(Modifier::BOLD));

        let sort = self
            .filter
            .sort()
            .map(|s| format!("sort: {} {}", label_of(&s.column), s.direction))
            .unwrap_or_else(|| "sort: none".to_string());
        let filtered: Vec<&str> = self
            .all_columns
            .iter()
            .filter(|c| self.filter.is_filtered(c))
            .map(|c| label_of(c))
            .collect();
        let filters = if filtered.is_empty() {
            "filters: none".to_string()
        } else {
            format!("filters: {}", filtered.join(", "))
        };
        put_str(
            buf,
            area,
            area.x as i32 + 1,
            top + 1,
            &format!("{sort} · {filters}"),
            self.theme.info_style(),
        );
    }
}

fn header_width(column: &str) -> u16 {
    // room for the sort and filter markers
    (text_width(label_of(column)) as u16 + 4).clamp(MIN_COLUMN_WIDTH, MAX_COLUMN_WIDTH)
}

/// Width per column from its label and a sample of its formatted cells
fn column_widths(columns: &[String], rows: &[Row]) -> HashMap<String, u16> {
    columns
        .iter()
        .map(|column| {
            let content = rows
                .iter()
                .take(WIDTH_SAMPLE)
                .map(|row| text_width(&format_cell(column, row.get(column))) as u16 + 2)
                .max()
                .unwrap_or(0);
            let width = content.max(header_width(column)).clamp(MIN_COLUMN_WIDTH, MAX_COLUMN_WIDTH);
            (column.clone(), width)
        })
        .collect()
}

impl Component for DashboardTable {
    fn handle_action(&mut self, tree: &mut ElementTree, action: Action) -> Result<bool> {
        if self.report.is_none() {
            return Ok(false);
        }
        let page = self.content.height.saturating_sub(2).max(1) as usize;
        let rows = self.visible_rows().len();
        match action {
            Action::MoveDown => self.cursor = (self.cursor + 1).min(rows.saturating_sub(1)),
            Action::MoveUp => self.cursor = self.cursor.saturating_sub(1),
            Action::PageDown => self.cursor = (self.cursor + page).min(rows.saturating_sub(1)),
            Action::PageUp => self.cursor = self.cursor.saturating_sub(page),
            Action::GoToTop => self.cursor = 0,
            Action::GoToBottom => self.cursor = rows.saturating_sub(1),
            Action::MoveLeft => {
                self.selected_column = self.selected_column.saturating_sub(1);
                self.ensure_column_visible(tree);
                return Ok(true);
            }
            Action::MoveRight => {
                self.selected_column = (self.selected_column + 1).min(self.visible.len().saturating_sub(1));
                self.ensure_column_visible(tree);
                return Ok(true);
            }
            Action::ScrollLeft => {
                self.scroll_horizontal(tree, -HORIZONTAL_STEP);
                return Ok(true);
            }
            Action::ScrollRight => {
                self.scroll_horizontal(tree, HORIZONTAL_STEP);
                return Ok(true);
            }
            Action::SortAscending | Action::SortDescending => {
                let direction = if action == Action::SortAscending {
                    SortDirection::Asc
                } else {
                    SortDirection::Desc
                };
                if let Some(column) = self.selected_column().map(str::to_string) {
                    self.filter.set_sort(&column, direction);
                }
                return Ok(true);
            }
            Action::HideColumn => {
                if let Some(column) = self.selected_column().map(str::to_string) {
                    self.hide_column(tree, &column);
                }
                return Ok(true);
            }
            _ => return Ok(false),
        }
        self.ensure_cursor_visible(tree);
        Ok(true)
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, tree: &mut ElementTree) {
        self.content = area;
        if self.report.is_none() {
            let hint = "No report loaded. Press u to upload a CSV, or start with --report <file.json>.";
            put_str(
                frame.buffer_mut(),
                area,
                area.x as i32 + 1,
                area.y as i32 + 1,
                hint,
                self.theme.info_style(),
            );
            return;
        }
        self.page_scroll = self.page_scroll.min(self.max_page_scroll());
        self.layout(tree);
        self.paint_summary(frame);

        let table_top = self.screen_y(SUMMARY_ROWS as usize);
        let table_left = area.x as f64 - self.scroll_left;
        if table_top >= area.y as i32 {
            self.paint_header(frame, table_top, table_left);
        }

        let rows = self.visible_rows();
        let buf = frame.buffer_mut();
        for (_, index) in &self.row_elements {
            let Some(row) = rows.get(*index) else {
                continue;
            };
            let y = self.screen_y(SUMMARY_ROWS as usize + 1 + *index);
            let Ok(row_y) = u16::try_from(y) else {
                continue;
            };
            let base = if *index == self.cursor {
                self.theme.selected_style()
            } else if index % 2 == 1 {
                self.theme.alt_row_style()
            } else {
                self.theme.normal_style()
            };
            buf.set_style(Rect::new(area.x, row_y, area.width, 1).intersection(area), base);
            let mut x = table_left;
            for column in &self.visible {
                let width = self.column_width(column);
                let value = row.get(column);
                if column == "risk_level" {
                    let level = RiskLevel::parse(&value.display());
                    let badge = format!(" {} ", value.display());
                    put_str(buf, area, x as i32, y, &fit(&badge, width as usize), self.theme.risk_badge_style(level));
                } else {
                    put_str(buf, area, x as i32, y, &fit(&format_cell(column, value), width as usize), base);
                }
                x += width as f64 + 1.0;
            }
        }

        if let Some((top, left)) = self
            .sticky
            .as_ref()
            .and_then(|s| s.fixed_header().map(|f| (f.top, f.left + s.overlay_offset())))
        {
            self.paint_header(frame, top as i32, left);
        }
    }

    fn supported_actions(&self) -> &[Action] {
        &[
            Action::MoveUp,
            Action::MoveDown,
            Action::MoveLeft,
            Action::MoveRight,
            Action::OpenFilter,
            Action::SortAscending,
            Action::SortDescending,
            Action::HideColumn,
            Action::OpenDetail,
        ]
    }

    fn name(&self) -> &str {
        "DashboardTable"
    }

    fn update(&mut self, _tree: &mut ElementTree, now: Instant) -> Result<()> {
        self.on_tick(now);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::CellValue;
    use crate::table::StickyState;
    use crate::ui::chrome::TreeChrome;
    use pretty_assertions::assert_eq;
    use ratatui::{backend::TestBackend, Terminal};

    fn report(rows: usize) -> PredictResponse {
        let levels = ["High", "Medium", "Low"];
        let data = (0..rows)
            .map(|i| {
                Row::new([
                    ("student_id", CellValue::from(format!("S{i:03}").as_str())),
                    ("risk_proba", CellValue::from(i as f64 / rows as f64)),
                    ("risk_level", CellValue::from(levels[i % 3])),
                    ("absence_count", CellValue::from(i as i64 % 5)),
                ])
            })
            .collect();
        PredictResponse {
            rows,
            report_filename: "prediction_report_1.csv".into(),
            report_url: "/api/download/prediction_report_1.csv".into(),
            data,
        }
    }

    struct Page {
        tree: ElementTree,
        chrome: TreeChrome,
        table: DashboardTable,
        terminal: Terminal<TestBackend>,
    }

    impl Page {
        fn new(rows: usize) -> Self {
            let mut tree = ElementTree::new(BoxRect::new(0.0, 0.0, 60.0, 20.0));
            let root = tree.root();
            let page = tree.append(root, Element::new(Role::Container));
            let chrome_el = tree.append(
                root,
                Element::new(Role::Container).with_rect(BoxRect::new(0.0, 0.0, 60.0, 2.0)),
            );
            let chrome = TreeChrome::new(Some(chrome_el));
            let mut table = DashboardTable::new(
                page,
                Theme::default(),
                StickyHeaderConfig::default(),
                Duration::from_millis(240),
            );
            table.set_report(&mut tree, &chrome, report(rows));
            let terminal = Terminal::new(TestBackend::new(60, 20)).unwrap();
            Self {
                tree,
                chrome,
                table,
                terminal,
            }
        }

        fn frame(&mut self) -> AnchorUpdate {
            let Self {
                tree,
                table,
                terminal,
                chrome,
            } = self;
            terminal
                .draw(|f| table.render(f, Rect::new(0, 2, 60, 18), tree))
                .unwrap();
            table.on_frame(tree, &*chrome)
        }
    }

    #[test]
    fn test_default_columns_and_row_elements() {
        let mut page = Page::new(40);
        page.frame();
        assert_eq!(
            page.table.visible_columns(),
            &["student_id", "risk_proba", "risk_level"]
        );
        // 18 rows of content minus the summary and the header
        assert_eq!(page.table.row_elements.len(), 14);
        let (first, _) = page.table.row_elements[0];
        assert_eq!(page.tree.rect(first).unwrap().y, 6.0);
        assert_eq!(page.tree.hit_test(3.0, 6.0), Some(first));
    }

    #[test]
    fn test_header_pins_after_scrolling_past_the_summary() {
        let mut page = Page::new(40);
        page.frame();
        assert_eq!(page.table.sticky().unwrap().state(), StickyState::Inactive);

        page.table.scroll_page(&mut page.tree, 5);
        page.frame();
        assert_eq!(page.table.sticky().unwrap().state(), StickyState::Fixed);
        assert_eq!(page.table.overlay_cells.len(), 3);

        // the pinned copy now wins header lookups
        let pinned = page.table.overlay_cells[0].0;
        assert_eq!(page.tree.find_header_cell("student_id"), Some(pinned));
        assert_eq!(page.tree.rect(pinned).unwrap().y, 2.0);

        page.table.scroll_page(&mut page.tree, -5);
        page.frame();
        assert_eq!(page.table.sticky().unwrap().state(), StickyState::Inactive);
        assert!(page.table.overlay_cells.is_empty());
    }

    #[test]
    fn test_filter_follows_header_and_closes_when_hidden() {
        let mut page = Page::new(40);
        page.frame();
        let chrome = page.chrome;
        assert!(page.table.open_filter(&mut page.tree, &chrome, "risk_level"));
        page.frame();
        let real = page.table.filter().anchor_element().unwrap();

        // pin the header: the real cell scrolls away, the anchor stays attached
        page.table.scroll_page(&mut page.tree, 6);
        assert_eq!(page.frame(), AnchorUpdate::Measured);
        assert_eq!(page.table.filter().anchor_element(), Some(real));

        page.table.toggle_column(&mut page.tree, "absence_count");
        page.frame();
        // the header was rebuilt, so the anchor moved to the new cell
        let anchor = page.table.filter().anchor_element().unwrap();
        assert_ne!(anchor, real);
        assert_eq!(page.table.header_column(&page.tree, anchor).as_deref(), Some("risk_level"));

        page.table.hide_active_column(&mut page.tree);
        assert!(!page.table.filter().is_open());
        assert!(!page.table.visible_columns().contains(&"risk_level".to_string()));
    }

    #[test]
    fn test_filtering_clamps_cursor() {
        let mut page = Page::new(6);
        page.frame();
        let chrome = page.chrome;
        page.table.handle_action(&mut page.tree, Action::GoToBottom).unwrap();
        assert_eq!(page.table.cursor(), 5);

        page.table.open_filter(&mut page.tree, &chrome, "risk_level");
        assert_eq!(page.table.filter_values(), vec!["High", "Low", "Medium"]);
        page.table.toggle_filter_value("Low");
        page.table.toggle_filter_value("Medium");
        assert_eq!(page.table.visible_rows().len(), 2);
        assert_eq!(page.table.cursor(), 1);
    }

    #[test]
    fn test_horizontal_scroll_moves_header_cells() {
        let mut page = Page::new(10);
        page.table.toggle_column(&mut page.tree, "absence_count");
        page.frame();
        let before = page.tree.rect(page.table.header_cells[0].0).unwrap().x;
        page.table.handle_action(&mut page.tree, Action::ScrollRight).unwrap();
        let after = page.tree.rect(page.table.header_cells[0].0).unwrap().x;
        assert_eq!(before - after, page.table.scroll_left());
    }

    #[test]
    fn test_bottom_row_reachable_past_u16_rows() {
        let mut page = Page::new(70_000);
        page.frame();
        page.table.handle_action(&mut page.tree, Action::GoToBottom).unwrap();
        page.frame();
        assert_eq!(page.table.cursor(), 69_999);
        assert!(page.table.page_scroll() > u16::MAX as usize);
        assert!(page.table.row_elements.iter().any(|(_, index)| *index == 69_999));

        page.table.handle_action(&mut page.tree, Action::GoToTop).unwrap();
        page.frame();
        assert_eq!(page.table.page_scroll(), 0);
        assert_eq!(page.table.row_elements[0].1, 0);
    }

    #[test]
    fn test_new_report_resets_filters() {
        let mut page = Page::new(10);
        page.frame();
        let chrome = page.chrome;
        page.table.open_filter(&mut page.tree, &chrome, "risk_level");
        page.table.toggle_filter_value("High");
        page.table.set_report(&mut page.tree, &chrome, report(10));
        assert!(!page.table.filter().is_filtered("risk_level"));
        assert!(!page.table.filter().is_open());
        assert_eq!(page.table.visible_rows().len(), 10);
    }
}
