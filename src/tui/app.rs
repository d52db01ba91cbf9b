use crate::config::Config;
use crate::core::models::PredictResponse;
use crate::core::policy::EvaluationPolicy;
use crate::core::types::Row;
use crate::services::report_service::PREDICT_MODE;
use crate::services::{ReportService, ServiceError};
use crate::table::{AnchorUpdate, FilterPopoverConfig};
use crate::tui::components::{
    ColumnSelector, DashboardTable, DetailDrawer, FilterPopover, Overlay, OverlayCommand, TopChrome,
    UploadModal,
};
use crate::tui::draw::{fill, fit, put_str, text_width, to_box};
use crate::tui::{Action, Component, KeyBindings, Theme};
use crate::ui::geometry::Rect as BoxRect;
use crate::ui::tree::{tab_direction, Element, ElementId, ElementTree, Role, UiEvent};
use color_eyre::Result;
use crossterm::event::{Event, KeyEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind};
use ratatui::{layout::Rect, Frame};
use std::path::PathBuf;
use std::time::Instant;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, error, info, warn};

/// Rows scrolled per mouse wheel notch
const WHEEL_ROWS: i32 = 3;
/// Columns scrolled per horizontal wheel notch
const WHEEL_COLUMNS: f64 = 8.0;
/// Actions advertised on the status bar while no message is showing
const HINT_ACTIONS: [Action; 7] = [
    Action::OpenFilter,
    Action::SortAscending,
    Action::OpenColumnSelector,
    Action::OpenUpload,
    Action::OpenDetail,
    Action::Download,
    Action::Quit,
];

/// Results of background work and deferred requests, drained on every tick
#[derive(Debug)]
pub enum AppMessage {
    /// Escape was pressed on an open overlay
    CloseOverlay,
    UploadFinished(Result<PredictResponse, ServiceError>),
    DownloadFinished(Result<PathBuf, ServiceError>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayKind {
    Filter,
    Columns,
    Detail,
    Upload,
}

enum ActiveOverlay {
    Filter(FilterPopover),
    Columns(ColumnSelector),
    Detail(DetailDrawer),
    Upload(UploadModal),
}

impl ActiveOverlay {
    fn kind(&self) -> OverlayKind {
        match self {
            ActiveOverlay::Filter(_) => OverlayKind::Filter,
            ActiveOverlay::Columns(_) => OverlayKind::Columns,
            ActiveOverlay::Detail(_) => OverlayKind::Detail,
            ActiveOverlay::Upload(_) => OverlayKind::Upload,
        }
    }

    fn as_overlay(&self) -> &dyn Overlay {
        match self {
            ActiveOverlay::Filter(o) => o,
            ActiveOverlay::Columns(o) => o,
            ActiveOverlay::Detail(o) => o,
            ActiveOverlay::Upload(o) => o,
        }
    }

    fn as_overlay_mut(&mut self) -> &mut dyn Overlay {
        match self {
            ActiveOverlay::Filter(o) => o,
            ActiveOverlay::Columns(o) => o,
            ActiveOverlay::Detail(o) => o,
            ActiveOverlay::Upload(o) => o,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Success,
    Error,
}

/// Application state
///
/// Owns the element tree and every component mounted in it, routes terminal
/// events to them and runs the frame callbacks after each draw.
pub struct App {
    /// Headless element tree shared by all components
    tree: ElementTree,

    /// Top navigation bar
    chrome: TopChrome,

    /// Report summary and row table
    table: DashboardTable,

    /// Bottom status line element
    status_bar: ElementId,

    /// Parent of every overlay container; last root child so overlays win hit tests
    overlay_layer: ElementId,

    /// The open overlay, at most one at a time
    overlay: Option<ActiveOverlay>,

    /// Backend client
    service: ReportService,

    /// Keybindings configuration
    keybindings: KeyBindings,

    /// Key hints built from the active bindings
    hint_line: String,

    /// Current theme
    theme: Theme,

    popover_config: FilterPopoverConfig,

    tx: UnboundedSender<AppMessage>,
    rx: UnboundedReceiver<AppMessage>,

    /// Last status message
    status: Option<(String, StatusKind)>,

    /// Whether the app should quit
    should_quit: bool,
}

impl App {
    /// Create a new App instance
    pub fn new(config: &Config) -> Self {
        let theme = Theme::from_name(config.theme);
        let mut tree = ElementTree::new(BoxRect::default());
        let root = tree.root();
        // page content first so the chrome and status bar paint over scrolled rows
        let page = tree.append(root, Element::new(Role::Container).with_label("page"));
        let chrome = TopChrome::mount(&mut tree, root, config.chrome, config.screen, theme.clone());
        let status_bar = tree.append(root, Element::new(Role::Container).with_label("status"));
        let overlay_layer = tree.append(root, Element::new(Role::Container).with_label("overlays"));
        let table = DashboardTable::new(
            page,
            theme.clone(),
            config.sticky_header,
            config.filter_popover.settle_delay(),
        );
        let (tx, rx) = mpsc::unbounded_channel();
        let keybindings = config.key_bindings();

        Self {
            tree,
            chrome,
            table,
            status_bar,
            overlay_layer,
            overlay: None,
            service: ReportService::new(&config.api_base_url, config.download_dir.clone()),
            hint_line: keybindings.hints(&HINT_ACTIONS),
            keybindings,
            theme,
            popover_config: config.filter_popover,
            tx,
            rx,
            status: None,
            should_quit: false,
        }
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn tree(&self) -> &ElementTree {
        &self.tree
    }

    pub fn table(&self) -> &DashboardTable {
        &self.table
    }

    pub fn chrome(&self) -> &TopChrome {
        &self.chrome
    }

    pub fn overlay_kind(&self) -> Option<OverlayKind> {
        self.overlay.as_ref().map(ActiveOverlay::kind)
    }

    pub fn status(&self) -> Option<(&str, StatusKind)> {
        self.status.as_ref().map(|(text, kind)| (text.as_str(), *kind))
    }

    fn set_status(&mut self, text: impl Into<String>, kind: StatusKind) {
        self.status = Some((text.into(), kind));
    }

    /// Replace the shown report
    pub fn load_report(&mut self, report: PredictResponse) {
        if matches!(
            self.overlay_kind(),
            Some(OverlayKind::Filter | OverlayKind::Columns | OverlayKind::Detail)
        ) {
            self.close_overlay();
        }
        info!(
            "showing report '{}' ({} rows)",
            report.report_filename,
            report.data.len()
        );
        self.chrome.set_report(
            &mut self.tree,
            Some(report.report_filename.clone()),
            Some(report.report_url.clone()).filter(|u| !u.is_empty()),
        );
        self.set_status(
            format!("Loaded {} rows from {}", report.rows, report.report_filename),
            StatusKind::Success,
        );
        self.table.set_report(&mut self.tree, &self.chrome, report);
    }

    // ---- events --------------------------------------------------------

    /// Handle a terminal event
    pub fn handle_event(&mut self, event: Event) -> Result<()> {
        match event {
            Event::Key(key) => self.handle_key_event(key)?,
            Event::Mouse(mouse) => self.handle_mouse_event(mouse)?,
            Event::Resize(width, height) => self.resize(Rect::new(0, 0, width, height)),
            _ => {}
        }
        Ok(())
    }

    fn resize(&mut self, area: Rect) {
        let viewport = to_box(area);
        if self.tree.viewport() == viewport {
            return;
        }
        debug!("viewport resized to {}x{}", area.width, area.height);
        self.tree.set_viewport(viewport);
        self.table.dispatch(&mut self.tree, &UiEvent::Resize, Instant::now());
    }

    /// Handle a key event
    pub fn handle_key_event(&mut self, key: KeyEvent) -> Result<()> {
        // Only handle key press events, ignore release/repeat
        if key.kind != KeyEventKind::Press {
            return Ok(());
        }

        if let Some(overlay) = &mut self.overlay {
            let overlay = overlay.as_overlay_mut();
            if overlay.shell_mut().handle_key(&mut self.tree, &key) {
                // Escape only posts a request; settle it right away
                self.process_messages();
                return Ok(());
            }
            if let Some(command) = overlay.handle_input(&mut self.tree, &key) {
                self.apply(command);
                return Ok(());
            }
            match self.keybindings.get_action(&key) {
                Some(Action::Quit) => self.should_quit = true,
                Some(action) => {
                    let command = overlay.handle_action(&mut self.tree, action);
                    self.apply(command);
                }
                None => {}
            }
            return Ok(());
        }

        if let Some(reverse) = tab_direction(&key) {
            self.tree.advance_focus(reverse);
            return Ok(());
        }
        if let Some(action) = self.keybindings.get_action(&key) {
            self.handle_action(action)?;
        }
        Ok(())
    }

    /// Handle an action while no overlay is open
    fn handle_action(&mut self, action: Action) -> Result<()> {
        match action {
            Action::Quit => self.should_quit = true,
            Action::OpenFilter => {
                if let Some(column) = self.table.selected_column().map(str::to_string) {
                    self.open_filter(&column);
                }
            }
            Action::OpenDetail => {
                if let Some(row) = self.table.selected_row() {
                    self.open_detail(row);
                }
            }
            Action::OpenColumnSelector => self.open_column_selector(),
            Action::OpenUpload => self.open_upload(None),
            Action::Download => self.download_report(),
            Action::DownloadSample => self.download_sample(),
            Action::Confirm => {
                let chrome_action = self
                    .tree
                    .active_element()
                    .and_then(|id| self.chrome.action_for(id));
                if let Some(chrome_action) = chrome_action {
                    return self.handle_action(chrome_action);
                }
            }
            Action::Cancel => {
                self.tree.blur();
                self.status = None;
            }
            _ => {
                self.table.handle_action(&mut self.tree, action)?;
            }
        }
        Ok(())
    }

    /// Handle a mouse event
    pub fn handle_mouse_event(&mut self, mouse: MouseEvent) -> Result<()> {
        let (x, y) = (mouse.column as f64 + 0.5, mouse.row as f64 + 0.5);
        let modal = self.overlay.as_ref().is_some_and(|o| o.as_overlay().shell().is_modal());
        match mouse.kind {
            MouseEventKind::ScrollDown | MouseEventKind::ScrollUp => {
                let down = mouse.kind == MouseEventKind::ScrollDown;
                if let Some(ActiveOverlay::Detail(drawer)) = &mut self.overlay {
                    if drawer.shell().hit(&self.tree, x, y) {
                        let action = if down { Action::MoveDown } else { Action::MoveUp };
                        drawer.handle_action(&mut self.tree, action);
                        return Ok(());
                    }
                }
                // modals lock the page
                if !modal {
                    let rows = if down { WHEEL_ROWS } else { -WHEEL_ROWS };
                    self.table.scroll_page(&mut self.tree, rows);
                }
            }
            MouseEventKind::ScrollLeft | MouseEventKind::ScrollRight => {
                if !modal {
                    let delta = if mouse.kind == MouseEventKind::ScrollRight {
                        WHEEL_COLUMNS
                    } else {
                        -WHEEL_COLUMNS
                    };
                    self.table.scroll_horizontal(&mut self.tree, delta);
                }
            }
            MouseEventKind::Down(MouseButton::Left) => self.click(x, y)?,
            _ => {}
        }
        Ok(())
    }

    fn click(&mut self, x: f64, y: f64) -> Result<()> {
        let hit = self.tree.hit_test(x, y);

        if let Some(active) = &mut self.overlay {
            let kind = active.kind();
            let overlay = active.as_overlay_mut();
            let container = overlay.shell().container();
            if overlay.shell().hit(&self.tree, x, y) {
                if let Some(id) = hit.filter(|id| self.tree.contains(container, *id) && *id != container) {
                    if self.tree.is_focusable(id) {
                        self.tree.focus(id);
                    }
                    let command = overlay.activate(&mut self.tree, id);
                    self.apply(command);
                }
                return Ok(());
            }
            if overlay.shell().is_modal() {
                // backdrop
                self.request_close();
                return Ok(());
            }
            let open_column = self.table.filter().active_column().map(str::to_string);
            self.close_overlay();
            if kind == OverlayKind::Filter {
                // consumed, except that another column's header switches the filter
                let column = hit.and_then(|id| self.table.header_column(&self.tree, id));
                if let Some(column) = column.filter(|c| Some(c) != open_column.as_ref()) {
                    self.open_filter(&column);
                }
                return Ok(());
            }
        }

        let Some(id) = hit else {
            return Ok(());
        };
        if let Some(action) = self.chrome.action_for(id) {
            self.tree.focus(id);
            return self.handle_action(action);
        }
        if let Some(column) = self.table.header_column(&self.tree, id) {
            self.open_filter(&column);
            return Ok(());
        }
        if let Some(row) = self.table.select_row_element(id) {
            self.open_detail(row);
        }
        Ok(())
    }

    // ---- overlays ------------------------------------------------------

    /// Escape callback: posts a close request for the current overlay
    fn close_request_sender(&self) -> impl FnMut() + 'static {
        let tx = self.tx.clone();
        move || {
            let _ = tx.send(AppMessage::CloseOverlay);
        }
    }

    fn open_filter(&mut self, column: &str) {
        self.close_overlay();
        if !self.table.open_filter(&mut self.tree, &self.chrome, column) {
            warn!("no header cell renders '{column}'");
            return;
        }
        let values = self.table.filter_values();
        let hidden = self.table.filter().hidden_values_for_active_column();
        let on_close = self.close_request_sender();
        let mut popover = FilterPopover::open(
            &mut self.tree,
            self.overlay_layer,
            column,
            values,
            &hidden,
            self.popover_config,
            on_close,
        );
        popover.set_anchor(self.table.filter().anchor_rect());
        popover.set_sort(self.table.filter().sort().cloned());
        self.overlay = Some(ActiveOverlay::Filter(popover));
    }

    fn open_detail(&mut self, row: Row) {
        self.close_overlay();
        let on_close = self.close_request_sender();
        let drawer = DetailDrawer::open(&mut self.tree, self.overlay_layer, row, on_close);
        self.overlay = Some(ActiveOverlay::Detail(drawer));
    }

    fn open_column_selector(&mut self) {
        if self.table.report().is_none() {
            self.set_status("Load a report first", StatusKind::Info);
            return;
        }
        self.close_overlay();
        let on_close = self.close_request_sender();
        let selector = ColumnSelector::open(
            &mut self.tree,
            self.overlay_layer,
            self.table.all_columns(),
            self.table.visible_columns(),
            on_close,
        );
        self.overlay = Some(ActiveOverlay::Columns(selector));
    }

    /// Open the upload form, optionally with the file path filled in
    pub fn open_upload(&mut self, file: Option<String>) {
        self.close_overlay();
        let on_close = self.close_request_sender();
        let modal = UploadModal::open(&mut self.tree, self.overlay_layer, file, on_close);
        self.overlay = Some(ActiveOverlay::Upload(modal));
    }

    /// Close unless the overlay is busy
    fn request_close(&mut self) {
        if self.overlay.as_ref().is_some_and(|o| o.as_overlay().can_close()) {
            self.close_overlay();
        }
    }

    fn close_overlay(&mut self) {
        let Some(mut overlay) = self.overlay.take() else {
            return;
        };
        if overlay.kind() == OverlayKind::Filter {
            self.table.close_filter(&mut self.tree);
        }
        overlay.as_overlay_mut().shell_mut().close(&mut self.tree);
    }

    fn apply(&mut self, command: OverlayCommand) {
        match command {
            OverlayCommand::None => {}
            OverlayCommand::Close => self.request_close(),
            OverlayCommand::ToggleValue(value) => {
                self.table.toggle_filter_value(&value);
                if let Some(ActiveOverlay::Filter(popover)) = &self.overlay {
                    let hidden = self.table.filter().hidden_values_for_active_column();
                    popover.sync_hidden(&mut self.tree, &hidden);
                }
            }
            OverlayCommand::Sort(direction) => {
                self.table.sort_active_column(direction);
                if let Some(ActiveOverlay::Filter(popover)) = &mut self.overlay {
                    popover.set_sort(self.table.filter().sort().cloned());
                }
            }
            OverlayCommand::HideColumn => {
                self.table.hide_active_column(&mut self.tree);
                self.close_overlay();
            }
            OverlayCommand::ToggleColumn(column) => {
                self.table.toggle_column(&mut self.tree, &column);
                if let Some(ActiveOverlay::Columns(selector)) = &self.overlay {
                    selector.sync_visible(&mut self.tree, self.table.visible_columns());
                }
            }
            OverlayCommand::Submit { file, policy } => self.start_upload(file, policy),
        }
    }

    // ---- background work -----------------------------------------------

    /// Upload `file` in the background; the result arrives as a message
    pub fn start_upload(&mut self, file: PathBuf, policy: EvaluationPolicy) {
        info!("uploading {}", file.display());
        self.set_status(format!("Uploading {}…", file.display()), StatusKind::Info);
        let service = self.service.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = service.predict_csv(&file, &policy, PREDICT_MODE).await;
            let _ = tx.send(AppMessage::UploadFinished(result));
        });
    }

    fn start_download(&mut self, path: String) {
        self.set_status(format!("Downloading {path}…"), StatusKind::Info);
        let service = self.service.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = service.download(&path).await;
            let _ = tx.send(AppMessage::DownloadFinished(result));
        });
    }

    fn download_report(&mut self) {
        match self.table.report().map(|r| r.report_url.clone()) {
            Some(url) if !url.is_empty() => self.start_download(url),
            _ => self.set_status("No report to download", StatusKind::Info),
        }
    }

    fn download_sample(&mut self) {
        let url = self.service.sample_csv_url();
        self.start_download(url);
    }

    /// Apply every queued message
    pub fn process_messages(&mut self) {
        while let Ok(message) = self.rx.try_recv() {
            self.handle_message(message);
        }
    }

    fn handle_message(&mut self, message: AppMessage) {
        match message {
            AppMessage::CloseOverlay => self.request_close(),
            AppMessage::UploadFinished(Ok(report)) => {
                if self.overlay_kind() == Some(OverlayKind::Upload) {
                    self.close_overlay();
                }
                self.load_report(report);
            }
            AppMessage::UploadFinished(Err(err)) => {
                error!("upload failed: {err}");
                if let Some(ActiveOverlay::Upload(modal)) = &mut self.overlay {
                    modal.fail(&mut self.tree, err.user_message());
                }
                self.set_status(err.user_message(), StatusKind::Error);
            }
            AppMessage::DownloadFinished(Ok(path)) => {
                self.set_status(format!("Saved {}", path.display()), StatusKind::Success);
            }
            AppMessage::DownloadFinished(Err(err)) => {
                error!("download failed: {err}");
                self.set_status(err.user_message(), StatusKind::Error);
            }
        }
    }

    // ---- timing --------------------------------------------------------

    /// Advance timers: the chrome transition and the filter settle delay
    pub fn tick(&mut self, now: Instant) -> Result<()> {
        self.process_messages();
        self.chrome.set_page_scrolled(self.table.page_scroll() > 0, now);
        if let Some(event) = self.chrome.on_tick(now) {
            self.table.dispatch(&mut self.tree, &event, now);
        }
        self.table.update(&mut self.tree, now)?;
        Ok(())
    }

    /// Frame callbacks, run after each draw once layout is current
    pub fn on_frame(&mut self) {
        let update = self.table.on_frame(&mut self.tree, &self.chrome);
        if update == AnchorUpdate::Closed && self.overlay_kind() == Some(OverlayKind::Filter) {
            self.close_overlay();
        }
        if let Some(ActiveOverlay::Filter(popover)) = &mut self.overlay {
            popover.set_anchor(self.table.filter().anchor_rect());
        }
        if let Some(overlay) = &mut self.overlay {
            overlay.as_overlay_mut().shell_mut().on_frame(&mut self.tree);
        }
    }

    // ---- drawing -------------------------------------------------------

    /// Render the application
    pub fn render(&mut self, frame: &mut Frame) {
        let screen = frame.area();
        self.resize(screen);

        let chrome_height = self.chrome.height().min(screen.height);
        let status_height = 1u16.min(screen.height.saturating_sub(chrome_height));
        let content = Rect::new(
            screen.x,
            screen.y + chrome_height,
            screen.width,
            screen.height - chrome_height - status_height,
        );
        let status_area = Rect::new(screen.x, content.bottom(), screen.width, status_height);

        fill(frame.buffer_mut(), screen, self.theme.normal_style());
        self.table.render(frame, content, &mut self.tree);
        self.chrome.render(frame, screen, &mut self.tree);
        self.render_status(frame, status_area);

        if let Some(overlay) = &mut self.overlay {
            overlay.as_overlay_mut().render(frame, &mut self.tree, &self.theme);
        }
    }

    fn render_status(&mut self, frame: &mut Frame, area: Rect) {
        self.tree.set_rect(self.status_bar, to_box(area));
        if area.height == 0 {
            return;
        }
        let buf = frame.buffer_mut();
        fill(buf, area, self.theme.chrome_style());

        let counts = self
            .table
            .report()
            .map(|r| format!(" {}/{} rows ", self.table.visible_rows().len(), r.data.len()))
            .unwrap_or_default();
        let counts_width = text_width(&counts) as u16;
        let (text, style) = match &self.status {
            Some((text, StatusKind::Error)) => (text.as_str(), self.theme.error_style()),
            Some((text, StatusKind::Success)) => (text.as_str(), self.theme.success_style()),
            Some((text, StatusKind::Info)) => (text.as_str(), self.theme.info_style()),
            None => (self.hint_line.as_str(), self.theme.chrome_style()),
        };
        let width = area.width.saturating_sub(counts_width + 1) as usize;
        put_str(buf, area, area.x as i32 + 1, area.y as i32, &fit(text, width), style);
        put_str(
            buf,
            area,
            area.right() as i32 - counts_width as i32,
            area.y as i32,
            &counts,
            self.theme.chrome_style(),
        );
    }
}
