pub mod chrome;
pub mod column_selector;
pub mod dashboard_table;
pub mod detail_drawer;
pub mod filter_popover;
pub mod overlay;
pub mod upload_modal;

pub use chrome::{ChromeConfig, TopChrome};
pub use column_selector::ColumnSelector;
pub use dashboard_table::DashboardTable;
pub use detail_drawer::DetailDrawer;
pub use filter_popover::FilterPopover;
pub use overlay::{Overlay, OverlayCommand, OverlayShell};
pub use upload_modal::UploadModal;
