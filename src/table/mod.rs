pub mod columns;
pub mod engine;
pub mod popover;
pub mod sticky;

pub use columns::VisibleColumns;
pub use engine::{AnchorUpdate, TableFilter};
pub use popover::FilterPopoverConfig;
pub use sticky::{FixedHeader, StickyHeader, StickyHeaderConfig, StickyState, TableParts};
