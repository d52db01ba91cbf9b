use serde::{Deserialize, Serialize};
use std::fmt;

/// All keyboard-bindable actions in the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum Action {
    // Navigation
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    PageUp,
    PageDown,
    GoToTop,
    GoToBottom,
    ScrollLeft,
    ScrollRight,

    // Table
    OpenFilter,
    SortAscending,
    SortDescending,
    HideColumn,
    OpenDetail,

    // Overlays
    OpenColumnSelector,
    OpenUpload,

    // Reports
    Download,
    DownloadSample,

    // Application
    Quit,
    Confirm,
    Cancel,
}

impl Action {
    /// Get human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Action::MoveUp => "Select previous row",
            Action::MoveDown => "Select next row",
            Action::MoveLeft => "Select previous column",
            Action::MoveRight => "Select next column",
            Action::PageUp => "Scroll one page up",
            Action::PageDown => "Scroll one page down",
            Action::GoToTop => "Go to first row",
            Action::GoToBottom => "Go to last row",
            Action::ScrollLeft => "Scroll table left",
            Action::ScrollRight => "Scroll table right",
            Action::OpenFilter => "Filter selected column",
            Action::SortAscending => "Sort selected column ascending",
            Action::SortDescending => "Sort selected column descending",
            Action::HideColumn => "Hide selected column",
            Action::OpenDetail => "Show row details",
            Action::OpenColumnSelector => "Choose columns",
            Action::OpenUpload => "Upload CSV",
            Action::Download => "Download report",
            Action::DownloadSample => "Download sample CSV",
            Action::Quit => "Quit application",
            Action::Confirm => "Confirm",
            Action::Cancel => "Cancel",
        }
    }

    /// Short label for the key hint line
    pub fn hint(&self) -> &'static str {
        match self {
            Action::OpenFilter => "Filter",
            Action::SortAscending => "Asc",
            Action::SortDescending => "Desc",
            Action::HideColumn => "Hide",
            Action::OpenDetail => "Details",
            Action::OpenColumnSelector => "Columns",
            Action::OpenUpload => "Upload",
            Action::Download => "Download",
            Action::DownloadSample => "Sample",
            Action::Quit => "Quit",
            _ => self.description(),
        }
    }

    /// Get category for grouping in help screen
    pub fn category(&self) -> ActionCategory {
        match self {
            Action::MoveUp
            | Action::MoveDown
            | Action::MoveLeft
            | Action::MoveRight
            | Action::PageUp
            | Action::PageDown
            | Action::GoToTop
            | Action::GoToBottom
            | Action::ScrollLeft
            | Action::ScrollRight => ActionCategory::Navigation,

            Action::OpenFilter
            | Action::SortAscending
            | Action::SortDescending
            | Action::HideColumn
            | Action::OpenDetail => ActionCategory::Table,

            Action::OpenColumnSelector | Action::OpenUpload => ActionCategory::Overlays,

            Action::Download | Action::DownloadSample => ActionCategory::Reports,

            Action::Quit | Action::Confirm | Action::Cancel => ActionCategory::Application,
        }
    }

    /// Get all possible actions (for validation)
    pub fn all() -> Vec<Action> {
        vec![
            Action::MoveUp,
            Action::MoveDown,
            Action::MoveLeft,
            Action::MoveRight,
            Action::PageUp,
            Action::PageDown,
            Action::GoToTop,
            Action::GoToBottom,
            Action::ScrollLeft,
            Action::ScrollRight,
            Action::OpenFilter,
            Action::SortAscending,
            Action::SortDescending,
            Action::HideColumn,
            Action::OpenDetail,
            Action::OpenColumnSelector,
            Action::OpenUpload,
            Action::Download,
            Action::DownloadSample,
            Action::Quit,
            Action::Confirm,
            Action::Cancel,
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionCategory {
    Navigation,
    Table,
    Overlays,
    Reports,
    Application,
}

impl fmt::Display for ActionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionCategory::Navigation => write!(f, "Navigation"),
            ActionCategory::Table => write!(f, "Table"),
            ActionCategory::Overlays => write!(f, "Overlays"),
            ActionCategory::Reports => write!(f, "Reports"),
            ActionCategory::Application => write!(f, "Application"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_actions_have_descriptions() {
        for action in Action::all() {
            assert!(!action.description().is_empty());
            assert!(!action.hint().is_empty());
        }
    }

    #[test]
    fn test_action_serialization() {
        let action = Action::OpenColumnSelector;
        let json = serde_json::to_string(&action).unwrap();
        assert_eq!(json, "\"OpenColumnSelector\"");

        let restored: Action = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, action);
    }
}
