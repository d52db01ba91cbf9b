use crate::core::models::default_columns;
use tracing::debug;

/// Visible column list, scoped to one report.
///
/// The list is the computed default until the user changes it, and is thrown
/// away as soon as a different report key is observed. Coming back to an
/// earlier report starts from its default again.
#[derive(Debug, Clone, Default)]
pub struct VisibleColumns {
    report_key: Option<String>,
    custom: Option<Vec<String>>,
}

impl VisibleColumns {
    pub fn new() -> Self {
        Self::default()
    }

    /// Observe the current report; a changed key resets the list
    pub fn sync_report(&mut self, report_key: &str) {
        if self.report_key.as_deref() != Some(report_key) {
            if self.report_key.is_some() {
                debug!("report changed to '{report_key}', resetting visible columns");
            }
            self.report_key = Some(report_key.to_string());
            self.custom = None;
        }
    }

    /// Columns to render for `report_key` given all report columns
    pub fn resolve(&mut self, report_key: &str, all: &[String]) -> Vec<String> {
        self.sync_report(report_key);
        match &self.custom {
            Some(cols) => cols.clone(),
            None => default_columns(all),
        }
    }

    pub fn set(&mut self, report_key: &str, cols: Vec<String>) {
        self.sync_report(report_key);
        self.custom = Some(cols);
    }

    /// Remove `column` if present. Returns whether anything changed.
    pub fn hide(&mut self, report_key: &str, all: &[String], column: &str) -> bool {
        let mut cols = self.resolve(report_key, all);
        let before = cols.len();
        cols.retain(|c| c != column);
        if cols.len() == before {
            return false;
        }
        self.set(report_key, cols);
        true
    }

    /// Column selector toggle: remove a visible column, or append a hidden one
    pub fn toggle(&mut self, report_key: &str, all: &[String], column: &str) {
        let mut cols = self.resolve(report_key, all);
        if cols.iter().any(|c| c == column) {
            cols.retain(|c| c != column);
        } else {
            cols.push(column.to_string());
        }
        self.set(report_key, cols);
    }
}
