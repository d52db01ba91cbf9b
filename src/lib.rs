#![allow(clippy::collapsible_if)]
#![allow(clippy::collapsible_match)]
#![allow(clippy::collapsible_else_if)]

pub mod config;
pub mod core;
pub mod logging;
pub mod services;
pub mod table;
pub mod tui;
pub mod ui;

// Re-export commonly used types
pub use core::{EvaluationPolicy, PredictResponse, Row};
pub use services::{ReportService, ServiceError};
pub use tui::{Action, ActionCategory, App};
