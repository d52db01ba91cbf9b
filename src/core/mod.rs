pub mod models;
pub mod policy;
pub mod types;

pub use models::*;
pub use policy::{EvaluationPolicy, PolicyField, PolicyForm, ValidationReport};
pub use types::*;
