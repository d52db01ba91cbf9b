//! Evaluation policy submitted alongside an uploaded CSV.
//!
//! The form keeps raw text for every field; numbers are parsed on demand and
//! validated as a whole so that all problems can be listed at once.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use strum::{Display, EnumIter, IntoEnumIterator};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvaluationPolicy {
    /// Risk threshold, strictly between 0 and 1
    pub threshold: f64,
    pub midterm_max: f64,
    /// Percent
    pub midterm_weight: f64,
    pub final_max: f64,
    pub final_weight: f64,
    pub performance_max: f64,
    pub performance_weight: f64,
    pub total_classes: f64,
}

impl Default for EvaluationPolicy {
    fn default() -> Self {
        Self {
            threshold: 0.4,
            midterm_max: 100.0,
            midterm_weight: 40.0,
            final_max: 100.0,
            final_weight: 40.0,
            performance_max: 100.0,
            performance_weight: 20.0,
            total_classes: 160.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumIter)]
pub enum PolicyField {
    #[strum(to_string = "Threshold")]
    Threshold,
    #[strum(to_string = "Total classes")]
    TotalClasses,
    #[strum(to_string = "Midterm max")]
    MidtermMax,
    #[strum(to_string = "Midterm weight (%)")]
    MidtermWeight,
    #[strum(to_string = "Final max")]
    FinalMax,
    #[strum(to_string = "Final weight (%)")]
    FinalWeight,
    #[strum(to_string = "Performance max")]
    PerformanceMax,
    #[strum(to_string = "Performance weight (%)")]
    PerformanceWeight,
}

impl PolicyField {
    pub const WEIGHTS: [PolicyField; 3] = [
        PolicyField::MidtermWeight,
        PolicyField::FinalWeight,
        PolicyField::PerformanceWeight,
    ];

    /// Whether the field accepts a decimal point
    pub fn is_decimal(&self) -> bool {
        matches!(self, PolicyField::Threshold)
    }
}

/// Raw text of every policy field as typed by the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyForm {
    pub threshold: String,
    pub midterm_max: String,
    pub midterm_weight: String,
    pub final_max: String,
    pub final_weight: String,
    pub performance_max: String,
    pub performance_weight: String,
    pub total_classes: String,
}

impl Default for PolicyForm {
    fn default() -> Self {
        Self {
            threshold: "0.4".to_string(),
            midterm_max: "100".to_string(),
            midterm_weight: "40".to_string(),
            final_max: "100".to_string(),
            final_weight: "40".to_string(),
            performance_max: "100".to_string(),
            performance_weight: "20".to_string(),
            total_classes: "160".to_string(),
        }
    }
}

/// Outcome of validating a form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub errors: Vec<String>,
    pub field_errors: BTreeSet<PolicyField>,
}

impl ValidationReport {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has_error(&self, field: PolicyField) -> bool {
        self.field_errors.contains(&field)
    }
}

/// Browser-style numeric conversion: blank text is zero, anything else must parse fully
fn to_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Some(0.0);
    }
    trimmed.parse::<f64>().ok().filter(|n| !n.is_nan())
}

impl PolicyForm {
    pub fn get(&self, field: PolicyField) -> &str {
        match field {
            PolicyField::Threshold => &self.threshold,
            PolicyField::TotalClasses => &self.total_classes,
            PolicyField::MidtermMax => &self.midterm_max,
            PolicyField::MidtermWeight => &self.midterm_weight,
            PolicyField::FinalMax => &self.final_max,
            PolicyField::FinalWeight => &self.final_weight,
            PolicyField::PerformanceMax => &self.performance_max,
            PolicyField::PerformanceWeight => &self.performance_weight,
        }
    }

    pub fn set(&mut self, field: PolicyField, value: impl Into<String>) {
        let value = value.into();
        match field {
            PolicyField::Threshold => self.threshold = value,
            PolicyField::TotalClasses => self.total_classes = value,
            PolicyField::MidtermMax => self.midterm_max = value,
            PolicyField::MidtermWeight => self.midterm_weight = value,
            PolicyField::FinalMax => self.final_max = value,
            PolicyField::FinalWeight => self.final_weight = value,
            PolicyField::PerformanceMax => self.performance_max = value,
            PolicyField::PerformanceWeight => self.performance_weight = value,
        }
    }

    /// Parse every field; `None` if any of them is not numeric
    pub fn to_policy(&self) -> Option<EvaluationPolicy> {
        Some(EvaluationPolicy {
            threshold: to_number(&self.threshold)?,
            midterm_max: to_number(&self.midterm_max)?,
            midterm_weight: to_number(&self.midterm_weight)?,
            final_max: to_number(&self.final_max)?,
            final_weight: to_number(&self.final_weight)?,
            performance_max: to_number(&self.performance_max)?,
            performance_weight: to_number(&self.performance_weight)?,
            total_classes: to_number(&self.total_classes)?,
        })
    }

    pub fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport::default();

        let Some(policy) = self.to_policy() else {
            for field in PolicyField::iter() {
                if to_number(self.get(field)).is_none() {
                    report.field_errors.insert(field);
                }
            }
            report.errors.push("Fill every field with a number.".to_string());
            return report;
        };

        if policy.threshold <= 0.0 || policy.threshold >= 1.0 {
            report.field_errors.insert(PolicyField::Threshold);
            report
                .errors
                .push("Threshold must be between 0 and 1 (e.g. 0.4).".to_string());
        }
        let maxima = [
            (PolicyField::MidtermMax, policy.midterm_max, "Midterm max"),
            (PolicyField::FinalMax, policy.final_max, "Final max"),
            (PolicyField::PerformanceMax, policy.performance_max, "Performance max"),
            (PolicyField::TotalClasses, policy.total_classes, "Total classes"),
        ];
        for (field, value, name) in maxima {
            if value <= 0.0 {
                report.field_errors.insert(field);
                report.errors.push(format!("{name} must be at least 1."));
            }
        }

        let sum = policy.midterm_weight + policy.final_weight + policy.performance_weight;
        if sum != 100.0 {
            report.field_errors.extend(PolicyField::WEIGHTS);
            report
                .errors
                .push(format!("Weights must add up to 100 (currently {sum})."));
        }

        let weights = [
            (PolicyField::MidtermWeight, policy.midterm_weight),
            (PolicyField::FinalWeight, policy.final_weight),
            (PolicyField::PerformanceWeight, policy.performance_weight),
        ];
        if weights.iter().any(|(_, w)| *w < 0.0) {
            for (field, w) in weights {
                if w < 0.0 {
                    report.field_errors.insert(field);
                }
            }
            report.errors.push("Weights cannot be negative.".to_string());
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_form_is_valid() {
        let form = PolicyForm::default();
        assert!(form.validate().is_ok());
        let policy = form.to_policy().unwrap();
        assert_eq!(policy.threshold, 0.4);
        assert_eq!(policy.total_classes, 160.0);
        assert_eq!(policy, EvaluationPolicy::default());
    }

    #[test]
    fn test_non_numeric_flags_only_bad_fields() {
        let mut form = PolicyForm::default();
        form.set(PolicyField::FinalMax, "abc");
        let report = form.validate();
        assert_eq!(report.errors.len(), 1);
        assert!(report.has_error(PolicyField::FinalMax));
        assert_eq!(report.field_errors.len(), 1);
    }

    #[test]
    fn test_weight_sum_flags_all_weights() {
        let mut form = PolicyForm::default();
        form.set(PolicyField::MidtermWeight, "50");
        let report = form.validate();
        assert!(report.errors.iter().any(|e| e.contains("110")));
        for field in PolicyField::WEIGHTS {
            assert!(report.has_error(field));
        }
        assert!(!report.has_error(PolicyField::Threshold));
    }

    #[test]
    fn test_threshold_bounds_and_negative_weight() {
        let mut form = PolicyForm::default();
        form.set(PolicyField::Threshold, "1");
        form.set(PolicyField::PerformanceWeight, "-10");
        form.set(PolicyField::FinalWeight, "70");
        let report = form.validate();
        assert!(report.has_error(PolicyField::Threshold));
        assert!(report.has_error(PolicyField::PerformanceWeight));
        assert!(report.errors.iter().any(|e| e.contains("negative")));
    }

    #[test]
    fn test_blank_counts_as_zero() {
        let mut form = PolicyForm::default();
        form.set(PolicyField::TotalClasses, "  ");
        let report = form.validate();
        assert!(report.has_error(PolicyField::TotalClasses));
        assert_eq!(report.errors, vec!["Total classes must be at least 1.".to_string()]);
    }
}
