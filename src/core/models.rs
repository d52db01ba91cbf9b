use crate::core::types::{CellValue, Row};
use serde::{Deserialize, Serialize};

/// Columns shown by default, in display order, when a report first loads
pub const PRIORITY_COLUMNS: &[&str] = &[
    "student_id",
    "risk_proba",
    "risk_level",
    "top_reasons",
    "action",
    "score_guidance",
    "remaining_absence_allowance",
];

/// Successful response of the prediction backend
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PredictResponse {
    /// Total row count reported by the backend
    pub rows: usize,
    /// Identifies this report; scopes column visibility state
    pub report_filename: String,
    /// Download path of the generated CSV, surfaced as-is
    pub report_url: String,
    #[serde(default)]
    pub data: Vec<Row>,
}

impl PredictResponse {
    pub fn report_key(&self) -> &str {
        &self.report_filename
    }

    /// All columns of the report: the key set of the first row
    pub fn columns(&self) -> Vec<String> {
        all_columns(&self.data)
    }

    /// Load a previously saved response from disk
    pub fn load_from_file(path: &std::path::Path) -> color_eyre::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// Column keys of a row set, taken from its first row
pub fn all_columns(rows: &[Row]) -> Vec<String> {
    rows.first()
        .map(|row| row.columns().map(str::to_string).collect())
        .unwrap_or_default()
}

/// Priority columns present in `all`, in priority order. Falls back to every
/// column when the report carries none of them.
pub fn default_columns(all: &[String]) -> Vec<String> {
    let picked: Vec<String> = PRIORITY_COLUMNS
        .iter()
        .filter(|c| all.iter().any(|a| a == *c))
        .map(|c| c.to_string())
        .collect();
    if picked.is_empty() {
        all.to_vec()
    } else {
        picked
    }
}

/// Human-readable label for a column key
pub fn label_of(column: &str) -> &str {
    match column {
        "student_id" => "Student ID",
        "risk_level" => "Risk",
        "risk_proba" => "Risk %",
        "top_reasons" => "Reasons",
        "action" => "Recommended action",
        "midterm_score" => "Midterm",
        "final_score" => "Final",
        "performance_score" => "Performance",
        "score_guidance" => "Score guidance",
        "assignment_count" => "Assignments",
        "participation_level" => "Participation",
        "question_count" => "Questions",
        "night_study" => "Night study",
        "behavior_score" => "Behavior",
        "absence_count" => "Absences",
        "absence_limit" => "Absence limit",
        "participation_risk_score" => "Participation risk",
        "participation_flag" => "Participation flag",
        "remaining_absence_allowance" => "Absences left",
        "at_risk" => "At risk",
        "midterm_score_missing" => "Midterm missing",
        "final_score_missing" => "Final missing",
        "performance_score_missing" => "Performance missing",
        "participation_level_num" => "Participation (num)",
        "achievement_rate" => "Achievement rate",
        other => other,
    }
}

/// Risk band of the `risk_level` column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskLevel {
    High,
    Medium,
    Low,
    Unknown,
}

impl RiskLevel {
    pub fn parse(value: &str) -> Self {
        match value {
            "High" => Self::High,
            "Medium" => Self::Medium,
            "Low" => Self::Low,
            _ => Self::Unknown,
        }
    }
}

/// Text shown in a table cell. `risk_proba` renders as a percentage.
pub fn format_cell(column: &str, value: &CellValue) -> String {
    if column == "risk_proba" {
        // Number(undefined) is NaN in the browser; keep the same look
        let pct = value.as_f64().map(|p| p * 100.0).unwrap_or(f64::NAN);
        if pct.is_nan() {
            return "NaN%".to_string();
        }
        return format!("{pct:.1}%");
    }
    value.display()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_default_columns_follow_priority_order() {
        let all = cols(&["risk_level", "midterm_score", "student_id", "action"]);
        assert_eq!(
            default_columns(&all),
            cols(&["student_id", "risk_level", "action"])
        );
    }

    #[test]
    fn test_default_columns_fall_back_to_all() {
        let all = cols(&["a", "b"]);
        assert_eq!(default_columns(&all), all);
        assert!(default_columns(&[]).is_empty());
    }

    #[test]
    fn test_format_risk_proba() {
        assert_eq!(format_cell("risk_proba", &CellValue::Number(0.7234)), "72.3%");
        assert_eq!(format_cell("risk_proba", &CellValue::from("0.5")), "50.0%");
        assert_eq!(format_cell("other", &CellValue::Number(3.0)), "3");
    }

    #[test]
    fn test_response_deserializes() {
        let json = r#"{
            "rows": 2,
            "report_filename": "report_1.csv",
            "report_url": "/api/reports/report_1.csv",
            "data": [
                {"student_id": "S1", "risk_level": "High"},
                {"student_id": "S2", "risk_level": "Low"}
            ]
        }"#;
        let resp: PredictResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.rows, 2);
        assert_eq!(resp.report_key(), "report_1.csv");
        assert_eq!(resp.columns(), cols(&["student_id", "risk_level"]));
    }

    #[test]
    fn test_label_fallback() {
        assert_eq!(label_of("risk_level"), "Risk");
        assert_eq!(label_of("custom_col"), "custom_col");
    }
}
