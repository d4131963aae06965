//! Test panel reports and the diagnostic plan.
//!
//! Both payloads are shallow hierarchies rendered as-is; values whose type
//! varies between backend versions are kept as raw JSON and formatted with
//! [`display_value`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The `test-reports` resource.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TestReports {
    pub test_panel_reports: Vec<TestPanelReport>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TestPanelReport {
    pub month: Option<u32>,
    pub title: Option<String>,
    pub panels: Vec<TestPanel>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TestPanel {
    pub name: String,
    pub tests: Vec<TestResult>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TestResult {
    pub marker: String,
    pub value: Value,
}

/// The `diagnostics` resource.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticPlan {
    pub diagnostic_plan_over_time: Vec<DiagnosticPhase>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticPhase {
    pub phase: Value,
    pub title: Option<String>,
    pub notes: Option<String>,
    pub monthly_plans: Vec<MonthlyPlan>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonthlyPlan {
    pub month: Option<u32>,
    pub title: Option<String>,
    pub objective: Option<String>,
    pub tests: Value,
    pub rationale: Option<String>,
}

/// Human readable rendering of a loosely typed value.
///
/// Strings are shown without quotes, arrays are comma-joined and `null`
/// (the missing marker) becomes "N/A".
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => "N/A".to_string(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(display_value).collect::<Vec<_>>().join(", "),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::normalize::parse_payload;
    use serde_json::json;

    #[test]
    fn test_reports_parse_with_mixed_values() {
        let reports: TestReports = parse_payload(
            r#"{"test_panel_reports": [
                {"month": 3, "title": "Quarterly panel", "panels": [
                    {"name": "Lipids", "tests": [
                        {"marker": "LDL", "value": 3.1},
                        {"marker": "Lp(a)", "value": "pending"},
                        {"marker": "TG", "value": NaN}
                    ]}
                ]}
            ]}"#,
        )
        .unwrap();
        let tests = &reports.test_panel_reports[0].panels[0].tests;
        assert_eq!(display_value(&tests[0].value), "3.1");
        assert_eq!(display_value(&tests[1].value), "pending");
        assert_eq!(display_value(&tests[2].value), "N/A");
    }

    #[test]
    fn test_diagnostic_plan_defaults() {
        let plan: DiagnosticPlan = serde_json::from_value(json!({
            "diagnostic_plan_over_time": [{"phase": 1, "title": "Baseline"}]
        }))
        .unwrap();
        let phase = &plan.diagnostic_plan_over_time[0];
        assert_eq!(display_value(&phase.phase), "1");
        assert!(phase.monthly_plans.is_empty());
    }

    #[test]
    fn test_display_value_array() {
        assert_eq!(display_value(&json!(["DEXA", "VO2 Max"])), "DEXA, VO2 Max");
    }
}
