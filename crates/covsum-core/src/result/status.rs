use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::CoverageReport;

/// Verdict of a job. FAIL suppresses every summary view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ResultStatus {
    Pass,
    Fail,
}

impl ResultStatus {
    /// Status of a live result.
    ///
    /// A non-blank explicit status wins, and anything other than PASS is a
    /// FAIL. Otherwise PASS requires a coverage report that passed with
    /// exactly 100% overall coverage.
    pub fn derive(explicit: Option<&str>, report: Option<&CoverageReport>) -> Self {
        if let Some(status) = explicit.filter(|s| !s.trim().is_empty()) {
            return status.parse().unwrap_or(Self::Fail);
        }
        match report {
            Some(report)
                if report.passed == Some(true)
                    && report.overall_coverage_percentage == Some(100.0) =>
            {
                Self::Pass
            }
            _ => Self::Fail,
        }
    }

    /// Status of a stored history entry.
    ///
    /// Entries saved before coverage audits existed have no report and
    /// count as PASS; a missing percentage is not treated as below 100.
    pub fn from_history_coverage(report: Option<&CoverageReport>) -> Self {
        let Some(report) = report else {
            return Self::Pass;
        };
        let below_full = report
            .overall_coverage_percentage
            .is_some_and(|pct| pct < 100.0);
        if report.passed == Some(false) || below_full {
            Self::Fail
        } else {
            Self::Pass
        }
    }

    pub fn is_pass(self) -> bool {
        self == Self::Pass
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::Fail => "FAIL",
        }
    }
}

impl fmt::Display for ResultStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResultStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "PASS" => Ok(Self::Pass),
            "FAIL" => Ok(Self::Fail),
            _ => Err(format!("Unknown result status: {value}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn report(value: serde_json::Value) -> CoverageReport {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn explicit_status_wins() {
        let failing = report(json!({"passed": false, "overall_coverage_percentage": 40.0}));
        assert_eq!(
            ResultStatus::derive(Some("pass"), Some(&failing)),
            ResultStatus::Pass
        );
        let passing = report(json!({"passed": true, "overall_coverage_percentage": 100.0}));
        assert_eq!(
            ResultStatus::derive(Some("FAIL"), Some(&passing)),
            ResultStatus::Fail
        );
    }

    #[test]
    fn derived_status_needs_full_coverage() {
        let full = report(json!({"passed": true, "overall_coverage_percentage": 100}));
        assert_eq!(ResultStatus::derive(None, Some(&full)), ResultStatus::Pass);

        let partial = report(json!({"passed": true, "overall_coverage_percentage": 99.5}));
        assert_eq!(ResultStatus::derive(None, Some(&partial)), ResultStatus::Fail);

        assert_eq!(ResultStatus::derive(None, None), ResultStatus::Fail);
        assert_eq!(ResultStatus::derive(Some("  "), Some(&full)), ResultStatus::Pass);
    }

    #[test]
    fn unknown_explicit_status_is_a_failure() {
        let full = report(json!({"passed": true, "overall_coverage_percentage": 100}));
        assert_eq!(
            ResultStatus::derive(Some("ERROR"), Some(&full)),
            ResultStatus::Fail
        );
        assert_eq!(
            ResultStatus::derive(Some("partial"), Some(&full)),
            ResultStatus::Fail
        );
    }

    #[test]
    fn history_status_rules() {
        assert_eq!(ResultStatus::from_history_coverage(None), ResultStatus::Pass);
        assert_eq!(
            ResultStatus::from_history_coverage(Some(&report(json!({"passed": false})))),
            ResultStatus::Fail
        );
        assert_eq!(
            ResultStatus::from_history_coverage(Some(&report(
                json!({"overall_coverage_percentage": 99.9})
            ))),
            ResultStatus::Fail
        );
        assert_eq!(
            ResultStatus::from_history_coverage(Some(&report(
                json!({"passed": true, "overall_coverage_percentage": 100.0})
            ))),
            ResultStatus::Pass
        );
    }
}
