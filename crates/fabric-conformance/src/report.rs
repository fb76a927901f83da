//! Conformance run results.

use serde::Serialize;
use std::fmt;

/// Outcome of one vector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaseResult {
    /// Vector description from the file
    pub description: String,
    pub passed: bool,
    /// First mismatch, when failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl CaseResult {
    pub(crate) fn from_check(description: &str, check: Result<(), String>) -> Self {
        let detail = check.err();
        Self {
            description: description.to_string(),
            passed: detail.is_none(),
            detail,
        }
    }
}

/// Results for one suite, in file order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuiteReport {
    /// Suite path in the vector file, e.g. `encryption.xchacha20_poly1305`
    pub name: &'static str,
    pub cases: Vec<CaseResult>,
}

impl SuiteReport {
    pub fn passed(&self) -> usize {
        self.cases.iter().filter(|c| c.passed).count()
    }

    pub fn failed(&self) -> usize {
        self.cases.len() - self.passed()
    }

    pub fn is_success(&self) -> bool {
        self.cases.iter().all(|c| c.passed)
    }
}

/// Results of a full run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConformanceReport {
    pub suites: Vec<SuiteReport>,
}

impl ConformanceReport {
    /// True only if every case in every suite passed.
    pub fn is_conformant(&self) -> bool {
        self.suites.iter().all(SuiteReport::is_success)
    }

    pub fn total(&self) -> usize {
        self.suites.iter().map(|s| s.cases.len()).sum()
    }

    pub fn passed(&self) -> usize {
        self.suites.iter().map(SuiteReport::passed).sum()
    }

    pub fn failed(&self) -> usize {
        self.total() - self.passed()
    }

    /// Failed cases with their suite name.
    pub fn failures(&self) -> impl Iterator<Item = (&'static str, &CaseResult)> + '_ {
        self.suites
            .iter()
            .flat_map(|s| s.cases.iter().map(move |c| (s.name, c)))
            .filter(|(_, c)| !c.passed)
    }

    /// Suite by name.
    pub fn suite(&self, name: &str) -> Option<&SuiteReport> {
        self.suites.iter().find(|s| s.name == name)
    }
}

impl fmt::Display for ConformanceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for suite in &self.suites {
            writeln!(f, "{} ({}/{})", suite.name, suite.passed(), suite.cases.len())?;
            for case in &suite.cases {
                let mark = if case.passed { "PASS" } else { "FAIL" };
                write!(f, "  [{mark}] {}", case.description)?;
                if let Some(detail) = &case.detail {
                    write!(f, ": {detail}")?;
                }
                writeln!(f)?;
            }
        }
        write!(
            f,
            "{} passed, {} failed, {} total",
            self.passed(),
            self.failed(),
            self.total()
        )
    }
}
