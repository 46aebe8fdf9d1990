//! Verdict policy - folds findings into PASS/FAIL and an exit code

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{Finding, Severity};

/// Exit code when nothing could be judged (no step reached the service).
pub const TOOL_ERROR_EXIT: i32 = 3;

#[derive(Debug, Clone)]
pub struct VerdictPolicy {
    /// Strict mode: warnings fail the run
    pub strict: bool,
}

impl Default for VerdictPolicy {
    fn default() -> Self {
        Self { strict: true }
    }
}

impl VerdictPolicy {
    /// Highest exit code among findings; [`TOOL_ERROR_EXIT`] if no step ran
    /// and nothing else explains it.
    #[must_use]
    pub fn exit_code(&self, findings: &[Finding], steps_run: usize) -> i32 {
        let code = findings
            .iter()
            .map(|f| f.severity.exit_code(self.strict))
            .max()
            .unwrap_or(0);
        if code == 0 && steps_run == 0 {
            TOOL_ERROR_EXIT
        } else {
            code
        }
    }

    /// PASS requires at least one executed step and no failing finding.
    #[must_use]
    pub fn verdict(&self, findings: &[Finding], steps_run: usize) -> Verdict {
        let exit_code = self.exit_code(findings, steps_run);
        let status = if exit_code == 0 {
            VerdictStatus::Pass
        } else {
            VerdictStatus::Fail
        };

        let count = |severity: Severity| findings.iter().filter(|f| f.severity == severity).count();
        let failing = findings
            .iter()
            .filter(|f| f.severity.is_failure(self.strict))
            .count();

        let reason = if steps_run == 0 && failing == 0 {
            "No steps were executed".to_string()
        } else if failing == 0 {
            let tolerated = count(Severity::Info) + count(Severity::Warning);
            if tolerated == 0 {
                format!("All {steps_run} steps passed")
            } else {
                format!("All {steps_run} steps passed ({tolerated} tolerated findings)")
            }
        } else {
            format!(
                "{failing} failing findings ({} critical, {} error, {} warning)",
                count(Severity::Critical),
                count(Severity::Error),
                count(Severity::Warning),
            )
        };

        Verdict {
            status,
            exit_code,
            reason,
        }
    }
}

/// Final verdict
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Verdict {
    pub status: VerdictStatus,
    pub exit_code: i32,
    pub reason: String,
}

/// Pass or fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum VerdictStatus {
    Pass,
    Fail,
}

impl std::fmt::Display for VerdictStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pass => write!(f, "PASS"),
            Self::Fail => write!(f, "FAIL"),
        }
    }
}
