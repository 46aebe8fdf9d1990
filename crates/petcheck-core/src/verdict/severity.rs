//! Finding severity and its exit-code mapping

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// How much a finding counts against the run.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Logged only: tolerated anomalies, cleanup trouble, observations
    Info,
    /// Suspicious but not a broken contract (exit 0, or 1 if strict)
    Warning,
    /// Failed assertion: status, schema, content or latency (exit 1)
    Error,
    /// No response at all from the service (exit 2)
    Critical,
}

impl Severity {
    #[must_use]
    pub const fn exit_code(self, strict: bool) -> i32 {
        match self {
            Self::Info => 0,
            Self::Warning if strict => 1,
            Self::Warning => 0,
            Self::Error => 1,
            Self::Critical => 2,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Critical => "critical",
        }
    }

    /// Whether a finding at this level fails the run.
    #[must_use]
    pub const fn is_failure(self, strict: bool) -> bool {
        self.exit_code(strict) > 0
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
