//! Findings: one classified outcome of a scenario check

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::Severity;

/// What went wrong (or was merely noticed) at a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    /// Expected status not received
    StatusMismatch,
    /// Body does not conform to the declared contract
    SchemaViolation,
    /// Body conforms but a field holds the wrong value
    ContentMismatch,
    /// Response slower than the call site's budget
    LatencyExceeded,
    /// No HTTP response at all (connect error, timeout)
    Transport,
    /// 404 on a re-read right after create/update
    KnownAnomaly,
    /// Invalid input answered with something other than 400/422
    LaxValidation,
    /// Cleanup delete neither succeeded nor found the pet gone
    CleanupFailure,
    /// Recorded service behaviour that is not judged
    Observation,
}

impl FindingKind {
    #[must_use]
    pub const fn default_severity(self) -> Severity {
        match self {
            Self::Transport => Severity::Critical,
            Self::StatusMismatch
            | Self::SchemaViolation
            | Self::ContentMismatch
            | Self::LatencyExceeded => Severity::Error,
            Self::LaxValidation => Severity::Warning,
            Self::KnownAnomaly | Self::CleanupFailure | Self::Observation => Severity::Info,
        }
    }

    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::StatusMismatch => "unexpected status code",
            Self::SchemaViolation => "response violates contract",
            Self::ContentMismatch => "response content mismatch",
            Self::LatencyExceeded => "response time budget exceeded",
            Self::Transport => "no response from service",
            Self::KnownAnomaly => "known service inconsistency (tolerated)",
            Self::LaxValidation => "invalid input not rejected",
            Self::CleanupFailure => "cleanup failed",
            Self::Observation => "observation",
        }
    }
}

impl std::fmt::Display for FindingKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.description())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Finding {
    /// Step title the finding belongs to
    pub step: String,
    pub kind: FindingKind,
    pub severity: Severity,
    pub message: String,
}

impl Finding {
    /// New finding at the kind's default severity.
    #[must_use]
    pub fn new(step: impl Into<String>, kind: FindingKind, message: impl Into<String>) -> Self {
        Self {
            step: step.into(),
            kind,
            severity: kind.default_severity(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Finding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}] {} ({}): {}",
            self.severity, self.step, self.kind, self.message
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assertion_kinds_are_errors() {
        for kind in [
            FindingKind::StatusMismatch,
            FindingKind::SchemaViolation,
            FindingKind::ContentMismatch,
            FindingKind::LatencyExceeded,
        ] {
            assert_eq!(kind.default_severity(), Severity::Error, "{kind:?}");
        }
    }

    #[test]
    fn tolerated_kinds_never_fail() {
        for kind in [
            FindingKind::KnownAnomaly,
            FindingKind::CleanupFailure,
            FindingKind::Observation,
        ] {
            assert!(!kind.default_severity().is_failure(true), "{kind:?}");
        }
    }

    #[test]
    fn lax_validation_is_a_warning() {
        let severity = FindingKind::LaxValidation.default_severity();
        assert_eq!(severity, Severity::Warning);
        assert!(severity.is_failure(true));
        assert!(!severity.is_failure(false));
    }

    #[test]
    fn transport_is_critical() {
        assert_eq!(FindingKind::Transport.default_severity(), Severity::Critical);
    }

    #[test]
    fn serializes_snake_case_kind() {
        let f = Finding::new("create", FindingKind::SchemaViolation, "bad");
        let json = serde_json::to_value(&f).unwrap();
        assert_eq!(json["kind"], "schema_violation");
        assert_eq!(json["severity"], "error");
    }
}
