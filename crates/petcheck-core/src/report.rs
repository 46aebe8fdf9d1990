//! Run report handed to external renderers
//!
//! The harness only builds this value; printing or persisting it is the
//! caller's business.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::envelope::StepRecord;
use crate::verdict::{Finding, Verdict, VerdictPolicy};

/// Lifecycle stages of one scenario run, in order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Init,
    Created,
    Fetched,
    Updated,
    PersistenceChecked,
    Filtered,
    CleanedUp,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Init => "init",
            Self::Created => "created",
            Self::Fetched => "fetched",
            Self::Updated => "updated",
            Self::PersistenceChecked => "persistence_checked",
            Self::Filtered => "filtered",
            Self::CleanedUp => "cleaned_up",
        };
        f.write_str(label)
    }
}

/// Everything one run observed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RunReport {
    /// Suite name: "lifecycle" or "robustness"
    pub suite: String,
    /// Pet id the run owned
    pub pet_id: i64,
    /// Last lifecycle stage whose checks all held
    pub stage_reached: Stage,
    pub steps: Vec<StepRecord>,
    pub findings: Vec<Finding>,
}

impl RunReport {
    #[must_use]
    pub fn new(suite: impl Into<String>, pet_id: i64) -> Self {
        Self {
            suite: suite.into(),
            pet_id,
            stage_reached: Stage::Init,
            steps: Vec::new(),
            findings: Vec::new(),
        }
    }

    #[must_use]
    pub fn verdict(&self, policy: &VerdictPolicy) -> Verdict {
        policy.verdict(&self.findings, self.steps.len())
    }
}

/// JSON Schema of [`RunReport`], for renderers consuming `--output json`.
///
/// # Errors
///
/// Returns the serializer error if the schema cannot be rendered.
pub fn generate_schema() -> Result<String, serde_json::Error> {
    let schema = schemars::schema_for!(RunReport);
    serde_json::to_string_pretty(&schema)
}
