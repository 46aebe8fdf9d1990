//! Verdict module - finding classification, severity, and policy

mod finding;
mod policy;
mod severity;

pub use finding::{Finding, FindingKind};
pub use policy::{TOOL_ERROR_EXIT, Verdict, VerdictPolicy, VerdictStatus};
pub use severity::Severity;
