//! petcheck-core: contract, data and verdict logic for the pet API harness
//!
//! Everything here is pure: no network, no clock reads outside
//! [`factory::generate`]. The runner crate feeds responses in and gets
//! findings out.

pub mod assertion;
pub mod config;
pub mod contract;
pub mod envelope;
pub mod factory;
pub mod model;
pub mod report;
pub mod verdict;

pub use assertion::AssertionError;
pub use config::{Config, ConfigError};
pub use contract::{Contract, ContractError, ValidationResult, Violation, validate};
pub use envelope::{Envelope, StepRecord};
pub use factory::PetOverrides;
pub use model::{Category, Pet, PetStatus, Tag};
pub use report::{RunReport, Stage};
pub use verdict::{
    Finding, FindingKind, Severity, TOOL_ERROR_EXIT, Verdict, VerdictPolicy, VerdictStatus,
};
