//! Normalized HTTP response and the per-step log record derived from it

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Serialized bodies at or above this size are summarised instead of shown.
pub const BODY_EXCERPT_LIMIT: usize = 500;

/// Status, elapsed time and body of any response, whatever its status class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub status: u16,
    pub duration_ms: f64,
    /// Parsed JSON; non-JSON text is kept as a string, an empty body is `null`
    pub body: serde_json::Value,
}

impl Envelope {
    /// Build from raw response text.
    #[must_use]
    pub fn from_text(status: u16, duration_ms: f64, text: &str) -> Self {
        let body = if text.trim().is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_str(text)
                .unwrap_or_else(|_| serde_json::Value::String(text.to_string()))
        };
        Self {
            status,
            duration_ms,
            body,
        }
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Body rendering for logs: short 2xx bodies verbatim, long ones
    /// summarised, error bodies cut to the same limit.
    #[must_use]
    pub fn body_excerpt(&self) -> String {
        let text = match &self.body {
            serde_json::Value::Null => return String::new(),
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        let len = text.chars().count();
        if len < BODY_EXCERPT_LIMIT {
            text
        } else if self.is_success() {
            format!("[Large response - {len} characters]")
        } else {
            let cut: String = text.chars().take(BODY_EXCERPT_LIMIT).collect();
            format!("{cut}…({len} characters total)")
        }
    }
}

/// Structured line emitted for each scenario step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StepRecord {
    pub title: String,
    pub status: u16,
    pub duration_ms: f64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub body_excerpt: String,
}

impl StepRecord {
    #[must_use]
    pub fn from_envelope(title: impl Into<String>, envelope: &Envelope) -> Self {
        Self {
            title: title.into(),
            status: envelope.status,
            duration_ms: envelope.duration_ms,
            body_excerpt: envelope.body_excerpt(),
        }
    }
}
