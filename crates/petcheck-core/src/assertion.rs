//! Response assertions: status, content, latency and filter predicates
//!
//! Every check returns on its first failure with an error naming the
//! offending field. Transport-level (status) and content-level failures are
//! distinct variants so callers can tell them apart.

use serde_json::Value;

use crate::envelope::Envelope;
use crate::model::{Pet, PetStatus, Tag};
use crate::verdict::FindingKind;

/// Default per-request latency budget.
pub const DEFAULT_LATENCY_BUDGET_MS: f64 = 2000.0;
/// Budget for filter queries, which return larger payloads.
pub const SEARCH_LATENCY_BUDGET_MS: f64 = 3000.0;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AssertionError {
    #[error("{step}: status code should be {expected}, got {actual}")]
    StatusMismatch {
        step: String,
        expected: u16,
        actual: u16,
    },
    #[error("{field} should match: expected {expected}, got {actual}")]
    FieldMismatch {
        field: String,
        expected: String,
        actual: String,
    },
    #[error("{field} is missing from the response")]
    MissingField { field: String },
    #[error("{field} should be {expected}, got {actual}")]
    WrongType {
        field: String,
        expected: &'static str,
        actual: String,
    },
    #[error("response time should be less than {budget_ms}ms, took {duration_ms:.1}ms")]
    LatencyExceeded { duration_ms: f64, budget_ms: f64 },
    #[error("filter by {queried}: entry [{index}] (id {id}) has status {actual}")]
    FilterContamination {
        queried: PetStatus,
        index: usize,
        id: String,
        actual: String,
    },
    #[error("filter by {queried}: id {id} not among {count} returned entries")]
    MissingFromFilter {
        queried: PetStatus,
        id: i64,
        count: usize,
    },
}

impl AssertionError {
    /// Finding class this failure is reported under.
    #[must_use]
    pub const fn kind(&self) -> FindingKind {
        match self {
            Self::StatusMismatch { .. } => FindingKind::StatusMismatch,
            Self::LatencyExceeded { .. } => FindingKind::LatencyExceeded,
            Self::FieldMismatch { .. }
            | Self::MissingField { .. }
            | Self::WrongType { .. }
            | Self::FilterContamination { .. }
            | Self::MissingFromFilter { .. } => FindingKind::ContentMismatch,
        }
    }
}

/// Status must equal `expected` exactly.
///
/// # Errors
///
/// [`AssertionError::StatusMismatch`] naming `step`.
pub fn assert_status(step: &str, envelope: &Envelope, expected: u16) -> Result<(), AssertionError> {
    if envelope.status == expected {
        Ok(())
    } else {
        Err(AssertionError::StatusMismatch {
            step: step.to_string(),
            expected,
            actual: envelope.status,
        })
    }
}

/// Compare a response body against the expected pet snapshot.
///
/// `id`, `name`, `status` are exact; `category` and `tags` are deep-equal
/// (tags order-sensitive) when the snapshot carries them; `photoUrls` only
/// has to be an array.
///
/// # Errors
///
/// The first failing check.
pub fn assert_matches(actual: &Value, expected: &Pet) -> Result<(), AssertionError> {
    let id = require(actual, "id")?;
    if as_integer(id) != Some(expected.id) {
        return Err(mismatch("id", &expected.id.to_string(), id));
    }

    let name = require(actual, "name")?;
    if name.as_str() != Some(expected.name.as_str()) {
        return Err(mismatch("name", &quoted(&expected.name), name));
    }

    let status = require(actual, "status")?;
    if status.as_str() != Some(expected.status.as_str()) {
        return Err(mismatch("status", &quoted(expected.status.as_str()), status));
    }

    let photo_urls = require(actual, "photoUrls")?;
    if !photo_urls.is_array() {
        return Err(AssertionError::WrongType {
            field: "photoUrls".to_string(),
            expected: "an array",
            actual: describe(photo_urls),
        });
    }

    if let Some(category) = &expected.category {
        let want = category.to_json();
        let got = require(actual, "category")?;
        if !same_json(got, &want) {
            return Err(mismatch("category", &want.to_string(), got));
        }
    }

    if let Some(tags) = &expected.tags {
        let want: Value = tags.iter().map(Tag::to_json).collect();
        let got = require(actual, "tags")?;
        if !same_json(got, &want) {
            return Err(mismatch("tags", &want.to_string(), got));
        }
    }

    Ok(())
}

/// Latency must stay strictly under the budget.
///
/// # Errors
///
/// [`AssertionError::LatencyExceeded`] when `duration_ms >= budget_ms`.
pub fn assert_latency(duration_ms: f64, budget_ms: f64) -> Result<(), AssertionError> {
    if duration_ms < budget_ms {
        Ok(())
    } else {
        Err(AssertionError::LatencyExceeded {
            duration_ms,
            budget_ms,
        })
    }
}

/// Body must be a JSON array; returns its entries.
///
/// # Errors
///
/// [`AssertionError::WrongType`] for any other body.
pub fn assert_array(envelope: &Envelope) -> Result<&[Value], AssertionError> {
    envelope
        .body
        .as_array()
        .map(Vec::as_slice)
        .ok_or_else(|| AssertionError::WrongType {
            field: "body".to_string(),
            expected: "an array",
            actual: describe(&envelope.body),
        })
}

/// Every entry must carry exactly the queried status.
///
/// # Errors
///
/// [`AssertionError::FilterContamination`] for the first offending entry.
pub fn assert_all_have_status(entries: &[Value], queried: PetStatus) -> Result<(), AssertionError> {
    for (index, entry) in entries.iter().enumerate() {
        let status = entry.get("status");
        if status.and_then(Value::as_str) != Some(queried.as_str()) {
            return Err(AssertionError::FilterContamination {
                queried,
                index,
                id: entry
                    .get("id")
                    .map_or_else(|| "?".to_string(), Value::to_string),
                actual: status.map_or_else(|| "<missing>".to_string(), Value::to_string),
            });
        }
    }
    Ok(())
}

/// Returns the entry whose `id` equals `id`.
///
/// # Errors
///
/// [`AssertionError::MissingFromFilter`] when no entry matches.
pub fn assert_contains_id(
    entries: &[Value],
    id: i64,
    queried: PetStatus,
) -> Result<&Value, AssertionError> {
    entries
        .iter()
        .find(|entry| entry.get("id").and_then(as_integer) == Some(id))
        .ok_or(AssertionError::MissingFromFilter {
            queried,
            id,
            count: entries.len(),
        })
}

/// Integer value of a JSON number, accepting integral floats like `12345.0`.
#[allow(clippy::cast_possible_truncation)]
fn as_integer(value: &Value) -> Option<i64> {
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.fract() == 0.0 && f.abs() < 9.0e15)
            .map(|f| f as i64)
    })
}

/// Structural equality where numbers compare by value, so `1.0` equals `1`.
fn same_json(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(_), Value::Number(_)) => match (as_integer(a), as_integer(b)) {
            (Some(x), Some(y)) => x == y,
            _ => a.as_f64() == b.as_f64(),
        },
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| same_json(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(key, x)| ys.get(key).is_some_and(|y| same_json(x, y)))
        }
        _ => a == b,
    }
}

fn require<'a>(actual: &'a Value, field: &str) -> Result<&'a Value, AssertionError> {
    actual.get(field).ok_or_else(|| AssertionError::MissingField {
        field: field.to_string(),
    })
}

fn mismatch(field: &str, expected: &str, actual: &Value) -> AssertionError {
    AssertionError::FieldMismatch {
        field: field.to_string(),
        expected: expected.to_string(),
        actual: actual.to_string(),
    }
}

fn quoted(s: &str) -> String {
    format!("\"{s}\"")
}

fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(_) => "a boolean".to_string(),
        Value::Number(_) => "a number".to_string(),
        Value::String(_) => "a string".to_string(),
        Value::Array(_) => "an array".to_string(),
        Value::Object(_) => "an object".to_string(),
    }
}
