//! Declarative payload contracts and the closed-schema validator
//!
//! A [`Contract`] lists the fields an object may carry, their shapes and
//! whether they are required. It exports itself as a closed JSON Schema, which
//! [`validate`] compiles once and runs against a payload, collecting every
//! violation instead of stopping at the first one.

use std::fmt::Write as _;
use std::sync::{LazyLock, OnceLock};

use jsonschema::error::{TypeKind, ValidationErrorKind};
use jsonschema::paths::{Location, LocationSegment};
use jsonschema::{JsonType, ValidationError, Validator};
use serde::Serialize;
use serde_json::{Map, Value, json};

/// Shape a field value must have.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shape {
    /// JSON number without a fractional part (`12345.0` counts)
    Integer,
    String,
    /// String restricted to an exact, case-sensitive set
    Enum(&'static [&'static str]),
    Array(Box<Shape>),
    Object(Contract),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub shape: Shape,
    pub required: bool,
}

impl Field {
    #[must_use]
    pub const fn required(name: &'static str, shape: Shape) -> Self {
        Self {
            name,
            shape,
            required: true,
        }
    }

    #[must_use]
    pub const fn optional(name: &'static str, shape: Shape) -> Self {
        Self {
            name,
            shape,
            required: false,
        }
    }
}

/// Closed object schema: fields not listed here are violations.
pub struct Contract {
    pub title: &'static str,
    pub fields: Vec<Field>,
    /// Compiled form of [`Contract::to_json_schema`], built on first use
    compiled: OnceLock<Result<Validator, String>>,
}

impl Contract {
    #[must_use]
    pub fn new(title: &'static str, fields: Vec<Field>) -> Self {
        Self {
            title,
            fields,
            compiled: OnceLock::new(),
        }
    }

    fn validator(&self) -> Result<&Validator, &str> {
        self.compiled
            .get_or_init(|| {
                jsonschema::validator_for(&self.to_json_schema()).map_err(|e| e.to_string())
            })
            .as_ref()
            .map_err(String::as_str)
    }

    /// Export as a standalone JSON Schema document.
    #[must_use]
    pub fn to_json_schema(&self) -> Value {
        let mut schema = object_schema(self);
        if let Value::Object(ref mut obj) = schema {
            obj.insert(
                "$schema".into(),
                json!("https://json-schema.org/draft/2020-12/schema"),
            );
            obj.insert("title".into(), json!(self.title));
        }
        schema
    }
}

impl std::fmt::Debug for Contract {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Contract")
            .field("title", &self.title)
            .field("fields", &self.fields)
            .finish_non_exhaustive()
    }
}

impl Clone for Contract {
    fn clone(&self) -> Self {
        Self::new(self.title, self.fields.clone())
    }
}

impl PartialEq for Contract {
    fn eq(&self, other: &Self) -> bool {
        self.title == other.title && self.fields == other.fields
    }
}

impl Eq for Contract {}

fn object_schema(contract: &Contract) -> Value {
    let mut properties = Map::new();
    for field in &contract.fields {
        properties.insert(field.name.to_string(), shape_schema(&field.shape));
    }
    let required: Vec<&str> = contract
        .fields
        .iter()
        .filter(|f| f.required)
        .map(|f| f.name)
        .collect();
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
        "additionalProperties": false,
    })
}

fn shape_schema(shape: &Shape) -> Value {
    match shape {
        Shape::Integer => json!({"type": "integer"}),
        Shape::String => json!({"type": "string"}),
        Shape::Enum(values) => json!({"type": "string", "enum": values}),
        Shape::Array(items) => json!({"type": "array", "items": shape_schema(items)}),
        Shape::Object(contract) => object_schema(contract),
    }
}

/// Status values accepted by the pet contract.
pub const PET_STATUSES: &[&str] = &["available", "pending", "sold"];

static PET_CONTRACT: LazyLock<Contract> = LazyLock::new(|| {
    let id_name = || {
        Contract::new(
            "IdName",
            vec![
                Field::optional("id", Shape::Integer),
                Field::optional("name", Shape::String),
            ],
        )
    };
    Contract::new(
        "Pet",
        vec![
            Field::required("id", Shape::Integer),
            Field::optional("category", Shape::Object(id_name())),
            Field::required("name", Shape::String),
            Field::required("photoUrls", Shape::Array(Box::new(Shape::String))),
            Field::optional(
                "tags",
                Shape::Array(Box::new(Shape::Object(id_name()))),
            ),
            Field::required("status", Shape::Enum(PET_STATUSES)),
        ],
    )
});

static API_RESPONSE_CONTRACT: LazyLock<Contract> = LazyLock::new(|| {
    Contract::new(
        "ApiResponse",
        vec![
            Field::optional("code", Shape::Integer),
            Field::optional("type", Shape::String),
            Field::optional("message", Shape::String),
        ],
    )
});

/// Contract for a pet record.
#[must_use]
pub fn pet_contract() -> &'static Contract {
    &PET_CONTRACT
}

/// Contract for the service's generic `{code, type, message}` reply.
#[must_use]
pub fn api_response_contract() -> &'static Contract {
    &API_RESPONSE_CONTRACT
}

/// One offending field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    /// Dotted/indexed path, e.g. `tags[1].name`; `$` for the payload root
    pub path: String,
    pub reason: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "\"{}\" {}", self.path, self.reason)
    }
}

/// Outcome of one validation call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub violations: Vec<Violation>,
}

impl ValidationResult {
    /// Hard-stop form: any violation becomes an error carrying all of them.
    ///
    /// # Errors
    ///
    /// Returns [`ContractError`] when at least one violation was found.
    pub fn into_result(self, contract: &Contract) -> Result<(), ContractError> {
        if self.valid {
            Ok(())
        } else {
            Err(ContractError {
                contract: contract.title.to_string(),
                violations: self.violations,
            })
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Schema validation failed ({contract}):\n{}", render_lines(.violations))]
pub struct ContractError {
    pub contract: String,
    pub violations: Vec<Violation>,
}

fn render_lines(violations: &[Violation]) -> String {
    let mut out = String::new();
    for (idx, v) in violations.iter().enumerate() {
        if idx > 0 {
            out.push('\n');
        }
        let _ = write!(out, "  {v}");
    }
    out
}

/// Validate `payload` against `contract`, accumulating every violation.
///
/// Violations are ordered by path.
#[must_use]
pub fn validate(payload: &Value, contract: &Contract) -> ValidationResult {
    let mut violations = match contract.validator() {
        Ok(validator) => validator
            .iter_errors(payload)
            .flat_map(|error| to_violations(&error))
            .collect(),
        Err(reason) => vec![Violation {
            path: ROOT.to_string(),
            reason: format!("contract {} does not compile: {reason}", contract.title),
        }],
    };
    violations.sort_by(|a, b| a.path.cmp(&b.path));
    ValidationResult {
        valid: violations.is_empty(),
        violations,
    }
}

const ROOT: &str = "$";

fn to_violations(error: &ValidationError<'_>) -> Vec<Violation> {
    let path = instance_path(error.instance_path());
    let at = |reason: String| Violation {
        path: path.clone(),
        reason,
    };

    match error.kind() {
        ValidationErrorKind::Required { property } => {
            let key = property.as_str().map_or_else(|| property.to_string(), str::to_string);
            vec![Violation {
                path: join_key(&path, &key),
                reason: "is required".to_string(),
            }]
        }
        ValidationErrorKind::AdditionalProperties { unexpected } => unexpected
            .iter()
            .map(|key| Violation {
                path: join_key(&path, key),
                reason: "is not allowed".to_string(),
            })
            .collect(),
        ValidationErrorKind::Enum { options } => {
            let allowed: Vec<String> = options
                .as_array()
                .map(|values| {
                    values
                        .iter()
                        .map(|v| v.as_str().map_or_else(|| v.to_string(), str::to_string))
                        .collect()
                })
                .unwrap_or_default();
            vec![at(format!(
                "must be one of [{}], got {}",
                allowed.join(", "),
                error.instance()
            ))]
        }
        ValidationErrorKind::Type {
            kind: TypeKind::Single(expected),
        } => vec![at(format!(
            "must be {}, got {}",
            with_article(*expected),
            json_type(error.instance())
        ))],
        _ => vec![at(error.to_string())],
    }
}

/// `/tags/1/name` becomes `tags[1].name`; the empty pointer is the root.
fn instance_path(location: &Location) -> String {
    let mut out = String::new();
    for segment in location.iter() {
        match segment {
            LocationSegment::Index(idx) => {
                let _ = write!(out, "[{idx}]");
            }
            LocationSegment::Property(key) => out = join_key(&out, &key),
        }
    }
    if out.is_empty() {
        ROOT.to_string()
    } else {
        out
    }
}

fn join_key(path: &str, key: &str) -> String {
    if path.is_empty() || path == ROOT {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

fn with_article(expected: JsonType) -> String {
    match expected {
        JsonType::Array | JsonType::Integer | JsonType::Object => format!("an {expected}"),
        JsonType::Null => expected.to_string(),
        _ => format!("a {expected}"),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
