//! Error types shared by the registry layers

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Result type for registry operations
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Result type for backing store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Kind of entity a not-found condition refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Gateway,
    ServiceObject,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EntityKind::Gateway => "gateway",
            EntityKind::ServiceObject => "service object",
        };
        f.write_str(s)
    }
}

/// A single violated schema constraint
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    /// Path of the offending field (e.g. `streams[0].channels[1].type`)
    pub field: String,
    /// Constraint code (e.g. `length`, `range`, `required`)
    pub code: String,
    /// Human-readable reason
    pub message: String,
}

impl FieldViolation {
    pub fn new(
        field: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            code: code.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Every constraint a payload violated, in field order
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ValidationFailure {
    pub violations: Vec<FieldViolation>,
}

impl ValidationFailure {
    pub fn new(violations: Vec<FieldViolation>) -> Self {
        Self { violations }
    }

    /// Failure with exactly one violation
    pub fn single(
        field: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(vec![FieldViolation::new(field, code, message)])
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// Whether a violation was recorded for the given field path
    pub fn has_field(&self, field: &str) -> bool {
        self.violations.iter().any(|v| v.field == field)
    }
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.violations.iter().map(|v| v.to_string()).collect();
        f.write_str(&parts.join("; "))
    }
}

/// Errors raised by a backing document store
#[derive(Debug, Error)]
pub enum StoreError {
    /// File or device I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Document (de)serialization failure
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Stored data does not have the expected layout
    #[error("corrupt store: {0}")]
    Corrupt(String),
}

/// Errors returned by registry operations
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Payload failed structural schema validation
    #[error("validation failed: {0}")]
    Validation(ValidationFailure),

    /// Referenced Service Object or Gateway does not exist
    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: String },

    /// Service Object exists but has no stream with this name
    #[error("stream '{stream}' not found in service object {so_id}")]
    StreamNotFound { so_id: String, stream: String },

    /// Collection query matched zero records
    #[error("no data found: {0}")]
    NoDataFound(String),

    /// Backing store connectivity or I/O failure
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
}

impl RegistryError {
    pub fn not_found(kind: EntityKind, id: impl Into<String>) -> Self {
        RegistryError::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// True for both entity and stream not-found conditions
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            RegistryError::NotFound { .. } | RegistryError::StreamNotFound { .. }
        )
    }

    /// Returns the HTTP status code an API layer should answer with
    pub fn status_code(&self) -> u16 {
        match self {
            RegistryError::Validation(_) => 400,
            RegistryError::NotFound { .. } => 404,
            RegistryError::StreamNotFound { .. } => 400,
            RegistryError::NoDataFound(_) => 400,
            RegistryError::Storage(_) => 500,
        }
    }
}

impl From<ValidationFailure> for RegistryError {
    fn from(failure: ValidationFailure) -> Self {
        RegistryError::Validation(failure)
    }
}
