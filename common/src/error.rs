use std::collections::HashMap;
use std::fmt;

use serde::{Serialize, Serializer};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    Ebadrequest,
    Enotfound,
    Einternal,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ebadrequest => write!(f, "bad_request"),
            Self::Enotfound => write!(f, "not_found"),
            Self::Einternal => write!(f, "internal"),
        }
    }
}

impl Serialize for ErrorCode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

/// Per-field validation failure attached to a [`CompositeError`].
#[derive(Debug, Clone, Serialize)]
pub struct ErrorDetail {
    pub code: ErrorCode,
    pub message: String,
}

/// Error returned by every endpoint: a top-level message plus optional
/// per-field details keyed by request field name.
#[derive(Debug, Clone)]
pub struct CompositeError {
    pub code: ErrorCode,
    pub message: String,
    pub errors: HashMap<String, ErrorDetail>,
}

impl fmt::Display for CompositeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CompositeError {}

impl CompositeError {
    #[must_use]
    pub fn new(code: ErrorCode, message: &str) -> Self {
        Self {
            code,
            message: message.to_string(),
            errors: HashMap::new(),
        }
    }

    pub fn add_detail(&mut self, field: &str, code: ErrorCode, message: &str) {
        self.errors.insert(
            field.to_string(),
            ErrorDetail {
                code,
                message: message.to_string(),
            },
        );
    }

    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}
