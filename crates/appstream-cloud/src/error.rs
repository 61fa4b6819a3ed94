//! Cloud API error types

use std::collections::BTreeMap;
use thiserror::Error;

/// Error code returned when a looked-up resource does not exist
pub const RESOURCE_NOT_FOUND: &str = "ResourceNotFoundException";
/// Error code returned when a create collides with an existing name
pub const RESOURCE_ALREADY_EXISTS: &str = "ResourceAlreadyExistsException";
/// Error code returned when another mutation is in flight
pub const CONCURRENT_MODIFICATION: &str = "ConcurrentModificationException";
/// Error code returned when the current state forbids the action
pub const OPERATION_NOT_PERMITTED: &str = "OperationNotPermittedException";
/// Error code returned when a dependency is not ready yet
pub const RESOURCE_NOT_AVAILABLE: &str = "ResourceNotAvailableException";

/// Cloud API errors
#[derive(Error, Debug)]
pub enum CloudError {
    /// A structured error returned by the cloud API.
    #[error("{operation}: {}{message}", code_prefix(.code))]
    Api {
        operation: &'static str,
        code: Option<String>,
        message: String,
    },

    /// The per-resource failure map of a tagging call was not empty.
    #[error("tagging {arn} failed: {}", format_failures(.failures))]
    Tagging {
        arn: String,
        failures: BTreeMap<String, TagFailure>,
    },

    /// The resource is in a state the caller has to wait out.
    #[error("unexpected state '{actual}', wanted '{expected}'")]
    UnexpectedState { expected: String, actual: String },

    #[error("context canceled")]
    Canceled,

    #[error("context deadline exceeded")]
    DeadlineExceeded,

    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<CloudError>,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A single failure entry reported by a tagging call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagFailure {
    pub status_code: Option<i32>,
    pub error_code: Option<String>,
    pub error_message: Option<String>,
}

fn code_prefix(code: &Option<String>) -> String {
    code.as_deref().map(|c| format!("{c}: ")).unwrap_or_default()
}

fn format_failures(failures: &BTreeMap<String, TagFailure>) -> String {
    failures
        .iter()
        .map(|(arn, f)| {
            format!(
                "{}: {} {}",
                arn,
                f.error_code.as_deref().unwrap_or("UnknownError"),
                f.error_message.as_deref().unwrap_or_default()
            )
        })
        .collect::<Vec<_>>()
        .join("; ")
}

impl CloudError {
    pub fn api(
        operation: &'static str,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        CloudError::Api {
            operation,
            code: Some(code.into()),
            message: message.into(),
        }
    }

    pub fn unexpected_state(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        CloudError::UnexpectedState {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Wrap the error with a description of what was being attempted
    pub fn context(self, context: impl Into<String>) -> Self {
        CloudError::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// The cloud error code carried directly by this error, if any
    pub fn code(&self) -> Option<&str> {
        match self {
            CloudError::Api { code, .. } => code.as_deref(),
            CloudError::Tagging { failures, .. } => {
                failures.values().find_map(|f| f.error_code.as_deref())
            }
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, CloudError>;
