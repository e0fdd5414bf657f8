//! Error types for Projectdesk

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{ProjectId, TaskId};

/// Result type alias using Projectdesk's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Where an external API failure came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorOrigin {
    /// The remote answered with a failure status
    Server,
    /// No response was received (connect failure, timeout)
    Network,
    /// The request could not be constructed or the response could not be decoded
    Client,
}

impl ErrorOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorOrigin::Server => "server-error",
            ErrorOrigin::Network => "network-error",
            ErrorOrigin::Client => "client-error",
        }
    }
}

impl fmt::Display for ErrorOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized failure shape for every call to the external API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalError {
    pub origin: ErrorOrigin,
    pub message: String,
    /// HTTP status, only present for `ErrorOrigin::Server`
    pub status: Option<u16>,
}

impl ExternalError {
    pub fn server(status: u16, message: impl Into<String>) -> Self {
        Self {
            origin: ErrorOrigin::Server,
            message: message.into(),
            status: Some(status),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self {
            origin: ErrorOrigin::Network,
            message: message.into(),
            status: None,
        }
    }

    pub fn client(message: impl Into<String>) -> Self {
        Self {
            origin: ErrorOrigin::Client,
            message: message.into(),
            status: None,
        }
    }
}

impl fmt::Display for ExternalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "{} ({}, HTTP {})", self.message, self.origin, status),
            None => write!(f, "{} ({})", self.message, self.origin),
        }
    }
}

/// Projectdesk error types with helpful messages and suggestions
#[derive(Error, Debug)]
pub enum Error {
    // Input errors (E001-E099)
    #[error("Validation failed: {0}")]
    Validation(String),

    // Entity errors (E100-E199)
    #[error("Project {0} not found. Run `projectdesk projects list` to see all projects.")]
    ProjectNotFound(ProjectId),

    #[error("Task {0} not found. Run `projectdesk tasks list` to see all tasks.")]
    TaskNotFound(TaskId),

    // External API errors (E200-E299)
    #[error("External API error: {0}")]
    External(ExternalError),

    // Lifecycle errors (E300-E399)
    #[error("Operation cancelled before it settled")]
    Cancelled,
}

impl From<ExternalError> for Error {
    fn from(value: ExternalError) -> Self {
        Self::External(value)
    }
}

impl Error {
    /// Get error code for this error type
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "E001",
            Self::ProjectNotFound(_) => "E100",
            Self::TaskNotFound(_) => "E101",
            Self::External(err) => match err.origin {
                ErrorOrigin::Server => "E200",
                ErrorOrigin::Network => "E201",
                ErrorOrigin::Client => "E202",
            },
            Self::Cancelled => "E300",
        }
    }

    /// Get suggestion for how to fix this error
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::ProjectNotFound(_) => Some("projectdesk projects list".to_string()),
            Self::TaskNotFound(_) => Some("projectdesk tasks list".to_string()),
            Self::External(err) if err.origin == ErrorOrigin::Network => {
                Some("Check internet connection".to_string())
            }
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ProjectNotFound(_) | Self::TaskNotFound(_))
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Origin of an external failure, `None` for local errors
    pub fn origin(&self) -> Option<ErrorOrigin> {
        match self {
            Self::External(err) => Some(err.origin),
            _ => None,
        }
    }

    /// Whether a read may be attempted again.
    ///
    /// Transport failures, rate limiting and 5xx answers are transient; validation,
    /// not-found and other 4xx answers are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::External(err) => match err.origin {
                ErrorOrigin::Network => true,
                ErrorOrigin::Server => matches!(err.status, Some(429) | Some(500..=599)),
                ErrorOrigin::Client => false,
            },
            _ => false,
        }
    }
}
