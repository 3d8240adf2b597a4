use bridge_traits::error::BridgeError;
use core_runtime::config::SourceId;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// One structural problem found in a bookmark document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Location inside the document, e.g. `bookmarks[2].children[0].url`
    pub path: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

fn join_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Bookmark source {source_id} is not configured (missing: {})", .missing.join(", "))]
    ConfigurationMissing {
        source_id: SourceId,
        missing: Vec<&'static str>,
    },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Repository not found: {0}")]
    RepositoryNotFound(String),

    #[error("Bookmark data not found: {0}")]
    DataNotFound(String),

    #[error("Bookmark data is not valid: {}", join_issues(.issues))]
    SchemaInvalid { issues: Vec<ValidationIssue> },

    #[error("Unexpected HTTP status {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Failed to parse bookmark document: {0}")]
    Parse(String),

    #[error("Bookmarks bar not found")]
    BarNotFound,

    #[error("Invalid stage transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Host bridge error: {0}")]
    Bridge(#[from] BridgeError),
}

impl SyncError {
    /// Project onto the closed set of outcomes that drive recovery behavior
    pub fn kind(&self) -> ErrorKind {
        match self {
            SyncError::ConfigurationMissing { .. } => ErrorKind::ConfigurationMissing,
            SyncError::AuthenticationFailed(_) => ErrorKind::AuthenticationFailed,
            SyncError::RepositoryNotFound(_) => ErrorKind::RepositoryNotFound,
            SyncError::DataNotFound(_) => ErrorKind::DataNotFound,
            SyncError::SchemaInvalid { .. } => ErrorKind::SchemaInvalid,
            SyncError::Http { .. }
            | SyncError::Parse(_)
            | SyncError::BarNotFound
            | SyncError::InvalidStateTransition { .. }
            | SyncError::Bridge(_) => ErrorKind::Unclassified,
        }
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(e: serde_json::Error) -> Self {
        SyncError::Parse(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;

/// Closed error taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ConfigurationMissing,
    AuthenticationFailed,
    RepositoryNotFound,
    DataNotFound,
    SchemaInvalid,
    Unclassified,
}

/// Title and body shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotificationMessage {
    pub title: &'static str,
    pub body: &'static str,
}

pub const SUCCESS_NOTIFICATION: NotificationMessage = NotificationMessage {
    title: "Bookmarks synchronized",
    body: "Your bookmarks have been updated.",
};

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::ConfigurationMissing => "configuration_missing",
            ErrorKind::AuthenticationFailed => "authentication_failed",
            ErrorKind::RepositoryNotFound => "repository_not_found",
            ErrorKind::DataNotFound => "data_not_found",
            ErrorKind::SchemaInvalid => "schema_invalid",
            ErrorKind::Unclassified => "unclassified",
        }
    }

    /// Notification to show for this failure; `None` means log only
    pub fn notification(&self) -> Option<NotificationMessage> {
        let (title, body) = match self {
            ErrorKind::ConfigurationMissing => return None,
            ErrorKind::AuthenticationFailed => (
                "Authentication failed",
                "Please check your Personal Access Token settings.",
            ),
            ErrorKind::RepositoryNotFound => (
                "Repository not found",
                "The configured repository does not exist or is not accessible with the provided token.",
            ),
            ErrorKind::DataNotFound => (
                "Data not found",
                "The bookmarks could not be found. Please check the configured repo and path.",
            ),
            ErrorKind::SchemaInvalid => (
                "Invalid bookmark data",
                "The bookmark data is not valid. Synchronization was canceled.",
            ),
            ErrorKind::Unclassified => ("Synchronization failed", "Failed to update bookmarks."),
        };
        Some(NotificationMessage { title, body })
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
