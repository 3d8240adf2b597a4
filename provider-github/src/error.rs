//! Error types for the GitHub provider

use core_sync::SyncError;
use thiserror::Error;

/// GitHub provider errors
#[derive(Error, Debug)]
pub enum GitHubError {
    /// The token was rejected
    #[error("Authentication with GitHub failed: {0}")]
    Unauthorized(String),

    /// The repository does not exist or the token cannot see it
    #[error("The repository '{owner}/{repo}' does not exist or is not accessible with the provided token")]
    RepositoryNotFound { owner: String, repo: String },

    /// Nothing at the configured path
    #[error("The bookmarks file or folder '{path}' was not found")]
    PathNotFound { path: String },

    /// The configured path is an empty directory
    #[error("No bookmark data found in folder '{path}'")]
    EmptyDirectory { path: String },

    /// Any other non-success status
    #[error("GitHub API error (status {status_code}): {message}")]
    ApiError { status_code: u16, message: String },

    /// A body could not be decoded
    #[error("Failed to parse GitHub response: {0}")]
    ParseError(String),

    /// Bridge error
    #[error(transparent)]
    BridgeError(#[from] bridge_traits::error::BridgeError),
}

/// Result type for GitHub operations
pub type Result<T> = std::result::Result<T, GitHubError>;

impl From<GitHubError> for SyncError {
    fn from(error: GitHubError) -> Self {
        match error {
            GitHubError::Unauthorized(_) => SyncError::AuthenticationFailed(error.to_string()),
            GitHubError::RepositoryNotFound { .. } => {
                SyncError::RepositoryNotFound(error.to_string())
            }
            GitHubError::PathNotFound { .. } | GitHubError::EmptyDirectory { .. } => {
                SyncError::DataNotFound(error.to_string())
            }
            GitHubError::ApiError {
                status_code,
                message,
            } => SyncError::Http {
                status: status_code,
                message,
            },
            GitHubError::ParseError(msg) => SyncError::Parse(msg),
            GitHubError::BridgeError(e) => SyncError::Bridge(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_sync::ErrorKind;

    #[test]
    fn test_error_display() {
        let error = GitHubError::RepositoryNotFound {
            owner: "octo".to_string(),
            repo: "marks".to_string(),
        };

        assert_eq!(
            error.to_string(),
            "The repository 'octo/marks' does not exist or is not accessible with the provided token"
        );
    }

    #[test]
    fn test_error_conversion() {
        let cases = [
            (
                GitHubError::Unauthorized("Bad credentials".into()),
                ErrorKind::AuthenticationFailed,
            ),
            (
                GitHubError::RepositoryNotFound {
                    owner: "o".into(),
                    repo: "r".into(),
                },
                ErrorKind::RepositoryNotFound,
            ),
            (
                GitHubError::PathNotFound { path: "p".into() },
                ErrorKind::DataNotFound,
            ),
            (
                GitHubError::EmptyDirectory { path: "p".into() },
                ErrorKind::DataNotFound,
            ),
            (
                GitHubError::ApiError {
                    status_code: 502,
                    message: "bad gateway".into(),
                },
                ErrorKind::Unclassified,
            ),
            (GitHubError::ParseError("eof".into()), ErrorKind::Unclassified),
        ];

        for (error, kind) in cases {
            let sync_error: SyncError = error.into();
            assert_eq!(sync_error.kind(), kind);
        }
    }
}
