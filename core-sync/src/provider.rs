//! Content provider abstraction
//!
//! A provider knows how to reach one kind of remote host. It is handed a
//! fully configured [`SourceConfig`] and returns the raw documents at the
//! configured path; configuration checks, revision caching and validation
//! happen around it.

use async_trait::async_trait;
use core_runtime::config::{RevisionTag, SourceConfig};
use serde_json::Value;

use crate::error::Result;

/// Per-call fetch parameters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchRequest {
    /// Cached tag to condition the fetch on; `None` forces a full fetch
    pub if_none_match: Option<RevisionTag>,
}

impl FetchRequest {
    pub fn unconditional() -> Self {
        Self::default()
    }

    pub fn conditional(tag: Option<RevisionTag>) -> Self {
        Self { if_none_match: tag }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// The remote content still matches the cached tag
    NotModified,
    /// One parsed document per file found at the path
    Fetched {
        documents: Vec<Value>,
        revision: Option<RevisionTag>,
    },
}

/// Remote source of bookmark documents
///
/// Implementations must:
/// - check that the repository is reachable before reading content, mapping
///   a rejected credential to `AuthenticationFailed` and a missing repository
///   to `RepositoryNotFound`
/// - map a missing path or empty directory to `DataNotFound`
/// - report "not modified" as [`FetchOutcome::NotModified`], never as an error
#[async_trait]
pub trait ContentProvider: Send + Sync {
    /// Short provider name for logs
    fn name(&self) -> &'static str;

    async fn fetch(&self, source: &SourceConfig, request: FetchRequest) -> Result<FetchOutcome>;
}
