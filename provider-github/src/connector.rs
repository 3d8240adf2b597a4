//! GitHub REST API connector
//!
//! Implements [`ContentProvider`] against `repos` and `repos/contents`.

use async_trait::async_trait;
use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
use core_runtime::config::{RevisionTag, SourceConfig};
use core_sync::{ContentProvider, FetchOutcome, FetchRequest};
use futures::future::try_join_all;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::error::{GitHubError, Result};
use crate::types::ContentEntry;

/// REST API version this connector is written against
const API_VERSION: &str = "2022-11-28";

/// Media type for JSON metadata (directory listings, repository info)
const ACCEPT_JSON: &str = "application/vnd.github+json";

/// Media type returning a file's raw bytes
const ACCEPT_RAW: &str = "application/vnd.github.raw+json";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// What the path request returned
enum PathContent {
    NotModified,
    File(Value),
    Directory(Vec<ContentEntry>),
    /// Metadata for a single file that still has to be read raw
    FileMetadata(ContentEntry),
}

/// GitHub API connector
///
/// # Example
///
/// ```ignore
/// use provider_github::GitHubConnector;
/// use core_sync::{ContentProvider, FetchRequest};
///
/// let connector = GitHubConnector::new(http_client);
/// let outcome = connector.fetch(&source, FetchRequest::conditional(source.revision.clone())).await?;
/// ```
pub struct GitHubConnector {
    /// HTTP client for API requests
    http_client: Arc<dyn HttpClient>,
}

impl GitHubConnector {
    pub fn new(http_client: Arc<dyn HttpClient>) -> Self {
        Self { http_client }
    }

    fn repository_url(source: &SourceConfig) -> String {
        format!(
            "{}/repos/{}/{}",
            source.api_base_url(),
            urlencoding::encode(&source.owner),
            urlencoding::encode(&source.repo)
        )
    }

    /// Contents URL; each path segment is encoded, separators are kept
    fn contents_url(source: &SourceConfig, path: &str) -> String {
        let encoded: Vec<String> = path
            .trim_matches('/')
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect();
        format!("{}/contents/{}", Self::repository_url(source), encoded.join("/"))
    }

    fn request(source: &SourceConfig, url: String, accept: &str) -> HttpRequest {
        HttpRequest::get(url)
            .bearer_token(&source.credential)
            .header("Accept", accept)
            .header("X-GitHub-Api-Version", API_VERSION)
            .timeout(REQUEST_TIMEOUT)
    }

    fn api_error(response: &HttpResponse) -> GitHubError {
        GitHubError::ApiError {
            status_code: response.status,
            message: String::from_utf8_lossy(&response.body).into_owned(),
        }
    }

    fn parse_document(body: &[u8], path: &str) -> Result<Value> {
        serde_json::from_slice(body)
            .map_err(|e| GitHubError::ParseError(format!("Invalid JSON in '{}': {}", path, e)))
    }

    /// Confirm the repository exists and the token can read it
    #[instrument(skip(self, source), fields(owner = %source.owner, repo = %source.repo))]
    async fn check_repository(&self, source: &SourceConfig) -> Result<()> {
        let request = Self::request(source, Self::repository_url(source), ACCEPT_JSON);
        let response = self.http_client.execute(request).await?;

        match response.status {
            _ if response.is_success() => {
                debug!("Repository is accessible");
                Ok(())
            }
            401 => Err(GitHubError::Unauthorized(
                "Please check your personal access token".to_string(),
            )),
            404 => Err(GitHubError::RepositoryNotFound {
                owner: source.owner.clone(),
                repo: source.repo.clone(),
            }),
            _ => Err(Self::api_error(&response)),
        }
    }

    /// Read the configured path, conditioned on `if_none_match`
    async fn read_path(
        &self,
        source: &SourceConfig,
        if_none_match: Option<&RevisionTag>,
    ) -> Result<(PathContent, Option<RevisionTag>)> {
        let raw = source.path.ends_with(".json");
        let accept = if raw { ACCEPT_RAW } else { ACCEPT_JSON };
        let mut request = Self::request(source, Self::contents_url(source, &source.path), accept);
        if let Some(tag) = if_none_match {
            request = request.if_none_match(tag.as_str());
        }

        let response = self.http_client.execute(request).await?;
        if response.is_not_modified() {
            return Ok((PathContent::NotModified, None));
        }
        match response.status {
            401 => {
                return Err(GitHubError::Unauthorized(
                    "Please check your personal access token".to_string(),
                ))
            }
            404 => {
                return Err(GitHubError::PathNotFound {
                    path: source.path.clone(),
                })
            }
            _ if !response.is_success() => return Err(Self::api_error(&response)),
            _ => {}
        }

        let revision = response.header("etag").and_then(RevisionTag::new);
        if raw {
            let document = Self::parse_document(&response.body, &source.path)?;
            return Ok((PathContent::File(document), revision));
        }

        let body: Value = serde_json::from_slice(&response.body).map_err(|e| {
            GitHubError::ParseError(format!("Failed to parse contents response: {}", e))
        })?;
        let content = if body.is_array() {
            let entries: Vec<ContentEntry> = serde_json::from_value(body).map_err(|e| {
                GitHubError::ParseError(format!("Failed to parse directory listing: {}", e))
            })?;
            PathContent::Directory(entries)
        } else {
            let entry: ContentEntry = serde_json::from_value(body).map_err(|e| {
                GitHubError::ParseError(format!("Failed to parse file metadata: {}", e))
            })?;
            PathContent::FileMetadata(entry)
        };
        Ok((content, revision))
    }

    /// Read one file's raw content and parse it as JSON
    #[instrument(skip(self, source))]
    async fn read_file(&self, source: &SourceConfig, path: &str) -> Result<Value> {
        let request = Self::request(source, Self::contents_url(source, path), ACCEPT_RAW);
        let response = self.http_client.execute(request).await?;

        match response.status {
            _ if response.is_success() => Self::parse_document(&response.body, path),
            401 => Err(GitHubError::Unauthorized(
                "Please check your personal access token".to_string(),
            )),
            404 => Err(GitHubError::PathNotFound {
                path: path.to_string(),
            }),
            _ => Err(Self::api_error(&response)),
        }
    }

    async fn fetch_documents(
        &self,
        source: &SourceConfig,
        request: &FetchRequest,
    ) -> Result<FetchOutcome> {
        self.check_repository(source).await?;

        let (content, revision) = self
            .read_path(source, request.if_none_match.as_ref())
            .await?;

        let documents = match content {
            PathContent::NotModified => {
                info!("No changes detected in bookmarks");
                return Ok(FetchOutcome::NotModified);
            }
            PathContent::File(document) => vec![document],
            PathContent::FileMetadata(entry) if entry.kind == "file" => {
                vec![self.read_file(source, &entry.path).await?]
            }
            PathContent::FileMetadata(entry) => {
                return Err(GitHubError::ApiError {
                    status_code: 200,
                    message: format!("'{}' is a {}, not a file or folder", entry.path, entry.kind),
                })
            }
            PathContent::Directory(entries) => {
                if entries.is_empty() {
                    return Err(GitHubError::EmptyDirectory {
                        path: source.path.clone(),
                    });
                }

                let files: Vec<&ContentEntry> =
                    entries.iter().filter(|e| e.is_json_file()).collect();
                if files.is_empty() {
                    warn!(entries = entries.len(), "Folder contains no JSON files");
                }
                debug!(files = files.len(), "Fetching bookmark files from folder");

                try_join_all(files.into_iter().map(|file| self.read_file(source, &file.path)))
                    .await?
            }
        };

        info!(documents = documents.len(), "Fetched bookmark documents");
        Ok(FetchOutcome::Fetched {
            documents,
            revision,
        })
    }
}

#[async_trait]
impl ContentProvider for GitHubConnector {
    fn name(&self) -> &'static str {
        "github"
    }

    #[instrument(skip(self, source, request), fields(source = %source.id, location = %source.location()))]
    async fn fetch(
        &self,
        source: &SourceConfig,
        request: FetchRequest,
    ) -> core_sync::Result<FetchOutcome> {
        info!(
            conditional = request.if_none_match.is_some(),
            "Starting sync with GitHub"
        );
        Ok(self.fetch_documents(source, &request).await?)
    }
}
