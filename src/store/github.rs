use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use spdlog::error;

use crate::store::{ContentStore, EntryKind, StoreEntry, StoreError, StoreResult, StoredFile, Version};

pub const DEFAULT_API_BASE: &str = "https://api.github.com";

const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

#[derive(Debug, Clone)]
pub struct GitHubRepo {
    pub api_base: String,
    pub owner: String,
    pub repo: String,
    pub branch: Option<String>,
    pub token: Option<String>,
}

impl GitHubRepo {
    /// `repo` is `owner/name`
    pub fn parse(api_base: &str, repo: &str, branch: Option<String>, token: Option<String>) -> Result<GitHubRepo, String> {
        match repo.split_once('/') {
            Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => Ok(GitHubRepo {
                api_base: api_base.trim_end_matches('/').to_string(),
                owner: owner.to_string(),
                repo: name.to_string(),
                branch,
                token,
            }),
            _ => Err(format!("Invalid GitHub repository {}, expected owner/name", repo)),
        }
    }
}

/// Store backed by the GitHub Contents API. File versions are blob SHAs.
pub struct GitHubStore {
    repo: GitHubRepo,
    client: Client,
}

#[derive(Deserialize)]
struct ContentItem {
    name: String,
    path: String,
    sha: String,
    #[serde(rename = "type")]
    kind: String,
    content: Option<String>,
}

#[derive(Deserialize)]
struct CommitResponse {
    content: Option<ContentItem>,
}

#[derive(Serialize)]
struct WriteRequest<'a> {
    message: &'a str,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    branch: Option<&'a str>,
}

#[derive(Serialize)]
struct DeleteRequest<'a> {
    message: &'a str,
    sha: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    branch: Option<&'a str>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Operation {
    Read,
    Create,
    Update,
    Delete,
}

impl GitHubStore {
    pub fn new(repo: GitHubRepo) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("weekly/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(GitHubStore { repo, client })
    }

    fn contents_url(&self, path: &str) -> String {
        let encoded: Vec<String> = path.split('/')
            .filter(|s| !s.is_empty())
            .map(|s| utf8_percent_encode(s, PATH_SEGMENT).to_string())
            .collect();
        format!("{}/repos/{}/{}/contents/{}", self.repo.api_base, self.repo.owner, self.repo.repo, encoded.join("/"))
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut builder = self.client.request(method.clone(), self.contents_url(path))
            .header("Accept", "application/vnd.github.v3+json");
        if let Some(ref token) = self.repo.token {
            builder = builder.bearer_auth(token);
        }
        if method == Method::GET {
            if let Some(ref branch) = self.repo.branch {
                builder = builder.query(&[("ref", branch.as_str())]);
            }
        }
        builder
    }

    async fn send(&self, builder: RequestBuilder, path: &str, op: Operation) -> StoreResult<reqwest::Response> {
        let response = builder.send().await.map_err(|e| {
            error!("GitHub request failed for {}: {}", path, e);
            StoreError::Unavailable(e.to_string())
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let err = status_error(status, path, op);
        if let StoreError::Unavailable(_) = err {
            error!("GitHub answered {} for {}: {}", status, path, body);
        }
        Err(err)
    }

    async fn json<T: serde::de::DeserializeOwned>(response: reqwest::Response, path: &str) -> StoreResult<T> {
        response.json::<T>().await.map_err(|e| {
            error!("Unexpected GitHub response for {}: {}", path, e);
            StoreError::Unavailable(e.to_string())
        })
    }
}

fn status_error(status: StatusCode, path: &str, op: Operation) -> StoreError {
    let path = path.to_string();
    match (status, op) {
        (StatusCode::NOT_FOUND, _) => StoreError::NotFound(path),
        (StatusCode::CONFLICT, _) => StoreError::VersionConflict(path),
        // A create without sha on an existing file is rejected as unprocessable
        (StatusCode::UNPROCESSABLE_ENTITY, Operation::Create) => StoreError::AlreadyExists(path),
        (StatusCode::UNPROCESSABLE_ENTITY, Operation::Update | Operation::Delete) => StoreError::VersionConflict(path),
        (status, _) => StoreError::Unavailable(format!("GitHub answered {} for {}", status, path)),
    }
}

/// GitHub wraps base64 bodies every 60 characters
fn decode_content(content: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let compact: String = content.chars().filter(|c| !c.is_whitespace()).collect();
    BASE64.decode(compact)
}

#[async_trait]
impl ContentStore for GitHubStore {
    async fn list(&self, dir: &str) -> StoreResult<Vec<StoreEntry>> {
        let response = self.send(self.request(Method::GET, dir), dir, Operation::Read).await?;
        let items: Vec<ContentItem> = Self::json(response, dir).await?;

        let entries = items.into_iter()
            .filter_map(|item| {
                let kind = match item.kind.as_str() {
                    "file" => EntryKind::File,
                    "dir" => EntryKind::Dir,
                    _ => return None,
                };
                Some(StoreEntry {
                    name: item.name,
                    path: item.path,
                    kind,
                    version: Some(Version(item.sha)),
                })
            })
            .collect();
        Ok(entries)
    }

    async fn read_file(&self, path: &str) -> StoreResult<StoredFile> {
        let response = self.send(self.request(Method::GET, path), path, Operation::Read).await?;
        let item: ContentItem = Self::json(response, path).await?;
        let bytes = decode_content(item.content.as_deref().unwrap_or_default()).map_err(|e| {
            error!("Invalid base64 content for {}: {}", path, e);
            StoreError::Unavailable(e.to_string())
        })?;

        Ok(StoredFile {
            bytes,
            version: Version(item.sha),
            created: None,
            modified: None,
        })
    }

    async fn write_file(&self, path: &str, bytes: &[u8], expected: Option<&Version>, message: &str) -> StoreResult<Version> {
        let op = if expected.is_some() { Operation::Update } else { Operation::Create };
        let body = WriteRequest {
            message,
            content: BASE64.encode(bytes),
            sha: expected.map(|v| v.as_str()),
            branch: self.repo.branch.as_deref(),
        };

        let response = self.send(self.request(Method::PUT, path).json(&body), path, op).await?;
        let commit: CommitResponse = Self::json(response, path).await?;
        match commit.content {
            Some(item) => Ok(Version(item.sha)),
            None => Err(StoreError::Unavailable(format!("GitHub did not return the new version of {}", path))),
        }
    }

    async fn delete_file(&self, path: &str, expected: &Version, message: &str) -> StoreResult<()> {
        let body = DeleteRequest {
            message,
            sha: expected.as_str(),
            branch: self.repo.branch.as_deref(),
        };
        self.send(self.request(Method::DELETE, path).json(&body), path, Operation::Delete).await?;
        Ok(())
    }
}
