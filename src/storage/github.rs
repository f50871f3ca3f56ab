use crate::error::{GitHubStorageError, GitHubStorageResult};

use super::{ContentApi, ContentRecord, DeleteRequest, PutRequest, RepositoryContext};
use async_trait::async_trait;
use error_stack::Report;
use octocrab::Octocrab;
use serde::{Deserialize, Serialize};
use std::fmt;

impl fmt::Debug for GitHubContents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("GitHubContents")
    }
}

/// Contents API backed by the GitHub REST API.
pub struct GitHubContents {
    client: Octocrab,
}

#[derive(Serialize)]
struct PutBody<'a> {
    message: &'a str,
    content: &'a str,
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

#[derive(Serialize)]
struct DeleteBody<'a> {
    message: &'a str,
    sha: &'a str,
    branch: &'a str,
}

#[derive(Deserialize)]
struct CommitResponse {
    commit: CommitRef,
}

#[derive(Deserialize)]
struct CommitRef {
    sha: String,
}

impl GitHubContents {
    pub fn new(token: &str) -> GitHubStorageResult<Self> {
        let client = Octocrab::builder()
            .personal_token(token.to_string())
            .build()
            .map_err(|e| {
                Report::new(GitHubStorageError::AuthError).attach_printable(e.to_string())
            })?;

        Ok(Self::from_client(client))
    }

    /// Use a preconfigured client, e.g. one pointing at a GitHub Enterprise host.
    pub fn from_client(client: Octocrab) -> Self {
        GitHubContents { client }
    }
}

fn contents_route(repo: &RepositoryContext, path: &str) -> String {
    let route = format!(
        "/repos/{}/{}/contents",
        urlencoding::encode(repo.owner()),
        urlencoding::encode(repo.repo())
    );

    let segments: Vec<_> = path
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(urlencoding::encode)
        .collect();

    if segments.is_empty() {
        route
    } else {
        format!("{}/{}", route, segments.join("/"))
    }
}

fn remote_error(err: octocrab::Error, action: &str) -> Report<GitHubStorageError> {
    Report::new(GitHubStorageError::from(&err))
        .attach_printable(format!("Failed to {}: {}", action, err))
}

#[async_trait]
impl ContentApi for GitHubContents {
    async fn get_content(
        &self,
        repo: &RepositoryContext,
        path: &str,
    ) -> GitHubStorageResult<ContentRecord> {
        let route = contents_route(repo, path);
        tracing::debug!(%route, branch = repo.branch(), "fetching contents");

        self.client
            .get(&route, Some(&[("ref", repo.branch())]))
            .await
            .map_err(|e| remote_error(e, "get content"))
    }

    async fn put_content(
        &self,
        repo: &RepositoryContext,
        request: PutRequest<'_>,
    ) -> GitHubStorageResult<String> {
        let route = contents_route(repo, request.path);
        tracing::debug!(%route, update = request.sha.is_some(), "writing file");

        let body = PutBody {
            message: request.message,
            content: request.content,
            branch: repo.branch(),
            sha: request.sha,
        };

        let response: CommitResponse = self
            .client
            .put(&route, Some(&body))
            .await
            .map_err(|e| remote_error(e, "write file"))?;

        Ok(response.commit.sha)
    }

    async fn delete_content(
        &self,
        repo: &RepositoryContext,
        request: DeleteRequest<'_>,
    ) -> GitHubStorageResult<String> {
        let route = contents_route(repo, request.path);
        tracing::debug!(%route, "deleting file");

        let body = DeleteBody {
            message: request.message,
            sha: request.sha,
            branch: repo.branch(),
        };

        let response: CommitResponse = self
            .client
            .delete(&route, Some(&body))
            .await
            .map_err(|e| remote_error(e, "delete file"))?;

        Ok(response.commit.sha)
    }
}
