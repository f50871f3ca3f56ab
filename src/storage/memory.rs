//! In-process contents API.
//!
//! Follows the GitHub contents semantics the client relies on: single
//! records for files, listings for directories, 404 for missing paths and
//! revision-marker checks on writes and deletes.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use error_stack::Report;
use http::StatusCode;

use crate::coder;
use crate::error::{GitHubStorageError, GitHubStorageResult};

use super::{
    ContentApi, ContentRecord, DeleteRequest, EntryKind, PutRequest, RemoteItem,
    RepositoryContext,
};

/// A request observed by [`MemoryContents`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedCall {
    Get {
        path: String,
    },
    Put {
        path: String,
        message: String,
        sha: Option<String>,
    },
    Delete {
        path: String,
        message: String,
        sha: String,
    },
}

#[derive(Debug)]
struct StoredFile {
    content: Vec<u8>,
    sha: String,
}

#[derive(Debug, Default)]
struct State {
    /// branch -> path -> file
    branches: HashMap<String, BTreeMap<String, StoredFile>>,
    calls: Vec<RecordedCall>,
    failures: HashMap<String, StatusCode>,
    revision: u64,
}

impl State {
    fn next_revision(&mut self) -> String {
        self.revision += 1;
        format!("{:040x}", self.revision)
    }

    fn check_failure(&self, path: &str) -> GitHubStorageResult<()> {
        match self.failures.get(path) {
            Some(status) => Err(Report::new(GitHubStorageError::from_status(
                *status,
                "injected failure",
            ))),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryContents {
    state: Mutex<State>,
}

fn normalize(path: &str) -> &str {
    path.trim_matches('/')
}

fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

fn api_error(status: StatusCode, message: String) -> Report<GitHubStorageError> {
    Report::new(GitHubStorageError::from_status(status, message))
}

fn file_item(path: &str, file: &StoredFile, with_content: bool) -> RemoteItem {
    RemoteItem {
        name: file_name(path).to_string(),
        path: path.to_string(),
        sha: file.sha.clone(),
        kind: EntryKind::File,
        size: file.content.len() as u64,
        content: with_content.then(|| coder::encode(&file.content)),
        encoding: with_content.then(|| "base64".to_string()),
    }
}

fn lookup(files: &BTreeMap<String, StoredFile>, path: &str) -> Option<ContentRecord> {
    if let Some(file) = files.get(path) {
        return Some(ContentRecord::Single(file_item(path, file, true)));
    }

    let prefix = if path.is_empty() {
        String::new()
    } else {
        format!("{}/", path)
    };

    let mut entries: BTreeMap<&str, RemoteItem> = BTreeMap::new();
    for (file_path, file) in files.range(prefix.clone()..) {
        let Some(rest) = file_path.strip_prefix(&prefix) else {
            break;
        };

        match rest.split_once('/') {
            None => {
                entries.insert(rest, file_item(file_path, file, false));
            }
            Some((dir, _)) => {
                let item = entries.entry(dir).or_insert_with(|| RemoteItem {
                    name: dir.to_string(),
                    path: format!("{}{}", prefix, dir),
                    sha: String::new(),
                    kind: EntryKind::Dir,
                    size: 0,
                    content: None,
                    encoding: None,
                });
                // A tree's marker changes whenever anything below it does.
                if file.sha > item.sha {
                    item.sha = file.sha.clone();
                }
            }
        }
    }

    if entries.is_empty() && !path.is_empty() {
        None
    } else {
        Some(ContentRecord::Listing(entries.into_values().collect()))
    }
}

impl MemoryContents {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store a file directly, bypassing marker checks. Returns its marker.
    pub fn insert(&self, branch: &str, path: &str, content: impl Into<Vec<u8>>) -> String {
        let mut state = self.state();
        let sha = state.next_revision();
        state.branches.entry(branch.to_string()).or_default().insert(
            normalize(path).to_string(),
            StoredFile {
                content: content.into(),
                sha: sha.clone(),
            },
        );
        sha
    }

    /// Current bytes of a file, if it exists.
    pub fn file(&self, branch: &str, path: &str) -> Option<Vec<u8>> {
        self.state()
            .branches
            .get(branch)
            .and_then(|files| files.get(normalize(path)))
            .map(|file| file.content.clone())
    }

    /// Make every request for `path` fail with `status`.
    pub fn fail_path(&self, path: &str, status: StatusCode) {
        self.state()
            .failures
            .insert(normalize(path).to_string(), status);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state().calls.clone()
    }
}

#[async_trait]
impl ContentApi for MemoryContents {
    async fn get_content(
        &self,
        repo: &RepositoryContext,
        path: &str,
    ) -> GitHubStorageResult<ContentRecord> {
        let path = normalize(path);
        let mut state = self.state();
        state.calls.push(RecordedCall::Get {
            path: path.to_string(),
        });
        state.check_failure(path)?;

        // A branch with no files still has an (empty) root.
        let record = match state.branches.get(repo.branch()) {
            Some(files) => lookup(files, path),
            None => lookup(&BTreeMap::new(), path),
        };

        record.ok_or_else(|| {
            Report::new(GitHubStorageError::NotFound)
                .attach_printable(format!("No content at `{}` on {}", path, repo.branch()))
        })
    }

    async fn put_content(
        &self,
        repo: &RepositoryContext,
        request: PutRequest<'_>,
    ) -> GitHubStorageResult<String> {
        let path = normalize(request.path);
        let mut state = self.state();
        state.calls.push(RecordedCall::Put {
            path: path.to_string(),
            message: request.message.to_string(),
            sha: request.sha.map(str::to_string),
        });
        state.check_failure(path)?;

        let content = coder::decode(request.content).map_err(|e| {
            api_error(
                StatusCode::UNPROCESSABLE_ENTITY,
                "content is not valid Base64".into(),
            )
            .attach_printable(e.to_string())
        })?;

        let dir_prefix = format!("{}/", path);
        let files = state.branches.entry(repo.branch().to_string()).or_default();
        if files
            .range(dir_prefix.clone()..)
            .next()
            .is_some_and(|(p, _)| p.starts_with(&dir_prefix))
        {
            return Err(api_error(
                StatusCode::UNPROCESSABLE_ENTITY,
                format!("`{}` is a directory", path),
            ));
        }

        match (files.get(path), request.sha) {
            (Some(_), None) => {
                return Err(api_error(
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "\"sha\" wasn't supplied.".into(),
                ));
            }
            (Some(file), Some(sha)) if file.sha != sha => {
                return Err(api_error(
                    StatusCode::CONFLICT,
                    format!("{} does not match {}", path, sha),
                ));
            }
            (None, Some(sha)) => {
                return Err(api_error(
                    StatusCode::CONFLICT,
                    format!("{} does not match {}", path, sha),
                ));
            }
            _ => {}
        }

        let sha = state.next_revision();
        let commit = state.next_revision();
        state
            .branches
            .entry(repo.branch().to_string())
            .or_default()
            .insert(path.to_string(), StoredFile { content, sha });

        Ok(commit)
    }

    async fn delete_content(
        &self,
        repo: &RepositoryContext,
        request: DeleteRequest<'_>,
    ) -> GitHubStorageResult<String> {
        let path = normalize(request.path);
        let mut state = self.state();
        state.calls.push(RecordedCall::Delete {
            path: path.to_string(),
            message: request.message.to_string(),
            sha: request.sha.to_string(),
        });
        state.check_failure(path)?;

        let stored_sha = state
            .branches
            .get(repo.branch())
            .and_then(|files| files.get(path))
            .map(|file| file.sha.clone());

        match stored_sha {
            None => Err(Report::new(GitHubStorageError::NotFound)
                .attach_printable(format!("No file at `{}` on {}", path, repo.branch()))),
            Some(sha) if sha != request.sha => Err(api_error(
                StatusCode::CONFLICT,
                format!("{} does not match {}", path, request.sha),
            )),
            Some(_) => {
                if let Some(files) = state.branches.get_mut(repo.branch()) {
                    files.remove(path);
                }
                Ok(state.next_revision())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> RepositoryContext {
        RepositoryContext::new("clqu/cdnhub", None, "token").unwrap()
    }

    #[tokio::test]
    async fn test_root_listing_groups_directories() {
        let api = MemoryContents::new();
        api.insert("main", "a/b.txt", "b");
        api.insert("main", "a/c/d.txt", "d");
        api.insert("main", "z.txt", "z");

        let record = api.get_content(&context(), "").await.unwrap();
        let ContentRecord::Listing(items) = record else {
            panic!("expected a listing");
        };
        let names: Vec<_> = items.iter().map(|i| (i.name.as_str(), i.kind)).collect();
        assert_eq!(names, vec![("a", EntryKind::Dir), ("z.txt", EntryKind::File)]);
        assert_eq!(items[0].path, "a");
    }

    #[tokio::test]
    async fn test_empty_repository_root_is_an_empty_listing() {
        let api = MemoryContents::new();
        let record = api.get_content(&context(), "").await.unwrap();
        assert_eq!(record, ContentRecord::Listing(Vec::new()));
    }

    #[tokio::test]
    async fn test_sibling_prefix_is_not_a_child() {
        let api = MemoryContents::new();
        api.insert("main", "a/b.txt", "b");
        api.insert("main", "ab/c.txt", "c");

        let ContentRecord::Listing(items) = api.get_content(&context(), "a").await.unwrap() else {
            panic!("expected a listing");
        };
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].path, "a/b.txt");
    }

    #[tokio::test]
    async fn test_missing_path_is_not_found() {
        let api = MemoryContents::new();
        let err = api.get_content(&context(), "nope").await.unwrap_err();
        assert!(err.current_context().is_not_found());
    }

    #[tokio::test]
    async fn test_update_requires_current_sha() {
        let api = MemoryContents::new();
        let sha = api.insert("main", "a.txt", "old");
        let content = coder::encode(b"new");

        let missing = PutRequest {
            path: "a.txt",
            message: "m",
            content: &content,
            sha: None,
        };
        let err = api.put_content(&context(), missing).await.unwrap_err();
        assert_eq!(
            err.current_context().status(),
            Some(StatusCode::UNPROCESSABLE_ENTITY)
        );

        let stale = PutRequest {
            sha: Some("0"),
            ..missing
        };
        let err = api.put_content(&context(), stale).await.unwrap_err();
        assert_eq!(err.current_context().status(), Some(StatusCode::CONFLICT));

        let current = PutRequest {
            sha: Some(&sha),
            ..missing
        };
        api.put_content(&context(), current).await.unwrap();
        assert_eq!(api.file("main", "a.txt").unwrap(), b"new");
    }

    #[tokio::test]
    async fn test_branches_are_isolated() {
        let api = MemoryContents::new();
        api.insert("assets", "a.txt", "a");

        let err = api.get_content(&context(), "a.txt").await.unwrap_err();
        assert!(err.current_context().is_not_found());
        assert!(api.file("assets", "a.txt").is_some());
    }

    #[tokio::test]
    async fn test_injected_failure_applies_to_path() {
        let api = MemoryContents::new();
        api.insert("main", "a.txt", "a");
        api.fail_path("a.txt", StatusCode::FORBIDDEN);

        let err = api.get_content(&context(), "a.txt").await.unwrap_err();
        assert_eq!(err.current_context().status(), Some(StatusCode::FORBIDDEN));
    }
}
