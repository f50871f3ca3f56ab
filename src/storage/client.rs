use std::fmt;
use std::future::Future;
use std::pin::Pin;

use error_stack::{Report, ResultExt};

use crate::coder;
use crate::error::{GitHubStorageError, StorageError, StorageResult};

use super::{
    ContentApi, ContentRecord, DeleteRequest, EntryKind, FileEntry, GitHubContents, PutRequest,
    RemoteItem, RepositoryContext, TreeNode,
};

/// Prefix of every commit message written by this crate.
pub const TOOL_TAG: &str = "[cdnhub]: ";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContentOptions {
    /// Attach decoded bytes to file entries.
    pub with_content: bool,
}

impl ContentOptions {
    pub fn with_content() -> Self {
        ContentOptions { with_content: true }
    }
}

type TreeFuture<'a> = Pin<Box<dyn Future<Output = StorageResult<Vec<TreeNode>>> + Send + 'a>>;

/// A repository branch used as a simple remote file store.
#[derive(Debug)]
pub struct ContentStore<A = GitHubContents> {
    api: A,
    repo: RepositoryContext,
}

impl<A> fmt::Display for ContentStore<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ContentStore(owner={}, repo={}, branch={})",
            self.repo.owner(),
            self.repo.repo(),
            self.repo.branch()
        )
    }
}

impl ContentStore<GitHubContents> {
    /// Connect to `owner/repo` on GitHub, using `main` unless a branch is given.
    pub fn connect(repo: &str, branch: Option<&str>, token: &str) -> StorageResult<Self> {
        let repo = RepositoryContext::new(repo, branch, token)?;
        let api = GitHubContents::new(repo.token())
            .change_context(StorageError::RemoteFailure("build client"))?;

        Ok(Self::with_api(repo, api))
    }
}

fn normalize(path: &str) -> &str {
    path.trim_matches('/')
}

fn require_path(path: &str) -> StorageResult<&str> {
    let path = normalize(path);
    if path.is_empty() {
        return Err(Report::new(StorageError::InvalidArgument(
            "path cannot be empty".into(),
        )));
    }
    Ok(path)
}

fn commit_message(message: Option<&str>, default: impl FnOnce() -> String) -> String {
    match message {
        Some(message) => format!("{}{}", TOOL_TAG, message),
        None => format!("{}{}", TOOL_TAG, default()),
    }
}

fn decode_content(encoded: &str, path: &str) -> StorageResult<Vec<u8>> {
    coder::decode(encoded)
        .change_context(StorageError::Encoding(path.to_string()))
        .attach_printable_lazy(|| format!("Failed to decode content of `{}`", path))
}

impl<A: ContentApi> ContentStore<A> {
    pub fn with_api(repo: RepositoryContext, api: A) -> Self {
        ContentStore { api, repo }
    }

    pub fn context(&self) -> &RepositoryContext {
        &self.repo
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Create or overwrite the file at `path`.
    pub async fn put(&self, path: &str, content: &[u8], message: Option<&str>) -> StorageResult<()> {
        let path = require_path(path)?;
        let encoded = coder::encode(content);

        // An existing file must be replaced with its current marker.
        let sha = match self.api.get_content(&self.repo, path).await {
            Ok(ContentRecord::Single(existing)) => Some(existing.sha),
            Ok(ContentRecord::Listing(_)) => None,
            Err(report) if report.current_context().is_not_found() => None,
            Err(report) => {
                return Err(report
                    .change_context(StorageError::RemoteFailure("look up existing file"))
                    .attach_printable(format!("path: {}", path)));
            }
        };

        let message = commit_message(message, || format!("Add {}", path));
        let request = PutRequest {
            path,
            message: &message,
            content: &encoded,
            sha: sha.as_deref(),
        };

        let commit = self
            .api
            .put_content(&self.repo, request)
            .await
            .change_context(StorageError::RemoteFailure("write file"))
            .attach_printable_lazy(|| format!("path: {}", path))?;

        tracing::info!(
            %path,
            %commit,
            bytes = content.len(),
            update = sha.is_some(),
            "wrote file"
        );
        Ok(())
    }

    /// Read the bytes of the file at `path`.
    pub async fn get(&self, path: &str) -> StorageResult<Vec<u8>> {
        let path = require_path(path)?;

        match self.fetch_existing(path).await? {
            ContentRecord::Single(item) => self.read_item(&item).await,
            ContentRecord::Listing(_) => Err(Report::new(StorageError::NotFound(
                path.to_string(),
            ))
            .attach_printable("path is a directory")),
        }
    }

    /// Delete the file at `path`.
    pub async fn drop(&self, path: &str, message: Option<&str>) -> StorageResult<()> {
        let path = require_path(path)?;

        let sha = match self.fetch_existing(path).await? {
            ContentRecord::Single(item) => item.sha,
            ContentRecord::Listing(_) => {
                return Err(Report::new(StorageError::NotFound(path.to_string()))
                    .attach_printable("path is a directory"));
            }
        };

        let message = commit_message(message, || format!("Delete {}", path));
        let request = DeleteRequest {
            path,
            message: &message,
            sha: &sha,
        };

        let commit = self
            .api
            .delete_content(&self.repo, request)
            .await
            .change_context(StorageError::RemoteFailure("delete file"))
            .attach_printable_lazy(|| format!("path: {}", path))?;

        tracing::info!(%path, %commit, "deleted file");
        Ok(())
    }

    /// List the immediate entries of the directory at `path`.
    ///
    /// An empty path lists the repository root. A path naming a file yields
    /// an empty list.
    pub async fn contents(
        &self,
        path: &str,
        options: ContentOptions,
    ) -> StorageResult<Vec<FileEntry>> {
        let path = normalize(path);

        let record = self
            .api
            .get_content(&self.repo, path)
            .await
            .change_context(StorageError::RemoteFailure("list directory"))
            .attach_printable_lazy(|| format!("path: {}", path))?;

        let items = match record {
            ContentRecord::Listing(items) => items,
            ContentRecord::Single(_) => {
                tracing::debug!(%path, "path is a file, listing nothing");
                return Ok(Vec::new());
            }
        };

        let mut entries = Vec::with_capacity(items.len());
        for item in items {
            let content = if options.with_content && item.kind == EntryKind::File {
                Some(self.read_item(&item).await?)
            } else {
                None
            };

            entries.push(FileEntry {
                name: item.name,
                path: item.path,
                kind: item.kind,
                size: item.size,
                content,
            });
        }

        Ok(entries)
    }

    /// List the whole repository, depth first from the root.
    pub async fn tree(&self, options: ContentOptions) -> StorageResult<Vec<TreeNode>> {
        self.traverse(String::new(), options).await
    }

    fn traverse(&self, path: String, options: ContentOptions) -> TreeFuture<'_> {
        Box::pin(async move {
            let mut nodes = Vec::new();

            for entry in self.contents(&path, options).await? {
                match entry.kind {
                    EntryKind::Dir => {
                        let children = self.traverse(entry.path.clone(), options).await?;
                        nodes.push(TreeNode::Dir { entry, children });
                    }
                    EntryKind::File => nodes.push(TreeNode::File(entry)),
                    EntryKind::Symlink | EntryKind::Submodule => {
                        tracing::debug!(path = %entry.path, kind = ?entry.kind, "skipping entry");
                    }
                }
            }

            Ok(nodes)
        })
    }

    /// Fetch the record at `path`, treating a remote 404 as [`StorageError::NotFound`].
    async fn fetch_existing(&self, path: &str) -> StorageResult<ContentRecord> {
        self.api
            .get_content(&self.repo, path)
            .await
            .map_err(|report| {
                let context = if report.current_context().is_not_found() {
                    StorageError::NotFound(path.to_string())
                } else {
                    StorageError::RemoteFailure("look up file")
                };
                report
                    .change_context(context)
                    .attach_printable(format!("path: {}", path))
            })
    }

    /// Decoded bytes of a file item, fetching the file when the item carries no payload.
    async fn read_item(&self, item: &RemoteItem) -> StorageResult<Vec<u8>> {
        if item.content.is_some() {
            return inline_content(item);
        }

        match self.fetch_existing(&item.path).await? {
            ContentRecord::Single(file) => inline_content(&file),
            ContentRecord::Listing(_) => Err(Report::new(StorageError::NotFound(
                item.path.clone(),
            ))
            .attach_printable("path is a directory")),
        }
    }
}

/// Bytes carried inline by a single-file record.
///
/// GitHub only inlines files up to 1 MB; larger ones come back with an empty
/// payload and `"encoding": "none"`.
fn inline_content(item: &RemoteItem) -> StorageResult<Vec<u8>> {
    let missing = |what: String| {
        Report::new(GitHubStorageError::MissingData(what))
            .change_context(StorageError::RemoteFailure("read file"))
            .attach_printable(format!("path: {}, size: {}", item.path, item.size))
    };

    let Some(encoded) = &item.content else {
        return Err(missing("content".into()));
    };

    match item.encoding.as_deref() {
        None | Some("base64") => {}
        Some(other) => return Err(missing(format!("content with `{}` encoding", other))),
    }

    if encoded.is_empty() && item.size > 0 {
        return Err(missing("content of a non-empty file".into()));
    }

    decode_content(encoded, &item.path)
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
