mod client;
mod context;
mod entry;
mod github;
mod memory;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::GitHubStorageResult;

pub use client::{ContentOptions, ContentStore, TOOL_TAG};
pub use context::RepositoryContext;
pub use entry::{EntryKind, FileEntry, TreeNode};
pub use github::GitHubContents;
pub use memory::{MemoryContents, RecordedCall};

/// One item of a contents response, as the remote describes it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteItem {
    pub name: String,
    pub path: String,
    /// Revision marker of the stored blob.
    pub sha: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    #[serde(default)]
    pub size: u64,
    /// Base64 payload. Only present on single-file responses.
    #[serde(default)]
    pub content: Option<String>,
    /// `base64`, or `none` when the file is too large to inline.
    #[serde(default)]
    pub encoding: Option<String>,
}

/// The two shapes a contents lookup can answer with.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ContentRecord {
    Listing(Vec<RemoteItem>),
    Single(RemoteItem),
}

#[derive(Debug, Clone, Copy)]
pub struct PutRequest<'a> {
    pub path: &'a str,
    pub message: &'a str,
    /// Already base64 encoded.
    pub content: &'a str,
    /// Present when replacing an existing file.
    pub sha: Option<&'a str>,
}

#[derive(Debug, Clone, Copy)]
pub struct DeleteRequest<'a> {
    pub path: &'a str,
    pub message: &'a str,
    pub sha: &'a str,
}

/// The remote contents API, scoped to one repository and branch per call.
///
/// Write operations return the id of the commit they created.
#[async_trait]
pub trait ContentApi: Send + Sync {
    async fn get_content(
        &self,
        repo: &RepositoryContext,
        path: &str,
    ) -> GitHubStorageResult<ContentRecord>;

    async fn put_content(
        &self,
        repo: &RepositoryContext,
        request: PutRequest<'_>,
    ) -> GitHubStorageResult<String>;

    async fn delete_content(
        &self,
        repo: &RepositoryContext,
        request: DeleteRequest<'_>,
    ) -> GitHubStorageResult<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_file_response_decodes_as_single() {
        let body = r#"{
            "type": "file",
            "encoding": "base64",
            "size": 14,
            "name": "hello.txt",
            "path": "test-folder/hello.txt",
            "content": "SGVsbG8sIENETkh1YiE=\n",
            "sha": "3d21ec53a331a6f037a91c368710b99387d012c1",
            "url": "https://api.github.com/repos/clqu/cdnhub/contents/test-folder/hello.txt",
            "download_url": "https://raw.githubusercontent.com/clqu/cdnhub/main/test-folder/hello.txt"
        }"#;

        let record: ContentRecord = serde_json::from_str(body).unwrap();
        let ContentRecord::Single(item) = record else {
            panic!("expected a single record");
        };
        assert_eq!(item.kind, EntryKind::File);
        assert_eq!(item.sha, "3d21ec53a331a6f037a91c368710b99387d012c1");
        assert_eq!(item.size, 14);
        assert!(item.content.is_some());
        assert_eq!(item.encoding.as_deref(), Some("base64"));
    }

    #[test]
    fn test_large_file_response_has_no_inline_content() {
        let body = r#"{
            "type": "file",
            "encoding": "none",
            "size": 2000000,
            "name": "big.bin",
            "path": "big.bin",
            "content": "",
            "sha": "e69de29bb2d1d6434b8b29ae775ad8c2e48c5391"
        }"#;

        let record: ContentRecord = serde_json::from_str(body).unwrap();
        let ContentRecord::Single(item) = record else {
            panic!("expected a single record");
        };
        assert_eq!(item.encoding.as_deref(), Some("none"));
        assert_eq!(item.content.as_deref(), Some(""));
    }

    #[test]
    fn test_directory_response_decodes_as_listing() {
        let body = r#"[
            {
                "type": "dir",
                "size": 0,
                "name": "assets",
                "path": "assets",
                "sha": "a84d88e7554fc1fa21bcbc4efae3c782a70d2b9d"
            },
            {
                "type": "file",
                "size": 625,
                "name": "README.md",
                "path": "README.md",
                "sha": "3f3f005b29247e51a4f4d6b8ce07b67646cd6074"
            },
            {
                "type": "submodule",
                "size": 0,
                "name": "vendor",
                "path": "vendor",
                "sha": "c0c2b0d5a6c3ee7a3a9c0b3fbd7a4c9e2d5e1a77",
                "submodule_git_url": "git://github.com/example/vendor.git"
            }
        ]"#;

        let record: ContentRecord = serde_json::from_str(body).unwrap();
        let ContentRecord::Listing(items) = record else {
            panic!("expected a listing");
        };
        let kinds: Vec<_> = items.iter().map(|item| item.kind).collect();
        assert_eq!(
            kinds,
            vec![EntryKind::Dir, EntryKind::File, EntryKind::Submodule]
        );
        assert!(items.iter().all(|item| item.content.is_none()));
    }

    #[test]
    fn test_single_element_listing_stays_a_listing() {
        let body = r#"[{"type": "file", "size": 1, "name": "a", "path": "d/a", "sha": "1"}]"#;
        let record: ContentRecord = serde_json::from_str(body).unwrap();
        assert!(matches!(record, ContentRecord::Listing(items) if items.len() == 1));
    }
}
