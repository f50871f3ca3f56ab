//! Use a GitHub repository branch as a small remote file store.
//!
//! ```no_run
//! use cdnhub::{ContentOptions, ContentStore};
//!
//! # async fn demo() -> cdnhub::error::StorageResult<()> {
//! let store = ContentStore::connect("clqu/cdnhub", None, "ghp_...")?;
//! store.put("test-folder/hello.txt", b"Hello, CDNHub!", None).await?;
//! let files = store.contents("test-folder", ContentOptions::default()).await?;
//! let tree = store.tree(ContentOptions::default()).await?;
//! store.drop("test-folder/hello.txt", None).await?;
//! # let _ = (files, tree);
//! # Ok(())
//! # }
//! ```

pub mod coder;
pub mod error;
pub mod storage;

pub use storage::{
    ContentApi, ContentOptions, ContentRecord, ContentStore, EntryKind, FileEntry, GitHubContents,
    MemoryContents, RepositoryContext, TreeNode, TOOL_TAG,
};
