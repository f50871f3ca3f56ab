use std::fmt;

use error_stack::Report;

use crate::error::{StorageError, StorageResult};

/// Fixed target of every remote call made by a client.
#[derive(Clone, PartialEq, Eq)]
pub struct RepositoryContext {
    owner: String,
    repo: String,
    branch: String,
    token: String,
}

impl fmt::Display for RepositoryContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RepositoryContext(owner={}, repo={}, branch={})",
            self.owner, self.repo, self.branch
        )
    }
}

impl fmt::Debug for RepositoryContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RepositoryContext")
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("branch", &self.branch)
            .field("token", &"<redacted>")
            .finish()
    }
}

impl RepositoryContext {
    pub const DEFAULT_BRANCH: &'static str = "main";

    /// Parse an `owner/repo` identifier.
    pub fn new(repo: &str, branch: Option<&str>, token: &str) -> StorageResult<Self> {
        let (owner, name) = match repo.split('/').collect::<Vec<_>>().as_slice() {
            [owner, name] if !owner.is_empty() && !name.is_empty() => (*owner, *name),
            _ => {
                return Err(Report::new(StorageError::InvalidArgument(format!(
                    "invalid repository `{}`, expected `owner/repo`",
                    repo
                ))));
            }
        };

        let branch = branch.unwrap_or(Self::DEFAULT_BRANCH);
        if branch.is_empty() {
            return Err(Report::new(StorageError::InvalidArgument(
                "branch cannot be empty".into(),
            )));
        }

        Ok(RepositoryContext {
            owner: owner.to_string(),
            repo: name.to_string(),
            branch: branch.to_string(),
            token: token.to_string(),
        })
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn repo(&self) -> &str {
        &self.repo
    }

    pub fn branch(&self) -> &str {
        &self.branch
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}
