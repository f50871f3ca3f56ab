use serde::{Deserialize, Serialize};

use crate::coder;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Dir,
    Symlink,
    Submodule,
}

/// A listed entry of the repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileEntry {
    pub name: String,
    /// Path relative to the repository root.
    pub path: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub size: u64,
    /// Decoded file bytes, only for files and only when requested.
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "coder::serialize_optional"
    )]
    pub content: Option<Vec<u8>>,
}

impl FileEntry {
    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Dir
    }
}

/// A node of the recursive repository tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum TreeNode {
    File(FileEntry),
    Dir {
        #[serde(flatten)]
        entry: FileEntry,
        children: Vec<TreeNode>,
    },
}

impl TreeNode {
    pub fn entry(&self) -> &FileEntry {
        match self {
            TreeNode::File(entry) => entry,
            TreeNode::Dir { entry, .. } => entry,
        }
    }

    /// Children of a directory node, `None` for files.
    pub fn children(&self) -> Option<&[TreeNode]> {
        match self {
            TreeNode::File(_) => None,
            TreeNode::Dir { children, .. } => Some(children),
        }
    }

    pub fn name(&self) -> &str {
        &self.entry().name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn file(path: &str, content: Option<&[u8]>) -> FileEntry {
        FileEntry {
            name: path.rsplit('/').next().unwrap().to_string(),
            path: path.to_string(),
            kind: EntryKind::File,
            size: content.map_or(0, |c| c.len() as u64),
            content: content.map(|c| c.to_vec()),
        }
    }

    #[test]
    fn test_file_entry_serializes_type_and_base64_content() {
        let value = serde_json::to_value(file("a/b.txt", Some(&b"hi"[..]))).unwrap();
        assert_eq!(
            value,
            json!({ "name": "b.txt", "path": "a/b.txt", "type": "file", "size": 2, "content": "aGk=" })
        );
    }

    #[test]
    fn test_missing_content_is_omitted() {
        let value = serde_json::to_value(file("a/b.txt", None)).unwrap();
        assert!(value.get("content").is_none());
    }

    #[test]
    fn test_dir_node_serializes_children() {
        let node = TreeNode::Dir {
            entry: FileEntry {
                name: "a".into(),
                path: "a".into(),
                kind: EntryKind::Dir,
                size: 0,
                content: None,
            },
            children: vec![TreeNode::File(file("a/b.txt", None))],
        };

        let value = serde_json::to_value(&node).unwrap();
        assert_eq!(value["type"], "dir");
        assert_eq!(value["children"][0]["path"], "a/b.txt");
        assert_eq!(node.children().map(<[TreeNode]>::len), Some(1));
    }
}
