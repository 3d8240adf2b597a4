//! GitHub API response types
//!
//! Only the fields the connector reads are modelled.

use serde::{Deserialize, Serialize};

/// Entry of a `GET /repos/{owner}/{repo}/contents/{path}` directory listing
///
/// See: https://docs.github.com/en/rest/repos/contents#get-repository-content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentEntry {
    /// `file`, `dir`, `symlink` or `submodule`
    #[serde(rename = "type")]
    pub kind: String,

    /// File name
    pub name: String,

    /// Path from the repository root
    pub path: String,
}

impl ContentEntry {
    /// Regular file with a `.json` extension
    pub fn is_json_file(&self) -> bool {
        self.kind == "file" && self.name.ends_with(".json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_listing_entry() {
        let entry: ContentEntry = serde_json::from_value(json!({
            "type": "file",
            "name": "team.json",
            "path": "bookmarks/team.json",
            "sha": "abc",
            "size": 120
        }))
        .unwrap();
        assert!(entry.is_json_file());

        let dir = ContentEntry {
            kind: "dir".to_string(),
            name: "nested.json".to_string(),
            path: "bookmarks/nested.json".to_string(),
        };
        assert!(!dir.is_json_file());
    }
}
