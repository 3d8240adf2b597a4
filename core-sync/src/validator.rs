//! Schema validation
//!
//! Turns a raw JSON document into a [`BookmarkCollection`], reporting every
//! structural problem at once instead of stopping at the first.
//!
//! Item kinds are taken from an explicit `type` when present and otherwise
//! inferred: `children` means folder, `url` means bookmark.

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{Result, SyncError, ValidationIssue};
use crate::model::{BookmarkCollection, BookmarkItem, SUPPORTED_SCHEMA};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ItemKind {
    Bookmark,
    Folder,
    Separator,
}

/// Validate a single document
pub fn validate(document: &Value) -> Result<BookmarkCollection> {
    let mut issues = Vec::new();
    let collection = collection(document, &mut issues);

    match collection {
        Some(collection) if issues.is_empty() => Ok(collection),
        _ => Err(SyncError::SchemaInvalid { issues }),
    }
}

/// Validate documents in order; the first invalid one fails the batch
pub fn validate_all(documents: &[Value]) -> Result<Vec<BookmarkCollection>> {
    documents
        .iter()
        .enumerate()
        .map(|(index, document)| {
            let collection = validate(document)?;
            debug!(
                document = index,
                name = %collection.name,
                items = collection.bookmarks.len(),
                "Validated bookmark document"
            );
            Ok(collection)
        })
        .collect()
}

fn collection(document: &Value, issues: &mut Vec<ValidationIssue>) -> Option<BookmarkCollection> {
    let Some(root) = document.as_object() else {
        issues.push(ValidationIssue::new("$", "expected an object"));
        return None;
    };

    let schema = match root.get("$schema") {
        None => {
            issues.push(ValidationIssue::new("$schema", "missing"));
            None
        }
        Some(Value::String(schema)) if schema == SUPPORTED_SCHEMA => Some(schema.clone()),
        Some(Value::String(schema)) => {
            issues.push(ValidationIssue::new(
                "$schema",
                format!("unsupported schema '{}', expected '{}'", schema, SUPPORTED_SCHEMA),
            ));
            None
        }
        Some(_) => {
            issues.push(ValidationIssue::new("$schema", "expected a string"));
            None
        }
    };

    let name = match root.get("name") {
        Some(Value::String(name)) => Some(name.clone()),
        Some(_) => {
            issues.push(ValidationIssue::new("name", "expected a string"));
            None
        }
        None => {
            issues.push(ValidationIssue::new("name", "missing"));
            None
        }
    };

    let bookmarks = match root.get("bookmarks") {
        Some(Value::Array(values)) => items(values, "bookmarks", issues),
        Some(_) => {
            issues.push(ValidationIssue::new("bookmarks", "expected an array"));
            None
        }
        None => {
            issues.push(ValidationIssue::new("bookmarks", "missing"));
            None
        }
    };

    Some(BookmarkCollection {
        schema: schema?,
        name: name?,
        bookmarks: bookmarks?,
    })
}

fn items(values: &[Value], path: &str, issues: &mut Vec<ValidationIssue>) -> Option<Vec<BookmarkItem>> {
    // Visit every element even after a failure so all issues are reported
    let parsed: Vec<Option<BookmarkItem>> = values
        .iter()
        .enumerate()
        .map(|(index, value)| item(value, &format!("{}[{}]", path, index), issues))
        .collect();
    parsed.into_iter().collect()
}

fn item(value: &Value, path: &str, issues: &mut Vec<ValidationIssue>) -> Option<BookmarkItem> {
    let Some(fields) = value.as_object() else {
        issues.push(ValidationIssue::new(path, "expected an object"));
        return None;
    };

    match kind(fields, path, issues)? {
        ItemKind::Bookmark => {
            if fields.contains_key("children") {
                issues.push(ValidationIssue::new(
                    format!("{}.children", path),
                    "a bookmark cannot have children",
                ));
            }
            let title = non_empty_string(fields, "title", path, issues);
            let url = non_empty_string(fields, "url", path, issues);
            Some(BookmarkItem::Bookmark {
                title: title?,
                url: url?,
            })
        }
        ItemKind::Folder => {
            if fields.contains_key("url") {
                issues.push(ValidationIssue::new(
                    format!("{}.url", path),
                    "a folder cannot have a url",
                ));
            }
            let title = non_empty_string(fields, "title", path, issues);
            let children_path = format!("{}.children", path);
            let children = match fields.get("children") {
                Some(Value::Array(values)) => items(values, &children_path, issues),
                Some(_) => {
                    issues.push(ValidationIssue::new(children_path, "expected an array"));
                    None
                }
                None => {
                    issues.push(ValidationIssue::new(children_path, "missing"));
                    None
                }
            };
            Some(BookmarkItem::Folder {
                title: title?,
                children: children?,
            })
        }
        ItemKind::Separator => {
            let mut valid = true;
            for field in ["title", "url", "children"] {
                if fields.contains_key(field) {
                    issues.push(ValidationIssue::new(
                        format!("{}.{}", path, field),
                        "a separator cannot carry this field",
                    ));
                    valid = false;
                }
            }
            valid.then_some(BookmarkItem::Separator)
        }
    }
}

fn kind(fields: &Map<String, Value>, path: &str, issues: &mut Vec<ValidationIssue>) -> Option<ItemKind> {
    match fields.get("type") {
        Some(Value::String(tag)) => match tag.as_str() {
            "bookmark" => Some(ItemKind::Bookmark),
            "folder" => Some(ItemKind::Folder),
            "separator" => Some(ItemKind::Separator),
            other => {
                issues.push(ValidationIssue::new(
                    format!("{}.type", path),
                    format!("unknown item type '{}'", other),
                ));
                None
            }
        },
        Some(_) => {
            issues.push(ValidationIssue::new(format!("{}.type", path), "expected a string"));
            None
        }
        None if fields.contains_key("children") => Some(ItemKind::Folder),
        None if fields.contains_key("url") => Some(ItemKind::Bookmark),
        None => {
            issues.push(ValidationIssue::new(
                path,
                "cannot determine item kind: expected 'url', 'children' or 'type'",
            ));
            None
        }
    }
}

fn non_empty_string(
    fields: &Map<String, Value>,
    field: &str,
    path: &str,
    issues: &mut Vec<ValidationIssue>,
) -> Option<String> {
    let field_path = format!("{}.{}", path, field);
    match fields.get(field) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
        Some(Value::String(_)) => {
            issues.push(ValidationIssue::new(field_path, "must not be empty"));
            None
        }
        Some(_) => {
            issues.push(ValidationIssue::new(field_path, "expected a string"));
            None
        }
        None => {
            issues.push(ValidationIssue::new(field_path, "missing"));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn document(bookmarks: Value) -> Value {
        json!({
            "$schema": SUPPORTED_SCHEMA,
            "name": "Team",
            "bookmarks": bookmarks,
        })
    }

    fn issues(result: Result<BookmarkCollection>) -> Vec<ValidationIssue> {
        match result {
            Err(SyncError::SchemaInvalid { issues }) => issues,
            other => panic!("expected SchemaInvalid, got {:?}", other),
        }
    }

    #[test]
    fn test_valid_document_with_inferred_and_explicit_kinds() {
        let collection = validate(&document(json!([
            { "title": "Docs", "url": "https://docs.rs" },
            { "title": "Work", "children": [
                { "type": "separator" },
                { "type": "folder", "title": "Empty", "children": [] }
            ]},
            { "type": "bookmark", "title": "Crates", "url": "https://crates.io" }
        ])))
        .unwrap();

        assert_eq!(collection.name, "Team");
        assert_eq!(
            collection.bookmarks,
            vec![
                BookmarkItem::bookmark("Docs", "https://docs.rs"),
                BookmarkItem::folder(
                    "Work",
                    vec![BookmarkItem::Separator, BookmarkItem::folder("Empty", vec![])]
                ),
                BookmarkItem::bookmark("Crates", "https://crates.io"),
            ]
        );
    }

    #[test]
    fn test_schema_mismatch_is_rejected() {
        let mut doc = document(json!([]));
        doc["$schema"] = json!("urn:bookmark-sync:collection:v0");
        let found = issues(validate(&doc));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].path, "$schema");

        let mut doc = document(json!([]));
        doc.as_object_mut().unwrap().remove("$schema");
        assert_eq!(issues(validate(&doc))[0].message, "missing");
    }

    #[test]
    fn test_every_issue_is_reported_with_its_path() {
        let found = issues(validate(&document(json!([
            { "title": "", "url": "http://a" },
            { "title": "Work", "children": [ { "title": "No url" }, "text" ] },
            { "type": "separator", "title": "Line" },
            { "type": "link", "title": "X" }
        ]))));

        let paths: Vec<&str> = found.iter().map(|i| i.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "bookmarks[0].title",
                "bookmarks[1].children[0]",
                "bookmarks[1].children[1]",
                "bookmarks[2].title",
                "bookmarks[3].type",
            ]
        );
    }

    #[test]
    fn test_root_shape() {
        assert_eq!(issues(validate(&json!([])))[0].path, "$");

        let found = issues(validate(&json!({ "$schema": SUPPORTED_SCHEMA, "name": 3 })));
        let paths: Vec<&str> = found.iter().map(|i| i.path.as_str()).collect();
        assert_eq!(paths, vec!["name", "bookmarks"]);
    }

    #[test]
    fn test_kind_conflicts() {
        let found = issues(validate(&document(json!([
            { "type": "folder", "title": "F", "url": "http://x", "children": [] },
            { "type": "bookmark", "title": "B", "url": "http://y", "children": [] }
        ]))));
        let paths: Vec<&str> = found.iter().map(|i| i.path.as_str()).collect();
        assert_eq!(paths, vec!["bookmarks[0].url", "bookmarks[1].children"]);
    }

    #[test]
    fn test_validate_all_stops_on_invalid_document() {
        let good = document(json!([{ "title": "A", "url": "x" }]));
        let bad = json!({ "$schema": "other", "name": "n", "bookmarks": [] });
        assert_eq!(validate_all(&[good.clone()]).unwrap().len(), 1);
        assert!(matches!(
            validate_all(&[good, bad]),
            Err(SyncError::SchemaInvalid { .. })
        ));
    }
}
