//! Embedded structured data
//!
//! Product pages carry JSON payloads next to the markup: JSON-LD blocks and the
//! framework hydration payload. These are parsed once per page into generic
//! [`serde_json::Value`] trees and searched by key name.

use scraper::{Html, Selector};
use serde_json::Value;

/// Script elements known to carry JSON payloads
const JSON_SCRIPT_SELECTOR: &str =
    r#"script[type="application/ld+json"], script#__NEXT_DATA__, script[type="application/json"]"#;

/// Maximum nesting depth explored by the recursive searches
pub const MAX_DEPTH: usize = 16;

/// Parses every embedded JSON block of the document, skipping malformed ones
pub fn collect_json_blocks(document: &Html) -> Vec<Value> {
    let Ok(selector) = Selector::parse(JSON_SCRIPT_SELECTOR) else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|script| {
            let raw: String = script.text().collect();
            let raw = raw.trim();
            if raw.is_empty() {
                return None;
            }
            match serde_json::from_str::<Value>(raw) {
                Ok(value) => Some(value),
                Err(e) => {
                    tracing::trace!("Skipping malformed embedded JSON: {}", e);
                    None
                }
            }
        })
        .collect()
}

/// Recursively searches `value` for the first key whose lower-cased name
/// contains one of `needles`, returning its scalar rendering
///
/// An object found under a matching key resolves to its `name` member; a
/// sequence resolves to its first resolvable element. Values rejected by
/// `accept` do not end the search.
pub fn find_by_key(value: &Value, needles: &[&str], accept: &dyn Fn(&str) -> bool) -> Option<String> {
    find_by_key_at(value, needles, accept, 0)
}

fn find_by_key_at(
    value: &Value,
    needles: &[&str],
    accept: &dyn Fn(&str) -> bool,
    depth: usize,
) -> Option<String> {
    if depth > MAX_DEPTH {
        return None;
    }

    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let key = key.to_lowercase();
                if needles.iter().any(|needle| key.contains(needle)) {
                    if let Some(found) = scalar(child).filter(|s| accept(s)) {
                        return Some(found);
                    }
                }
            }
            map.values()
                .find_map(|child| find_by_key_at(child, needles, accept, depth + 1))
        }
        Value::Array(items) => items
            .iter()
            .find_map(|item| find_by_key_at(item, needles, accept, depth + 1)),
        _ => None,
    }
}

/// Renders a JSON value as a field string
fn scalar(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Object(map) => return map.get("name").and_then(scalar),
        Value::Array(items) => return items.iter().find_map(scalar),
        Value::Bool(_) | Value::Null => return None,
    };
    Some(text).filter(|s| !s.is_empty())
}

/// Finds the first node whose `@type` equals (or lists) `type_name`
pub fn find_typed<'a>(value: &'a Value, type_name: &str) -> Option<&'a Value> {
    find_typed_at(value, type_name, 0)
}

fn find_typed_at<'a>(value: &'a Value, type_name: &str, depth: usize) -> Option<&'a Value> {
    if depth > MAX_DEPTH {
        return None;
    }

    match value {
        Value::Object(map) => {
            let matches = match map.get("@type") {
                Some(Value::String(t)) => t == type_name,
                Some(Value::Array(types)) => types.iter().any(|t| t.as_str() == Some(type_name)),
                _ => false,
            };
            if matches {
                return Some(value);
            }
            map.values()
                .find_map(|child| find_typed_at(child, type_name, depth + 1))
        }
        Value::Array(items) => items
            .iter()
            .find_map(|item| find_typed_at(item, type_name, depth + 1)),
        _ => None,
    }
}

/// Follows `path` from `value`, stepping into the first element of any sequence
pub fn follow_path(value: &Value, path: &[&str]) -> Option<String> {
    let mut current = value;
    for key in path {
        if let Value::Array(items) = current {
            current = items.first()?;
        }
        current = current.get(*key)?;
    }
    scalar(current)
}

/// Item names of a schema.org `BreadcrumbList`, in position order
pub fn breadcrumb_names(list: &Value) -> Vec<String> {
    let Some(Value::Array(items)) = list.get("itemListElement") else {
        return Vec::new();
    };

    let mut entries: Vec<(i64, String)> = items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| {
            let name = item
                .get("name")
                .or_else(|| item.get("item").and_then(|i| i.get("name")))
                .and_then(Value::as_str)?
                .trim()
                .to_string();
            let position = item
                .get("position")
                .and_then(Value::as_i64)
                .unwrap_or(index as i64);
            Some((position, name)).filter(|(_, n)| !n.is_empty())
        })
        .collect();

    entries.sort_by_key(|(position, _)| *position);
    entries.into_iter().map(|(_, name)| name).collect()
}
