//! Canonicalization of Jupyter notebook JSON.
//!
//! Notebook tools (Colab, VS Code, Jupyter itself) each make their own
//! choices about field ordering and update inconsequential fields like
//! execution counts, which buries the real changes of a revision in spurious
//! diffs. Rewriting every notebook into one canonical form keeps diffs
//! reviewable.

use serde_json::Value;

const EXECUTION_COUNT: &str = "execution_count";

/// Canonicalizes a parsed notebook in place.
///
/// Every `execution_count` member, at any nesting depth, is reset to `null`;
/// nested objects and lists are walked recursively.
pub fn canonicalize(value: &mut Value) {
    match value {
        Value::Object(members) => {
            if let Some(count) = members.get_mut(EXECUTION_COUNT) {
                *count = Value::Null;
            }
            for (_, nested) in members.iter_mut() {
                canonicalize(nested);
            }
        }
        Value::Array(items) => {
            for item in items.iter_mut() {
                canonicalize(item);
            }
        }
        _ => {}
    }
}

/// Parses notebook JSON and returns its canonical form: execution counts
/// reset, object members in sorted key order, 2-space indent, and no
/// trailing newline.
pub fn canonicalize_str(input: &str) -> serde_json::Result<String> {
    let mut notebook: Value = serde_json::from_str(input)?;
    canonicalize(&mut notebook);
    serde_json::to_string_pretty(&sort_keys(notebook))
}

/// Rebuilds objects with their members in sorted key order.
fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(members) => {
            let mut entries: Vec<(String, Value)> = members.into_iter().collect();
            entries.sort_by(|(a, _), (b, _)| a.cmp(b));

            let mut sorted = serde_json::Map::new();
            for (key, nested) in entries {
                sorted.insert(key, sort_keys(nested));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}
