//! Field-level diff between two JSON snapshots

use serde_json::Value;

const MAX_TEXT: usize = 47;

/// Describe top-level changes as `field: old -> new`, comma separated
///
/// Returns `None` when nothing changed.
pub fn generate_diff(before: &Value, after: &Value) -> Option<String> {
    let changes = match (before, after) {
        (Value::Object(old), Value::Object(new)) => {
            let mut changes: Vec<String> = old
                .iter()
                .filter_map(|(key, old_val)| match new.get(key) {
                    Some(new_val) if new_val == old_val => None,
                    Some(new_val) => Some(format!(
                        "{}: {} -> {}",
                        key,
                        format_value(old_val),
                        format_value(new_val)
                    )),
                    None => Some(format!("{}: {} -> (removed)", key, format_value(old_val))),
                })
                .collect();

            changes.extend(
                new.iter()
                    .filter(|(key, _)| !old.contains_key(*key))
                    .map(|(key, val)| format!("{}: (added) -> {}", key, format_value(val))),
            );
            changes
        }
        _ if before != after => vec![format!("{} -> {}", format_value(before), format_value(after))],
        _ => Vec::new(),
    };

    if changes.is_empty() {
        None
    } else {
        Some(changes.join(", "))
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) if s.chars().count() > MAX_TEXT + 3 => {
            format!("\"{}...\"", s.chars().take(MAX_TEXT).collect::<String>())
        }
        Value::String(s) => format!("\"{}\"", s),
        Value::Array(items) => format!("[{} items]", items.len()),
        Value::Object(fields) => format!("{{{} fields}}", fields.len()),
    }
}
