//! Result payload flattening and alias resolution
//!
//! Tool outputs are heterogeneous nested JSON. Flattening turns them into
//! `(dotted.path[idx], scalar)` pairs in walk order; resolution then finds a
//! field by trying a list of name aliases. An alias matching a path's leaf
//! token exactly (case-insensitive) beats an alias appearing anywhere in the
//! path, and within a tier the shortest path wins, favoring less-nested,
//! more canonical locations.

use serde_json::Value;

/// Flattened payload: unique paths in walk order, scalar leaves only.
pub type FlatMap = Vec<(String, Value)>;

/// Recursively flatten `value` under `prefix`. Maps expand to `prefix.key`,
/// arrays to `prefix[idx]`; composite values are never retained as leaves.
pub fn flatten(value: &Value, prefix: &str, out: &mut FlatMap) {
    match value {
        Value::Object(map) => {
            for (key, nested) in map {
                let next = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten(nested, &next, out);
            }
        }
        Value::Array(items) => {
            for (idx, nested) in items.iter().enumerate() {
                flatten(nested, &format!("{prefix}[{idx}]"), out);
            }
        }
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => {
            out.push((prefix.to_string(), value.clone()));
        }
    }
}

/// Substring after the last `.`, truncated before any `[`.
pub fn leaf_token(path: &str) -> &str {
    let token = match path.rfind('.') {
        Some(idx) => &path[idx + 1..],
        None => path,
    };
    match token.find('[') {
        Some(idx) => &token[..idx],
        None => token,
    }
}

/// Resolve the best-matching path for any of the aliases.
pub fn pick_value<'a>(flat: &'a FlatMap, aliases: &[&str]) -> Option<(&'a Value, &'a str)> {
    let mut exact_hits: Vec<(&str, &Value)> = Vec::new();
    let mut loose_hits: Vec<(&str, &Value)> = Vec::new();

    for (path, value) in flat {
        let lowered_leaf = leaf_token(path).to_lowercase();
        let lowered_path = path.to_lowercase();
        for alias in aliases {
            let alias_lower = alias.to_lowercase();
            if lowered_leaf == alias_lower {
                exact_hits.push((path, value));
                break;
            }
            if lowered_path.contains(&alias_lower) {
                loose_hits.push((path, value));
                break;
            }
        }
    }

    // Stable sort keeps walk order among equal-length paths.
    exact_hits.sort_by_key(|(path, _)| path.len());
    loose_hits.sort_by_key(|(path, _)| path.len());

    exact_hits
        .into_iter()
        .chain(loose_hits)
        .next()
        .map(|(path, value)| (value, path))
}

/// Resolve a non-empty trimmed string field.
pub fn pick_string(flat: &FlatMap, aliases: &[&str]) -> Option<(String, String)> {
    let (value, path) = pick_value(flat, aliases)?;
    let text = value.as_str()?.trim();
    if text.is_empty() {
        return None;
    }
    Some((text.to_string(), path.to_string()))
}

/// Resolve a numeric field. Numeric strings are coerced; booleans never are.
pub fn pick_float(flat: &FlatMap, aliases: &[&str]) -> Option<(f64, String)> {
    let (value, path) = pick_value(flat, aliases)?;
    let number = coerce_float(value)?;
    Some((number, path.to_string()))
}

/// Resolve a boolean field, accepting common string spellings.
pub fn pick_bool(flat: &FlatMap, aliases: &[&str]) -> Option<(bool, String)> {
    let (value, path) = pick_value(flat, aliases)?;
    match value {
        Value::Bool(flag) => Some((*flag, path.to_string())),
        Value::String(text) => match text.trim().to_lowercase().as_str() {
            "true" | "yes" | "1" | "on" => Some((true, path.to_string())),
            "false" | "no" | "0" | "off" => Some((false, path.to_string())),
            _ => None,
        },
        _ => None,
    }
}

/// Numeric coercion shared by field resolution and ADMET metric lookup.
pub fn coerce_float(value: &Value) -> Option<f64> {
    match value {
        Value::Bool(_) => None,
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }
}
