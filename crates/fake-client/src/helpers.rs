//! JSON patch helpers for the object tracker.

use serde_json::{Map, Value};

/// Apply a JSON merge patch (RFC 7386) to `base`.
///
/// Objects are merged recursively, `null` removes a key, anything else
/// replaces the base value.
pub fn merge_json(base: Value, patch: Value) -> Value {
	let Value::Object(patch_map) = patch else {
		return patch;
	};
	let mut base_map = match base {
		Value::Object(map) => map,
		_ => Map::new(),
	};

	for (key, patch_value) in patch_map {
		if patch_value.is_null() {
			base_map.remove(&key);
			continue;
		}
		match base_map.get_mut(&key) {
			Some(existing) => {
				let merged = merge_json(existing.take(), patch_value);
				*existing = merged;
			}
			None => {
				base_map.insert(key, merge_json(Value::Null, patch_value));
			}
		}
	}
	Value::Object(base_map)
}

/// Strip strategic merge patch directives from a JSON value.
///
/// Strategic merge patch uses special keys like `$setElementOrder/xxx`, `$patch`,
/// and `$retainKeys` to control merge behavior. These are instructions for the
/// server, not actual resource content, so they must not be stored.
pub fn strip_strategic_merge_directives(value: Value) -> Value {
	match value {
		Value::Object(map) => {
			let cleaned: Map<String, Value> = map
				.into_iter()
				.filter(|(key, _)| !is_strategic_directive(key))
				.map(|(key, val)| (key, strip_strategic_merge_directives(val)))
				.collect();
			Value::Object(cleaned)
		}
		Value::Array(arr) => Value::Array(
			arr.into_iter()
				.map(strip_strategic_merge_directives)
				.collect(),
		),
		other => other,
	}
}

/// All strategic merge patch directives start with `$`.
fn is_strategic_directive(key: &str) -> bool {
	key.starts_with('$')
}
