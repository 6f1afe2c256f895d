//! Label selector parsing and matching, using the same syntax as kubectl.
//!
//! Supported requirements: `key=value`, `key==value`, `key!=value`, `key`,
//! `!key`, `key in (a,b)` and `key notin (a,b)`, separated by commas.

use std::str::FromStr;

use serde_json::{Map, Value};

use crate::ClientError;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Requirement {
	Equals(String, String),
	NotEquals(String, String),
	In(String, Vec<String>),
	NotIn(String, Vec<String>),
	Exists(String),
	DoesNotExist(String),
}

impl Requirement {
	fn matches(&self, labels: Option<&Map<String, Value>>) -> bool {
		let get = |key: &str| labels.and_then(|l| l.get(key)).and_then(Value::as_str);
		match self {
			Self::Equals(key, value) => get(key) == Some(value.as_str()),
			Self::NotEquals(key, value) => get(key) != Some(value.as_str()),
			Self::In(key, values) => get(key).is_some_and(|v| values.iter().any(|x| x == v)),
			Self::NotIn(key, values) => !get(key).is_some_and(|v| values.iter().any(|x| x == v)),
			Self::Exists(key) => get(key).is_some(),
			Self::DoesNotExist(key) => get(key).is_none(),
		}
	}
}

/// A parsed label selector. The empty selector matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelSelector {
	requirements: Vec<Requirement>,
}

impl LabelSelector {
	pub fn is_empty(&self) -> bool {
		self.requirements.is_empty()
	}

	/// Whether an object's labels satisfy every requirement.
	pub fn matches(&self, labels: Option<&Map<String, Value>>) -> bool {
		self.requirements.iter().all(|r| r.matches(labels))
	}

	/// Match against an object's `metadata.labels`.
	pub fn matches_object(&self, object: &Value) -> bool {
		let labels = object.pointer("/metadata/labels").and_then(Value::as_object);
		self.matches(labels)
	}
}

impl FromStr for LabelSelector {
	type Err = ClientError;

	fn from_str(selector: &str) -> Result<Self, Self::Err> {
		let invalid = |reason: &str| ClientError::InvalidSelector {
			selector: selector.to_string(),
			reason: reason.to_string(),
		};

		let mut requirements = Vec::new();
		for term in split_terms(selector) {
			let term = term.trim();
			if term.is_empty() {
				if selector.trim().is_empty() {
					continue;
				}
				return Err(invalid("empty requirement"));
			}
			requirements.push(parse_requirement(term).map_err(invalid)?);
		}
		Ok(Self { requirements })
	}
}

/// Split on commas that are not inside a parenthesised value set.
fn split_terms(selector: &str) -> Vec<&str> {
	let mut terms = Vec::new();
	let mut depth = 0usize;
	let mut start = 0;
	for (i, c) in selector.char_indices() {
		match c {
			'(' => depth += 1,
			')' => depth = depth.saturating_sub(1),
			',' if depth == 0 => {
				terms.push(&selector[start..i]);
				start = i + 1;
			}
			_ => {}
		}
	}
	terms.push(&selector[start..]);
	terms
}

fn parse_requirement(term: &str) -> Result<Requirement, &'static str> {
	if let Some(key) = term.strip_prefix('!') {
		return Ok(Requirement::DoesNotExist(parse_key(key)?));
	}
	if let Some((key, values)) = term.split_once(" notin ") {
		return Ok(Requirement::NotIn(parse_key(key)?, parse_set(values)?));
	}
	if let Some((key, values)) = term.split_once(" in ") {
		return Ok(Requirement::In(parse_key(key)?, parse_set(values)?));
	}
	if let Some((key, value)) = term.split_once("!=") {
		return Ok(Requirement::NotEquals(parse_key(key)?, value.trim().to_string()));
	}
	if let Some((key, value)) = term.split_once("==").or_else(|| term.split_once('=')) {
		return Ok(Requirement::Equals(parse_key(key)?, value.trim().to_string()));
	}
	Ok(Requirement::Exists(parse_key(term)?))
}

fn parse_key(key: &str) -> Result<String, &'static str> {
	let key = key.trim();
	if key.is_empty() {
		return Err("empty key");
	}
	if key.contains(char::is_whitespace) || key.contains(['(', ')', '=', '!']) {
		return Err("invalid key");
	}
	Ok(key.to_string())
}

fn parse_set(values: &str) -> Result<Vec<String>, &'static str> {
	let inner = values
		.trim()
		.strip_prefix('(')
		.and_then(|v| v.strip_suffix(')'))
		.ok_or("expected parenthesised value set")?;
	Ok(inner
		.split(',')
		.map(str::trim)
		.filter(|v| !v.is_empty())
		.map(str::to_string)
		.collect())
}
