//! Cluster capability annotations.

use serde::{Deserialize, Serialize};

use crate::ExclusionError;

/// Annotation listing the capabilities a manifest belongs to, joined with `+`.
pub const CAPABILITY_ANNOTATION: &str = "capability.openshift.io/name";

/// Capabilities known to a release and the subset enabled on a cluster.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterCapabilities {
	#[serde(default)]
	pub known_capabilities: Vec<String>,
	#[serde(default)]
	pub enabled_capabilities: Vec<String>,
}

/// Split a capability annotation value into capability names.
pub fn parse_capabilities(value: &str) -> Vec<String> {
	// An empty annotation names no capabilities, not a single empty one
	if value.is_empty() {
		return Vec::new();
	}
	value.split('+').map(str::to_string).collect()
}

/// Check that every requested capability is known and enabled.
///
/// All unknown capabilities are reported together; disabled capabilities are
/// only reported when every capability is known.
pub fn check_capabilities(
	requested: &[String],
	capabilities: &ClusterCapabilities,
) -> Result<(), ExclusionError> {
	let mut unknown = Vec::new();
	let mut disabled = Vec::new();

	for capability in requested {
		if !capabilities.known_capabilities.contains(capability) {
			unknown.push(capability.clone());
			continue;
		}
		if !capabilities.enabled_capabilities.contains(capability) {
			disabled.push(capability.clone());
		}
	}

	if !unknown.is_empty() {
		return Err(ExclusionError::UnrecognizedCapability(unknown));
	}
	if !disabled.is_empty() {
		return Err(ExclusionError::DisabledCapability(disabled));
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use assert_matches::assert_matches;
	use rstest::rstest;

	use super::*;

	fn caps(known: &[&str], enabled: &[&str]) -> ClusterCapabilities {
		ClusterCapabilities {
			known_capabilities: known.iter().map(|s| s.to_string()).collect(),
			enabled_capabilities: enabled.iter().map(|s| s.to_string()).collect(),
		}
	}

	fn names(names: &[&str]) -> Vec<String> {
		names.iter().map(|s| s.to_string()).collect()
	}

	#[rstest]
	#[case::empty("", &[])]
	#[case::single("Storage", &["Storage"])]
	#[case::several("Storage+Build+Console", &["Storage", "Build", "Console"])]
	fn test_parse_capabilities(#[case] value: &str, #[case] expected: &[&str]) {
		assert_eq!(parse_capabilities(value), names(expected));
	}

	#[test]
	fn test_disabled_capability() {
		let result = check_capabilities(
			&names(&["Storage", "Build"]),
			&caps(&["Storage", "Build", "Console"], &["Storage"]),
		);
		assert_matches!(result, Err(ExclusionError::DisabledCapability(disabled)) if disabled == ["Build"]);
	}

	#[test]
	fn test_unknown_capability_takes_precedence() {
		let result = check_capabilities(&names(&["Unknown1", "Storage"]), &caps(&["Storage"], &[]));
		assert_matches!(result, Err(ExclusionError::UnrecognizedCapability(unknown)) if unknown == ["Unknown1"]);
	}

	#[test]
	fn test_all_unknown_reported() {
		let err = check_capabilities(&names(&["A", "Storage", "B"]), &caps(&["Storage"], &["Storage"]))
			.unwrap_err();
		assert_eq!(err.to_string(), "unrecognized capability names: A, B");
	}

	#[test]
	fn test_all_disabled_reported() {
		let err = check_capabilities(&names(&["A", "B"]), &caps(&["A", "B"], &[])).unwrap_err();
		assert_eq!(err.to_string(), "disabled capabilities: A, B");
	}

	#[test]
	fn test_enabled_capabilities_pass() {
		assert!(check_capabilities(&names(&["A"]), &caps(&["A"], &["A"])).is_ok());
		assert!(check_capabilities(&[], &caps(&[], &[])).is_ok());
	}

	#[test]
	fn test_deserialize_camel_case() {
		let parsed: ClusterCapabilities = serde_json::from_str(
			r#"{"knownCapabilities": ["A", "B"], "enabledCapabilities": ["A"]}"#,
		)
		.unwrap();
		assert_eq!(parsed, caps(&["A", "B"], &["A"]));
	}
}
