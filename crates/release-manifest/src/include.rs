//! Annotation-driven inclusion filter.

use bon::Builder;
use thiserror::Error;

use crate::{capability::check_capabilities, ClusterCapabilities, Manifest};

/// Cluster profile manifests are included in when no other profile is chosen.
pub const DEFAULT_CLUSTER_PROFILE: &str = "self-managed-high-availability";

pub const FEATURE_GATE_ANNOTATION: &str = "release.openshift.io/feature-gate";

/// The only recognised value of [`FEATURE_GATE_ANNOTATION`].
pub const TECH_PREVIEW_NO_UPGRADE: &str = "TechPreviewNoUpgrade";

const EXCLUDE_ANNOTATION_PREFIX: &str = "exclude.release.openshift.io/";
const INCLUDE_ANNOTATION_PREFIX: &str = "include.release.openshift.io/";

/// Reason a manifest must be excluded from further processing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExclusionError {
	#[error("no annotations")]
	NoAnnotations,

	#[error("{annotation}={value}")]
	Excluded { annotation: String, value: String },

	#[error("tech-preview excluded, and {annotation}={value}")]
	TechPreviewExcluded { annotation: String, value: String },

	#[error("unrecognized value {annotation}={value}")]
	UnrecognizedAnnotationValue { annotation: String, value: String },

	#[error("{annotation} unset")]
	AnnotationMissing { annotation: String },

	#[error("unrecognized capability names: {}", .0.join(", "))]
	UnrecognizedCapability(Vec<String>),

	#[error("disabled capabilities: {}", .0.join(", "))]
	DisabledCapability(Vec<String>),
}

/// Criteria a manifest must satisfy to be included.
///
/// Unset criteria do not filter. For example, a filter with only `profile`
/// set excludes manifests not tagged for that profile, but never complains
/// about capabilities.
#[derive(Debug, Clone, Default, PartialEq, Eq, Builder)]
pub struct InclusionFilter {
	/// Exclude manifests annotated `exclude.release.openshift.io/<id>: "true"`.
	#[builder(into)]
	pub exclude_identifier: Option<String>,

	/// Whether `TechPreviewNoUpgrade` feature-gated manifests are included.
	pub include_tech_preview: Option<bool>,

	/// Only include manifests annotated `include.release.openshift.io/<profile>: "true"`.
	#[builder(into)]
	pub profile: Option<String>,

	pub capabilities: Option<ClusterCapabilities>,
}

impl InclusionFilter {
	/// Whether no criterion is set.
	pub fn is_empty(&self) -> bool {
		self.exclude_identifier.is_none()
			&& self.include_tech_preview.is_none()
			&& self.profile.is_none()
			&& self.capabilities.is_none()
	}
}

impl Manifest {
	/// Check the manifest against an inclusion filter.
	///
	/// Returns the first reason to exclude it, checking the exclude
	/// identifier, feature gate, profile and capabilities in that order.
	/// A manifest without annotations is always rejected.
	pub fn include(&self, filter: &InclusionFilter) -> Result<(), ExclusionError> {
		let annotations = self.annotations().ok_or(ExclusionError::NoAnnotations)?;
		let get = |key: &str| annotations.get(key).and_then(|v| v.as_str());

		if let Some(identifier) = &filter.exclude_identifier {
			let annotation = format!("{EXCLUDE_ANNOTATION_PREFIX}{identifier}");
			if let Some(value @ "true") = get(&annotation) {
				return Err(ExclusionError::Excluded {
					annotation,
					value: value.to_string(),
				});
			}
		}

		if let Some(include_tech_preview) = filter.include_tech_preview {
			match get(FEATURE_GATE_ANNOTATION) {
				Some(value @ TECH_PREVIEW_NO_UPGRADE) if !include_tech_preview => {
					return Err(ExclusionError::TechPreviewExcluded {
						annotation: FEATURE_GATE_ANNOTATION.to_string(),
						value: value.to_string(),
					});
				}
				// Any other feature gate is never included, whatever the flag says
				Some(value) if value != TECH_PREVIEW_NO_UPGRADE => {
					return Err(ExclusionError::UnrecognizedAnnotationValue {
						annotation: FEATURE_GATE_ANNOTATION.to_string(),
						value: value.to_string(),
					});
				}
				_ => {}
			}
		}

		if let Some(profile) = &filter.profile {
			let annotation = format!("{INCLUDE_ANNOTATION_PREFIX}{profile}");
			match get(&annotation) {
				Some("true") => {}
				Some(value) => {
					let value = value.to_string();
					return Err(ExclusionError::UnrecognizedAnnotationValue { annotation, value });
				}
				None => return Err(ExclusionError::AnnotationMissing { annotation }),
			}
		}

		if let Some(capabilities) = &filter.capabilities {
			check_capabilities(&self.capabilities(), capabilities)?;
		}

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use assert_matches::assert_matches;
	use rstest::rstest;
	use serde_json::{json, Value};

	use super::*;

	fn manifest_with(annotations: Value) -> Manifest {
		Manifest::try_from(json!({
			"apiVersion": "v1",
			"kind": "ConfigMap",
			"metadata": {"name": "cm", "annotations": annotations},
		}))
		.unwrap()
	}

	fn caps(known: &[&str], enabled: &[&str]) -> ClusterCapabilities {
		ClusterCapabilities {
			known_capabilities: known.iter().map(|s| s.to_string()).collect(),
			enabled_capabilities: enabled.iter().map(|s| s.to_string()).collect(),
		}
	}

	#[test]
	fn test_no_annotations_always_fails() {
		let manifest = Manifest::try_from(json!({"kind": "Pod", "metadata": {"name": "p"}})).unwrap();
		assert_eq!(
			manifest.include(&InclusionFilter::default()),
			Err(ExclusionError::NoAnnotations)
		);
	}

	#[test]
	fn test_empty_filter_includes_annotated() {
		let manifest = manifest_with(json!({}));
		assert_eq!(manifest.include(&InclusionFilter::default()), Ok(()));
	}

	#[rstest]
	#[case::excluded("true", true)]
	#[case::false_value("false", false)]
	#[case::other_value("yes", false)]
	fn test_exclude_identifier(#[case] value: &str, #[case] excluded: bool) {
		let manifest = manifest_with(json!({"exclude.release.openshift.io/hypershift": value}));
		let filter = InclusionFilter::builder().exclude_identifier("hypershift").build();
		let result = manifest.include(&filter);
		if excluded {
			assert_eq!(
				result,
				Err(ExclusionError::Excluded {
					annotation: "exclude.release.openshift.io/hypershift".into(),
					value: "true".into(),
				})
			);
			assert_eq!(
				result.unwrap_err().to_string(),
				"exclude.release.openshift.io/hypershift=true"
			);
		} else {
			assert_eq!(result, Ok(()));
		}
	}

	#[test]
	fn test_exclude_identifier_other_id_passes() {
		let manifest = manifest_with(json!({"exclude.release.openshift.io/other": "true"}));
		let filter = InclusionFilter::builder().exclude_identifier("hypershift").build();
		assert_eq!(manifest.include(&filter), Ok(()));
	}

	#[test]
	fn test_tech_preview_excluded_when_disabled() {
		let manifest = manifest_with(json!({FEATURE_GATE_ANNOTATION: TECH_PREVIEW_NO_UPGRADE}));
		let filter = InclusionFilter::builder().include_tech_preview(false).build();
		assert_matches!(
			manifest.include(&filter),
			Err(ExclusionError::TechPreviewExcluded { .. })
		);
	}

	#[test]
	fn test_tech_preview_included_when_enabled() {
		let manifest = manifest_with(json!({FEATURE_GATE_ANNOTATION: TECH_PREVIEW_NO_UPGRADE}));
		let filter = InclusionFilter::builder().include_tech_preview(true).build();
		assert_eq!(manifest.include(&filter), Ok(()));
	}

	#[rstest]
	#[case::include_enabled(true)]
	#[case::include_disabled(false)]
	fn test_unrecognized_feature_gate_always_excluded(#[case] include_tech_preview: bool) {
		let manifest = manifest_with(json!({FEATURE_GATE_ANNOTATION: "CustomNoUpgrade"}));
		let filter = InclusionFilter::builder()
			.include_tech_preview(include_tech_preview)
			.build();
		let err = manifest.include(&filter).unwrap_err();
		assert_eq!(
			err.to_string(),
			"unrecognized value release.openshift.io/feature-gate=CustomNoUpgrade"
		);
	}

	#[test]
	fn test_empty_feature_gate_is_unrecognized() {
		let manifest = manifest_with(json!({FEATURE_GATE_ANNOTATION: ""}));
		let filter = InclusionFilter::builder().include_tech_preview(true).build();
		assert_matches!(
			manifest.include(&filter),
			Err(ExclusionError::UnrecognizedAnnotationValue { value, .. }) if value.is_empty()
		);
	}

	#[test]
	fn test_feature_gate_ignored_without_criterion() {
		let manifest = manifest_with(json!({FEATURE_GATE_ANNOTATION: "Anything"}));
		assert_eq!(manifest.include(&InclusionFilter::default()), Ok(()));
	}

	#[test]
	fn test_profile_unset() {
		let manifest = manifest_with(json!({"other": "x"}));
		let filter = InclusionFilter::builder().profile(DEFAULT_CLUSTER_PROFILE).build();
		let err = manifest.include(&filter).unwrap_err();
		assert_eq!(
			err.to_string(),
			"include.release.openshift.io/self-managed-high-availability unset"
		);
	}

	#[test]
	fn test_profile_included() {
		let manifest = manifest_with(json!({
			"include.release.openshift.io/self-managed-high-availability": "true",
		}));
		let filter = InclusionFilter::builder().profile(DEFAULT_CLUSTER_PROFILE).build();
		assert_eq!(manifest.include(&filter), Ok(()));
	}

	#[test]
	fn test_profile_wrong_value() {
		let manifest = manifest_with(json!({"include.release.openshift.io/single-node-developer": "false"}));
		let filter = InclusionFilter::builder().profile("single-node-developer").build();
		assert_matches!(
			manifest.include(&filter),
			Err(ExclusionError::UnrecognizedAnnotationValue { value, .. }) if value == "false"
		);
	}

	#[test]
	fn test_capabilities_disabled() {
		let manifest = manifest_with(json!({"capability.openshift.io/name": "Storage+Build"}));
		let filter = InclusionFilter::builder()
			.capabilities(caps(&["Storage", "Build", "Console"], &["Storage"]))
			.build();
		let err = manifest.include(&filter).unwrap_err();
		assert_eq!(err, ExclusionError::DisabledCapability(vec!["Build".into()]));
		assert_eq!(err.to_string(), "disabled capabilities: Build");
	}

	#[test]
	fn test_capabilities_unknown_only() {
		let manifest = manifest_with(json!({"capability.openshift.io/name": "Unknown1+Storage"}));
		let filter = InclusionFilter::builder()
			.capabilities(caps(&["Storage"], &[]))
			.build();
		assert_eq!(
			manifest.include(&filter),
			Err(ExclusionError::UnrecognizedCapability(vec!["Unknown1".into()]))
		);
	}

	#[test]
	fn test_capabilities_without_annotation_pass() {
		let manifest = manifest_with(json!({"unrelated": "x"}));
		let filter = InclusionFilter::builder().capabilities(caps(&[], &[])).build();
		assert_eq!(manifest.include(&filter), Ok(()));
	}

	#[test]
	fn test_exclusion_checked_before_profile() {
		let manifest = manifest_with(json!({"exclude.release.openshift.io/id": "true"}));
		let filter = InclusionFilter::builder()
			.exclude_identifier("id")
			.profile(DEFAULT_CLUSTER_PROFILE)
			.build();
		assert_matches!(manifest.include(&filter), Err(ExclusionError::Excluded { .. }));
	}

	#[test]
	fn test_is_empty() {
		assert!(InclusionFilter::default().is_empty());
		assert!(!InclusionFilter::builder().profile("p").build().is_empty());
	}
}
