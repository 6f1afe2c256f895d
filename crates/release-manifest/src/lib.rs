//! Loading, deduplication and filtering of Kubernetes release manifests.
//!
//! Manifests are read from YAML or JSON streams (one resource per document),
//! identified by group/kind/namespace/name, and checked against the
//! annotation-driven inclusion rules used for release payloads:
//! exclusion identifiers, tech-preview feature gates, cluster profiles and
//! capabilities.

mod capability;
mod decode;
mod id;
mod include;
mod load;
mod manifest;

pub use capability::{
	check_capabilities, parse_capabilities, ClusterCapabilities, CAPABILITY_ANNOTATION,
};
pub use decode::{
	parse_manifests, parse_manifests_partial, DecodeError, ManifestDecoder, ManifestError,
};
pub use id::ResourceId;
pub use include::{
	ExclusionError, InclusionFilter, DEFAULT_CLUSTER_PROFILE, FEATURE_GATE_ANNOTATION,
	TECH_PREVIEW_NO_UPGRADE,
};
pub use load::{manifest_files_in_dir, manifests_from_dir, manifests_from_files, LoadError, LoadFailure};
pub use manifest::{gvk_from_api_version, Manifest};
