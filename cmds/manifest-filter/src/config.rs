//! Configuration file support.
//!
//! A `.manifest-filter.yaml` file may live in the working directory or any of
//! its parents; the closest one wins. `--config` names a file explicitly.

use std::{
	fs,
	path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use release_manifest::{ClusterCapabilities, InclusionFilter};
use serde::Deserialize;

/// The name of the config file searched for.
pub const CONFIG_FILE_NAME: &str = ".manifest-filter.yaml";

/// Filter settings, from a config file or the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterConfig {
	#[serde(default)]
	pub exclude_identifier: Option<String>,

	#[serde(default)]
	pub include_tech_preview: Option<bool>,

	/// Cluster profile, e.g. `self-managed-high-availability`.
	#[serde(default)]
	pub profile: Option<String>,

	#[serde(default)]
	pub capabilities: Option<ClusterCapabilities>,
}

impl FilterConfig {
	/// Load config by searching from the given directory upward
	pub fn load_from_directory(start_dir: &Path) -> Result<Option<Self>> {
		find_config_file(start_dir)
			.map(|path| Self::load_from_file(&path))
			.transpose()
	}

	pub fn load_from_file(path: &Path) -> Result<Self> {
		let content = fs::read_to_string(path)
			.with_context(|| format!("failed to read config file: {}", path.display()))?;
		// An empty file configures nothing
		if content.trim().is_empty() {
			return Ok(Self::default());
		}
		serde_yaml_with_quirks::from_str(&content)
			.with_context(|| format!("failed to parse config file: {}", path.display()))
	}

	/// Override fields set in `other`.
	pub fn merge_from(&mut self, other: &FilterConfig) {
		if other.exclude_identifier.is_some() {
			self.exclude_identifier.clone_from(&other.exclude_identifier);
		}
		if other.include_tech_preview.is_some() {
			self.include_tech_preview = other.include_tech_preview;
		}
		if other.profile.is_some() {
			self.profile.clone_from(&other.profile);
		}
		if let Some(theirs) = &other.capabilities {
			let ours = self.capabilities.get_or_insert_with(Default::default);
			if !theirs.known_capabilities.is_empty() {
				ours.known_capabilities.clone_from(&theirs.known_capabilities);
			}
			if !theirs.enabled_capabilities.is_empty() {
				ours.enabled_capabilities.clone_from(&theirs.enabled_capabilities);
			}
		}
	}

	pub fn to_filter(&self) -> InclusionFilter {
		InclusionFilter {
			exclude_identifier: self.exclude_identifier.clone(),
			include_tech_preview: self.include_tech_preview,
			profile: self.profile.clone(),
			capabilities: self.capabilities.clone(),
		}
	}
}

/// Search for a config file starting from `start_dir` and walking up to the filesystem root
pub fn find_config_file(start_dir: &Path) -> Option<PathBuf> {
	let start = start_dir
		.canonicalize()
		.unwrap_or_else(|_| start_dir.to_path_buf());

	start
		.ancestors()
		.map(|dir| dir.join(CONFIG_FILE_NAME))
		.find(|candidate| candidate.is_file())
}
