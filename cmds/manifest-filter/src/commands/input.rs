//! Manifest inputs and filter flags shared by the subcommands.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use release_manifest::{manifest_files_in_dir, manifests_from_files, ClusterCapabilities, Manifest};
use tracing::debug;

use crate::config::FilterConfig;

#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
	/// Manifest files, or directories of `*.yaml`, `*.yml` and `*.json` files
	#[arg(required = true)]
	pub paths: Vec<PathBuf>,

	/// Exclude manifests annotated `exclude.release.openshift.io/<ID>: "true"`
	#[arg(long, value_name = "ID")]
	pub exclude: Option<String>,

	/// Whether TechPreviewNoUpgrade feature-gated manifests are included
	#[arg(long, value_name = "BOOL")]
	pub include_tech_preview: Option<bool>,

	/// Only include manifests annotated for this cluster profile
	#[arg(long)]
	pub profile: Option<String>,

	/// Capability known to the release (repeatable)
	#[arg(long = "known-capability", value_name = "NAME")]
	pub known_capabilities: Vec<String>,

	/// Capability enabled on the cluster (repeatable)
	#[arg(long = "enabled-capability", value_name = "NAME")]
	pub enabled_capabilities: Vec<String>,

	/// Config file to use instead of searching for `.manifest-filter.yaml`
	#[arg(long, value_name = "FILE", conflicts_with = "no_config")]
	pub config: Option<PathBuf>,

	/// Ignore config files
	#[arg(long)]
	pub no_config: bool,
}

impl FilterArgs {
	/// Settings given as flags.
	pub fn flag_config(&self) -> FilterConfig {
		let capabilities = (!self.known_capabilities.is_empty()
			|| !self.enabled_capabilities.is_empty())
		.then(|| ClusterCapabilities {
			known_capabilities: self.known_capabilities.clone(),
			enabled_capabilities: self.enabled_capabilities.clone(),
		});
		FilterConfig {
			exclude_identifier: self.exclude.clone(),
			include_tech_preview: self.include_tech_preview,
			profile: self.profile.clone(),
			capabilities,
		}
	}

	/// Config file settings with flags applied on top.
	pub fn resolve_config(&self, start_dir: &Path) -> Result<FilterConfig> {
		let mut config = if self.no_config {
			FilterConfig::default()
		} else if let Some(path) = &self.config {
			FilterConfig::load_from_file(path)?
		} else {
			FilterConfig::load_from_directory(start_dir)?.unwrap_or_default()
		};
		config.merge_from(&self.flag_config());
		debug!(?config, "resolved filter configuration");
		Ok(config)
	}

	/// Resolve the config starting from the working directory.
	pub fn config_from_cwd(&self) -> Result<FilterConfig> {
		let cwd = std::env::current_dir().context("failed to determine working directory")?;
		self.resolve_config(&cwd)
	}
}

/// Expand directories into their manifest files, keeping argument order.
pub fn expand_paths(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
	let mut files = Vec::new();
	for path in paths {
		if path.is_dir() {
			files.extend(manifest_files_in_dir(path)?);
		} else {
			files.push(path.clone());
		}
	}
	Ok(files)
}

/// Load every manifest under `paths`.
pub fn load_paths(paths: &[PathBuf]) -> Result<Vec<Manifest>> {
	let files = expand_paths(paths)?;
	let manifests = manifests_from_files(&files)?;
	debug!(
		files = files.len(),
		manifests = manifests.len(),
		"loaded manifests"
	);
	Ok(manifests)
}
