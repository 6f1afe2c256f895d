//! Load command handler.

use std::io::Write;

use anyhow::{Context, Result};
use clap::Args;
use release_manifest::{InclusionFilter, Manifest};
use tracing::{debug, info};

use super::input::{load_paths, FilterArgs};

#[derive(Args, Debug)]
pub struct LoadArgs {
	#[command(flatten)]
	pub filter: FilterArgs,

	/// Print a JSON array instead of a YAML stream
	#[arg(long)]
	pub json: bool,
}

/// Manifests passing `filter`. An empty filter keeps everything.
pub fn included(manifests: Vec<Manifest>, filter: &InclusionFilter) -> Vec<Manifest> {
	if filter.is_empty() {
		return manifests;
	}
	manifests
		.into_iter()
		.filter(|manifest| match manifest.include(filter) {
			Ok(()) => true,
			Err(reason) => {
				debug!(
					kind = manifest.kind(),
					name = manifest.name(),
					%reason,
					"excluding manifest"
				);
				false
			}
		})
		.collect()
}

/// Write manifests as a `---` separated YAML stream.
pub fn write_yaml_stream<W: Write>(manifests: &[Manifest], mut writer: W) -> Result<()> {
	for manifest in manifests {
		let document =
			serde_yaml::to_string(manifest.object()).context("failed to serialize manifest")?;
		writeln!(writer, "---")?;
		writer.write_all(document.as_bytes())?;
	}
	writer.flush()?;
	Ok(())
}

pub fn write_json<W: Write>(manifests: &[Manifest], mut writer: W) -> Result<()> {
	serde_json::to_writer_pretty(&mut writer, manifests).context("failed to serialize manifests")?;
	writeln!(writer)?;
	writer.flush()?;
	Ok(())
}

/// Run the load command.
pub fn run<W: Write>(args: LoadArgs, writer: W) -> Result<()> {
	let filter = args.filter.config_from_cwd()?.to_filter();
	run_with_filter(&args, &filter, writer)
}

pub fn run_with_filter<W: Write>(args: &LoadArgs, filter: &InclusionFilter, writer: W) -> Result<()> {
	let manifests = load_paths(&args.filter.paths)?;
	let total = manifests.len();
	let manifests = included(manifests, filter);
	info!(total, included = manifests.len(), "filtered manifests");

	if args.json {
		write_json(&manifests, writer)
	} else {
		write_yaml_stream(&manifests, writer)
	}
}
