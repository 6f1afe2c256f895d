//! Capabilities command handler.

use std::{io::Write, path::PathBuf};

use anyhow::Result;
use clap::Args;
use tabwriter::TabWriter;

use super::{
	input::load_paths,
	util::{resource_label, source_file},
};

#[derive(Args, Debug)]
pub struct CapabilitiesArgs {
	/// Manifest files, or directories of `*.yaml`, `*.yml` and `*.json` files
	#[arg(required = true)]
	pub paths: Vec<PathBuf>,
}

/// Run the capabilities command: list the capabilities each manifest
/// belongs to.
pub fn run<W: Write>(args: CapabilitiesArgs, writer: W) -> Result<()> {
	let manifests = load_paths(&args.paths)?;

	let mut table = TabWriter::new(writer);
	writeln!(table, "FILE\tRESOURCE\tCAPABILITIES")?;
	for manifest in &manifests {
		let capabilities = manifest.capabilities();
		let capabilities = if capabilities.is_empty() {
			"-".to_string()
		} else {
			capabilities.join(", ")
		};
		writeln!(
			table,
			"{}\t{}\t{}",
			source_file(manifest),
			resource_label(manifest),
			capabilities
		)?;
	}
	table.flush()?;
	Ok(())
}

#[cfg(test)]
mod tests {
	use std::fs;

	use indoc::indoc;
	use tempfile::TempDir;

	use super::*;

	#[test]
	fn test_capabilities_listing() {
		let temp = TempDir::new().unwrap();
		fs::write(
			temp.path().join("a.yaml"),
			indoc! {r#"
				apiVersion: apps/v1
				kind: Deployment
				metadata:
				  name: console
				  namespace: openshift-console
				  annotations:
				    capability.openshift.io/name: Console+Insights
				---
				apiVersion: v1
				kind: Namespace
				metadata:
				  name: openshift-console
			"#},
		)
		.unwrap();

		let mut out = Vec::new();
		run(
			CapabilitiesArgs {
				paths: vec![temp.path().to_path_buf()],
			},
			&mut out,
		)
		.unwrap();
		let out = String::from_utf8(out).unwrap();
		let lines: Vec<&str> = out.lines().collect();

		assert_eq!(lines.len(), 3);
		assert!(lines[1].starts_with("a.yaml"));
		assert!(lines[1].contains("Deployment/openshift-console/console"));
		assert!(lines[1].ends_with("Console, Insights"));
		assert!(lines[2].ends_with("-"));
	}
}
