//! Check command handler.

use std::io::Write;

use anyhow::Result;
use clap::Args;
use tabwriter::TabWriter;

use super::{
	input::{load_paths, FilterArgs},
	util::{resource_label, source_file},
};

#[derive(Args, Debug)]
pub struct CheckArgs {
	#[command(flatten)]
	pub filter: FilterArgs,
}

/// Run the check command: report, per manifest, whether the filter
/// includes it and why not. An empty filter includes everything, as
/// for `load`.
pub fn run<W: Write>(args: CheckArgs, writer: W) -> Result<()> {
	let filter = args.filter.config_from_cwd()?.to_filter();
	let manifests = load_paths(&args.filter.paths)?;

	let mut table = TabWriter::new(writer);
	writeln!(table, "FILE\tRESOURCE\tRESULT")?;
	for manifest in &manifests {
		let verdict = if filter.is_empty() {
			Ok(())
		} else {
			manifest.include(&filter)
		};
		let result = match verdict {
			Ok(()) => "included".to_string(),
			Err(reason) => format!("excluded: {reason}"),
		};
		writeln!(
			table,
			"{}\t{}\t{}",
			source_file(manifest),
			resource_label(manifest),
			result
		)?;
	}
	table.flush()?;
	Ok(())
}
