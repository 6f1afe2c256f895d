use anyhow::Result;
use clap::{Parser, Subcommand};
use manifest_filter::{commands, commands::util::BrokenPipeGuard, telemetry};
use tracing::Level;

#[cfg(all(
	target_os = "linux",
	feature = "mimalloc",
	not(feature = "system-alloc")
))]
#[global_allocator]
static GLOBAL: mimallocator::Mimalloc = mimallocator::Mimalloc;

#[derive(Parser)]
#[command(name = "manifest-filter")]
#[command(about = "Load, deduplicate and filter release manifests", long_about = None)]
#[command(version = env!("MANIFEST_FILTER_VERSION"))]
struct Cli {
	/// Log level (trace, debug, info, warn, error). Defaults to RUST_LOG, then info
	#[arg(long, global = true, value_name = "LEVEL")]
	log_level: Option<Level>,

	#[command(subcommand)]
	command: Commands,
}

#[derive(Subcommand)]
enum Commands {
	/// Print the manifests included by the filter
	Load(commands::load::LoadArgs),

	/// Show whether each manifest is included, and why not
	Check(commands::check::CheckArgs),

	/// List the capabilities each manifest belongs to
	Capabilities(commands::capabilities::CapabilitiesArgs),
}

fn main() -> Result<()> {
	let cli = Cli::parse();
	let _telemetry = telemetry::init(cli.log_level)?;

	let stdout = BrokenPipeGuard::new(std::io::stdout().lock());

	match cli.command {
		Commands::Load(args) => commands::load::run(args, stdout),
		Commands::Check(args) => commands::check::run(args, stdout),
		Commands::Capabilities(args) => commands::capabilities::run(args, stdout),
	}
}
