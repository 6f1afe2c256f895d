use std::process::Command;

fn main() {
	println!("cargo:rerun-if-changed=.git/HEAD");
	println!("cargo:rerun-if-changed=.git/refs/");
	println!("cargo:rustc-env=MANIFEST_FILTER_VERSION={}", version());
}

/// Package version for tagged releases, otherwise the exact git tag or the
/// short commit hash of a development checkout.
fn version() -> String {
	let package = env!("CARGO_PKG_VERSION");
	if package != "0.1.0" {
		return package.to_string();
	}

	git(&["describe", "--tags", "--exact-match", "HEAD"])
		.map(|tag| tag.trim_start_matches('v').to_string())
		.or_else(|| git(&["rev-parse", "--short", "HEAD"]))
		.unwrap_or_else(|| package.to_string())
}

fn git(args: &[&str]) -> Option<String> {
	let output = Command::new("git").args(args).output().ok()?;
	if !output.status.success() {
		return None;
	}
	let stdout = String::from_utf8(output.stdout).ok()?;
	Some(stdout.trim().to_string())
}
