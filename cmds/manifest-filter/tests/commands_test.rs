use std::{fs, path::Path};

use clap::Parser;
use indoc::indoc;
use manifest_filter::commands::{
	check::{self, CheckArgs},
	input::FilterArgs,
	load::{self, LoadArgs},
};
use rstest::rstest;
use tempfile::TempDir;

#[derive(Parser)]
struct TestCli {
	#[command(flatten)]
	filter: FilterArgs,
}

fn write(dir: &Path, name: &str, content: &str) {
	fs::write(dir.join(name), content).unwrap();
}

fn release_dir() -> TempDir {
	let temp = TempDir::new().unwrap();
	write(
		temp.path(),
		"0000_10_namespace.yaml",
		indoc! {r#"
			apiVersion: v1
			kind: Namespace
			metadata:
			  name: openshift-storage
			  annotations:
			    include.release.openshift.io/self-managed-high-availability: "true"
		"#},
	);
	write(
		temp.path(),
		"0000_20_operator.json",
		r#"{"apiVersion": "apps/v1", "kind": "Deployment", "metadata": {"name": "operator", "namespace": "openshift-storage", "annotations": {"include.release.openshift.io/self-managed-high-availability": "true", "release.openshift.io/feature-gate": "TechPreviewNoUpgrade"}}}"#,
	);
	write(
		temp.path(),
		"0000_30_hypershift.yml",
		indoc! {r#"
			apiVersion: v1
			kind: ConfigMap
			metadata:
			  name: hosted
			  namespace: openshift-storage
			  annotations:
			    include.release.openshift.io/self-managed-high-availability: "true"
			    exclude.release.openshift.io/hypershift: "true"
		"#},
	);
	write(temp.path(), "README.md", "not a manifest");
	temp
}

fn loaded_names(args: LoadArgs) -> Vec<String> {
	let mut out = Vec::new();
	load::run(args, &mut out).unwrap();
	let parsed: serde_json::Value = serde_json::from_slice(&out).unwrap();
	parsed
		.as_array()
		.unwrap()
		.iter()
		.map(|m| m["metadata"]["name"].as_str().unwrap().to_string())
		.collect()
}

#[rstest]
#[case::no_filter(&[], &["openshift-storage", "operator", "hosted"])]
#[case::profile(&["--profile", "self-managed-high-availability"], &["openshift-storage", "operator", "hosted"])]
#[case::other_profile(&["--profile", "ibm-cloud-managed"], &[])]
#[case::exclude(&["--exclude", "hypershift"], &["openshift-storage", "operator"])]
#[case::no_tech_preview(&["--include-tech-preview", "false"], &["openshift-storage", "hosted"])]
#[case::combined(
	&["--exclude", "hypershift", "--include-tech-preview", "true", "--profile", "self-managed-high-availability"],
	&["openshift-storage", "operator"],
)]
fn test_load_directory(#[case] flags: &[&str], #[case] expected: &[&str]) {
	let temp = release_dir();
	let dir = temp.path().to_str().unwrap();
	let mut argv = vec!["test", dir, "--no-config"];
	argv.extend_from_slice(flags);
	let cli = TestCli::try_parse_from(argv).unwrap();

	let names = loaded_names(LoadArgs {
		filter: cli.filter,
		json: true,
	});
	assert_eq!(names, expected);
}

#[test]
fn test_config_file_applies_unless_overridden() {
	let temp = release_dir();
	let config_dir = TempDir::new().unwrap();
	let config = config_dir.path().join("filter.yaml");
	fs::write(&config, "excludeIdentifier: hypershift\nincludeTechPreview: false\n").unwrap();

	let with_config = |extra: &[&str]| {
		let mut argv = vec![
			"test",
			temp.path().to_str().unwrap(),
			"--config",
			config.to_str().unwrap(),
		];
		argv.extend_from_slice(extra);
		let cli = TestCli::try_parse_from(argv).unwrap();
		loaded_names(LoadArgs {
			filter: cli.filter,
			json: true,
		})
	};

	assert_eq!(with_config(&[]), ["openshift-storage"]);
	assert_eq!(
		with_config(&["--include-tech-preview", "true"]),
		["openshift-storage", "operator"]
	);
}

#[test]
fn test_config_and_no_config_conflict() {
	assert!(TestCli::try_parse_from(["test", ".", "--config", "x.yaml", "--no-config"]).is_err());
	assert!(TestCli::try_parse_from(["test"]).is_err());
}

#[test]
fn test_duplicates_across_files_fail_the_load() {
	let temp = release_dir();
	write(
		temp.path(),
		"0000_40_again.yaml",
		indoc! {"
			apiVersion: v1
			kind: Namespace
			metadata:
			  name: openshift-storage
		"},
	);

	let args = CheckArgs {
		filter: FilterArgs {
			paths: vec![temp.path().to_path_buf()],
			no_config: true,
			..FilterArgs::default()
		},
	};
	let err = check::run(args, Vec::new()).unwrap_err();
	let message = err.to_string();
	assert!(message.contains("0000_40_again.yaml contains: duplicate resource"));
	assert!(message.contains(r#"Kind: "Namespace" Name: "openshift-storage""#));
}

#[test]
fn test_parse_errors_name_the_document() {
	let temp = TempDir::new().unwrap();
	write(
		temp.path(),
		"broken.yaml",
		indoc! {"
			apiVersion: v1
			kind: ConfigMap
			metadata:
			  name: fine
			---
			apiVersion: v1
			kind: ConfigMap
		"},
	);

	let args = LoadArgs {
		filter: FilterArgs {
			paths: vec![temp.path().join("broken.yaml")],
			no_config: true,
			..FilterArgs::default()
		},
		json: false,
	};
	let err = load::run(args, Vec::new()).unwrap_err();
	assert!(err.to_string().contains("broken.yaml"));
	assert!(err.to_string().contains("must contain kubernetes required fields kind and name"));
}
