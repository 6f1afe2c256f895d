//! Loading manifests from files on disk.

use std::{
	collections::HashSet,
	error::Error as StdError,
	fmt::Write as _,
	fs::{self, File},
	io,
	path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::{debug, instrument};

use crate::{parse_manifests, Manifest, ManifestError};

const MANIFEST_EXTENSIONS: &[&str] = &["yaml", "yml", "json"];

/// A failure to load a single file.
#[derive(Debug, Error)]
pub enum LoadError {
	#[error("error opening {}", .path.display())]
	FileOpen {
		path: PathBuf,
		#[source]
		source: io::Error,
	},

	#[error("error reading directory {}", .path.display())]
	ReadDir {
		path: PathBuf,
		#[source]
		source: io::Error,
	},

	#[error("error parsing {}", .path.display())]
	ParseFile {
		path: PathBuf,
		#[source]
		source: ManifestError,
	},

	/// The file defines a resource already defined by an earlier file.
	#[error("file {} contains", .path.display())]
	DuplicateInFile {
		path: PathBuf,
		#[source]
		source: ManifestError,
	},
}

/// Every error encountered while loading a set of files.
#[derive(Debug, Error)]
#[error("error loading manifests: {}", render_causes(.errors.as_slice()))]
pub struct LoadFailure {
	pub errors: Vec<LoadError>,
}

impl From<LoadError> for LoadFailure {
	fn from(error: LoadError) -> Self {
		Self {
			errors: vec![error],
		}
	}
}

fn render_chain(error: &dyn StdError) -> String {
	let mut out = error.to_string();
	let mut source = error.source();
	while let Some(cause) = source {
		let _ = write!(out, ": {cause}");
		source = cause.source();
	}
	out
}

fn render_causes(errors: &[LoadError]) -> String {
	if let [single] = errors {
		return render_chain(single);
	}
	let rendered: Vec<_> = errors.iter().map(|e| render_chain(e)).collect();
	format!("[{}]", rendered.join(", "))
}

/// Read files and return their manifests in file order, then document order.
///
/// Duplicate resources are detected across the whole file set. All files are
/// attempted; if any of them fails to open or parse, or defines a duplicate,
/// every error is returned together.
#[instrument(skip_all, fields(file_count = files.len()))]
pub fn manifests_from_files<P: AsRef<Path>>(files: &[P]) -> Result<Vec<Manifest>, LoadFailure> {
	let mut manifests = Vec::new();
	let mut ids = HashSet::new();
	let mut errors = Vec::new();

	for path in files {
		let path = path.as_ref();
		let file = match File::open(path) {
			Ok(file) => file,
			Err(source) => {
				errors.push(LoadError::FileOpen {
					path: path.to_path_buf(),
					source,
				});
				continue;
			}
		};

		let mut parsed = match parse_manifests(file) {
			Ok(parsed) => parsed,
			Err(source) => {
				errors.push(LoadError::ParseFile {
					path: path.to_path_buf(),
					source,
				});
				continue;
			}
		};

		let filename = path
			.file_name()
			.map(|name| name.to_string_lossy().into_owned());
		for manifest in &mut parsed {
			manifest.original_filename.clone_from(&filename);
			if !ids.insert(manifest.id().clone()) {
				errors.push(LoadError::DuplicateInFile {
					path: path.to_path_buf(),
					source: ManifestError::DuplicateResource {
						id: manifest.id().clone(),
					},
				});
			}
		}

		debug!(path = %path.display(), count = parsed.len(), "loaded manifests");
		manifests.extend(parsed);
	}

	if !errors.is_empty() {
		return Err(LoadFailure { errors });
	}
	Ok(manifests)
}

/// List the manifest files (`.yaml`, `.yml`, `.json`) directly inside `dir`,
/// sorted by path.
pub fn manifest_files_in_dir(dir: &Path) -> Result<Vec<PathBuf>, LoadError> {
	let read_dir_error = |source| LoadError::ReadDir {
		path: dir.to_path_buf(),
		source,
	};

	let mut files = Vec::new();
	for entry in fs::read_dir(dir).map_err(read_dir_error)? {
		let path = entry.map_err(read_dir_error)?.path();
		let is_manifest = path
			.extension()
			.and_then(|ext| ext.to_str())
			.is_some_and(|ext| MANIFEST_EXTENSIONS.contains(&ext));
		if is_manifest && path.is_file() {
			files.push(path);
		}
	}
	files.sort();
	Ok(files)
}

/// Load every manifest file directly inside `dir`, see [`manifests_from_files`].
#[instrument(skip_all, fields(dir = %dir.display()))]
pub fn manifests_from_dir(dir: &Path) -> Result<Vec<Manifest>, LoadFailure> {
	let files = manifest_files_in_dir(dir)?;
	manifests_from_files(&files)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::ResourceId;

	#[test]
	fn test_single_cause_is_rendered_with_chain() {
		let failure = LoadFailure::from(LoadError::DuplicateInFile {
			path: PathBuf::from("/manifests/b.yaml"),
			source: ManifestError::DuplicateResource {
				id: ResourceId::new("", "ConfigMap", "ns", "cm"),
			},
		});
		assert_eq!(
			failure.to_string(),
			r#"error loading manifests: file /manifests/b.yaml contains: duplicate resource: (Group: "" Kind: "ConfigMap" Namespace: "ns" Name: "cm")"#
		);
	}

	#[test]
	fn test_multiple_causes_are_bracketed() {
		let failure = LoadFailure {
			errors: vec![
				LoadError::FileOpen {
					path: PathBuf::from("a.yaml"),
					source: io::Error::new(io::ErrorKind::NotFound, "not found"),
				},
				LoadError::FileOpen {
					path: PathBuf::from("b.yaml"),
					source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
				},
			],
		};
		assert_eq!(
			failure.to_string(),
			"error loading manifests: [error opening a.yaml: not found, error opening b.yaml: denied]"
		);
	}
}
