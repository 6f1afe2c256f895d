//! Utilities for command handlers.

use std::io::{self, ErrorKind, Write};

use release_manifest::Manifest;

/// A writer wrapper that silently handles broken pipe errors.
///
/// When the underlying writer returns a broken pipe error (EPIPE), this wrapper
/// converts it to a successful write, so `manifest-filter load . | head -1`
/// exits cleanly.
pub struct BrokenPipeGuard<W> {
	inner: W,
}

impl<W> BrokenPipeGuard<W> {
	pub fn new(inner: W) -> Self {
		Self { inner }
	}
}

impl<W: Write> Write for BrokenPipeGuard<W> {
	fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
		match self.inner.write(buf) {
			Err(e) if e.kind() == ErrorKind::BrokenPipe => Ok(buf.len()),
			other => other,
		}
	}

	fn flush(&mut self) -> io::Result<()> {
		match self.inner.flush() {
			Err(e) if e.kind() == ErrorKind::BrokenPipe => Ok(()),
			other => other,
		}
	}
}

/// `Kind/name`, or `Kind/namespace/name` for namespaced resources.
pub fn resource_label(manifest: &Manifest) -> String {
	match manifest.namespace() {
		Some(namespace) => format!("{}/{}/{}", manifest.kind(), namespace, manifest.name()),
		None => format!("{}/{}", manifest.kind(), manifest.name()),
	}
}

/// File a manifest was read from, `-` when unknown.
pub fn source_file(manifest: &Manifest) -> &str {
	manifest.original_filename.as_deref().unwrap_or("-")
}

#[cfg(test)]
mod tests {
	use assert_matches::assert_matches;
	use serde_json::json;

	use super::*;
	use crate::test_utils::BrokenPipeWriter;

	#[test]
	fn test_guard_swallows_broken_pipe() {
		let mut writer = BrokenPipeGuard::new(BrokenPipeWriter);
		assert_matches!(writer.write(b"data"), Ok(4));
		assert_matches!(writer.flush(), Ok(()));
	}

	#[test]
	fn test_guard_passes_writes_through() {
		let mut out = Vec::new();
		BrokenPipeGuard::new(&mut out).write_all(b"data").unwrap();
		assert_eq!(out, b"data");
	}

	#[test]
	fn test_resource_label() {
		let namespaced = Manifest::try_from(json!({
			"apiVersion": "v1",
			"kind": "ConfigMap",
			"metadata": {"name": "cm", "namespace": "ns"},
		}))
		.unwrap();
		assert_eq!(resource_label(&namespaced), "ConfigMap/ns/cm");
		assert_eq!(source_file(&namespaced), "-");

		let cluster = Manifest::try_from(json!({
			"apiVersion": "v1",
			"kind": "Namespace",
			"metadata": {"name": "ns"},
		}))
		.unwrap();
		assert_eq!(resource_label(&cluster), "Namespace/ns");
	}
}
