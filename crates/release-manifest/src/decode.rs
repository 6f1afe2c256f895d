//! Streaming decode of multi-document YAML or JSON manifest streams.

use std::{
	collections::HashSet,
	io::{self, Cursor, Read},
};

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, trace};

use crate::{manifest::json_type_name, Manifest, ResourceId};

/// Errors produced while decoding a manifest stream.
#[derive(Debug, Error)]
pub enum ManifestError {
	#[error("reading manifest stream")]
	Read(#[source] io::Error),

	#[error("error parsing document {document}")]
	Parse {
		/// 1-based position of the document in the stream.
		document: usize,
		#[source]
		source: DecodeError,
	},

	#[error("expected manifest to be a mapping, got {found}")]
	NotAMapping { found: &'static str },

	#[error("resource with fields {id} must contain kubernetes required fields kind and name")]
	MissingRequiredField { id: ResourceId },

	#[error("duplicate resource: ({id})")]
	DuplicateResource { id: ResourceId },

	#[error("encoding manifest")]
	Encode(#[source] serde_json::Error),
}

/// Syntax-level failure of a single document.
#[derive(Debug, Error)]
pub enum DecodeError {
	#[error(transparent)]
	Yaml(#[from] serde_yaml::Error),

	#[error(transparent)]
	Json(#[from] serde_json::Error),

	#[error("expected a mapping, got {0}")]
	NotAMapping(&'static str),
}

enum Documents {
	Yaml(serde_yaml::Deserializer<'static>),
	Json(serde_json::StreamDeserializer<'static, serde_json::de::IoRead<Cursor<Vec<u8>>>, Value>),
}

impl Documents {
	fn next_value(&mut self) -> Option<Result<Value, DecodeError>> {
		match self {
			Self::Yaml(documents) => documents
				.next()
				.map(|document| Value::deserialize(document).map_err(DecodeError::from)),
			Self::Json(values) => values.next().map(|value| value.map_err(DecodeError::from)),
		}
	}
}

/// Iterator over the manifests of a single YAML or JSON stream.
///
/// Streams starting with `{` are read as concatenated JSON values, anything
/// else as `---` separated YAML documents. Null documents are skipped.
/// Identities are checked for duplicates within this stream only.
///
/// The iterator ends after yielding the first error; manifests yielded
/// before it stay valid.
pub struct ManifestDecoder {
	documents: Documents,
	position: usize,
	seen: HashSet<ResourceId>,
	failed: bool,
}

impl ManifestDecoder {
	/// Read the whole stream and prepare it for decoding.
	///
	/// The reader is dropped before this returns.
	pub fn new<R: Read>(mut reader: R) -> Result<Self, ManifestError> {
		let mut buf = Vec::new();
		reader.read_to_end(&mut buf).map_err(ManifestError::Read)?;
		Ok(Self::from_bytes(buf))
	}

	pub fn from_bytes(buf: Vec<u8>) -> Self {
		let documents = if has_json_prefix(&buf) {
			trace!("decoding stream as JSON");
			Documents::Json(serde_json::Deserializer::from_reader(Cursor::new(buf)).into_iter())
		} else {
			trace!("decoding stream as YAML");
			Documents::Yaml(serde_yaml::Deserializer::from_reader(Cursor::new(buf)))
		};

		Self {
			documents,
			position: 0,
			seen: HashSet::new(),
			failed: false,
		}
	}

	fn accept(&mut self, document: usize, value: Value) -> Result<Manifest, ManifestError> {
		if !value.is_object() {
			return Err(ManifestError::Parse {
				document,
				source: DecodeError::NotAMapping(json_type_name(&value)),
			});
		}

		let manifest = Manifest::try_from(value)?;
		if !self.seen.insert(manifest.id().clone()) {
			return Err(ManifestError::DuplicateResource {
				id: manifest.id().clone(),
			});
		}

		debug!(
			document,
			kind = manifest.kind(),
			name = manifest.name(),
			"decoded manifest"
		);
		Ok(manifest)
	}
}

impl Iterator for ManifestDecoder {
	type Item = Result<Manifest, ManifestError>;

	fn next(&mut self) -> Option<Self::Item> {
		if self.failed {
			return None;
		}

		loop {
			let document = self.position + 1;
			let result = match self.documents.next_value()? {
				Ok(value) => {
					self.position = document;
					// Empty documents between two separators decode to null
					if value.is_null() {
						trace!(document, "skipping empty document");
						continue;
					}
					self.accept(document, value)
				}
				Err(source) => Err(ManifestError::Parse { document, source }),
			};

			if result.is_err() {
				self.failed = true;
			}
			return Some(result);
		}
	}
}

/// Parse a YAML or JSON stream that may contain one or more resources.
///
/// Fails if any document cannot be parsed, misses a required field, or
/// duplicates a resource defined earlier in the same stream.
pub fn parse_manifests<R: Read>(reader: R) -> Result<Vec<Manifest>, ManifestError> {
	ManifestDecoder::new(reader)?.collect()
}

/// Like [`parse_manifests`], but keeps the manifests decoded before a failure.
pub fn parse_manifests_partial<R: Read>(reader: R) -> (Vec<Manifest>, Option<ManifestError>) {
	let decoder = match ManifestDecoder::new(reader) {
		Ok(decoder) => decoder,
		Err(e) => return (Vec::new(), Some(e)),
	};

	let mut manifests = Vec::new();
	for result in decoder {
		match result {
			Ok(manifest) => manifests.push(manifest),
			Err(e) => return (manifests, Some(e)),
		}
	}
	(manifests, None)
}

fn has_json_prefix(buf: &[u8]) -> bool {
	buf.iter()
		.find(|b| !b.is_ascii_whitespace())
		.is_some_and(|b| *b == b'{')
}
