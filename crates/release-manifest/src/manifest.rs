//! The decoded manifest type.

use kube::core::GroupVersionKind;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::{capability::parse_capabilities, ManifestError, ResourceId, CAPABILITY_ANNOTATION};

/// A single Kubernetes object loaded from a manifest stream.
///
/// `raw` is always the compact JSON encoding of the parsed object, both are
/// produced together on construction and neither can be replaced afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Manifest {
	/// Base name of the file this manifest was loaded from.
	///
	/// Only set when loading from disk, and not guaranteed to be unique.
	pub original_filename: Option<String>,
	id: ResourceId,
	raw: Vec<u8>,
	gvk: GroupVersionKind,
	obj: Value,
}

/// Create a GroupVersionKind from an apiVersion string and kind.
pub fn gvk_from_api_version(api_version: &str, kind: &str) -> GroupVersionKind {
	let (group, version) = match api_version.split_once('/') {
		Some((g, v)) => (g, v),
		None => ("", api_version),
	};
	GroupVersionKind::gvk(group, version, kind)
}

impl Manifest {
	pub fn id(&self) -> &ResourceId {
		&self.id
	}

	/// Compact JSON encoding of the object.
	pub fn raw(&self) -> &[u8] {
		&self.raw
	}

	pub fn gvk(&self) -> &GroupVersionKind {
		&self.gvk
	}

	pub fn object(&self) -> &Value {
		&self.obj
	}

	pub fn into_object(self) -> Value {
		self.obj
	}

	pub fn api_version(&self) -> &str {
		self.obj
			.get("apiVersion")
			.and_then(Value::as_str)
			.unwrap_or_default()
	}

	pub fn kind(&self) -> &str {
		&self.id.kind
	}

	pub fn name(&self) -> &str {
		&self.id.name
	}

	pub fn namespace(&self) -> Option<&str> {
		self.id.namespace()
	}

	/// Whether both manifests describe the same resource.
	pub fn same_resource_id(&self, other: &Manifest) -> bool {
		self.id == other.id
	}

	/// The object's annotations.
	///
	/// Returns `None` when the object has no annotations, or when they are not
	/// a string-to-string mapping.
	pub fn annotations(&self) -> Option<&Map<String, Value>> {
		self.obj
			.pointer("/metadata/annotations")?
			.as_object()
			.filter(|annotations| annotations.values().all(Value::is_string))
	}

	pub fn annotation(&self, key: &str) -> Option<&str> {
		self.annotations()?.get(key)?.as_str()
	}

	pub fn labels(&self) -> Option<&Map<String, Value>> {
		self.obj.pointer("/metadata/labels")?.as_object()
	}

	/// Capabilities this manifest belongs to, in annotation order.
	pub fn capabilities(&self) -> Vec<String> {
		self.annotation(CAPABILITY_ANNOTATION)
			.map(parse_capabilities)
			.unwrap_or_default()
	}
}

impl TryFrom<Value> for Manifest {
	type Error = ManifestError;

	fn try_from(obj: Value) -> Result<Self, Self::Error> {
		if !obj.is_object() {
			return Err(ManifestError::NotAMapping {
				found: json_type_name(&obj),
			});
		}

		let id = ResourceId::from_object(&obj);
		if !id.has_required_fields() {
			return Err(ManifestError::MissingRequiredField { id });
		}

		let api_version = obj
			.get("apiVersion")
			.and_then(Value::as_str)
			.unwrap_or_default();
		let gvk = gvk_from_api_version(api_version, &id.kind);
		let raw = serde_json::to_vec(&obj).map_err(ManifestError::Encode)?;

		Ok(Self {
			original_filename: None,
			id,
			raw,
			gvk,
			obj,
		})
	}
}

impl<'de> Deserialize<'de> for Manifest {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let value = Value::deserialize(deserializer)?;
		Manifest::try_from(value).map_err(serde::de::Error::custom)
	}
}

impl Serialize for Manifest {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		self.obj.serialize(serializer)
	}
}

pub(crate) fn json_type_name(value: &Value) -> &'static str {
	match value {
		Value::Null => "null",
		Value::Bool(_) => "boolean",
		Value::Number(_) => "number",
		Value::String(_) => "string",
		Value::Array(_) => "array",
		Value::Object(_) => "object",
	}
}
