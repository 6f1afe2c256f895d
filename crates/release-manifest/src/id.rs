use std::fmt;

use serde_json::Value;

/// Uniquely identifies a Kubernetes resource within a set of manifests.
///
/// Two manifests with the same identity are duplicates, even if their
/// versions or contents differ.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId {
	/// API group, empty for the core group.
	pub group: String,
	pub kind: String,
	/// Empty for cluster-scoped resources.
	pub namespace: String,
	pub name: String,
}

impl ResourceId {
	pub fn new(
		group: impl Into<String>,
		kind: impl Into<String>,
		namespace: impl Into<String>,
		name: impl Into<String>,
	) -> Self {
		Self {
			group: group.into(),
			kind: kind.into(),
			namespace: namespace.into(),
			name: name.into(),
		}
	}

	/// Derive the identity of a decoded object.
	///
	/// Missing fields are left empty, use [`ResourceId::has_required_fields`]
	/// to check the result.
	pub fn from_object(object: &Value) -> Self {
		let str_at = |pointer: &str| {
			object
				.pointer(pointer)
				.and_then(Value::as_str)
				.unwrap_or_default()
				.to_string()
		};
		let group = object
			.get("apiVersion")
			.and_then(Value::as_str)
			.and_then(|api_version| api_version.split_once('/'))
			.map(|(group, _)| group.to_string())
			.unwrap_or_default();

		Self {
			group,
			kind: str_at("/kind"),
			namespace: str_at("/metadata/namespace"),
			name: str_at("/metadata/name"),
		}
	}

	pub fn namespace(&self) -> Option<&str> {
		(!self.namespace.is_empty()).then_some(self.namespace.as_str())
	}

	/// Kind and name are required on every Kubernetes object.
	pub fn has_required_fields(&self) -> bool {
		!self.kind.is_empty() && !self.name.is_empty()
	}
}

impl fmt::Display for ResourceId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if self.namespace.is_empty() {
			write!(
				f,
				"Group: {:?} Kind: {:?} Name: {:?}",
				self.group, self.kind, self.name
			)
		} else {
			write!(
				f,
				"Group: {:?} Kind: {:?} Namespace: {:?} Name: {:?}",
				self.group, self.kind, self.namespace, self.name
			)
		}
	}
}

#[cfg(test)]
mod tests {
	use rstest::rstest;
	use serde_json::json;

	use super::*;

	#[rstest]
	#[case::core_namespaced(
		json!({"apiVersion": "v1", "kind": "ConfigMap", "metadata": {"name": "cm", "namespace": "ns"}}),
		ResourceId::new("", "ConfigMap", "ns", "cm"),
	)]
	#[case::grouped_cluster_scoped(
		json!({"apiVersion": "rbac.authorization.k8s.io/v1", "kind": "ClusterRole", "metadata": {"name": "admin"}}),
		ResourceId::new("rbac.authorization.k8s.io", "ClusterRole", "", "admin"),
	)]
	#[case::missing_everything(json!({}), ResourceId::default())]
	fn test_from_object(#[case] object: Value, #[case] expected: ResourceId) {
		assert_eq!(ResourceId::from_object(&object), expected);
	}

	#[test]
	fn test_display_without_namespace() {
		let id = ResourceId::new("apps", "Deployment", "", "web");
		assert_eq!(
			id.to_string(),
			r#"Group: "apps" Kind: "Deployment" Name: "web""#
		);
	}

	#[test]
	fn test_display_with_namespace() {
		let id = ResourceId::new("", "Service", "default", "web");
		assert_eq!(
			id.to_string(),
			r#"Group: "" Kind: "Service" Namespace: "default" Name: "web""#
		);
	}

	#[test]
	fn test_required_fields() {
		assert!(ResourceId::new("", "Pod", "", "p").has_required_fields());
		assert!(!ResourceId::new("", "", "", "p").has_required_fields());
		assert!(!ResourceId::new("", "Pod", "ns", "").has_required_fields());
	}
}
