//! Resource type descriptors.

use kube::core::{ApiResource, GroupVersionKind};

/// An API resource served by the fake client.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceType {
	pub group: String,
	pub version: String,
	pub kind: String,
	/// Plural resource name used in API paths, e.g. `configmaps`.
	pub plural: String,
	pub namespaced: bool,
}

impl ResourceType {
	pub fn namespaced(api_version: &str, plural: &str, kind: &str) -> Self {
		Self::new(api_version, plural, kind, true)
	}

	pub fn cluster_scoped(api_version: &str, plural: &str, kind: &str) -> Self {
		Self::new(api_version, plural, kind, false)
	}

	fn new(api_version: &str, plural: &str, kind: &str, namespaced: bool) -> Self {
		let (group, version) = api_version.split_once('/').unwrap_or(("", api_version));
		Self {
			group: group.to_string(),
			version: version.to_string(),
			kind: kind.to_string(),
			plural: plural.to_string(),
			namespaced,
		}
	}

	/// `hive.openshift.io/v1` ClusterDeploymentCustomization.
	pub fn cluster_deployment_customizations() -> Self {
		Self::namespaced(
			"hive.openshift.io/v1",
			"clusterdeploymentcustomizations",
			"ClusterDeploymentCustomization",
		)
	}

	pub fn api_version(&self) -> String {
		if self.group.is_empty() {
			self.version.clone()
		} else {
			format!("{}/{}", self.group, self.version)
		}
	}

	pub fn gvk(&self) -> GroupVersionKind {
		GroupVersionKind::gvk(&self.group, &self.version, &self.kind)
	}

	pub fn api_resource(&self) -> ApiResource {
		ApiResource::from_gvk_with_plural(&self.gvk(), &self.plural)
	}

	/// Kind of the list returned for this resource.
	pub fn list_kind(&self) -> String {
		format!("{}List", self.kind)
	}
}
