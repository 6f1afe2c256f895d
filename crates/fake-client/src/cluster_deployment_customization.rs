//! Typed `hive.openshift.io/v1` ClusterDeploymentCustomization.

use std::sync::Arc;

use k8s_openapi::{
	api::core::v1::LocalObjectReference, apimachinery::pkg::apis::meta::v1::ObjectMeta,
	NamespaceResourceScope,
};
use serde::{Deserialize, Serialize};

use crate::{Fake, FakeResourceClient, ResourceType};

/// Install-config customizations applied to a pooled cluster.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusterDeploymentCustomization {
	#[serde(default)]
	pub metadata: ObjectMeta,
	#[serde(default)]
	pub spec: ClusterDeploymentCustomizationSpec,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub status: Option<ClusterDeploymentCustomizationStatus>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterDeploymentCustomizationSpec {
	/// JSON patches applied to the install config.
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub install_config_patches: Vec<PatchEntity>,
}

/// One RFC 6902 operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchEntity {
	pub op: String,
	pub path: String,
	#[serde(default, skip_serializing_if = "String::is_empty")]
	pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterDeploymentCustomizationStatus {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub cluster_deployment_ref: Option<LocalObjectReference>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub cluster_pool_ref: Option<LocalObjectReference>,
	#[serde(default, skip_serializing_if = "String::is_empty")]
	pub last_applied_configuration: String,
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub conditions: Vec<CustomizationCondition>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomizationCondition {
	#[serde(rename = "type")]
	pub type_: String,
	pub status: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub reason: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub message: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub last_heartbeat_time: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub last_transition_time: Option<String>,
}

impl k8s_openapi::Resource for ClusterDeploymentCustomization {
	const API_VERSION: &'static str = "hive.openshift.io/v1";
	const GROUP: &'static str = "hive.openshift.io";
	const KIND: &'static str = "ClusterDeploymentCustomization";
	const VERSION: &'static str = "v1";
	const URL_PATH_SEGMENT: &'static str = "clusterdeploymentcustomizations";
	type Scope = NamespaceResourceScope;
}

impl k8s_openapi::Metadata for ClusterDeploymentCustomization {
	type Ty = ObjectMeta;

	fn metadata(&self) -> &ObjectMeta {
		&self.metadata
	}

	fn metadata_mut(&mut self) -> &mut ObjectMeta {
		&mut self.metadata
	}
}

impl ClusterDeploymentCustomization {
	pub fn new(name: &str) -> Self {
		Self {
			metadata: ObjectMeta {
				name: Some(name.to_string()),
				..ObjectMeta::default()
			},
			..Self::default()
		}
	}
}

impl Fake {
	/// Typed client for ClusterDeploymentCustomizations in `namespace`.
	pub fn cluster_deployment_customizations(
		self: &Arc<Self>,
		namespace: &str,
	) -> FakeResourceClient<ClusterDeploymentCustomization> {
		FakeResourceClient::namespaced(
			Arc::clone(self),
			ResourceType::cluster_deployment_customizations(),
			namespace,
		)
	}
}
