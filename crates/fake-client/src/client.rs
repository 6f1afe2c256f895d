//! Typed client trait and its fake implementation.

use std::{fmt, marker::PhantomData, sync::Arc};

use k8s_openapi::apimachinery::pkg::apis::meta::v1::ListMeta;
use kube::core::params::{DeleteParams, ListParams, Patch, PatchParams, PostParams};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use crate::{Action, ClientError, Fake, LabelSelector, PatchKind, Request, ResourceType, Watcher};

/// A list response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectList<K> {
	pub api_version: String,
	pub kind: String,
	#[serde(default)]
	pub metadata: ListMeta,
	pub items: Vec<K>,
}

impl<K> ObjectList<K> {
	pub fn resource_version(&self) -> Option<&str> {
		self.metadata.resource_version.as_deref()
	}

	pub fn iter(&self) -> std::slice::Iter<'_, K> {
		self.items.iter()
	}
}

impl<K> IntoIterator for ObjectList<K> {
	type Item = K;
	type IntoIter = std::vec::IntoIter<K>;

	fn into_iter(self) -> Self::IntoIter {
		self.items.into_iter()
	}
}

/// Operations on one resource type, scoped to a namespace.
pub trait ResourceClient<K> {
	fn get(&self, name: &str) -> Result<K, ClientError>;
	fn list(&self, lp: &ListParams) -> Result<ObjectList<K>, ClientError>;
	fn watch(&self, lp: &ListParams) -> Result<Watcher, ClientError>;
	fn create(&self, pp: &PostParams, object: &K) -> Result<K, ClientError>;
	fn update(&self, pp: &PostParams, object: &K) -> Result<K, ClientError>;
	fn update_status(&self, pp: &PostParams, object: &K) -> Result<K, ClientError>;
	fn delete(&self, name: &str, dp: &DeleteParams) -> Result<(), ClientError>;
	fn delete_collection(&self, dp: &DeleteParams, lp: &ListParams) -> Result<(), ClientError>;
	fn patch<P: Serialize + fmt::Debug>(
		&self,
		name: &str,
		pp: &PatchParams,
		patch: &Patch<P>,
	) -> Result<K, ClientError>;
	fn patch_subresource<P: Serialize + fmt::Debug>(
		&self,
		subresource: &str,
		name: &str,
		pp: &PatchParams,
		patch: &Patch<P>,
	) -> Result<K, ClientError>;
}

/// [`ResourceClient`] backed by a shared [`Fake`].
pub struct FakeResourceClient<K> {
	fake: Arc<Fake>,
	resource: ResourceType,
	namespace: Option<String>,
	kind: PhantomData<fn() -> K>,
}

impl<K> Clone for FakeResourceClient<K> {
	fn clone(&self) -> Self {
		Self {
			fake: Arc::clone(&self.fake),
			resource: self.resource.clone(),
			namespace: self.namespace.clone(),
			kind: PhantomData,
		}
	}
}

impl<K> FakeResourceClient<K> {
	/// Client for `resource` in `namespace`. Cluster-scoped resources
	/// ignore the namespace.
	pub fn namespaced(fake: Arc<Fake>, resource: ResourceType, namespace: &str) -> Self {
		let namespace = resource.namespaced.then(|| namespace.to_string());
		Self {
			fake,
			resource,
			namespace,
			kind: PhantomData,
		}
	}

	/// Client spanning all namespaces.
	pub fn all(fake: Arc<Fake>, resource: ResourceType) -> Self {
		Self {
			fake,
			resource,
			namespace: None,
			kind: PhantomData,
		}
	}

	pub fn resource(&self) -> &ResourceType {
		&self.resource
	}

	pub fn namespace(&self) -> Option<&str> {
		self.namespace.as_deref()
	}

	fn action(&self, request: Request) -> Action {
		Action::new(self.resource.clone(), self.namespace.clone(), request)
	}
}

impl<K: DeserializeOwned> FakeResourceClient<K> {
	fn invoke(&self, request: Request) -> Result<K, ClientError> {
		let object = self
			.fake
			.invokes(self.action(request))?
			.ok_or_else(|| ClientError::Conversion("no object returned".into()))?;
		Ok(serde_json::from_value(object)?)
	}
}

fn patch_body<P: Serialize>(patch: &Patch<P>) -> Result<(PatchKind, Value), ClientError> {
	#[allow(unreachable_patterns)]
	let (kind, body) = match patch {
		Patch::Apply(body) => (PatchKind::Apply, body),
		Patch::Merge(body) => (PatchKind::Merge, body),
		Patch::Strategic(body) => (PatchKind::Strategic, body),
		_ => return Err(ClientError::UnsupportedPatch(PatchKind::Json.as_str())),
	};
	Ok((kind, serde_json::to_value(body)?))
}

impl<K> ResourceClient<K> for FakeResourceClient<K>
where
	K: Serialize + DeserializeOwned,
{
	fn get(&self, name: &str) -> Result<K, ClientError> {
		self.invoke(Request::Get {
			name: name.to_string(),
		})
	}

	fn list(&self, lp: &ListParams) -> Result<ObjectList<K>, ClientError> {
		let label_selector = lp.label_selector.clone();
		let selector: LabelSelector = label_selector
			.as_deref()
			.map_or_else(|| Ok(LabelSelector::default()), str::parse)?;
		let Some(list) = self.fake.invokes(self.action(Request::List { label_selector }))? else {
			return Err(ClientError::Conversion("no list returned".into()));
		};
		let mut list: ObjectList<Value> = serde_json::from_value(list)?;
		// reactors may answer with unfiltered lists
		list.items.retain(|item| selector.matches_object(item));
		Ok(ObjectList {
			api_version: list.api_version,
			kind: list.kind,
			metadata: list.metadata,
			items: list
				.items
				.into_iter()
				.map(serde_json::from_value)
				.collect::<Result<_, _>>()?,
		})
	}

	fn watch(&self, lp: &ListParams) -> Result<Watcher, ClientError> {
		self.fake.invokes_watch(self.action(Request::Watch {
			label_selector: lp.label_selector.clone(),
		}))
	}

	fn create(&self, pp: &PostParams, object: &K) -> Result<K, ClientError> {
		self.invoke(Request::Create {
			object: serde_json::to_value(object)?,
			dry_run: pp.dry_run,
		})
	}

	fn update(&self, pp: &PostParams, object: &K) -> Result<K, ClientError> {
		self.invoke(Request::Update {
			object: serde_json::to_value(object)?,
			subresource: None,
			dry_run: pp.dry_run,
		})
	}

	fn update_status(&self, pp: &PostParams, object: &K) -> Result<K, ClientError> {
		self.invoke(Request::Update {
			object: serde_json::to_value(object)?,
			subresource: Some("status".into()),
			dry_run: pp.dry_run,
		})
	}

	fn delete(&self, name: &str, dp: &DeleteParams) -> Result<(), ClientError> {
		self.fake.invokes(self.action(Request::Delete {
			name: name.to_string(),
			dry_run: dp.dry_run,
		}))?;
		Ok(())
	}

	fn delete_collection(&self, dp: &DeleteParams, lp: &ListParams) -> Result<(), ClientError> {
		self.fake.invokes(self.action(Request::DeleteCollection {
			label_selector: lp.label_selector.clone(),
			dry_run: dp.dry_run,
		}))?;
		Ok(())
	}

	fn patch<P: Serialize + fmt::Debug>(
		&self,
		name: &str,
		pp: &PatchParams,
		patch: &Patch<P>,
	) -> Result<K, ClientError> {
		let (kind, data) = patch_body(patch)?;
		self.invoke(Request::Patch {
			name: name.to_string(),
			kind,
			data,
			subresources: Vec::new(),
			dry_run: pp.dry_run,
		})
	}

	fn patch_subresource<P: Serialize + fmt::Debug>(
		&self,
		subresource: &str,
		name: &str,
		pp: &PatchParams,
		patch: &Patch<P>,
	) -> Result<K, ClientError> {
		let (kind, data) = patch_body(patch)?;
		self.invoke(Request::Patch {
			name: name.to_string(),
			kind,
			data,
			subresources: vec![subresource.to_string()],
			dry_run: pp.dry_run,
		})
	}
}
