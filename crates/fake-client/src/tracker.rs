//! Shared in-memory object store with watch fan-out.

use std::{
	collections::HashMap,
	sync::{
		atomic::{AtomicU64, Ordering},
		mpsc::{self, Receiver, Sender},
		Arc, Mutex, PoisonError, RwLock, RwLockWriteGuard,
	},
};

use kube::core::WatchEvent;
use release_manifest::ResourceId;
use serde_json::{json, Value};
use tracing::{debug, trace};

use crate::{
	helpers::{merge_json, strip_strategic_merge_directives},
	ClientError, LabelSelector, PatchKind, ResourceType,
};

type Objects = HashMap<ResourceId, Value>;

/// Objects shared by every client of one tracker.
pub type SharedObjects = Arc<RwLock<Objects>>;

struct Registration {
	resource: ResourceType,
	namespace: Option<String>,
	selector: LabelSelector,
	sender: Sender<WatchEvent<Value>>,
}

impl Registration {
	fn wants(&self, resource: &ResourceType, object: &Value) -> bool {
		self.resource.group == resource.group
			&& self.resource.kind == resource.kind
			&& self
				.namespace
				.as_deref()
				.is_none_or(|ns| object_namespace(object) == ns)
			&& self.selector.matches_object(object)
	}
}

/// Receiving end of a watch.
pub struct Watcher {
	events: Receiver<WatchEvent<Value>>,
}

impl Watcher {
	/// Next pending event, if any. Never blocks.
	pub fn try_next(&self) -> Option<WatchEvent<Value>> {
		self.events.try_recv().ok()
	}

	/// All currently pending events.
	pub fn try_iter(&self) -> impl Iterator<Item = WatchEvent<Value>> + '_ {
		self.events.try_iter()
	}
}

/// In-memory store keyed by resource identity.
#[derive(Default)]
pub struct ObjectTracker {
	objects: SharedObjects,
	watchers: Mutex<Vec<Registration>>,
	resource_version: AtomicU64,
}

fn object_name(object: &Value) -> &str {
	object
		.pointer("/metadata/name")
		.and_then(Value::as_str)
		.unwrap_or_default()
}

fn object_namespace(object: &Value) -> &str {
	object
		.pointer("/metadata/namespace")
		.and_then(Value::as_str)
		.unwrap_or_default()
}

fn set_metadata(object: &mut Value, key: &str, value: &str) {
	if let Some(obj) = object.as_object_mut() {
		let metadata = obj.entry("metadata").or_insert_with(|| json!({}));
		if let Some(metadata) = metadata.as_object_mut() {
			metadata.insert(key.to_string(), Value::String(value.to_string()));
		}
	}
}

impl ObjectTracker {
	pub fn new() -> Self {
		Self::default()
	}

	/// Tracker pre-populated with `objects`.
	pub fn with_objects(objects: impl IntoIterator<Item = Value>) -> Result<Self, ClientError> {
		let tracker = Self::new();
		for object in objects {
			tracker.add(object)?;
		}
		Ok(tracker)
	}

	/// The store backing this tracker.
	pub fn objects(&self) -> SharedObjects {
		Arc::clone(&self.objects)
	}

	/// Last resource version handed out.
	pub fn resource_version(&self) -> u64 {
		self.resource_version.load(Ordering::SeqCst)
	}

	fn next_resource_version(&self) -> String {
		(self.resource_version.fetch_add(1, Ordering::SeqCst) + 1).to_string()
	}

	fn key(resource: &ResourceType, namespace: Option<&str>, name: &str) -> ResourceId {
		let namespace = if resource.namespaced {
			namespace.unwrap_or_default()
		} else {
			""
		};
		ResourceId::new(&resource.group, &resource.kind, namespace, name)
	}

	fn not_found(resource: &ResourceType, name: &str) -> ClientError {
		ClientError::NotFound {
			resource: resource.plural.clone(),
			name: name.to_string(),
		}
	}

	/// Insert or replace an object as-is, keyed by its own identity.
	pub fn add(&self, mut object: Value) -> Result<(), ClientError> {
		let id = ResourceId::from_object(&object);
		if id.kind.is_empty() || id.name.is_empty() {
			return Err(ClientError::Invalid(format!(
				"object must have kind and metadata.name: {id}"
			)));
		}
		let mut objects = self.write();
		if object.pointer("/metadata/resourceVersion").is_none() {
			set_metadata(&mut object, "resourceVersion", &self.next_resource_version());
		}
		trace!(%id, "adding object");
		objects.insert(id, object);
		Ok(())
	}

	pub fn get(
		&self,
		resource: &ResourceType,
		namespace: Option<&str>,
		name: &str,
	) -> Result<Value, ClientError> {
		let key = Self::key(resource, namespace, name);
		self.objects
			.read()
			.unwrap_or_else(PoisonError::into_inner)
			.get(&key)
			.cloned()
			.ok_or_else(|| Self::not_found(resource, name))
	}

	/// Matching objects, ordered by namespace then name.
	/// `namespace: None` lists across all namespaces.
	pub fn list(
		&self,
		resource: &ResourceType,
		namespace: Option<&str>,
		selector: &LabelSelector,
	) -> Vec<Value> {
		let objects = self.objects.read().unwrap_or_else(PoisonError::into_inner);
		Self::matching(&objects, resource, namespace, selector)
			.into_iter()
			.map(|(_, object)| object)
			.collect()
	}

	fn matching(
		objects: &Objects,
		resource: &ResourceType,
		namespace: Option<&str>,
		selector: &LabelSelector,
	) -> Vec<(ResourceId, Value)> {
		let mut matching: Vec<(&ResourceId, &Value)> = objects
			.iter()
			.filter(|(id, _)| id.group == resource.group && id.kind == resource.kind)
			.filter(|(id, _)| namespace.is_none_or(|ns| !resource.namespaced || id.namespace == ns))
			.filter(|(_, object)| selector.matches_object(object))
			.collect();
		matching.sort_by(|a, b| a.0.cmp(b.0));
		matching
			.into_iter()
			.map(|(id, object)| (id.clone(), object.clone()))
			.collect()
	}

	/// Fill in type information and check the namespace against the
	/// requesting client.
	fn prepare(
		resource: &ResourceType,
		namespace: Option<&str>,
		mut object: Value,
	) -> Result<Value, ClientError> {
		let Some(obj) = object.as_object_mut() else {
			return Err(ClientError::Invalid("object must be a mapping".into()));
		};
		obj.insert("apiVersion".into(), Value::String(resource.api_version()));
		obj.insert("kind".into(), Value::String(resource.kind.clone()));

		if object_name(&object).is_empty() {
			return Err(ClientError::Invalid("metadata.name is required".into()));
		}
		if resource.namespaced {
			let object_ns = object_namespace(&object).to_string();
			match namespace {
				Some(ns) if object_ns.is_empty() => set_metadata(&mut object, "namespace", ns),
				Some(ns) if object_ns != ns => {
					return Err(ClientError::Invalid(format!(
						"the namespace of the object ({object_ns}) does not match the namespace on the request ({ns})"
					)));
				}
				None if object_ns.is_empty() => {
					return Err(ClientError::Invalid("metadata.namespace is required".into()));
				}
				_ => {}
			}
		}
		Ok(object)
	}

	fn write(&self) -> RwLockWriteGuard<'_, Objects> {
		self.objects.write().unwrap_or_else(PoisonError::into_inner)
	}

	/// Store `object` under `key` with a fresh resource version and
	/// notify watchers. Callers hold the write guard from their existence
	/// check through this write.
	fn commit(
		&self,
		objects: &mut Objects,
		key: ResourceId,
		resource: &ResourceType,
		mut object: Value,
		event: fn(Value) -> WatchEvent<Value>,
	) -> Value {
		set_metadata(&mut object, "resourceVersion", &self.next_resource_version());
		objects.insert(key, object.clone());
		self.notify(resource, &object, event);
		object
	}

	fn notify(&self, resource: &ResourceType, object: &Value, event: fn(Value) -> WatchEvent<Value>) {
		let mut watchers = self.watchers.lock().unwrap_or_else(PoisonError::into_inner);
		watchers.retain(|watcher| {
			if !watcher.wants(resource, object) {
				return true;
			}
			watcher.sender.send(event(object.clone())).is_ok()
		});
	}

	fn current(
		objects: &Objects,
		key: &ResourceId,
		resource: &ResourceType,
		name: &str,
	) -> Result<Value, ClientError> {
		objects
			.get(key)
			.cloned()
			.ok_or_else(|| Self::not_found(resource, name))
	}

	pub fn create(
		&self,
		resource: &ResourceType,
		namespace: Option<&str>,
		object: Value,
		dry_run: bool,
	) -> Result<Value, ClientError> {
		self.create_in(&mut self.write(), resource, namespace, object, dry_run)
	}

	fn create_in(
		&self,
		objects: &mut Objects,
		resource: &ResourceType,
		namespace: Option<&str>,
		object: Value,
		dry_run: bool,
	) -> Result<Value, ClientError> {
		let object = Self::prepare(resource, namespace, object)?;
		let name = object_name(&object).to_string();
		let key = Self::key(resource, Some(object_namespace(&object)), &name);
		if objects.contains_key(&key) {
			return Err(ClientError::AlreadyExists {
				resource: resource.plural.clone(),
				name,
			});
		}
		if dry_run {
			return Ok(object);
		}
		debug!(id = %key, "created object");
		Ok(self.commit(objects, key, resource, object, WatchEvent::Added))
	}

	pub fn update(
		&self,
		resource: &ResourceType,
		namespace: Option<&str>,
		object: Value,
		dry_run: bool,
	) -> Result<Value, ClientError> {
		let object = Self::prepare(resource, namespace, object)?;
		let name = object_name(&object).to_string();
		let key = Self::key(resource, Some(object_namespace(&object)), &name);
		let mut objects = self.write();
		let current = Self::current(&objects, &key, resource, &name)?;
		let updated = match (current, object) {
			// the status subresource is preserved across plain updates
			(Value::Object(current), Value::Object(mut object)) => {
				match current.get("status") {
					Some(status) => {
						object.insert("status".into(), status.clone());
					}
					None => {
						object.remove("status");
					}
				}
				Value::Object(object)
			}
			(_, object) => object,
		};
		Ok(self.replace(&mut objects, key, resource, updated, dry_run))
	}

	/// Replace only the `status` of an existing object.
	pub fn update_status(
		&self,
		resource: &ResourceType,
		namespace: Option<&str>,
		object: Value,
		dry_run: bool,
	) -> Result<Value, ClientError> {
		let object = Self::prepare(resource, namespace, object)?;
		let name = object_name(&object).to_string();
		let key = Self::key(resource, Some(object_namespace(&object)), &name);
		let mut objects = self.write();
		let mut current = Self::current(&objects, &key, resource, &name)?;
		if let Some(current) = current.as_object_mut() {
			match object.get("status") {
				Some(status) => {
					current.insert("status".into(), status.clone());
				}
				None => {
					current.remove("status");
				}
			}
		}
		Ok(self.replace(&mut objects, key, resource, current, dry_run))
	}

	fn replace(
		&self,
		objects: &mut Objects,
		key: ResourceId,
		resource: &ResourceType,
		object: Value,
		dry_run: bool,
	) -> Value {
		if dry_run {
			return object;
		}
		debug!(id = %key, "updated object");
		self.commit(objects, key, resource, object, WatchEvent::Modified)
	}

	/// Remove an object, returning its last state.
	pub fn delete(
		&self,
		resource: &ResourceType,
		namespace: Option<&str>,
		name: &str,
		dry_run: bool,
	) -> Result<Value, ClientError> {
		let key = Self::key(resource, namespace, name);
		let mut objects = self.write();
		if dry_run {
			return Self::current(&objects, &key, resource, name);
		}
		let removed = objects
			.remove(&key)
			.ok_or_else(|| Self::not_found(resource, name))?;
		debug!(id = %key, "deleted object");
		self.notify(resource, &removed, WatchEvent::Deleted);
		Ok(removed)
	}

	/// Remove every matching object, returning what was removed.
	pub fn delete_collection(
		&self,
		resource: &ResourceType,
		namespace: Option<&str>,
		selector: &LabelSelector,
		dry_run: bool,
	) -> Result<Vec<Value>, ClientError> {
		let mut objects = self.write();
		let matching = Self::matching(&objects, resource, namespace, selector);
		if dry_run {
			return Ok(matching.into_iter().map(|(_, object)| object).collect());
		}
		let removed = matching
			.into_iter()
			.filter_map(|(key, _)| {
				let removed = objects.remove(&key)?;
				debug!(id = %key, "deleted object");
				self.notify(resource, &removed, WatchEvent::Deleted);
				Some(removed)
			})
			.collect();
		Ok(removed)
	}

	/// Apply a patch to an existing object. Apply patches create the
	/// object when it is missing.
	pub fn patch(
		&self,
		resource: &ResourceType,
		namespace: Option<&str>,
		name: &str,
		kind: PatchKind,
		data: Value,
		dry_run: bool,
	) -> Result<Value, ClientError> {
		let data = match kind {
			PatchKind::Json => return Err(ClientError::UnsupportedPatch(kind.as_str())),
			PatchKind::Strategic => strip_strategic_merge_directives(data),
			PatchKind::Merge | PatchKind::Apply => data,
		};

		let mut objects = self.write();
		let current = match Self::current(&objects, &Self::key(resource, namespace, name), resource, name) {
			Ok(current) => current,
			Err(ClientError::NotFound { .. }) if kind == PatchKind::Apply => {
				let mut object = data;
				set_metadata(&mut object, "name", name);
				return self.create_in(&mut objects, resource, namespace, object, dry_run);
			}
			Err(e) => return Err(e),
		};

		let mut patched = merge_json(current, data);
		set_metadata(&mut patched, "name", name);
		let patched = Self::prepare(resource, namespace, patched)?;
		let key = Self::key(resource, Some(object_namespace(&patched)), name);
		Ok(self.replace(&mut objects, key, resource, patched, dry_run))
	}

	/// Register a watcher for objects of `resource`.
	/// `namespace: None` watches every namespace.
	pub fn watch(
		&self,
		resource: &ResourceType,
		namespace: Option<&str>,
		selector: LabelSelector,
	) -> Watcher {
		let (sender, events) = mpsc::channel();
		self.watchers
			.lock()
			.unwrap_or_else(PoisonError::into_inner)
			.push(Registration {
				resource: resource.clone(),
				namespace: namespace.filter(|_| resource.namespaced).map(str::to_string),
				selector,
				sender,
			});
		Watcher { events }
	}
}
