//! Request dispatch: action log, reactor chain, and tracker fallback.

use std::sync::{Arc, Mutex, PoisonError, RwLock};

use serde_json::{json, Value};
use tracing::{debug, instrument};

use crate::{Action, ClientError, LabelSelector, ObjectTracker, Request, Watcher};

/// Outcome of a reactor. `None` passes the action on to the next reactor.
pub type Reaction = Option<Result<Option<Value>, ClientError>>;

/// Intercepts actions before they reach the tracker.
pub trait Reactor: Send + Sync {
	fn handles(&self, action: &Action) -> bool;
	fn react(&self, action: &Action) -> Reaction;
}

struct SimpleReactor<F> {
	verb: String,
	resource: String,
	reaction: F,
}

impl<F> Reactor for SimpleReactor<F>
where
	F: Fn(&Action) -> Reaction + Send + Sync,
{
	fn handles(&self, action: &Action) -> bool {
		action.matches(&self.verb, &self.resource)
	}

	fn react(&self, action: &Action) -> Reaction {
		(self.reaction)(action)
	}
}

/// Dispatcher shared by every fake client.
#[derive(Default)]
pub struct Fake {
	tracker: ObjectTracker,
	reactors: RwLock<Vec<Arc<dyn Reactor>>>,
	actions: Mutex<Vec<Action>>,
}

fn selector(label_selector: Option<&str>) -> Result<LabelSelector, ClientError> {
	label_selector.map_or_else(|| Ok(LabelSelector::default()), str::parse)
}

impl Fake {
	pub fn new() -> Self {
		Self::default()
	}

	/// Fake whose tracker is pre-populated with `objects`.
	pub fn with_objects(objects: impl IntoIterator<Item = Value>) -> Result<Self, ClientError> {
		Ok(Self {
			tracker: ObjectTracker::with_objects(objects)?,
			..Self::default()
		})
	}

	pub fn tracker(&self) -> &ObjectTracker {
		&self.tracker
	}

	/// Run `reaction` before every reactor registered so far.
	pub fn prepend_reactor<F>(&self, verb: &str, resource: &str, reaction: F)
	where
		F: Fn(&Action) -> Reaction + Send + Sync + 'static,
	{
		self.reactors
			.write()
			.unwrap_or_else(PoisonError::into_inner)
			.insert(0, Arc::new(Self::reactor(verb, resource, reaction)));
	}

	/// Run `reaction` after every reactor registered so far.
	pub fn append_reactor<F>(&self, verb: &str, resource: &str, reaction: F)
	where
		F: Fn(&Action) -> Reaction + Send + Sync + 'static,
	{
		self.add_reactor(Arc::new(Self::reactor(verb, resource, reaction)));
	}

	pub fn add_reactor(&self, reactor: Arc<dyn Reactor>) {
		self.reactors
			.write()
			.unwrap_or_else(PoisonError::into_inner)
			.push(reactor);
	}

	fn reactor<F>(verb: &str, resource: &str, reaction: F) -> SimpleReactor<F> {
		SimpleReactor {
			verb: verb.to_string(),
			resource: resource.to_string(),
			reaction,
		}
	}

	/// Every action invoked so far, in order.
	pub fn actions(&self) -> Vec<Action> {
		self.actions
			.lock()
			.unwrap_or_else(PoisonError::into_inner)
			.clone()
	}

	pub fn clear_actions(&self) {
		self.actions
			.lock()
			.unwrap_or_else(PoisonError::into_inner)
			.clear();
	}

	fn record(&self, action: &Action) {
		self.actions
			.lock()
			.unwrap_or_else(PoisonError::into_inner)
			.push(action.clone());
	}

	/// First reactor reaction for `action`, if any.
	fn react(&self, action: &Action) -> Reaction {
		// reactors may call back into the fake, so the lock is not held
		let reactors = self
			.reactors
			.read()
			.unwrap_or_else(PoisonError::into_inner)
			.clone();
		reactors
			.iter()
			.filter(|reactor| reactor.handles(action))
			.find_map(|reactor| reactor.react(action))
			.inspect(|_| {
				debug!(
					verb = action.verb(),
					resource = %action.resource.plural,
					"reactor handled action"
				);
			})
	}

	/// Record `action`, then let reactors or the tracker handle it.
	#[instrument(skip_all, fields(verb = action.verb(), resource = %action.resource.plural))]
	pub fn invokes(&self, action: Action) -> Result<Option<Value>, ClientError> {
		self.record(&action);
		if let Some(reaction) = self.react(&action) {
			return reaction;
		}
		self.object_reaction(&action)
	}

	/// Record a watch action and open a watcher on the tracker.
	/// A reactor returning an error fails the watch.
	#[instrument(skip_all, fields(resource = %action.resource.plural))]
	pub fn invokes_watch(&self, action: Action) -> Result<Watcher, ClientError> {
		self.record(&action);
		if let Some(Err(e)) = self.react(&action) {
			return Err(e);
		}
		let label_selector = match &action.request {
			Request::Watch { label_selector } | Request::List { label_selector } => {
				selector(label_selector.as_deref())?
			}
			_ => LabelSelector::default(),
		};
		Ok(self
			.tracker
			.watch(&action.resource, action.namespace.as_deref(), label_selector))
	}

	/// Default behaviour: serve the action from the tracker.
	fn object_reaction(&self, action: &Action) -> Result<Option<Value>, ClientError> {
		let tracker = &self.tracker;
		let resource = &action.resource;
		let namespace = action.namespace.as_deref();

		let object = match &action.request {
			Request::Get { name } => tracker.get(resource, namespace, name)?,
			Request::List { label_selector } => {
				let items = tracker.list(resource, namespace, &selector(label_selector.as_deref())?);
				json!({
					"apiVersion": resource.api_version(),
					"kind": resource.list_kind(),
					"metadata": {"resourceVersion": tracker.resource_version().to_string()},
					"items": items,
				})
			}
			Request::Watch { .. } => return Ok(None),
			Request::Create { object, dry_run } => {
				tracker.create(resource, namespace, object.clone(), *dry_run)?
			}
			Request::Update {
				object,
				subresource,
				dry_run,
			} => match subresource.as_deref() {
				Some("status") => tracker.update_status(resource, namespace, object.clone(), *dry_run)?,
				_ => tracker.update(resource, namespace, object.clone(), *dry_run)?,
			},
			Request::Delete { name, dry_run } => tracker.delete(resource, namespace, name, *dry_run)?,
			Request::DeleteCollection {
				label_selector,
				dry_run,
			} => {
				let selector = selector(label_selector.as_deref())?;
				tracker.delete_collection(resource, namespace, &selector, *dry_run)?;
				return Ok(None);
			}
			Request::Patch {
				name,
				kind,
				data,
				subresources,
				dry_run,
			} => {
				let data = if subresources.iter().any(|s| s == "status") {
					// a body without status leaves the stored status alone
					data.get("status")
						.map_or_else(|| json!({}), |status| json!({"status": status}))
				} else {
					data.clone()
				};
				tracker.patch(resource, namespace, name, *kind, data, *dry_run)?
			}
		};
		Ok(Some(object))
	}
}
