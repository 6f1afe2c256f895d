//! Recorded client requests.

use serde_json::Value;

use crate::ResourceType;

/// How a patch body is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchKind {
	Apply,
	Json,
	Merge,
	Strategic,
}

impl PatchKind {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Apply => "apply",
			Self::Json => "json",
			Self::Merge => "merge",
			Self::Strategic => "strategic",
		}
	}
}

/// The verb-specific part of an [`Action`].
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
	Get {
		name: String,
	},
	List {
		label_selector: Option<String>,
	},
	Watch {
		label_selector: Option<String>,
	},
	Create {
		object: Value,
		dry_run: bool,
	},
	Update {
		object: Value,
		/// `Some("status")` for status updates.
		subresource: Option<String>,
		dry_run: bool,
	},
	Delete {
		name: String,
		dry_run: bool,
	},
	DeleteCollection {
		label_selector: Option<String>,
		dry_run: bool,
	},
	Patch {
		name: String,
		kind: PatchKind,
		data: Value,
		subresources: Vec<String>,
		dry_run: bool,
	},
}

/// A single request made through a fake client.
#[derive(Debug, Clone, PartialEq)]
pub struct Action {
	pub resource: ResourceType,
	/// `None` for cluster-scoped resources and all-namespace requests.
	pub namespace: Option<String>,
	pub request: Request,
}

impl Action {
	pub fn new(resource: ResourceType, namespace: Option<String>, request: Request) -> Self {
		Self {
			resource,
			namespace,
			request,
		}
	}

	pub fn verb(&self) -> &'static str {
		match self.request {
			Request::Get { .. } => "get",
			Request::List { .. } => "list",
			Request::Watch { .. } => "watch",
			Request::Create { .. } => "create",
			Request::Update { .. } => "update",
			Request::Delete { .. } => "delete",
			Request::DeleteCollection { .. } => "delete-collection",
			Request::Patch { .. } => "patch",
		}
	}

	pub fn subresource(&self) -> Option<&str> {
		match &self.request {
			Request::Update { subresource, .. } => subresource.as_deref(),
			Request::Patch { subresources, .. } => subresources.first().map(String::as_str),
			_ => None,
		}
	}

	/// Whether the action has the given verb and resource plural.
	/// `"*"` matches anything.
	pub fn matches(&self, verb: &str, resource: &str) -> bool {
		(verb == "*" || verb == self.verb()) && (resource == "*" || resource == self.resource.plural)
	}
}

#[cfg(test)]
mod tests {
	use rstest::rstest;

	use super::*;

	fn get_action() -> Action {
		Action::new(
			ResourceType::cluster_deployment_customizations(),
			Some("ns".into()),
			Request::Get { name: "x".into() },
		)
	}

	#[rstest]
	#[case::exact("get", "clusterdeploymentcustomizations", true)]
	#[case::any_verb("*", "clusterdeploymentcustomizations", true)]
	#[case::any_resource("get", "*", true)]
	#[case::other_verb("list", "*", false)]
	#[case::other_resource("get", "configmaps", false)]
	fn test_matches(#[case] verb: &str, #[case] resource: &str, #[case] expected: bool) {
		assert_eq!(get_action().matches(verb, resource), expected);
	}

	#[test]
	fn test_status_subresource() {
		let action = Action::new(
			ResourceType::cluster_deployment_customizations(),
			None,
			Request::Update {
				object: Value::Null,
				subresource: Some("status".into()),
				dry_run: false,
			},
		);
		assert_eq!(action.verb(), "update");
		assert_eq!(action.subresource(), Some("status"));
		assert_eq!(get_action().subresource(), None);
	}
}
