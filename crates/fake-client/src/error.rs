use thiserror::Error;

/// Errors returned by the fake client, mirroring API server failures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClientError {
	#[error("{resource} \"{name}\" not found")]
	NotFound { resource: String, name: String },

	#[error("{resource} \"{name}\" already exists")]
	AlreadyExists { resource: String, name: String },

	#[error("invalid object: {0}")]
	Invalid(String),

	#[error("patch type {0} is not supported")]
	UnsupportedPatch(&'static str),

	#[error("invalid label selector {selector:?}: {reason}")]
	InvalidSelector { selector: String, reason: String },

	#[error("converting object: {0}")]
	Conversion(String),

	/// Failure injected by a reactor.
	#[error("{0}")]
	Intercepted(String),
}

impl ClientError {
	pub fn is_not_found(&self) -> bool {
		matches!(self, Self::NotFound { .. })
	}

	pub fn is_already_exists(&self) -> bool {
		matches!(self, Self::AlreadyExists { .. })
	}
}

impl From<serde_json::Error> for ClientError {
	fn from(error: serde_json::Error) -> Self {
		Self::Conversion(error.to_string())
	}
}
