//! In-memory fake Kubernetes resource client.
//!
//! Every request made through a [`FakeResourceClient`] is recorded as an
//! [`Action`] and dispatched by a shared [`Fake`]: registered reactors get
//! the first chance to answer it, otherwise it is served from a single
//! [`ObjectTracker`] keyed by resource identity.

mod action;
mod client;
mod cluster_deployment_customization;
mod error;
mod fake;
mod helpers;
pub mod label_selector;
mod resource;
mod tracker;

pub use action::{Action, PatchKind, Request};
pub use client::{FakeResourceClient, ObjectList, ResourceClient};
pub use cluster_deployment_customization::{
	ClusterDeploymentCustomization, ClusterDeploymentCustomizationSpec,
	ClusterDeploymentCustomizationStatus, CustomizationCondition, PatchEntity,
};
pub use error::ClientError;
pub use fake::{Fake, Reaction, Reactor};
pub use label_selector::LabelSelector;
pub use resource::ResourceType;
pub use tracker::{ObjectTracker, SharedObjects, Watcher};
