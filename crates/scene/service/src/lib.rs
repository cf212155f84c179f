//! Scene service over a `scenes.yaml` file and a host registry.
//!
//! [`SceneService`] answers three calls:
//!
//! * `get_entities` lists the entities a scene declares,
//! * `update` captures the live states of those entities into the file,
//! * `reload` re-reads the file and republishes the scene index.
//!
//! Writers are serialized by [`SceneStore`]; readers share it. Every failure is reported as a
//! structured [`ServiceResponse`] rather than surfaced to the caller.

pub mod config;
mod error;
pub mod reader;
pub mod reload;
mod service;
mod store;

pub use config::{ConfigError, SceneplusConfig};
pub use error::{ErrorKind, ErrorPayload, ServiceError};
pub use service::{GetEntitiesReply, ReloadReply, SceneService, ServiceCall, ServiceResponse, Targets, UpdateReply};
pub use store::{ReadSession, SceneStore, WriteSession};
