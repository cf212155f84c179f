use std::collections::HashMap;
use std::sync::Arc;

use sceneplus_document::{EntityState, SceneDocument};
use sceneplus_registry::{CapturePolicy, LiveRegistry, SceneIndexSink};
use serde::{Deserialize, Serialize};

use crate::config::SceneplusConfig;
use crate::error::{ErrorPayload, ServiceError};
use crate::reader;
use crate::store::SceneStore;

/// Inbound call targeting one or more entities: `{"entity_id": "scene.relax"}` or
/// `{"entity_id": ["scene.relax"]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceCall {
	pub entity_id: Targets,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Targets {
	One(String),
	Many(Vec<String>),
}

impl ServiceCall {
	pub fn new(target: impl Into<String>) -> Self {
		Self {
			entity_id: Targets::One(target.into()),
		}
	}

	/// First target of the call. Only one scene is served per call.
	pub fn target(&self) -> Result<&str, ServiceError> {
		let target = match &self.entity_id {
			Targets::One(target) => Some(target.as_str()),
			Targets::Many(targets) => targets.first().map(String::as_str),
		};
		target
			.filter(|target| !target.trim().is_empty())
			.ok_or_else(|| ServiceError::InvalidRequest("entity_id is required".to_owned()))
	}
}

/// Outcome of a service call: `{"success": true, ...reply}` or `{"success": false, "error": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceResponse<T> {
	pub success: bool,
	#[serde(flatten)]
	pub reply: Option<T>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub error: Option<ErrorPayload>,
}

impl<T> ServiceResponse<T> {
	fn from_result(result: Result<T, ServiceError>) -> Self {
		match result {
			Ok(reply) => Self {
				success: true,
				reply: Some(reply),
				error: None,
			},
			Err(error) => Self {
				success: false,
				reply: None,
				error: Some(error.payload()),
			},
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GetEntitiesReply {
	pub scene_id: String,
	pub entities: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateReply {
	pub updated: usize,
	pub scene_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReloadReply {
	pub scene_count: usize,
}

/// Entry point for scene service calls.
pub struct SceneService {
	store: SceneStore,
	live: Arc<dyn LiveRegistry>,
	sink: Arc<dyn SceneIndexSink>,
	policy: CapturePolicy,
}

impl SceneService {
	pub fn new(config: &SceneplusConfig, live: Arc<dyn LiveRegistry>, sink: Arc<dyn SceneIndexSink>) -> Self {
		Self::with_store(SceneStore::from_config(config), live, sink, config.capture_policy())
	}

	pub fn with_store(store: SceneStore, live: Arc<dyn LiveRegistry>, sink: Arc<dyn SceneIndexSink>, policy: CapturePolicy) -> Self {
		Self { store, live, sink, policy }
	}

	/// Lists the entities the targeted scene declares.
	pub async fn get_entities(&self, call: &ServiceCall) -> ServiceResponse<GetEntitiesReply> {
		let result = self.try_get_entities(call).await;
		if let Err(error) = &result {
			tracing::warn!(operation = "get_entities", target = ?call.entity_id, kind = ?error.kind(), %error, "scene.call.failed");
		}
		ServiceResponse::from_result(result)
	}

	/// Captures the live states of the targeted scene's entities into the scenes file.
	pub async fn update(&self, call: &ServiceCall) -> ServiceResponse<UpdateReply> {
		let result = self.try_update(call).await;
		match &result {
			Ok(reply) => tracing::info!(scene = %reply.scene_id, updated = reply.updated, "scene.updated"),
			Err(error) => tracing::warn!(operation = "update", target = ?call.entity_id, kind = ?error.kind(), %error, "scene.call.failed"),
		}
		ServiceResponse::from_result(result)
	}

	/// Re-reads the scenes file and republishes the scene index.
	pub async fn reload(&self) -> ServiceResponse<ReloadReply> {
		let result = crate::reload::reload(&self.store, self.sink.as_ref())
			.await
			.map(|scene_count| ReloadReply { scene_count });
		match &result {
			Ok(reply) => tracing::info!(scenes = reply.scene_count, "scene.reloaded"),
			Err(error) => tracing::warn!(operation = "reload", kind = ?error.kind(), %error, "scene.call.failed"),
		}
		ServiceResponse::from_result(result)
	}

	async fn try_get_entities(&self, call: &ServiceCall) -> Result<GetEntitiesReply, ServiceError> {
		let target = call.target()?;
		let scene_id = reader::resolve_scene(target, self.live.as_ref(), &self.sink.current())?;
		let session = self.store.read().await;
		let document = SceneDocument::parse(&session.load().await?)?;
		let entities = reader::entities_of(&document, &scene_id)?;
		Ok(GetEntitiesReply { scene_id, entities })
	}

	async fn try_update(&self, call: &ServiceCall) -> Result<UpdateReply, ServiceError> {
		let target = call.target()?;
		let session = self.store.write().await?;
		let scene_id = reader::resolve_scene(target, self.live.as_ref(), &self.sink.current())?;

		let text = session.load().await?;
		let mut document = SceneDocument::parse(&text)?;
		let snapshots = self.capture(&reader::entities_of(&document, &scene_id)?);
		let updated = document.apply_update(&scene_id, &snapshots)?;

		let rendered = document.serialize();
		if rendered == text {
			tracing::debug!(scene = %scene_id, "scene.update.unchanged");
		} else {
			// Never persist text that later reads would reject.
			SceneDocument::parse(&rendered)?;
			session.persist(rendered).await?;
		}
		Ok(UpdateReply { updated, scene_id })
	}

	/// Captures the live state of each declared entity the registry knows.
	fn capture(&self, declared: &[String]) -> HashMap<String, EntityState> {
		declared
			.iter()
			.filter_map(|entity_id| {
				let snapshot = self.live.get(entity_id)?;
				Some((entity_id.clone(), snapshot.capture(&self.policy)))
			})
			.collect()
	}
}
