//! Scene resolution and entity listing.

use sceneplus_document::SceneDocument;
use sceneplus_registry::{LiveRegistry, SceneIndex};

use crate::error::ServiceError;

/// Resolves a service target to a scene identifier.
///
/// A registry entity carrying an `id` attribute (a scene entity such as `scene.relax`) resolves
/// to that identifier. Otherwise `target` is taken as a bare identifier and must be present in the
/// published index.
pub fn resolve_scene(target: &str, live: &dyn LiveRegistry, index: &SceneIndex) -> Result<String, ServiceError> {
	if let Some(id) = live.get(target).and_then(|entity| entity.scene_id()) {
		return Ok(id);
	}
	if index.contains(target) {
		return Ok(target.to_owned());
	}
	Err(ServiceError::NotFound(target.to_owned()))
}

/// Entity identifiers declared by scene `scene_id`, in document order.
///
/// Fails with [`ServiceError::Stale`] when the document no longer holds the scene.
pub fn entities_of(document: &SceneDocument, scene_id: &str) -> Result<Vec<String>, ServiceError> {
	document
		.scene(scene_id)
		.map(|scene| scene.entity_ids().to_vec())
		.ok_or_else(|| ServiceError::Stale(scene_id.to_owned()))
}
