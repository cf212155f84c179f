//! Rebuilds the published scene index from the scenes file.

use sceneplus_document::SceneDocument;
use sceneplus_registry::{SceneIndex, SceneIndexSink};

use crate::error::ServiceError;
use crate::store::SceneStore;

/// Re-reads the scenes file and atomically replaces the published index, returning the scene
/// count.
///
/// Holds the writer session throughout, so a reload never observes a half-applied update. On any
/// failure the previously published index stays current.
pub async fn reload(store: &SceneStore, sink: &dyn SceneIndexSink) -> Result<usize, ServiceError> {
	let session = store.write().await?;
	let text = session.load().await?;
	let document = SceneDocument::parse(&text)?;
	let index = SceneIndex::build(&document)?;
	let scene_count = index.len();
	sink.replace_index(index);
	Ok(scene_count)
}
