use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use serde_json::{Map, Value};

use crate::index::{IndexedScene, SceneIndex, SceneIndexCell, SceneIndexSink};
use crate::live::{LiveEntitySnapshot, LiveRegistry, SCENE_ID_ATTRIBUTE};

/// Entity domain of the scene entities a [`MemoryHost`] registers.
pub const SCENE_DOMAIN: &str = "scene";

const SCENE_STATE: &str = "unknown";

/// In-process host holding live entity states and the published scene index.
///
/// Publishing an index also registers one `scene.*` entity per scene, carrying the scene
/// identifier in its `id` attribute, and unregisters the scene entities of the previous index.
#[derive(Debug, Default)]
pub struct MemoryHost {
	state: RwLock<HostState>,
	index: SceneIndexCell,
}

#[derive(Debug, Default)]
struct HostState {
	entities: IndexMap<String, LiveEntitySnapshot>,
	scene_entities: Vec<String>,
}

impl MemoryHost {
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates a host whose registry holds `snapshots`.
	pub fn from_snapshots(snapshots: impl IntoIterator<Item = LiveEntitySnapshot>) -> Self {
		let host = Self::new();
		{
			let mut state = host.state.write();
			for snapshot in snapshots {
				state.entities.insert(snapshot.entity_id.clone(), snapshot);
			}
		}
		host
	}

	/// Inserts or replaces the live state of `snapshot.entity_id`.
	pub fn set(&self, snapshot: LiveEntitySnapshot) {
		self.state.write().entities.insert(snapshot.entity_id.clone(), snapshot);
	}

	/// Removes an entity from the registry.
	pub fn remove(&self, entity_id: &str) -> Option<LiveEntitySnapshot> {
		self.state.write().entities.shift_remove(entity_id)
	}

	/// Registered entity identifiers in registration order.
	pub fn entity_ids(&self) -> Vec<String> {
		self.state.read().entities.keys().cloned().collect()
	}

	/// Scene entity registered for scene `scene_id` by the last publication.
	pub fn scene_entity(&self, scene_id: &str) -> Option<String> {
		let state = self.state.read();
		state
			.scene_entities
			.iter()
			.find(|entity_id| {
				state
					.entities
					.get(entity_id.as_str())
					.and_then(LiveEntitySnapshot::scene_id)
					.is_some_and(|id| id == scene_id)
			})
			.cloned()
	}

	/// Number of index publications so far.
	pub fn generation(&self) -> u64 {
		self.index.generation()
	}
}

impl LiveRegistry for MemoryHost {
	fn get(&self, entity_id: &str) -> Option<LiveEntitySnapshot> {
		self.state.read().entities.get(entity_id).cloned()
	}
}

impl SceneIndexSink for MemoryHost {
	fn current(&self) -> Arc<SceneIndex> {
		self.index.load()
	}

	/// The index is stored before the entity table unlocks, so a reader that sees a new scene
	/// entity also sees the index that declares it.
	fn replace_index(&self, index: SceneIndex) {
		let mut state = self.state.write();
		let HostState { entities, scene_entities } = &mut *state;
		for stale in scene_entities.drain(..) {
			entities.shift_remove(&stale);
		}
		for scene in index.iter() {
			let entity_id = unique_entity_id(entities, &slug(scene.name.as_deref().unwrap_or(&scene.id)));
			entities.insert(entity_id.clone(), scene_entity(&entity_id, scene));
			scene_entities.push(entity_id);
		}
		tracing::debug!(scenes = scene_entities.len(), "host.scene_entities.registered");
		self.index.replace(index);
	}
}

fn scene_entity(entity_id: &str, scene: &IndexedScene) -> LiveEntitySnapshot {
	let mut attributes = Map::new();
	attributes.insert(SCENE_ID_ATTRIBUTE.to_owned(), Value::String(scene.id.clone()));
	attributes.insert(
		"entity_id".to_owned(),
		Value::Array(scene.entities.keys().cloned().map(Value::String).collect()),
	);
	if let Some(name) = &scene.name {
		attributes.insert("friendly_name".to_owned(), Value::String(name.clone()));
	}
	LiveEntitySnapshot::new(entity_id, SCENE_STATE, attributes)
}

fn unique_entity_id(entities: &IndexMap<String, LiveEntitySnapshot>, slug: &str) -> String {
	let base = format!("{SCENE_DOMAIN}.{slug}");
	let mut candidate = base.clone();
	let mut suffix = 1;
	while entities.contains_key(&candidate) {
		suffix += 1;
		candidate = format!("{base}_{suffix}");
	}
	candidate
}

/// Lowercase object id with runs of non-alphanumerics collapsed to `_`.
fn slug(name: &str) -> String {
	let mut out = String::with_capacity(name.len());
	for ch in name.chars().flat_map(char::to_lowercase) {
		if ch.is_alphanumeric() {
			out.push(ch);
		} else if !out.is_empty() && !out.ends_with('_') {
			out.push('_');
		}
	}
	while out.ends_with('_') {
		out.pop();
	}
	if out.is_empty() { SCENE_DOMAIN.to_owned() } else { out }
}
