//! Published scene index with atomic replacement.
//!
//! # Purpose
//!
//! Expose the scenes of the last successfully reloaded document to readers that must never
//! observe a half-built view.
//!
//! # Mental model
//!
//! * A [`SceneIndex`] is an immutable value built from one parsed document.
//! * Readers pin an `Arc<SceneIndex>` and resolve lookups against that view.
//! * A reload builds a complete replacement and publishes it with a single store.
//!
//! # Key types
//!
//! | Type | Meaning | Constraints | Constructed / mutated in |
//! |---|---|---|---|
//! | [`SceneIndex`] | Scenes of one document, in document order | Immutable after build | [`SceneIndex::build`] |
//! | [`IndexedScene`] | Identifier, name and entity states of one scene | Entity order follows the document | [`SceneIndex::build`] |
//! | [`SceneIndexCell`] | Atomic holder of the current index | Publication is a single swap | [`SceneIndexCell::replace`] |
//! | [`SceneIndexSink`] | Host seam receiving published indexes | Must never expose a partial index | host implementations |
//!
//! # Invariants
//!
//! * A failed build publishes nothing; the previous index stays current.
//! * Generations increase by one per publication, starting at zero for the empty index.
//!
//! # Concurrency & ordering
//!
//! * Readers are wait-free (`ArcSwap` load of an immutable value).
//! * Writers are serialized by the caller; the cell itself does not order competing publishers.
//! * Old indexes stay alive while a reader holds them.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use arc_swap::ArcSwap;
use indexmap::IndexMap;
use sceneplus_document::{EntityState, ParseError, SceneDocument};


/// One scene as published by a reload.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedScene {
	/// Document identifier.
	pub id: String,
	/// Display name, when the document sets one.
	pub name: Option<String>,
	/// Stored entity states in document order.
	pub entities: IndexMap<String, EntityState>,
}

/// Scenes of one document keyed by identifier, in document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneIndex {
	scenes: IndexMap<String, IndexedScene>,
}

impl SceneIndex {
	/// Builds the index of `document`, decoding every stored entity state.
	pub fn build(document: &SceneDocument) -> Result<Self, ParseError> {
		let mut scenes = IndexMap::with_capacity(document.len());
		for record in document.scenes() {
			let entities = record.entities()?.into_iter().collect();
			let scene = IndexedScene {
				id: record.id().to_owned(),
				name: record.name(),
				entities,
			};
			scenes.insert(scene.id.clone(), scene);
		}
		Ok(Self { scenes })
	}

	pub fn get(&self, id: &str) -> Option<&IndexedScene> {
		self.scenes.get(id)
	}

	pub fn contains(&self, id: &str) -> bool {
		self.scenes.contains_key(id)
	}

	pub fn iter(&self) -> impl Iterator<Item = &IndexedScene> {
		self.scenes.values()
	}

	pub fn len(&self) -> usize {
		self.scenes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.scenes.is_empty()
	}
}

/// Receiver of scene indexes published by reloads.
pub trait SceneIndexSink: Send + Sync {
	/// Index published by the last successful reload.
	fn current(&self) -> Arc<SceneIndex>;

	/// Atomically replaces the published index.
	fn replace_index(&self, index: SceneIndex);
}

/// Atomic holder of the current [`SceneIndex`].
#[derive(Debug, Default)]
pub struct SceneIndexCell {
	index: ArcSwap<SceneIndex>,
	generation: AtomicU64,
}

impl SceneIndexCell {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn load(&self) -> Arc<SceneIndex> {
		self.index.load_full()
	}

	/// Publishes `index`, returning the new generation.
	pub fn replace(&self, index: SceneIndex) -> u64 {
		let scenes = index.len();
		self.index.store(Arc::new(index));
		let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
		tracing::debug!(generation, scenes, "scene_index.published");
		generation
	}

	/// Number of publications so far.
	pub fn generation(&self) -> u64 {
		self.generation.load(Ordering::Acquire)
	}
}

impl SceneIndexSink for SceneIndexCell {
	fn current(&self) -> Arc<SceneIndex> {
		self.load()
	}

	fn replace_index(&self, index: SceneIndex) {
		self.replace(index);
	}
}
