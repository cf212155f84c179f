use indexmap::IndexSet;
use sceneplus_document::EntityState;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Attribute under which a scene entity carries the identifier of its scene in the document.
pub const SCENE_ID_ATTRIBUTE: &str = "id";

/// State of one entity as reported by the live registry at the instant of lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveEntitySnapshot {
	/// Registry identifier, e.g. `light.kitchen`.
	pub entity_id: String,
	/// Primary value in its string form.
	pub state: String,
	/// Attributes exactly as the registry reports them.
	#[serde(default)]
	pub attributes: Map<String, Value>,
}

impl LiveEntitySnapshot {
	/// Creates a snapshot from its parts.
	pub fn new(entity_id: impl Into<String>, state: impl Into<String>, attributes: Map<String, Value>) -> Self {
		Self {
			entity_id: entity_id.into(),
			state: state.into(),
			attributes,
		}
	}

	/// Scene identifier carried by a scene entity, when this is one.
	///
	/// Numeric identifiers are accepted and returned in their decimal form.
	pub fn scene_id(&self) -> Option<String> {
		match self.attributes.get(SCENE_ID_ATTRIBUTE)? {
			Value::String(id) if !id.is_empty() => Some(id.clone()),
			Value::Number(id) => Some(id.to_string()),
			_ => None,
		}
	}

	/// Captures this snapshot as a document state, dropping null and excluded attributes.
	pub fn capture(&self, policy: &CapturePolicy) -> EntityState {
		let attributes = self
			.attributes
			.iter()
			.filter(|(name, value)| !value.is_null() && !policy.excludes(name))
			.map(|(name, value)| (name.clone(), value.clone()))
			.collect();
		EntityState::new(self.state.clone(), attributes)
	}
}

/// Attributes that never reach a scenes document.
///
/// Registry placement metadata describes where a device lives, not how it is configured, so it is
/// excluded by default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturePolicy {
	excluded: IndexSet<String>,
}

impl CapturePolicy {
	/// Attributes excluded when no policy is configured.
	pub const DEFAULT_EXCLUDED: [&'static str; 3] = ["device_id", "area_id", "zone_id"];

	/// Creates a policy excluding exactly `excluded`.
	pub fn new<I, S>(excluded: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self {
			excluded: excluded.into_iter().map(Into::into).collect(),
		}
	}

	/// Returns whether `attribute` is dropped on capture.
	pub fn excludes(&self, attribute: &str) -> bool {
		self.excluded.contains(attribute)
	}
}

impl Default for CapturePolicy {
	fn default() -> Self {
		Self::new(Self::DEFAULT_EXCLUDED)
	}
}

/// Read-only view of the host's live entity states.
pub trait LiveRegistry: Send + Sync {
	/// Current state of `entity_id`, or `None` when the registry does not know it.
	fn get(&self, entity_id: &str) -> Option<LiveEntitySnapshot>;
}
