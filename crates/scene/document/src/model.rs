use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{ATTRIBUTES_KEY, STATE_KEY};

/// Captured configuration of one entity: a primary state plus opaque attributes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityState {
	/// Primary value, e.g. `on`.
	pub state: String,
	/// Attribute values in declaration order, passed through verbatim.
	#[serde(default)]
	pub attributes: Map<String, Value>,
}

impl EntityState {
	/// Creates a state from its parts.
	pub fn new(state: impl Into<String>, attributes: Map<String, Value>) -> Self {
		Self {
			state: state.into(),
			attributes,
		}
	}

	/// Reads an entity value as stored in a document.
	///
	/// Scalars are the state shorthand. Mappings without an `attributes` key carry their
	/// attributes inline next to `state`.
	pub(crate) fn from_value(value: Value) -> Self {
		match value {
			Value::Object(fields) => {
				let state = fields.get(STATE_KEY).map(scalar_text).unwrap_or_default();
				let attributes = match fields.get(ATTRIBUTES_KEY) {
					Some(Value::Object(attributes)) => attributes.clone(),
					Some(_) => Map::new(),
					None => fields
						.iter()
						.filter(|(key, _)| key.as_str() != STATE_KEY)
						.map(|(key, value)| (key.clone(), value.clone()))
						.collect(),
				};
				Self { state, attributes }
			}
			other => Self {
				state: scalar_text(&other),
				attributes: Map::new(),
			},
		}
	}
}

fn scalar_text(value: &Value) -> String {
	match value {
		Value::String(text) => text.clone(),
		Value::Null => String::new(),
		other => other.to_string(),
	}
}
