//! State merge engine.
//!
//! Refreshes the entities a scene already declares from captured states. Membership never
//! changes: captured states for undeclared entities are ignored, and declared entities without a
//! capture keep their stored value and text.
//!
//! Rewrites are confined to the target scene's `entities` subtree:
//!
//! * a block entity mapping has its `state` and `attributes` entries replaced in place, or
//!   appended when missing, while sibling keys keep their lines;
//! * an inline or shorthand entity value is re-rendered as a block mapping, keeping its other keys;
//! * an inline `entities` flow mapping is re-rendered as a block mapping in declaration order,
//!   with entities that have no capture rendered from their decoded YAML, tags included.

use std::collections::HashMap;

use serde_json::Value;
use serde_yaml::Value as Yaml;

use crate::error::MergeError;
use crate::model::EntityState;
use crate::render::{self, Style};
use crate::tree::{Body, Entry, Mapping, SceneDocument, SceneRecord, parse_entities};
use crate::{ATTRIBUTES_KEY, ENTITIES_KEY, STATE_KEY};

#[cfg(test)]
mod tests;

const DEFAULT_STEP: usize = 2;

impl SceneDocument {
	/// Writes captured states into scene `scene_id`, returning how many entities were refreshed.
	///
	/// Fails without modifying the document when the scene does not exist. Everything outside
	/// the scene's `entities` subtree is left untouched.
	pub fn apply_update(&mut self, scene_id: &str, snapshots: &HashMap<String, EntityState>) -> Result<usize, MergeError> {
		let eol = self.eol;
		let scene = self
			.scenes
			.iter_mut()
			.find(|scene| scene.id == scene_id)
			.ok_or_else(|| MergeError::SceneNotFound(scene_id.to_owned()))?;
		Ok(scene.refresh(snapshots, eol))
	}
}

impl SceneRecord {
	fn refresh(&mut self, snapshots: &HashMap<String, EntityState>, eol: &'static str) -> usize {
		if !self.entity_ids.iter().any(|id| snapshots.contains_key(id)) {
			return 0;
		}
		let scene_indent = self.body.indent;
		let Some(entry) = self.body.find_mut(ENTITIES_KEY) else {
			return 0;
		};

		if let Body::Mapping(entities) = &mut entry.body {
			let step = entities.indent.checked_sub(scene_indent).filter(|step| *step > 0).unwrap_or(DEFAULT_STEP);
			let style = Style { step, eol };
			let entity_indent = entities.indent;
			let mut updated = 0;
			for entity in &mut entities.entries {
				if let Some(state) = snapshots.get(&entity.key)
					&& refresh_entity(entity, state, entity_indent, style)
				{
					updated += 1;
				}
			}
			return updated;
		}

		rebuild_inline(entry, &self.id, snapshots, scene_indent, Style { step: DEFAULT_STEP, eol })
	}
}

/// Refreshes one entity, returning whether it was rewritten.
fn refresh_entity(entity: &mut Entry, state: &EntityState, entity_indent: usize, style: Style) -> bool {
	if let Body::Mapping(fields) = &mut entity.body {
		fields.set(STATE_KEY, &Value::String(state.state.clone()), style);
		fields.set(ATTRIBUTES_KEY, &Value::Object(state.attributes.clone()), style);
		return true;
	}

	let existing = entity.decode_yaml().unwrap_or(Yaml::Null);
	let Some(text) = render_entity(style, entity.head.lead(), entity.key_text(), existing, state, entity_indent) else {
		return false;
	};
	replace_rendered(entity, &text);
	true
}

/// Renders an entity as a block mapping holding `state`, with its existing keys carried over.
///
/// `state` and `attributes` are replaced where they already sit and appended otherwise. Any
/// other key keeps its YAML value.
fn render_entity(style: Style, lead: &str, key: &str, existing: Yaml, state: &EntityState, entity_indent: usize) -> Option<String> {
	let indent = entity_indent + style.step;
	let pad = " ".repeat(indent);
	let fresh_state = Value::String(state.state.clone());
	let fresh_attributes = Value::Object(state.attributes.clone());

	let mut out = format!("{lead}{key}:{}", style.eol);
	let (mut wrote_state, mut wrote_attributes) = (false, false);
	if let Yaml::Mapping(fields) = existing {
		for (field, value) in &fields {
			match field.as_str() {
				Some(STATE_KEY) if !wrote_state => {
					style.entry(&mut out, &pad, STATE_KEY, &fresh_state, indent + style.step);
					wrote_state = true;
				}
				Some(ATTRIBUTES_KEY) if !wrote_attributes => {
					style.entry(&mut out, &pad, ATTRIBUTES_KEY, &fresh_attributes, indent + style.step);
					wrote_attributes = true;
				}
				_ => style.carried(&mut out, &pad, &render::yaml_key(field)?, value, indent + style.step)?,
			}
		}
	}
	if !wrote_state {
		style.entry(&mut out, &pad, STATE_KEY, &fresh_state, indent + style.step);
	}
	if !wrote_attributes {
		style.entry(&mut out, &pad, ATTRIBUTES_KEY, &fresh_attributes, indent + style.step);
	}
	Some(out)
}

/// Re-renders an inline `entities` flow mapping as a block with refreshed entities.
///
/// Entities without a captured state keep their YAML value. Nothing changes when any entity has
/// no block rendering.
fn rebuild_inline(entry: &mut Entry, scene: &str, snapshots: &HashMap<String, EntityState>, scene_indent: usize, style: Style) -> usize {
	let Ok(Yaml::Mapping(current)) = entry.decode_yaml() else {
		return 0;
	};
	let entity_indent = scene_indent + style.step;
	let pad = " ".repeat(entity_indent);

	let mut updated = 0;
	let mut text = format!("{}{}:{}", entry.head.lead(), entry.key_text(), style.eol);
	for (id, value) in current {
		let rendered = match id.as_str().and_then(|id| snapshots.get(id).map(|state| (id, state))) {
			Some((id, state)) => {
				updated += 1;
				render_entity(style, &pad, &render::string(id), value, state, entity_indent)
			}
			None => render_carried(style, &pad, &id, &value, entity_indent + style.step),
		};
		let Some(rendered) = rendered else {
			return 0;
		};
		text.push_str(&rendered);
	}

	let Some(mut fresh) = Entry::rendered(Vec::new(), &text) else {
		return 0;
	};
	fresh.leading = std::mem::take(&mut entry.leading);

	let mut structured = fresh.clone();
	*entry = match parse_entities(&mut structured, scene) {
		Ok(_) => structured,
		Err(_) => fresh,
	};
	updated
}

fn render_carried(style: Style, pad: &str, key: &Yaml, value: &Yaml, indent: usize) -> Option<String> {
	let key = render::yaml_key(key)?;
	let mut out = String::new();
	style.carried(&mut out, pad, &key, value, indent)?;
	Some(out)
}

fn replace_rendered(entry: &mut Entry, text: &str) {
	if let Some(mut fresh) = Entry::rendered(Vec::new(), text) {
		fresh.leading = std::mem::take(&mut entry.leading);
		*entry = fresh;
	}
}

impl Mapping {
	/// Sets `key` to a freshly rendered `value`, in place when present and appended otherwise.
	fn set(&mut self, key: &str, value: &Value, style: Style) {
		let indent = self.indent;
		let mut text = String::new();
		if let Some(entry) = self.find_mut(key) {
			style.entry(&mut text, entry.head.lead(), entry.key_text(), value, indent + style.step);
			replace_rendered(entry, &text);
			return;
		}

		self.terminate(style.eol);
		style.entry(&mut text, &" ".repeat(indent), &render::string(key), value, indent + style.step);
		if let Some(entry) = Entry::rendered(Vec::new(), &text) {
			self.entries.push(entry);
		}
	}
}
