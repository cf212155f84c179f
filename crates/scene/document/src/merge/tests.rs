use std::collections::HashMap;

use pretty_assertions::assert_eq;
use serde_json::{Value, json};

use crate::{EntityState, MergeError, SceneDocument};

fn state(state: &str, attributes: Value) -> EntityState {
	let Value::Object(attributes) = attributes else {
		panic!("attributes must be an object");
	};
	EntityState::new(state, attributes)
}

fn snapshots(entries: &[(&str, EntityState)]) -> HashMap<String, EntityState> {
	entries.iter().map(|(id, state)| ((*id).to_owned(), state.clone())).collect()
}

fn merged(text: &str, scene: &str, captured: &HashMap<String, EntityState>) -> (String, usize) {
	let mut doc = SceneDocument::parse(text).expect("document should parse");
	let updated = doc.apply_update(scene, captured).expect("scene should exist");
	(doc.serialize(), updated)
}

const RELAX: &str = "\
- id: relax
  name: Relax
  entities:
    light.a:
      state: 'on'
      attributes:
        brightness: 100
    light.b:
      state: 'off'
      attributes: {}
";

#[test]
fn refreshes_declared_entities_only() {
	let captured = snapshots(&[
		("light.a", state("on", json!({"brightness": 180}))),
		("light.c", state("on", json!({}))),
	]);
	let (text, updated) = merged(RELAX, "relax", &captured);

	assert_eq!(updated, 1);
	assert_eq!(
		text,
		"\
- id: relax
  name: Relax
  entities:
    light.a:
      state: 'on'
      attributes:
        brightness: 180
    light.b:
      state: 'off'
      attributes: {}
"
	);
	let doc = SceneDocument::parse(&text).unwrap();
	assert_eq!(doc.scene("relax").unwrap().entity_ids(), ["light.a", "light.b"]);
}

#[test]
fn unknown_scene_is_rejected_without_changes() {
	let mut doc = SceneDocument::parse(RELAX).unwrap();
	let before = doc.clone();
	let err = doc.apply_update("missing", &HashMap::new()).unwrap_err();
	assert_eq!(err, MergeError::SceneNotFound("missing".into()));
	assert_eq!(doc, before);
}

#[test]
fn other_scenes_stay_byte_identical() {
	let other = "\
- id: movie   # evening
  entities:
    light.a:   {state: 'off', attributes: {brightness: 3}}
    # projector is manual
    media_player.tv: on
";
	let text = format!("{RELAX}{other}");
	let captured = snapshots(&[("light.a", state("off", json!({"brightness": 1})))]);
	let (out, updated) = merged(&text, "relax", &captured);

	assert_eq!(updated, 1);
	assert!(out.ends_with(other), "movie scene changed:\n{out}");
}

#[test]
fn siblings_and_comments_survive() {
	let text = "\
- id: relax
  entities:
    # reading corner
    light.a:
      friendly_name: Lamp   # legacy
      state: 'off'  # stale
      attributes:
        brightness: 3
      transition: 2
    light.b: off
";
	let captured = snapshots(&[("light.a", state("on", json!({"brightness": 200, "color_mode": "xy"})))]);
	let (out, _) = merged(text, "relax", &captured);

	assert_eq!(
		out,
		"\
- id: relax
  entities:
    # reading corner
    light.a:
      friendly_name: Lamp   # legacy
      state: 'on'
      attributes:
        brightness: 200
        color_mode: xy
      transition: 2
    light.b: off
"
	);
}

#[test]
fn missing_fields_are_appended() {
	let text = "- id: relax\n  entities:\n    light.a:\n      friendly_name: Lamp";
	let captured = snapshots(&[("light.a", state("on", json!({"brightness": 5})))]);
	let (out, updated) = merged(text, "relax", &captured);

	assert_eq!(updated, 1);
	assert_eq!(
		out,
		"- id: relax\n  entities:\n    light.a:\n      friendly_name: Lamp\n      state: 'on'\n      attributes:\n        brightness: 5\n"
	);
}

#[test]
fn shorthand_entities_become_mappings() {
	let text = "- id: relax\n  entities:\n    light.a: on\n    switch.fan: off\n";
	let captured = snapshots(&[("light.a", state("on", json!({"brightness": 5, "effect_list": ["none", "rainbow"]})))]);
	let (out, updated) = merged(text, "relax", &captured);

	assert_eq!(updated, 1);
	assert_eq!(
		out,
		"\
- id: relax
  entities:
    light.a:
      state: 'on'
      attributes:
        brightness: 5
        effect_list:
          - none
          - rainbow
    switch.fan: off
"
	);
}

#[test]
fn inline_entities_become_a_block() {
	let text = "- id: relax\n  name: Relax\n  entities: {light.a: {state: 'off', friendly_name: Lamp}, light.b: on}\n  icon: mdi:sofa\n";
	let captured = snapshots(&[("light.a", state("on", json!({})))]);
	let (out, updated) = merged(text, "relax", &captured);

	assert_eq!(updated, 1);
	assert_eq!(
		out,
		"\
- id: relax
  name: Relax
  entities:
    light.a:
      state: 'on'
      friendly_name: Lamp
      attributes: {}
    light.b: 'on'
  icon: mdi:sofa
"
	);
	let doc = SceneDocument::parse(&out).unwrap();
	assert_eq!(doc.scene("relax").unwrap().entity_ids(), ["light.a", "light.b"]);
}

#[test]
fn native_types_are_preserved() {
	let captured = snapshots(&[(
		"light.a",
		state(
			"on",
			json!({"brightness": 180, "level": 0.5, "dimmable": true, "effect": null, "hs_color": [30.0, 60.5], "name": "123"}),
		),
	)]);
	let (out, _) = merged(RELAX, "relax", &captured);
	let doc = SceneDocument::parse(&out).unwrap();
	let entities = doc.scene("relax").unwrap().entities().unwrap();
	assert_eq!(
		Value::Object(entities[0].1.attributes.clone()),
		json!({"brightness": 180, "level": 0.5, "dimmable": true, "effect": null, "hs_color": [30.0, 60.5], "name": "123"})
	);
}

#[test]
fn reapplying_identical_states_is_stable() {
	let texts = [
		RELAX,
		"- id: relax\n  entities:\n    light.a: on\n    light.b: off\n",
		"- id: relax\n  entities: {light.a: on, light.b: {state: 'off'}}\n",
		"- id: relax\n  entities:\n    light.a:\n      attributes:\n        brightness: 1\n",
	];
	let captured = snapshots(&[
		("light.a", state("on", json!({"brightness": 180, "rgb_color": [1, 2, 3], "extra": {"nested": [{"k": "v"}]}}))),
		("light.b", state("off", json!({}))),
	]);
	for text in texts {
		let (once, _) = merged(text, "relax", &captured);
		let (twice, updated) = merged(&once, "relax", &captured);
		assert_eq!(twice, once, "second merge of {text:?} changed the document");
		assert!(updated > 0);

		let mut doc = SceneDocument::parse(text).unwrap();
		doc.apply_update("relax", &captured).unwrap();
		doc.apply_update("relax", &captured).unwrap();
		assert_eq!(doc.serialize(), once, "in-memory reapply of {text:?} diverged");
	}
}

#[test]
fn nothing_to_refresh_leaves_text_alone() {
	let text = "- id: relax\n  entities: {light.a: on}   # keep\n";
	let captured = snapshots(&[("light.z", state("on", json!({})))]);
	let (out, updated) = merged(text, "relax", &captured);
	assert_eq!(updated, 0);
	assert_eq!(out, text);
}

#[test]
fn crlf_documents_stay_crlf() {
	let text = "- id: relax\r\n  entities:\r\n    light.a: on\r\n";
	let captured = snapshots(&[("light.a", state("off", json!({"brightness": 1})))]);
	let (out, _) = merged(text, "relax", &captured);
	assert_eq!(
		out,
		"- id: relax\r\n  entities:\r\n    light.a:\r\n      state: 'off'\r\n      attributes:\r\n        brightness: 1\r\n"
	);
}

#[test]
fn four_space_documents_keep_their_step() {
	let text = "- id: relax\n  entities:\n      light.a: on\n";
	let captured = snapshots(&[("light.a", state("on", json!({"brightness": 1})))]);
	let (out, _) = merged(text, "relax", &captured);
	assert_eq!(
		out,
		"- id: relax\n  entities:\n      light.a:\n          state: 'on'\n          attributes:\n              brightness: 1\n"
	);
}

#[test]
fn unprintable_characters_survive_a_reparse() {
	let values = [
		("del", "a\u{7f}b"),
		("c1", "a\u{9b}b"),
		("nel", "a\u{85}b"),
		("line_separator", "a\u{2028}b"),
		("paragraph_separator", "a\u{2029}b"),
		("bom", "\u{feff}a"),
		("noncharacter", "a\u{fffe}b\u{ffff}"),
		("bell", "a\u{7}b"),
		("tab", "a\tb"),
	];
	for (class, value) in values {
		let captured = snapshots(&[("light.a", state(value, json!({"name": value, value: class})))]);
		let (out, _) = merged(RELAX, "relax", &captured);
		let doc = SceneDocument::parse(&out).unwrap_or_else(|err| panic!("{class}: written document no longer parses: {err}"));
		let entities = doc.scene("relax").unwrap().entities().unwrap();
		assert_eq!(entities[0].1.state, value, "{class}");
		assert_eq!(Value::Object(entities[0].1.attributes.clone()), json!({"name": value, value: class}), "{class}");
	}
}

#[test]
fn inline_rebuild_keeps_untouched_entities() {
	let text = "- id: relax\n  entities: {light.a: on, light.b: !secret lamp, light.c: {state: 'off', 1: x, effect: !fx [a, b]}}\n";
	let captured = snapshots(&[("light.a", state("on", json!({})))]);
	let (out, updated) = merged(text, "relax", &captured);

	assert_eq!(updated, 1);
	assert_eq!(
		out,
		"\
- id: relax
  entities:
    light.a:
      state: 'on'
      attributes: {}
    light.b: !secret lamp
    light.c:
      state: 'off'
      1: x
      effect: !fx
        - a
        - b
"
	);
	let (twice, _) = merged(&out, "relax", &captured);
	assert_eq!(twice, out);
}

#[test]
fn shorthand_refresh_keeps_sibling_yaml() {
	let text = "- id: relax\n  entities:\n    light.a: {state: 'off', 2: two, icon: !icon sofa}\n";
	let captured = snapshots(&[("light.a", state("on", json!({"brightness": 1})))]);
	let (out, _) = merged(text, "relax", &captured);
	assert_eq!(
		out,
		"- id: relax\n  entities:\n    light.a:\n      state: 'on'\n      2: two\n      icon: !icon sofa\n      attributes:\n        brightness: 1\n"
	);
}
