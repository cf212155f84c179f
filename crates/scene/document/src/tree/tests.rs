use pretty_assertions::assert_eq;
use serde_json::json;

use super::*;

const SCENES: &str = "\
# Living room presets
- id: '1700000000001'
  name: Relax
  icon: mdi:sofa  # shown on dashboards
  entities:
    light.a:
      state: 'on'
      attributes:
        brightness: 100
    # kept off while reading
    light.b:
      state: 'off'
      attributes: {}

- id: '1700000000002'
  name: Movie
  entities: {media_player.tv: 'on', light.a: {state: 'off'}}
- id: 42
  name: Empty
  entities:
";

fn parse(text: &str) -> SceneDocument {
	SceneDocument::parse(text).expect("document should parse")
}

fn error_kind(text: &str) -> ParseErrorKind {
	SceneDocument::parse(text).expect_err("document should be rejected").kind
}

#[test]
fn round_trips_byte_for_byte() {
	assert_eq!(parse(SCENES).serialize(), SCENES);
}

#[test]
fn round_trips_unusual_layouts() {
	let texts = [
		"",
		"# nothing yet\n",
		"[]\n",
		"---\n- id: a\n  entities: {}\n...\n",
		"- id: a\r\n  entities:\r\n    light.a: on\r\n",
		"-\n  id: a\n  entities:\n    light.a: on\n",
		"  -   id: a\n      entities:\n        light.a:\n          state: 'on'\n",
		"- id: a\n  tags:\n  - cozy\n  - evening\n  entities:\n    light.a: on",
		"- id: a\n  description: |\n    multi\n\n    line\n  entities:\n    light.a: on\n",
		"- entities:\n    light.a: on\n  id: a\n",
	];
	for text in texts {
		assert_eq!(parse(text).serialize(), text, "round trip of {text:?}");
	}
}

#[test]
fn exposes_scene_metadata() {
	let doc = parse(SCENES);
	assert_eq!(doc.len(), 3);
	let ids: Vec<_> = doc.scenes().iter().map(SceneRecord::id).collect();
	assert_eq!(ids, ["1700000000001", "1700000000002", "42"]);

	let relax = doc.scene("1700000000001").unwrap();
	assert_eq!(relax.name().as_deref(), Some("Relax"));
	assert_eq!(relax.entity_ids(), ["light.a", "light.b"]);

	let movie = doc.scene("1700000000002").unwrap();
	assert_eq!(movie.entity_ids(), ["media_player.tv", "light.a"]);

	assert!(doc.scene("42").unwrap().entity_ids().is_empty());
	assert!(doc.scene("missing").is_none());
}

#[test]
fn decodes_entity_states() {
	let doc = parse(SCENES);
	let relax = doc.scene("1700000000001").unwrap().entities().unwrap();
	assert_eq!(relax[0].0, "light.a");
	assert_eq!(relax[0].1.state, "on");
	assert_eq!(relax[0].1.attributes.get("brightness"), Some(&json!(100)));
	assert!(relax[1].1.attributes.is_empty());

	let movie = doc.scene("1700000000002").unwrap().entities().unwrap();
	assert_eq!(movie[0].1.state, "on");
	assert_eq!(movie[1].1.state, "off");
}

#[test]
fn numeric_ids_keep_their_written_form() {
	let doc = parse("- id: 1.50\n- id: 1.5\n- id: 0x1F   # hex\n- id: '007'\n");
	let ids: Vec<_> = doc.scenes().iter().map(SceneRecord::id).collect();
	assert_eq!(ids, ["1.50", "1.5", "0x1F", "007"]);
}

#[test]
fn empty_documents() {
	for text in ["", "\n\n", "# only a comment\n", "[]", "--- # header\n[]\n"] {
		assert!(parse(text).is_empty(), "{text:?} should hold no scenes");
	}
}

#[test]
fn rejects_non_sequences() {
	assert_eq!(error_kind("id: a\n"), ParseErrorKind::NotASequence);
	assert_eq!(error_kind("- id: a\n  entities: {}\nname: b\n"), ParseErrorKind::NotASequence);
}

#[test]
fn rejects_scalar_scenes() {
	assert_eq!(error_kind("- just a string\n"), ParseErrorKind::SceneNotMapping);
	assert_eq!(error_kind("-\n"), ParseErrorKind::SceneNotMapping);
}

#[test]
fn rejects_scenes_without_ids() {
	assert_eq!(error_kind("- name: a\n  entities: {}\n"), ParseErrorKind::MissingId);
	assert_eq!(error_kind("- id:\n  entities: {}\n"), ParseErrorKind::MissingId);
	assert_eq!(error_kind("- id: [a]\n"), ParseErrorKind::InvalidId("[a]".into()));
}

#[test]
fn rejects_duplicate_scene_ids() {
	let err = SceneDocument::parse("- id: a\n- id: b\n- id: 'a'\n").unwrap_err();
	assert_eq!(err.kind, ParseErrorKind::DuplicateScene("a".into()));
	assert_eq!(err.line, Some(3));
	assert_eq!(err.to_string(), "line 3: duplicate scene id `a`");
}

#[test]
fn rejects_duplicate_entities() {
	let text = "- id: a\n  entities:\n    light.a: on\n    light.a: off\n";
	let err = SceneDocument::parse(text).unwrap_err();
	assert_eq!(
		err.kind,
		ParseErrorKind::DuplicateEntity {
			scene: "a".into(),
			entity: "light.a".into()
		}
	);
	assert_eq!(err.line, Some(4));

	let inline = "- id: a\n  entities: {light.a: on, light.a: off}\n";
	assert!(matches!(error_kind(inline), ParseErrorKind::Yaml(_)));
}

#[test]
fn rejects_malformed_entities() {
	assert_eq!(
		error_kind("- id: a\n  entities:\n  - light.a\n"),
		ParseErrorKind::EntitiesNotMapping("a".into())
	);
	assert_eq!(error_kind("- id: a\n  entities: on\n"), ParseErrorKind::EntitiesNotMapping("a".into()));
	assert_eq!(
		error_kind("- id: a\n  entities:\n    light.a:\n      - on\n"),
		ParseErrorKind::InvalidEntity {
			scene: "a".into(),
			entity: "light.a".into()
		}
	);
}

#[test]
fn rejects_inconsistent_indentation() {
	assert_eq!(error_kind("- id: a\n  entities:\n      light.a: on\n    light.b: off\n"), ParseErrorKind::Indentation);
}
