//! Decorated scene tree.
//!
//! # Mental model
//!
//! Every node owns the physical lines it was parsed from. Serialization walks the tree and emits
//! those lines unchanged, so an untouched node is reproduced byte-for-byte. The merge engine
//! replaces whole nodes with freshly rendered ones and never edits lines in place.
//!
//! # Shape
//!
//! * [`SceneDocument`]: scene records followed by trailing trivia.
//! * [`SceneRecord`]: leading trivia, the `- ` opener and the scene mapping.
//! * `Mapping` / `Entry`: a block mapping whose entries own their leading trivia, head line and
//!   body. A body is kept as raw lines unless the scene shape needs to look inside it: the
//!   `entities` mapping and every entity mapping are parsed into nested `Mapping`s.
//!
//! # Trivia
//!
//! Comments, blank lines and document markers attach to the node that follows them. Trivia after
//! the last node belongs to the document trailer.

use std::collections::HashSet;

use serde_json::Value;

use crate::error::{ParseError, ParseErrorKind};
use crate::line::Line;
use crate::model::EntityState;
use crate::{ENTITIES_KEY, ID_KEY, NAME_KEY, syntax};

#[cfg(test)]
mod tests;

/// A parsed scenes file.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneDocument {
	pub(crate) scenes: Vec<SceneRecord>,
	pub(crate) trailer: Vec<Line>,
	pub(crate) eol: &'static str,
}

/// One scene of a [`SceneDocument`].
#[derive(Debug, Clone, PartialEq)]
pub struct SceneRecord {
	pub(crate) id: String,
	pub(crate) entity_ids: Vec<String>,
	pub(crate) leading: Vec<Line>,
	pub(crate) opener: Opener,
	pub(crate) body: Mapping,
}

/// How a scene's sequence item begins.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Opener {
	/// `- ` prefix of a line whose remainder is the first mapping entry.
	Prefix(String),
	/// A line holding only the sequence indicator.
	Line(Line),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Mapping {
	/// Column of every key in the mapping.
	pub indent: usize,
	pub entries: Vec<Entry>,
	pub trailing: Vec<Line>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Entry {
	pub leading: Vec<Line>,
	pub head: Line,
	pub key: String,
	/// Byte length of the key as written in the head's content.
	pub key_len: usize,
	/// Value on the head line, comment removed.
	pub inline: Option<String>,
	pub body: Body,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Body {
	Lines(Vec<Line>),
	Mapping(Mapping),
}

impl Default for Body {
	fn default() -> Self {
		Body::Lines(Vec::new())
	}
}

impl SceneDocument {
	/// Parses scenes text.
	///
	/// Empty input, comment-only input and a bare `[]` are empty documents.
	pub fn parse(text: &str) -> Result<Self, ParseError> {
		let lines = Line::scan(text);
		let eol = if text.contains("\r\n") { "\r\n" } else { "\n" };

		let mut content = lines.iter().filter(|line| !line.is_trivia());
		let Some(first) = content.next() else {
			return Ok(Self::empty(lines, eol));
		};
		if content.next().is_none() && syntax::strip_comment(first.content()).trim() == "[]" {
			return Ok(Self::empty(lines, eol));
		}

		let column = first.indent;
		let mut scenes: Vec<SceneRecord> = Vec::new();
		let mut seen = HashSet::new();
		let mut leading = Vec::new();
		let mut i = 0;
		while i < lines.len() {
			let line = &lines[i];
			if line.is_trivia() {
				leading.push(line.clone());
				i += 1;
				continue;
			}
			if line.indent != column || syntax::sequence_entry(line.content()).is_none() {
				return Err(ParseError::at(line.number, ParseErrorKind::NotASequence));
			}
			let end = block_end(&lines, i + 1, column, false);
			let record = SceneRecord::parse(std::mem::take(&mut leading), line, &lines[i + 1..end])?;
			if !seen.insert(record.id.clone()) {
				return Err(ParseError::at(line.number, ParseErrorKind::DuplicateScene(record.id)));
			}
			scenes.push(record);
			i = end;
		}

		Ok(Self {
			scenes,
			trailer: leading,
			eol,
		})
	}

	fn empty(trailer: Vec<Line>, eol: &'static str) -> Self {
		Self {
			scenes: Vec::new(),
			trailer,
			eol,
		}
	}

	/// Renders the document back to text.
	pub fn serialize(&self) -> String {
		let mut out = String::new();
		for scene in &self.scenes {
			scene.write(&mut out);
		}
		write_lines(&mut out, &self.trailer);
		out
	}

	/// Scenes in document order.
	pub fn scenes(&self) -> &[SceneRecord] {
		&self.scenes
	}

	/// Looks up a scene by identifier.
	pub fn scene(&self, id: &str) -> Option<&SceneRecord> {
		self.scenes.iter().find(|scene| scene.id == id)
	}

	/// Number of scenes.
	pub fn len(&self) -> usize {
		self.scenes.len()
	}

	/// Returns true when the document declares no scenes.
	pub fn is_empty(&self) -> bool {
		self.scenes.is_empty()
	}
}

impl SceneRecord {
	fn parse(leading: Vec<Line>, dash: &Line, rest: &[Line]) -> Result<Self, ParseError> {
		let content = dash.content();
		let offset = syntax::sequence_entry(content).ok_or_else(|| ParseError::at(dash.number, ParseErrorKind::NotASequence))?;

		let (opener, lines) = if syntax::strip_comment(&content[offset..]).trim().is_empty() {
			(Opener::Line(dash.clone()), rest.to_vec())
		} else {
			let split = dash.indent + offset;
			let mut lines = Vec::with_capacity(rest.len() + 1);
			lines.push(dash.tail(split));
			lines.extend_from_slice(rest);
			(Opener::Prefix(dash.raw[..split].to_owned()), lines)
		};

		let first = lines
			.iter()
			.find(|line| !line.is_trivia())
			.ok_or_else(|| ParseError::at(dash.number, ParseErrorKind::SceneNotMapping))?;
		if syntax::split_key(first.content()).is_none() {
			return Err(ParseError::at(first.number, ParseErrorKind::SceneNotMapping));
		}

		let mut body = Mapping::parse(lines)?;
		let id = scene_id(&body, dash.number)?;
		let entity_ids = match body.entries.iter().position(|entry| entry.key == ENTITIES_KEY) {
			Some(index) => parse_entities(&mut body.entries[index], &id)?,
			None => Vec::new(),
		};

		Ok(Self {
			id,
			entity_ids,
			leading,
			opener,
			body,
		})
	}

	/// Scene identifier.
	pub fn id(&self) -> &str {
		&self.id
	}

	/// Display name, when the scene declares a single-line `name`.
	pub fn name(&self) -> Option<String> {
		let raw = self.body.find(NAME_KEY)?.inline.as_deref()?;
		match serde_yaml::from_str::<serde_yaml::Value>(raw).ok()? {
			serde_yaml::Value::String(name) => Some(name),
			serde_yaml::Value::Number(number) => Some(number.to_string()),
			_ => None,
		}
	}

	/// Entity identifiers in declaration order.
	pub fn entity_ids(&self) -> &[String] {
		&self.entity_ids
	}

	/// Decodes every declared entity's stored state, in declaration order.
	pub fn entities(&self) -> Result<Vec<(String, EntityState)>, ParseError> {
		let Some(entry) = self.body.find(ENTITIES_KEY) else {
			return Ok(Vec::new());
		};
		match &entry.body {
			Body::Mapping(entities) => entities
				.entries
				.iter()
				.map(|entity| Ok((entity.key.clone(), EntityState::from_value(entity.decode()?))))
				.collect(),
			Body::Lines(_) => match entry.decode()? {
				Value::Object(entities) => Ok(entities
					.into_iter()
					.map(|(id, value)| (id, EntityState::from_value(value)))
					.collect()),
				_ => Ok(Vec::new()),
			},
		}
	}

	fn write(&self, out: &mut String) {
		write_lines(out, &self.leading);
		match &self.opener {
			Opener::Prefix(prefix) => out.push_str(prefix),
			Opener::Line(line) => out.push_str(&line.raw),
		}
		self.body.write(out);
	}
}

impl Mapping {
	/// Parses a block mapping whose keys all share the column of its first content line.
	pub fn parse(lines: Vec<Line>) -> Result<Self, ParseError> {
		let indent = lines.iter().find(|line| !line.is_trivia()).map_or(0, |line| line.indent);
		let mut entries = Vec::new();
		let mut leading = Vec::new();
		let mut i = 0;
		while i < lines.len() {
			let line = &lines[i];
			if line.is_trivia() {
				leading.push(line.clone());
				i += 1;
				continue;
			}
			if line.indent != indent {
				return Err(ParseError::at(line.number, ParseErrorKind::Indentation));
			}
			let key = syntax::split_key(line.content()).ok_or_else(|| ParseError::at(line.number, ParseErrorKind::ExpectedKey))?;
			let end = block_end(&lines, i + 1, indent, key.value.is_none());
			entries.push(Entry {
				leading: std::mem::take(&mut leading),
				head: line.clone(),
				key: key.key,
				key_len: key.key_len,
				inline: key.value.map(str::to_owned),
				body: Body::Lines(lines[i + 1..end].to_vec()),
			});
			i = end;
		}

		Ok(Self {
			indent,
			entries,
			trailing: leading,
		})
	}

	pub fn find(&self, key: &str) -> Option<&Entry> {
		self.entries.iter().find(|entry| entry.key == key)
	}

	pub fn find_mut(&mut self, key: &str) -> Option<&mut Entry> {
		self.entries.iter_mut().find(|entry| entry.key == key)
	}

	pub fn write(&self, out: &mut String) {
		for entry in &self.entries {
			entry.write(out);
		}
		write_lines(out, &self.trailing);
	}

	pub fn into_lines(self) -> Vec<Line> {
		let mut lines = Vec::new();
		for entry in self.entries {
			lines.extend(entry.leading);
			lines.push(entry.head);
			lines.extend(entry.body.into_lines());
		}
		lines.extend(self.trailing);
		lines
	}

	/// Makes sure the final line is terminated before anything is appended after it.
	pub fn terminate(&mut self, eol: &str) {
		if let Some(line) = self.last_line_mut()
			&& line.eol().is_empty()
		{
			line.raw.push_str(eol);
		}
	}

	fn last_line_mut(&mut self) -> Option<&mut Line> {
		if !self.trailing.is_empty() {
			return self.trailing.last_mut();
		}
		self.entries.last_mut().map(Entry::last_line_mut)
	}
}

impl Entry {
	/// Builds an entry from freshly rendered text, parsing nested blocks where they form a mapping.
	pub fn rendered(leading: Vec<Line>, text: &str) -> Option<Self> {
		let mut lines: Vec<Line> = Line::scan(text)
			.into_iter()
			.map(|line| Line { number: 0, ..line })
			.collect();
		if lines.is_empty() {
			return None;
		}
		let head = lines.remove(0);
		let key = syntax::split_key(head.content())?;
		let body = if key.value.is_none() && !lines.is_empty() {
			Mapping::parse(lines.clone()).map_or(Body::Lines(lines), Body::Mapping)
		} else {
			Body::Lines(lines)
		};
		Some(Self {
			leading,
			key: key.key,
			key_len: key.key_len,
			inline: key.value.map(str::to_owned),
			head,
			body,
		})
	}

	/// Key exactly as written, quotes included.
	pub fn key_text(&self) -> &str {
		&self.head.content()[..self.key_len]
	}

	/// Head line and body, without leading trivia.
	pub fn source(&self) -> String {
		let mut out = self.head.raw.clone();
		self.body.write(&mut out);
		out
	}

	/// Decodes the entry's value.
	pub fn decode(&self) -> Result<Value, ParseError> {
		serde_json::to_value(self.decode_yaml()?).map_err(|err| self.yaml_error(&err))
	}

	/// Decodes the entry's value as YAML, keeping tags and non-string keys.
	pub fn decode_yaml(&self) -> Result<serde_yaml::Value, ParseError> {
		let document: serde_yaml::Value = serde_yaml::from_str(&self.source()).map_err(|err| self.yaml_error(&err))?;
		let value = match document {
			serde_yaml::Value::Mapping(mapping) => mapping.into_iter().next().map(|(_, value)| value),
			_ => None,
		};
		Ok(value.unwrap_or(serde_yaml::Value::Null))
	}

	fn yaml_error(&self, err: &dyn std::fmt::Display) -> ParseError {
		ParseError::at(self.head.number, ParseErrorKind::Yaml(err.to_string()))
	}

	fn write(&self, out: &mut String) {
		write_lines(out, &self.leading);
		out.push_str(&self.head.raw);
		self.body.write(out);
	}

	fn last_line_mut(&mut self) -> &mut Line {
		let tail = match &mut self.body {
			Body::Lines(lines) => lines.last_mut(),
			Body::Mapping(mapping) => mapping.last_line_mut(),
		};
		tail.unwrap_or(&mut self.head)
	}
}

impl Body {
	pub fn has_content(&self) -> bool {
		match self {
			Body::Lines(lines) => lines.iter().any(|line| !line.is_trivia()),
			Body::Mapping(mapping) => !mapping.entries.is_empty(),
		}
	}

	pub fn into_lines(self) -> Vec<Line> {
		match self {
			Body::Lines(lines) => lines,
			Body::Mapping(mapping) => mapping.into_lines(),
		}
	}

	fn write(&self, out: &mut String) {
		match self {
			Body::Lines(lines) => write_lines(out, lines),
			Body::Mapping(mapping) => mapping.write(out),
		}
	}
}

/// Parses the `entities` entry of scene `scene` into its structural form.
///
/// Returns the declared entity identifiers in order.
pub(crate) fn parse_entities(entry: &mut Entry, scene: &str) -> Result<Vec<String>, ParseError> {
	if entry.inline.is_some() {
		return match entry.decode()? {
			Value::Null => Ok(Vec::new()),
			Value::Object(entities) => {
				for (entity, value) in &entities {
					check_entity_value(value, scene, entity, entry.head.number)?;
				}
				Ok(entities.keys().cloned().collect())
			}
			_ => Err(ParseError::at(entry.head.number, ParseErrorKind::EntitiesNotMapping(scene.to_owned()))),
		};
	}

	let lines = std::mem::take(&mut entry.body).into_lines();
	let Some(first) = lines.iter().find(|line| !line.is_trivia()) else {
		entry.body = Body::Lines(lines);
		return Ok(Vec::new());
	};
	if syntax::split_key(first.content()).is_none() {
		return Err(ParseError::at(first.number, ParseErrorKind::EntitiesNotMapping(scene.to_owned())));
	}

	let mut entities = Mapping::parse(lines)?;
	let mut seen = HashSet::new();
	let mut ids = Vec::with_capacity(entities.entries.len());
	for entity in &mut entities.entries {
		if !seen.insert(entity.key.clone()) {
			return Err(ParseError::at(
				entity.head.number,
				ParseErrorKind::DuplicateEntity {
					scene: scene.to_owned(),
					entity: entity.key.clone(),
				},
			));
		}
		parse_entity(entity, scene)?;
		ids.push(entity.key.clone());
	}
	entry.body = Body::Mapping(entities);
	Ok(ids)
}

fn parse_entity(entity: &mut Entry, scene: &str) -> Result<(), ParseError> {
	let invalid = |line: usize| {
		ParseError::at(
			line,
			ParseErrorKind::InvalidEntity {
				scene: scene.to_owned(),
				entity: entity.key.clone(),
			},
		)
	};

	if entity.inline.is_none() && entity.body.has_content() {
		let lines = std::mem::take(&mut entity.body).into_lines();
		if let Some(line) = lines.iter().find(|line| !line.is_trivia())
			&& syntax::split_key(line.content()).is_none()
		{
			return Err(invalid(line.number));
		}
		entity.body = Body::Mapping(Mapping::parse(lines)?);
	}

	let value = entity.decode()?;
	check_entity_value(&value, scene, &entity.key, entity.head.number)
}

fn check_entity_value(value: &Value, scene: &str, entity: &str, line: usize) -> Result<(), ParseError> {
	if value.is_array() {
		return Err(ParseError::at(
			line,
			ParseErrorKind::InvalidEntity {
				scene: scene.to_owned(),
				entity: entity.to_owned(),
			},
		));
	}
	Ok(())
}

fn scene_id(body: &Mapping, line: usize) -> Result<String, ParseError> {
	let entry = body.find(ID_KEY).ok_or_else(|| ParseError::at(line, ParseErrorKind::MissingId))?;
	let raw = entry
		.inline
		.as_deref()
		.ok_or_else(|| ParseError::at(entry.head.number, ParseErrorKind::MissingId))?;
	// Numeric ids keep their written form so `1.50` stays distinct from `1.5`.
	match serde_yaml::from_str::<serde_yaml::Value>(raw) {
		Ok(serde_yaml::Value::String(id)) if !id.is_empty() => Ok(id),
		Ok(serde_yaml::Value::Number(_)) => Ok(raw.to_owned()),
		_ => Err(ParseError::at(entry.head.number, ParseErrorKind::InvalidId(raw.to_owned()))),
	}
}

/// Returns the end of the block nested under a line at column `indent`, starting at `from`.
///
/// Trailing trivia is excluded so it can lead the next sibling. Sequence items at the parent's own
/// column belong to the block when `indentless` is set (`key:` followed by `- item`).
fn block_end(lines: &[Line], from: usize, indent: usize, indentless: bool) -> usize {
	let mut end = from;
	for (offset, line) in lines[from..].iter().enumerate() {
		if line.is_trivia() {
			continue;
		}
		let nested = line.indent > indent || (indentless && line.indent == indent && syntax::sequence_entry(line.content()).is_some());
		if !nested {
			break;
		}
		end = from + offset + 1;
	}
	end
}

fn write_lines(out: &mut String, lines: &[Line]) {
	for line in lines {
		out.push_str(&line.raw);
	}
}
