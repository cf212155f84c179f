//! Block-style rendering for rewritten nodes.
//!
//! Output is deterministic for a given value and style, which is what makes a repeated merge of
//! identical states byte-stable.
//!
//! Captured values arrive as JSON. Values the merge carries over without refreshing them are
//! rendered from their YAML form instead, so tags and non-string keys survive.

use serde_json::Value;
use serde_yaml::Value as Yaml;

const RESERVED: &[&str] = &["null", "~", "true", "false", "yes", "no", "on", "off", "y", "n"];
const INDICATORS: &[char] = &['-', '?', ':', ',', '[', ']', '{', '}', '#', '&', '*', '!', '|', '>', '\'', '"', '%', '@', '`', '+', '.'];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Style {
	/// Columns added per nesting level.
	pub step: usize,
	pub eol: &'static str,
}

impl Style {
	/// Renders `key: value`. The head starts with `lead`; nested content sits at column `indent`.
	pub fn entry(&self, out: &mut String, lead: &str, key: &str, value: &Value, indent: usize) {
		out.push_str(lead);
		out.push_str(key);
		out.push(':');
		match value {
			Value::Object(fields) if !fields.is_empty() => {
				out.push_str(self.eol);
				let pad = " ".repeat(indent);
				for (key, value) in fields {
					self.entry(out, &pad, &string(key), value, indent + self.step);
				}
			}
			Value::Array(items) if !items.is_empty() => {
				out.push_str(self.eol);
				for item in items {
					self.item(out, indent, item);
				}
			}
			scalar => {
				out.push(' ');
				out.push_str(&self::scalar(scalar));
				out.push_str(self.eol);
			}
		}
	}

	fn item(&self, out: &mut String, indent: usize, value: &Value) {
		let pad = " ".repeat(indent);
		match value {
			Value::Object(fields) if !fields.is_empty() => {
				let mut lead = format!("{pad}- ");
				for (key, value) in fields {
					self.entry(out, &lead, &string(key), value, indent + 2 + self.step);
					lead = " ".repeat(indent + 2);
				}
			}
			Value::Array(items) if !items.is_empty() => {
				out.push_str(&pad);
				out.push('-');
				out.push_str(self.eol);
				for item in items {
					self.item(out, indent + 2, item);
				}
			}
			scalar => {
				out.push_str(&pad);
				out.push_str("- ");
				out.push_str(&self::scalar(scalar));
				out.push_str(self.eol);
			}
		}
	}

	/// Renders a carried-over `key: value`, like [`Style::entry`] for a YAML value.
	///
	/// Returns `None` for values with no block rendering, such as complex mapping keys. `out` is
	/// then left partially written and must be discarded.
	pub fn carried(&self, out: &mut String, lead: &str, key: &str, value: &Yaml, indent: usize) -> Option<()> {
		out.push_str(lead);
		out.push_str(key);
		out.push(':');
		let (tag, inner) = split_tag(value);
		match inner {
			Yaml::Mapping(fields) if !fields.is_empty() => {
				push_tag(out, tag);
				out.push_str(self.eol);
				let pad = " ".repeat(indent);
				for (key, value) in fields {
					self.carried(out, &pad, &yaml_key(key)?, value, indent + self.step)?;
				}
			}
			Yaml::Sequence(items) if !items.is_empty() => {
				push_tag(out, tag);
				out.push_str(self.eol);
				for item in items {
					self.carried_item(out, indent, item)?;
				}
			}
			_ => {
				out.push(' ');
				out.push_str(&yaml_scalar(value)?);
				out.push_str(self.eol);
			}
		}
		Some(())
	}

	fn carried_item(&self, out: &mut String, indent: usize, value: &Yaml) -> Option<()> {
		let pad = " ".repeat(indent);
		let (tag, inner) = split_tag(value);
		match inner {
			Yaml::Mapping(fields) if !fields.is_empty() => {
				let mut lead = format!("{pad}- ");
				if let Some(tag) = tag {
					out.push_str(&pad);
					out.push('-');
					push_tag(out, Some(tag));
					out.push_str(self.eol);
					lead = " ".repeat(indent + 2);
				}
				for (key, value) in fields {
					self.carried(out, &lead, &yaml_key(key)?, value, indent + 2 + self.step)?;
					lead = " ".repeat(indent + 2);
				}
			}
			Yaml::Sequence(items) if !items.is_empty() => {
				out.push_str(&pad);
				out.push('-');
				push_tag(out, tag);
				out.push_str(self.eol);
				for item in items {
					self.carried_item(out, indent + 2, item)?;
				}
			}
			_ => {
				out.push_str(&pad);
				out.push_str("- ");
				out.push_str(&yaml_scalar(value)?);
				out.push_str(self.eol);
			}
		}
		Some(())
	}
}

fn split_tag(value: &Yaml) -> (Option<String>, &Yaml) {
	match value {
		Yaml::Tagged(tagged) => (Some(tagged.tag.to_string()), &tagged.value),
		other => (None, other),
	}
}

fn push_tag(out: &mut String, tag: Option<String>) {
	if let Some(tag) = tag {
		out.push(' ');
		out.push_str(&tag);
	}
}

/// Renders a YAML mapping key. Only scalar keys have a one-line form.
pub(crate) fn yaml_key(key: &Yaml) -> Option<String> {
	match key {
		Yaml::Mapping(_) | Yaml::Sequence(_) | Yaml::Tagged(_) => None,
		scalar => yaml_scalar(scalar),
	}
}

fn yaml_scalar(value: &Yaml) -> Option<String> {
	Some(match value {
		Yaml::Null => "null".to_owned(),
		Yaml::Bool(flag) => flag.to_string(),
		Yaml::Number(number) => number.to_string(),
		Yaml::String(text) => string(text),
		Yaml::Sequence(items) if items.is_empty() => "[]".to_owned(),
		Yaml::Mapping(fields) if fields.is_empty() => "{}".to_owned(),
		Yaml::Tagged(tagged) => format!("{} {}", tagged.tag, yaml_scalar(&tagged.value)?),
		Yaml::Sequence(_) | Yaml::Mapping(_) => return None,
	})
}

/// Renders a value that fits on one line.
pub(crate) fn scalar(value: &Value) -> String {
	match value {
		Value::Null => "null".to_owned(),
		Value::Bool(flag) => flag.to_string(),
		Value::Number(number) => number.to_string(),
		Value::String(text) => string(text),
		Value::Array(_) => "[]".to_owned(),
		Value::Object(_) => "{}".to_owned(),
	}
}

/// Renders a string scalar, quoting only when a plain scalar would read back differently.
pub(crate) fn string(text: &str) -> String {
	if text.chars().any(needs_escape) {
		return double_quoted(text);
	}
	if is_plain(text) {
		text.to_owned()
	} else {
		format!("'{}'", text.replace('\'', "''"))
	}
}

/// Characters a YAML reader rejects or folds unless they are escaped in a double-quoted scalar.
///
/// Covers C0 and C1 controls (NEL included), DEL, the BOM, U+FFFE/U+FFFF and the Unicode line and
/// paragraph separators.
fn needs_escape(ch: char) -> bool {
	matches!(
		ch,
		'\u{0}'..='\u{1f}' | '\u{7f}'..='\u{9f}' | '\u{2028}' | '\u{2029}' | '\u{feff}' | '\u{fffe}' | '\u{ffff}'
	)
}

fn double_quoted(text: &str) -> String {
	let mut out = String::with_capacity(text.len() + 2);
	out.push('"');
	for ch in text.chars() {
		match ch {
			'"' => out.push_str("\\\""),
			'\\' => out.push_str("\\\\"),
			'\n' => out.push_str("\\n"),
			'\t' => out.push_str("\\t"),
			'\r' => out.push_str("\\r"),
			'\0' => out.push_str("\\0"),
			ch if needs_escape(ch) => {
				let code = u32::from(ch);
				if code <= 0xff {
					out.push_str(&format!("\\x{code:02X}"));
				} else {
					out.push_str(&format!("\\u{code:04X}"));
				}
			}
			ch => out.push(ch),
		}
	}
	out.push('"');
	out
}

fn is_plain(text: &str) -> bool {
	let Some(first) = text.chars().next() else {
		return false;
	};
	!(first.is_ascii_digit()
		|| INDICATORS.contains(&first)
		|| text != text.trim()
		|| text.contains(':')
		|| text.contains(" #")
		|| RESERVED.iter().any(|word| word.eq_ignore_ascii_case(text))
		|| text.parse::<f64>().is_ok())
}
