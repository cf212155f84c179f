//! Single-line YAML lexing: sequence indicators, mapping keys and trailing comments.

/// A `key: value` line split at its mapping indicator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct KeyLine<'a> {
	/// Decoded key.
	pub key: String,
	/// Byte length of the key as written, quotes included.
	pub key_len: usize,
	/// Inline value with any trailing comment removed.
	pub value: Option<&'a str>,
}

/// Returns the offset of the item content when `content` opens a block sequence item.
pub(crate) fn sequence_entry(content: &str) -> Option<usize> {
	let rest = content.strip_prefix('-')?;
	if rest.is_empty() {
		return Some(1);
	}
	if !rest.starts_with(' ') {
		return None;
	}
	Some(1 + rest.len() - rest.trim_start_matches(' ').len())
}

/// Splits a block mapping line into key and inline value.
pub(crate) fn split_key(content: &str) -> Option<KeyLine<'_>> {
	if sequence_entry(content).is_some() {
		return None;
	}

	let (key, written) = match content.as_bytes().first()? {
		b'\'' => {
			let end = single_quoted_end(content)?;
			(content[1..end].replace("''", "'"), end + 1)
		}
		b'"' => {
			let end = double_quoted_end(content)?;
			(serde_yaml::from_str::<String>(&content[..=end]).ok()?, end + 1)
		}
		b'[' | b'{' | b'?' | b'#' | b'&' | b'*' | b'!' | b'|' | b'>' | b'%' | b'@' | b'`' => return None,
		_ => {
			let colon = plain_key_end(content)?;
			let key = content[..colon].trim_end();
			if key.is_empty() {
				return None;
			}
			(key.to_owned(), key.len())
		}
	};

	let rest = content[written..].trim_start_matches(' ').strip_prefix(':')?;
	if !(rest.is_empty() || rest.starts_with(' ') || rest.starts_with('\t')) {
		return None;
	}
	let value = strip_comment(rest).trim();
	Some(KeyLine {
		key,
		key_len: written,
		value: (!value.is_empty()).then_some(value),
	})
}

/// Removes a trailing `# comment`, honouring quoted regions.
pub(crate) fn strip_comment(text: &str) -> &str {
	let bytes = text.as_bytes();
	let mut quote: Option<u8> = None;
	let mut i = 0;
	while i < bytes.len() {
		let b = bytes[i];
		let after_gap = i == 0 || matches!(bytes[i - 1], b' ' | b'\t');
		match quote {
			Some(b'\'') if b == b'\'' => {
				if bytes.get(i + 1) == Some(&b'\'') {
					i += 1;
				} else {
					quote = None;
				}
			}
			Some(b'"') if b == b'\\' => i += 1,
			Some(b'"') if b == b'"' => quote = None,
			Some(_) => {}
			None if b == b'#' && after_gap => return &text[..i],
			None if (b == b'\'' || b == b'"') && (after_gap || matches!(bytes[i - 1], b'[' | b'{' | b',' | b':')) => {
				quote = Some(b);
			}
			None => {}
		}
		i += 1;
	}
	text
}

fn plain_key_end(content: &str) -> Option<usize> {
	let bytes = content.as_bytes();
	for (i, &b) in bytes.iter().enumerate() {
		match b {
			b'#' if i > 0 && matches!(bytes[i - 1], b' ' | b'\t') => return None,
			b':' if matches!(bytes.get(i + 1), None | Some(b' ' | b'\t')) => return Some(i),
			_ => {}
		}
	}
	None
}

fn single_quoted_end(text: &str) -> Option<usize> {
	let bytes = text.as_bytes();
	let mut i = 1;
	while i < bytes.len() {
		if bytes[i] == b'\'' {
			if bytes.get(i + 1) == Some(&b'\'') {
				i += 2;
				continue;
			}
			return Some(i);
		}
		i += 1;
	}
	None
}

fn double_quoted_end(text: &str) -> Option<usize> {
	let bytes = text.as_bytes();
	let mut i = 1;
	while i < bytes.len() {
		match bytes[i] {
			b'\\' => i += 2,
			b'"' => return Some(i),
			_ => i += 1,
		}
	}
	None
}
