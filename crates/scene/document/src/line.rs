//! Physical line scanning.

/// Classification of a physical line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LineKind {
	Blank,
	Comment,
	/// `---` or `...` document markers.
	Marker,
	Content,
}

/// One physical source line, terminator included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Line {
	pub raw: String,
	/// 1-based source line, 0 for rendered lines.
	pub number: usize,
	/// Logical column of the first character.
	pub indent: usize,
	pub kind: LineKind,
}

impl Line {
	pub fn scan(text: &str) -> Vec<Line> {
		text.split_inclusive('\n')
			.enumerate()
			.map(|(idx, raw)| Line::new(raw.to_owned(), idx + 1))
			.collect()
	}

	pub fn new(raw: String, number: usize) -> Self {
		let indent = raw.len() - raw.trim_start_matches(' ').len();
		let text = trim_eol(&raw).trim_start();
		let kind = if text.is_empty() {
			LineKind::Blank
		} else if text.starts_with('#') {
			LineKind::Comment
		} else if indent == 0 && is_marker(text) {
			LineKind::Marker
		} else {
			LineKind::Content
		};
		Self { raw, number, indent, kind }
	}

	/// Splits off the part of a sequence item line that follows its `- ` indicator.
	///
	/// The returned line keeps the logical column it had in the source.
	pub fn tail(&self, split: usize) -> Line {
		Line {
			raw: self.raw[split..].to_owned(),
			number: self.number,
			indent: split,
			kind: LineKind::Content,
		}
	}

	pub fn is_trivia(&self) -> bool {
		self.kind != LineKind::Content
	}

	/// Literal leading spaces.
	pub fn lead(&self) -> &str {
		&self.raw[..self.raw.len() - self.raw.trim_start_matches(' ').len()]
	}

	/// Text after the leading spaces, without the terminator.
	pub fn content(&self) -> &str {
		trim_eol(&self.raw).trim_start_matches(' ')
	}

	pub fn eol(&self) -> &str {
		if self.raw.ends_with("\r\n") {
			"\r\n"
		} else if self.raw.ends_with('\n') {
			"\n"
		} else {
			""
		}
	}
}

fn trim_eol(raw: &str) -> &str {
	raw.strip_suffix('\n').map(|s| s.strip_suffix('\r').unwrap_or(s)).unwrap_or(raw)
}

fn is_marker(text: &str) -> bool {
	["---", "..."].iter().any(|marker| {
		text.strip_prefix(marker)
			.is_some_and(|rest| rest.is_empty() || rest.trim_start().starts_with('#'))
	})
}
