/// Structural failure while parsing a scenes document.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}{kind}", .line.map(|line| format!("line {line}: ")).unwrap_or_default())]
pub struct ParseError {
	/// 1-based source line the failure was detected on, when one applies.
	pub line: Option<usize>,
	/// What went wrong.
	pub kind: ParseErrorKind,
}

impl ParseError {
	pub(crate) fn at(line: usize, kind: ParseErrorKind) -> Self {
		Self {
			line: (line > 0).then_some(line),
			kind,
		}
	}
}

/// Classification of [`ParseError`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseErrorKind {
	/// Top-level content is not a block sequence of scenes.
	#[error("expected a sequence of scenes")]
	NotASequence,
	/// A sequence item is not a mapping.
	#[error("scene entry is not a mapping")]
	SceneNotMapping,
	/// A scene has no `id` key or an empty one.
	#[error("scene has no `id`")]
	MissingId,
	/// A scene `id` is not a string or number.
	#[error("invalid scene id `{0}`")]
	InvalidId(String),
	/// Two scenes share one identifier.
	#[error("duplicate scene id `{0}`")]
	DuplicateScene(String),
	/// A scene's `entities` value is neither a mapping nor empty.
	#[error("`entities` of scene `{0}` is not a mapping")]
	EntitiesNotMapping(String),
	/// An entity identifier repeats within one scene.
	#[error("duplicate entity `{entity}` in scene `{scene}`")]
	DuplicateEntity {
		/// Scene identifier.
		scene: String,
		/// Repeated entity identifier.
		entity: String,
	},
	/// An entity value is a sequence or otherwise unusable.
	#[error("entity `{entity}` in scene `{scene}` is neither a mapping nor a scalar")]
	InvalidEntity {
		/// Scene identifier.
		scene: String,
		/// Offending entity identifier.
		entity: String,
	},
	/// A line is indented inconsistently with its siblings.
	#[error("unexpected indentation")]
	Indentation,
	/// A line inside a mapping is not a `key: value` pair.
	#[error("expected `key: value`")]
	ExpectedKey,
	/// A value fragment failed to decode as YAML.
	#[error("invalid YAML: {0}")]
	Yaml(String),
}

/// Failure applying captured states to a document.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MergeError {
	/// The document holds no scene with the requested identifier.
	#[error("scene `{0}` not found in document")]
	SceneNotFound(String),
}
