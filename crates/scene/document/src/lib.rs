//! Format-preserving scene documents.
//!
//! A scenes file is a top-level YAML sequence of scene mappings, each carrying an `id` and an
//! `entities` mapping from entity identifier to a captured `state` plus `attributes`. This crate
//! parses that shape into a tree whose nodes keep their source lines, so that:
//!
//! * an unmodified [`SceneDocument`] serializes back to its input byte-for-byte,
//! * [`SceneDocument::apply_update`] rewrites only the entity entries it refreshes,
//! * rewritten nodes are rendered deterministically, making repeated merges idempotent.
//!
//! The crate does no I/O. Reading, locking and persisting the file belong to the caller.

mod error;
mod line;
mod merge;
mod model;
mod render;
mod syntax;
mod tree;

pub use error::{MergeError, ParseError, ParseErrorKind};
pub use model::EntityState;
pub use tree::{SceneDocument, SceneRecord};

/// Key holding a scene's identifier.
pub const ID_KEY: &str = "id";
/// Key holding a scene's display name.
pub const NAME_KEY: &str = "name";
/// Key holding a scene's entity mapping.
pub const ENTITIES_KEY: &str = "entities";
/// Key holding an entity's primary value.
pub const STATE_KEY: &str = "state";
/// Key holding an entity's attribute mapping.
pub const ATTRIBUTES_KEY: &str = "attributes";
