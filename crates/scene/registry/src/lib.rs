//! Host collaborators of the scene service.
//!
//! The service never owns entity state. It reads live states through [`LiveRegistry`] and
//! publishes the scene view of the last successful reload through [`SceneIndexSink`]. Both are
//! injected, so a real host and the bundled [`MemoryHost`] are interchangeable.

mod host;
mod index;
mod live;

pub use host::{MemoryHost, SCENE_DOMAIN};
pub use index::{IndexedScene, SceneIndex, SceneIndexCell, SceneIndexSink};
pub use live::{CapturePolicy, LiveEntitySnapshot, LiveRegistry, SCENE_ID_ATTRIBUTE};
