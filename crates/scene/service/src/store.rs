//! Scenes file access under the service's reader/writer discipline.
//!
//! # Mental model
//!
//! * One [`SceneStore`] guards one scenes file.
//! * Readers take a [`ReadSession`] (shared); writers take a [`WriteSession`] (exclusive).
//! * A write session spans the whole read-modify-write sequence, so two writers can never
//!   interleave their reads and writes.
//!
//! # Invariants
//!
//! * Sessions release their locks on drop, on every exit path.
//! * A write replaces the file atomically: temp file in the same directory, fsync, rename.
//! * A missing scenes file reads as empty text.
//! * Blocking file work runs on the blocking pool and is never retried.

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::config::SceneplusConfig;
use crate::error::ServiceError;

/// Serialized access to one scenes file.
#[derive(Debug)]
pub struct SceneStore {
	path: PathBuf,
	lock_path: Option<PathBuf>,
	gate: RwLock<()>,
}

impl SceneStore {
	/// Creates a store for `path`, optionally guarding writers across processes with `lock_path`.
	pub fn new(path: impl Into<PathBuf>, lock_path: Option<PathBuf>) -> Self {
		Self {
			path: path.into(),
			lock_path,
			gate: RwLock::new(()),
		}
	}

	pub fn from_config(config: &SceneplusConfig) -> Self {
		Self::new(config.scenes_path(), config.lock_path())
	}

	/// Waits for shared access.
	pub async fn read(&self) -> ReadSession<'_> {
		let gate = self.gate.read().await;
		tracing::debug!(path = %self.path.display(), "store.read.acquired");
		ReadSession { _gate: gate, store: self }
	}

	/// Waits for exclusive access, including the cross-process lock when configured.
	pub async fn write(&self) -> Result<WriteSession<'_>, ServiceError> {
		let gate = self.gate.write().await;
		let file_lock = match &self.lock_path {
			Some(lock_path) => {
				let target = lock_path.clone();
				Some(blocking(lock_path, move || FileLock::acquire(&target)).await?)
			}
			None => None,
		};
		tracing::debug!(path = %self.path.display(), cross_process = file_lock.is_some(), "store.write.acquired");
		Ok(WriteSession {
			_gate: gate,
			_file_lock: file_lock,
			store: self,
		})
	}

	async fn load(&self) -> Result<String, ServiceError> {
		let path = self.path.clone();
		let text = blocking(&self.path, move || read_or_empty(&path)).await?;
		tracing::debug!(path = %self.path.display(), bytes = text.len(), "store.loaded");
		Ok(text)
	}
}

/// Shared access to the scenes file.
#[derive(Debug)]
pub struct ReadSession<'a> {
	_gate: RwLockReadGuard<'a, ()>,
	store: &'a SceneStore,
}

impl ReadSession<'_> {
	/// Reads the current file contents.
	pub async fn load(&self) -> Result<String, ServiceError> {
		self.store.load().await
	}
}

/// Exclusive access to the scenes file.
#[derive(Debug)]
pub struct WriteSession<'a> {
	_gate: RwLockWriteGuard<'a, ()>,
	_file_lock: Option<FileLock>,
	store: &'a SceneStore,
}

impl WriteSession<'_> {
	/// Reads the current file contents.
	pub async fn load(&self) -> Result<String, ServiceError> {
		self.store.load().await
	}

	/// Atomically replaces the file with `text`.
	pub async fn persist(&self, text: String) -> Result<(), ServiceError> {
		let path = self.store.path.clone();
		let bytes = text.len();
		blocking(&self.store.path, move || write_atomic(&path, text.as_bytes())).await?;
		tracing::debug!(path = %self.store.path.display(), bytes, "store.persisted");
		Ok(())
	}
}

/// Advisory exclusive lock on a lock file, released on drop.
#[derive(Debug)]
struct FileLock {
	file: File,
}

impl FileLock {
	fn acquire(path: &Path) -> io::Result<Self> {
		let file = File::options().create(true).truncate(false).write(true).open(path)?;
		file.lock()?;
		Ok(Self { file })
	}
}

impl Drop for FileLock {
	fn drop(&mut self) {
		if let Err(error) = self.file.unlock() {
			tracing::warn!(%error, "store.unlock.failed");
		}
	}
}

async fn blocking<T, F>(path: &Path, work: F) -> Result<T, ServiceError>
where
	T: Send + 'static,
	F: FnOnce() -> io::Result<T> + Send + 'static,
{
	match tokio::task::spawn_blocking(work).await {
		Ok(result) => result.map_err(|error| ServiceError::io(path, error)),
		Err(join) => Err(ServiceError::io(path, io::Error::other(join))),
	}
}

fn read_or_empty(path: &Path) -> io::Result<String> {
	match std::fs::read_to_string(path) {
		Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(String::new()),
		other => other,
	}
}

fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
	let dir = path.parent().filter(|dir| !dir.as_os_str().is_empty()).unwrap_or(Path::new("."));
	let mut file = tempfile::NamedTempFile::new_in(dir)?;
	file.write_all(contents)?;
	file.as_file().sync_all()?;
	file.persist(path).map_err(|error| error.error)?;
	Ok(())
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	#[test]
	fn atomic_writes_replace_contents() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("scenes.yaml");
		write_atomic(&path, b"- id: a\n").unwrap();
		write_atomic(&path, b"- id: b\n").unwrap();
		assert_eq!(std::fs::read_to_string(&path).unwrap(), "- id: b\n");

		let leftovers: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
		assert_eq!(leftovers.len(), 1);
	}

	#[test]
	fn missing_files_read_empty() {
		let dir = tempfile::tempdir().unwrap();
		assert_eq!(read_or_empty(&dir.path().join("scenes.yaml")).unwrap(), "");
	}

	#[tokio::test]
	async fn write_sessions_take_the_lock_file() {
		let dir = tempfile::tempdir().unwrap();
		let lock = dir.path().join("scenes.yaml.lock");
		let store = SceneStore::new(dir.path().join("scenes.yaml"), Some(lock.clone()));
		{
			let session = store.write().await.unwrap();
			session.persist("[]\n".to_owned()).await.unwrap();
			assert_eq!(session.load().await.unwrap(), "[]\n");
		}
		assert!(lock.exists());

		let second = store.write().await.unwrap();
		assert_eq!(second.load().await.unwrap(), "[]\n");
	}

	#[tokio::test]
	async fn readers_share_the_gate() {
		let dir = tempfile::tempdir().unwrap();
		let store = SceneStore::new(dir.path().join("scenes.yaml"), None);
		let first = store.read().await;
		let second = store.read().await;
		assert_eq!(first.load().await.unwrap(), "");
		assert_eq!(second.load().await.unwrap(), "");
	}

	#[tokio::test]
	async fn unwritable_targets_surface_io_failures() {
		let dir = tempfile::tempdir().unwrap();
		let store = SceneStore::new(dir.path().join("missing").join("scenes.yaml"), None);
		let session = store.write().await.unwrap();
		let error = session.persist("[]\n".to_owned()).await.unwrap_err();
		assert!(matches!(error, ServiceError::Io { .. }));
	}
}
