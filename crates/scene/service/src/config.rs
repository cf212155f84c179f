//! Service configuration loaded from `sceneplus.toml`.

use std::io;
use std::path::{Path, PathBuf};

use sceneplus_registry::CapturePolicy;
use serde::{Deserialize, Serialize};

/// Configuration file looked up in the config directory.
pub const CONFIG_FILE: &str = "sceneplus.toml";

/// Errors reading or parsing [`CONFIG_FILE`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	#[error("failed to read {}: {source}", path.display())]
	Read {
		path: PathBuf,
		#[source]
		source: io::Error,
	},
	#[error("failed to parse {}: {source}", path.display())]
	Parse {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},
}

/// Where the scenes file lives and how it is written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SceneplusConfig {
	/// Directory holding the scenes file. Relative paths resolve against the directory the
	/// configuration was loaded from.
	pub config_dir: PathBuf,
	/// Scenes file name within `config_dir`.
	pub scenes_file: String,
	/// Suffix appended to the scenes file name to form the cross-process lock file.
	pub lock_suffix: String,
	/// Whether writers also take an advisory lock on the lock file.
	pub cross_process_lock: bool,
	/// Attributes never captured into the scenes file.
	pub excluded_attributes: Vec<String>,
}

impl Default for SceneplusConfig {
	fn default() -> Self {
		Self {
			config_dir: PathBuf::from("."),
			scenes_file: "scenes.yaml".to_owned(),
			lock_suffix: ".lock".to_owned(),
			cross_process_lock: true,
			excluded_attributes: CapturePolicy::DEFAULT_EXCLUDED.map(str::to_owned).to_vec(),
		}
	}
}

impl SceneplusConfig {
	/// Loads [`CONFIG_FILE`] from `dir`, falling back to defaults when it does not exist.
	///
	/// The returned `config_dir` is resolved against `dir`.
	pub fn load(dir: &Path) -> Result<Self, ConfigError> {
		let path = dir.join(CONFIG_FILE);
		let mut config = match std::fs::read_to_string(&path) {
			Ok(content) => toml::from_str::<Self>(&content).map_err(|source| ConfigError::Parse { path: path.clone(), source })?,
			Err(error) if error.kind() == io::ErrorKind::NotFound => Self::default(),
			Err(source) => return Err(ConfigError::Read { path, source }),
		};
		config.config_dir = resolve(dir, &config.config_dir);
		tracing::debug!(path = %path.display(), scenes = %config.scenes_path().display(), "config.loaded");
		Ok(config)
	}

	/// Defaults rooted at `dir`.
	pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
		Self {
			config_dir: dir.into(),
			..Self::default()
		}
	}

	pub fn scenes_path(&self) -> PathBuf {
		self.config_dir.join(&self.scenes_file)
	}

	/// Lock file path, or `None` when cross-process locking is disabled.
	pub fn lock_path(&self) -> Option<PathBuf> {
		self.cross_process_lock
			.then(|| self.config_dir.join(format!("{}{}", self.scenes_file, self.lock_suffix)))
	}

	pub fn capture_policy(&self) -> CapturePolicy {
		CapturePolicy::new(self.excluded_attributes.iter().cloned())
	}
}

fn resolve(base: &Path, dir: &Path) -> PathBuf {
	if dir == Path::new(".") {
		base.to_path_buf()
	} else {
		base.join(dir)
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	fn write(dir: &Path, content: &str) {
		std::fs::write(dir.join(CONFIG_FILE), content).expect("config should be writable");
	}

	#[test]
	fn missing_file_means_defaults() {
		let dir = tempfile::tempdir().unwrap();
		let config = SceneplusConfig::load(dir.path()).unwrap();
		assert_eq!(config, SceneplusConfig::in_dir(dir.path()));
		assert_eq!(config.scenes_path(), dir.path().join("scenes.yaml"));
		assert_eq!(config.lock_path(), Some(dir.path().join("scenes.yaml.lock")));
		assert!(config.capture_policy().excludes("area_id"));
	}

	#[test]
	fn fields_override_defaults() {
		let dir = tempfile::tempdir().unwrap();
		write(
			dir.path(),
			"config_dir = \"ha\"\nscenes_file = \"presets.yaml\"\ncross_process_lock = false\nexcluded_attributes = [\"friendly_name\"]\n",
		);
		let config = SceneplusConfig::load(dir.path()).unwrap();
		assert_eq!(config.scenes_path(), dir.path().join("ha").join("presets.yaml"));
		assert_eq!(config.lock_path(), None);
		let policy = config.capture_policy();
		assert!(policy.excludes("friendly_name"));
		assert!(!policy.excludes("device_id"));
	}

	#[test]
	fn malformed_files_are_errors() {
		let dir = tempfile::tempdir().unwrap();
		write(dir.path(), "scenes_file = [\n");
		assert!(matches!(SceneplusConfig::load(dir.path()), Err(ConfigError::Parse { .. })));

		write(dir.path(), "scene_file = \"typo.yaml\"\n");
		assert!(matches!(SceneplusConfig::load(dir.path()), Err(ConfigError::Parse { .. })));
	}
}
