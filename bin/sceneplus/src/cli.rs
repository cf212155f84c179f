use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use sceneplus_registry::LiveEntitySnapshot;

/// Scene service command line arguments.
#[derive(Parser, Debug)]
#[command(name = "sceneplus")]
#[command(about = "List, capture and reload scenes stored in scenes.yaml")]
pub struct Cli {
	/// Directory holding sceneplus.toml and the scenes file
	#[arg(long, value_name = "DIR", default_value = ".")]
	pub config_dir: PathBuf,

	/// JSON array of live entity states (`[{"entity_id", "state", "attributes"}]`)
	#[arg(long, value_name = "FILE")]
	pub states: Option<PathBuf>,

	/// Verbose logging
	#[arg(short, long)]
	pub verbose: bool,

	#[command(subcommand)]
	pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
	/// List the entities a scene declares
	GetEntities {
		/// Scene entity (`scene.relax`) or bare scene id
		target: String,
	},
	/// Capture live entity states into a scene
	Update {
		/// Scene entity (`scene.relax`) or bare scene id
		target: String,
	},
	/// Re-read the scenes file
	Reload,
}

/// Reads the live entity table given with `--states`.
pub fn load_states(path: Option<&Path>) -> anyhow::Result<Vec<LiveEntitySnapshot>> {
	let Some(path) = path else {
		return Ok(Vec::new());
	};
	let content = std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
	serde_json::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
}
