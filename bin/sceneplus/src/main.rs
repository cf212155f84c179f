//! sceneplus binary.
//!
//! Runs one scene service call against a scenes file, with live entity states supplied as a JSON
//! table, and prints the JSON response on stdout.

mod cli;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use cli::{Cli, Command};
use sceneplus_registry::MemoryHost;
use sceneplus_service::{SceneService, SceneplusConfig, ServiceCall, ServiceResponse};
use serde::Serialize;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<ExitCode> {
	let cli = Cli::parse();
	setup_tracing(cli.verbose);

	let config = SceneplusConfig::load(&cli.config_dir)?;
	tracing::debug!(scenes = %config.scenes_path().display(), command = ?cli.command, "sceneplus.start");
	let host = Arc::new(MemoryHost::from_snapshots(cli::load_states(cli.states.as_deref())?));
	let service = SceneService::new(&config, host.clone(), host);

	// Scene entities and bare ids resolve against the index a reload publishes.
	let reload = service.reload().await;
	match cli.command {
		Command::Reload => print(&reload),
		Command::GetEntities { target } => print(&service.get_entities(&ServiceCall::new(target)).await),
		Command::Update { target } => print(&service.update(&ServiceCall::new(target)).await),
	}
}

fn print<T: Serialize>(response: &ServiceResponse<T>) -> anyhow::Result<ExitCode> {
	let json = serde_json::to_string_pretty(response).context("failed to serialize response")?;
	println!("{json}");
	Ok(if response.success { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

fn setup_tracing(verbose: bool) {
	use tracing_subscriber::EnvFilter;

	let filter = EnvFilter::try_from_env("SCENEPLUS_LOG")
		.or_else(|_| EnvFilter::try_from_default_env())
		.unwrap_or_else(|_| {
			if verbose {
				EnvFilter::new("sceneplus=debug,sceneplus_service=debug,sceneplus_registry=debug,info")
			} else {
				EnvFilter::new("warn")
			}
		});

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_target(verbose)
		.init();
}
