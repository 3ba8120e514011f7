//! Command-line driver for the checkout wizard.
//!
//! Loads a wizard configuration, starts a session and replays a scripted list
//! of user actions through it, printing a JSON report per action. Without a
//! script the first step's view is printed.

use checkout_config::Config;
use checkout_core::WizardSession;
use clap::Parser;
use std::path::PathBuf;

mod script;

use script::Script;

/// Command-line arguments for the checkout driver.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, default_value = "config/checkout.toml")]
	config: PathBuf,

	/// Path to a TOML script of session actions
	#[arg(short, long)]
	script: Option<PathBuf>,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	use tracing_subscriber::{fmt, EnvFilter};

	// Reports go to stdout, logs to stderr
	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
	fmt()
		.with_env_filter(env_filter)
		.with_target(true)
		.with_writer(std::io::stderr)
		.init();

	let config_path = args
		.config
		.to_str()
		.ok_or_else(|| format!("Invalid config path: {}", args.config.display()))?;
	let config = Config::from_file(config_path).await?;
	tracing::info!(
		items = config.catalog.items.len(),
		navigation = ?config.wizard.navigation,
		"Loaded configuration"
	);

	let mut session = WizardSession::new(&config);

	let Some(script_path) = args.script else {
		println!("{}", serde_json::to_string_pretty(&session.view())?);
		return Ok(());
	};

	let script = Script::from_file(&script_path).await?;
	tracing::info!(actions = script.actions.len(), script = %script_path.display(), "Replaying script");

	for report in script::replay(&mut session, &script) {
		println!("{}", serde_json::to_string_pretty(&report)?);
	}

	match session.summary() {
		Some(summary) => tracing::info!(order_id = %summary.order_id, total = %summary.total, "Session completed"),
		None => tracing::info!(position = session.current_position(), "Session ended without an order"),
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;
	use tempfile::NamedTempFile;

	#[test]
	fn test_args_defaults() {
		let args = Args::parse_from(["checkout"]);
		assert_eq!(args.config, PathBuf::from("config/checkout.toml"));
		assert!(args.script.is_none());
		assert_eq!(args.log_level, "info");
	}

	#[test]
	fn test_args_overrides() {
		let args = Args::parse_from([
			"checkout",
			"--config",
			"wizard.toml",
			"-s",
			"run.toml",
			"--log-level",
			"debug",
		]);
		assert_eq!(args.config, PathBuf::from("wizard.toml"));
		assert_eq!(args.script, Some(PathBuf::from("run.toml")));
		assert_eq!(args.log_level, "debug");
	}

	#[tokio::test]
	async fn test_script_from_file() {
		let mut file = NamedTempFile::new().unwrap();
		writeln!(file, "[[actions]]\naction = \"advance\"\n\n[[actions]]\naction = \"reset\"").unwrap();

		let script = Script::from_file(file.path()).await.unwrap();
		assert_eq!(
			script.actions,
			vec![script::Action::Advance, script::Action::Reset]
		);
	}

	#[tokio::test]
	async fn test_sample_scenario_places_order() {
		let config = Config::from_file(concat!(
			env!("CARGO_MANIFEST_DIR"),
			"/../../config/checkout.toml"
		))
		.await
		.unwrap();
		let script = Script::from_file(std::path::Path::new(concat!(
			env!("CARGO_MANIFEST_DIR"),
			"/../../config/scenario.toml"
		)))
		.await
		.unwrap();

		let mut session = WizardSession::new(&config);
		let reports = script::replay(&mut session, &script);

		let last = reports.last().unwrap();
		let script::Outcome::Placed { summary } = &last.outcome else {
			panic!("expected the order to be placed, got {:?}", last.outcome);
		};
		assert_eq!(summary.total.to_string(), "175.16");
		assert_eq!(session.summary(), Some(summary));
	}

	#[tokio::test]
	async fn test_missing_script_is_io_error() {
		let result = Script::from_file(std::path::Path::new("/nonexistent/script.toml")).await;
		assert!(matches!(result, Err(script::ScriptError::Io(_))));
	}
}
