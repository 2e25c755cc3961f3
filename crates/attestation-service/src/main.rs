//! Command-line entry point of the attestation client.
//!
//! `attest prove` runs a full attestation of one transaction and prints the
//! verified response; `attest round` and `attest kind` inspect the round
//! schedule and the request routing without touching the network.

use attestation_config::Config;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

mod commands;

/// Command-line arguments for the attestation client.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, default_value = "config.toml", env = "ATTEST_CONFIG")]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error); overrides the config file
	#[arg(short, long)]
	log_level: Option<String>,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Attest a transaction and print the verified response
	Prove {
		/// Source chain (e.g. testETH, sepolia, testXRP)
		#[arg(long)]
		chain: String,
		/// Transaction hash or id, 0x-prefixed
		#[arg(long)]
		tx: String,
		/// Confirmations the verifier requires on the source chain
		#[arg(long, default_value_t = 1)]
		confirmations: u16,
		/// Abandon the attestation after this many seconds
		#[arg(long)]
		deadline_secs: Option<u64>,
	},
	/// Print the voting round containing a timestamp (default: now)
	Round {
		#[arg(long)]
		timestamp: Option<u64>,
	},
	/// Print the attestation kind and verifier route selected for a chain
	Kind {
		#[arg(long)]
		chain: String,
	},
}

/// Installs the tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured level. Disabled logging
/// installs an `off` filter.
fn init_tracing(level: &str, enabled: bool) {
	use tracing_subscriber::{fmt, EnvFilter};

	let env_filter = if enabled {
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
	} else {
		EnvFilter::new("off")
	};

	fmt()
		.with_env_filter(env_filter)
		.with_thread_ids(true)
		.with_target(true)
		.init();
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
	let args = Args::parse();

	if let Command::Kind { chain } = &args.command {
		init_tracing(args.log_level.as_deref().unwrap_or("info"), true);
		commands::kind(chain)?;
		return Ok(ExitCode::SUCCESS);
	}

	let config = Config::from_file(&args.config).await?;
	let level = args
		.log_level
		.clone()
		.unwrap_or_else(|| config.logging.level.clone());
	init_tracing(&level, config.logging.enabled);
	tracing::info!(config = %args.config.display(), "Loaded configuration");

	match args.command {
		Command::Prove {
			chain,
			tx,
			confirmations,
			deadline_secs,
		} => commands::prove(&config, &chain, &tx, confirmations, deadline_secs).await,
		Command::Round { timestamp } => {
			commands::round(&config, timestamp)?;
			Ok(ExitCode::SUCCESS)
		},
		Command::Kind { .. } => Ok(ExitCode::SUCCESS),
	}
}
