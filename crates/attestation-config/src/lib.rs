//! Configuration module for the attestation client.
//!
//! This module loads the client's configuration from TOML files and validates
//! it before anything touches the network. Every endpoint, contract address,
//! epoch constant, fee and credential the client consumes is declared here
//! and passed explicitly at construction; nothing is read from process-global
//! state afterwards.
//!
//! ## Modular Configuration Support
//!
//! Configurations can be split into multiple files:
//! - Use `include = ["file1.toml", "file2.toml"]` to include other config files
//! - Included files may include further files, relative to their own directory
//! - Each top-level section must be unique across all files
//!
//! ## Environment Variables
//!
//! `${VAR}` and `${VAR:-default}` are substituted before parsing, which keeps
//! the signing key and API keys out of the file itself.

mod loader;

use attestation_types::{serde_helpers, Address, SecretString, U256};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error that occurs during file I/O operations.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	/// Error that occurs when parsing TOML configuration.
	#[error("Configuration error: {0}")]
	Parse(String),
	/// Error that occurs when configuration validation fails.
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// Keep the message only; the full error echoes the input, secrets included
		ConfigError::Parse(err.message().to_string())
	}
}

/// Main configuration structure for the attestation client.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	/// Chain access and contract addresses.
	pub network: NetworkConfig,
	/// Request-preparation verifier service.
	pub verifier: ServiceConfig,
	/// Data-availability service distributing proofs.
	pub da_layer: ServiceConfig,
	/// Voting round schedule.
	pub epoch: EpochConfig,
	/// Hub submission parameters and signing key.
	pub submission: SubmissionConfig,
	/// Wait and retry budgets.
	#[serde(default)]
	pub retry: RetryConfig,
	/// Logging toggle and level.
	#[serde(default)]
	pub logging: LoggingConfig,
}

/// Chain access and contract addresses.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NetworkConfig {
	/// HTTP JSON-RPC endpoint of the chain hosting the hub.
	pub rpc_url: String,
	/// Hub contract accepting attestation requests.
	pub hub_address: Address,
	/// Contract verifying Merkle proofs against round roots.
	pub verification_address: Address,
}

/// An external HTTP service with optional API key.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
	pub base_url: String,
	#[serde(default)]
	pub api_key: Option<SecretString>,
}

/// Voting round schedule of the oracle.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct EpochConfig {
	/// Unix timestamp at which round 0 starts.
	pub origin_timestamp: u64,
	/// Length of one voting round.
	pub duration_seconds: u64,
}

/// Hub submission parameters.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SubmissionConfig {
	/// Hex private key of the submitting account.
	pub private_key: SecretString,
	/// Attestation fee sent with each request, in wei.
	#[serde(with = "serde_helpers::u256")]
	pub fee_wei: U256,
	/// Confirmations to wait for on the submission transaction.
	#[serde(default = "default_confirmations")]
	pub confirmations: u64,
	/// Ceiling on the confirmation wait.
	#[serde(default = "default_confirmation_timeout_seconds")]
	pub confirmation_timeout_seconds: u64,
}

/// Returns the default number of submission confirmations.
fn default_confirmations() -> u64 {
	1
}

/// Returns the default confirmation wait ceiling in seconds.
fn default_confirmation_timeout_seconds() -> u64 {
	120
}

/// Wait and retry budgets.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetryConfig {
	/// Total proof retrieval attempts before giving up.
	#[serde(default = "default_proof_max_attempts")]
	pub proof_max_attempts: u32,
	/// Constant delay between proof retrieval attempts.
	#[serde(default = "default_proof_retry_delay_seconds")]
	pub proof_retry_delay_seconds: u64,
	/// Ceiling on the finalization wait.
	#[serde(default = "default_finalization_timeout_seconds")]
	pub finalization_timeout_seconds: u64,
	/// Clock poll interval of the finalization wait.
	#[serde(default = "default_finalization_poll_seconds")]
	pub finalization_poll_seconds: u64,
	/// Timeout applied to every HTTP request.
	#[serde(default = "default_http_timeout_seconds")]
	pub http_timeout_seconds: u64,
}

fn default_proof_max_attempts() -> u32 {
	10
}

fn default_proof_retry_delay_seconds() -> u64 {
	30
}

fn default_finalization_timeout_seconds() -> u64 {
	600
}

fn default_finalization_poll_seconds() -> u64 {
	10
}

fn default_http_timeout_seconds() -> u64 {
	30
}

impl Default for RetryConfig {
	fn default() -> Self {
		Self {
			proof_max_attempts: default_proof_max_attempts(),
			proof_retry_delay_seconds: default_proof_retry_delay_seconds(),
			finalization_timeout_seconds: default_finalization_timeout_seconds(),
			finalization_poll_seconds: default_finalization_poll_seconds(),
			http_timeout_seconds: default_http_timeout_seconds(),
		}
	}
}

impl RetryConfig {
	pub fn proof_retry_delay(&self) -> Duration {
		Duration::from_secs(self.proof_retry_delay_seconds)
	}

	pub fn finalization_timeout(&self) -> Duration {
		Duration::from_secs(self.finalization_timeout_seconds)
	}

	pub fn finalization_poll(&self) -> Duration {
		Duration::from_secs(self.finalization_poll_seconds)
	}

	pub fn http_timeout(&self) -> Duration {
		Duration::from_secs(self.http_timeout_seconds)
	}
}

/// Logging toggle and default level.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
	#[serde(default = "default_logging_enabled")]
	pub enabled: bool,
	#[serde(default = "default_log_level")]
	pub level: String,
}

fn default_logging_enabled() -> bool {
	true
}

fn default_log_level() -> String {
	"info".to_string()
}

impl Default for LoggingConfig {
	fn default() -> Self {
		Self {
			enabled: default_logging_enabled(),
			level: default_log_level(),
		}
	}
}

/// Substitutes `${NAME}` and `${NAME:-fallback}` references from the process
/// environment. A reference without a fallback to an unset variable is an
/// error. Input above 1 MiB is refused.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	const MAX_CONFIG_BYTES: usize = 1 << 20;
	if input.len() > MAX_CONFIG_BYTES {
		return Err(ConfigError::Validation(format!(
			"Configuration is {} bytes, limit is {}",
			input.len(),
			MAX_CONFIG_BYTES
		)));
	}

	let reference = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("Invalid variable pattern: {}", e)))?;

	let mut unset: Option<String> = None;
	let resolved = reference.replace_all(input, |caps: &regex::Captures| {
		let name = &caps[1];
		match (std::env::var(name), caps.get(2)) {
			(Ok(value), _) => value,
			(Err(_), Some(fallback)) => fallback.as_str().to_string(),
			(Err(_), None) => {
				unset.get_or_insert_with(|| name.to_string());
				String::new()
			},
		}
	});

	match unset {
		Some(name) => Err(ConfigError::Validation(format!(
			"Environment variable '{}' is not set and has no default",
			name
		))),
		None => Ok(resolved.into_owned()),
	}
}

/// Checks that a URL is an absolute http(s) URL with a host.
fn validate_url(field: &str, url: &str) -> Result<(), ConfigError> {
	let rest = url
		.strip_prefix("https://")
		.or_else(|| url.strip_prefix("http://"))
		.ok_or_else(|| {
			ConfigError::Validation(format!(
				"{} must start with http:// or https://, got '{}'",
				field, url
			))
		})?;
	if rest.is_empty() || rest.starts_with('/') {
		return Err(ConfigError::Validation(format!(
			"{} has no host: '{}'",
			field, url
		)));
	}
	Ok(())
}

impl Config {
	/// Loads configuration from a file, resolving includes and environment
	/// variables.
	pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		loader::ConfigLoader::default().load(path).await
	}

	/// Validates every section.
	///
	/// Epoch constants are checked here because the round clock's output is
	/// undefined for a zero duration or an origin in the future.
	fn validate(&self) -> Result<(), ConfigError> {
		// Network
		validate_url("network.rpc_url", &self.network.rpc_url)?;
		if self.network.hub_address == Address::ZERO {
			return Err(ConfigError::Validation(
				"network.hub_address cannot be the zero address".into(),
			));
		}
		if self.network.verification_address == Address::ZERO {
			return Err(ConfigError::Validation(
				"network.verification_address cannot be the zero address".into(),
			));
		}

		// Services
		validate_url("verifier.base_url", &self.verifier.base_url)?;
		validate_url("da_layer.base_url", &self.da_layer.base_url)?;

		// Epoch
		if self.epoch.duration_seconds == 0 {
			return Err(ConfigError::Validation(
				"epoch.duration_seconds must be greater than 0".into(),
			));
		}
		let now = std::time::SystemTime::now()
			.duration_since(std::time::UNIX_EPOCH)
			.map(|d| d.as_secs())
			.unwrap_or(0);
		if self.epoch.origin_timestamp > now {
			return Err(ConfigError::Validation(format!(
				"epoch.origin_timestamp {} is in the future",
				self.epoch.origin_timestamp
			)));
		}

		// Submission
		if self.submission.private_key.is_empty() {
			return Err(ConfigError::Validation(
				"submission.private_key cannot be empty".into(),
			));
		}
		if self.submission.confirmations == 0 {
			return Err(ConfigError::Validation(
				"submission.confirmations must be at least 1".into(),
			));
		}
		if self.submission.confirmation_timeout_seconds == 0 {
			return Err(ConfigError::Validation(
				"submission.confirmation_timeout_seconds must be greater than 0".into(),
			));
		}

		// Retry budgets
		if self.retry.proof_max_attempts == 0 {
			return Err(ConfigError::Validation(
				"retry.proof_max_attempts must be at least 1".into(),
			));
		}
		if self.retry.finalization_poll_seconds == 0 {
			return Err(ConfigError::Validation(
				"retry.finalization_poll_seconds must be greater than 0".into(),
			));
		}
		if self.retry.http_timeout_seconds == 0 {
			return Err(ConfigError::Validation(
				"retry.http_timeout_seconds must be greater than 0".into(),
			));
		}

		Ok(())
	}
}

/// Parses configuration from a TOML string.
///
/// Environment variables are resolved and the configuration is validated
/// after parsing.
impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let config: Config = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}
}
