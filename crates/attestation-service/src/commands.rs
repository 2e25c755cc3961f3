//! Subcommand implementations.

use attestation_client::wait::cancel_after;
use attestation_client::{
	AttestationClient, AttestationOutcome, ResponseBody, RoundClock, SystemTimeSource,
	TimeSource, TokenTransfer,
};
use attestation_config::Config;
use attestation_types::{AttestationKind, AttestationRequest, SourceChain, B256};
use serde::Serialize;
use std::process::ExitCode;
use std::str::FromStr;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// JSON printed for a verified attestation.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VerifiedReport<'a> {
	round_id: u64,
	attestation_type: AttestationKind,
	source_chain: &'a SourceChain,
	response_body: &'a ResponseBody,
	token_transfers: Vec<TokenTransfer>,
}

/// Runs a full attestation. Exit code 2 signals a rejected proof.
pub async fn prove(
	config: &Config,
	chain: &str,
	tx: &str,
	confirmations: u16,
	deadline_secs: Option<u64>,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
	let chain = SourceChain::from_str(chain)?;
	let transaction_hash = B256::from_str(tx).map_err(|e| format!("Invalid --tx '{}': {}", tx, e))?;
	let request = AttestationRequest::new(chain, transaction_hash, confirmations)?;

	let client = AttestationClient::from_config(config)?;

	let shutdown = CancellationToken::new();
	let on_signal = shutdown.clone();
	tokio::spawn(async move {
		if tokio::signal::ctrl_c().await.is_ok() {
			tracing::warn!("Interrupt received, cancelling attestation");
			on_signal.cancel();
		}
	});
	let cancel = match deadline_secs {
		Some(secs) => cancel_after(&shutdown, Duration::from_secs(secs)),
		None => shutdown.clone(),
	};

	match client.attest(&request, &cancel).await? {
		AttestationOutcome::Verified(verified) => {
			let report = VerifiedReport {
				round_id: verified.round_id(),
				attestation_type: verified.proof().kind(),
				source_chain: request.source_chain(),
				response_body: verified.response_body(),
				token_transfers: verified.token_transfers(),
			};
			println!("{}", serde_json::to_string_pretty(&report)?);
			Ok(ExitCode::SUCCESS)
		},
		AttestationOutcome::Rejected { round_id, proof } => {
			eprintln!(
				"Proof for round {} was rejected by the verification contract ({} merkle nodes); response data withheld",
				round_id,
				proof.merkle_proof().len()
			);
			Ok(ExitCode::from(2))
		},
	}
}

/// Prints the round containing `timestamp`, or the current round.
pub fn round(config: &Config, timestamp: Option<u64>) -> Result<(), Box<dyn std::error::Error>> {
	let clock = RoundClock::from_config(&config.epoch)?;
	let timestamp = timestamp.unwrap_or_else(|| SystemTimeSource.now_unix());
	let round_id = clock.round_id(timestamp);
	let (start, end) = clock.round_window(round_id);
	println!(
		"{}",
		serde_json::json!({
			"timestamp": timestamp,
			"roundId": round_id,
			"windowStart": start,
			"windowEnd": end,
		})
	);
	Ok(())
}

/// Prints how a chain identifier is routed.
pub fn kind(chain: &str) -> Result<(), Box<dyn std::error::Error>> {
	let chain: SourceChain = chain.parse()?;
	let kind = attestation_types::select_attestation_kind(&chain);
	println!(
		"{}",
		serde_json::json!({
			"chain": chain,
			"recognized": chain.is_evm().is_some(),
			"attestationType": kind,
			"attestationTypeId": kind.type_id(),
			"sourceId": chain.source_id(),
			"verifierPath": format!("/verifier/{}/{}/prepareRequest", chain.short_name(), kind),
		})
	);
	Ok(())
}
