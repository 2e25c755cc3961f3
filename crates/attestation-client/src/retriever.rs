//! Proof retrieval with a bounded, constant-delay retry loop.
//!
//! Proofs do not exist until the round is finalized and the DA service has
//! ingested it, so failed attempts here are expected in normal operation.

use crate::proof::AttestationProof;
use crate::wait::{run_or_cancel, sleep_or_cancel};
use crate::{AttestationError, ProofFetchError};
use async_trait::async_trait;
use alloy::primitives::keccak256;
use attestation_types::{truncate_id, Bytes};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Trait defining a single proof fetch from the DA service.
#[async_trait]
pub trait ProofTransport: Send + Sync {
	/// Fetches and decodes the proof of `request_bytes` in `round_id`.
	async fn fetch_proof(
		&self,
		round_id: u64,
		request_bytes: &Bytes,
	) -> Result<AttestationProof, ProofFetchError>;
}

pub struct ProofRetriever {
	transport: Arc<dyn ProofTransport>,
}

impl ProofRetriever {
	pub fn new(transport: Arc<dyn ProofTransport>) -> Self {
		Self { transport }
	}

	/// Fetches a proof, making at most `max_attempts` attempts `retry_delay` apart.
	pub async fn get_proof(
		&self,
		round_id: u64,
		request_bytes: &Bytes,
		max_attempts: u32,
		retry_delay: Duration,
		cancel: &CancellationToken,
	) -> Result<AttestationProof, AttestationError> {
		let max_attempts = max_attempts.max(1);
		let request_hash = keccak256(request_bytes);
		let mut attempt = 0;

		loop {
			attempt += 1;
			let result = run_or_cancel(
				async { Ok(self.transport.fetch_proof(round_id, request_bytes).await) },
				cancel,
			)
			.await?;

			let error = match result {
				Ok(proof) => {
					tracing::info!(
						round_id,
						attempt,
						merkle_depth = proof.merkle_proof().len(),
						"Proof retrieved"
					);
					return Ok(proof);
				},
				Err(e) => e,
			};

			if attempt >= max_attempts {
				tracing::warn!(
					round_id,
					request_hash = %truncate_id(&request_hash.to_string()),
					attempts = attempt,
					error = %error,
					"Proof retrieval attempts exhausted"
				);
				return Err(AttestationError::ProofRetrievalExhausted {
					round_id,
					request_hash,
					attempts: attempt,
					last_error: error,
				});
			}

			tracing::info!(
				round_id,
				attempt,
				max_attempts,
				error = %error,
				"Proof attempt failed, retrying in {}s",
				retry_delay.as_secs()
			);
			sleep_or_cancel(retry_delay, cancel).await?;
		}
	}
}
