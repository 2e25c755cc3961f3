//! Attestation client for the Flare Data Connector.
//!
//! This module drives one attestation from request to verified data:
//! the verifier service prepares an encoded request, the hub contract
//! accepts it into a voting round, the client waits for the round to end,
//! fetches the Merkle proof from the data-availability service and checks
//! it against the verification contract. Response data is only readable
//! once that check returned `true`.

use attestation_config::{Config, RetryConfig};
use attestation_types::{
	truncate_id, AttestationRequest, AttestationResponse, Bytes, PreparedRequest, U256,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

mod abi;
pub mod clock;
mod error;
pub mod extract;
pub mod finalization;
pub mod preparer;
pub mod proof;
pub mod retriever;
pub mod submitter;
pub mod verifier;
pub mod wait;

#[cfg(test)]
pub(crate) mod test_utils;

/// Concrete implementations of the client interfaces.
pub mod implementations {
	pub mod evm {
		pub mod alloy;
	}
	pub mod http;
}

pub use abi::{AbiProof, EvmProof, PaymentProof};
pub use clock::{RoundClock, SystemTimeSource, TimeSource};
pub use error::{AttestationError, ChainError, ProofFetchError};
pub use extract::TokenTransfer;
pub use finalization::FinalizationWaiter;
pub use preparer::RequestPreparer;
pub use proof::{AttestationProof, ProofResponse, RequestBody, ResponseBody, VerifiedAttestation};
pub use retriever::{ProofRetriever, ProofTransport};
pub use submitter::{HubInterface, RequestSubmitter, SubmittedRequest};
pub use verifier::{ProofVerifier, VerificationInterface};

/// Final result of an attestation.
#[derive(Debug)]
pub enum AttestationOutcome {
	/// The verification contract accepted the proof.
	Verified(VerifiedAttestation),
	/// The verification contract returned `false`. The response body must not be used.
	Rejected {
		round_id: u64,
		proof: AttestationProof,
	},
}

impl AttestationOutcome {
	pub fn is_verified(&self) -> bool {
		matches!(self, AttestationOutcome::Verified(_))
	}
}

/// Collaborators of an [`AttestationClient`], for wiring custom implementations.
pub struct ClientParts {
	pub preparer: RequestPreparer,
	pub hub: Arc<dyn HubInterface>,
	pub transport: Arc<dyn ProofTransport>,
	pub verification: Arc<dyn VerificationInterface>,
	pub time: Arc<dyn TimeSource>,
	pub clock: RoundClock,
	pub fee: U256,
	pub retry: RetryConfig,
}

/// Runs the prepare, submit, wait, retrieve and verify steps of an attestation.
///
/// Cheap to share behind an `Arc`; concurrent attestations only contend on
/// the submission lock.
pub struct AttestationClient {
	preparer: RequestPreparer,
	submitter: RequestSubmitter,
	waiter: FinalizationWaiter,
	retriever: ProofRetriever,
	verifier: ProofVerifier,
	clock: RoundClock,
	retry: RetryConfig,
}

impl AttestationClient {
	pub fn new(parts: ClientParts) -> Self {
		Self {
			preparer: parts.preparer,
			submitter: RequestSubmitter::new(parts.hub, parts.clock, parts.fee),
			waiter: FinalizationWaiter::new(parts.clock, parts.time, parts.retry.finalization_poll()),
			retriever: ProofRetriever::new(parts.transport),
			verifier: ProofVerifier::new(parts.verification),
			clock: parts.clock,
			retry: parts.retry,
		}
	}

	/// Wires the HTTP and alloy implementations from a validated configuration.
	pub fn from_config(config: &Config) -> Result<Self, AttestationError> {
		let http_timeout = config.retry.http_timeout();
		let provider = implementations::evm::alloy::connect(&config.network, &config.submission)?;

		let hub = implementations::evm::alloy::AlloyHub::new(
			provider.clone(),
			config.network.hub_address,
			&config.submission,
		);
		let verification = implementations::evm::alloy::AlloyVerification::new(
			provider,
			config.network.verification_address,
		);

		Ok(Self::new(ClientParts {
			preparer: RequestPreparer::new(&config.verifier, http_timeout)?,
			hub: Arc::new(hub),
			transport: Arc::new(implementations::http::HttpProofTransport::new(
				&config.da_layer,
				http_timeout,
			)?),
			verification: Arc::new(verification),
			time: Arc::new(SystemTimeSource),
			clock: RoundClock::from_config(&config.epoch)?,
			fee: config.submission.fee_wei,
			retry: config.retry.clone(),
		}))
	}

	pub fn clock(&self) -> &RoundClock {
		&self.clock
	}

	/// Attests `request` end to end.
	///
	/// A finalization timeout is logged and retrieval proceeds, since the
	/// retriever already tolerates proofs that are not available yet.
	#[instrument(skip_all, fields(
		chain = %request.source_chain(),
		kind = %request.attestation_kind(),
		tx_hash = %truncate_id(&request.transaction_hash().to_string()),
		round_id = tracing::field::Empty
	))]
	pub async fn attest(
		&self,
		request: &AttestationRequest,
		cancel: &CancellationToken,
	) -> Result<AttestationOutcome, AttestationError> {
		let prepared = self.prepare(request, cancel).await?;
		let response = self.submit(prepared, cancel).await?;
		let round_id = response.round_id;
		tracing::Span::current().record("round_id", round_id);

		match self.await_finalization(round_id, cancel).await {
			Ok(()) => {},
			Err(e @ AttestationError::FinalizationTimeout { .. }) => {
				tracing::warn!(error = %e, "Proceeding to proof retrieval");
			},
			Err(e) => return Err(e),
		}

		let proof = self
			.get_proof(round_id, &response.encoded_request, cancel)
			.await?;
		let outcome = self.verify_proof(proof, cancel).await?;

		if outcome.is_verified() {
			tracing::info!("Attestation verified");
		} else {
			tracing::warn!("Attestation proof rejected by verification contract");
		}
		Ok(outcome)
	}

	pub async fn prepare(
		&self,
		request: &AttestationRequest,
		cancel: &CancellationToken,
	) -> Result<PreparedRequest, AttestationError> {
		self.preparer.prepare(request, cancel).await
	}

	pub async fn submit(
		&self,
		prepared: PreparedRequest,
		cancel: &CancellationToken,
	) -> Result<AttestationResponse, AttestationError> {
		self.submitter.submit(prepared, cancel).await
	}

	/// Waits for `round_id` to end within the configured timeout.
	pub async fn await_finalization(
		&self,
		round_id: u64,
		cancel: &CancellationToken,
	) -> Result<(), AttestationError> {
		self.waiter
			.await_finalization(round_id, self.retry.finalization_timeout(), cancel)
			.await
	}

	/// Fetches the proof of `request_bytes` with the configured retry budget.
	pub async fn get_proof(
		&self,
		round_id: u64,
		request_bytes: &Bytes,
		cancel: &CancellationToken,
	) -> Result<AttestationProof, AttestationError> {
		self.retriever
			.get_proof(
				round_id,
				request_bytes,
				self.retry.proof_max_attempts,
				self.retry.proof_retry_delay(),
				cancel,
			)
			.await
	}

	/// Verifies `proof`, unlocking its response body only on success.
	pub async fn verify_proof(
		&self,
		proof: AttestationProof,
		cancel: &CancellationToken,
	) -> Result<AttestationOutcome, AttestationError> {
		if self.verifier.verify(&proof, cancel).await? {
			Ok(AttestationOutcome::Verified(VerifiedAttestation::new(proof)))
		} else {
			Ok(AttestationOutcome::Rejected {
				round_id: proof.round_id(),
				proof,
			})
		}
	}
}
