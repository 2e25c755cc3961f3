//! On-chain proof verification.

use crate::abi::{AbiProof, EvmProof, PaymentProof};
use crate::proof::AttestationProof;
use crate::wait::run_or_cancel;
use crate::{AttestationError, ChainError};
use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Trait defining the verification contract's view functions.
#[async_trait]
pub trait VerificationInterface: Send + Sync {
	async fn verify_evm_transaction(&self, proof: EvmProof) -> Result<bool, ChainError>;

	async fn verify_payment(&self, proof: PaymentProof) -> Result<bool, ChainError>;
}

/// Checks proofs against the round's Merkle root held by the verification contract.
pub struct ProofVerifier {
	contract: Arc<dyn VerificationInterface>,
}

impl ProofVerifier {
	pub fn new(contract: Arc<dyn VerificationInterface>) -> Self {
		Self { contract }
	}

	/// Returns the contract's verdict unmodified. Not retried.
	pub async fn verify(
		&self,
		proof: &AttestationProof,
		cancel: &CancellationToken,
	) -> Result<bool, AttestationError> {
		let calldata = AbiProof::try_from(proof)?;
		let verdict = run_or_cancel(
			async {
				let result = match calldata {
					AbiProof::EvmTransaction(p) => self.contract.verify_evm_transaction(p).await,
					AbiProof::Payment(p) => self.contract.verify_payment(p).await,
				};
				result.map_err(|e| {
					tracing::error!(round_id = proof.round_id(), error = %e, "Verification call failed");
					AttestationError::VerificationCall {
						round_id: proof.round_id(),
						reason: e.to_string(),
					}
				})
			},
			cancel,
		)
		.await?;

		tracing::info!(
			round_id = proof.round_id(),
			kind = %proof.kind(),
			verified = verdict,
			"Proof verification result"
		);
		Ok(verdict)
	}
}
