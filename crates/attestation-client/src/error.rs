//! Error taxonomy of the attestation client.

use attestation_types::{RequestStatus, B256};
use thiserror::Error;

/// Errors that can occur while attesting a transaction.
///
/// A verification result of `false` is not an error: it is reported through
/// [`crate::AttestationOutcome::Rejected`]. `request_hash` is the keccak256 of
/// the ABI-encoded request, the identity the hub and the DA layer index by.
#[derive(Debug, Error)]
pub enum AttestationError {
	/// Invalid addresses, URLs, keys or epoch constants. Fatal, never retried.
	#[error("Configuration error: {0}")]
	Configuration(String),
	/// The verifier could not be reached or its response could not be read.
	#[error("Verifier unreachable: {0}")]
	VerifierUnreachable(String),
	/// The verifier answered with a non-success HTTP status.
	#[error("Verifier service returned HTTP {status}: {body}")]
	VerifierService { status: u16, body: String },
	/// The verifier answered successfully but without a usable encoded request.
	#[error("Malformed verifier response: {0}")]
	MalformedVerifierResponse(String),
	/// The verifier judged the request not attestable; nothing was submitted.
	#[error("Verifier rejected the request with status {status}")]
	RequestNotValid { status: RequestStatus },
	/// The hub transaction could not be sent or reverted. Funds may have moved.
	#[error("Submission of request {request_hash} failed{}: {reason}", in_transaction(.transaction_hash))]
	Submission {
		request_hash: B256,
		/// Set once the transaction was accepted by the node.
		transaction_hash: Option<B256>,
		reason: String,
	},
	/// The block confirming the submission could not be fetched.
	#[error("Lookup of block {block_number} confirming {transaction_hash} failed: {reason}")]
	BlockLookup {
		transaction_hash: B256,
		block_number: u64,
		reason: String,
	},
	/// The expected end of the voting round was not reached in time.
	#[error("Round {round_id} not finalized after {waited_secs}s")]
	FinalizationTimeout { round_id: u64, waited_secs: u64 },
	/// Every proof retrieval attempt failed.
	#[error("Proof of request {request_hash} in round {round_id} unavailable after {attempts} attempts: {last_error}")]
	ProofRetrievalExhausted {
		round_id: u64,
		request_hash: B256,
		attempts: u32,
		#[source]
		last_error: ProofFetchError,
	},
	/// The verification contract call itself failed (revert, ABI mismatch, RPC).
	#[error("Verification call for round {round_id} failed: {reason}")]
	VerificationCall { round_id: u64, reason: String },
	/// The caller cancelled the operation or its deadline passed.
	#[error("Cancelled")]
	Cancelled,
}

fn in_transaction(transaction_hash: &Option<B256>) -> String {
	transaction_hash
		.map(|hash| format!(" in transaction {}", hash))
		.unwrap_or_default()
}

impl AttestationError {
	/// Whether a higher-level retry may succeed without operator action.
	pub fn is_recoverable(&self) -> bool {
		matches!(
			self,
			AttestationError::VerifierUnreachable(_)
				| AttestationError::VerifierService { .. }
				| AttestationError::MalformedVerifierResponse(_)
				| AttestationError::FinalizationTimeout { .. }
				| AttestationError::ProofRetrievalExhausted { .. }
		)
	}
}

/// Failure of a single proof retrieval attempt. Every kind is retried until
/// the attempt budget runs out; the last one is kept for diagnosis.
#[derive(Debug, Error)]
pub enum ProofFetchError {
	/// The request never produced an HTTP response.
	#[error("Transport error: {0}")]
	Transport(String),
	/// The DA service answered with a non-success status.
	#[error("HTTP {status}: {body}")]
	Status { status: u16, body: String },
	/// The round is not finalized or not yet ingested by the DA service.
	#[error("Proof not yet available: {0}")]
	NotAvailable(String),
	/// The response body exists but does not decode.
	#[error("Malformed response: {0}")]
	Malformed(String),
}

/// Failure reported by a chain interface, before the client attaches the
/// request and round it belongs to.
#[derive(Debug, Error)]
pub enum ChainError {
	/// The node did not accept the transaction.
	#[error("Failed to send transaction: {0}")]
	Send(String),
	/// The transaction was sent but did not confirm successfully.
	#[error("Transaction {transaction_hash} failed: {reason}")]
	Receipt { transaction_hash: B256, reason: String },
	/// A block could not be fetched.
	#[error("Block unavailable: {0}")]
	Block(String),
	/// A view call reverted or its result did not decode.
	#[error("Contract call failed: {0}")]
	Call(String),
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_submission_message_names_request_and_transaction() {
		let before_send = AttestationError::Submission {
			request_hash: B256::repeat_byte(0xaa),
			transaction_hash: None,
			reason: "nonce too low".into(),
		};
		let reverted = AttestationError::Submission {
			request_hash: B256::repeat_byte(0xaa),
			transaction_hash: Some(B256::repeat_byte(0xbb)),
			reason: "execution reverted".into(),
		};

		let before_send = before_send.to_string();
		assert!(before_send.contains(&B256::repeat_byte(0xaa).to_string()));
		assert!(!before_send.contains("in transaction"));
		assert!(reverted
			.to_string()
			.contains(&format!("in transaction {}", B256::repeat_byte(0xbb))));
	}

	#[test]
	fn test_recoverability() {
		assert!(AttestationError::FinalizationTimeout {
			round_id: 1,
			waited_secs: 10
		}
		.is_recoverable());
		assert!(AttestationError::VerifierUnreachable("connection refused".into()).is_recoverable());
		assert!(!AttestationError::Submission {
			request_hash: B256::ZERO,
			transaction_hash: None,
			reason: "reverted".into(),
		}
		.is_recoverable());
		assert!(!AttestationError::VerificationCall {
			round_id: 1,
			reason: "revert".into(),
		}
		.is_recoverable());
	}
}
