//! Submission of prepared requests to the hub contract.

use crate::clock::RoundClock;
use crate::wait::run_or_cancel;
use crate::{AttestationError, ChainError};
use alloy::primitives::keccak256;
use async_trait::async_trait;
use attestation_types::{truncate_id, AttestationResponse, Bytes, PreparedRequest, B256, U256};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// A hub transaction that was mined and confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmittedRequest {
	pub transaction_hash: B256,
	pub block_number: u64,
}

/// Trait defining the on-chain operations the submitter needs.
///
/// The production implementation signs with the configured key and waits for
/// the configured confirmations before returning.
#[async_trait]
pub trait HubInterface: Send + Sync {
	/// Sends `requestAttestation(encoded_request)` with `fee` as value and
	/// waits for its receipt. A reverted receipt is an error.
	async fn request_attestation(
		&self,
		encoded_request: &Bytes,
		fee: U256,
	) -> Result<SubmittedRequest, ChainError>;

	/// Timestamp of a mined block.
	async fn block_timestamp(&self, block_number: u64) -> Result<u64, ChainError>;
}

/// Submits prepared requests and derives their voting round.
pub struct RequestSubmitter {
	hub: Arc<dyn HubInterface>,
	clock: RoundClock,
	fee: U256,
	/// One submission at a time per signing key.
	submit_lock: Mutex<()>,
}

impl RequestSubmitter {
	pub fn new(hub: Arc<dyn HubInterface>, clock: RoundClock, fee: U256) -> Self {
		Self {
			hub,
			clock,
			fee,
			submit_lock: Mutex::new(()),
		}
	}

	/// Submits `prepared` and returns the round its confirming block falls into.
	///
	/// Consumes the prepared request. Cancellation after the transaction was
	/// sent does not undo it.
	pub async fn submit(
		&self,
		prepared: PreparedRequest,
		cancel: &CancellationToken,
	) -> Result<AttestationResponse, AttestationError> {
		if !prepared.status.is_valid() {
			tracing::warn!(status = %prepared.status, "Refusing to submit request");
			return Err(AttestationError::RequestNotValid {
				status: prepared.status,
			});
		}

		let request_hash = keccak256(&prepared.encoded_request);
		let guard = tokio::select! {
			_ = cancel.cancelled() => return Err(AttestationError::Cancelled),
			guard = self.submit_lock.lock() => guard,
		};

		let submitted = run_or_cancel(
			async {
				self.hub
					.request_attestation(&prepared.encoded_request, self.fee)
					.await
					.map_err(|e| submission_failed(request_hash, e))
			},
			cancel,
		)
		.await?;
		// The nonce is spent; the block lookup may overlap the next submission
		drop(guard);

		let tx_hash = submitted.transaction_hash.to_string();
		tracing::info!(
			tx_hash = %truncate_id(&tx_hash),
			block_number = submitted.block_number,
			"Attestation request confirmed"
		);

		let timestamp = run_or_cancel(
			async {
				self.hub
					.block_timestamp(submitted.block_number)
					.await
					.map_err(|e| AttestationError::BlockLookup {
						transaction_hash: submitted.transaction_hash,
						block_number: submitted.block_number,
						reason: e.to_string(),
					})
			},
			cancel,
		)
		.await?;
		let round_id = self.clock.round_id(timestamp);

		tracing::info!(
			tx_hash = %truncate_id(&tx_hash),
			round_id,
			block_timestamp = timestamp,
			"Request assigned to voting round"
		);

		Ok(AttestationResponse {
			round_id,
			encoded_request: prepared.encoded_request,
			status: prepared.status,
			transaction_hash: submitted.transaction_hash,
			block_number: submitted.block_number,
		})
	}
}

fn submission_failed(request_hash: B256, error: ChainError) -> AttestationError {
	let (transaction_hash, reason) = match error {
		ChainError::Receipt {
			transaction_hash,
			reason,
		} => (Some(transaction_hash), reason),
		other => (None, other.to_string()),
	};
	AttestationError::Submission {
		request_hash,
		transaction_hash,
		reason,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::test_utils::{MockHub, ORIGIN};
	use attestation_types::RequestStatus;
	use std::sync::atomic::Ordering;

	fn valid_request() -> PreparedRequest {
		PreparedRequest {
			encoded_request: Bytes::from_static(&[0x01, 0x02]),
			status: RequestStatus::Valid,
		}
	}

	fn submitter(hub: Arc<MockHub>) -> RequestSubmitter {
		RequestSubmitter::new(
			hub,
			RoundClock::new(ORIGIN, 90).unwrap(),
			U256::from(1_000_000_000_000_000_000u64),
		)
	}

	#[tokio::test(start_paused = true)]
	async fn test_round_from_block_timestamp() {
		let hub = Arc::new(MockHub::confirming_at(1658430100));
		let response = submitter(hub.clone())
			.submit(valid_request(), &CancellationToken::new())
			.await
			.unwrap();

		assert_eq!(response.round_id, 1);
		assert_eq!(response.status, RequestStatus::Valid);
		assert_eq!(response.encoded_request, Bytes::from_static(&[0x01, 0x02]));
		assert_eq!(
			*hub.last_fee.lock().unwrap(),
			Some(U256::from(1_000_000_000_000_000_000u64))
		);
	}

	#[tokio::test(start_paused = true)]
	async fn test_invalid_request_never_reaches_hub() {
		let hub = Arc::new(MockHub::confirming_at(ORIGIN));
		let prepared = PreparedRequest {
			encoded_request: Bytes::new(),
			status: RequestStatus::Invalid,
		};

		let err = submitter(hub.clone())
			.submit(prepared, &CancellationToken::new())
			.await
			.unwrap_err();
		assert!(matches!(
			err,
			AttestationError::RequestNotValid {
				status: RequestStatus::Invalid
			}
		));
		assert_eq!(hub.submissions.load(Ordering::SeqCst), 0);
	}

	#[tokio::test(start_paused = true)]
	async fn test_revert_is_submission_error() {
		let mut hub = MockHub::confirming_at(ORIGIN);
		hub.revert = true;
		let err = submitter(Arc::new(hub))
			.submit(valid_request(), &CancellationToken::new())
			.await
			.unwrap_err();
		match &err {
			AttestationError::Submission {
				request_hash,
				transaction_hash,
				reason,
			} => {
				assert_eq!(*request_hash, keccak256([0x01u8, 0x02]));
				assert_eq!(*transaction_hash, Some(B256::with_last_byte(1)));
				assert_eq!(reason, "execution reverted");
			},
			other => panic!("unexpected error: {other:?}"),
		}
		assert!(!err.is_recoverable());
	}

	#[tokio::test(start_paused = true)]
	async fn test_block_lookup_failure_propagates() {
		let mut hub = MockHub::confirming_at(ORIGIN);
		hub.block_unavailable = true;
		let err = submitter(Arc::new(hub))
			.submit(valid_request(), &CancellationToken::new())
			.await
			.unwrap_err();

		match err {
			AttestationError::BlockLookup {
				transaction_hash,
				block_number,
				reason,
			} => {
				assert_eq!(transaction_hash, B256::with_last_byte(1));
				assert_eq!(block_number, 1001);
				assert!(reason.contains("header not found"));
			},
			other => panic!("unexpected error: {other:?}"),
		}
	}

	#[tokio::test(start_paused = true)]
	async fn test_block_lookup_runs_outside_submit_lock() {
		let mut hub = MockHub::confirming_at(1658430225);
		hub.lookup_delay = std::time::Duration::from_millis(200);
		let hub = Arc::new(hub);
		let submitter = Arc::new(submitter(hub.clone()));

		let handles: Vec<_> = (0..2)
			.map(|_| {
				let submitter = submitter.clone();
				tokio::spawn(async move {
					submitter
						.submit(valid_request(), &CancellationToken::new())
						.await
				})
			})
			.collect();
		for handle in handles {
			handle.await.unwrap().unwrap();
		}

		assert_eq!(hub.max_in_flight.load(Ordering::SeqCst), 1);
		assert_eq!(hub.submissions_during_lookup.load(Ordering::SeqCst), 1);
	}

	#[tokio::test(start_paused = true)]
	async fn test_concurrent_submissions_are_serialized() {
		let hub = Arc::new(MockHub::confirming_at(1658430225));
		let submitter = Arc::new(submitter(hub.clone()));

		let handles: Vec<_> = (0..4)
			.map(|_| {
				let submitter = submitter.clone();
				tokio::spawn(async move {
					submitter
						.submit(valid_request(), &CancellationToken::new())
						.await
				})
			})
			.collect();
		for handle in handles {
			assert_eq!(handle.await.unwrap().unwrap().round_id, 3);
		}

		assert_eq!(hub.submissions.load(Ordering::SeqCst), 4);
		assert_eq!(hub.max_in_flight.load(Ordering::SeqCst), 1);
	}
}
