//! Fixtures and hand-written mocks shared by the unit tests.

use crate::abi::{EvmProof, PaymentProof};
use crate::clock::TimeSource;
use crate::submitter::{HubInterface, SubmittedRequest};
use crate::verifier::VerificationInterface;
use crate::ChainError;
use async_trait::async_trait;
use attestation_types::{AttestationKind, Bytes, SourceChain, B256, U256};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub(crate) const ORIGIN: u64 = 1658429955;

const TRANSFER_TOPIC: &str = "0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef";

fn padded_address(last: &str) -> String {
	format!("0x{:0>64}", last)
}

/// A well-formed DA envelope for a Sepolia `EVMTransaction` with one ERC-20 transfer.
pub(crate) fn evm_proof_json(round_id: u64) -> serde_json::Value {
	json!({
		"proof": [
			format!("0x{}", "01".repeat(32)),
			format!("0x{}", "02".repeat(32)),
		],
		"response": {
			"attestationType": AttestationKind::EvmTransaction.type_id(),
			"sourceId": SourceChain::Sepolia.source_id(),
			"votingRound": round_id.to_string(),
			"lowestUsedTimestamp": 1700000000,
			"requestBody": {
				"transactionHash": format!("0x{}", "11".repeat(32)),
				"requiredConfirmations": "1",
				"provideInput": true,
				"listEvents": true,
				"logIndices": []
			},
			"responseBody": {
				"blockNumber": "7654321",
				"timestamp": "1700000000",
				"sourceAddress": "0x00000000000000000000000000000000000000a1",
				"isDeployment": false,
				"receivingAddress": "0x00000000000000000000000000000000000000c3",
				"value": "0",
				"input": "0xa9059cbb",
				"status": "1",
				"events": [{
					"logIndex": "0",
					"emitterAddress": "0x00000000000000000000000000000000000000c3",
					"topics": [
						TRANSFER_TOPIC,
						padded_address("a1"),
						padded_address("b2"),
					],
					"data": padded_address("3e8"),
					"removed": false
				}]
			}
		}
	})
}

/// A well-formed DA envelope for an XRPL testnet `Payment`.
pub(crate) fn payment_proof_json(round_id: u64) -> serde_json::Value {
	json!({
		"proof": [format!("0x{}", "03".repeat(32))],
		"response": {
			"attestationType": AttestationKind::Payment.type_id(),
			"sourceId": SourceChain::XrplTestnet.source_id(),
			"votingRound": round_id,
			"lowestUsedTimestamp": "1700000000",
			"requestBody": {
				"transactionId": format!("0x{}", "22".repeat(32)),
				"inUtxo": "0",
				"utxo": "0"
			},
			"responseBody": {
				"blockNumber": 88000000,
				"blockTimestamp": 1700000100,
				"sourceAddressHash": format!("0x{}", "aa".repeat(32)),
				"sourceAddressesRoot": format!("0x{}", "bb".repeat(32)),
				"receivingAddressHash": format!("0x{}", "cc".repeat(32)),
				"intendedReceivingAddressHash": format!("0x{}", "cc".repeat(32)),
				"spentAmount": "1000010",
				"intendedSpentAmount": "1000010",
				"receivedAmount": "1000000",
				"intendedReceivedAmount": "1000000",
				"standardPaymentReference": format!("0x{}", "00".repeat(32)),
				"oneToOne": true,
				"status": "0"
			}
		}
	})
}

/// Wall clock that follows tokio's (possibly paused) clock from a fixed start.
pub(crate) struct TokioTimeSource {
	start_unix: u64,
	started: tokio::time::Instant,
}

impl TokioTimeSource {
	pub(crate) fn starting_at(start_unix: u64) -> Self {
		Self {
			start_unix,
			started: tokio::time::Instant::now(),
		}
	}
}

impl TimeSource for TokioTimeSource {
	fn now_unix(&self) -> u64 {
		self.start_unix + self.started.elapsed().as_secs()
	}
}

/// Hub that confirms every submission in a block with a fixed timestamp.
pub(crate) struct MockHub {
	pub(crate) block_timestamp: u64,
	pub(crate) revert: bool,
	pub(crate) block_unavailable: bool,
	pub(crate) lookup_delay: Duration,
	pub(crate) submissions: AtomicUsize,
	pub(crate) in_flight: AtomicUsize,
	pub(crate) max_in_flight: AtomicUsize,
	pub(crate) lookups_in_flight: AtomicUsize,
	pub(crate) submissions_during_lookup: AtomicUsize,
	pub(crate) last_fee: Mutex<Option<U256>>,
}

impl MockHub {
	pub(crate) fn confirming_at(block_timestamp: u64) -> Self {
		Self {
			block_timestamp,
			revert: false,
			block_unavailable: false,
			lookup_delay: Duration::ZERO,
			submissions: AtomicUsize::new(0),
			in_flight: AtomicUsize::new(0),
			max_in_flight: AtomicUsize::new(0),
			lookups_in_flight: AtomicUsize::new(0),
			submissions_during_lookup: AtomicUsize::new(0),
			last_fee: Mutex::new(None),
		}
	}
}

#[async_trait]
impl HubInterface for MockHub {
	async fn request_attestation(
		&self,
		_encoded_request: &Bytes,
		fee: U256,
	) -> Result<SubmittedRequest, ChainError> {
		let count = self.submissions.fetch_add(1, Ordering::SeqCst) + 1;
		if self.lookups_in_flight.load(Ordering::SeqCst) > 0 {
			self.submissions_during_lookup.fetch_add(1, Ordering::SeqCst);
		}
		let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
		self.max_in_flight.fetch_max(now, Ordering::SeqCst);
		*self.last_fee.lock().unwrap() = Some(fee);

		tokio::time::sleep(Duration::from_millis(50)).await;
		self.in_flight.fetch_sub(1, Ordering::SeqCst);

		let transaction_hash = B256::with_last_byte(count as u8);
		if self.revert {
			return Err(ChainError::Receipt {
				transaction_hash,
				reason: "execution reverted".into(),
			});
		}
		Ok(SubmittedRequest {
			transaction_hash,
			block_number: 1000 + count as u64,
		})
	}

	async fn block_timestamp(&self, block_number: u64) -> Result<u64, ChainError> {
		self.lookups_in_flight.fetch_add(1, Ordering::SeqCst);
		tokio::time::sleep(self.lookup_delay).await;
		self.lookups_in_flight.fetch_sub(1, Ordering::SeqCst);

		if self.block_unavailable {
			return Err(ChainError::Block(format!(
				"header not found for block {}",
				block_number
			)));
		}
		Ok(self.block_timestamp)
	}
}

/// Verification contract returning a fixed verdict and recording its calldata.
pub(crate) struct MockVerification {
	/// `None` makes every call revert.
	pub(crate) verdict: Option<bool>,
	pub(crate) calls: AtomicUsize,
	pub(crate) last_evm: Mutex<Option<EvmProof>>,
	pub(crate) last_payment: Mutex<Option<PaymentProof>>,
}

impl MockVerification {
	pub(crate) fn returning(verdict: bool) -> Self {
		Self::with_verdict(Some(verdict))
	}

	pub(crate) fn reverting() -> Self {
		Self::with_verdict(None)
	}

	fn with_verdict(verdict: Option<bool>) -> Self {
		Self {
			verdict,
			calls: AtomicUsize::new(0),
			last_evm: Mutex::new(None),
			last_payment: Mutex::new(None),
		}
	}

	fn answer(&self) -> Result<bool, ChainError> {
		self.calls.fetch_add(1, Ordering::SeqCst);
		self.verdict
			.ok_or_else(|| ChainError::Call("execution reverted: invalid proof format".into()))
	}
}

#[async_trait]
impl VerificationInterface for MockVerification {
	async fn verify_evm_transaction(&self, proof: EvmProof) -> Result<bool, ChainError> {
		*self.last_evm.lock().unwrap() = Some(proof);
		self.answer()
	}

	async fn verify_payment(&self, proof: PaymentProof) -> Result<bool, ChainError> {
		*self.last_payment.lock().unwrap() = Some(proof);
		self.answer()
	}
}
