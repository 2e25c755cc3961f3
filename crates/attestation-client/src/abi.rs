//! Contract bindings for the hub, the verification contract and ERC-20 logs.
//!
//! Struct layouts mirror the protocol's `IEVMTransaction` and `IPayment`
//! types field for field; only the Rust names differ, which does not affect
//! the ABI encoding or the function selectors.

use crate::proof::{AttestationProof, RequestBody, ResponseBody};
use crate::AttestationError;
use alloy::sol;
use attestation_types::{
	EvmEvent, EvmTransactionRequestBody, EvmTransactionResponseBody, PaymentRequestBody,
	PaymentResponseBody,
};

sol! {
	#[sol(rpc)]
	interface IFdcHub {
		function requestAttestation(bytes calldata _data) external payable;
	}

	#[derive(Debug, PartialEq, Eq)]
	struct EvmRequestBody {
		bytes32 transactionHash;
		uint16 requiredConfirmations;
		bool provideInput;
		bool listEvents;
		uint32[] logIndices;
	}

	#[derive(Debug, PartialEq, Eq)]
	struct EvmEventData {
		uint32 logIndex;
		address emitterAddress;
		bytes32[] topics;
		bytes data;
		bool removed;
	}

	#[derive(Debug, PartialEq, Eq)]
	struct EvmResponseBody {
		uint64 blockNumber;
		uint64 timestamp;
		address sourceAddress;
		bool isDeployment;
		address receivingAddress;
		uint256 value;
		bytes input;
		uint8 status;
		EvmEventData[] events;
	}

	#[derive(Debug, PartialEq, Eq)]
	struct EvmResponse {
		bytes32 attestationType;
		bytes32 sourceId;
		uint64 votingRound;
		uint64 lowestUsedTimestamp;
		EvmRequestBody requestBody;
		EvmResponseBody responseBody;
	}

	#[derive(Debug, PartialEq, Eq)]
	struct EvmProof {
		bytes32[] merkleProof;
		EvmResponse data;
	}

	#[derive(Debug, PartialEq, Eq)]
	struct PaymentRequestData {
		bytes32 transactionId;
		uint256 inUtxo;
		uint256 utxo;
	}

	#[derive(Debug, PartialEq, Eq)]
	struct PaymentResponseData {
		uint64 blockNumber;
		uint64 blockTimestamp;
		bytes32 sourceAddressHash;
		bytes32 sourceAddressesRoot;
		bytes32 receivingAddressHash;
		bytes32 intendedReceivingAddressHash;
		int256 spentAmount;
		int256 intendedSpentAmount;
		int256 receivedAmount;
		int256 intendedReceivedAmount;
		bytes32 standardPaymentReference;
		bool oneToOne;
		uint8 status;
	}

	#[derive(Debug, PartialEq, Eq)]
	struct PaymentResponse {
		bytes32 attestationType;
		bytes32 sourceId;
		uint64 votingRound;
		uint64 lowestUsedTimestamp;
		PaymentRequestData requestBody;
		PaymentResponseData responseBody;
	}

	#[derive(Debug, PartialEq, Eq)]
	struct PaymentProof {
		bytes32[] merkleProof;
		PaymentResponse data;
	}

	#[sol(rpc)]
	interface IFdcVerification {
		function verifyEVMTransaction(EvmProof calldata _proof) external view returns (bool _proved);
		function verifyPayment(PaymentProof calldata _proof) external view returns (bool _proved);
	}

	interface IERC20 {
		event Transfer(address indexed from, address indexed to, uint256 value);
	}
}

pub use IERC20::Transfer;

impl From<&EvmTransactionRequestBody> for EvmRequestBody {
	fn from(body: &EvmTransactionRequestBody) -> Self {
		Self {
			transactionHash: body.transaction_hash,
			requiredConfirmations: body.required_confirmations,
			provideInput: body.provide_input,
			listEvents: body.list_events,
			logIndices: body.log_indices.clone(),
		}
	}
}

impl From<&EvmEvent> for EvmEventData {
	fn from(event: &EvmEvent) -> Self {
		Self {
			logIndex: event.log_index,
			emitterAddress: event.emitter_address,
			topics: event.topics.clone(),
			data: event.data.clone(),
			removed: event.removed,
		}
	}
}

impl From<&EvmTransactionResponseBody> for EvmResponseBody {
	fn from(body: &EvmTransactionResponseBody) -> Self {
		Self {
			blockNumber: body.block_number,
			timestamp: body.timestamp,
			sourceAddress: body.source_address,
			isDeployment: body.is_deployment,
			receivingAddress: body.receiving_address,
			value: body.value,
			input: body.input.clone(),
			status: body.status,
			events: body.events.iter().map(EvmEventData::from).collect(),
		}
	}
}

impl From<&PaymentRequestBody> for PaymentRequestData {
	fn from(body: &PaymentRequestBody) -> Self {
		Self {
			transactionId: body.transaction_id,
			inUtxo: body.in_utxo,
			utxo: body.utxo,
		}
	}
}

impl From<&PaymentResponseBody> for PaymentResponseData {
	fn from(body: &PaymentResponseBody) -> Self {
		Self {
			blockNumber: body.block_number,
			blockTimestamp: body.block_timestamp,
			sourceAddressHash: body.source_address_hash,
			sourceAddressesRoot: body.source_addresses_root,
			receivingAddressHash: body.receiving_address_hash,
			intendedReceivingAddressHash: body.intended_receiving_address_hash,
			spentAmount: body.spent_amount,
			intendedSpentAmount: body.intended_spent_amount,
			receivedAmount: body.received_amount,
			intendedReceivedAmount: body.intended_received_amount,
			standardPaymentReference: body.standard_payment_reference,
			oneToOne: body.one_to_one,
			status: body.status,
		}
	}
}

/// A proof in the contract's calldata layout.
#[derive(Debug, PartialEq, Eq)]
pub enum AbiProof {
	EvmTransaction(EvmProof),
	Payment(PaymentProof),
}

impl TryFrom<&AttestationProof> for AbiProof {
	type Error = AttestationError;

	fn try_from(proof: &AttestationProof) -> Result<Self, Self::Error> {
		let response = proof.response();
		let merkle_proof = proof.merkle_proof().to_vec();
		match (response.request_body(), response.response_body()) {
			(RequestBody::EvmTransaction(request), ResponseBody::EvmTransaction(body)) => {
				Ok(AbiProof::EvmTransaction(EvmProof {
					merkleProof: merkle_proof,
					data: EvmResponse {
						attestationType: response.attestation_type(),
						sourceId: response.source_id(),
						votingRound: response.voting_round(),
						lowestUsedTimestamp: response.lowest_used_timestamp(),
						requestBody: request.into(),
						responseBody: body.into(),
					},
				}))
			},
			(RequestBody::Payment(request), ResponseBody::Payment(body)) => {
				Ok(AbiProof::Payment(PaymentProof {
					merkleProof: merkle_proof,
					data: PaymentResponse {
						attestationType: response.attestation_type(),
						sourceId: response.source_id(),
						votingRound: response.voting_round(),
						lowestUsedTimestamp: response.lowest_used_timestamp(),
						requestBody: request.into(),
						responseBody: body.into(),
					},
				}))
			},
			_ => Err(AttestationError::VerificationCall {
				round_id: response.voting_round(),
				reason: "request and response bodies are of different attestation kinds".into(),
			}),
		}
	}
}
