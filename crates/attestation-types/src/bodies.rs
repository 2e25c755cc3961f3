//! Attested request and response bodies.
//!
//! Field names follow the oracle's JSON rendering (camelCase) and field order
//! follows the verification contract's ABI structs. The request bodies are
//! also what the client sends to the verifier service when preparing a
//! request.

use crate::serde_helpers;
use alloy_primitives::{Address, Bytes, B256, I256, U256};
use serde::{Deserialize, Serialize};

/// Request body of an `EVMTransaction` attestation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvmTransactionRequestBody {
	pub transaction_hash: B256,
	#[serde(with = "serde_helpers::uint")]
	pub required_confirmations: u16,
	pub provide_input: bool,
	pub list_events: bool,
	#[serde(default)]
	pub log_indices: Vec<u32>,
}

impl EvmTransactionRequestBody {
	/// Body requesting input data and all event logs of a transaction.
	pub fn new(transaction_hash: B256, required_confirmations: u16) -> Self {
		Self {
			transaction_hash,
			required_confirmations,
			provide_input: true,
			list_events: true,
			log_indices: Vec::new(),
		}
	}
}

/// An event log emitted by an attested EVM transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvmEvent {
	#[serde(with = "serde_helpers::uint")]
	pub log_index: u32,
	pub emitter_address: Address,
	pub topics: Vec<B256>,
	pub data: Bytes,
	pub removed: bool,
}

/// Response body of an `EVMTransaction` attestation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvmTransactionResponseBody {
	#[serde(with = "serde_helpers::uint")]
	pub block_number: u64,
	#[serde(with = "serde_helpers::uint")]
	pub timestamp: u64,
	pub source_address: Address,
	pub is_deployment: bool,
	pub receiving_address: Address,
	#[serde(with = "serde_helpers::u256")]
	pub value: U256,
	pub input: Bytes,
	#[serde(with = "serde_helpers::uint")]
	pub status: u8,
	#[serde(default)]
	pub events: Vec<EvmEvent>,
}

/// Request body of a `Payment` attestation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequestBody {
	pub transaction_id: B256,
	#[serde(with = "serde_helpers::u256")]
	pub in_utxo: U256,
	#[serde(with = "serde_helpers::u256")]
	pub utxo: U256,
}

impl PaymentRequestBody {
	/// Body for a payment, with zero placeholders for the UTXO indices.
	pub fn new(transaction_id: B256) -> Self {
		Self {
			transaction_id,
			in_utxo: U256::ZERO,
			utxo: U256::ZERO,
		}
	}
}

/// Response body of a `Payment` attestation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResponseBody {
	#[serde(with = "serde_helpers::uint")]
	pub block_number: u64,
	#[serde(with = "serde_helpers::uint")]
	pub block_timestamp: u64,
	pub source_address_hash: B256,
	pub source_addresses_root: B256,
	pub receiving_address_hash: B256,
	pub intended_receiving_address_hash: B256,
	#[serde(with = "serde_helpers::i256")]
	pub spent_amount: I256,
	#[serde(with = "serde_helpers::i256")]
	pub intended_spent_amount: I256,
	#[serde(with = "serde_helpers::i256")]
	pub received_amount: I256,
	#[serde(with = "serde_helpers::i256")]
	pub intended_received_amount: I256,
	pub standard_payment_reference: B256,
	pub one_to_one: bool,
	#[serde(with = "serde_helpers::uint")]
	pub status: u8,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_evm_request_body_json() {
		let body = EvmTransactionRequestBody::new(B256::repeat_byte(0x11), 3);
		let json = serde_json::to_value(&body).unwrap();
		assert_eq!(json["requiredConfirmations"], "3");
		assert_eq!(json["provideInput"], true);
		assert_eq!(json["listEvents"], true);
		assert_eq!(json["logIndices"], serde_json::json!([]));
		assert_eq!(
			json["transactionHash"],
			format!("0x{}", "11".repeat(32))
		);
	}

	#[test]
	fn test_payment_request_placeholders() {
		let body = PaymentRequestBody::new(B256::repeat_byte(0xab));
		let json = serde_json::to_value(&body).unwrap();
		assert_eq!(json["inUtxo"], "0");
		assert_eq!(json["utxo"], "0");
	}

	#[test]
	fn test_evm_response_body_parses_string_numbers() {
		let json = serde_json::json!({
			"blockNumber": "7654321",
			"timestamp": 1700000000,
			"sourceAddress": "0x00000000000000000000000000000000000000a1",
			"isDeployment": false,
			"receivingAddress": "0x00000000000000000000000000000000000000b2",
			"value": "1000",
			"input": "0x",
			"status": "1",
			"events": [{
				"logIndex": "0",
				"emitterAddress": "0x00000000000000000000000000000000000000c3",
				"topics": [],
				"data": "0x",
				"removed": false
			}]
		});
		let body: EvmTransactionResponseBody = serde_json::from_value(json).unwrap();
		assert_eq!(body.block_number, 7654321);
		assert_eq!(body.value, U256::from(1000));
		assert_eq!(body.status, 1);
		assert_eq!(body.events.len(), 1);
	}
}
