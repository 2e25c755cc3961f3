//! Attestation proofs as distributed by the data-availability service.
//!
//! An [`AttestationProof`] keeps its response body private. The body only
//! becomes readable through a [`VerifiedAttestation`], which this crate
//! constructs after the verification contract accepted the proof.

use crate::extract::{token_transfers, TokenTransfer};
use crate::ProofFetchError;
use attestation_types::serde_helpers;
use attestation_types::{
	AttestationKind, EvmTransactionRequestBody, EvmTransactionResponseBody, PaymentRequestBody,
	PaymentResponseBody, B256,
};
use serde::{Deserialize, Serialize};

/// Request body of a proven response, by attestation kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RequestBody {
	EvmTransaction(EvmTransactionRequestBody),
	Payment(PaymentRequestBody),
}

/// Response body of a proven response, by attestation kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ResponseBody {
	EvmTransaction(EvmTransactionResponseBody),
	Payment(PaymentResponseBody),
}

/// The response tuple committed to in a voting round's Merkle root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofResponse {
	attestation_type: B256,
	source_id: B256,
	voting_round: u64,
	lowest_used_timestamp: u64,
	request_body: RequestBody,
	response_body: ResponseBody,
}

impl ProofResponse {
	pub fn attestation_type(&self) -> B256 {
		self.attestation_type
	}

	pub fn source_id(&self) -> B256 {
		self.source_id
	}

	pub fn voting_round(&self) -> u64 {
		self.voting_round
	}

	pub fn lowest_used_timestamp(&self) -> u64 {
		self.lowest_used_timestamp
	}

	pub fn request_body(&self) -> &RequestBody {
		&self.request_body
	}

	pub(crate) fn response_body(&self) -> &ResponseBody {
		&self.response_body
	}
}

/// A response and its Merkle inclusion path. Not yet verified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttestationProof {
	response: ProofResponse,
	merkle_proof: Vec<B256>,
}

impl AttestationProof {
	pub fn response(&self) -> &ProofResponse {
		&self.response
	}

	/// Merkle path nodes, in the order the DA service returned them.
	pub fn merkle_proof(&self) -> &[B256] {
		&self.merkle_proof
	}

	pub fn round_id(&self) -> u64 {
		self.response.voting_round
	}

	pub fn kind(&self) -> AttestationKind {
		match self.response.response_body {
			ResponseBody::EvmTransaction(_) => AttestationKind::EvmTransaction,
			ResponseBody::Payment(_) => AttestationKind::Payment,
		}
	}
}

/// A proof the verification contract accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedAttestation {
	proof: AttestationProof,
}

impl VerifiedAttestation {
	pub(crate) fn new(proof: AttestationProof) -> Self {
		Self { proof }
	}

	pub fn proof(&self) -> &AttestationProof {
		&self.proof
	}

	pub fn round_id(&self) -> u64 {
		self.proof.round_id()
	}

	pub fn response_body(&self) -> &ResponseBody {
		self.proof.response.response_body()
	}

	pub fn evm_transaction(&self) -> Option<&EvmTransactionResponseBody> {
		match self.response_body() {
			ResponseBody::EvmTransaction(body) => Some(body),
			ResponseBody::Payment(_) => None,
		}
	}

	pub fn payment(&self) -> Option<&PaymentResponseBody> {
		match self.response_body() {
			ResponseBody::Payment(body) => Some(body),
			ResponseBody::EvmTransaction(_) => None,
		}
	}

	/// ERC-20 transfers emitted by the attested transaction. Empty for payments.
	pub fn token_transfers(&self) -> Vec<TokenTransfer> {
		self.evm_transaction()
			.map(|body| token_transfers(&body.events))
			.unwrap_or_default()
	}
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawResponse {
	attestation_type: B256,
	source_id: B256,
	#[serde(with = "serde_helpers::uint")]
	voting_round: u64,
	#[serde(with = "serde_helpers::uint")]
	lowest_used_timestamp: u64,
	request_body: serde_json::Value,
	response_body: serde_json::Value,
}

/// Decodes the DA service's `{proof, response}` envelope.
///
/// Missing fields and an empty path mean the proof is not available yet;
/// fields that are present but do not decode are malformed.
pub(crate) fn decode_envelope(
	mut envelope: serde_json::Value,
) -> Result<AttestationProof, ProofFetchError> {
	let proof = envelope.get_mut("proof").map(serde_json::Value::take);
	let response = envelope.get_mut("response").map(serde_json::Value::take);

	let (proof, response) = match (proof, response) {
		(Some(p), Some(r)) if !p.is_null() && !r.is_null() => (p, r),
		_ => {
			return Err(ProofFetchError::NotAvailable(
				"response lacks proof or response".into(),
			))
		},
	};

	let merkle_proof: Vec<B256> = serde_json::from_value(proof)
		.map_err(|e| ProofFetchError::Malformed(format!("proof: {}", e)))?;
	if merkle_proof.is_empty() {
		return Err(ProofFetchError::NotAvailable("proof is empty".into()));
	}

	let raw: RawResponse = serde_json::from_value(response)
		.map_err(|e| ProofFetchError::Malformed(format!("response: {}", e)))?;
	let kind = AttestationKind::from_type_id(&raw.attestation_type).ok_or_else(|| {
		ProofFetchError::Malformed(format!("unknown attestation type {}", raw.attestation_type))
	})?;

	let (request_body, response_body) = match kind {
		AttestationKind::EvmTransaction => (
			RequestBody::EvmTransaction(decode_body(raw.request_body, "requestBody")?),
			ResponseBody::EvmTransaction(decode_body(raw.response_body, "responseBody")?),
		),
		AttestationKind::Payment => (
			RequestBody::Payment(decode_body(raw.request_body, "requestBody")?),
			ResponseBody::Payment(decode_body(raw.response_body, "responseBody")?),
		),
	};

	Ok(AttestationProof {
		response: ProofResponse {
			attestation_type: raw.attestation_type,
			source_id: raw.source_id,
			voting_round: raw.voting_round,
			lowest_used_timestamp: raw.lowest_used_timestamp,
			request_body,
			response_body,
		},
		merkle_proof,
	})
}

fn decode_body<T: serde::de::DeserializeOwned>(
	value: serde_json::Value,
	field: &str,
) -> Result<T, ProofFetchError> {
	serde_json::from_value(value).map_err(|e| ProofFetchError::Malformed(format!("{}: {}", field, e)))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::test_utils::{evm_proof_json, payment_proof_json};
	use attestation_types::{SourceChain, U256};
	use serde_json::json;

	#[test]
	fn test_decode_evm_envelope() {
		let proof = decode_envelope(evm_proof_json(12345)).unwrap();
		assert_eq!(proof.round_id(), 12345);
		assert_eq!(proof.kind(), AttestationKind::EvmTransaction);
		assert_eq!(proof.merkle_proof().len(), 2);
		assert_eq!(proof.response().source_id(), SourceChain::Sepolia.source_id());
		assert_eq!(proof.response().lowest_used_timestamp(), 1700000000);
	}

	#[test]
	fn test_decode_payment_envelope() {
		let proof = decode_envelope(payment_proof_json(77)).unwrap();
		assert_eq!(proof.kind(), AttestationKind::Payment);
		match proof.response().request_body() {
			RequestBody::Payment(body) => assert_eq!(body.utxo, U256::ZERO),
			other => panic!("unexpected body: {other:?}"),
		}
	}

	#[test]
	fn test_missing_fields_are_not_available() {
		let err = decode_envelope(json!({ "status": "pending" })).unwrap_err();
		assert!(matches!(err, ProofFetchError::NotAvailable(_)));

		let err = decode_envelope(json!({ "proof": [], "response": null })).unwrap_err();
		assert!(matches!(err, ProofFetchError::NotAvailable(_)));
	}

	#[test]
	fn test_empty_proof_is_not_available() {
		let mut envelope = evm_proof_json(1);
		envelope["proof"] = json!([]);
		let err = decode_envelope(envelope).unwrap_err();
		assert!(matches!(err, ProofFetchError::NotAvailable(_)));
	}

	#[test]
	fn test_undecodable_response_is_malformed() {
		let mut envelope = evm_proof_json(1);
		envelope["response"]["responseBody"]["sourceAddress"] = json!("not-an-address");
		let err = decode_envelope(envelope).unwrap_err();
		assert!(matches!(err, ProofFetchError::Malformed(_)));
	}

	#[test]
	fn test_unknown_attestation_type_is_malformed() {
		let mut envelope = evm_proof_json(1);
		envelope["response"]["attestationType"] = json!(format!("0x{}", "ab".repeat(32)));
		let err = decode_envelope(envelope).unwrap_err();
		assert!(matches!(err, ProofFetchError::Malformed(_)));
	}

	#[test]
	fn test_verified_attestation_exposes_body() {
		let verified = VerifiedAttestation::new(decode_envelope(evm_proof_json(5)).unwrap());
		let body = verified.evm_transaction().unwrap();
		assert_eq!(body.block_number, 7654321);
		assert!(verified.payment().is_none());
		assert_eq!(verified.token_transfers().len(), 1);
	}
}
