//! Request lifecycle records.
//!
//! An [`AttestationRequest`] is created once per `(chain, transaction)` pair.
//! Preparation turns it into a [`PreparedRequest`], which submission consumes
//! and turns into an [`AttestationResponse`] carrying the voting round.

use crate::chains::{select_attestation_kind, AttestationKind, SourceChain};
use alloy_primitives::{Bytes, B256};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors raised when building an attestation request.
#[derive(Debug, Error)]
pub enum RequestError {
	/// Confirmations must be at least one.
	#[error("required confirmations must be positive")]
	ZeroConfirmations,
}

/// A request for the oracle to attest one transaction on one chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RequestFields")]
pub struct AttestationRequest {
	attestation_kind: AttestationKind,
	source_chain: SourceChain,
	transaction_hash: B256,
	required_confirmations: u16,
}

/// Unchecked wire form, validated through [`AttestationRequest::with_kind`].
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RequestFields {
	attestation_kind: AttestationKind,
	source_chain: SourceChain,
	transaction_hash: B256,
	required_confirmations: u16,
}

impl TryFrom<RequestFields> for AttestationRequest {
	type Error = RequestError;

	fn try_from(fields: RequestFields) -> Result<Self, Self::Error> {
		Self::with_kind(
			fields.attestation_kind,
			fields.source_chain,
			fields.transaction_hash,
			fields.required_confirmations,
		)
	}
}

impl AttestationRequest {
	/// Creates a request, selecting the attestation kind from the chain.
	pub fn new(
		source_chain: SourceChain,
		transaction_hash: B256,
		required_confirmations: u16,
	) -> Result<Self, RequestError> {
		let kind = select_attestation_kind(&source_chain);
		Self::with_kind(kind, source_chain, transaction_hash, required_confirmations)
	}

	/// Creates a request with an explicitly chosen attestation kind.
	pub fn with_kind(
		attestation_kind: AttestationKind,
		source_chain: SourceChain,
		transaction_hash: B256,
		required_confirmations: u16,
	) -> Result<Self, RequestError> {
		if required_confirmations == 0 {
			return Err(RequestError::ZeroConfirmations);
		}
		Ok(Self {
			attestation_kind,
			source_chain,
			transaction_hash,
			required_confirmations,
		})
	}

	pub fn attestation_kind(&self) -> AttestationKind {
		self.attestation_kind
	}

	pub fn source_chain(&self) -> &SourceChain {
		&self.source_chain
	}

	pub fn transaction_hash(&self) -> B256 {
		self.transaction_hash
	}

	pub fn required_confirmations(&self) -> u16 {
		self.required_confirmations
	}
}

/// Validity verdict returned by the verifier service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
	Valid,
	Invalid,
	Unsupported,
}

impl RequestStatus {
	/// Interprets the verifier's status string.
	///
	/// Verifiers append detail to negative verdicts (`INVALID: ...`), so only
	/// the prefix is matched. Unknown verdicts are reported as unsupported.
	pub fn from_verifier(status: &str) -> Self {
		let status = status.trim().to_ascii_uppercase();
		if status == "VALID" {
			RequestStatus::Valid
		} else if status.starts_with("INVALID") {
			RequestStatus::Invalid
		} else {
			if !status.starts_with("UNSUPPORTED") {
				tracing::warn!(status = %status, "Unrecognized verifier status");
			}
			RequestStatus::Unsupported
		}
	}

	pub fn is_valid(&self) -> bool {
		matches!(self, RequestStatus::Valid)
	}
}

impl fmt::Display for RequestStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			RequestStatus::Valid => f.write_str("VALID"),
			RequestStatus::Invalid => f.write_str("INVALID"),
			RequestStatus::Unsupported => f.write_str("UNSUPPORTED"),
		}
	}
}

/// An ABI-encoded request ready for submission to the hub contract.
///
/// Deliberately not `Clone`: a prepared request is submitted at most once.
#[derive(Debug, PartialEq, Eq)]
pub struct PreparedRequest {
	pub encoded_request: Bytes,
	pub status: RequestStatus,
}

/// A request accepted by the hub contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttestationResponse {
	/// Voting round the submission falls into.
	pub round_id: u64,
	pub encoded_request: Bytes,
	pub status: RequestStatus,
	/// Hash of the submission transaction.
	pub transaction_hash: B256,
	/// Block that confirmed the submission.
	pub block_number: u64,
}
