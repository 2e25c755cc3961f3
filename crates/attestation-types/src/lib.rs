//! Common types module for the attestation client.
//!
//! This module defines the domain types shared by every crate in the
//! workspace: the source chains the oracle can attest to, the attestation
//! kinds, request and response records, and the strongly typed bodies the
//! oracle certifies.

/// Attested request and response bodies for each attestation kind.
pub mod bodies;
/// Source chains, attestation kinds and the kind selection policy.
pub mod chains;
/// Request lifecycle records: requests, prepared requests, submissions.
pub mod request;
/// Secure string wrapper for signing keys and API tokens.
pub mod secret_string;
/// Serde adapters for the number encodings used by the oracle services.
pub mod serde_helpers;
/// Utility functions for identifiers and display formatting.
pub mod utils;

pub use alloy_primitives::{Address, Bytes, B256, I256, U256};
pub use bodies::*;
pub use chains::{
	select_attestation_kind, AttestationKind, ParseChainError, ParseKindError, SourceChain,
};
pub use request::*;
pub use secret_string::SecretString;
pub use utils::{decode_fixed_ascii, encode_fixed_ascii, truncate_id};
