//! Domain fields extracted from verified EVM transactions.

use crate::abi::Transfer;
use alloy::sol_types::SolEvent;
use attestation_types::{Address, EvmEvent, U256};
use serde::Serialize;

/// An ERC-20 transfer emitted by an attested transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenTransfer {
	/// Contract that emitted the event.
	pub token: Address,
	pub from: Address,
	pub to: Address,
	#[serde(with = "attestation_types::serde_helpers::u256")]
	pub amount: U256,
}

/// Decodes every ERC-20 `Transfer` in `events`, in log order.
///
/// ERC-721 transfers share the signature but index the token id as a fourth
/// topic; they are skipped along with removed logs.
pub fn token_transfers(events: &[EvmEvent]) -> Vec<TokenTransfer> {
	events.iter().filter_map(decode_transfer).collect()
}

fn decode_transfer(event: &EvmEvent) -> Option<TokenTransfer> {
	if event.removed || event.topics.len() != 3 || event.data.len() != 32 {
		return None;
	}
	if event.topics[0] != Transfer::SIGNATURE_HASH {
		return None;
	}
	Some(TokenTransfer {
		token: event.emitter_address,
		from: Address::from_word(event.topics[1]),
		to: Address::from_word(event.topics[2]),
		amount: U256::from_be_slice(&event.data),
	})
}
