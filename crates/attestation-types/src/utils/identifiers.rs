//! Fixed-width protocol identifiers.
//!
//! The oracle identifies attestation types and source chains by their ASCII
//! names packed into a `bytes32`, left aligned and zero padded on the right.
//! `"EVMTransaction"` becomes `0x45564d5472616e73616374696f6e0000…`.

use alloy_primitives::B256;

/// Packs an ASCII name into a right-padded `bytes32`.
///
/// Names longer than 32 bytes are truncated. Chain identifiers are length
/// checked when parsed, so only a hand-built name can reach that case.
pub fn encode_fixed_ascii(name: &str) -> B256 {
	let mut word = [0u8; 32];
	let bytes = name.as_bytes();
	let len = bytes.len().min(32);
	word[..len].copy_from_slice(&bytes[..len]);
	B256::from(word)
}

/// Recovers the ASCII name from a right-padded `bytes32`.
///
/// Returns `None` when the non-padding bytes are not valid UTF-8.
pub fn decode_fixed_ascii(word: &B256) -> Option<String> {
	let end = word
		.iter()
		.rposition(|&b| b != 0)
		.map(|i| i + 1)
		.unwrap_or(0);
	std::str::from_utf8(&word[..end]).ok().map(str::to_string)
}
