//! Source chains and attestation kinds.
//!
//! The oracle attests to transactions on a fixed set of external chains. Each
//! recognized chain maps, through exhaustive matches, to its protocol source
//! id, the short name used in verifier endpoint paths, and the attestation
//! kind its execution model requires. Identifiers that match no recognized
//! chain parse into [`SourceChain::Unlisted`], which has its own explicit arm
//! in every mapping.

use crate::utils::encode_fixed_ascii;
use alloy_primitives::B256;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The kind of fact the oracle is asked to certify.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttestationKind {
	/// A transaction on an EVM-compatible chain, with input data and event logs.
	#[serde(rename = "EVMTransaction")]
	EvmTransaction,
	/// A value transfer on a UTXO- or ledger-based chain.
	#[serde(rename = "Payment")]
	Payment,
}

impl AttestationKind {
	/// Protocol name, used in endpoint paths and as the attestation type id.
	pub fn name(&self) -> &'static str {
		match self {
			AttestationKind::EvmTransaction => "EVMTransaction",
			AttestationKind::Payment => "Payment",
		}
	}

	/// The `bytes32` attestation type identifier.
	pub fn type_id(&self) -> B256 {
		encode_fixed_ascii(self.name())
	}

	/// Resolves a `bytes32` attestation type identifier back to a kind.
	pub fn from_type_id(id: &B256) -> Option<Self> {
		[AttestationKind::EvmTransaction, AttestationKind::Payment]
			.into_iter()
			.find(|kind| kind.type_id() == *id)
	}
}

impl fmt::Display for AttestationKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name())
	}
}

/// Error returned when an attestation kind name is not recognized.
#[derive(Debug, Error)]
#[error("Unknown attestation kind: {0}")]
pub struct ParseKindError(pub String);

impl FromStr for AttestationKind {
	type Err = ParseKindError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"evmtransaction" | "evm" => Ok(AttestationKind::EvmTransaction),
			"payment" => Ok(AttestationKind::Payment),
			_ => Err(ParseKindError(s.to_string())),
		}
	}
}

/// An external chain the oracle can attest to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SourceChain {
	Ethereum,
	Sepolia,
	Flare,
	Coston2,
	Songbird,
	Coston,
	Bitcoin,
	BitcoinTestnet,
	Dogecoin,
	DogecoinTestnet,
	Xrpl,
	XrplTestnet,
	/// An identifier that matched no recognized chain, kept verbatim.
	/// Parsing admits only 1 to 32 ASCII alphanumerics, so the name fits the
	/// `bytes32` source id and is safe in a URL path.
	Unlisted(String),
}

impl SourceChain {
	/// All recognized chains, in declaration order.
	pub const RECOGNIZED: [SourceChain; 12] = [
		SourceChain::Ethereum,
		SourceChain::Sepolia,
		SourceChain::Flare,
		SourceChain::Coston2,
		SourceChain::Songbird,
		SourceChain::Coston,
		SourceChain::Bitcoin,
		SourceChain::BitcoinTestnet,
		SourceChain::Dogecoin,
		SourceChain::DogecoinTestnet,
		SourceChain::Xrpl,
		SourceChain::XrplTestnet,
	];

	/// Protocol source id name (`ETH`, `testETH`, ...).
	pub fn source_id_name(&self) -> &str {
		match self {
			SourceChain::Ethereum => "ETH",
			SourceChain::Sepolia => "testETH",
			SourceChain::Flare => "FLR",
			SourceChain::Coston2 => "testFLR",
			SourceChain::Songbird => "SGB",
			SourceChain::Coston => "testSGB",
			SourceChain::Bitcoin => "BTC",
			SourceChain::BitcoinTestnet => "testBTC",
			SourceChain::Dogecoin => "DOGE",
			SourceChain::DogecoinTestnet => "testDOGE",
			SourceChain::Xrpl => "XRP",
			SourceChain::XrplTestnet => "testXRP",
			SourceChain::Unlisted(name) => name,
		}
	}

	/// The `bytes32` source id.
	pub fn source_id(&self) -> B256 {
		encode_fixed_ascii(self.source_id_name())
	}

	/// Short name used in verifier endpoint paths.
	///
	/// Mainnets and testnets share a short name; the verifier deployment
	/// (base URL) decides which network is served.
	pub fn short_name(&self) -> String {
		match self {
			SourceChain::Ethereum | SourceChain::Sepolia => "eth".to_string(),
			SourceChain::Flare | SourceChain::Coston2 => "flr".to_string(),
			SourceChain::Songbird | SourceChain::Coston => "sgb".to_string(),
			SourceChain::Bitcoin | SourceChain::BitcoinTestnet => "btc".to_string(),
			SourceChain::Dogecoin | SourceChain::DogecoinTestnet => "doge".to_string(),
			SourceChain::Xrpl | SourceChain::XrplTestnet => "xrp".to_string(),
			SourceChain::Unlisted(name) => {
				let lower = name.to_ascii_lowercase();
				lower
					.strip_prefix("test")
					.map(str::to_string)
					.unwrap_or(lower)
			}
		}
	}

	/// Whether the chain executes EVM transactions.
	///
	/// `None` for unlisted chains: their execution model is unknown.
	pub fn is_evm(&self) -> Option<bool> {
		match self {
			SourceChain::Ethereum
			| SourceChain::Sepolia
			| SourceChain::Flare
			| SourceChain::Coston2
			| SourceChain::Songbird
			| SourceChain::Coston => Some(true),
			SourceChain::Bitcoin
			| SourceChain::BitcoinTestnet
			| SourceChain::Dogecoin
			| SourceChain::DogecoinTestnet
			| SourceChain::Xrpl
			| SourceChain::XrplTestnet => Some(false),
			SourceChain::Unlisted(_) => None,
		}
	}
}

impl fmt::Display for SourceChain {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.source_id_name())
	}
}

/// Error returned when an unrecognized chain identifier cannot be kept as
/// [`SourceChain::Unlisted`].
#[derive(Debug, Error)]
#[error("Invalid chain identifier '{0}': expected 1 to 32 ASCII letters or digits")]
pub struct ParseChainError(pub String);

impl FromStr for SourceChain {
	type Err = ParseChainError;

	/// Parses a source id name or common alias, case-insensitively.
	///
	/// Unrecognized identifiers become [`SourceChain::Unlisted`] when they are
	/// 1 to 32 ASCII alphanumerics, and are rejected otherwise.
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let chain = match s.trim().to_ascii_lowercase().as_str() {
			"eth" | "ethereum" | "mainnet" => SourceChain::Ethereum,
			"testeth" | "sepolia" => SourceChain::Sepolia,
			"flr" | "flare" => SourceChain::Flare,
			"testflr" | "coston2" => SourceChain::Coston2,
			"sgb" | "songbird" => SourceChain::Songbird,
			"testsgb" | "coston" => SourceChain::Coston,
			"btc" | "bitcoin" => SourceChain::Bitcoin,
			"testbtc" | "bitcoin-testnet" => SourceChain::BitcoinTestnet,
			"doge" | "dogecoin" => SourceChain::Dogecoin,
			"testdoge" | "dogecoin-testnet" => SourceChain::DogecoinTestnet,
			"xrp" | "xrpl" => SourceChain::Xrpl,
			"testxrp" | "xrpl-testnet" => SourceChain::XrplTestnet,
			_ => {
				let name = s.trim();
				if name.is_empty()
					|| name.len() > 32
					|| !name.bytes().all(|b| b.is_ascii_alphanumeric())
				{
					return Err(ParseChainError(s.to_string()));
				}
				SourceChain::Unlisted(name.to_string())
			},
		};
		Ok(chain)
	}
}

impl Serialize for SourceChain {
	fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_str(self.source_id_name())
	}
}

impl<'de> Deserialize<'de> for SourceChain {
	fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		String::deserialize(deserializer)?
			.parse()
			.map_err(serde::de::Error::custom)
	}
}

/// Selects the attestation kind for a source chain.
///
/// EVM chains select `EVMTransaction`, recognized non-EVM chains select
/// `Payment`. Unlisted chains fall back to `EVMTransaction` with a warning:
/// the fallback keeps unconfigured chains working but may pick the wrong kind,
/// so every occurrence needs operator review.
pub fn select_attestation_kind(chain: &SourceChain) -> AttestationKind {
	match chain.is_evm() {
		Some(true) => AttestationKind::EvmTransaction,
		Some(false) => AttestationKind::Payment,
		None => {
			tracing::warn!(
				chain = %chain,
				"Chain is not in either attestation allow-list, defaulting to EVMTransaction; review required"
			);
			AttestationKind::EvmTransaction
		}
	}
}
