//! Serde adapters for the number encodings used by the oracle services.
//!
//! The verifier and DA services render integers inconsistently: some fields
//! arrive as JSON numbers, others as decimal strings, and a few as hex
//! strings. These adapters accept all three and serialize integers back as
//! decimal strings, which both services accept.

use alloy_primitives::{I256, U256};
use serde::{de, Deserialize, Deserializer, Serializer};
use std::fmt::Display;

#[derive(Deserialize)]
#[serde(untagged)]
enum RawInteger {
	Unsigned(u64),
	Signed(i64),
	Text(String),
}

fn parse_u64(text: &str) -> Result<u64, String> {
	let text = text.trim();
	match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
		Some(hex) => u64::from_str_radix(hex, 16).map_err(|e| e.to_string()),
		None => text.parse::<u64>().map_err(|e| e.to_string()),
	}
}

/// Fixed-width unsigned integers (`u8` through `u64`).
pub mod uint {
	use super::*;

	pub fn serialize<T: Display, S: Serializer>(value: &T, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.collect_str(value)
	}

	pub fn deserialize<'de, T, D>(deserializer: D) -> Result<T, D::Error>
	where
		D: Deserializer<'de>,
		T: TryFrom<u64>,
		<T as TryFrom<u64>>::Error: Display,
	{
		let value = match RawInteger::deserialize(deserializer)? {
			RawInteger::Unsigned(n) => n,
			RawInteger::Signed(n) => {
				return Err(de::Error::custom(format!("negative value {} for unsigned field", n)))
			}
			RawInteger::Text(s) => parse_u64(&s).map_err(de::Error::custom)?,
		};
		T::try_from(value).map_err(de::Error::custom)
	}
}

/// 256-bit unsigned integers.
pub mod u256 {
	use super::*;

	pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.collect_str(value)
	}

	pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
		match RawInteger::deserialize(deserializer)? {
			RawInteger::Unsigned(n) => Ok(U256::from(n)),
			RawInteger::Signed(n) => Err(de::Error::custom(format!(
				"negative value {} for unsigned field",
				n
			))),
			RawInteger::Text(s) => {
				let s = s.trim();
				match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
					Some(hex) => U256::from_str_radix(hex, 16),
					None => U256::from_str_radix(s, 10),
				}
				.map_err(de::Error::custom)
			}
		}
	}
}

/// 256-bit signed integers.
pub mod i256 {
	use super::*;

	pub fn serialize<S: Serializer>(value: &I256, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.collect_str(value)
	}

	pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<I256, D::Error> {
		let text = match RawInteger::deserialize(deserializer)? {
			RawInteger::Unsigned(n) => n.to_string(),
			RawInteger::Signed(n) => n.to_string(),
			RawInteger::Text(s) => s.trim().to_string(),
		};
		if text.contains("0x") || text.contains("0X") {
			I256::from_hex_str(&text).map_err(de::Error::custom)
		} else {
			I256::from_dec_str(&text).map_err(de::Error::custom)
		}
	}
}
