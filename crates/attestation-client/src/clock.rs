//! Voting round arithmetic.
//!
//! Rounds are consecutive fixed-length windows starting at the epoch origin:
//! round `r` covers `[origin + r * duration, origin + (r + 1) * duration)`.

use crate::AttestationError;
use attestation_config::EpochConfig;

/// Maps timestamps to voting rounds and back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundClock {
	origin: u64,
	duration: u64,
}

impl RoundClock {
	/// Creates a clock, rejecting a zero round duration.
	pub fn new(origin: u64, duration: u64) -> Result<Self, AttestationError> {
		if duration == 0 {
			return Err(AttestationError::Configuration(
				"epoch duration must be greater than 0".into(),
			));
		}
		Ok(Self { origin, duration })
	}

	pub fn from_config(epoch: &EpochConfig) -> Result<Self, AttestationError> {
		Self::new(epoch.origin_timestamp, epoch.duration_seconds)
	}

	pub fn origin(&self) -> u64 {
		self.origin
	}

	pub fn duration(&self) -> u64 {
		self.duration
	}

	/// Round containing `timestamp`. Timestamps before the origin map to round 0.
	pub fn round_id(&self, timestamp: u64) -> u64 {
		timestamp.saturating_sub(self.origin) / self.duration
	}

	/// Half-open `[start, end)` window of a round.
	pub fn round_window(&self, round_id: u64) -> (u64, u64) {
		let start = self
			.origin
			.saturating_add(round_id.saturating_mul(self.duration));
		(start, start.saturating_add(self.duration))
	}

	/// First timestamp after the round, at which finalization is expected.
	pub fn round_end(&self, round_id: u64) -> u64 {
		self.round_window(round_id).1
	}
}

/// Source of wall-clock time in unix seconds.
pub trait TimeSource: Send + Sync {
	fn now_unix(&self) -> u64;
}

/// The system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
	fn now_unix(&self) -> u64 {
		std::time::SystemTime::now()
			.duration_since(std::time::UNIX_EPOCH)
			.map(|d| d.as_secs())
			.unwrap_or(0)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const ORIGIN: u64 = 1658429955;

	fn clock() -> RoundClock {
		RoundClock::new(ORIGIN, 90).unwrap()
	}

	#[test]
	fn test_known_rounds() {
		let clock = clock();
		assert_eq!(clock.round_id(1658429955), 0);
		assert_eq!(clock.round_id(1658430045), 1);
		assert_eq!(clock.round_id(1658430225), 3);
		assert_eq!(clock.round_id(1658430100), 1);
	}

	#[test]
	fn test_round_boundaries() {
		let clock = clock();
		assert_eq!(clock.round_id(ORIGIN + 89), 0);
		assert_eq!(clock.round_id(ORIGIN + 90), 1);
		assert_eq!(clock.round_window(1), (ORIGIN + 90, ORIGIN + 180));
		assert_eq!(clock.round_end(0), ORIGIN + 90);
	}

	#[test]
	fn test_round_id_is_monotonic_and_window_contains_timestamp() {
		let clock = clock();
		let mut previous = 0;
		for t in (ORIGIN..ORIGIN + 2000).step_by(7) {
			let round = clock.round_id(t);
			assert!(round >= previous);
			let (start, end) = clock.round_window(round);
			assert!(start <= t && t < end, "t={t} round={round}");
			previous = round;
		}
	}

	#[test]
	fn test_timestamp_before_origin_saturates() {
		assert_eq!(clock().round_id(ORIGIN - 1000), 0);
	}

	#[test]
	fn test_zero_duration_rejected() {
		assert!(matches!(
			RoundClock::new(ORIGIN, 0),
			Err(AttestationError::Configuration(_))
		));
	}
}
