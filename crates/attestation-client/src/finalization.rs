//! Waiting for a voting round to end.

use crate::clock::{RoundClock, TimeSource};
use crate::wait::sleep_or_cancel;
use crate::AttestationError;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Polls the wall clock until a round's window has closed.
///
/// Finalization is inferred from the clock alone; the proof retriever
/// tolerates the short lag between the window closing and the proof
/// becoming available.
pub struct FinalizationWaiter {
	clock: RoundClock,
	time: Arc<dyn TimeSource>,
	poll_interval: Duration,
}

impl FinalizationWaiter {
	pub fn new(clock: RoundClock, time: Arc<dyn TimeSource>, poll_interval: Duration) -> Self {
		Self {
			clock,
			time,
			poll_interval,
		}
	}

	/// Returns once `now >= round_end(round_id)`, or fails after `timeout`.
	pub async fn await_finalization(
		&self,
		round_id: u64,
		timeout: Duration,
		cancel: &CancellationToken,
	) -> Result<(), AttestationError> {
		let round_end = self.clock.round_end(round_id);
		let start_time = tokio::time::Instant::now();

		loop {
			let now = self.time.now_unix();
			if now >= round_end {
				tracing::info!(
					round_id,
					waited_secs = start_time.elapsed().as_secs(),
					"Voting round finalized"
				);
				return Ok(());
			}

			let elapsed = start_time.elapsed();
			if elapsed >= timeout {
				tracing::warn!(
					round_id,
					round_end,
					waited_secs = elapsed.as_secs(),
					"Timed out waiting for voting round to end"
				);
				return Err(AttestationError::FinalizationTimeout {
					round_id,
					waited_secs: elapsed.as_secs(),
				});
			}

			tracing::debug!(
				round_id,
				remaining_secs = round_end - now,
				"Waiting for voting round to end"
			);
			sleep_or_cancel(self.poll_interval.min(timeout - elapsed), cancel).await?;
		}
	}
}
