//! Cancellable waits shared by the blocking stages.

use crate::AttestationError;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Sleeps for `duration` unless `cancel` fires first.
pub(crate) async fn sleep_or_cancel(
	duration: Duration,
	cancel: &CancellationToken,
) -> Result<(), AttestationError> {
	tokio::select! {
		_ = cancel.cancelled() => Err(AttestationError::Cancelled),
		_ = tokio::time::sleep(duration) => Ok(()),
	}
}

/// Runs `fut` to completion unless `cancel` fires first.
pub(crate) async fn run_or_cancel<F, T>(
	fut: F,
	cancel: &CancellationToken,
) -> Result<T, AttestationError>
where
	F: Future<Output = Result<T, AttestationError>>,
{
	tokio::select! {
		_ = cancel.cancelled() => Err(AttestationError::Cancelled),
		result = fut => result,
	}
}

/// Returns a child of `cancel` that is also cancelled once `deadline` passes.
///
/// Cancelling the parent still cancels the child. The timer task ends with
/// whichever fires first.
pub fn cancel_after(cancel: &CancellationToken, deadline: Duration) -> CancellationToken {
	let child = cancel.child_token();
	let timer = child.clone();
	tokio::spawn(async move {
		tokio::select! {
			_ = timer.cancelled() => {},
			_ = tokio::time::sleep(deadline) => {
				tracing::warn!(deadline_secs = deadline.as_secs(), "Attestation deadline reached");
				timer.cancel();
			},
		}
	});
	child
}
