use crate::err_create;
use crate::error::{CancelledError, TrackerError};
use std::future::Future;
use tokio_util::sync::CancellationToken;

/// Runs the future until it completes or the token is cancelled, whichever comes first.
/// Cancellation wins when both are ready.
pub async fn with_cancel<T, F>(
    cancel: &CancellationToken,
    operation: &str,
    fut: F,
) -> Result<T, TrackerError>
where
    F: Future<Output = Result<T, TrackerError>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            log::debug!("{} cancelled", operation);
            Err(err_create!(CancelledError::new(operation)))
        }
        res = fut => res,
    }
}
