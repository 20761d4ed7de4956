use std::future::Future;

use crate::error::Result;

/// Runs a non-critical step. A failure is logged and discarded; the caller gets `None`.
pub async fn best_effort<T, F>(operation: &str, future: F) -> Option<T>
where
    F: Future<Output = Result<T>>,
{
    match future.await {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(operation, error = %e, "Best-effort step failed");
            None
        }
    }
}
