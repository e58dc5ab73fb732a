//! Usage: Run synchronous storage work on the tokio blocking pool.

use super::error::UsageError;

/// Runs `f` via `spawn_blocking`. Errors from `f` pass through untouched; only a
/// panicked or cancelled task is mapped to [`UsageError::TaskFailed`].
pub async fn run<T, F>(label: &'static str, f: F) -> Result<T, UsageError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, UsageError> + Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(result) => result,
        Err(err) => {
            tracing::error!(label, error = %err, "blocking task failed");
            Err(UsageError::TaskFailed {
                label,
                message: err.to_string(),
            })
        }
    }
}
