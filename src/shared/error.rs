//! Usage: Error taxonomy shared by the usage query, the report, and their storage/routing adapters.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum UsageError {
    /// Continuation token did not parse into `target|site|page_id`.
    #[error("SEC_INVALID_INPUT: malformed cursor: {0}")]
    MalformedCursor(String),

    #[error("SEC_INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// The report was asked to run on a node that does not own the usage data.
    /// Routing upstream should make this unreachable.
    #[error("INTERNAL_ERROR: most globally linked files report should only be processed on the canonical data owner")]
    UnroutableReport,

    #[error("DB_ERROR: {0}")]
    StorageUnavailable(#[from] rusqlite::Error),

    #[error("DB_ERROR: failed to get connection from pool: {0}")]
    PoolUnavailable(#[from] r2d2::Error),

    #[error("DB_SCHEMA: {0}")]
    Schema(String),

    #[error("CONFIG_ERROR: {0}")]
    Config(String),

    #[error("TASK_ERROR: blocking task {label} failed: {message}")]
    TaskFailed { label: &'static str, message: String },
}

impl UsageError {
    /// True for errors caused by caller input rather than the environment.
    pub fn is_input_rejection(&self) -> bool {
        matches!(self, Self::MalformedCursor(_) | Self::InvalidInput(_))
    }
}
