//! Usage: Command handlers behind the CLI; storage work runs on the blocking pool.

mod report;
mod store;
mod usage;

pub use report::{top_usage, TopUsageResponse};
pub use store::{migrate, seed_usage};
pub use usage::{usage_lookup, UsageLookupRequest, UsageLookupResponse};
