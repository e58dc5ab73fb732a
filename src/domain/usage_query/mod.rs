//! Usage: "Where is this file used" lookups over the shared usage table, paged with
//! `target|site|page_id` continuation tokens in either direction.
//!
//! Pages are fetched with `LIMIT limit + 1`; the extra row only signals that more data
//! exists and becomes the continuation token. Results are always presented in
//! ascending `(target, site, page_id)` order, whichever direction was used to reach them.

mod config;
mod cursor;
mod execute;
mod predicate;
mod types;

pub use config::{clamp_limit, UsageQueryBuilder, UsageQueryConfig, DEFAULT_LIMIT, MAX_LIMIT};
pub use cursor::UsageCursor;
pub use execute::execute_with_conn;
pub use predicate::{build_range_predicate, CmpOp, KeyColumn, KeyValue, RangePredicate};
pub use types::{
    Continuation, Direction, SiteUsage, UsageRecord, UsageResultSet, UsageTarget,
};

use crate::db;
use crate::routing::UsageRouting;
use crate::shared::error::UsageError;

pub fn execute(db: &db::Db, config: &UsageQueryConfig) -> Result<UsageResultSet, UsageError> {
    let conn = db.open_connection()?;
    execute_with_conn(&conn, config)
}

/// Runs the lookup against the canonical usage store resolved by `routing`.
pub fn execute_routed(
    routing: &dyn UsageRouting,
    config: &UsageQueryConfig,
) -> Result<UsageResultSet, UsageError> {
    let handle = routing.resolve_canonical_handle()?;
    execute(&handle, config)
}

#[cfg(test)]
use execute::split_page;
