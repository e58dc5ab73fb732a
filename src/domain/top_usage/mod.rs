//! Usage: "Most globally linked files" report (GROUP BY target, HAVING COUNT(*) > 1).
//!
//! Only the canonical data owner executes the aggregate; other nodes answer with a
//! redirect to the owner. Paging is plain offset/limit since counts are not unique.

mod query;

pub use query::{
    clamp_report_limit, query_info, run_with_conn, ReportQueryInfo, TopUsageRow,
    DEFAULT_REPORT_LIMIT, MAX_REPORT_LIMIT,
};

use std::sync::Arc;

use crate::db::Db;
use crate::routing::UsageRouting;
use crate::shared::error::UsageError;

pub const REPORT_PAGE_NAME: &str = "Special:MostGloballyLinkedFiles";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportOutcome {
    Rows(Vec<TopUsageRow>),
    /// Not the owner: send the caller to the owner's copy of the report.
    Redirect { url: String },
}

pub struct TopUsageReport {
    routing: Arc<dyn UsageRouting>,
}

impl TopUsageReport {
    pub fn new(routing: Arc<dyn UsageRouting>) -> Self {
        Self { routing }
    }

    pub fn is_expensive(&self) -> bool {
        true
    }

    pub fn is_syndicated(&self) -> bool {
        false
    }

    /// Non-owners only redirect, so there is nothing to cache there.
    pub fn is_cacheable(&self) -> bool {
        self.routing.is_canonical_owner()
    }

    pub fn is_listed(&self) -> bool {
        self.routing.is_canonical_owner()
    }

    fn assert_on_canonical_owner(&self) -> Result<(), UsageError> {
        if self.routing.is_canonical_owner() {
            Ok(())
        } else {
            tracing::error!("most globally linked files report reached a non-owner node");
            Err(UsageError::UnroutableReport)
        }
    }

    pub fn query_info(&self) -> Result<ReportQueryInfo, UsageError> {
        self.assert_on_canonical_owner()?;
        Ok(query_info())
    }

    /// Handle used to (re)compute the report.
    pub fn recache_db(&self) -> Result<Db, UsageError> {
        self.assert_on_canonical_owner()?;
        self.routing.resolve_canonical_handle()
    }

    pub fn run(&self, offset: u64, limit: i64) -> Result<ReportOutcome, UsageError> {
        if !self.routing.is_canonical_owner() {
            return match self.routing.canonical_page_url(REPORT_PAGE_NAME) {
                Some(url) => {
                    tracing::debug!(url = %url, "redirecting report to canonical owner");
                    Ok(ReportOutcome::Redirect { url })
                }
                None => Err(UsageError::UnroutableReport),
            };
        }

        let info = self.query_info()?;
        let db = self.recache_db()?;
        let conn = db.open_connection()?;
        let rows = run_with_conn(&conn, &info, offset, limit)?;
        Ok(ReportOutcome::Rows(rows))
    }
}
