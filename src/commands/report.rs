//! Usage: Most globally linked files report command.

use serde::Serialize;
use std::sync::Arc;

use crate::app_state::{ensure_db_ready, AppState};
use crate::blocking;
use crate::routing::UsageRouting;
use crate::shared::error::UsageError;
use crate::top_usage::{clamp_report_limit, ReportOutcome, TopUsageReport, TopUsageRow};

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TopUsageResponse {
    Rows {
        offset: u64,
        limit: i64,
        rows: Vec<TopUsageRow>,
    },
    Redirect {
        url: String,
    },
}

pub async fn top_usage(
    state: &AppState,
    offset: u64,
    limit: Option<i64>,
) -> Result<TopUsageResponse, UsageError> {
    let limit = clamp_report_limit(limit.unwrap_or(i64::from(state.settings.default_limit)));
    let routing: Arc<dyn UsageRouting> = state.routing.clone();
    if routing.is_canonical_owner() {
        ensure_db_ready(state).await?;
    }

    let report = TopUsageReport::new(routing);
    let outcome = blocking::run("top_usage", move || report.run(offset, limit)).await?;
    Ok(match outcome {
        ReportOutcome::Rows(rows) => TopUsageResponse::Rows { offset, limit, rows },
        ReportOutcome::Redirect { url } => TopUsageResponse::Redirect { url },
    })
}
