//! Usage: Aggregate query behind the most globally linked files report.

use rusqlite::{params, Connection};
use serde::Serialize;

use crate::shared::error::UsageError;
use crate::shared::namespace::NS_FILE;

pub const DEFAULT_REPORT_LIMIT: u32 = 50;
pub const MAX_REPORT_LIMIT: u32 = 5000;

/// Shape of the ranked listing, handed to whatever renders it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportQueryInfo {
    pub table: &'static str,
    pub namespace: i64,
    pub title_field: &'static str,
    pub value_expr: &'static str,
    pub group_by: &'static str,
    pub having: &'static str,
    pub order_by: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopUsageRow {
    pub namespace: i64,
    pub title: String,
    pub value: i64,
}

/// Page size the report actually uses for a requested `limit`.
pub fn clamp_report_limit(limit: i64) -> i64 {
    limit.clamp(1, i64::from(MAX_REPORT_LIMIT))
}

pub fn query_info() -> ReportQueryInfo {
    ReportQueryInfo {
        table: "globalimagelinks",
        namespace: NS_FILE,
        title_field: "gil_to",
        value_expr: "COUNT(*)",
        group_by: "gil_to",
        having: "COUNT(*) > 1",
        order_by: "value DESC, title ASC",
    }
}

pub fn run_with_conn(
    conn: &Connection,
    info: &ReportQueryInfo,
    offset: u64,
    limit: i64,
) -> Result<Vec<TopUsageRow>, UsageError> {
    let limit = clamp_report_limit(limit);
    let offset = i64::try_from(offset)
        .map_err(|_| UsageError::InvalidInput(format!("offset {offset} is out of range")))?;

    let sql = format!(
        r#"
SELECT
  {title} AS title,
  {value} AS value
FROM {table}
GROUP BY {group_by}
HAVING {having}
ORDER BY {order_by}
LIMIT ?1 OFFSET ?2
"#,
        title = info.title_field,
        value = info.value_expr,
        table = info.table,
        group_by = info.group_by,
        having = info.having,
        order_by = info.order_by,
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params![limit, offset], |row| {
            Ok(TopUsageRow {
                namespace: info.namespace,
                title: row.get("title")?,
                value: row.get("value")?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    tracing::debug!(offset, limit, rows = rows.len(), "top usage report executed");
    Ok(rows)
}
