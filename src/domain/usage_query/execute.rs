//! Usage: Runs a usage lookup: SQL assembly, `limit + 1` fetch, page split and grouping.

use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};

use super::predicate::build_range_predicate;
use super::{Direction, UsageQueryConfig, UsageRecord, UsageResultSet, UsageTarget};
use crate::db::sql_placeholders;
use crate::shared::error::UsageError;
use crate::shared::namespace::NS_FILE;

const USAGE_FIELDS: &str = "
  gil_to,
  gil_wiki,
  gil_page,
  gil_page_namespace_id,
  gil_page_namespace,
  gil_page_title
";

/// FROM clause plus the conditions that pick the target rows.
struct TargetSource {
    from: &'static str,
    conditions: Vec<String>,
}

fn target_source(target: &UsageTarget, params: &mut Vec<Value>) -> Option<TargetSource> {
    match target {
        UsageTarget::File(name) => {
            params.push(Value::Text(name.clone()));
            Some(TargetSource {
                from: "globalimagelinks",
                conditions: vec!["gil_to = ?".to_string()],
            })
        }
        UsageTarget::Files(names) => {
            if names.is_empty() {
                return None;
            }
            params.extend(names.iter().cloned().map(Value::Text));
            Some(TargetSource {
                from: "globalimagelinks",
                conditions: vec![format!("gil_to IN ({})", sql_placeholders(names.len()))],
            })
        }
        UsageTarget::Category(name) => {
            params.push(Value::Text(name.clone()));
            params.push(Value::Integer(NS_FILE));
            Some(TargetSource {
                from: "globalimagelinks \
                       JOIN page ON page_title = gil_to \
                       JOIN categorylinks ON cl_from = page_id",
                conditions: vec!["cl_to = ?".to_string(), "page_namespace = ?".to_string()],
            })
        }
        UsageTarget::Other { .. } => None,
    }
}

fn build_sql(config: &UsageQueryConfig, source: TargetSource, params: &mut Vec<Value>) -> String {
    let mut conditions = source.conditions;

    if let Some(site) = config.excluded_site() {
        conditions.push("gil_wiki != ?".to_string());
        params.push(Value::Text(site.to_string()));
    }

    if !config.namespaces().is_empty() {
        conditions.push(format!(
            "gil_page_namespace_id IN ({})",
            sql_placeholders(config.namespaces().len())
        ));
        params.extend(config.namespaces().iter().copied().map(Value::Integer));
    }

    if !config.sites().is_empty() {
        conditions.push(format!(
            "gil_wiki IN ({})",
            sql_placeholders(config.sites().len())
        ));
        params.extend(config.sites().iter().cloned().map(Value::Text));
    }

    if let Some(cursor) = config.cursor() {
        conditions.push(build_range_predicate(config.direction(), cursor).to_sql(params));
    }

    // Backward without a cursor reads the tail of the ordering.
    let order = match config.direction() {
        Direction::Forward => "gil_to ASC, gil_wiki ASC, gil_page ASC",
        Direction::Backward => "gil_to DESC, gil_wiki DESC, gil_page DESC",
    };

    // One extra row tells us whether another page exists.
    params.push(Value::Integer(i64::from(config.limit()) + 1));

    format!(
        "SELECT{USAGE_FIELDS}FROM {from}\nWHERE {conditions}\nORDER BY {order}\nLIMIT ?",
        from = source.from,
        conditions = conditions.join("\nAND "),
    )
}

fn row_to_record(row: &rusqlite::Row<'_>) -> Result<UsageRecord, rusqlite::Error> {
    Ok(UsageRecord {
        target: row.get("gil_to")?,
        site: row.get("gil_wiki")?,
        page_id: row.get("gil_page")?,
        page_namespace_id: row.get("gil_page_namespace_id")?,
        page_namespace: row.get("gil_page_namespace")?,
        page_title: row.get("gil_page_title")?,
    })
}

/// Splits a `limit + 1` fetch into the page and the sentinel row, then restores
/// canonical ascending order for backward fetches.
pub(super) fn split_page(
    mut rows: Vec<UsageRecord>,
    limit: usize,
    direction: Direction,
) -> (Vec<UsageRecord>, Option<UsageRecord>) {
    let extra = if rows.len() > limit {
        rows.drain(limit..).next()
    } else {
        None
    };

    if direction == Direction::Backward {
        rows.reverse();
    }

    (rows, extra)
}

fn fold(config: &UsageQueryConfig, rows: Vec<UsageRecord>, extra: Option<UsageRecord>) -> UsageResultSet {
    let mut set = UsageResultSet {
        has_more: extra.is_some(),
        continuation: extra.as_ref().map(UsageRecord::key),
        offset: config.cursor().cloned(),
        direction: config.direction(),
        limit: config.limit(),
        first_key: rows.first().map(UsageRecord::key),
        ..UsageResultSet::default()
    };

    for row in rows {
        set.result
            .entry(row.target.clone())
            .or_default()
            .entry(row.site.clone())
            .or_default()
            .push(row);
    }

    set
}

fn empty_result(config: &UsageQueryConfig) -> UsageResultSet {
    fold(config, Vec::new(), None)
}

pub fn execute_with_conn(
    conn: &Connection,
    config: &UsageQueryConfig,
) -> Result<UsageResultSet, UsageError> {
    let mut params = Vec::new();
    let Some(source) = target_source(config.target(), &mut params) else {
        tracing::debug!(
            target_kind = config.target().kind(),
            "usage query skipped: nothing to look up for this target"
        );
        return Ok(empty_result(config));
    };

    let sql = build_sql(config, source, &mut params);
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params_from_iter(params.iter()), row_to_record)?
        .collect::<Result<Vec<_>, _>>()?;

    let fetched = rows.len();
    let (rows, extra) = split_page(rows, config.limit() as usize, config.direction());
    let set = fold(config, rows, extra);

    tracing::debug!(
        target_kind = config.target().kind(),
        direction = ?config.direction(),
        limit = config.limit(),
        fetched,
        targets = set.count(),
        has_more = set.has_more(),
        "usage query executed"
    );

    Ok(set)
}
