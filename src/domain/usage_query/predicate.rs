//! Usage: Keyset range predicate over the composite key `(gil_to, gil_wiki, gil_page)`.
//!
//! The predicate is built as a plain tree so it can be checked in memory and rendered to
//! SQL separately. Rendering emits `?` placeholders and collects the bound values.

use rusqlite::types::Value;
use std::cmp::Ordering;

use super::{Direction, UsageCursor};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyColumn {
    Target,
    Site,
    PageId,
}

impl KeyColumn {
    pub fn sql(self) -> &'static str {
        match self {
            Self::Target => "gil_to",
            Self::Site => "gil_wiki",
            Self::PageId => "gil_page",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Gt,
    Ge,
    Lt,
}

impl CmpOp {
    fn sql(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Lt => "<",
        }
    }

    fn holds(self, ordering: Ordering) -> bool {
        match self {
            Self::Eq => ordering == Ordering::Equal,
            Self::Gt => ordering == Ordering::Greater,
            Self::Ge => ordering != Ordering::Less,
            Self::Lt => ordering == Ordering::Less,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyValue {
    Text(String),
    Int(i64),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangePredicate {
    Compare {
        column: KeyColumn,
        op: CmpOp,
        value: KeyValue,
    },
    All(Vec<RangePredicate>),
    Any(Vec<RangePredicate>),
}

fn compare(column: KeyColumn, op: CmpOp, boundary: &UsageCursor) -> RangePredicate {
    let value = match column {
        KeyColumn::Target => KeyValue::Text(boundary.target.clone()),
        KeyColumn::Site => KeyValue::Text(boundary.site.clone()),
        KeyColumn::PageId => KeyValue::Int(boundary.page_id),
    };
    RangePredicate::Compare { column, op, value }
}

/// Rows on the far side of `boundary` for the given direction.
///
/// Forward keeps the boundary row itself (`gil_page >=`), since a forward
/// continuation token names the first row of the next page. Backward excludes it
/// and walks strictly below the boundary; the caller fetches that slice in
/// descending order so the closest preceding rows come first.
pub fn build_range_predicate(direction: Direction, boundary: &UsageCursor) -> RangePredicate {
    let (strict, last) = match direction {
        Direction::Forward => (CmpOp::Gt, CmpOp::Ge),
        Direction::Backward => (CmpOp::Lt, CmpOp::Lt),
    };

    RangePredicate::Any(vec![
        compare(KeyColumn::Target, strict, boundary),
        RangePredicate::All(vec![
            compare(KeyColumn::Target, CmpOp::Eq, boundary),
            compare(KeyColumn::Site, strict, boundary),
        ]),
        RangePredicate::All(vec![
            compare(KeyColumn::Target, CmpOp::Eq, boundary),
            compare(KeyColumn::Site, CmpOp::Eq, boundary),
            compare(KeyColumn::PageId, last, boundary),
        ]),
    ])
}

impl RangePredicate {
    /// Renders the tree as a parenthesized SQL boolean expression.
    pub fn to_sql(&self, params: &mut Vec<Value>) -> String {
        match self {
            Self::Compare { column, op, value } => {
                params.push(match value {
                    KeyValue::Text(text) => Value::Text(text.clone()),
                    KeyValue::Int(int) => Value::Integer(*int),
                });
                format!("{} {} ?", column.sql(), op.sql())
            }
            Self::All(parts) => join_sql(parts, " AND ", params),
            Self::Any(parts) => join_sql(parts, " OR ", params),
        }
    }

    /// Evaluates the tree against a key without touching storage.
    pub fn matches(&self, key: &UsageCursor) -> bool {
        match self {
            Self::Compare { column, op, value } => {
                let ordering = match (column, value) {
                    (KeyColumn::Target, KeyValue::Text(v)) => key.target.as_str().cmp(v.as_str()),
                    (KeyColumn::Site, KeyValue::Text(v)) => key.site.as_str().cmp(v.as_str()),
                    (KeyColumn::PageId, KeyValue::Int(v)) => key.page_id.cmp(v),
                    _ => return false,
                };
                op.holds(ordering)
            }
            Self::All(parts) => parts.iter().all(|p| p.matches(key)),
            Self::Any(parts) => parts.iter().any(|p| p.matches(key)),
        }
    }
}

fn join_sql(parts: &[RangePredicate], sep: &str, params: &mut Vec<Value>) -> String {
    let rendered: Vec<String> = parts.iter().map(|p| p.to_sql(params)).collect();
    format!("({})", rendered.join(sep))
}
