//! Usage: Row writers for the shared usage table and the category relations (fixtures + seeding).

use rusqlite::{params, Connection};

use crate::shared::error::UsageError;
use crate::usage_query::UsageRecord;

/// Upserts rows in one transaction. Returns the number of rows written.
pub fn insert_usage_rows(conn: &mut Connection, rows: &[UsageRecord]) -> Result<usize, UsageError> {
    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare(
            r#"
INSERT OR REPLACE INTO globalimagelinks (
  gil_wiki,
  gil_page,
  gil_page_namespace_id,
  gil_page_namespace,
  gil_page_title,
  gil_to
) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
"#,
        )?;
        for row in rows {
            stmt.execute(params![
                row.site,
                row.page_id,
                row.page_namespace_id,
                row.page_namespace,
                row.page_title,
                row.target
            ])?;
        }
    }
    tx.commit()?;

    tracing::debug!(rows = rows.len(), "usage rows written");
    Ok(rows.len())
}

pub fn insert_page(
    conn: &Connection,
    page_id: i64,
    namespace: i64,
    title: &str,
) -> Result<(), UsageError> {
    conn.execute(
        "INSERT OR REPLACE INTO page (page_id, page_namespace, page_title) VALUES (?1, ?2, ?3)",
        params![page_id, namespace, title],
    )?;
    Ok(())
}

pub fn insert_category_link(conn: &Connection, page_id: i64, category: &str) -> Result<(), UsageError> {
    conn.execute(
        "INSERT OR IGNORE INTO categorylinks (cl_from, cl_to) VALUES (?1, ?2)",
        params![page_id, category],
    )?;
    Ok(())
}
