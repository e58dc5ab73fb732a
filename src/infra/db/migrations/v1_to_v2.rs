//! Usage: SQLite migration v1->v2 (category membership + page metadata for category targets).

use crate::shared::time::now_unix_seconds;
use rusqlite::Connection;

pub(super) fn migrate_v1_to_v2(conn: &mut Connection) -> Result<(), String> {
    const VERSION: i64 = 2;
    let tx = conn
        .transaction()
        .map_err(|e| format!("failed to start sqlite transaction: {e}"))?;

    tx.execute_batch(
        r#"
CREATE TABLE IF NOT EXISTS page (
  page_id INTEGER PRIMARY KEY,
  page_namespace INTEGER NOT NULL,
  page_title TEXT NOT NULL,
  UNIQUE(page_namespace, page_title)
);

CREATE TABLE IF NOT EXISTS categorylinks (
  cl_from INTEGER NOT NULL,
  cl_to TEXT NOT NULL,
  PRIMARY KEY (cl_from, cl_to)
);

CREATE INDEX IF NOT EXISTS idx_categorylinks_to ON categorylinks(cl_to);
"#,
    )
    .map_err(|e| format!("failed to migrate v1->v2: {e}"))?;

    let applied_at = now_unix_seconds();
    tx.execute(
        "INSERT OR IGNORE INTO schema_migrations(version, applied_at) VALUES (?1, ?2)",
        (VERSION, applied_at),
    )
    .map_err(|e| format!("failed to record migration: {e}"))?;

    super::set_user_version(&tx, VERSION)?;

    tx.commit()
        .map_err(|e| format!("failed to commit migration: {e}"))?;

    Ok(())
}
