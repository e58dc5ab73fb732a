//! Usage: SQLite migration v0->v1 (shared usage table).

use crate::shared::time::now_unix_seconds;
use rusqlite::Connection;

pub(super) fn migrate_v0_to_v1(conn: &mut Connection) -> Result<(), String> {
    const VERSION: i64 = 1;
    let tx = conn
        .transaction()
        .map_err(|e| format!("failed to start sqlite transaction: {e}"))?;

    tx.execute_batch(
        r#"
CREATE TABLE IF NOT EXISTS schema_migrations (
  version INTEGER PRIMARY KEY,
  applied_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS globalimagelinks (
  gil_wiki TEXT NOT NULL,
  gil_page INTEGER NOT NULL,
  gil_page_namespace_id INTEGER NOT NULL,
  gil_page_namespace TEXT NOT NULL,
  gil_page_title TEXT NOT NULL,
  gil_to TEXT NOT NULL,
  PRIMARY KEY (gil_to, gil_wiki, gil_page)
);

CREATE INDEX IF NOT EXISTS idx_globalimagelinks_wiki_page ON globalimagelinks(gil_wiki, gil_page);
"#,
    )
    .map_err(|e| format!("failed to migrate v0->v1: {e}"))?;

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
