//! Usage: SQLite connection pool for the shared usage store, schema migrations, and common DB helpers.

mod migrations;

use crate::shared::error::UsageError;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{Connection, OpenFlags};
use std::path::Path;
use std::time::Duration;

const BUSY_TIMEOUT: Duration = Duration::from_millis(2000);

/// Pooled handle to the usage store. Cloning shares the pool.
#[derive(Clone)]
pub struct Db {
    pool: Pool<SqliteConnectionManager>,
    read_only: bool,
}

impl std::fmt::Debug for Db {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Db")
            .field("read_only", &self.read_only)
            .field("state", &self.pool.state())
            .finish()
    }
}

impl Db {
    /// Opens (creating if needed) the database file and applies pending migrations.
    pub fn init(path: &Path) -> Result<Self, UsageError> {
        let path_hint = path.to_string_lossy();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                UsageError::Config(format!("failed to create {}: {e}", parent.display()))
            })?;
        }

        // Migrate on a direct connection first so open failures surface immediately
        // instead of after the pool's connection timeout.
        let mut conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        configure_connection(&conn)?;
        migrations::apply_migrations(&mut conn).map_err(|e| {
            UsageError::Schema(format!("sqlite migration failed at {path_hint}: {e}"))
        })?;
        drop(conn);

        let manager = SqliteConnectionManager::file(path).with_init(|conn| {
            conn.busy_timeout(BUSY_TIMEOUT)?;
            configure_connection(conn)
        });
        let pool = Pool::new(manager)?;

        tracing::debug!(path = %path_hint, "usage store ready");
        Ok(Self {
            pool,
            read_only: false,
        })
    }

    /// Opens an existing database without write access and without migrating it.
    pub fn open_read_only(path: &Path) -> Result<Self, UsageError> {
        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        drop(Connection::open_with_flags(path, flags)?);

        let manager = SqliteConnectionManager::file(path)
            .with_flags(flags)
            .with_init(|conn| conn.busy_timeout(BUSY_TIMEOUT));
        let pool = Pool::new(manager)?;

        Ok(Self {
            pool,
            read_only: true,
        })
    }

    pub fn open_connection(
        &self,
    ) -> Result<PooledConnection<SqliteConnectionManager>, UsageError> {
        Ok(self.pool.get()?)
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }
}

pub(crate) fn sql_placeholders(count: usize) -> String {
    if count == 0 {
        return String::new();
    }

    let mut out = String::with_capacity(count.saturating_mul(2).saturating_sub(1));
    for idx in 0..count {
        if idx > 0 {
            out.push(',');
        }
        out.push('?');
    }
    out
}

fn configure_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;
"#,
    )?;

    Ok(())
}

/// Brings a bare connection up to the latest schema. Used by tests and fixtures
/// that work on `Connection::open_in_memory()`.
pub fn migrate_connection(conn: &mut Connection) -> Result<(), UsageError> {
    migrations::apply_migrations(conn).map_err(UsageError::Schema)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sql_placeholders_joins_with_commas() {
        assert_eq!(sql_placeholders(0), "");
        assert_eq!(sql_placeholders(1), "?");
        assert_eq!(sql_placeholders(3), "?,?,?");
    }

    #[test]
    fn init_creates_usage_tables() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db = Db::init(&dir.path().join("usage.db")).expect("init db");
        assert!(!db.is_read_only());

        let conn = db.open_connection().expect("open connection");
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN ('globalimagelinks', 'categorylinks', 'page')",
                [],
                |row| row.get(0),
            )
            .expect("count tables");
        assert_eq!(count, 3);
    }

    #[test]
    fn open_read_only_missing_file_fails_fast() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = Db::open_read_only(&dir.path().join("absent.db")).unwrap_err();
        assert!(matches!(err, UsageError::StorageUnavailable(_)), "{err}");
    }

    #[test]
    fn read_only_handle_rejects_writes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("usage.db");
        drop(Db::init(&path).expect("init db"));

        let db = Db::open_read_only(&path).expect("open read only");
        assert!(db.is_read_only());
        let conn = db.open_connection().expect("open connection");
        let err = conn
            .execute(
                "INSERT INTO globalimagelinks(gil_wiki, gil_page, gil_page_namespace_id, gil_page_namespace, gil_page_title, gil_to) VALUES ('a', 1, 0, '', 'T', 'F.png')",
                [],
            )
            .unwrap_err();
        assert!(err.to_string().contains("readonly") || err.to_string().contains("read-only"));
    }
}
