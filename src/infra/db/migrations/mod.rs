//! Usage: SQLite schema migrations (user_version + incremental upgrades).

mod v0_to_v1;
mod v1_to_v2;

use rusqlite::Connection;

const LATEST_SCHEMA_VERSION: i64 = 2;

pub(super) fn apply_migrations(conn: &mut Connection) -> Result<(), String> {
    let mut user_version = read_user_version(conn)?;

    if !(0..=LATEST_SCHEMA_VERSION).contains(&user_version) {
        return Err(format!(
            "unsupported sqlite schema version: user_version={user_version} (expected 0..={LATEST_SCHEMA_VERSION})"
        ));
    }

    while user_version < LATEST_SCHEMA_VERSION {
        match user_version {
            0 => v0_to_v1::migrate_v0_to_v1(conn)?,
            1 => v1_to_v2::migrate_v1_to_v2(conn)?,
            v => {
                return Err(format!(
                    "unsupported sqlite schema version: user_version={v} (expected 0..={LATEST_SCHEMA_VERSION})"
                ))
            }
        }
        user_version = read_user_version(conn)?;
        tracing::info!(user_version, "usage store schema migrated");
    }

    Ok(())
}

fn read_user_version(conn: &Connection) -> Result<i64, String> {
    conn.pragma_query_value(None, "user_version", |row| row.get(0))
        .map_err(|e| format!("failed to read sqlite user_version: {e}"))
}

fn set_user_version(tx: &rusqlite::Transaction<'_>, version: i64) -> Result<(), String> {
    tx.pragma_update(None, "user_version", version)
        .map_err(|e| format!("failed to update sqlite user_version: {e}"))?;
    Ok(())
}
