//! Usage: Store maintenance commands (schema migration, fixture seeding).

use std::path::Path;

use crate::app_state::{ensure_db_ready, AppState};
use crate::blocking;
use crate::routing::UsageRouting;
use crate::shared::error::UsageError;
use crate::usage_links;
use crate::usage_query::UsageRecord;

/// Opens the canonical store, applying pending migrations unless it is a read-only replica.
pub async fn migrate(state: &AppState) -> Result<(), UsageError> {
    ensure_db_ready(state).await
}

/// Loads a JSON array of usage rows into the canonical store. Returns rows written.
pub async fn seed_usage(state: &AppState, path: &Path) -> Result<usize, UsageError> {
    let source = path.to_path_buf();
    let rows = blocking::run("seed_usage_read", move || read_usage_rows(&source)).await?;

    ensure_db_ready(state).await?;
    let routing = state.routing.clone();
    let written = blocking::run("seed_usage", move || {
        let db = routing.resolve_canonical_handle()?;
        let mut conn = db.open_connection()?;
        usage_links::insert_usage_rows(&mut conn, &rows)
    })
    .await?;

    tracing::info!(path = %path.display(), rows = written, "seeded usage rows");
    Ok(written)
}

fn read_usage_rows(path: &Path) -> Result<Vec<UsageRecord>, UsageError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| UsageError::InvalidInput(format!("failed to read {}: {e}", path.display())))?;
    serde_json::from_str(&content)
        .map_err(|e| UsageError::InvalidInput(format!("invalid usage rows in {}: {e}", path.display())))
}
