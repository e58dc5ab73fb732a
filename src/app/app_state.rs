//! Usage: Shared process state (settings, routing) and the store readiness gate used by `commands/*`.

use std::sync::Arc;
use tokio::sync::OnceCell;

use crate::blocking;
use crate::routing::{StaticRouting, UsageRouting};
use crate::settings::GlobalUsageSettings;
use crate::shared::error::UsageError;

pub struct AppState {
    pub settings: GlobalUsageSettings,
    pub routing: Arc<StaticRouting>,
    db_ready: OnceCell<()>,
}

impl AppState {
    pub fn new(settings: GlobalUsageSettings, routing: StaticRouting) -> Self {
        Self {
            settings,
            routing: Arc::new(routing),
            db_ready: OnceCell::new(),
        }
    }

    /// Replica nodes (`read_only`) open the store without write access or migrations.
    pub fn from_settings(settings: GlobalUsageSettings) -> Self {
        let routing = StaticRouting::from_settings(&settings);
        let routing = if settings.read_only {
            routing.read_only()
        } else {
            routing
        };
        Self::new(settings, routing)
    }

    pub fn home_site(&self) -> &str {
        &self.settings.home_site
    }
}

/// Opens the canonical store once per process (migrating it unless read-only). Only
/// success is cached; a failed open is retried on the next call and its error is
/// returned unchanged.
pub async fn ensure_db_ready(state: &AppState) -> Result<(), UsageError> {
    state
        .db_ready
        .get_or_try_init(|| {
            let routing = state.routing.clone();
            blocking::run("db_init", move || {
                routing.resolve_canonical_handle().map(|_| ())
            })
        })
        .await
        .map(|_| ())
}
