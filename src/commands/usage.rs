//! Usage: File usage lookup command.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::app_state::{ensure_db_ready, AppState};
use crate::blocking;
use crate::shared::error::UsageError;
use crate::shared::namespace::normalize_db_key;
use crate::usage_query::{
    self, Continuation, Direction, SiteUsage, UsageQueryBuilder, UsageTarget,
};

#[derive(Debug, Clone, Default)]
pub struct UsageLookupRequest {
    pub targets: Vec<String>,
    pub category: bool,
    pub namespaces: Vec<i64>,
    pub sites: Vec<String>,
    pub exclude_local: bool,
    pub limit: Option<i64>,
    pub offset: Option<String>,
    pub backward: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct UsageLookupResponse {
    pub result: BTreeMap<String, SiteUsage>,
    pub count: usize,
    pub has_more: bool,
    pub continue_token: String,
    pub direction: Direction,
    pub next: Option<Continuation>,
    pub prev: Option<Continuation>,
}

fn request_target(req: &UsageLookupRequest) -> Result<UsageTarget, UsageError> {
    match req.targets.as_slice() {
        [] => Err(UsageError::InvalidInput("at least one target is required".to_string())),
        [single] if req.category => UsageTarget::category(single),
        _ if req.category => Err(UsageError::InvalidInput(
            "only one category can be queried at a time".to_string(),
        )),
        [single] => UsageTarget::file(single),
        many => {
            let keys: Vec<String> = many
                .iter()
                .map(|name| normalize_db_key(name))
                .filter(|key| !key.is_empty())
                .collect();
            if keys.is_empty() {
                return Err(UsageError::InvalidInput("file name is required".to_string()));
            }
            Ok(UsageTarget::files(keys))
        }
    }
}

fn build_query(state: &AppState, req: &UsageLookupRequest) -> Result<UsageQueryBuilder, UsageError> {
    let mut builder = UsageQueryBuilder::new(request_target(req)?);
    builder
        .set_limit(req.limit.unwrap_or(i64::from(state.settings.default_limit)))
        .set_home_site(state.home_site())
        .exclude_local_site(req.exclude_local)
        .filter_namespaces(req.namespaces.iter().copied())
        .filter_sites(req.sites.iter().cloned());

    let direction = if req.backward {
        Direction::Backward
    } else {
        Direction::Forward
    };
    match req.offset.as_deref().filter(|t| !t.is_empty()) {
        Some(token) => {
            builder.set_cursor(token, Some(direction))?;
        }
        None => {
            builder.set_direction(direction);
        }
    }

    Ok(builder)
}

pub async fn usage_lookup(
    state: &AppState,
    req: UsageLookupRequest,
) -> Result<UsageLookupResponse, UsageError> {
    let config = build_query(state, &req)?.build()?;
    ensure_db_ready(state).await?;

    let routing = state.routing.clone();
    let set = blocking::run("usage_lookup", move || {
        usage_query::execute_routed(routing.as_ref(), &config)
    })
    .await?;

    // A key containing `|` would not parse back; callers resume from `next`/`prev` instead.
    let continue_token = match set.continuation() {
        Some(cursor) if !cursor.is_token_safe() => {
            tracing::warn!(cursor = ?cursor, "continuation key contains `|`; token omitted");
            String::new()
        }
        _ => set.continuation_token(),
    };

    Ok(UsageLookupResponse {
        count: set.count(),
        has_more: set.has_more(),
        continue_token,
        direction: set.direction(),
        next: set.next_page(),
        prev: set.prev_page(),
        result: set.result().clone(),
    })
}
