mod app;
pub mod commands;
mod domain;
mod infra;
mod shared;

pub use app::{app_state, logging};
pub use domain::{top_usage, usage_query};
pub use infra::{db, routing, settings, usage_links};
pub use shared::{blocking, error, namespace};

pub use shared::error::UsageError;
