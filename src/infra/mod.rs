//! Usage: Infrastructure adapters (persistence, settings, data routing).

pub mod db;
pub mod routing;
pub mod settings;
pub mod usage_links;
