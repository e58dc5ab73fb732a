//! Usage: Usage lookups and the aggregate report over the shared usage table.

pub mod top_usage;
pub mod usage_query;
