//! Usage: Cross-cutting utilities shared across domains (low-level helpers, pure logic).

pub mod blocking;
pub mod error;
pub(crate) mod fs;
pub mod namespace;
pub(crate) mod time;
