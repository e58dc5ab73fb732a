//! Usage: Application layer (process state, logging setup).

pub mod app_state;
pub mod logging;
