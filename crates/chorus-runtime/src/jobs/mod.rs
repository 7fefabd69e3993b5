//! Job records, per-agent task slots, and the job manager.

pub mod manager;
pub mod types;
