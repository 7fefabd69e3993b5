//! # chorus-runtime
//!
//! Job lifecycle, session brokering, readiness verification, and
//! orchestration for the chorus dispatch engine.
//!
//! - **Jobs**: [`jobs::JobManager`] — job arena, per-agent task slots,
//!   progress snapshots
//! - **Broker**: [`broker::SessionBroker`] — channel acquisition, reuse,
//!   and load waits
//! - **Handshake**: [`handshake::ReadinessVerifier`] — the escalating
//!   readiness protocol run before real task submission
//! - **Runner**: per-agent execution pipeline (acquire → verify → login
//!   check → submit), isolating every failure into its own task slot
//! - **Orchestrator**: [`orchestrator::Orchestrator`] — the facade a UI
//!   layer talks to
//!
//! ## Crate Position
//!
//! Aggregation layer. Depends on: chorus-core, chorus-settings,
//! chorus-agents.

#![deny(unsafe_code)]

pub mod broker;
pub mod errors;
pub mod events;
pub mod handshake;
pub mod jobs;
pub mod orchestrator;
pub mod refine;
mod runner;

// Re-export main public API
pub use broker::SessionBroker;
pub use errors::RuntimeError;
pub use events::EventEmitter;
pub use handshake::{HandshakeReport, HandshakeStep, ReadinessVerifier};
pub use jobs::manager::JobManager;
pub use jobs::types::{AgentTask, Job, JobSnapshot, ProgressSnapshot, TaskSlot, TaskStatus};
pub use orchestrator::Orchestrator;
