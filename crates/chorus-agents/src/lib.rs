//! # chorus-agents
//!
//! The boundary between the chorus orchestration engine and the external
//! world it drives: chat-style agent services reached through reusable
//! channels.
//!
//! - **Registry**: [`registry::AgentRegistry`] — the built-in table of
//!   known services with their address patterns and entry URLs
//! - **Transport**: [`transport::ChannelTransport`] — the abstract
//!   browser-like channel host (implemented externally)
//! - **Exchange**: [`exchange::Exchange`] — request/response delivery with
//!   handshake-class and task-class timeouts plus failure classification
//! - **Adapter**: [`adapter::AgentAdapter`] — the per-service capability
//!   contract, with [`adapter::WireAdapter`] as the generic implementation
//!   that drives a remote automation script over the wire protocol
//! - **Detector**: [`detector::CompletionDetector`] — the async sampling
//!   loop around `chorus_core::stability`
//! - **Testing**: [`testing::ScriptedTransport`] — an in-memory channel
//!   host for exercising the pipeline in tests
//!
//! ## Crate Position
//!
//! Boundary crate. Depends on: chorus-core, chorus-settings.
//! Depended on by: chorus-runtime.

#![deny(unsafe_code)]

pub mod adapter;
pub mod detector;
pub mod exchange;
pub mod registry;
pub mod testing;
pub mod transport;

// Re-export main public API
pub use adapter::{AdapterError, AdapterFactory, AgentAdapter, WireAdapter, WireAdapterFactory};
pub use detector::{CompletionDetector, DetectionOutcome, OutputProbe};
pub use exchange::{Exchange, ExchangeError};
pub use registry::{AgentDescriptor, AgentRegistry};
pub use transport::ChannelTransport;
