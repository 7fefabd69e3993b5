//! # chorus-core
//!
//! Foundation types, errors, branded IDs, and utilities for the chorus
//! dispatch engine.
//!
//! This crate provides the shared vocabulary that all other chorus crates
//! depend on:
//!
//! - **Branded IDs**: [`ids::JobId`], [`ids::ChannelId`], [`ids::RequestId`]
//!   as newtypes, plus the [`ids::AgentId`] registry key
//! - **Wire vocabulary**: [`wire::ChannelRequest`] / [`wire::ChannelResponse`]
//!   exchanged with the automation adapter inside a channel, and the
//!   [`wire::OutputSnapshot`] it reports while an agent streams output
//! - **Errors**: [`errors::TransportFault`] raw channel-host faults
//! - **Stability**: [`stability::StabilityTracker`], the portable sync state
//!   machine behind completion detection (the async sampling loop lives in
//!   `chorus-agents`)
//! - **Events**: [`events::ChorusEvent`] job/task lifecycle events
//! - **Logging**: [`logging::init_subscriber`] tracing bootstrap
//!
//! ## Crate Position
//!
//! Foundation crate. Depended on by all other chorus crates.

#![deny(unsafe_code)]

pub mod errors;
pub mod events;
pub mod ids;
pub mod logging;
pub mod stability;
pub mod wire;
