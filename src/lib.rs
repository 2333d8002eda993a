//! # Agent core
//!
//! Startup and shutdown orchestration for a process built out of
//! independently developed plugins:
//! - **Plugins**: mandatory `init`, optional `after_init` and `close`
//! - **Registry**: ordered, named plugins; order is the dependency order
//! - **Agent**: two-phase startup under a deadline, rollback, teardown
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use agent_core::monitoring::TracingLogger;
//! use agent_core::plugin::{NamedPlugin, Plugin, PluginResult};
//! use agent_core::Agent;
//! use async_trait::async_trait;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! struct Etcd;
//!
//! #[async_trait]
//! impl Plugin for Etcd {
//!     async fn init(&self) -> PluginResult<()> {
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> agent_core::Result<()> {
//!     let agent = Agent::new(
//!         Arc::new(TracingLogger),
//!         Duration::from_secs(15),
//!         vec![NamedPlugin::new("etcd", Etcd)],
//!     )?;
//!     agent_core::agent::event_loop::run_until_interrupted(&agent).await
//! }
//! ```

pub mod agent;
pub mod core;
pub mod monitoring;
pub mod plugin;

pub use agent::{Agent, AgentConfig};
pub use core::error::{Error, Result};
