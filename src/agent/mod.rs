//! Agent Module
//!
//! Startup and shutdown orchestration of an ordered plugin registry:
//! - Two-phase startup (`Init`, then `AfterInit`) under a global deadline
//! - Rollback on `Init` failure, full teardown on `AfterInit` failure
//! - Best-effort, reverse-order `Stop`
//!
//! ```text
//! Agent::start ──spawn──▶ pipeline: Init(0..n) ─▶ AfterInit(0..n)
//!      │                       │ progress (watch)        │
//!      └── select! { outcome ◀─┴────── oneshot ◀─────────┘, deadline }
//! ```

pub mod config;
pub mod event_loop;
mod shutdown;
mod startup;
mod supervisor;

pub use config::AgentConfig;
pub use startup::StartupProgress;

use crate::core::{BuildInfo, Error, Result};
use crate::monitoring::{LogEntry, LogLevel, Logger};
use crate::plugin::{NamedPlugin, PluginRegistry};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use uuid::Uuid;

const LOG_TARGET: &str = "agent_core::agent";

/// State shared between the caller and the background startup pipeline.
pub(crate) struct Shared {
    pub(crate) registry: PluginRegistry,
    logger: Arc<dyn Logger>,
    pub(crate) progress: watch::Sender<StartupProgress>,
    cancelled: AtomicBool,
    outcome_claimed: AtomicBool,
}

impl Shared {
    pub(crate) fn log(&self, entry: LogEntry) {
        self.logger.log(entry.with_target(LOG_TARGET));
    }

    pub(crate) fn set_current(&self, name: &str) {
        self.progress.send_modify(|p| p.current = Some(name.to_string()));
    }

    pub(crate) fn snapshot(&self) -> StartupProgress {
        self.progress.borrow().clone()
    }

    pub(crate) fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Take ownership of the startup outcome. Exactly one of the pipeline
    /// (finished) and the supervisor (deadline) succeeds.
    pub(crate) fn claim_outcome(&self) -> bool {
        !self.outcome_claimed.swap(true, Ordering::AcqRel)
    }
}

/// Startup and shutdown orchestrator for a fixed, ordered set of plugins.
pub struct Agent {
    /// Instance ID, reported in the startup log line
    id: Uuid,
    config: AgentConfig,
    build: BuildInfo,
    shared: Arc<Shared>,
    started: AtomicBool,
}

impl Agent {
    /// Create an agent that must finish startup within `max_startup`.
    ///
    /// `logger` receives the agent's own lifecycle events, not the plugins'.
    /// Fails on a zero budget or duplicate plugin names.
    pub fn new(
        logger: Arc<dyn Logger>,
        max_startup: Duration,
        plugins: Vec<NamedPlugin>,
    ) -> Result<Self> {
        Self::with_config(logger, AgentConfig::new(max_startup), plugins)
    }

    /// Create an agent from a full configuration.
    pub fn with_config(
        logger: Arc<dyn Logger>,
        config: AgentConfig,
        plugins: Vec<NamedPlugin>,
    ) -> Result<Self> {
        config.validate()?;
        let registry = PluginRegistry::new(plugins)?;
        let (progress, _) = watch::channel(StartupProgress::default());

        Ok(Self {
            id: Uuid::new_v4(),
            config,
            build: BuildInfo::current(),
            shared: Arc::new(Shared {
                registry,
                logger,
                progress,
                cancelled: AtomicBool::new(false),
                outcome_claimed: AtomicBool::new(false),
            }),
            started: AtomicBool::new(false),
        })
    }

    /// Initialize every plugin, then after-initialize those that support it.
    ///
    /// Returns the first phase error or a timeout error. On timeout the
    /// pipeline keeps running detached unless `cancel_on_timeout` is set,
    /// in which case it stops before the next plugin call.
    /// An agent can only be started once.
    pub async fn start(&self) -> Result<()> {
        if self.started.swap(true, Ordering::AcqRel) {
            return Err(Error::AlreadyStarted);
        }

        self.shared.log(
            LogEntry::new(LogLevel::Info, "Starting the agent...")
                .with_field("agent_id", self.id.to_string())
                .with_field("build_version", &self.build.version)
                .with_field("build_date", &self.build.date)
                .with_field("plugins", self.shared.registry.len()),
        );

        let first = self.shared.registry.iter().next().map(|p| p.name().to_string());
        self.shared.progress.send_replace(StartupProgress::starting(first));

        supervisor::supervise(
            Arc::clone(&self.shared),
            self.config.max_startup,
            self.config.cancel_on_timeout,
        )
        .await
    }

    /// Release every plugin in reverse registry order.
    ///
    /// Keeps going past failures and reports them together. Safe to call
    /// after a failed or partial start; plugins already released are skipped.
    pub async fn stop(&self) -> Result<()> {
        shutdown::teardown(&self.shared).await
    }

    /// Instance ID.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Configuration in use.
    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Build metadata.
    pub fn build_info(&self) -> &BuildInfo {
        &self.build
    }

    /// Registered plugins.
    pub fn registry(&self) -> &PluginRegistry {
        &self.shared.registry
    }

    /// Plugin names in registry order.
    pub fn plugin_names(&self) -> Vec<String> {
        self.shared.registry.names()
    }

    /// Latest startup progress snapshot.
    pub fn progress(&self) -> StartupProgress {
        self.shared.snapshot()
    }

    /// Duration of the `Init` phase, once it has finished.
    pub fn init_elapsed(&self) -> Option<Duration> {
        self.shared.progress.borrow().init_elapsed
    }

    /// Duration of the `AfterInit` phase, once it has finished.
    pub fn after_init_elapsed(&self) -> Option<Duration> {
        self.shared.progress.borrow().after_init_elapsed
    }

    /// Combined duration of both phases, once both have finished.
    pub fn total_elapsed(&self) -> Option<Duration> {
        self.shared.progress.borrow().total()
    }
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("id", &self.id)
            .field("config", &self.config)
            .field("plugins", &self.plugin_names())
            .field("started", &self.started.load(Ordering::Acquire))
            .finish()
    }
}
