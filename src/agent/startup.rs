//! Two-phase startup pipeline.
//!
//! Runs on a background task. Phase one calls `init` on every plugin in
//! registry order and rolls back (reverse order, failing plugin included)
//! on the first failure. Phase two calls `after_init` on the plugins that
//! support it and tears the whole registry down on the first failure.
//! Both phases skip every plugin after a failure.

use crate::agent::{shutdown, Shared};
use crate::core::{as_nanos, Error, Phase, Result};
use crate::monitoring::{LogEntry, LogLevel};
use std::time::{Duration, Instant};

/// Snapshot of the startup pipeline, published after every step.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StartupProgress {
    /// Phase currently running, if any
    pub phase: Option<Phase>,
    /// Plugin most recently handed to `init` / `after_init`
    pub current: Option<String>,
    /// Duration of phase one; `None` until it finishes
    pub init_elapsed: Option<Duration>,
    /// Duration of phase two; `None` until it finishes
    pub after_init_elapsed: Option<Duration>,
}

impl StartupProgress {
    pub(crate) fn starting(first: Option<String>) -> Self {
        Self {
            phase: Some(Phase::Init),
            current: first,
            init_elapsed: None,
            after_init_elapsed: None,
        }
    }

    /// Phase still in flight, judged by which duration is unset.
    pub fn phase_in_flight(&self) -> Option<Phase> {
        if self.init_elapsed.is_none() {
            Some(Phase::Init)
        } else if self.after_init_elapsed.is_none() {
            Some(Phase::AfterInit)
        } else {
            None
        }
    }

    /// Combined duration once both phases have finished.
    pub fn total(&self) -> Option<Duration> {
        Some(self.init_elapsed? + self.after_init_elapsed?)
    }
}

struct Failure {
    index: usize,
    cause: String,
    elapsed: Duration,
}

/// Run both phases back to back.
pub(crate) async fn run(shared: &Shared) -> Result<()> {
    init_plugins(shared).await?;
    after_init_plugins(shared).await
}

async fn init_plugins(shared: &Shared) -> Result<()> {
    let plugins = shared.registry.as_slice();
    shared.progress.send_modify(|p| {
        p.phase = Some(Phase::Init);
        p.init_elapsed = None;
    });
    shared.log(
        LogEntry::new(LogLevel::Debug, "Init phase started").with_field("plugins", plugins.len()),
    );

    let phase_started = Instant::now();
    let mut failure: Option<Failure> = None;

    for (index, plugin) in plugins.iter().enumerate() {
        if failure.is_some() {
            shared.log(
                LogEntry::new(LogLevel::Info, "Init skipped due to previous error")
                    .with_field("plugin", plugin.name()),
            );
            continue;
        }
        if shared.is_cancelled() {
            return abort(shared, Phase::Init, index).await;
        }

        shared.set_current(plugin.name());
        let started = Instant::now();
        match plugin.init().await {
            Ok(()) => {
                let elapsed = started.elapsed();
                shared.log(
                    LogEntry::new(LogLevel::Info, "Init succeeded")
                        .with_field("plugin", plugin.name())
                        .with_field("duration_ns", as_nanos(elapsed)),
                );
            }
            Err(err) => {
                let elapsed = started.elapsed();
                shared.log(
                    LogEntry::new(LogLevel::Error, "Init failed")
                        .with_field("plugin", plugin.name())
                        .with_field("error", err.to_string())
                        .with_field("duration_ns", as_nanos(elapsed)),
                );
                failure = Some(Failure {
                    index,
                    cause: err.to_string(),
                    elapsed,
                });
            }
        }
    }

    let phase_elapsed = phase_started.elapsed();
    shared.progress.send_modify(|p| p.init_elapsed = Some(phase_elapsed));

    match failure {
        None => Ok(()),
        Some(failure) => {
            let rollback =
                shutdown::release_reverse(shared, &plugins[..=failure.index], "Rolling back").await;
            Err(Error::Init {
                plugin: plugins[failure.index].name().to_string(),
                cause: failure.cause,
                elapsed: failure.elapsed,
                rollback,
            })
        }
    }
}

async fn after_init_plugins(shared: &Shared) -> Result<()> {
    let plugins = shared.registry.as_slice();
    shared.progress.send_modify(|p| {
        p.phase = Some(Phase::AfterInit);
        p.after_init_elapsed = None;
    });
    shared.log(
        LogEntry::new(LogLevel::Debug, "AfterInit phase started")
            .with_field("plugins", plugins.len()),
    );

    let phase_started = Instant::now();
    let mut failure: Option<Failure> = None;

    for (index, plugin) in plugins.iter().enumerate() {
        if failure.is_some() {
            shared.log(
                LogEntry::new(LogLevel::Info, "AfterInit skipped due to previous error")
                    .with_field("plugin", plugin.name()),
            );
            continue;
        }
        if shared.is_cancelled() {
            return abort(shared, Phase::AfterInit, plugins.len()).await;
        }

        shared.set_current(plugin.name());
        let Some(post) = plugin.post_init() else {
            shared.log(
                LogEntry::new(LogLevel::Info, "AfterInit not implemented")
                    .with_field("plugin", plugin.name()),
            );
            continue;
        };

        let started = Instant::now();
        match plugin.after_init(post).await {
            Ok(()) => {
                let elapsed = started.elapsed();
                shared.log(
                    LogEntry::new(LogLevel::Info, "AfterInit succeeded")
                        .with_field("plugin", plugin.name())
                        .with_field("duration_ns", as_nanos(elapsed)),
                );
            }
            Err(err) => {
                let elapsed = started.elapsed();
                shared.log(
                    LogEntry::new(LogLevel::Error, "AfterInit failed")
                        .with_field("plugin", plugin.name())
                        .with_field("error", err.to_string())
                        .with_field("duration_ns", as_nanos(elapsed)),
                );
                failure = Some(Failure {
                    index,
                    cause: err.to_string(),
                    elapsed,
                });
            }
        }
    }

    let phase_elapsed = phase_started.elapsed();
    shared.progress.send_modify(|p| p.after_init_elapsed = Some(phase_elapsed));

    match failure {
        None => Ok(()),
        Some(failure) => {
            // Every plugin passed Init, so all of them may hold resources.
            let teardown = match shutdown::teardown(shared).await {
                Ok(()) => Vec::new(),
                Err(Error::Teardown(failures)) => failures,
                Err(other) => return Err(other),
            };
            Err(Error::AfterInit {
                plugin: plugins[failure.index].name().to_string(),
                cause: failure.cause,
                elapsed: failure.elapsed,
                teardown,
            })
        }
    }
}

/// Stop after a timeout: release the first `initialized` plugins and bail out.
pub(crate) async fn abort(shared: &Shared, phase: Phase, initialized: usize) -> Result<()> {
    let plugins = shared.registry.as_slice();
    shared.log(
        LogEntry::new(LogLevel::Warn, "Startup cancelled after timeout")
            .with_field("phase", phase.to_string())
            .with_field("initialized", initialized)
            .with_field("skipped", plugins.len().saturating_sub(initialized)),
    );
    let failures =
        shutdown::release_reverse(shared, &plugins[..initialized], "Rolling back").await;
    if !failures.is_empty() {
        shared.log(
            LogEntry::new(LogLevel::Error, "Rollback after cancellation failed")
                .with_field("error", crate::core::error::join_failures(&failures)),
        );
    }
    Err(Error::PipelineAborted)
}
