//! Best-effort, reverse-order release of plugins.

use crate::agent::Shared;
use crate::core::{Error, ReleaseFailure, Result};
use crate::monitoring::{LogEntry, LogLevel};
use crate::plugin::{NamedPlugin, Release};

/// Release `plugins` back to front, collecting every failure.
pub(crate) async fn release_reverse(
    shared: &Shared,
    plugins: &[NamedPlugin],
    action: &str,
) -> Vec<ReleaseFailure> {
    let mut failures = Vec::new();

    for plugin in plugins.iter().rev() {
        shared.log(
            LogEntry::new(LogLevel::Debug, format!("{} plugin begin", action))
                .with_field("plugin", plugin.name()),
        );

        let outcome = plugin.release().await;
        let entry = LogEntry::new(LogLevel::Debug, format!("{} plugin end", action))
            .with_field("plugin", plugin.name());
        match outcome {
            Ok(Release::Closed) => shared.log(entry),
            Ok(Release::NothingToRelease) => shared.log(entry.with_field("close", false)),
            Ok(Release::AlreadyReleased) => shared.log(entry.with_field("already_released", true)),
            Err(err) => {
                shared.log(
                    LogEntry::new(LogLevel::Error, "Plugin release failed")
                        .with_field("plugin", plugin.name())
                        .with_field("error", err.to_string()),
                );
                failures.push(ReleaseFailure::new(plugin.name(), err));
            }
        }
    }

    failures
}

/// Release the whole registry; shared by `Agent::stop` and `AfterInit` recovery.
pub(crate) async fn teardown(shared: &Shared) -> Result<()> {
    shared.log(LogEntry::new(LogLevel::Info, "Stopping agent..."));

    let failures = release_reverse(shared, shared.registry.as_slice(), "Stopping").await;

    shared.log(
        LogEntry::new(LogLevel::Debug, "Agent stopped").with_field("failures", failures.len()),
    );

    if failures.is_empty() {
        Ok(())
    } else {
        Err(Error::Teardown(failures))
    }
}
