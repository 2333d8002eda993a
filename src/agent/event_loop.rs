//! Run an agent until asked to shut down.

use crate::agent::Agent;
use crate::core::Result;
use crate::monitoring::{LogEntry, LogLevel};
use std::future::Future;

/// Start `agent`, wait for `shutdown`, then stop it.
///
/// A startup failure is returned right away without calling `stop`:
/// phase failures have already released the plugins they initialized.
pub async fn run_until<F>(agent: &Agent, shutdown: F) -> Result<()>
where
    F: Future<Output = ()>,
{
    if let Err(err) = agent.start().await {
        agent.shared.log(
            LogEntry::new(LogLevel::Error, "Error loading core").with_field("error", err.to_string()),
        );
        return Err(err);
    }

    shutdown.await;

    let result = agent.stop().await;
    if let Err(err) = &result {
        agent.shared.log(
            LogEntry::new(LogLevel::Error, "Agent stop error").with_field("error", err.to_string()),
        );
    }
    result
}

/// Start `agent` and stop it on Ctrl-C.
pub async fn run_until_interrupted(agent: &Agent) -> Result<()> {
    run_until(agent, async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            agent.shared.log(
                LogEntry::new(LogLevel::Error, "Unable to listen for interrupt, stopping")
                    .with_field("error", err.to_string()),
            );
        }
    })
    .await
}
