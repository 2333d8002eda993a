//! Races the background startup pipeline against the startup deadline.

use crate::agent::{startup, Shared};
use crate::core::{as_nanos, Error, Phase, Result};
use crate::monitoring::{LogEntry, LogLevel};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;

/// Spawn the pipeline and wait for its outcome or the deadline, whichever
/// comes first.
///
/// The pipeline is never aborted mid-plugin. After a timeout it either
/// keeps running detached (its result is logged and dropped) or, with
/// `cancel_on_timeout`, stops before its next plugin call and releases
/// whatever it initialized, including when it was already past the last one.
pub(crate) async fn supervise(
    shared: Arc<Shared>,
    limit: Duration,
    cancel_on_timeout: bool,
) -> Result<()> {
    let (outcome_tx, mut outcome_rx) = oneshot::channel();

    let pipeline = Arc::clone(&shared);
    tokio::spawn(async move {
        let outcome = startup::run(&pipeline).await;
        if pipeline.claim_outcome() {
            let _ = outcome_tx.send(outcome);
            return;
        }

        // The caller already got a timeout.
        let outcome = match outcome {
            Ok(()) if pipeline.is_cancelled() => {
                let initialized = pipeline.registry.len();
                startup::abort(&pipeline, Phase::AfterInit, initialized).await
            }
            other => other,
        };
        let entry = LogEntry::new(LogLevel::Warn, "Startup pipeline finished after timeout");
        let entry = match outcome {
            Ok(()) => entry.with_field("outcome", "ok"),
            Err(err) => entry.with_field("outcome", err.to_string()),
        };
        pipeline.log(entry);
    });

    tokio::select! {
        biased;
        outcome = &mut outcome_rx => report(&shared, outcome),
        _ = tokio::time::sleep(limit) => {
            // Cancel before claiming so a pipeline that loses the claim
            // always observes the flag.
            if cancel_on_timeout {
                shared.cancel();
            }
            if shared.claim_outcome() {
                return Err(timeout_error(&shared, limit));
            }
            // The pipeline finished right at the deadline; its outcome is in flight.
            match outcome_rx.await {
                Ok(Err(Error::PipelineAborted)) => Err(timeout_error(&shared, limit)),
                outcome => report(&shared, outcome),
            }
        }
    }
}

fn report(
    shared: &Shared,
    outcome: std::result::Result<Result<()>, oneshot::error::RecvError>,
) -> Result<()> {
    log_phase_durations(shared);
    match outcome {
        Ok(Ok(())) => {
            let total = shared.snapshot().total().unwrap_or_default();
            shared.log(
                LogEntry::new(LogLevel::Info, "All plugins initialized successfully")
                    .with_field("duration_ns", as_nanos(total)),
            );
            Ok(())
        }
        Ok(Err(err)) => {
            shared.log(
                LogEntry::new(LogLevel::Error, "Agent startup failed")
                    .with_field("error", err.to_string()),
            );
            Err(err)
        }
        Err(_) => Err(Error::Internal(
            "startup pipeline terminated without reporting".to_string(),
        )),
    }
}

fn log_phase_durations(shared: &Shared) {
    let progress = shared.snapshot();
    for (phase, elapsed) in [
        (Phase::Init, progress.init_elapsed),
        (Phase::AfterInit, progress.after_init_elapsed),
    ] {
        let entry = LogEntry::new(LogLevel::Info, format!("Agent {} took", phase))
            .with_field("phase", phase.to_string());
        match elapsed {
            Some(elapsed) => shared.log(entry.with_field("duration_ns", as_nanos(elapsed))),
            None => shared.log(entry.with_field("completed", false)),
        }
    }
}

fn timeout_error(shared: &Shared, limit: Duration) -> Error {
    let progress = shared.snapshot();
    let phase = progress.phase_in_flight().unwrap_or(Phase::AfterInit);
    let plugin = progress.current.unwrap_or_default();

    match phase {
        Phase::Init => {
            shared.log(LogEntry::new(LogLevel::Info, format!("Agent Init took > {:?}", limit)));
        }
        Phase::AfterInit => {
            let init = progress.init_elapsed.unwrap_or_default();
            shared.log(
                LogEntry::new(LogLevel::Info, "Agent Init took")
                    .with_field("duration_ns", as_nanos(init)),
            );
            shared.log(LogEntry::new(
                LogLevel::Info,
                format!("Agent AfterInit took > {:?}", limit),
            ));
        }
    }
    shared.log(
        LogEntry::new(LogLevel::Error, "Plugin not completed before timeout")
            .with_field("plugin", &plugin)
            .with_field("phase", phase.to_string()),
    );

    Error::Timeout {
        plugin,
        phase,
        limit,
    }
}
