//! Periodic removal of expired jobs, profiles and their image files.
//!
//! The first tick fires immediately, so anything that expired while the
//! server was down is cleaned up at startup.

use std::time::Duration;

use chrono::Utc;
use persona_pipeline::ExpiryReaper;
use tokio_util::sync::CancellationToken;

/// Run the expiry sweep every `period` until `cancel` is triggered.
///
/// A sweep in progress is allowed to finish before the loop checks for
/// cancellation again.
pub async fn run(reaper: ExpiryReaper, period: Duration, cancel: CancellationToken) {
    tracing::info!(interval_secs = period.as_secs(), "Expiry sweep job started");

    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Expiry sweep job stopping");
                break;
            }
            _ = interval.tick() => {
                match reaper.sweep_all(Utc::now()).await {
                    Ok(report) if report.jobs_removed + report.profiles_removed > 0 => {
                        tracing::info!(
                            users = report.users_swept,
                            jobs = report.jobs_removed,
                            profiles = report.profiles_removed,
                            files = report.files_removed,
                            files_failed = report.files_failed,
                            "Expiry sweep: purged expired data",
                        );
                    }
                    Ok(report) => {
                        tracing::debug!(
                            users = report.users_swept,
                            "Expiry sweep: nothing expired"
                        );
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Expiry sweep: could not list users");
                    }
                }
            }
        }
    }
}
