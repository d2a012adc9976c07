//! Background task management.

use crate::{state::AppState, workers::AutoCompleteWorker};
use tokio::sync::watch;

/// Spawn the background workers. The returned sender signals shutdown when
/// set to `true` (or dropped at process exit).
pub fn start_workers(state: &AppState) -> watch::Sender<bool> {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let jobs = &state.config.jobs;
    if jobs.auto_complete_enabled {
        let worker = AutoCompleteWorker::new(
            state.fhir.clone(),
            jobs.auto_complete_hour,
            jobs.auto_complete_minute,
        );
        tokio::spawn(worker.run(shutdown_rx));
        tracing::info!(
            hour = jobs.auto_complete_hour,
            minute = jobs.auto_complete_minute,
            "Medication auto-complete worker started"
        );
    } else {
        tracing::info!("Medication auto-complete worker disabled by configuration");
    }

    shutdown_tx
}
