//! Periodic self-healing sweep.
//!
//! Triggers can get lost (a crash between insert and enqueue, a
//! permanently failed job). The sweep re-enqueues documents that are
//! still unprocessed or ended up with zero summaries, in small batches
//! so a backlog cannot flood the queue.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::db::repository;
use crate::db::sqlite::open_database;
use crate::jobs::queue::ProcessingTrigger;

/// Sweep cadence: every 15 minutes.
const SWEEP_INTERVAL_SECS: u64 = 15 * 60;

/// Sleep granularity for shutdown responsiveness (5 seconds).
const SLEEP_GRANULARITY_SECS: u64 = 5;

/// Per-sweep re-enqueue batch size.
const SWEEP_BATCH_SIZE: u32 = 10;

/// Handle for the sweep thread.
///
/// Supports graceful shutdown via `shutdown()` or automatic cleanup on
/// `Drop`.
pub struct SweepHandle {
    shutdown: Arc<AtomicBool>,
    handle: Option<std::thread::JoinHandle<()>>,
}

impl SweepHandle {
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }
}

impl Drop for SweepHandle {
    fn drop(&mut self) {
        self.shutdown();
        if let Some(h) = self.handle.take() {
            let _ = h.join();
        }
    }
}

/// Start the sweep on its own thread.
pub fn start_sweep(db_path: PathBuf, trigger: Arc<dyn ProcessingTrigger>) -> SweepHandle {
    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = shutdown.clone();

    let handle = std::thread::spawn(move || {
        tracing::info!("Sweep started (every {SWEEP_INTERVAL_SECS}s)");
        sweep_loop(&db_path, trigger.as_ref(), &flag);
        tracing::info!("Sweep shutting down");
    });

    SweepHandle {
        shutdown,
        handle: Some(handle),
    }
}

fn sweep_loop(db_path: &std::path::Path, trigger: &dyn ProcessingTrigger, shutdown: &AtomicBool) {
    loop {
        // Sleep in small increments for responsive shutdown
        for _ in 0..(SWEEP_INTERVAL_SECS / SLEEP_GRANULARITY_SECS) {
            if shutdown.load(Ordering::Relaxed) {
                return;
            }
            std::thread::sleep(Duration::from_secs(SLEEP_GRANULARITY_SECS));
        }

        if let Err(e) = run_sweep_once(db_path, trigger) {
            tracing::warn!(error = %e, "Sweep pass failed");
        }
    }
}

/// One sweep pass: re-enqueue stuck documents. Separated from the loop
/// so it is testable without threads.
pub fn run_sweep_once(
    db_path: &std::path::Path,
    trigger: &dyn ProcessingTrigger,
) -> Result<usize, crate::db::DatabaseError> {
    let conn = open_database(db_path)?;
    let stuck = repository::find_stuck_documents(&conn, SWEEP_BATCH_SIZE)?;

    for document_id in &stuck {
        trigger.enqueue_document(*document_id);
    }

    if !stuck.is_empty() {
        tracing::info!(count = stuck.len(), "Sweep re-enqueued stuck documents");
    }
    Ok(stuck.len())
}
