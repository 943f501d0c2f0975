//! Worker pool draining the job queue.
//!
//! Each worker thread owns its own SQLite connection; documents are
//! processed in parallel across workers with no ordering guarantees
//! between them. Retryable failures go back on the queue with
//! exponential backoff; exceeding the retry budget is logged as a
//! permanent failure and left for the sweep to rediscover.

use std::path::PathBuf;
use std::sync::Arc;

use crate::db::sqlite::open_database;
use crate::jobs::queue::{Job, JobQueue};
use crate::pipeline::orchestrator::DocumentPipeline;

/// Retries per job after the initial attempt.
pub const MAX_JOB_RETRIES: u32 = 3;

/// Handle for the worker threads. Shuts the queue down and joins the
/// workers on drop.
pub struct WorkerPool {
    queue: Arc<JobQueue>,
    handles: Vec<std::thread::JoinHandle<()>>,
}

impl WorkerPool {
    /// Request shutdown. Running jobs complete; queued jobs are dropped.
    pub fn shutdown(&self) {
        self.queue.shutdown();
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
        for handle in self.handles.drain(..) {
            let _ = handle.join();
        }
    }
}

/// Start `count` worker threads draining the queue.
pub fn start_workers(
    queue: Arc<JobQueue>,
    pipeline: Arc<DocumentPipeline>,
    db_path: PathBuf,
    count: usize,
) -> WorkerPool {
    let mut handles = Vec::with_capacity(count);
    for worker_id in 0..count {
        let queue = Arc::clone(&queue);
        let pipeline = Arc::clone(&pipeline);
        let db_path = db_path.clone();
        handles.push(std::thread::spawn(move || {
            tracing::info!(worker_id, "Processing worker started");
            worker_loop(worker_id, &queue, &pipeline, &db_path);
            tracing::info!(worker_id, "Processing worker stopped");
        }));
    }

    WorkerPool { queue, handles }
}

fn worker_loop(
    worker_id: usize,
    queue: &JobQueue,
    pipeline: &DocumentPipeline,
    db_path: &std::path::Path,
) {
    while let Some(job) = queue.pop_ready() {
        run_job(worker_id, queue, pipeline, db_path, job);
    }
}

fn run_job(
    worker_id: usize,
    queue: &JobQueue,
    pipeline: &DocumentPipeline,
    db_path: &std::path::Path,
    job: Job,
) {
    let conn = match open_database(db_path) {
        Ok(conn) => conn,
        Err(e) => {
            tracing::error!(worker_id, error = %e, "Worker could not open database");
            retry_or_fail(queue, &job);
            return;
        }
    };

    match pipeline.process(&conn, job.document_id) {
        Ok(report) => {
            tracing::debug!(
                worker_id,
                document_id = %job.document_id,
                summaries = report.summaries_created,
                skipped = report.skipped,
                "Job finished"
            );
        }
        Err(e) if e.is_retryable() => {
            tracing::warn!(
                worker_id,
                document_id = %job.document_id,
                attempt = job.attempt,
                error = %e,
                "Job failed"
            );
            retry_or_fail(queue, &job);
        }
        Err(e) => {
            // Terminal: the document does not exist. Nothing to retry.
            tracing::error!(
                worker_id,
                document_id = %job.document_id,
                error = %e,
                "Job dropped"
            );
        }
    }
}

fn retry_or_fail(queue: &JobQueue, job: &Job) {
    let next_attempt = job.attempt + 1;
    if next_attempt > MAX_JOB_RETRIES {
        tracing::error!(
            document_id = %job.document_id,
            attempts = job.attempt + 1,
            "Job permanently failed; document left for the sweep"
        );
        return;
    }
    queue.schedule_retry(job.document_id, next_attempt);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository;
    use crate::db::sqlite::open_memory_database;
    use crate::models::enums::{Language, ProcessingStatus};
    use crate::models::{Document, Region};
    use crate::pipeline::backend::MockBackend;
    use crate::pipeline::explain::{ExplainerConfig, ExplanationGenerator};
    use crate::pipeline::summarize::{Summarizer, SummarizerConfig};
    use std::time::Duration;

    fn quick_pipeline() -> Arc<DocumentPipeline> {
        let summarizer = Summarizer::with_config(
            Box::new(MockBackend::new(
                "The budget expands funding for gender equality and inclusion programs.",
            )),
            SummarizerConfig {
                retry_delay: Duration::ZERO,
                ..SummarizerConfig::default()
            },
        );
        let explainer = ExplanationGenerator::with_config(
            Box::new(MockBackend::new(
                "This budget puts more money into programs for women and for people who \
                 are often left out of public services.",
            )),
            ExplainerConfig {
                retry_delay: Duration::ZERO,
                ..ExplainerConfig::default()
            },
        );
        Arc::new(DocumentPipeline::new(summarizer, explainer))
    }

    #[test]
    fn worker_processes_enqueued_document_end_to_end() {
        use crate::pipeline::extraction::pdf::test_support::make_test_pdf;

        // File-backed database so worker threads see the same data
        let db_file = tempfile::NamedTempFile::new().unwrap();
        let db_path = db_file.path().to_path_buf();
        let conn = crate::db::sqlite::open_database(&db_path).unwrap();

        let region = Region::new("Uganda", "UG");
        repository::insert_region(&conn, &region).unwrap();
        let pdf = make_test_pdf(
            "The national budget allocates significant funding for gender equality \
             programs and the empowerment of women and girls across the country.",
        );
        let doc = Document::new(
            "Uganda Budget 2025",
            None,
            Some(pdf.path().to_string_lossy().into()),
            region.id,
        );
        repository::insert_document(&conn, &doc).unwrap();

        let queue = Arc::new(JobQueue::new());
        let pool = start_workers(Arc::clone(&queue), quick_pipeline(), db_path, 2);
        queue.enqueue(doc.id);

        // Wait for the terminal status
        let deadline = std::time::Instant::now() + Duration::from_secs(10);
        loop {
            let status = repository::get_document(&conn, &doc.id)
                .unwrap()
                .unwrap()
                .processing_status;
            if status != ProcessingStatus::Unprocessed {
                break;
            }
            assert!(std::time::Instant::now() < deadline, "worker never finished");
            std::thread::sleep(Duration::from_millis(25));
        }

        drop(pool);

        let summaries = repository::list_summaries_for_document(&conn, &doc.id).unwrap();
        assert_eq!(summaries.len(), Language::ALL.len());
    }

    #[test]
    fn missing_document_job_is_dropped_not_retried() {
        let db_file = tempfile::NamedTempFile::new().unwrap();
        let db_path = db_file.path().to_path_buf();
        crate::db::sqlite::open_database(&db_path).unwrap();

        let queue = Arc::new(JobQueue::new());
        let pool = start_workers(Arc::clone(&queue), quick_pipeline(), db_path, 1);
        queue.enqueue(uuid::Uuid::new_v4());

        // Give the worker time to drop the job; no retry should appear
        std::thread::sleep(Duration::from_millis(200));
        assert!(queue.is_empty());
        drop(pool);
    }

    #[test]
    fn retry_budget_is_finite() {
        let queue = JobQueue::new();
        let job = Job {
            document_id: uuid::Uuid::new_v4(),
            attempt: MAX_JOB_RETRIES,
        };
        retry_or_fail(&queue, &job);
        // Budget exhausted; nothing re-queued
        assert!(queue.is_empty());

        let fresh = Job {
            document_id: uuid::Uuid::new_v4(),
            attempt: 0,
        };
        retry_or_fail(&queue, &fresh);
        assert_eq!(queue.len(), 1);
    }
}
