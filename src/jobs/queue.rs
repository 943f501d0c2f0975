//! In-process delayed job queue.
//!
//! Jobs become visible at their `run_at` instant, which is how retry
//! backoff is expressed: a failed job is re-queued with
//! `delay = base^attempt` seconds. Retry state lives on the job itself,
//! not in any task's call stack.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};

use uuid::Uuid;

/// Exponential backoff base: retry n waits base^n seconds.
pub const BACKOFF_BASE_SECS: u64 = 2;

/// A processing job for one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub document_id: Uuid,
    /// How many retries preceded this run (0 = first attempt).
    pub attempt: u32,
}

#[derive(Debug)]
struct QueuedJob {
    run_at: Instant,
    job: Job,
}

impl PartialEq for QueuedJob {
    fn eq(&self, other: &Self) -> bool {
        self.run_at == other.run_at
    }
}
impl Eq for QueuedJob {}
impl PartialOrd for QueuedJob {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for QueuedJob {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.run_at.cmp(&other.run_at)
    }
}

struct QueueState {
    heap: BinaryHeap<Reverse<QueuedJob>>,
    shutdown: bool,
}

/// Trigger interface consumed by the document write paths and the
/// sweep. Explicit calls instead of hidden save hooks keep the trigger
/// point visible and testable.
pub trait ProcessingTrigger: Send + Sync {
    fn enqueue_document(&self, document_id: Uuid);
}

/// Delayed queue feeding the worker pool.
pub struct JobQueue {
    state: Mutex<QueueState>,
    available: Condvar,
}

impl JobQueue {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(QueueState {
                heap: BinaryHeap::new(),
                shutdown: false,
            }),
            available: Condvar::new(),
        }
    }

    /// Enqueue a first-attempt job, visible immediately.
    pub fn enqueue(&self, document_id: Uuid) {
        self.push(
            Job {
                document_id,
                attempt: 0,
            },
            Instant::now(),
        );
    }

    /// Re-enqueue a failed job with exponential backoff.
    pub fn schedule_retry(&self, document_id: Uuid, attempt: u32) {
        let delay = Duration::from_secs(BACKOFF_BASE_SECS.saturating_pow(attempt));
        tracing::info!(
            document_id = %document_id,
            attempt,
            delay_secs = delay.as_secs(),
            "Scheduling processing retry"
        );
        self.push(
            Job {
                document_id,
                attempt,
            },
            Instant::now() + delay,
        );
    }

    fn push(&self, job: Job, run_at: Instant) {
        let mut state = self.state.lock().expect("queue lock");
        state.heap.push(Reverse(QueuedJob { run_at, job }));
        drop(state);
        self.available.notify_one();
    }

    /// Block until a job is ready or the queue shuts down.
    /// Returns `None` only on shutdown.
    pub fn pop_ready(&self) -> Option<Job> {
        let mut state = self.state.lock().expect("queue lock");
        loop {
            if state.shutdown {
                return None;
            }

            let now = Instant::now();
            let next_run = state.heap.peek().map(|Reverse(queued)| queued.run_at);
            match next_run {
                Some(run_at) if run_at <= now => {
                    let Reverse(queued) = state.heap.pop().expect("peeked job");
                    return Some(queued.job);
                }
                Some(run_at) => {
                    let (next, _timeout) = self
                        .available
                        .wait_timeout(state, run_at - now)
                        .expect("queue lock");
                    state = next;
                }
                None => {
                    state = self.available.wait(state).expect("queue lock");
                }
            }
        }
    }

    /// Non-blocking variant: a ready job if one exists right now.
    pub fn try_pop_ready(&self) -> Option<Job> {
        let mut state = self.state.lock().expect("queue lock");
        if state.shutdown {
            return None;
        }
        let ready = state
            .heap
            .peek()
            .is_some_and(|Reverse(queued)| queued.run_at <= Instant::now());
        if ready {
            let Reverse(queued) = state.heap.pop().expect("peeked job");
            Some(queued.job)
        } else {
            None
        }
    }

    /// Wake every waiting worker and refuse further pops.
    pub fn shutdown(&self) {
        let mut state = self.state.lock().expect("queue lock");
        state.shutdown = true;
        drop(state);
        self.available.notify_all();
    }

    pub fn len(&self) -> usize {
        self.state.lock().expect("queue lock").heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for JobQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessingTrigger for JobQueue {
    fn enqueue_document(&self, document_id: Uuid) {
        tracing::info!(document_id = %document_id, "Enqueued document for processing");
        self.enqueue(document_id);
    }
}
