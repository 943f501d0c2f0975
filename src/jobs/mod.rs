//! Background processing: job queue, worker pool, and the periodic
//! self-healing sweep.

pub mod queue;
pub mod sweep;
pub mod worker;

pub use queue::{Job, JobQueue, ProcessingTrigger};
pub use sweep::{start_sweep, SweepHandle};
pub use worker::{start_workers, WorkerPool};
