//! Redis Streams job queue for ML task dispatch (`spec.md` §4.5).
//!
//! This crate provides:
//! - Deterministic-id job enqueueing via Redis Streams, one stream per task
//!   type
//! - Worker consumption with crash recovery (`XPENDING`/`XCLAIM`) and DLQ
//! - The queue-side half of the reconciler contract (`job_exists`); the
//!   periodic sweep itself lives in `pipeline-worker`, which holds both this
//!   queue (via `pipeline-orchestrator`) and the durable store

pub mod error;
pub mod job;
pub mod queue;

pub use error::{QueueError, QueueResult};
pub use job::{job_id_for, MlTaskJob};
pub use queue::{JobQueue, QueueConfig};
