#![deny(unreachable_patterns)]
//! Per-type worker pools, ML producer dispatch, and the reconciler sweep
//! scheduler (`spec.md` §4.2, §4.5, §6).

pub mod config;
pub mod convert;
pub mod error;
pub mod gpu;
pub mod pool;
pub mod producer_client;
pub mod reconciler;
pub mod retry;
pub mod task_executor;

pub use config::WorkerSettings;
pub use error::{WorkerError, WorkerResult};
pub use gpu::GpuGate;
pub use pool::WorkerPool;
pub use producer_client::ProducerClient;
pub use task_executor::TaskExecutor;
