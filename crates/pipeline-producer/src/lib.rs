//! Wire contract and provenance hashing for ML producers.
//!
//! This crate intentionally carries no HTTP client: invoking a producer
//! process is a `pipeline-worker` concern. What lives here is the shared
//! vocabulary both sides serialize against, plus the two hash functions
//! every artifact's `Provenance` is stamped with.

mod contract;
mod hash;

pub use contract::{
    Bbox, Classification, Detection, Metadata, Prediction, ProducerConfig, ProducerRequest,
    ProducerResponse, ProducerResult, Scene, Segment, verify_input_hash,
};
pub use hash::{HashError, config_hash, input_hash};
