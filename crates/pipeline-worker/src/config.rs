//! Runtime settings: the environment-driven configuration surface plus the
//! selected processing profile (`spec.md` §4.2, §6, grounded on
//! `vclip-worker::config::WorkerConfig::from_env`'s every-field-has-a-
//! fallback pattern — here split across `pipeline-config` for the process
//! surface and `pipeline-models::profile` for per-type worker sizing).

use pipeline_config::PipelineConfig;
use pipeline_models::profile::{by_type, ProcessingProfile};

#[derive(Debug, Clone)]
pub struct WorkerSettings {
    pub pipeline: PipelineConfig,
    pub profile: ProcessingProfile,
}

impl WorkerSettings {
    pub fn from_env() -> Self {
        let pipeline = PipelineConfig::from_env();
        let profile = by_type(pipeline.processing_profile);
        Self { pipeline, profile }
    }
}
