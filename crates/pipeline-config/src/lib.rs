//! Typed, environment-driven configuration for the video analysis pipeline.
//!
//! Mirrors `vclip-worker::config::WorkerConfig::from_env()`'s pattern:
//! every field has a documented fallback default and is independently
//! overridable via an env var.

use std::time::Duration;

use pipeline_models::ProfileType;

mod gpu_mode;
pub use gpu_mode::GpuMode;

/// Process-wide configuration surface named in `spec.md` §6: processing
/// profile, GPU mode/concurrency, per-type worker count/timeout overrides,
/// Redis/database connection strings, model cache directory, polling
/// intervals.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub database_url: String,
    pub redis_url: String,
    pub processing_profile: ProfileType,
    pub gpu_mode: GpuMode,
    pub gpu_concurrency: usize,
    pub reconcile_interval: Duration,
    pub stall_threshold: Duration,
    pub claim_poll_interval: Duration,
    pub claim_min_idle: Duration,
    pub task_timeout: Duration,
    pub model_cache_dir: String,
}

impl PipelineConfig {
    /// Load configuration from the environment, applying `.env` first
    /// (via `dotenvy`) if present, same as every teacher binary's `main()`.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            database_url: std::env::var("DATABASE_URL")
                .expect("DATABASE_URL must be set"),
            redis_url: std::env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string()),
            processing_profile: std::env::var("PROCESSING_PROFILE")
                .ok()
                .and_then(|s| parse_profile(&s))
                .unwrap_or(ProfileType::Balanced),
            gpu_mode: std::env::var("GPU_MODE")
                .ok()
                .and_then(|s| GpuMode::parse(&s))
                .unwrap_or(GpuMode::Auto),
            gpu_concurrency: env_parse("GPU_CONCURRENCY").unwrap_or(2),
            reconcile_interval: Duration::from_secs(
                env_parse("RECONCILE_INTERVAL_SECS").unwrap_or(300),
            ),
            stall_threshold: Duration::from_secs(
                env_parse("STALL_THRESHOLD_SECS").unwrap_or(3600),
            ),
            claim_poll_interval: Duration::from_secs(
                env_parse("CLAIM_POLL_INTERVAL_SECS").unwrap_or(30),
            ),
            claim_min_idle: Duration::from_millis(
                env_parse("CLAIM_MIN_IDLE_MS").unwrap_or(300_000),
            ),
            task_timeout: Duration::from_secs(env_parse("TASK_TIMEOUT_SECS").unwrap_or(1800)),
            model_cache_dir: std::env::var("MODEL_CACHE_DIR")
                .unwrap_or_else(|_| "./model-cache".to_string()),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.parse().ok())
}

fn parse_profile(s: &str) -> Option<ProfileType> {
    match s {
        "balanced" => Some(ProfileType::Balanced),
        "search_first" => Some(ProfileType::SearchFirst),
        "visual_first" => Some(ProfileType::VisualFirst),
        "low_resource" => Some(ProfileType::LowResource),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_profile_recognizes_all_four_canonical_names() {
        assert_eq!(parse_profile("balanced"), Some(ProfileType::Balanced));
        assert_eq!(parse_profile("search_first"), Some(ProfileType::SearchFirst));
        assert_eq!(parse_profile("visual_first"), Some(ProfileType::VisualFirst));
        assert_eq!(parse_profile("low_resource"), Some(ProfileType::LowResource));
        assert_eq!(parse_profile("bogus"), None);
    }
}
