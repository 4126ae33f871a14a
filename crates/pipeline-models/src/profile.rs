//! Processing profiles: per-task-type worker pool presets plus task
//! settings, grounded on `services/processing_profiles.py`.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::task::TaskType;

/// The class of resource a worker pool contends for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    Cpu,
    Gpu,
    Io,
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ResourceType::Cpu => "cpu",
            ResourceType::Gpu => "gpu",
            ResourceType::Io => "io",
        };
        write!(f, "{}", s)
    }
}

/// Worker pool sizing and scheduling hints for one task type.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema)]
pub struct WorkerConfig {
    pub task_type: TaskType,
    pub worker_count: u32,
    pub resource_type: ResourceType,
    pub priority: u8,
    /// Hard per-task timeout; defaults to 1800s per `spec.md` §4.2 unless
    /// overridden per type.
    pub task_timeout_seconds: u64,
}

impl WorkerConfig {
    pub fn new(task_type: TaskType, worker_count: u32, resource_type: ResourceType, priority: u8) -> Self {
        Self {
            task_type,
            worker_count,
            resource_type,
            priority,
            task_timeout_seconds: 1800,
        }
    }

    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.task_timeout_seconds = seconds;
        self
    }
}

/// Sampling/model settings shared across a profile's task pools.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TaskSettings {
    pub max_concurrent_videos: u32,
    pub frame_sampling_interval: u32,
    pub face_sampling_interval_seconds: f64,
    pub transcription_model: String,
    pub object_detection_model: String,
    pub face_detection_model: String,
}

impl Default for TaskSettings {
    fn default() -> Self {
        Self {
            max_concurrent_videos: 5,
            frame_sampling_interval: 30,
            face_sampling_interval_seconds: 5.0,
            transcription_model: "large-v3".to_string(),
            object_detection_model: "yolov8n.pt".to_string(),
            face_detection_model: "yolov8n-face.pt".to_string(),
        }
    }
}

/// The four canonical processing profiles named in `spec.md` §4.2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProfileType {
    Balanced,
    SearchFirst,
    VisualFirst,
    LowResource,
}

impl ProfileType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileType::Balanced => "balanced",
            ProfileType::SearchFirst => "search_first",
            ProfileType::VisualFirst => "visual_first",
            ProfileType::LowResource => "low_resource",
        }
    }
}

impl fmt::Display for ProfileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ProcessingProfile {
    pub name: String,
    pub description: String,
    pub worker_configs: HashMap<TaskType, WorkerConfig>,
    pub task_settings: TaskSettings,
}

impl ProcessingProfile {
    pub fn get(&self, task_type: TaskType) -> Option<&WorkerConfig> {
        self.worker_configs.get(&task_type)
    }
}

fn wc(task_type: TaskType, count: u32, resource: ResourceType, priority: u8) -> (TaskType, WorkerConfig) {
    (task_type, WorkerConfig::new(task_type, count, resource, priority))
}

/// `metadata_extraction` and `thumbnail_extraction` are not metered by a
/// dedicated `WorkerConfig` in the source profiles; every profile assigns
/// both a single low-priority CPU worker for consistency (DESIGN.md §4.2
/// addition).
fn with_unmetered_defaults(mut configs: HashMap<TaskType, WorkerConfig>) -> HashMap<TaskType, WorkerConfig> {
    configs.entry(TaskType::MetadataExtraction).or_insert_with(|| {
        WorkerConfig::new(TaskType::MetadataExtraction, 1, ResourceType::Cpu, 4)
    });
    configs.entry(TaskType::ThumbnailExtraction).or_insert_with(|| {
        WorkerConfig::new(TaskType::ThumbnailExtraction, 1, ResourceType::Cpu, 4)
    });
    configs
}

/// Builds the `balanced` profile — even resource distribution, the default.
pub fn balanced() -> ProcessingProfile {
    use ResourceType::*;
    use TaskType::*;
    let configs = HashMap::from([
        wc(Hash, 4, Cpu, 1),
        wc(Transcription, 2, Cpu, 2),
        wc(SceneDetection, 2, Cpu, 3),
        wc(ObjectDetection, 2, Gpu, 3),
        wc(FaceDetection, 2, Gpu, 3),
        wc(Ocr, 2, Gpu, 3),
        wc(PlaceDetection, 2, Gpu, 3),
        wc(TopicExtraction, 1, Cpu, 4),
        wc(EmbeddingGeneration, 2, Cpu, 2),
        wc(ThumbnailGeneration, 1, Cpu, 4),
    ]);
    ProcessingProfile {
        name: "balanced".to_string(),
        description: "Even resource distribution, optimized for general use".to_string(),
        worker_configs: with_unmetered_defaults(configs),
        task_settings: TaskSettings {
            max_concurrent_videos: 5,
            frame_sampling_interval: 30,
            face_sampling_interval_seconds: 5.0,
            ..Default::default()
        },
    }
}

/// Builds the `search_first` profile — prioritizes getting videos
/// searchable (hash + transcription throughput) quickly.
pub fn search_first() -> ProcessingProfile {
    use ResourceType::*;
    use TaskType::*;
    let configs = HashMap::from([
        wc(Hash, 6, Cpu, 1),
        wc(Transcription, 4, Cpu, 1),
        wc(SceneDetection, 1, Cpu, 4),
        wc(ObjectDetection, 1, Gpu, 4),
        wc(FaceDetection, 1, Gpu, 4),
        wc(Ocr, 2, Gpu, 2),
        wc(PlaceDetection, 1, Gpu, 4),
        wc(TopicExtraction, 1, Cpu, 3),
        wc(EmbeddingGeneration, 2, Cpu, 1),
        wc(ThumbnailGeneration, 1, Cpu, 4),
    ]);
    ProcessingProfile {
        name: "search_first".to_string(),
        description: "Prioritize getting videos searchable quickly".to_string(),
        worker_configs: with_unmetered_defaults(configs),
        task_settings: TaskSettings {
            max_concurrent_videos: 10,
            frame_sampling_interval: 60,
            face_sampling_interval_seconds: 10.0,
            ..Default::default()
        },
    }
}

/// Builds the `visual_first` profile — prioritizes object/face detection
/// for visual navigation.
pub fn visual_first() -> ProcessingProfile {
    use ResourceType::*;
    use TaskType::*;
    let configs = HashMap::from([
        wc(Hash, 3, Cpu, 1),
        wc(Transcription, 1, Cpu, 3),
        wc(SceneDetection, 2, Cpu, 2),
        wc(ObjectDetection, 3, Gpu, 1),
        wc(FaceDetection, 3, Gpu, 1),
        wc(Ocr, 2, Gpu, 2),
        wc(PlaceDetection, 2, Gpu, 2),
        wc(TopicExtraction, 1, Cpu, 4),
        wc(EmbeddingGeneration, 1, Cpu, 3),
        wc(ThumbnailGeneration, 2, Cpu, 2),
    ]);
    ProcessingProfile {
        name: "visual_first".to_string(),
        description: "Prioritize object and face detection for visual navigation".to_string(),
        worker_configs: with_unmetered_defaults(configs),
        task_settings: TaskSettings {
            max_concurrent_videos: 3,
            frame_sampling_interval: 15,
            face_sampling_interval_seconds: 2.0,
            ..Default::default()
        },
    }
}

/// Builds the `low_resource` profile — minimal resource usage for
/// background processing.
pub fn low_resource() -> ProcessingProfile {
    use ResourceType::*;
    use TaskType::*;
    let configs = HashMap::from([
        wc(Hash, 2, Cpu, 1),
        wc(Transcription, 1, Cpu, 2),
        wc(SceneDetection, 1, Cpu, 3),
        wc(ObjectDetection, 1, Gpu, 3),
        wc(FaceDetection, 1, Gpu, 3),
        wc(Ocr, 1, Gpu, 4),
        wc(PlaceDetection, 1, Gpu, 4),
        wc(TopicExtraction, 1, Cpu, 4),
        wc(EmbeddingGeneration, 1, Cpu, 2),
        wc(ThumbnailGeneration, 1, Cpu, 4),
    ]);
    ProcessingProfile {
        name: "low_resource".to_string(),
        description: "Minimal resource usage for background processing".to_string(),
        worker_configs: with_unmetered_defaults(configs),
        task_settings: TaskSettings {
            max_concurrent_videos: 1,
            frame_sampling_interval: 120,
            face_sampling_interval_seconds: 30.0,
            ..Default::default()
        },
    }
}

/// Resolve a profile by its `ProfileType`.
pub fn by_type(profile_type: ProfileType) -> ProcessingProfile {
    match profile_type {
        ProfileType::Balanced => balanced(),
        ProfileType::SearchFirst => search_first(),
        ProfileType::VisualFirst => visual_first(),
        ProfileType::LowResource => low_resource(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balanced_matches_documented_preset() {
        let p = balanced();
        let hash_cfg = p.get(TaskType::Hash).unwrap();
        assert_eq!(hash_cfg.worker_count, 4);
        assert_eq!(hash_cfg.resource_type, ResourceType::Cpu);
        assert_eq!(hash_cfg.priority, 1);
    }

    #[test]
    fn every_profile_covers_every_task_type() {
        for profile_type in [
            ProfileType::Balanced,
            ProfileType::SearchFirst,
            ProfileType::VisualFirst,
            ProfileType::LowResource,
        ] {
            let profile = by_type(profile_type);
            for task_type in TaskType::ALL {
                assert!(
                    profile.get(task_type).is_some(),
                    "{} missing worker config for {}",
                    profile.name,
                    task_type
                );
            }
        }
    }

    #[test]
    fn search_first_allows_more_concurrent_videos_than_low_resource() {
        assert!(search_first().task_settings.max_concurrent_videos > low_resource().task_settings.max_concurrent_videos);
    }
}
