//! Postgres store integration tests.

use chrono::Utc;
use pipeline_models::{
    ArtifactEnvelope, ArtifactId, ArtifactType, ModelProfile, Provenance, RunId, SceneV1,
    SelectionPolicy, Task, TaskType, Video,
};
use pipeline_store::{AssetQuery, ArtifactStore, SchemaRegistry, TaskRepository, VideoRepository};

async fn connected_pool() -> sqlx::PgPool {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = pipeline_store::connect(&database_url)
        .await
        .expect("failed to connect to Postgres");
    pipeline_store::run_migrations(&pool)
        .await
        .expect("failed to run migrations");
    pool
}

fn scene_envelope(asset_id: pipeline_models::VideoId, start_ms: i64, end_ms: i64) -> ArtifactEnvelope {
    ArtifactEnvelope {
        artifact_id: ArtifactId::new(),
        asset_id,
        artifact_type: ArtifactType::Scene,
        schema_version: 1,
        span_start_ms: start_ms,
        span_end_ms: end_ms,
        payload: pipeline_models::ArtifactPayload::Scene(SceneV1 {
            scene_index: 0,
            start_ms,
            end_ms,
            duration_ms: end_ms - start_ms,
        }),
        provenance: Provenance {
            producer: "scene-detector".to_string(),
            producer_version: "1.0.0".to_string(),
            model_profile: ModelProfile::Balanced,
            config_hash: "0123456789abcdef".to_string(),
            input_hash: "fedcba9876543210".to_string(),
            run_id: RunId::new(),
            created_at: Utc::now(),
        },
    }
}

/// Video/task round trip, ending in an atomic claim.
#[tokio::test]
#[ignore = "requires Postgres"]
async fn test_video_and_task_round_trip() {
    let pool = connected_pool().await;
    let videos = VideoRepository::new(pool.clone());
    let tasks = TaskRepository::new(pool.clone());

    let video = Video::discovered("/videos/a.mp4", "a.mp4", 4096, Utc::now());
    videos.save(&video).await.expect("failed to save video");

    let fetched = videos
        .get(video.video_id)
        .await
        .expect("failed to fetch video");
    assert_eq!(fetched.video_id, video.video_id);
    assert_eq!(fetched.filename, "a.mp4");

    let task = Task::new(video.video_id, TaskType::Hash, None);
    tasks.save(&task).await.expect("failed to save task");

    let claimed = tasks
        .claim_next_pending(TaskType::Hash)
        .await
        .expect("failed to claim task")
        .expect("expected a pending hash task");
    assert_eq!(claimed.task_id, task.task_id);
    assert_eq!(claimed.status, pipeline_models::TaskStatus::Running);

    // A second claim finds nothing left pending for this type.
    let none_left = tasks
        .claim_next_pending(TaskType::Hash)
        .await
        .expect("failed to claim task");
    assert!(none_left.is_none());

    videos.delete(video.video_id).await.expect("failed to delete video");
}

/// Artifact creation validates the payload against the schema registry
/// before ever touching the database.
#[tokio::test]
#[ignore = "requires Postgres"]
async fn test_artifact_create_rejects_invalid_span() {
    let pool = connected_pool().await;
    let store = ArtifactStore::new(pool.clone(), SchemaRegistry::with_builtin_schemas());
    let videos = VideoRepository::new(pool.clone());

    let video = Video::discovered("/videos/b.mp4", "b.mp4", 4096, Utc::now());
    videos.save(&video).await.expect("failed to save video");

    let mut envelope = scene_envelope(video.video_id, 5_000, 1_000);
    envelope.span_start_ms = 5_000;
    envelope.span_end_ms = 1_000;

    let result = store.create(envelope).await;
    assert!(result.is_err(), "expected an out-of-order span to be rejected");

    videos.delete(video.video_id).await.expect("failed to delete video");
}

/// Artifacts round-trip through `get_by_asset`, and the `pinned` selection
/// policy narrows to a single run.
#[tokio::test]
#[ignore = "requires Postgres"]
async fn test_artifact_get_by_asset_with_pinned_selection() {
    let pool = connected_pool().await;
    let store = ArtifactStore::new(pool.clone(), SchemaRegistry::with_builtin_schemas());
    let videos = VideoRepository::new(pool.clone());

    let video = Video::discovered("/videos/c.mp4", "c.mp4", 4096, Utc::now());
    videos.save(&video).await.expect("failed to save video");

    let first = scene_envelope(video.video_id, 0, 2_000);
    let pinned_run = first.provenance.run_id;
    store.create(first).await.expect("failed to create first envelope");

    let second = scene_envelope(video.video_id, 2_000, 4_000);
    store.create(second).await.expect("failed to create second envelope");

    let all = store
        .get_by_asset(video.video_id, &AssetQuery::default())
        .await
        .expect("failed to fetch by asset");
    assert_eq!(all.len(), 2);

    let pinned_query = AssetQuery {
        selection: Some(SelectionPolicy::Pinned { pinned_run_id: pinned_run }),
        ..Default::default()
    };
    let pinned = store
        .get_by_asset(video.video_id, &pinned_query)
        .await
        .expect("failed to fetch pinned envelopes");
    assert_eq!(pinned.len(), 1);
    assert_eq!(pinned[0].provenance.run_id, pinned_run);

    videos.delete(video.video_id).await.expect("failed to delete video");
}
