//! Navigation engine integration tests against a real Postgres schema.

use chrono::{TimeZone, Utc};
use pipeline_models::{
    ArtifactEnvelope, ArtifactId, ArtifactType, ModelProfile, Provenance, RunId, SceneV1, Video,
};
use pipeline_nav::{JumpFilters, Kind, NavEngine};
use pipeline_store::{ArtifactStore, SchemaRegistry, VideoRepository};

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

/// Two videos, ordered by `file_created_at`; `jump_next` must cross from the
/// first video's last scene straight into the second video's first scene
/// rather than stopping at the current video's boundary.
#[tokio::test]
#[ignore = "requires Postgres"]
async fn test_jump_next_crosses_into_the_next_video_in_file_created_at_order() {
    let pool = connected_pool().await;
    let videos = VideoRepository::new(pool.clone());
    let store = ArtifactStore::new(pool.clone(), SchemaRegistry::with_builtin_schemas());
    let engine = NavEngine::new(pool.clone());

    let mut earlier = Video::discovered("/videos/earlier.mp4", "earlier.mp4", 4096, Utc::now());
    earlier.file_created_at = Some(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap());
    videos.save(&earlier).await.expect("failed to save earlier video");

    let mut later = Video::discovered("/videos/later.mp4", "later.mp4", 4096, Utc::now());
    later.file_created_at = Some(Utc.with_ymd_and_hms(2026, 1, 2, 0, 0, 0).unwrap());
    videos.save(&later).await.expect("failed to save later video");

    store
        .create(scene_envelope(earlier.video_id, 0, 2_000))
        .await
        .expect("failed to create earlier scene");
    let next_video_scene = store
        .create(scene_envelope(later.video_id, 0, 3_000))
        .await
        .expect("failed to create later scene");

    let page = engine
        .jump_next(earlier.video_id, Some(2_000), Kind::Scene, &JumpFilters::default(), 10)
        .await
        .expect("jump_next failed");

    assert_eq!(page.results.len(), 1);
    assert_eq!(page.results[0].video_id, later.video_id);
    assert_eq!(page.results[0].artifact_id, next_video_scene.artifact_id);
    assert!(!page.has_more);

    videos.delete(earlier.video_id).await.expect("failed to delete earlier video");
    videos.delete(later.video_id).await.expect("failed to delete later video");
}

/// `has_more` reflects whether a match exists beyond the requested page,
/// using the over-fetch-by-one technique.
#[tokio::test]
#[ignore = "requires Postgres"]
async fn test_jump_next_reports_has_more_when_additional_matches_exist() {
    let pool = connected_pool().await;
    let videos = VideoRepository::new(pool.clone());
    let store = ArtifactStore::new(pool.clone(), SchemaRegistry::with_builtin_schemas());
    let engine = NavEngine::new(pool.clone());

    let video = Video::discovered("/videos/many-scenes.mp4", "many-scenes.mp4", 4096, Utc::now());
    videos.save(&video).await.expect("failed to save video");

    for (start, end) in [(0, 1_000), (1_000, 2_000), (2_000, 3_000)] {
        store
            .create(scene_envelope(video.video_id, start, end))
            .await
            .expect("failed to create scene");
    }

    let page = engine
        .jump_next(video.video_id, Some(0), Kind::Scene, &JumpFilters::default(), 1)
        .await
        .expect("jump_next failed");

    assert_eq!(page.results.len(), 1);
    assert!(page.has_more, "expected a further scene beyond the requested page");

    videos.delete(video.video_id).await.expect("failed to delete video");
}

/// An unrecognized video id surfaces as `NavError::VideoNotFound`, not a
/// generic database error.
#[tokio::test]
#[ignore = "requires Postgres"]
async fn test_jump_next_rejects_unknown_video() {
    let pool = connected_pool().await;
    let engine = NavEngine::new(pool);

    let unknown = pipeline_models::VideoId::new();
    let result = engine.jump_next(unknown, None, Kind::Scene, &JumpFilters::default(), 10).await;

    assert!(matches!(result, Err(pipeline_nav::NavError::VideoNotFound(_))));
}
