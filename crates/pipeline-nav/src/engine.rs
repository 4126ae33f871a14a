//! Cross-video jump and gallery search, grounded on
//! `original_source/backend/src/services/global_jump_service.py`'s
//! `GlobalJumpService` (the Postgres branches of its per-kind
//! `_search_*_global` methods; this engine targets Postgres only, matching
//! `pipeline-store`'s `sqlx` feature set).
//!
//! The Python source special-cases `current_file_created_at is None` as a
//! second branch per direction. Both branches collapse into one SQL
//! predicate using `IS NOT DISTINCT FROM` in place of `=`, which is
//! null-safe and reproduces the same NULLS-LAST total order without
//! duplicating the query four ways.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use pipeline_models::{ArtifactId, VideoId};

use crate::error::{NavError, NavResult};
use crate::types::{
    Direction, GalleryItem, GallerySearchParams, GeoBounds, JumpFilters, JumpPage, JumpResult,
    JumpTo, Kind, Preview,
};

const MAX_LIMIT: i64 = 50;

/// `video_locations` has one row per video (no span within the video), so
/// a location jump targets the whole video: `start_ms = 0` through the
/// video's known duration, or `0..0` if the duration is unknown.
fn whole_video_span(duration_seconds: Option<f64>) -> JumpTo {
    let end_ms = duration_seconds.map(|s| (s * 1000.0).round() as i64).unwrap_or(0).max(0);
    JumpTo { start_ms: 0, end_ms }
}

struct VideoMeta {
    filename: String,
    file_created_at: Option<DateTime<Utc>>,
    duration_seconds: Option<f64>,
}

pub struct NavEngine {
    pool: PgPool,
}

impl NavEngine {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn video_meta(&self, video_id: VideoId) -> NavResult<VideoMeta> {
        use sqlx::Row;

        let row = sqlx::query(
            "SELECT filename, file_created_at, duration_seconds FROM videos WHERE video_id = $1",
        )
        .bind(video_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        let row = row.ok_or_else(|| NavError::VideoNotFound(video_id.as_uuid()))?;
        Ok(VideoMeta {
            filename: row.get("filename"),
            file_created_at: row.get("file_created_at"),
            duration_seconds: row.get("duration_seconds"),
        })
    }

    pub async fn jump_next(
        &self,
        video_id: VideoId,
        from_ms: Option<i64>,
        kind: Kind,
        filters: &JumpFilters,
        limit: i64,
    ) -> NavResult<JumpPage> {
        self.jump(Direction::Next, video_id, from_ms.unwrap_or(0), kind, filters, limit).await
    }

    pub async fn jump_prev(
        &self,
        video_id: VideoId,
        from_ms: Option<i64>,
        kind: Kind,
        filters: &JumpFilters,
        limit: i64,
    ) -> NavResult<JumpPage> {
        self.jump(Direction::Prev, video_id, from_ms.unwrap_or(i64::MAX), kind, filters, limit).await
    }

    /// `from_ms` is already defaulted by `jump_next`/`jump_prev` (0 / MAX —
    /// the outer edges of the current video per `spec.md` §4.4).
    async fn jump(
        &self,
        direction: Direction,
        video_id: VideoId,
        from_ms: i64,
        kind: Kind,
        filters: &JumpFilters,
        limit: i64,
    ) -> NavResult<JumpPage> {
        validate_from_ms(from_ms)?;
        let limit = validate_limit(limit)?;
        validate_filters_for_kind(kind, filters)?;
        let fetch_limit = limit + 1;

        let meta = self.video_meta(video_id).await?;
        let video_id_raw = video_id.as_uuid();
        let created_at = meta.file_created_at;

        let mut results = match kind {
            Kind::Object | Kind::Place => {
                self.jump_object_like(
                    direction,
                    kind,
                    video_id_raw,
                    created_at,
                    from_ms,
                    filters,
                    fetch_limit,
                )
                .await?
            }
            Kind::Face => {
                self.jump_face(direction, video_id_raw, created_at, from_ms, filters, fetch_limit)
                    .await?
            }
            Kind::Scene => {
                self.jump_scene(direction, video_id_raw, created_at, from_ms, fetch_limit).await?
            }
            Kind::Transcript => {
                self.jump_text(
                    "transcript_fts",
                    direction,
                    video_id_raw,
                    created_at,
                    from_ms,
                    filters,
                    fetch_limit,
                )
                .await?
            }
            Kind::Ocr => {
                self.jump_text("ocr_fts", direction, video_id_raw, created_at, from_ms, filters, fetch_limit)
                    .await?
            }
            Kind::Location => {
                self.jump_location(direction, video_id_raw, created_at, from_ms, filters, fetch_limit)
                    .await?
            }
        };

        let has_more = results.len() > limit as usize;
        results.truncate(limit as usize);
        Ok(JumpPage { results, has_more })
    }

    async fn jump_object_like(
        &self,
        direction: Direction,
        kind: Kind,
        video_id: Uuid,
        created_at: Option<DateTime<Utc>>,
        from_ms: i64,
        filters: &JumpFilters,
        limit: i64,
    ) -> NavResult<Vec<JumpResult>> {
        let (predicate, order) = direction_sql(direction, "o.start_ms");
        let sql = format!(
            "SELECT o.artifact_id, o.asset_id, o.label, o.confidence, o.start_ms, o.end_ms, \
                    v.filename, v.file_created_at \
             FROM object_labels o JOIN videos v ON v.video_id = o.asset_id \
             WHERE o.kind = $4 \
               AND ($5::text IS NULL OR o.label = $5) \
               AND ($6::double precision IS NULL OR o.confidence >= $6) \
               AND {predicate} \
             ORDER BY {order} \
             LIMIT $7"
        );

        let rows = sqlx::query(&sql)
            .bind(created_at)
            .bind(video_id)
            .bind(from_ms)
            .bind(kind.as_str())
            .bind(&filters.label)
            .bind(filters.min_confidence)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        let preview_kind = kind;
        Ok(rows
            .into_iter()
            .map(|row| {
                use sqlx::Row;
                let label: String = row.get("label");
                let confidence: f64 = row.get("confidence");
                JumpResult {
                    video_id: VideoId::from_uuid(row.get("asset_id")),
                    video_filename: row.get("filename"),
                    file_created_at: row.get("file_created_at"),
                    jump_to: JumpTo { start_ms: row.get("start_ms"), end_ms: row.get("end_ms") },
                    artifact_id: ArtifactId::from_uuid(row.get("artifact_id")),
                    preview: match preview_kind {
                        Kind::Place => Preview::Place { label, confidence },
                        _ => Preview::Object { label, confidence },
                    },
                }
            })
            .collect())
    }

    async fn jump_face(
        &self,
        direction: Direction,
        video_id: Uuid,
        created_at: Option<DateTime<Utc>>,
        from_ms: i64,
        filters: &JumpFilters,
        limit: i64,
    ) -> NavResult<Vec<JumpResult>> {
        let (predicate, order) = direction_sql(direction, "f.start_ms");
        let sql = format!(
            "SELECT f.artifact_id, f.asset_id, f.cluster_id, f.confidence, f.start_ms, f.end_ms, \
                    v.filename, v.file_created_at \
             FROM face_clusters f JOIN videos v ON v.video_id = f.asset_id \
             WHERE ($4::text IS NULL OR f.cluster_id = $4) \
               AND ($5::double precision IS NULL OR f.confidence >= $5) \
               AND {predicate} \
             ORDER BY {order} \
             LIMIT $6"
        );

        let rows = sqlx::query(&sql)
            .bind(created_at)
            .bind(video_id)
            .bind(from_ms)
            .bind(&filters.cluster_id)
            .bind(filters.min_confidence)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        use sqlx::Row;
        Ok(rows
            .into_iter()
            .map(|row| JumpResult {
                video_id: VideoId::from_uuid(row.get("asset_id")),
                video_filename: row.get("filename"),
                file_created_at: row.get("file_created_at"),
                jump_to: JumpTo { start_ms: row.get("start_ms"), end_ms: row.get("end_ms") },
                artifact_id: ArtifactId::from_uuid(row.get("artifact_id")),
                preview: Preview::Face {
                    cluster_id: row.get("cluster_id"),
                    confidence: row.get("confidence"),
                },
            })
            .collect())
    }

    async fn jump_scene(
        &self,
        direction: Direction,
        video_id: Uuid,
        created_at: Option<DateTime<Utc>>,
        from_ms: i64,
        limit: i64,
    ) -> NavResult<Vec<JumpResult>> {
        let (predicate, order) = direction_sql(direction, "s.start_ms");
        let sql = format!(
            "SELECT s.artifact_id, s.asset_id, s.scene_index, s.start_ms, s.end_ms, \
                    v.filename, v.file_created_at \
             FROM scene_ranges s JOIN videos v ON v.video_id = s.asset_id \
             WHERE {predicate} \
             ORDER BY {order} \
             LIMIT $4"
        );

        let rows = sqlx::query(&sql)
            .bind(created_at)
            .bind(video_id)
            .bind(from_ms)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        use sqlx::Row;
        Ok(rows
            .into_iter()
            .map(|row| JumpResult {
                video_id: VideoId::from_uuid(row.get("asset_id")),
                video_filename: row.get("filename"),
                file_created_at: row.get("file_created_at"),
                jump_to: JumpTo { start_ms: row.get("start_ms"), end_ms: row.get("end_ms") },
                artifact_id: ArtifactId::from_uuid(row.get("artifact_id")),
                preview: Preview::Scene { scene_index: row.get("scene_index") },
            })
            .collect())
    }

    /// `table` is `transcript_fts` or `ocr_fts`; both share the same
    /// columns. Tries `plainto_tsquery` full-text search first and falls
    /// back to a substring `ILIKE` scan if the query yields nothing, per
    /// `global_jump_service.py`'s `_search_transcript_global_postgresql`.
    async fn jump_text(
        &self,
        table: &str,
        direction: Direction,
        video_id: Uuid,
        created_at: Option<DateTime<Utc>>,
        from_ms: i64,
        filters: &JumpFilters,
        limit: i64,
    ) -> NavResult<Vec<JumpResult>> {
        let query = filters.query.as_deref().unwrap_or("");
        let (predicate, order) = direction_sql(direction, "t.start_ms");

        let fts_sql = format!(
            "SELECT t.artifact_id, t.asset_id, t.start_ms, t.end_ms, t.text_content, \
                    v.filename, v.file_created_at \
             FROM {table} t JOIN videos v ON v.video_id = t.asset_id \
             WHERE t.search_vector @@ plainto_tsquery('english', $4) \
               AND {predicate} \
             ORDER BY {order} \
             LIMIT $5"
        );

        let rows = sqlx::query(&fts_sql)
            .bind(created_at)
            .bind(video_id)
            .bind(from_ms)
            .bind(query)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        let rows = if rows.is_empty() {
            let substring_sql = format!(
                "SELECT t.artifact_id, t.asset_id, t.start_ms, t.end_ms, t.text_content, \
                        v.filename, v.file_created_at \
                 FROM {table} t JOIN videos v ON v.video_id = t.asset_id \
                 WHERE t.text_content ILIKE '%' || $4 || '%' \
                   AND {predicate} \
                 ORDER BY {order} \
                 LIMIT $5"
            );
            sqlx::query(&substring_sql)
                .bind(created_at)
                .bind(video_id)
                .bind(from_ms)
                .bind(query)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
        } else {
            rows
        };

        use sqlx::Row;
        Ok(rows
            .into_iter()
            .map(|row| JumpResult {
                video_id: VideoId::from_uuid(row.get("asset_id")),
                video_filename: row.get("filename"),
                file_created_at: row.get("file_created_at"),
                jump_to: JumpTo { start_ms: row.get("start_ms"), end_ms: row.get("end_ms") },
                artifact_id: ArtifactId::from_uuid(row.get("artifact_id")),
                preview: Preview::Text { text: row.get("text_content") },
            })
            .collect())
    }

    async fn jump_location(
        &self,
        direction: Direction,
        video_id: Uuid,
        created_at: Option<DateTime<Utc>>,
        from_ms: i64,
        filters: &JumpFilters,
        limit: i64,
    ) -> NavResult<Vec<JumpResult>> {
        // `video_locations` has one row per video, so there is no
        // meaningful "later/earlier position within the same video" —
        // `NULL::bigint` makes the same-video branch of the direction
        // predicate always false regardless of `from_ms`.
        let (predicate, order) = direction_sql(direction, "NULL::bigint");
        let (min_lat, max_lat, min_lon, max_lon) = match &filters.geo_bounds {
            Some(b) => (Some(b.min_lat), Some(b.max_lat), Some(b.min_lon), Some(b.max_lon)),
            None => (None, None, None, None),
        };

        let sql = format!(
            "SELECT vl.artifact_id, vl.video_id AS asset_id, vl.latitude, vl.longitude, vl.altitude, \
                    v.filename, v.file_created_at \
             FROM video_locations vl JOIN videos v ON v.video_id = vl.video_id \
             WHERE ($4::double precision IS NULL OR vl.latitude BETWEEN $4 AND $5) \
               AND ($6::double precision IS NULL OR vl.longitude BETWEEN $6 AND $7) \
               AND ($8::text IS NULL OR (COALESCE(vl.country, '') || ' ' || COALESCE(vl.state, '') \
                    || ' ' || COALESCE(vl.city, '')) ILIKE '%' || $8 || '%') \
               AND {predicate} \
             ORDER BY {order} \
             LIMIT $9"
        );

        let rows = sqlx::query(&sql)
            .bind(created_at)
            .bind(video_id)
            .bind(from_ms)
            .bind(min_lat)
            .bind(max_lat)
            .bind(min_lon)
            .bind(max_lon)
            .bind(&filters.query)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        use sqlx::Row;
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let asset_id: Uuid = row.get("asset_id");
            let meta = self.video_meta(VideoId::from_uuid(asset_id)).await?;
            out.push(JumpResult {
                video_id: VideoId::from_uuid(asset_id),
                video_filename: row.get("filename"),
                file_created_at: row.get("file_created_at"),
                jump_to: whole_video_span(meta.duration_seconds),
                artifact_id: ArtifactId::from_uuid(row.get("artifact_id")),
                preview: Preview::Location {
                    latitude: row.get("latitude"),
                    longitude: row.get("longitude"),
                    altitude: row.get("altitude"),
                },
            });
        }
        Ok(out)
    }

    pub async fn gallery_search(&self, params: &GallerySearchParams) -> NavResult<Vec<GalleryItem>> {
        validate_pagination(params.limit, params.offset)?;
        validate_filters_for_kind(params.kind, &params.filters)?;

        match params.kind {
            Kind::Object | Kind::Place => self.gallery_object_like(params).await,
            Kind::Face => self.gallery_face(params).await,
            Kind::Scene => self.gallery_scene(params).await,
            Kind::Transcript => self.gallery_text("transcript_fts", params).await,
            Kind::Ocr => self.gallery_text("ocr_fts", params).await,
            Kind::Location => self.gallery_location(params).await,
        }
    }

    async fn gallery_object_like(&self, params: &GallerySearchParams) -> NavResult<Vec<GalleryItem>> {
        let base = format!(
            "SELECT o.artifact_id, o.asset_id, o.label, o.confidence, o.start_ms, o.end_ms, \
                    v.filename, v.file_created_at \
             FROM object_labels o JOIN videos v ON v.video_id = o.asset_id \
             WHERE o.kind = $1 \
               AND ($2::text IS NULL OR o.label = $2) \
               AND ($3::double precision IS NULL OR o.confidence >= $3) \
               AND ($4::text IS NULL OR v.filename ILIKE '%' || $4 || '%')"
        );
        let sql = gallery_wrap(&base, params.collapse_to_video, 5, "start_ms");

        let rows = sqlx::query(&sql)
            .bind(params.kind.as_str())
            .bind(&params.filters.label)
            .bind(params.filters.min_confidence)
            .bind(&params.filename_substring)
            .bind(params.limit)
            .bind(params.offset)
            .fetch_all(&self.pool)
            .await?;

        let preview_kind = params.kind;
        use sqlx::Row;
        Ok(rows
            .into_iter()
            .map(|row| {
                let label: String = row.get("label");
                let confidence: f64 = row.get("confidence");
                gallery_item(
                    &row,
                    match preview_kind {
                        Kind::Place => Preview::Place { label, confidence },
                        _ => Preview::Object { label, confidence },
                    },
                    params.collapse_to_video,
                )
            })
            .collect())
    }

    async fn gallery_face(&self, params: &GallerySearchParams) -> NavResult<Vec<GalleryItem>> {
        let base = format!(
            "SELECT f.artifact_id, f.asset_id, f.cluster_id, f.confidence, f.start_ms, f.end_ms, \
                    v.filename, v.file_created_at \
             FROM face_clusters f JOIN videos v ON v.video_id = f.asset_id \
             WHERE ($1::text IS NULL OR f.cluster_id = $1) \
               AND ($2::double precision IS NULL OR f.confidence >= $2) \
               AND ($3::text IS NULL OR v.filename ILIKE '%' || $3 || '%')"
        );
        let sql = gallery_wrap(&base, params.collapse_to_video, 4, "start_ms");

        let rows = sqlx::query(&sql)
            .bind(&params.filters.cluster_id)
            .bind(params.filters.min_confidence)
            .bind(&params.filename_substring)
            .bind(params.limit)
            .bind(params.offset)
            .fetch_all(&self.pool)
            .await?;

        use sqlx::Row;
        Ok(rows
            .into_iter()
            .map(|row| {
                let preview = Preview::Face {
                    cluster_id: row.get("cluster_id"),
                    confidence: row.get("confidence"),
                };
                gallery_item(&row, preview, params.collapse_to_video)
            })
            .collect())
    }

    async fn gallery_scene(&self, params: &GallerySearchParams) -> NavResult<Vec<GalleryItem>> {
        let base = "SELECT s.artifact_id, s.asset_id, s.scene_index, s.start_ms, s.end_ms, \
                    v.filename, v.file_created_at \
             FROM scene_ranges s JOIN videos v ON v.video_id = s.asset_id \
             WHERE ($1::text IS NULL OR v.filename ILIKE '%' || $1 || '%')"
            .to_string();
        let sql = gallery_wrap(&base, params.collapse_to_video, 2, "start_ms");

        let rows = sqlx::query(&sql)
            .bind(&params.filename_substring)
            .bind(params.limit)
            .bind(params.offset)
            .fetch_all(&self.pool)
            .await?;

        use sqlx::Row;
        Ok(rows
            .into_iter()
            .map(|row| {
                let preview = Preview::Scene { scene_index: row.get("scene_index") };
                gallery_item(&row, preview, params.collapse_to_video)
            })
            .collect())
    }

    async fn gallery_text(&self, table: &str, params: &GallerySearchParams) -> NavResult<Vec<GalleryItem>> {
        let query = params.filters.query.as_deref().unwrap_or("");
        let fts_base = format!(
            "SELECT t.artifact_id, t.asset_id, t.start_ms, t.end_ms, t.text_content, \
                    v.filename, v.file_created_at \
             FROM {table} t JOIN videos v ON v.video_id = t.asset_id \
             WHERE t.search_vector @@ plainto_tsquery('english', $1) \
               AND ($2::text IS NULL OR v.filename ILIKE '%' || $2 || '%')"
        );
        let sql = gallery_wrap(&fts_base, params.collapse_to_video, 3, "start_ms");

        let rows = sqlx::query(&sql)
            .bind(query)
            .bind(&params.filename_substring)
            .bind(params.limit)
            .bind(params.offset)
            .fetch_all(&self.pool)
            .await?;

        let rows = if rows.is_empty() {
            let substring_base = format!(
                "SELECT t.artifact_id, t.asset_id, t.start_ms, t.end_ms, t.text_content, \
                        v.filename, v.file_created_at \
                 FROM {table} t JOIN videos v ON v.video_id = t.asset_id \
                 WHERE t.text_content ILIKE '%' || $1 || '%' \
                   AND ($2::text IS NULL OR v.filename ILIKE '%' || $2 || '%')"
            );
            let sql = gallery_wrap(&substring_base, params.collapse_to_video, 3, "start_ms");
            sqlx::query(&sql)
                .bind(query)
                .bind(&params.filename_substring)
                .bind(params.limit)
                .bind(params.offset)
                .fetch_all(&self.pool)
                .await?
        } else {
            rows
        };

        use sqlx::Row;
        Ok(rows
            .into_iter()
            .map(|row| {
                let preview = Preview::Text { text: row.get("text_content") };
                gallery_item(&row, preview, params.collapse_to_video)
            })
            .collect())
    }

    /// `video_locations` already holds exactly one row per video (primary
    /// keyed on `video_id`), so `collapse_to_video` has no further rows to
    /// fold here — it only controls whether `artifact_count` (trivially 1)
    /// is reported, no `DISTINCT ON`/window pass needed like the other
    /// kinds' `gallery_wrap`.
    async fn gallery_location(&self, params: &GallerySearchParams) -> NavResult<Vec<GalleryItem>> {
        let (min_lat, max_lat, min_lon, max_lon) = match &params.filters.geo_bounds {
            Some(b) => (Some(b.min_lat), Some(b.max_lat), Some(b.min_lon), Some(b.max_lon)),
            None => (None, None, None, None),
        };
        let sql = "SELECT vl.artifact_id, vl.video_id AS asset_id, vl.latitude, vl.longitude, \
                    vl.altitude, v.filename, v.file_created_at \
             FROM video_locations vl JOIN videos v ON v.video_id = vl.video_id \
             WHERE ($1::double precision IS NULL OR vl.latitude BETWEEN $1 AND $2) \
               AND ($3::double precision IS NULL OR vl.longitude BETWEEN $3 AND $4) \
               AND ($5::text IS NULL OR (COALESCE(vl.country, '') || ' ' || COALESCE(vl.state, '') \
                    || ' ' || COALESCE(vl.city, '')) ILIKE '%' || $5 || '%') \
               AND ($6::text IS NULL OR v.filename ILIKE '%' || $6 || '%') \
             ORDER BY v.file_created_at ASC NULLS LAST, vl.video_id ASC \
             LIMIT $7 OFFSET $8";

        let rows = sqlx::query(sql)
            .bind(min_lat)
            .bind(max_lat)
            .bind(min_lon)
            .bind(max_lon)
            .bind(&params.filters.query)
            .bind(&params.filename_substring)
            .bind(params.limit)
            .bind(params.offset)
            .fetch_all(&self.pool)
            .await?;

        use sqlx::Row;
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let asset_id: Uuid = row.get("asset_id");
            let meta = self.video_meta(VideoId::from_uuid(asset_id)).await?;
            out.push(GalleryItem {
                video_id: VideoId::from_uuid(asset_id),
                video_filename: row.get("filename"),
                file_created_at: row.get("file_created_at"),
                jump_to: whole_video_span(meta.duration_seconds),
                artifact_id: ArtifactId::from_uuid(row.get("artifact_id")),
                preview: Preview::Location {
                    latitude: row.get("latitude"),
                    longitude: row.get("longitude"),
                    altitude: row.get("altitude"),
                },
                artifact_count: if params.collapse_to_video { Some(1) } else { None },
            });
        }
        Ok(out)
    }
}

/// Builds the common `matches` CTE wrapper around a per-kind filter query,
/// adding either plain global-order pagination or a collapse-to-one-row-
/// per-video pass (`DISTINCT ON` plus a window `COUNT`). `next_bind` is the
/// first unused `$n` after `base`'s own placeholders. `ms_order` is the
/// tie-break column (`start_ms` for span-bearing kinds; `NULL::bigint` for
/// `location`, which has no per-occurrence span — see `gallery_location`).
fn gallery_wrap(base: &str, collapse: bool, next_bind: i32, ms_order: &str) -> String {
    let limit_bind = next_bind;
    let offset_bind = next_bind + 1;
    if collapse {
        format!(
            "WITH matches AS ({base}) \
             SELECT * FROM ( \
                 SELECT DISTINCT ON (asset_id) *, \
                        COUNT(*) OVER (PARTITION BY asset_id) AS artifact_count \
                 FROM matches \
                 ORDER BY asset_id, file_created_at ASC NULLS LAST, {ms_order} ASC \
             ) collapsed \
             ORDER BY file_created_at ASC NULLS LAST, asset_id ASC \
             LIMIT ${limit_bind} OFFSET ${offset_bind}"
        )
    } else {
        format!(
            "WITH matches AS ({base}) \
             SELECT * FROM matches \
             ORDER BY file_created_at ASC NULLS LAST, asset_id ASC, {ms_order} ASC \
             LIMIT ${limit_bind} OFFSET ${offset_bind}"
        )
    }
}

fn gallery_item(row: &sqlx::postgres::PgRow, preview: Preview, collapsed: bool) -> GalleryItem {
    use sqlx::Row;
    GalleryItem {
        video_id: VideoId::from_uuid(row.get("asset_id")),
        video_filename: row.get("filename"),
        file_created_at: row.get("file_created_at"),
        jump_to: JumpTo { start_ms: row.get("start_ms"), end_ms: row.get("end_ms") },
        artifact_id: ArtifactId::from_uuid(row.get("artifact_id")),
        preview,
        artifact_count: if collapsed { Some(row.get("artifact_count")) } else { None },
    }
}

/// Returns `(direction_predicate, order_by)` SQL fragments parameterized
/// on `$1` (current video's `file_created_at`, possibly `NULL`), `$2`
/// (current video id), and `$3` (`from_ms`). `ms_col` is a trusted,
/// hard-coded column reference, never user input.
fn direction_sql(direction: Direction, ms_col: &str) -> (String, String) {
    match direction {
        Direction::Next => (
            format!(
                "(($1::timestamptz IS NOT NULL AND v.file_created_at > $1) \
                  OR ($1::timestamptz IS NOT NULL AND v.file_created_at IS NULL) \
                  OR (v.file_created_at IS NOT DISTINCT FROM $1 AND v.video_id > $2) \
                  OR (v.file_created_at IS NOT DISTINCT FROM $1 AND v.video_id = $2 AND {ms_col} > $3))"
            ),
            format!("v.file_created_at ASC NULLS LAST, v.video_id ASC, {ms_col} ASC"),
        ),
        Direction::Prev => (
            format!(
                "(($1::timestamptz IS NOT NULL AND v.file_created_at IS NOT NULL AND v.file_created_at < $1) \
                  OR ($1::timestamptz IS NULL AND v.file_created_at IS NOT NULL) \
                  OR (v.file_created_at IS NOT DISTINCT FROM $1 AND v.video_id < $2) \
                  OR (v.file_created_at IS NOT DISTINCT FROM $1 AND v.video_id = $2 AND {ms_col} < $3))"
            ),
            format!("v.file_created_at DESC NULLS LAST, v.video_id DESC, {ms_col} DESC"),
        ),
    }
}

fn validate_from_ms(from_ms: i64) -> NavResult<()> {
    if from_ms < 0 {
        return Err(NavError::invalid("from_ms", "must be non-negative"));
    }
    Ok(())
}

fn validate_limit(limit: i64) -> NavResult<i64> {
    if !(1..=MAX_LIMIT).contains(&limit) {
        return Err(NavError::invalid("limit", format!("must be between 1 and {MAX_LIMIT}")));
    }
    Ok(limit)
}

fn validate_pagination(limit: i64, offset: i64) -> NavResult<()> {
    validate_limit(limit)?;
    if offset < 0 {
        return Err(NavError::invalid("offset", "must be non-negative"));
    }
    Ok(())
}

fn validate_filters_for_kind(kind: Kind, filters: &JumpFilters) -> NavResult<()> {
    if let Some(c) = filters.min_confidence {
        if !(0.0..=1.0).contains(&c) {
            return Err(NavError::invalid("min_confidence", "must be between 0.0 and 1.0"));
        }
    }

    let (label_ok, query_ok, cluster_ok, confidence_ok, geo_ok) = match kind {
        Kind::Object | Kind::Place => (true, false, false, true, false),
        Kind::Face => (false, false, true, true, false),
        Kind::Transcript | Kind::Ocr => (false, true, false, false, false),
        Kind::Scene => (false, false, false, false, false),
        Kind::Location => (false, true, false, false, true),
    };

    if filters.label.is_some() && !label_ok {
        return Err(NavError::invalid("label", format!("not applicable to kind '{}'", kind.as_str())));
    }
    if filters.query.is_some() && !query_ok {
        return Err(NavError::invalid("query", format!("not applicable to kind '{}'", kind.as_str())));
    }
    if filters.cluster_id.is_some() && !cluster_ok {
        return Err(NavError::invalid(
            "cluster_id",
            format!("not applicable to kind '{}'", kind.as_str()),
        ));
    }
    if filters.min_confidence.is_some() && !confidence_ok {
        return Err(NavError::invalid(
            "min_confidence",
            format!("not applicable to kind '{}'", kind.as_str()),
        ));
    }
    if filters.geo_bounds.is_some() && !geo_ok {
        return Err(NavError::invalid(
            "geo_bounds",
            format!("not applicable to kind '{}'", kind.as_str()),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_negative_from_ms() {
        assert!(validate_from_ms(-1).is_err());
        assert!(validate_from_ms(0).is_ok());
    }

    #[test]
    fn rejects_limit_outside_range() {
        assert!(validate_limit(0).is_err());
        assert!(validate_limit(51).is_err());
        assert!(validate_limit(1).is_ok());
        assert!(validate_limit(50).is_ok());
    }

    #[test]
    fn rejects_confidence_outside_unit_range() {
        let filters = JumpFilters { min_confidence: Some(1.5), ..Default::default() };
        assert!(validate_filters_for_kind(Kind::Object, &filters).is_err());
    }

    #[test]
    fn rejects_label_on_transcript_kind() {
        let filters = JumpFilters { label: Some("cat".into()), ..Default::default() };
        assert!(validate_filters_for_kind(Kind::Transcript, &filters).is_err());
    }

    #[test]
    fn rejects_cluster_id_outside_face_kind() {
        let filters = JumpFilters { cluster_id: Some("c1".into()), ..Default::default() };
        assert!(validate_filters_for_kind(Kind::Object, &filters).is_err());
    }

    #[test]
    fn accepts_geo_bounds_only_for_location() {
        let bounds = GeoBounds { min_lat: -10.0, max_lat: 10.0, min_lon: -10.0, max_lon: 10.0 };
        let filters = JumpFilters { geo_bounds: Some(bounds), ..Default::default() };
        assert!(validate_filters_for_kind(Kind::Location, &filters).is_ok());
        assert!(validate_filters_for_kind(Kind::Scene, &filters).is_err());
    }

    #[test]
    fn whole_video_span_falls_back_to_zero_on_unknown_duration() {
        let span = whole_video_span(None);
        assert_eq!(span.start_ms, 0);
        assert_eq!(span.end_ms, 0);
    }

    #[test]
    fn whole_video_span_converts_seconds_to_milliseconds() {
        let span = whole_video_span(Some(12.5));
        assert_eq!(span.start_ms, 0);
        assert_eq!(span.end_ms, 12_500);
    }
}
