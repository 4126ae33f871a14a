//! Single named Redis Streams queue for ML task dispatch
//! (`spec.md` §4.5, `vclip-queue/src/queue.rs` transport mechanics).

use std::time::Duration;

use redis::AsyncCommands;
use tracing::{debug, info, warn};

use pipeline_models::TaskType;

use crate::error::{QueueError, QueueResult};
use crate::job::MlTaskJob;

/// Queue configuration for one task type's pool.
///
/// `spec.md` §4.2 describes "one logical queue per type, worker pool per
/// type"; this repository keeps `vclip-queue::JobQueue`'s single-stream
/// transport shape and derives a distinct stream/consumer-group pair per
/// `TaskType` from one shared `REDIS_URL` rather than standing up one Redis
/// connection per type (DESIGN.md: "Per-type queue derivation").
#[derive(Debug, Clone)]
pub struct QueueConfig {
    pub redis_url: String,
    pub task_type: TaskType,
    pub consumer_group: String,
    pub max_retries: u32,
    pub visibility_timeout: Duration,
}

impl QueueConfig {
    pub fn for_task_type(redis_url: impl Into<String>, task_type: TaskType) -> Self {
        Self {
            redis_url: redis_url.into(),
            task_type,
            consumer_group: "ml-workers".to_string(),
            max_retries: 3,
            visibility_timeout: Duration::from_secs(600),
        }
    }

    /// Create config from environment variables for one task type.
    pub fn from_env(task_type: TaskType) -> Self {
        let redis_url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());
        let mut config = Self::for_task_type(redis_url, task_type);
        if let Some(max_retries) = std::env::var("QUEUE_MAX_RETRIES").ok().and_then(|s| s.parse().ok()) {
            config.max_retries = max_retries;
        }
        if let Some(secs) = std::env::var("QUEUE_VISIBILITY_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            config.visibility_timeout = Duration::from_secs(secs);
        }
        config
    }

    fn stream_name(&self) -> String {
        format!("ml:queue:{}", self.task_type.as_str())
    }

    fn dlq_stream_name(&self) -> String {
        format!("{}:dlq", self.stream_name())
    }
}

/// Job queue client for one task type's stream.
pub struct JobQueue {
    client: redis::Client,
    config: QueueConfig,
}

impl JobQueue {
    pub fn new(config: QueueConfig) -> QueueResult<Self> {
        let client = redis::Client::open(config.redis_url.as_str())?;
        Ok(Self { client, config })
    }

    pub fn from_env(task_type: TaskType) -> QueueResult<Self> {
        Self::new(QueueConfig::from_env(task_type))
    }

    /// Initialize the queue (create consumer group if not exists).
    pub async fn init(&self) -> QueueResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let result: Result<(), redis::RedisError> = redis::cmd("XGROUP")
            .arg("CREATE")
            .arg(self.config.stream_name())
            .arg(&self.config.consumer_group)
            .arg("$")
            .arg("MKSTREAM")
            .query_async(&mut conn)
            .await;

        match result {
            Ok(_) => info!("Created consumer group: {}", self.config.consumer_group),
            Err(e) if e.to_string().contains("BUSYGROUP") => {
                debug!("Consumer group already exists: {}", self.config.consumer_group);
            }
            Err(e) => return Err(QueueError::Redis(e)),
        }

        Ok(())
    }

    /// Enqueue a job. Deterministic `job_id` (`spec.md` §4.5) makes a
    /// repeat enqueue of the same task a no-op rather than an error.
    pub async fn enqueue(&self, job: MlTaskJob) -> QueueResult<String> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let dedup_key = format!("ml:dedup:{}", job.job_id);
        let exists: bool = conn.exists(&dedup_key).await?;
        if exists {
            debug!("Duplicate enqueue for job {} is a no-op", job.job_id);
            return Err(QueueError::enqueue_failed("Duplicate job"));
        }

        let payload = serde_json::to_string(&job)?;
        let message_id: String = redis::cmd("XADD")
            .arg(self.config.stream_name())
            .arg("*")
            .arg("job")
            .arg(&payload)
            .arg("key")
            .arg(&job.job_id)
            .query_async(&mut conn)
            .await?;

        conn.set_ex::<_, _, ()>(&dedup_key, "1", 3600).await?;

        info!("Enqueued job {} with message ID {}", job.job_id, message_id);
        Ok(message_id)
    }

    /// Whether a job is currently tracked by the queue (dedup key present).
    /// Used by the reconciler to decide whether a pending/running task's
    /// job needs to be re-enqueued (`spec.md` §4.5).
    pub async fn job_exists(&self, job_id: &str) -> QueueResult<bool> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let dedup_key = format!("ml:dedup:{job_id}");
        Ok(conn.exists(&dedup_key).await?)
    }

    /// Clear the deduplication key for a job, allowing it to be
    /// re-enqueued. Called after completion (success or DLQ).
    pub async fn clear_dedup(&self, job_id: &str) -> QueueResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let dedup_key = format!("ml:dedup:{job_id}");
        conn.del::<_, ()>(&dedup_key).await?;
        Ok(())
    }

    /// Acknowledge and remove a completed job's stream entry.
    pub async fn ack(&self, message_id: &str) -> QueueResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        redis::cmd("XACK")
            .arg(self.config.stream_name())
            .arg(&self.config.consumer_group)
            .arg(message_id)
            .query_async::<()>(&mut conn)
            .await?;

        redis::cmd("XDEL")
            .arg(self.config.stream_name())
            .arg(message_id)
            .query_async::<()>(&mut conn)
            .await?;

        debug!("Acknowledged job: {}", message_id);
        Ok(())
    }

    /// Move a job to the dead-letter stream after exhausting retries
    /// (`spec.md` §4.5: the reconciler treats DLQ residency the same as
    /// queue absence).
    pub async fn dlq(&self, message_id: &str, job: &MlTaskJob, error: &str) -> QueueResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let payload = serde_json::to_string(job)?;
        redis::cmd("XADD")
            .arg(self.config.dlq_stream_name())
            .arg("*")
            .arg("job")
            .arg(&payload)
            .arg("error")
            .arg(error)
            .arg("original_id")
            .arg(message_id)
            .query_async::<()>(&mut conn)
            .await?;

        self.ack(message_id).await?;
        self.clear_dedup(&job.job_id).await?;

        warn!("Moved job {} to DLQ: {}", job.job_id, error);
        Ok(())
    }

    pub async fn len(&self) -> QueueResult<u64> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        Ok(conn.xlen(self.config.stream_name()).await?)
    }

    pub async fn dlq_len(&self) -> QueueResult<u64> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        Ok(conn.xlen(self.config.dlq_stream_name()).await?)
    }

    /// Consume new jobs from the queue via the worker's consumer group.
    pub async fn consume(
        &self,
        consumer_name: &str,
        block_ms: u64,
        count: usize,
    ) -> QueueResult<Vec<(String, MlTaskJob)>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let result: redis::streams::StreamReadReply = redis::cmd("XREADGROUP")
            .arg("GROUP")
            .arg(&self.config.consumer_group)
            .arg(consumer_name)
            .arg("COUNT")
            .arg(count)
            .arg("BLOCK")
            .arg(block_ms)
            .arg("STREAMS")
            .arg(self.config.stream_name())
            .arg(">")
            .query_async(&mut conn)
            .await?;

        let mut jobs = Vec::new();
        for stream_key in result.keys {
            for entry in stream_key.ids {
                let message_id = entry.id.clone();
                if let Some(redis::Value::BulkString(payload)) = entry.map.get("job") {
                    let payload_str = String::from_utf8_lossy(payload);
                    match serde_json::from_str::<MlTaskJob>(&payload_str) {
                        Ok(job) => jobs.push((message_id, job)),
                        Err(e) => {
                            warn!("Failed to parse job payload: {}", e);
                            self.ack(&message_id).await.ok();
                        }
                    }
                }
            }
        }

        Ok(jobs)
    }

    /// Claim pending jobs idle past `min_idle_ms`, recovering work left
    /// behind by a crashed worker.
    pub async fn claim_pending(
        &self,
        consumer_name: &str,
        min_idle_ms: u64,
        count: usize,
    ) -> QueueResult<Vec<(String, MlTaskJob)>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let pending_count: usize = redis::cmd("XPENDING")
            .arg(self.config.stream_name())
            .arg(&self.config.consumer_group)
            .query_async(&mut conn)
            .await
            .map(|reply: redis::streams::StreamPendingReply| reply.count())
            .unwrap_or(0);

        if pending_count == 0 {
            return Ok(Vec::new());
        }

        let pending_details: Vec<Vec<redis::Value>> = redis::cmd("XPENDING")
            .arg(self.config.stream_name())
            .arg(&self.config.consumer_group)
            .arg("-")
            .arg("+")
            .arg(count)
            .query_async(&mut conn)
            .await?;

        let mut message_ids_to_claim = Vec::new();
        for detail in pending_details {
            if detail.len() < 4 {
                continue;
            }
            if let (Some(redis::Value::BulkString(id_bytes)), Some(redis::Value::Int(idle_ms))) =
                (detail.first(), detail.get(2))
            {
                if *idle_ms as u64 >= min_idle_ms {
                    if let Ok(id) = String::from_utf8(id_bytes.clone()) {
                        message_ids_to_claim.push(id);
                    }
                }
            }
        }

        if message_ids_to_claim.is_empty() {
            return Ok(Vec::new());
        }

        let mut cmd = redis::cmd("XCLAIM");
        cmd.arg(self.config.stream_name())
            .arg(&self.config.consumer_group)
            .arg(consumer_name)
            .arg(min_idle_ms);
        for msg_id in &message_ids_to_claim {
            cmd.arg(msg_id);
        }

        let claimed_messages: Vec<Vec<redis::Value>> = cmd.query_async(&mut conn).await?;

        let mut jobs = Vec::new();
        for message in claimed_messages {
            if message.len() < 2 {
                continue;
            }
            let (Some(redis::Value::BulkString(id_bytes)), Some(redis::Value::Array(fields))) =
                (message.first(), message.get(1))
            else {
                continue;
            };
            let Ok(message_id) = String::from_utf8(id_bytes.clone()) else {
                continue;
            };

            let job_payload = fields.chunks(2).find_map(|pair| match pair {
                [redis::Value::BulkString(field), redis::Value::BulkString(value)]
                    if field.as_slice() == b"job" =>
                {
                    String::from_utf8(value.clone()).ok()
                }
                _ => None,
            });

            if let Some(payload) = job_payload {
                match serde_json::from_str::<MlTaskJob>(&payload) {
                    Ok(job) => {
                        info!("Claimed pending job {} from stream", job.job_id);
                        jobs.push((message_id, job));
                    }
                    Err(e) => {
                        warn!("Failed to parse claimed job payload: {}", e);
                        self.ack(&message_id).await.ok();
                    }
                }
            }
        }

        Ok(jobs)
    }

    pub async fn get_retry_count(&self, message_id: &str) -> QueueResult<u32> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let key = format!("ml:retry:{message_id}");
        let count: Option<u32> = conn.get(&key).await?;
        Ok(count.unwrap_or(0))
    }

    pub async fn increment_retry(&self, message_id: &str) -> QueueResult<u32> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let key = format!("ml:retry:{message_id}");
        let count: u32 = conn.incr(&key, 1).await?;
        conn.expire::<_, ()>(&key, 86400).await?;
        Ok(count)
    }

    pub fn max_retries(&self) -> u32 {
        self.config.max_retries
    }

    /// Reset a still-running job's idle timer so it is not reclaimed by
    /// `claim_pending` while genuinely in progress.
    pub async fn refresh_visibility(&self, consumer_name: &str, message_id: &str) -> QueueResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let _res: redis::Value = redis::cmd("XCLAIM")
            .arg(self.config.stream_name())
            .arg(&self.config.consumer_group)
            .arg(consumer_name)
            .arg(0)
            .arg(message_id)
            .arg("JUSTID")
            .query_async(&mut conn)
            .await?;

        Ok(())
    }
}
