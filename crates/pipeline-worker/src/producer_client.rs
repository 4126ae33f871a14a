//! HTTP client for the external ML producer contract (`spec.md` §6): one
//! POST per dispatched task, carrying the video path and producer config
//! and returning a typed, provenance-stamped result.

use std::time::Duration;

use pipeline_models::TaskType;
use pipeline_producer::{ProducerConfig, ProducerRequest, ProducerResponse};
use reqwest::Client;

use crate::error::{WorkerError, WorkerResult};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct ProducerClient {
    http: Client,
    base_url: String,
}

impl ProducerClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("reqwest client builds with the default TLS backend");
        Self { http, base_url: base_url.into() }
    }

    pub fn from_env() -> Self {
        Self::new(
            std::env::var("PRODUCER_BASE_URL").unwrap_or_else(|_| "http://127.0.0.1:9000".to_string()),
        )
    }

    /// POSTs `{video_path, config}` to `{base_url}/producers/{task_type}`
    /// and returns the producer's typed response.
    pub async fn invoke(
        &self,
        task_type: TaskType,
        video_path: &str,
        config: ProducerConfig,
    ) -> WorkerResult<ProducerResponse> {
        let url = format!("{}/producers/{}", self.base_url, task_type.as_str());
        let request = ProducerRequest { video_path: video_path.to_string(), config };

        let response = self.http.post(&url).json(&request).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(WorkerError::transient(format!(
                "producer {task_type} returned {status}: {body}"
            )));
        }

        Ok(response.json::<ProducerResponse>().await?)
    }
}
