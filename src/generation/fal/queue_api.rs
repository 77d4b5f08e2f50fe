use color_eyre::{
    Result,
    eyre::{bail, ensure},
};
use reqwest::Client;
use serde::Deserialize;

use crate::generation::{GenerationRequest, GenerationResult, LogEntry};

pub const QUEUE_BASE_URL: &str = "https://queue.fal.run";

#[derive(Debug, Deserialize)]
pub struct QueuedRequest {
    pub request_id: String,
    pub status_url: String,
    pub response_url: String,
    pub cancel_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatusResponse {
    pub status: QueueStatus,
    pub queue_position: Option<u64>,
    pub logs: Option<Vec<LogEntry>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueueStatus {
    InQueue,
    InProgress,
    Completed,
}

/// Enqueues a job on the given app and returns the urls to watch it with
pub async fn submit(
    app_id: &str,
    request: &GenerationRequest,
    api_key: &str,
    client: &Client,
) -> Result<QueuedRequest> {
    let resp = client
        .post(format!("{QUEUE_BASE_URL}/{app_id}"))
        .header("accept", "application/json")
        .header("authorization", format!("Key {api_key}"))
        .json(request)
        .send()
        .await?;

    let status = resp.status();
    let text = resp.text().await?;

    ensure!(
        status.is_success(),
        "Failed to submit job to {}: {} - {}",
        app_id,
        status,
        text
    );

    Ok(serde_json::from_str(&text)?)
}

/// Asks the queue where the job currently stands. `logs=1` makes the answer
/// carry the cumulative log list while the job runs
pub async fn status(status_url: &str, api_key: &str, client: &Client) -> Result<StatusResponse> {
    let resp = client
        .get(format!("{status_url}?logs=1"))
        .header("accept", "application/json")
        .header("authorization", format!("Key {api_key}"))
        .send()
        .await?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await?;
        bail!("Status poll failed {}: {}", status, body);
    }

    Ok(resp.json().await?)
}

/// Fetches the payload of a completed job
pub async fn fetch_result(
    response_url: &str,
    api_key: &str,
    client: &Client,
) -> Result<GenerationResult> {
    let resp = client
        .get(response_url)
        .header("accept", "application/json")
        .header("authorization", format!("Key {api_key}"))
        .send()
        .await?;

    let status = resp.status();
    let text = resp.text().await?;

    ensure!(
        status.is_success(),
        "Failed to fetch job result: {} - {}",
        status,
        text
    );

    Ok(serde_json::from_str(&text)?)
}
