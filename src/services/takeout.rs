/// Delegated-access download of the watch history through the Data
/// Portability API: submit an export job, poll it to a terminal state, then
/// fetch the produced archive.
///
/// The OAuth handshake that produces the bearer token is outside this crate;
/// the client only consumes a caller-supplied token. The core pipeline only
/// consumes the resulting raw record array, not the job protocol itself.
use crate::error::{AppError, AppResult};
use reqwest::Client as HttpClient;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

/// Fixed sleep between job status polls
const POLL_INTERVAL: Duration = Duration::from_secs(10);
/// Poll budget; the job is abandoned once exhausted
const MAX_POLL_ATTEMPTS: u32 = 30;

const EXPORT_RESOURCE: &str = "YOUTUBE_VIDEOS";

pub struct TakeoutClient {
    http_client: HttpClient,
    access_token: String,
    api_url: String,
}

#[derive(Debug, Deserialize)]
struct InitiateResponse {
    /// Job resource name, e.g. "archiveJobs/123/portabilityArchiveState"
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JobStatus {
    #[serde(default)]
    state: String,
    #[serde(default)]
    archive_url: Option<String>,
}

impl TakeoutClient {
    pub fn new(access_token: String, api_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            access_token,
            api_url,
        }
    }

    /// Downloads the watch history archive and returns its raw record array.
    ///
    /// The records feed the same normalizer path as a file upload.
    pub async fn download_watch_history(&self) -> AppResult<Vec<Value>> {
        let job_name = self.initiate_export().await?;
        tracing::info!(job = %job_name, "Export job created, polling for completion");

        let archive_url = self.poll_until_complete(&job_name).await?;
        let archive = self.fetch_archive(&archive_url).await?;

        let history = extract_watch_history(archive);
        tracing::info!(entries = history.len(), "Watch history downloaded");

        Ok(history)
    }

    async fn initiate_export(&self) -> AppResult<String> {
        let url = format!("{}/portabilityArchive:initiate", self.api_url);

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(&serde_json::json!({
                "resources": [EXPORT_RESOURCE],
                "archiveFormat": "JSON",
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "failed to create export job: status {}: {}",
                status, body
            )));
        }

        let initiated: InitiateResponse = response.json().await?;
        Ok(initiated.name)
    }

    /// Bounded polling loop with a fixed sleep interval. The attempt budget
    /// is the only cancellation point of the download flow.
    async fn poll_until_complete(&self, job_name: &str) -> AppResult<String> {
        for attempt in 1..=MAX_POLL_ATTEMPTS {
            let status = self.job_status(job_name).await?;

            match status.state.as_str() {
                "COMPLETED" => {
                    return status.archive_url.ok_or_else(|| {
                        AppError::ExternalApi(
                            "export job completed without an archive URL".to_string(),
                        )
                    });
                }
                "FAILED" => {
                    return Err(AppError::ExternalApi("export job failed".to_string()));
                }
                state => {
                    tracing::debug!(
                        attempt,
                        max_attempts = MAX_POLL_ATTEMPTS,
                        state = %state,
                        "Export job still in progress"
                    );
                    tokio::time::sleep(POLL_INTERVAL).await;
                }
            }
        }

        Err(AppError::ExternalApi(
            "export job timed out, try again later".to_string(),
        ))
    }

    async fn job_status(&self, job_name: &str) -> AppResult<JobStatus> {
        let url = format!("{}/{}", self.api_url, job_name);

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(AppError::ExternalApi(format!(
                "failed to check job status: {}",
                status
            )));
        }

        Ok(response.json().await?)
    }

    async fn fetch_archive(&self, archive_url: &str) -> AppResult<Value> {
        let response = self
            .http_client
            .get(archive_url)
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(AppError::ExternalApi(format!(
                "failed to download archive: {}",
                status
            )));
        }

        Ok(response.json().await?)
    }
}

/// Pulls the watch-history array out of the archive's nested structure.
/// An absent path yields an empty history, not an error.
fn extract_watch_history(archive: Value) -> Vec<Value> {
    archive
        .get("YouTube")
        .and_then(|v| v.get("My Activity"))
        .and_then(|v| v.get("YouTube History"))
        .and_then(|v| v.as_array())
        .cloned()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_watch_history_nested_path() {
        let archive = json!({
            "YouTube": {
                "My Activity": {
                    "YouTube History": [
                        {"header": "YouTube", "title": "Watched something"}
                    ]
                }
            }
        });

        let history = extract_watch_history(archive);
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_extract_watch_history_absent_path_is_empty() {
        assert!(extract_watch_history(json!({})).is_empty());
        assert!(extract_watch_history(json!({"YouTube": {}})).is_empty());
        assert!(extract_watch_history(json!({"YouTube": {"My Activity": {}}})).is_empty());
        assert!(extract_watch_history(json!(null)).is_empty());
    }

    #[test]
    fn test_job_status_deserialization() {
        let status: JobStatus = serde_json::from_str(
            r#"{"state": "COMPLETED", "archiveUrl": "https://example.com/archive.json"}"#,
        )
        .unwrap();
        assert_eq!(status.state, "COMPLETED");
        assert!(status.archive_url.is_some());

        let pending: JobStatus = serde_json::from_str(r#"{"state": "IN_PROGRESS"}"#).unwrap();
        assert_eq!(pending.state, "IN_PROGRESS");
        assert!(pending.archive_url.is_none());
    }
}
