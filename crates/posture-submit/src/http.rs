//! HTTP submission endpoint.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use tracing::instrument;

use posture_core::error::SubmissionError;
use posture_core::traits::{Submission, SubmissionReceipt, Submitter};

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// POSTs the submission as JSON to a configured URL.
pub struct HttpSubmitter {
    url: String,
    api_key: Option<String>,
    timeout_secs: u64,
    client: reqwest::Client,
}

impl HttpSubmitter {
    pub fn new(url: &str, api_key: Option<String>, timeout: Option<Duration>) -> Result<Self> {
        if url.trim().is_empty() {
            anyhow::bail!("submission URL is empty");
        }
        let timeout = timeout.unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            url: url.trim().to_string(),
            api_key: api_key.filter(|k| !k.is_empty()),
            timeout_secs: timeout.as_secs(),
            client,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl std::fmt::Debug for HttpSubmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpSubmitter")
            .field("url", &self.url)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Optional acknowledgement body.
#[derive(Deserialize)]
struct AcceptedBody {
    #[serde(alias = "reference")]
    id: Option<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(alias = "error")]
    message: String,
}

fn error_message(body: String) -> String {
    serde_json::from_str::<ErrorBody>(&body)
        .map(|e| e.message)
        .unwrap_or(body)
}

#[async_trait]
impl Submitter for HttpSubmitter {
    fn name(&self) -> &str {
        "http"
    }

    #[instrument(skip(self, submission), fields(url = %self.url, company = %submission.client_info.company))]
    async fn submit(&self, submission: &Submission) -> Result<SubmissionReceipt, SubmissionError> {
        let mut request = self.client.post(&self.url).json(submission);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                SubmissionError::Timeout(self.timeout_secs)
            } else if e.is_connect() {
                SubmissionError::Unavailable(format!("{} is not reachable", self.url))
            } else {
                SubmissionError::Network(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        if status == 429 || status >= 500 {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status, "submission endpoint unavailable");
            return Err(SubmissionError::Unavailable(format!(
                "HTTP {status}: {}",
                error_message(body)
            )));
        }
        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SubmissionError::Rejected {
                status,
                message: error_message(body),
            });
        }

        let body = response.text().await.unwrap_or_default();
        let reference = serde_json::from_str::<AcceptedBody>(&body)
            .ok()
            .and_then(|b| b.id);
        tracing::debug!(status, reference = ?reference, "submission accepted");

        Ok(SubmissionReceipt {
            submitter: self.name().to_string(),
            reference,
            accepted_at: Utc::now(),
        })
    }
}
