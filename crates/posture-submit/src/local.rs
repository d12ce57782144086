//! Offline submitter.
//!
//! Accepts every submission after an optional simulated delay. When an
//! outbox directory is configured each accepted submission is also written
//! there as JSON, named after its reference.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use posture_core::error::SubmissionError;
use posture_core::traits::{Submission, SubmissionReceipt, Submitter};

/// Local, always-accepting submitter.
#[derive(Debug, Clone, Default)]
pub struct LocalSubmitter {
    delay: Duration,
    outbox: Option<PathBuf>,
}

impl LocalSubmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_outbox(mut self, dir: impl Into<PathBuf>) -> Self {
        self.outbox = Some(dir.into());
        self
    }

    pub fn outbox(&self) -> Option<&Path> {
        self.outbox.as_deref()
    }

    fn write_outbox(
        &self,
        dir: &Path,
        reference: &str,
        submission: &Submission,
    ) -> Result<PathBuf, SubmissionError> {
        let path = dir.join(format!("submission-{reference}.json"));
        let json = serde_json::to_string_pretty(submission)
            .map_err(|e| SubmissionError::Unavailable(format!("failed to encode submission: {e}")))?;
        std::fs::create_dir_all(dir)
            .and_then(|()| std::fs::write(&path, json))
            .map_err(|e| {
                SubmissionError::Unavailable(format!("outbox {} not writable: {e}", dir.display()))
            })?;
        Ok(path)
    }
}

#[async_trait]
impl Submitter for LocalSubmitter {
    fn name(&self) -> &str {
        "local"
    }

    async fn submit(&self, submission: &Submission) -> Result<SubmissionReceipt, SubmissionError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let reference = Uuid::new_v4().to_string();
        if let Some(dir) = &self.outbox {
            let path = self.write_outbox(dir, &reference, submission)?;
            tracing::info!(path = %path.display(), "submission stored in outbox");
        }

        Ok(SubmissionReceipt {
            submitter: self.name().to_string(),
            reference: Some(reference),
            accepted_at: Utc::now(),
        })
    }
}
