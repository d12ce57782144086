//! Mock submitter for testing.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use chrono::Utc;

use posture_core::error::SubmissionError;
use posture_core::traits::{Submission, SubmissionReceipt, Submitter};

/// A scripted submitter for exercising the submission pipeline without a
/// real receiver.
///
/// Queued failures are returned in order; once the queue is empty every
/// call is accepted.
#[derive(Default)]
pub struct MockSubmitter {
    /// Failures to return before accepting.
    failures: Mutex<VecDeque<SubmissionError>>,
    /// Number of calls made.
    call_count: AtomicU32,
    /// Last submission received.
    last_submission: Mutex<Option<Submission>>,
}

impl MockSubmitter {
    /// A mock that accepts everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// A mock that fails with each of `errors` in turn, then accepts.
    pub fn failing(errors: impl IntoIterator<Item = SubmissionError>) -> Self {
        Self {
            failures: Mutex::new(errors.into_iter().collect()),
            ..Self::default()
        }
    }

    /// Queue one more failure.
    pub fn push_failure(&self, error: SubmissionError) {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(error);
    }

    /// Get the number of calls made to this submitter.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    /// Get the last submission made to this submitter.
    pub fn last_submission(&self) -> Option<Submission> {
        self.last_submission
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl Submitter for MockSubmitter {
    fn name(&self) -> &str {
        "mock"
    }

    async fn submit(&self, submission: &Submission) -> Result<SubmissionReceipt, SubmissionError> {
        let call = self.call_count.fetch_add(1, Ordering::Relaxed) + 1;
        *self
            .last_submission
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(submission.clone());

        let failure = self
            .failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        match failure {
            Some(error) => Err(error),
            None => Ok(SubmissionReceipt {
                submitter: self.name().to_string(),
                reference: Some(format!("mock-{call}")),
                accepted_at: Utc::now(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use posture_core::model::ClientInfo;

    fn submission() -> Submission {
        Submission {
            client_info: ClientInfo {
                company: "Acme".into(),
                ..ClientInfo::default()
            },
            responses: Default::default(),
            scores: Default::default(),
            average_score: 0.0,
            submitted_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn accepts_by_default() {
        let mock = MockSubmitter::new();
        let receipt = mock.submit(&submission()).await.unwrap();
        assert_eq!(receipt.reference.as_deref(), Some("mock-1"));
        assert_eq!(mock.call_count(), 1);
        assert_eq!(mock.last_submission().unwrap().client_info.company, "Acme");
    }

    #[tokio::test]
    async fn replays_failures_in_order() {
        let mock = MockSubmitter::failing([
            SubmissionError::Network("reset".into()),
            SubmissionError::Timeout(30),
        ]);
        mock.push_failure(SubmissionError::Unavailable("later".into()));

        assert!(matches!(
            mock.submit(&submission()).await,
            Err(SubmissionError::Network(_))
        ));
        assert!(matches!(
            mock.submit(&submission()).await,
            Err(SubmissionError::Timeout(30))
        ));
        assert!(matches!(
            mock.submit(&submission()).await,
            Err(SubmissionError::Unavailable(_))
        ));
        let receipt = mock.submit(&submission()).await.unwrap();
        assert_eq!(receipt.reference.as_deref(), Some("mock-4"));
    }
}
