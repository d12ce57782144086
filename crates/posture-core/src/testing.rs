//! In-crate test doubles for the medium and submitter seams.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use crate::catalog::Catalog;
use crate::error::{PersistenceError, SubmissionError};
use crate::model::ResponseSet;
use crate::traits::{SnapshotMedium, Submission, SubmissionReceipt, Submitter};

/// In-memory medium that counts writes and can be told to fail.
#[derive(Default)]
pub struct RecordingMedium {
    values: Mutex<HashMap<String, String>>,
    writes: AtomicU32,
    removes: AtomicU32,
    failing: AtomicBool,
}

impl RecordingMedium {
    pub fn get(&self, key: &str) -> Option<String> {
        self.values.lock().unwrap().get(key).cloned()
    }

    pub fn put(&self, key: &str, value: &str) {
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
    }

    pub fn writes(&self) -> u32 {
        self.writes.load(Ordering::Relaxed)
    }

    pub fn removes(&self) -> u32 {
        self.removes.load(Ordering::Relaxed)
    }

    pub fn fail_all(&self, failing: bool) {
        self.failing.store(failing, Ordering::Relaxed);
    }

    fn check(&self) -> Result<(), PersistenceError> {
        if self.failing.load(Ordering::Relaxed) {
            return Err(PersistenceError::Unavailable("medium switched off".into()));
        }
        Ok(())
    }
}

impl SnapshotMedium for RecordingMedium {
    fn name(&self) -> &str {
        "recording"
    }

    fn read(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        self.check()?;
        Ok(self.get(key))
    }

    fn write(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        self.writes.fetch_add(1, Ordering::Relaxed);
        self.check()?;
        self.put(key, value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), PersistenceError> {
        self.removes.fetch_add(1, Ordering::Relaxed);
        self.check()?;
        self.values.lock().unwrap().remove(key);
        Ok(())
    }
}

/// Submitter that replays a queue of outcomes, accepting once it runs dry.
#[derive(Default)]
pub struct ScriptedSubmitter {
    outcomes: Mutex<VecDeque<Result<(), SubmissionError>>>,
    delay: Option<Duration>,
    calls: AtomicU32,
    last: Mutex<Option<Submission>>,
}

impl ScriptedSubmitter {
    pub fn failing_once(error: SubmissionError) -> Self {
        let submitter = Self::default();
        submitter.outcomes.lock().unwrap().push_back(Err(error));
        submitter
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::Relaxed)
    }

    pub fn last_submission(&self) -> Option<Submission> {
        self.last.lock().unwrap().clone()
    }
}

#[async_trait]
impl Submitter for ScriptedSubmitter {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn submit(&self, submission: &Submission) -> Result<SubmissionReceipt, SubmissionError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        *self.last.lock().unwrap() = Some(submission.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let outcome = self.outcomes.lock().unwrap().pop_front().unwrap_or(Ok(()));
        outcome.map(|()| SubmissionReceipt {
            submitter: "scripted".into(),
            reference: Some(format!("sub-{}", self.calls())),
            accepted_at: Utc::now(),
        })
    }
}

/// Every question of `catalog` answered with `value`.
pub fn answer_all(catalog: &Catalog, value: u8) -> ResponseSet {
    catalog
        .pillars()
        .iter()
        .flat_map(|p| p.questions.iter().map(|q| (q.id.clone(), value)))
        .collect()
}
