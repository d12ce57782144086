//! Seams to the outside world: the durable medium snapshots are written to,
//! and the collaborator that receives a finished assessment.
//!
//! Concrete media live in `posture-store`; submitters live in
//! `posture-submit`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{PersistenceError, SubmissionError};
use crate::model::{ClientInfo, ResponseSet};
use crate::scoring::ScoreMap;

// ---------------------------------------------------------------------------
// Snapshot medium
// ---------------------------------------------------------------------------

/// A small local key-value medium holding serialized snapshots.
///
/// Implementations report failures honestly; swallowing them is the job of
/// [`crate::persistence::ProgressStore`].
pub trait SnapshotMedium: Send + Sync {
    /// Human-readable medium name (e.g. "file").
    fn name(&self) -> &str;

    /// Read the value under `key`, `None` if nothing is stored.
    fn read(&self, key: &str) -> Result<Option<String>, PersistenceError>;

    /// Store `value` under `key`, replacing any previous value.
    fn write(&self, key: &str, value: &str) -> Result<(), PersistenceError>;

    /// Delete the value under `key`. Deleting a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), PersistenceError>;
}

// ---------------------------------------------------------------------------
// Submitter
// ---------------------------------------------------------------------------

/// Receives a completed assessment.
#[async_trait]
pub trait Submitter: Send + Sync {
    /// Human-readable submitter name (e.g. "http").
    fn name(&self) -> &str;

    /// Deliver the submission. Deduplicating repeated successful
    /// submissions is the receiver's concern.
    async fn submit(&self, submission: &Submission) -> Result<SubmissionReceipt, SubmissionError>;
}

/// Payload captured from the session when a submission begins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub client_info: ClientInfo,
    pub responses: ResponseSet,
    pub scores: ScoreMap,
    pub average_score: f64,
    pub submitted_at: DateTime<Utc>,
}

/// Acknowledgement returned by a submitter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionReceipt {
    /// Which submitter accepted it.
    pub submitter: String,
    /// Identifier assigned by the receiver, if any.
    #[serde(default)]
    pub reference: Option<String>,
    pub accepted_at: DateTime<Utc>,
}
