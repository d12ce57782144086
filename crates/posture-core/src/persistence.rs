//! Snapshot persistence and progress recovery.
//!
//! [`ProgressStore`] is the only component that talks to a
//! [`SnapshotMedium`]. Every operation returns a [`StoreOutcome`] instead of
//! a `Result`: losing the ability to persist must never abort an assessment,
//! so failures are logged and handed back as data for callers that care.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::error::PersistenceError;
use crate::model::{ClientInfo, ResponseSet, SessionState, Step};
use crate::traits::SnapshotMedium;

/// Key snapshots are stored under unless configured otherwise.
pub const DEFAULT_STORAGE_KEY: &str = "assessment_progress";

/// Durable projection of a session. Transient flags are never part of it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedSnapshot {
    pub responses: ResponseSet,
    pub client_info: ClientInfo,
    pub current_pillar_index: usize,
    pub step: Step,
    pub saved_at: DateTime<Utc>,
}

impl PersistedSnapshot {
    /// Project the durable fields of `state`, stamped with the current time.
    pub fn capture(state: &SessionState) -> Self {
        Self {
            responses: state.responses.clone(),
            client_info: state.client_info.clone(),
            current_pillar_index: state.current_pillar_index,
            step: state.step,
            saved_at: Utc::now(),
        }
    }

    /// Whether this snapshot is worth offering for recovery.
    pub fn has_progress(&self) -> bool {
        !self.responses.is_empty()
    }
}

/// Outcome of a best-effort persistence operation.
#[derive(Debug)]
#[must_use]
pub enum StoreOutcome<T = ()> {
    /// The operation succeeded.
    Done(T),
    /// Nothing was stored under the key.
    Absent,
    /// The medium failed; the caller carries on as if nothing was stored.
    Failed(PersistenceError),
}

impl<T> StoreOutcome<T> {
    pub fn is_done(&self) -> bool {
        matches!(self, StoreOutcome::Done(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, StoreOutcome::Failed(_))
    }

    /// Collapse `Absent` and `Failed` into `None`.
    pub fn into_option(self) -> Option<T> {
        match self {
            StoreOutcome::Done(value) => Some(value),
            StoreOutcome::Absent | StoreOutcome::Failed(_) => None,
        }
    }
}

/// Lenient on-disk shape. Missing fields default, shape errors fail.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredSnapshot {
    #[serde(default)]
    responses: Option<BTreeMap<String, u8>>,
    #[serde(default)]
    client_info: Option<serde_json::Value>,
    #[serde(default, alias = "currentPillarIdx")]
    current_pillar_index: Option<usize>,
    #[serde(default)]
    step: Option<serde_json::Value>,
    #[serde(default)]
    saved_at: Option<String>,
}

/// Parse and check a stored snapshot against `catalog`.
///
/// Unknown question ids, out-of-range levels, and an out-of-range pillar
/// index reject the snapshot as a whole. Client info, step, and timestamp
/// fall back to defaults when missing or malformed.
fn decode(raw: &str, catalog: &Catalog) -> Result<PersistedSnapshot, PersistenceError> {
    let stored: StoredSnapshot = serde_json::from_str(raw).map_err(PersistenceError::Decode)?;

    let mut responses = ResponseSet::new();
    for (question_id, value) in stored.responses.unwrap_or_default() {
        if catalog.question(&question_id).is_none() {
            return Err(PersistenceError::Invalid(format!(
                "unknown question id: {question_id}"
            )));
        }
        if !catalog.is_valid_level(value) {
            return Err(PersistenceError::Invalid(format!(
                "level {value} for {question_id} is outside 1..={}",
                catalog.max_level()
            )));
        }
        responses.insert(question_id, value);
    }

    let current_pillar_index = stored.current_pillar_index.unwrap_or(0);
    if current_pillar_index >= catalog.pillar_count() {
        return Err(PersistenceError::Invalid(format!(
            "pillar index {current_pillar_index} out of range ({} pillars)",
            catalog.pillar_count()
        )));
    }

    let client_info = match stored.client_info {
        Some(value) => serde_json::from_value(value).unwrap_or_else(|e| {
            tracing::debug!("snapshot client info unreadable, using defaults: {e}");
            ClientInfo::default()
        }),
        None => ClientInfo::default(),
    };

    let step = stored
        .step
        .as_ref()
        .and_then(|v| v.as_str())
        .and_then(|s| s.parse::<Step>().ok())
        .unwrap_or(Step::Assessment);

    let saved_at = stored
        .saved_at
        .as_deref()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|d| d.with_timezone(&Utc))
        .unwrap_or_default();

    Ok(PersistedSnapshot {
        responses,
        client_info,
        current_pillar_index,
        step,
        saved_at,
    })
}

/// Best-effort persistence of session progress under one fixed key.
#[derive(Clone)]
pub struct ProgressStore {
    medium: Arc<dyn SnapshotMedium>,
    key: String,
    catalog: Arc<Catalog>,
}

impl ProgressStore {
    pub fn new(medium: Arc<dyn SnapshotMedium>, catalog: Arc<Catalog>) -> Self {
        Self {
            medium,
            key: DEFAULT_STORAGE_KEY.to_string(),
            catalog,
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn medium_name(&self) -> &str {
        self.medium.name()
    }

    /// Write `snapshot`, overwriting any previous one.
    pub fn save(&self, snapshot: &PersistedSnapshot) -> StoreOutcome {
        let json = match serde_json::to_string(snapshot) {
            Ok(json) => json,
            Err(e) => return self.failed("save", PersistenceError::Encode(e)),
        };
        match self.medium.write(&self.key, &json) {
            Ok(()) => {
                tracing::debug!(
                    key = %self.key,
                    answered = snapshot.responses.len(),
                    pillar = snapshot.current_pillar_index,
                    "progress saved"
                );
                StoreOutcome::Done(())
            }
            Err(e) => self.failed("save", e),
        }
    }

    /// Read the stored snapshot. Anything unreadable counts as no progress.
    pub fn load(&self) -> StoreOutcome<PersistedSnapshot> {
        let raw = match self.medium.read(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return StoreOutcome::Absent,
            Err(e) => return self.failed("load", e),
        };
        match decode(&raw, &self.catalog) {
            Ok(snapshot) => StoreOutcome::Done(snapshot),
            Err(e) => self.failed("load", e),
        }
    }

    /// Delete the stored snapshot.
    pub fn clear(&self) -> StoreOutcome {
        match self.medium.remove(&self.key) {
            Ok(()) => {
                tracing::debug!(key = %self.key, "saved progress cleared");
                StoreOutcome::Done(())
            }
            Err(e) => self.failed("clear", e),
        }
    }

    /// `true` iff a valid snapshot with at least one answer is stored.
    pub fn has_recoverable_progress(&self) -> bool {
        self.load()
            .into_option()
            .is_some_and(|snapshot| snapshot.has_progress())
    }

    fn failed<T>(&self, operation: &str, error: PersistenceError) -> StoreOutcome<T> {
        tracing::warn!(
            key = %self.key,
            medium = self.medium.name(),
            "progress {operation} failed, continuing without it: {error}"
        );
        StoreOutcome::Failed(error)
    }
}

impl std::fmt::Debug for ProgressStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressStore")
            .field("medium", &self.medium.name())
            .field("key", &self.key)
            .finish()
    }
}
