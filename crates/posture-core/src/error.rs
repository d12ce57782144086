//! Error types for the assessment core.
//!
//! Only [`ValidationError`] and [`SubmissionError`] are meant to reach the
//! person taking the assessment. [`PersistenceError`] is absorbed by the
//! progress store and only ever logged.

use thiserror::Error;

use crate::model::Step;

fn plural(n: &usize) -> &'static str {
    if *n == 1 {
        ""
    } else {
        "s"
    }
}

/// A completeness guard refused a transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The current pillar still has unanswered questions.
    #[error("please answer every question: {unanswered} question{} left in this pillar", plural(.unanswered))]
    PillarIncomplete { pillar: String, unanswered: usize },

    /// The assessment as a whole still has unanswered questions.
    #[error("cannot finish yet: {unanswered} question{} still unanswered", plural(.unanswered))]
    AssessmentIncomplete { unanswered: usize },
}

impl ValidationError {
    /// Number of questions that still need an answer.
    pub fn unanswered(&self) -> usize {
        match self {
            ValidationError::PillarIncomplete { unanswered, .. }
            | ValidationError::AssessmentIncomplete { unanswered } => *unanswered,
        }
    }
}

/// Errors returned by a submission collaborator.
///
/// Defined here rather than in `posture-submit` so the wizard can turn them
/// into a retry message without knowing which transport produced them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmissionError {
    /// The receiving end refused the submission.
    #[error("submission rejected (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },

    /// The submission did not complete in time.
    #[error("submission timed out after {0}s")]
    Timeout(u64),

    /// A network error occurred.
    #[error("network error: {0}")]
    Network(String),

    /// The receiving end is temporarily unavailable.
    #[error("submission endpoint unavailable: {0}")]
    Unavailable(String),
}

/// Failures of the local persistence medium. Never surfaced to the user.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// The medium cannot be used at all.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// The medium refused a write because it is full.
    #[error("storage quota exceeded: {needed} bytes needed, {limit} allowed")]
    QuotaExceeded { needed: usize, limit: usize },

    /// An I/O error from a file-backed medium.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The snapshot could not be serialized.
    #[error("failed to encode snapshot: {0}")]
    Encode(#[source] serde_json::Error),

    /// The stored value is not a snapshot.
    #[error("failed to decode snapshot: {0}")]
    Decode(#[source] serde_json::Error),

    /// The stored snapshot does not fit the current catalog.
    #[error("invalid snapshot: {0}")]
    Invalid(String),
}

/// Problems found while assembling a catalog.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("catalog has no pillars")]
    NoPillars,

    #[error("pillar {0} has no questions")]
    EmptyPillar(String),

    #[error("duplicate pillar id: {0}")]
    DuplicatePillar(String),

    #[error("duplicate question id: {0}")]
    DuplicateQuestion(String),

    #[error("question {question} has invalid weight {weight} (must be a positive integer)")]
    InvalidWeight { question: String, weight: i64 },

    #[error("invalid maturity levels: {0}")]
    InvalidLevels(String),
}

/// Rejections from the welcome form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("name is required")]
    MissingName,

    #[error("company is required")]
    MissingCompany,

    #[error("invalid email address: {0}")]
    InvalidEmail(String),

    #[error("unknown cloud provider: {0}")]
    UnknownProvider(String),
}

/// Errors returned by [`crate::wizard::Wizard`] operations.
#[derive(Debug, Error)]
pub enum WizardError {
    /// The operation is not legal in the current step.
    #[error("`{operation}` is not allowed during the {step} step")]
    IllegalStep { operation: &'static str, step: Step },

    /// Saved progress was found and must be restored or discarded first.
    #[error("saved progress is waiting for a restore or discard decision")]
    RecoveryPending,

    /// `restore`/`discard` was called without a pending recovery decision.
    #[error("no saved progress is waiting for a decision")]
    NoRecoveryPending,

    #[error("unknown question: {0}")]
    UnknownQuestion(String),

    #[error("invalid maturity level {value} (expected 1..={max})")]
    InvalidLevel { value: u8, max: u8 },

    #[error("pillar index {index} is out of range ({count} pillars)")]
    PillarOutOfRange { index: usize, count: usize },

    #[error("already at the first pillar")]
    AtFirstPillar,

    #[error("already at the last pillar")]
    AtLastPillar,

    /// A forward jump skipped past an incomplete pillar.
    #[error("pillar {target} is locked until pillar {gate} is complete")]
    PillarLocked { target: usize, gate: usize },

    #[error("a submission is already in flight")]
    SubmissionInFlight,

    #[error("no submission is in flight")]
    NoSubmissionInFlight,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Submission(#[from] SubmissionError),
}

impl WizardError {
    /// Returns `true` for errors the presentation layer should show verbatim.
    pub fn is_user_facing(&self) -> bool {
        matches!(self, WizardError::Validation(_) | WizardError::Submission(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_messages_pluralize() {
        let one = ValidationError::PillarIncomplete {
            pillar: "GOVERN".into(),
            unanswered: 1,
        };
        assert!(one.to_string().contains("1 question left"));

        let many = ValidationError::AssessmentIncomplete { unanswered: 4 };
        assert!(many.to_string().contains("4 questions still unanswered"));
        assert_eq!(many.unanswered(), 4);
    }

    #[test]
    fn only_validation_and_submission_are_user_facing() {
        assert!(WizardError::from(ValidationError::AssessmentIncomplete { unanswered: 2 })
            .is_user_facing());
        assert!(WizardError::from(SubmissionError::Timeout(30)).is_user_facing());
        assert!(!WizardError::RecoveryPending.is_user_facing());
        assert!(!WizardError::IllegalStep {
            operation: "record_response",
            step: Step::Results,
        }
        .is_user_facing());
    }
}
