//! The assessment wizard: the state machine that owns a session.
//!
//! Steps run `Welcome → Assessment → Results`. [`Wizard::reset`] is a hard
//! reset back to `Welcome` from anywhere, not a transition. Every mutation
//! goes through a named operation here, and each one that changes durable
//! fields issues its own save through the [`ProgressStore`].

use std::sync::Arc;
use std::time::Duration;

use crate::catalog::Catalog;
use crate::completion::Completion;
use crate::error::{SubmissionError, ValidationError, WizardError};
use crate::model::{ClientInfo, Pillar, SessionState, Step};
use crate::persistence::{PersistedSnapshot, ProgressStore};
use crate::report::AssessmentReport;
use crate::scoring::{self, ScoreMap};
use crate::traits::{Submission, SubmissionReceipt, Submitter};

type Result<T> = std::result::Result<T, WizardError>;

/// Configuration for the wizard.
#[derive(Debug, Clone)]
pub struct WizardConfig {
    /// Upper bound on a single submission call. `None` waits indefinitely.
    pub submission_timeout: Option<Duration>,
}

impl Default for WizardConfig {
    fn default() -> Self {
        Self {
            submission_timeout: Some(Duration::from_secs(30)),
        }
    }
}

/// Owns the session state of one assessment.
#[derive(Debug)]
pub struct Wizard {
    catalog: Arc<Catalog>,
    store: ProgressStore,
    config: WizardConfig,
    state: SessionState,
    recovery_checked: bool,
    pending_recovery: Option<PersistedSnapshot>,
    in_flight: Option<Submission>,
    submitted: Option<Submission>,
    receipt: Option<SubmissionReceipt>,
}

impl Wizard {
    /// A fresh session on the welcome step.
    pub fn new(catalog: Arc<Catalog>, store: ProgressStore, config: WizardConfig) -> Self {
        Self {
            catalog,
            store,
            config,
            state: SessionState::default(),
            recovery_checked: false,
            pending_recovery: None,
            in_flight: None,
            submitted: None,
            receipt: None,
        }
    }

    // -----------------------------------------------------------------------
    // Read side
    // -----------------------------------------------------------------------

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn step(&self) -> Step {
        self.state.step
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn current_pillar(&self) -> &Pillar {
        &self.catalog.pillars()[self.state.current_pillar_index]
    }

    pub fn is_last_pillar(&self) -> bool {
        self.state.current_pillar_index == self.catalog.last_pillar_index()
    }

    pub fn completion(&self) -> Completion<'_> {
        Completion::new(&self.catalog, &self.state.responses)
    }

    pub fn scores(&self) -> ScoreMap {
        scoring::score(&self.state.responses, &self.catalog)
    }

    pub fn average_score(&self) -> f64 {
        self.scores().average()
    }

    /// Position through the pillars as a percentage, counting the current one.
    pub fn progress_percent(&self) -> f64 {
        (self.state.current_pillar_index + 1) as f64 / self.catalog.pillar_count() as f64 * 100.0
    }

    /// Whether [`Wizard::navigate_to_pillar`] would accept `index` right now.
    pub fn can_navigate_to(&self, index: usize) -> bool {
        index < self.catalog.pillar_count() && self.locked_gate(index).is_none()
    }

    /// The snapshot awaiting a restore-or-discard decision.
    pub fn pending_recovery(&self) -> Option<&PersistedSnapshot> {
        self.pending_recovery.as_ref()
    }

    pub fn receipt(&self) -> Option<&SubmissionReceipt> {
        self.receipt.as_ref()
    }

    /// The results report, available once the session reached `Results`.
    pub fn report(&self) -> Option<AssessmentReport> {
        if self.state.step != Step::Results {
            return None;
        }
        let submission = self.submitted.as_ref()?;
        Some(AssessmentReport::build(
            &self.catalog,
            &submission.client_info,
            &submission.responses,
            self.receipt.clone(),
        ))
    }

    // -----------------------------------------------------------------------
    // Recovery
    // -----------------------------------------------------------------------

    /// Look for saved progress. Runs once per session; later calls only
    /// report whether the recovery prompt is still showing.
    pub fn check_recovery(&mut self) -> bool {
        if self.recovery_checked {
            return self.state.recovery_prompt_visible;
        }
        self.recovery_checked = true;

        match self.store.load().into_option() {
            Some(snapshot) if snapshot.has_progress() => {
                tracing::info!(
                    answered = snapshot.responses.len(),
                    saved_at = %snapshot.saved_at,
                    "found saved progress"
                );
                self.pending_recovery = Some(snapshot);
                self.state.recovery_prompt_visible = true;
                true
            }
            _ => false,
        }
    }

    /// Replay the pending snapshot and continue the assessment.
    pub fn restore(&mut self) -> Result<()> {
        let snapshot = self
            .pending_recovery
            .take()
            .ok_or(WizardError::NoRecoveryPending)?;

        self.state = SessionState {
            step: Step::Assessment,
            current_pillar_index: snapshot.current_pillar_index,
            responses: snapshot.responses,
            client_info: snapshot.client_info,
            is_submitting: false,
            validation_error: None,
            recovery_prompt_visible: false,
        };
        tracing::info!(
            answered = self.state.responses.len(),
            pillar = self.state.current_pillar_index,
            "progress restored"
        );
        Ok(())
    }

    /// Throw the pending snapshot away and start over.
    pub fn discard(&mut self) -> Result<()> {
        if self.pending_recovery.is_none() {
            return Err(WizardError::NoRecoveryPending);
        }
        self.reset();
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Transitions
    // -----------------------------------------------------------------------

    /// Replace the client details. Only possible on the welcome step.
    pub fn set_client_info(&mut self, info: ClientInfo) -> Result<()> {
        self.require("set_client_info", Step::Welcome)?;
        self.state.client_info = info;
        Ok(())
    }

    pub fn start_assessment(&mut self) -> Result<()> {
        self.require("start_assessment", Step::Welcome)?;
        self.state.step = Step::Assessment;
        self.state.current_pillar_index = 0;
        self.state.validation_error = None;
        let _ = self.store.save(&PersistedSnapshot::capture(&self.state));
        tracing::info!(company = %self.state.client_info.company, "assessment started");
        Ok(())
    }

    /// Record (or change) the answer to a question.
    pub fn record_response(&mut self, question_id: &str, value: u8) -> Result<()> {
        self.require("record_response", Step::Assessment)?;
        if self.catalog.question(question_id).is_none() {
            return Err(WizardError::UnknownQuestion(question_id.to_string()));
        }
        if !self.catalog.is_valid_level(value) {
            return Err(WizardError::InvalidLevel {
                value,
                max: self.catalog.max_level(),
            });
        }

        self.state.responses.insert(question_id, value);
        self.state.validation_error = None;
        tracing::debug!(question = question_id, value, "response recorded");
        self.autosave();
        Ok(())
    }

    /// Advance one pillar. The current pillar must be complete.
    pub fn next_pillar(&mut self) -> Result<()> {
        self.require("next_pillar", Step::Assessment)?;
        let current = self.state.current_pillar_index;
        if current >= self.catalog.last_pillar_index() {
            return Err(WizardError::AtLastPillar);
        }

        let unanswered = self.completion().unanswered_count(current);
        if unanswered > 0 {
            let error = ValidationError::PillarIncomplete {
                pillar: self.current_pillar().id.clone(),
                unanswered,
            };
            self.state.validation_error = Some(error.to_string());
            return Err(error.into());
        }

        self.move_to(current + 1);
        Ok(())
    }

    /// Go back one pillar. Never blocked by completeness.
    pub fn prev_pillar(&mut self) -> Result<()> {
        self.require("prev_pillar", Step::Assessment)?;
        let current = self.state.current_pillar_index;
        if current == 0 {
            return Err(WizardError::AtFirstPillar);
        }
        self.move_to(current - 1);
        Ok(())
    }

    /// Jump to a pillar. Backward jumps always succeed; forward jumps need
    /// every pillar between here and the target to be complete.
    pub fn navigate_to_pillar(&mut self, index: usize) -> Result<()> {
        self.require("navigate_to_pillar", Step::Assessment)?;
        let count = self.catalog.pillar_count();
        if index >= count {
            return Err(WizardError::PillarOutOfRange { index, count });
        }
        if let Some(gate) = self.locked_gate(index) {
            return Err(WizardError::PillarLocked {
                target: index,
                gate,
            });
        }
        self.move_to(index);
        Ok(())
    }

    /// Check completeness and capture the payload for submission.
    ///
    /// Whatever happens to the live state afterwards, the payload returned
    /// here is what gets submitted and reported.
    pub fn begin_submission(&mut self) -> Result<Submission> {
        self.require("finish", Step::Assessment)?;
        if self.in_flight.is_some() {
            return Err(WizardError::SubmissionInFlight);
        }

        let unanswered = self.completion().total_unanswered();
        if unanswered > 0 {
            let error = ValidationError::AssessmentIncomplete { unanswered };
            self.state.validation_error = Some(error.to_string());
            return Err(error.into());
        }

        let scores = self.scores();
        let submission = Submission {
            client_info: self.state.client_info.clone(),
            responses: self.state.responses.clone(),
            average_score: scores.average(),
            scores,
            submitted_at: chrono::Utc::now(),
        };
        self.state.is_submitting = true;
        self.state.validation_error = None;
        self.in_flight = Some(submission.clone());
        Ok(submission)
    }

    /// Apply the submitter's verdict for the in-flight submission.
    pub fn complete_submission(
        &mut self,
        outcome: std::result::Result<SubmissionReceipt, SubmissionError>,
    ) -> Result<SubmissionReceipt> {
        let submission = self
            .in_flight
            .take()
            .ok_or(WizardError::NoSubmissionInFlight)?;
        self.state.is_submitting = false;

        match outcome {
            Ok(receipt) => {
                let _ = self.store.clear();
                self.state.responses = submission.responses.clone();
                self.state.step = Step::Results;
                self.state.validation_error = None;
                tracing::info!(
                    submitter = %receipt.submitter,
                    reference = receipt.reference.as_deref().unwrap_or("-"),
                    average = submission.average_score,
                    "assessment submitted"
                );
                self.submitted = Some(submission);
                self.receipt = Some(receipt.clone());
                Ok(receipt)
            }
            Err(error) => {
                tracing::error!("assessment submission failed: {error}");
                self.state.validation_error = Some(format!(
                    "could not submit the assessment ({error}); your answers are kept, please try again"
                ));
                Err(error.into())
            }
        }
    }

    /// Validate, submit through `submitter`, and move to `Results` on success.
    pub async fn finish(&mut self, submitter: &dyn Submitter) -> Result<SubmissionReceipt> {
        let submission = self.begin_submission()?;
        tracing::debug!(submitter = submitter.name(), "submitting assessment");

        let outcome = match self.config.submission_timeout {
            Some(limit) => tokio::time::timeout(limit, submitter.submit(&submission))
                .await
                .unwrap_or(Err(SubmissionError::Timeout(limit.as_secs()))),
            None => submitter.submit(&submission).await,
        };
        self.complete_submission(outcome)
    }

    /// Start fresh: forget everything and delete saved progress.
    pub fn reset(&mut self) {
        let _ = self.store.clear();
        self.state = SessionState::default();
        self.pending_recovery = None;
        self.in_flight = None;
        self.submitted = None;
        self.receipt = None;
        tracing::info!("session reset");
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn require(&self, operation: &'static str, step: Step) -> Result<()> {
        if self.state.recovery_prompt_visible {
            return Err(WizardError::RecoveryPending);
        }
        if self.state.step != step {
            return Err(WizardError::IllegalStep {
                operation,
                step: self.state.step,
            });
        }
        Ok(())
    }

    /// First incomplete pillar blocking a forward jump to `target`.
    fn locked_gate(&self, target: usize) -> Option<usize> {
        let current = self.state.current_pillar_index;
        if target <= current {
            return None;
        }
        let completion = self.completion();
        (current..target).find(|&i| !completion.is_pillar_complete(i))
    }

    fn move_to(&mut self, index: usize) {
        let from = self.state.current_pillar_index;
        self.state.current_pillar_index = index;
        self.state.validation_error = None;
        tracing::debug!(from, to = index, "pillar changed");
        self.autosave();
    }

    /// Save cadence: only mid-assessment and only once something is answered.
    fn autosave(&self) {
        if self.state.step == Step::Assessment && !self.state.responses.is_empty() {
            let _ = self.store.save(&PersistedSnapshot::capture(&self.state));
        }
    }
}
