//! posture-core: Catalog, scoring, and the assessment state machine.
//!
//! This crate defines the question catalog, the pure scoring and completion
//! logic, the wizard that owns a session's mutable state, and the progress
//! store that lets an interrupted session be resumed.

pub mod catalog;
pub mod completion;
pub mod error;
pub mod model;
pub mod parser;
pub mod persistence;
pub mod report;
pub mod sanitize;
pub mod scoring;
pub mod traits;
pub mod wizard;

#[cfg(test)]
pub(crate) mod testing;

pub use catalog::Catalog;
pub use error::{
    CatalogError, FormError, PersistenceError, SubmissionError, ValidationError, WizardError,
};
pub use model::{ClientInfo, CloudProvider, ResponseSet, SessionState, Step};
pub use persistence::{PersistedSnapshot, ProgressStore, StoreOutcome};
pub use scoring::ScoreMap;
pub use traits::{SnapshotMedium, Submission, SubmissionReceipt, Submitter};
pub use wizard::{Wizard, WizardConfig};
