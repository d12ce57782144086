//! posture-submit: Submission collaborators.
//!
//! Implements the `Submitter` trait for an HTTP endpoint, a local
//! (offline) receiver, and a scripted mock, plus the TOML configuration
//! that selects between them.

pub mod config;
pub mod http;
pub mod local;
pub mod mock;

pub use config::{create_submitter, load_config, load_config_from, PostureConfig, SubmitterConfig};
pub use http::HttpSubmitter;
pub use local::LocalSubmitter;
pub use mock::MockSubmitter;
