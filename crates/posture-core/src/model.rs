//! Core data model types for posture.
//!
//! Catalog building blocks (questions, pillars, maturity levels), the
//! client information captured on the welcome screen, the response set, and
//! the session state owned by the wizard.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A single weighted question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Identifier, unique across the whole catalog.
    pub id: String,
    /// Question text shown to the user.
    pub text: String,
    /// Importance multiplier applied to the answer.
    pub weight: u32,
}

/// An ordered, named group of questions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pillar {
    /// Identifier, unique within the catalog.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Symbolic icon name, interpreted by the presentation layer.
    pub icon: String,
    /// Questions in display order. Never empty.
    pub questions: Vec<Question>,
}

impl Pillar {
    /// Sum of all question weights in this pillar.
    pub fn total_weight(&self) -> u64 {
        self.questions.iter().map(|q| u64::from(q.weight)).sum()
    }
}

/// One of the ordinal answer choices shared by every question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaturityLevel {
    /// Ordinal value, 1 is the lowest maturity.
    pub value: u8,
    /// Short label.
    pub label: String,
    /// What this level means in practice.
    #[serde(default)]
    pub description: String,
}

/// Cloud platform the assessed organisation runs on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CloudProvider {
    #[default]
    #[serde(rename = "GCP")]
    Gcp,
    #[serde(rename = "AWS")]
    Aws,
    #[serde(rename = "AZURE")]
    Azure,
    #[serde(rename = "HYBRID")]
    Hybrid,
}

impl CloudProvider {
    pub const ALL: [CloudProvider; 4] = [
        CloudProvider::Gcp,
        CloudProvider::Aws,
        CloudProvider::Azure,
        CloudProvider::Hybrid,
    ];

    /// Long display name.
    pub fn label(&self) -> &'static str {
        match self {
            CloudProvider::Gcp => "Google Cloud Platform (GCP)",
            CloudProvider::Aws => "Amazon Web Services (AWS)",
            CloudProvider::Azure => "Microsoft Azure",
            CloudProvider::Hybrid => "Hybrid / On-Premise",
        }
    }
}

impl fmt::Display for CloudProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CloudProvider::Gcp => write!(f, "GCP"),
            CloudProvider::Aws => write!(f, "AWS"),
            CloudProvider::Azure => write!(f, "AZURE"),
            CloudProvider::Hybrid => write!(f, "HYBRID"),
        }
    }
}

impl FromStr for CloudProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gcp" | "google" => Ok(CloudProvider::Gcp),
            "aws" | "amazon" => Ok(CloudProvider::Aws),
            "azure" => Ok(CloudProvider::Azure),
            "hybrid" | "on-prem" | "onprem" => Ok(CloudProvider::Hybrid),
            other => Err(format!("unknown cloud provider: {other}")),
        }
    }
}

/// Who is being assessed. Edited on the welcome screen only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClientInfo {
    pub name: String,
    /// Optional; empty when not given.
    pub email: String,
    pub company: String,
    #[serde(alias = "cloud_provider")]
    pub cloud_provider: CloudProvider,
}

/// Answers keyed by question id.
///
/// A missing key means "unanswered". The wizard guarantees that every key
/// exists in its catalog and every value is a valid maturity level.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResponseSet(BTreeMap<String, u8>);

impl ResponseSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// The recorded level for a question, if answered.
    pub fn get(&self, question_id: &str) -> Option<u8> {
        self.0.get(question_id).copied()
    }

    pub fn contains(&self, question_id: &str) -> bool {
        self.0.contains_key(question_id)
    }

    /// Insert or overwrite an answer. Returns the previous value.
    pub fn insert(&mut self, question_id: impl Into<String>, value: u8) -> Option<u8> {
        self.0.insert(question_id.into(), value)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u8)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl FromIterator<(String, u8)> for ResponseSet {
    fn from_iter<I: IntoIterator<Item = (String, u8)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> FromIterator<(&'a str, u8)> for ResponseSet {
    fn from_iter<I: IntoIterator<Item = (&'a str, u8)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
    }
}

/// Which screen of the assessment the session is on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Step {
    #[default]
    Welcome,
    Assessment,
    Results,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Welcome => write!(f, "welcome"),
            Step::Assessment => write!(f, "assessment"),
            Step::Results => write!(f, "results"),
        }
    }
}

impl FromStr for Step {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "welcome" => Ok(Step::Welcome),
            "assessment" => Ok(Step::Assessment),
            "results" => Ok(Step::Results),
            other => Err(format!("unknown step: {other}")),
        }
    }
}

/// The single mutable aggregate of a session.
///
/// Only [`crate::wizard::Wizard`] holds this by value; everyone else sees a
/// shared reference.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub step: Step,
    pub current_pillar_index: usize,
    pub responses: ResponseSet,
    pub client_info: ClientInfo,
    pub is_submitting: bool,
    pub validation_error: Option<String>,
    pub recovery_prompt_visible: bool,
}
