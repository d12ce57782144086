//! Results report with JSON persistence and score banding.

use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::Catalog;
use crate::model::{ClientInfo, ResponseSet};
use crate::scoring::{average_score, score};
use crate::traits::SubmissionReceipt;

/// Coarse classification of a 0-100 score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreBand {
    /// Below 40.
    Critical,
    /// 40 up to (not including) 70.
    NeedsImprovement,
    /// 70 and above.
    Resilient,
}

impl ScoreBand {
    pub fn from_score(score: f64) -> Self {
        if score < 40.0 {
            ScoreBand::Critical
        } else if score < 70.0 {
            ScoreBand::NeedsImprovement
        } else {
            ScoreBand::Resilient
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ScoreBand::Critical => "Critical risk",
            ScoreBand::NeedsImprovement => "Improvement needed",
            ScoreBand::Resilient => "Resilient",
        }
    }

    /// One-line reading of a pillar in this band.
    pub fn pillar_summary(&self) -> &'static str {
        match self {
            ScoreBand::Critical => "Critical gaps detected in the infrastructure.",
            ScoreBand::NeedsImprovement => "Controls exist, but automation is lacking.",
            ScoreBand::Resilient => "Process optimised to international standards.",
        }
    }

    /// Hex colour used by renderers.
    pub fn color(&self) -> &'static str {
        match self {
            ScoreBand::Critical => "#f43f5e",
            ScoreBand::NeedsImprovement => "#f59e0b",
            ScoreBand::Resilient => "#10b981",
        }
    }
}

impl fmt::Display for ScoreBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Round a score to the whole percent shown to people.
pub fn display_percent(score: f64) -> u32 {
    score.round().clamp(0.0, 100.0) as u32
}

/// Outcome for a single pillar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PillarResult {
    pub id: String,
    pub name: String,
    pub icon: String,
    /// Unrounded score in `[0, 100]`.
    pub score: f64,
    pub band: ScoreBand,
    pub answered: usize,
    pub total: usize,
}

impl PillarResult {
    pub fn percent(&self) -> u32 {
        display_percent(self.score)
    }
}

/// Summary of the catalog (without the question text).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogSummary {
    pub id: String,
    pub name: String,
    pub pillar_count: usize,
    pub question_count: usize,
}

/// A finished assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    pub catalog: CatalogSummary,
    pub client_info: ClientInfo,
    /// Per-pillar outcomes in catalog order.
    pub pillars: Vec<PillarResult>,
    /// Mean of the pillar scores, unrounded.
    pub average_score: f64,
    pub band: ScoreBand,
    pub responses: ResponseSet,
    /// Acknowledgement from the submitter, when there was one.
    #[serde(default)]
    pub receipt: Option<SubmissionReceipt>,
}

impl AssessmentReport {
    /// Score `responses` against `catalog` and assemble the report.
    pub fn build(
        catalog: &Catalog,
        client_info: &ClientInfo,
        responses: &ResponseSet,
        receipt: Option<SubmissionReceipt>,
    ) -> Self {
        let scores = score(responses, catalog);
        let pillars = catalog
            .pillars()
            .iter()
            .map(|p| {
                let value = scores.get(&p.id).unwrap_or(0.0);
                PillarResult {
                    id: p.id.clone(),
                    name: p.name.clone(),
                    icon: p.icon.clone(),
                    score: value,
                    band: ScoreBand::from_score(value),
                    answered: p
                        .questions
                        .iter()
                        .filter(|q| responses.contains(&q.id))
                        .count(),
                    total: p.questions.len(),
                }
            })
            .collect();
        let average = average_score(&scores);

        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            catalog: CatalogSummary {
                id: catalog.id().to_string(),
                name: catalog.name().to_string(),
                pillar_count: catalog.pillar_count(),
                question_count: catalog.question_count(),
            },
            client_info: client_info.clone(),
            pillars,
            average_score: average,
            band: ScoreBand::from_score(average),
            responses: responses.clone(),
            receipt,
        }
    }

    pub fn pillar(&self, id: &str) -> Option<&PillarResult> {
        self.pillars.iter().find(|p| p.id == id)
    }

    /// Overall score rounded for display.
    pub fn percent(&self) -> u32 {
        display_percent(self.average_score)
    }

    /// The lowest-scoring pillar; the first one on ties.
    pub fn weakest_pillar(&self) -> Option<&PillarResult> {
        self.pillars
            .iter()
            .fold(None, |weakest: Option<&PillarResult>, p| match weakest {
                Some(w) if w.score <= p.score => Some(w),
                _ => Some(p),
            })
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: AssessmentReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CloudProvider;
    use crate::testing::answer_all;

    fn client() -> ClientInfo {
        ClientInfo {
            name: "Grace".into(),
            email: String::new(),
            company: "Hopper Labs".into(),
            cloud_provider: CloudProvider::Aws,
        }
    }

    #[test]
    fn band_thresholds() {
        assert_eq!(ScoreBand::from_score(0.0), ScoreBand::Critical);
        assert_eq!(ScoreBand::from_score(39.99), ScoreBand::Critical);
        assert_eq!(ScoreBand::from_score(40.0), ScoreBand::NeedsImprovement);
        assert_eq!(ScoreBand::from_score(69.9), ScoreBand::NeedsImprovement);
        assert_eq!(ScoreBand::from_score(70.0), ScoreBand::Resilient);
        assert_eq!(ScoreBand::Resilient.to_string(), "Resilient");
    }

    #[test]
    fn display_percent_rounds_half_up() {
        assert_eq!(display_percent(51.7857), 52);
        assert_eq!(display_percent(99.5), 100);
        assert_eq!(display_percent(0.4), 0);
    }

    #[test]
    fn build_scores_every_pillar() {
        let catalog = Catalog::builtin();
        let mut responses = answer_all(&catalog, 4);
        responses.insert("G1", 2);
        responses.insert("G2", 3);
        responses.insert("G3", 1);

        let report = AssessmentReport::build(&catalog, &client(), &responses, None);
        assert_eq!(report.pillars.len(), 6);

        let govern = report.pillar("GOVERN").unwrap();
        assert_eq!(govern.percent(), 52);
        assert_eq!(govern.band, ScoreBand::NeedsImprovement);
        assert_eq!(govern.answered, 3);
        assert_eq!(report.weakest_pillar().unwrap().id, "GOVERN");

        let expected = (29.0 / 56.0 * 100.0 + 500.0) / 6.0;
        assert!((report.average_score - expected).abs() < 1e-9);
        assert_eq!(report.band, ScoreBand::Resilient);
    }

    #[test]
    fn json_roundtrip_through_file() {
        let catalog = Catalog::builtin();
        let report = AssessmentReport::build(&catalog, &client(), &answer_all(&catalog, 3), None);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("report.json");
        report.save_json(&path).unwrap();

        let loaded = AssessmentReport::load_json(&path).unwrap();
        assert_eq!(loaded, report);
        assert_eq!(loaded.percent(), 75);
    }
}
