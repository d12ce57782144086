//! Weighted maturity scoring.
//!
//! A pillar score is `100 * Σ(answered value × weight) / Σ(L_max × weight)`
//! where the denominator runs over every question in the pillar, answered or
//! not. Partially answered pillars therefore never score above what the
//! same answers would give once the rest are filled in at level 1.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::model::{Pillar, ResponseSet};

/// Per-pillar scores in `[0, 100]`, keyed by pillar id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScoreMap(BTreeMap<String, f64>);

impl ScoreMap {
    pub fn get(&self, pillar_id: &str) -> Option<f64> {
        self.0.get(pillar_id).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Arithmetic mean of all scores; 0 for an empty map.
    pub fn average(&self) -> f64 {
        average_score(self)
    }
}

impl FromIterator<(String, f64)> for ScoreMap {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Score a single pillar against the maturity ceiling `max_level`.
pub fn pillar_score(pillar: &Pillar, responses: &ResponseSet, max_level: u8) -> f64 {
    let mut raw = 0u64;
    let mut answered = 0usize;
    for question in &pillar.questions {
        if let Some(value) = responses.get(&question.id) {
            raw += u64::from(value) * u64::from(question.weight);
            answered += 1;
        }
    }
    if answered == 0 {
        return 0.0;
    }

    let max = u64::from(max_level) * pillar.total_weight();
    if max == 0 {
        return 0.0;
    }
    100.0 * raw as f64 / max as f64
}

/// Score every pillar of the catalog.
pub fn score(responses: &ResponseSet, catalog: &Catalog) -> ScoreMap {
    let max_level = catalog.max_level();
    catalog
        .pillars()
        .iter()
        .map(|p| (p.id.clone(), pillar_score(p, responses, max_level)))
        .collect()
}

/// Mean of the pillar scores, unrounded.
pub fn average_score(scores: &ScoreMap) -> f64 {
    if scores.is_empty() {
        return 0.0;
    }
    scores.0.values().sum::<f64>() / scores.len() as f64
}
