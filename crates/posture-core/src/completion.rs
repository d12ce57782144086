//! Completeness predicates over a response set.
//!
//! Everything is recomputed from the borrowed responses on each call, so a
//! `Completion` can never disagree with the state it was built from.

use crate::catalog::Catalog;
use crate::model::ResponseSet;

/// Read-only completeness view over `(catalog, responses)`.
#[derive(Debug, Clone, Copy)]
pub struct Completion<'a> {
    catalog: &'a Catalog,
    responses: &'a ResponseSet,
}

impl<'a> Completion<'a> {
    pub fn new(catalog: &'a Catalog, responses: &'a ResponseSet) -> Self {
        Self { catalog, responses }
    }

    /// Questions of pillar `index` without an answer. 0 for an unknown index.
    pub fn unanswered_count(&self, index: usize) -> usize {
        self.catalog
            .pillar(index)
            .map(|p| {
                p.questions
                    .iter()
                    .filter(|q| !self.responses.contains(&q.id))
                    .count()
            })
            .unwrap_or(0)
    }

    /// `true` iff every question of pillar `index` is answered.
    /// An unknown index is never complete.
    pub fn is_pillar_complete(&self, index: usize) -> bool {
        index < self.catalog.pillar_count() && self.unanswered_count(index) == 0
    }

    pub fn is_assessment_complete(&self) -> bool {
        (0..self.catalog.pillar_count()).all(|i| self.is_pillar_complete(i))
    }

    pub fn total_unanswered(&self) -> usize {
        (0..self.catalog.pillar_count())
            .map(|i| self.unanswered_count(i))
            .sum()
    }

    /// Number of catalog questions that have an answer.
    pub fn answered_count(&self) -> usize {
        self.catalog.question_count() - self.total_unanswered()
    }

    /// Index of the first pillar with an unanswered question.
    pub fn first_incomplete_pillar(&self) -> Option<usize> {
        (0..self.catalog.pillar_count()).find(|&i| !self.is_pillar_complete(i))
    }
}
