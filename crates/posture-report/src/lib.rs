//! posture-report: Renderers for the results report.
//!
//! The JSON form lives on [`AssessmentReport`] itself; this crate adds the
//! self-contained HTML heat map and a Markdown summary, plus the pieces
//! both share.

pub mod html;
pub mod markdown;

use posture_core::report::{AssessmentReport, ScoreBand};

pub use html::{generate_html, write_html_report};
pub use markdown::{generate_markdown, write_markdown_report};

/// Number of cells in a pillar's heat bar.
pub const HEAT_CELLS: usize = 8;

/// Which heat-bar cells are lit for `score`. Cell `i` (1-based) lights once
/// the score reaches `i * 100 / HEAT_CELLS`.
pub fn heat_cells(score: f64) -> [bool; HEAT_CELLS] {
    let step = 100.0 / HEAT_CELLS as f64;
    std::array::from_fn(|i| score >= (i + 1) as f64 * step)
}

/// One follow-up action shown under the results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recommendation {
    pub title: String,
    pub description: String,
}

/// Follow-up actions for a finished assessment.
pub fn recommendations(report: &AssessmentReport) -> Vec<Recommendation> {
    let mut items = vec![
        Recommendation {
            title: "Close critical gaps".into(),
            description: format!(
                "Automate remediation in {} for organisation-wide policies (Org Policies).",
                report.client_info.cloud_provider
            ),
        },
        Recommendation {
            title: "Identity management".into(),
            description: "Enforce physical security keys for accounts holding the Owner or Super Admin role.".into(),
        },
    ];

    if let Some(weakest) = report
        .weakest_pillar()
        .filter(|p| p.band != ScoreBand::Resilient)
    {
        items.push(Recommendation {
            title: format!("Prioritise {}", weakest.name),
            description: format!(
                "At {}% this is the weakest pillar. {}",
                weakest.percent(),
                weakest.band.pillar_summary()
            ),
        });
    }

    items
}

#[cfg(test)]
pub(crate) mod fixtures {
    use posture_core::catalog::Catalog;
    use posture_core::model::{ClientInfo, CloudProvider, ResponseSet};
    use posture_core::report::AssessmentReport;

    /// GOVERN answered low, everything else at `rest`.
    pub fn report(rest: u8) -> AssessmentReport {
        let catalog = Catalog::builtin();
        let responses: ResponseSet = catalog
            .pillars()
            .iter()
            .flat_map(|p| &p.questions)
            .map(|q| {
                let value = if q.id.starts_with('G') { 1 } else { rest };
                (q.id.clone(), value)
            })
            .collect();
        let client = ClientInfo {
            name: "Ada <Lovelace>".into(),
            email: "ada@example.com".into(),
            company: "Analytical Engines".into(),
            cloud_provider: CloudProvider::Aws,
        };
        AssessmentReport::build(&catalog, &client, &responses, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heat_cells_follow_thresholds() {
        assert_eq!(heat_cells(0.0), [false; HEAT_CELLS]);
        assert_eq!(heat_cells(100.0), [true; HEAT_CELLS]);

        let half = heat_cells(50.0);
        assert_eq!(half.iter().filter(|c| **c).count(), 4);
        assert!(half[3] && !half[4]);

        // 12.5 is the first threshold exactly.
        assert!(heat_cells(12.5)[0]);
        assert!(!heat_cells(12.49)[0]);
    }

    #[test]
    fn recommendations_mention_provider_and_weakest_pillar() {
        let report = fixtures::report(4);
        let items = recommendations(&report);
        assert_eq!(items.len(), 3);
        assert!(items[0].description.contains("AWS"));
        assert!(items[2].title.contains("Governance"));
        assert!(items[2].description.contains("25%"));
    }

    #[test]
    fn resilient_assessment_gets_only_standing_recommendations() {
        let catalog = posture_core::catalog::Catalog::builtin();
        let responses = catalog
            .pillars()
            .iter()
            .flat_map(|p| &p.questions)
            .map(|q| (q.id.clone(), 4))
            .collect();
        let report = AssessmentReport::build(
            &catalog,
            &Default::default(),
            &responses,
            None,
        );
        assert_eq!(recommendations(&report).len(), 2);
    }
}
