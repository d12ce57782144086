//! Markdown summary, suitable for tickets and chat.

use std::path::Path;

use anyhow::{Context, Result};

use posture_core::report::AssessmentReport;

use crate::{heat_cells, recommendations};

/// Table cells must not break the row.
fn md_escape(s: &str) -> String {
    s.replace('|', "\\|").replace('\n', " ")
}

fn heat_bar(score: f64) -> String {
    heat_cells(score)
        .iter()
        .map(|lit| if *lit { '█' } else { '░' })
        .collect()
}

/// Generate a Markdown summary from an assessment report.
pub fn generate_markdown(report: &AssessmentReport) -> String {
    let mut md = String::new();

    md.push_str(&format!(
        "# Cybersecurity posture: {}\n\n",
        md_escape(&report.client_info.company)
    ));
    md.push_str(&format!(
        "**Overall score: {}%** ({})  \n",
        report.percent(),
        report.band.label()
    ));
    md.push_str(&format!(
        "Catalog: {} | Cloud: {} | {}\n\n",
        md_escape(&report.catalog.name),
        report.client_info.cloud_provider.label(),
        report.created_at.format("%Y-%m-%d %H:%M UTC")
    ));

    md.push_str("| Pillar | Score | Heat | Status |\n");
    md.push_str("|--------|------:|------|--------|\n");
    for pillar in &report.pillars {
        md.push_str(&format!(
            "| {} | {}% | `{}` | {} |\n",
            md_escape(&pillar.name),
            pillar.percent(),
            heat_bar(pillar.score),
            pillar.band.label()
        ));
    }

    md.push_str("\n## Recommendations\n\n");
    for (i, item) in recommendations(report).iter().enumerate() {
        md.push_str(&format!(
            "{}. **{}:** {}\n",
            i + 1,
            item.title,
            item.description
        ));
    }

    if let Some(receipt) = &report.receipt {
        md.push_str(&format!(
            "\n_Submitted via {}{}._\n",
            receipt.submitter,
            receipt
                .reference
                .as_deref()
                .map(|r| format!(", reference `{r}`"))
                .unwrap_or_default()
        ));
    }

    md
}

/// Write a Markdown report to a file.
pub fn write_markdown_report(report: &AssessmentReport, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, generate_markdown(report))
        .with_context(|| format!("failed to write Markdown report to {}", path.display()))?;
    Ok(())
}
