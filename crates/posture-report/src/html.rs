//! HTML report generator.
//!
//! Produces a self-contained HTML heat map with all CSS inlined.

use anyhow::{Context, Result};
use std::path::Path;

use posture_core::report::AssessmentReport;

use crate::{heat_cells, recommendations};

/// Escape a string for safe HTML insertion.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Generate an HTML report from an assessment report.
pub fn generate_html(report: &AssessmentReport) -> String {
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str(&format!(
        "<title>posture report: {}</title>\n",
        html_escape(&report.client_info.company)
    ));
    html.push_str("<style>\n");
    html.push_str(CSS);
    html.push_str("</style>\n");
    html.push_str("</head>\n<body>\n");

    // Header with the overall score
    html.push_str("<header>\n<div>\n");
    html.push_str("<span class=\"tag\">Executive report</span>\n");
    html.push_str("<h1>Cybersecurity posture</h1>\n");
    html.push_str(&format!(
        "<p class=\"meta\">Maturity analysis for <strong>{}</strong> | {} | {}</p>\n",
        html_escape(&report.client_info.company),
        html_escape(report.client_info.cloud_provider.label()),
        report.created_at.format("%Y-%m-%d %H:%M UTC")
    ));
    if !report.client_info.name.is_empty() {
        let contact = if report.client_info.email.is_empty() {
            html_escape(&report.client_info.name)
        } else {
            format!(
                "{} &lt;{}&gt;",
                html_escape(&report.client_info.name),
                html_escape(&report.client_info.email)
            )
        };
        html.push_str(&format!("<p class=\"meta\">Contact: {contact}</p>\n"));
    }
    html.push_str("</div>\n");
    html.push_str(&format!(
        "<div class=\"overall\"><div class=\"badge big\" style=\"background:{}\">{}%</div><div><div class=\"label\">Overall score</div><div class=\"band\">{}</div></div></div>\n",
        report.band.color(),
        report.percent(),
        report.band.label()
    ));
    html.push_str("</header>\n");

    // Heat map
    html.push_str("<section>\n");
    html.push_str(&format!(
        "<h2>Maturity heat map ({})</h2>\n",
        html_escape(&report.catalog.name)
    ));
    html.push_str("<div class=\"grid\">\n");
    for pillar in &report.pillars {
        html.push_str(&format!(
            "<article class=\"pillar\" id=\"pillar-{}\">\n",
            html_escape(&pillar.id)
        ));
        html.push_str(&format!(
            "<div class=\"pillar-head\"><span class=\"icon\">{}</span><span class=\"badge\" style=\"background:{}\">{}%</span></div>\n",
            html_escape(&pillar.icon),
            pillar.band.color(),
            pillar.percent()
        ));
        html.push_str(&format!("<h3>{}</h3>\n", html_escape(&pillar.name)));

        html.push_str("<div class=\"heat\">");
        for (i, lit) in heat_cells(pillar.score).iter().enumerate() {
            let height = 20 + (i + 1) * 10;
            if *lit {
                html.push_str(&format!(
                    "<span class=\"cell\" style=\"height:{height}%;background:{}\"></span>",
                    pillar.band.color()
                ));
            } else {
                html.push_str(&format!(
                    "<span class=\"cell off\" style=\"height:{height}%\"></span>"
                ));
            }
        }
        html.push_str("</div>\n");
        html.push_str(&format!(
            "<p class=\"summary\">{}</p>\n",
            pillar.band.pillar_summary()
        ));
        html.push_str("</article>\n");
    }
    html.push_str("</div>\n</section>\n");

    // Recommendations
    html.push_str("<section class=\"recommendations\">\n<h2>Recommendations</h2>\n<ol>\n");
    for item in recommendations(report) {
        html.push_str(&format!(
            "<li><strong>{}:</strong> {}</li>\n",
            html_escape(&item.title),
            html_escape(&item.description)
        ));
    }
    html.push_str("</ol>\n</section>\n");

    if let Some(receipt) = &report.receipt {
        html.push_str(&format!(
            "<p class=\"meta\">Submitted via {} at {}{}</p>\n",
            html_escape(&receipt.submitter),
            receipt.accepted_at.format("%Y-%m-%d %H:%M UTC"),
            receipt
                .reference
                .as_deref()
                .map(|r| format!(" (reference {})", html_escape(r)))
                .unwrap_or_default()
        ));
    }

    // Raw JSON
    html.push_str("<section class=\"raw-data\">\n");
    html.push_str("<details>\n<summary>Raw JSON Data</summary>\n");
    html.push_str("<pre><code>");
    html.push_str(&html_escape(
        &serde_json::to_string_pretty(report).unwrap_or_default(),
    ));
    html.push_str("</code></pre>\n");
    html.push_str("</details>\n</section>\n");

    html.push_str("</body>\n</html>");
    html
}

/// Write an HTML report to a file.
pub fn write_html_report(report: &AssessmentReport, path: &Path) -> Result<()> {
    let html = generate_html(report);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, html)
        .with_context(|| format!("failed to write HTML report to {}", path.display()))?;
    Ok(())
}

const CSS: &str = r#"
:root { --bg: #fff; --fg: #0f172a; --muted: #64748b; --card: #f8fafc; --border: #e2e8f0; --off: #e2e8f0; }
@media (prefers-color-scheme: dark) {
  :root { --bg: #0f172a; --fg: #f8fafc; --muted: #94a3b8; --card: #1e293b; --border: #334155; --off: #334155; }
}
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif; margin: 0; padding: 2rem; background: var(--bg); color: var(--fg); }
header { display: flex; flex-wrap: wrap; justify-content: space-between; align-items: center; gap: 2rem; }
h1, h2 { margin-top: 2rem; }
.tag { background: #dbeafe; color: #1d4ed8; padding: 0.25rem 1rem; border-radius: 999px; font-size: 0.75rem; font-weight: 800; text-transform: uppercase; }
.meta { color: var(--muted); }
.overall { display: flex; align-items: center; gap: 1.5rem; background: var(--card); padding: 1.5rem; border-radius: 1.5rem; border: 1px solid var(--border); }
.overall .label { font-size: 0.75rem; font-weight: 800; color: var(--muted); text-transform: uppercase; }
.overall .band { font-size: 1.25rem; font-weight: 800; }
.badge { color: #fff; font-weight: 800; font-size: 0.75rem; padding: 0.3rem 0.75rem; border-radius: 999px; }
.badge.big { font-size: 2.5rem; width: 6rem; height: 6rem; display: flex; align-items: center; justify-content: center; border-radius: 2rem; }
.grid { display: grid; grid-template-columns: repeat(auto-fill, minmax(260px, 1fr)); gap: 1.5rem; }
.pillar { background: var(--card); border: 1px solid var(--border); border-radius: 1.5rem; padding: 1.5rem; }
.pillar-head { display: flex; justify-content: space-between; align-items: center; }
.icon { font-size: 0.75rem; color: var(--muted); text-transform: uppercase; }
.heat { display: flex; align-items: flex-end; gap: 0.35rem; height: 3rem; margin: 1rem 0; }
.cell { flex: 1; border-radius: 0.3rem; }
.cell.off { background: var(--off); opacity: 0.4; }
.summary { font-size: 0.8rem; color: var(--muted); }
.recommendations { background: #0f172a; color: #e2e8f0; border-radius: 1.5rem; padding: 1.5rem 2rem; margin-top: 2rem; }
.recommendations h2 { color: #34d399; margin-top: 0; }
pre { overflow-x: auto; padding: 1rem; background: var(--card); border-radius: 8px; }
code { font-family: 'JetBrains Mono', 'Fira Code', monospace; font-size: 0.85rem; }
details { margin: 1rem 0; }
summary { cursor: pointer; font-weight: bold; }
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use posture_core::traits::SubmissionReceipt;

    #[test]
    fn html_report_contains_required_elements() {
        let report = fixtures::report(3);
        let html = generate_html(&report);

        assert!(html.contains("<html"));
        assert!(html.contains("</html>"));
        assert!(html.contains("Analytical Engines"));
        assert!(html.contains("Amazon Web Services (AWS)"));
        for pillar in &report.pillars {
            assert!(html.contains(&format!("id=\"pillar-{}\"", pillar.id)));
        }
        assert!(html.contains(&format!("{}%", report.percent())));
        assert!(html.contains("Automate remediation in AWS"));
    }

    #[test]
    fn heat_bar_lights_cells_by_score() {
        let report = fixtures::report(4);
        let html = generate_html(&report);

        // Five pillars at 100% light all 8 cells, GOVERN at 25% lights 2.
        assert_eq!(html.matches("class=\"cell\"").count(), 5 * 8 + 2);
        assert_eq!(html.matches("class=\"cell off\"").count(), 6);
    }

    #[test]
    fn user_text_is_escaped() {
        let report = fixtures::report(2);
        let html = generate_html(&report);
        assert!(html.contains("Ada &lt;Lovelace&gt;"));
        assert!(!html.contains("Ada <Lovelace>"));
    }

    #[test]
    fn receipt_is_shown_when_present() {
        let mut report = fixtures::report(3);
        report.receipt = Some(SubmissionReceipt {
            submitter: "http".into(),
            reference: Some("asm-7".into()),
            accepted_at: chrono::Utc::now(),
        });
        let html = generate_html(&report);
        assert!(html.contains("Submitted via http"));
        assert!(html.contains("reference asm-7"));
    }

    #[test]
    fn html_report_write_to_file() {
        let report = fixtures::report(3);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("report.html");

        write_html_report(&report, &path).unwrap();
        assert!(path.exists());

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("<html"));
    }
}
