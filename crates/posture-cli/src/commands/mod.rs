//! Subcommand implementations and the helpers they share.

pub mod init;
pub mod report;
pub mod reset;
pub mod run;
pub mod status;
pub mod validate;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;

use posture_core::persistence::ProgressStore;
use posture_core::report::AssessmentReport;
use posture_core::Catalog;
use posture_report::html::write_html_report;
use posture_report::markdown::write_markdown_report;
use posture_store::FileMedium;
use posture_submit::PostureConfig;

/// The catalog named on the command line, else the configured one, else
/// the built-in catalog.
pub(crate) fn load_catalog(flag: Option<&Path>, config: &PostureConfig) -> Result<Arc<Catalog>> {
    let catalog = match flag.or(config.catalog.as_deref()) {
        Some(path) => posture_core::parser::parse_catalog(path)?,
        None => Catalog::builtin(),
    };
    Ok(Arc::new(catalog))
}

/// A progress store over the configured storage directory.
pub(crate) fn open_store(config: &PostureConfig, catalog: Arc<Catalog>) -> ProgressStore {
    let medium = Arc::new(FileMedium::new(&config.storage_dir));
    ProgressStore::new(medium, catalog).with_key(&config.storage_key)
}

/// Write `report` in each requested format and return the files written.
pub(crate) fn write_reports(
    report: &AssessmentReport,
    output: &Path,
    format: &str,
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(output)?;
    let stem = format!(
        "assessment-{}",
        report.created_at.format("%Y-%m-%dT%H%M%S")
    );

    let formats: Vec<&str> = if format == "all" {
        vec!["json", "html", "markdown"]
    } else {
        format.split(',').map(str::trim).collect()
    };

    let mut written = Vec::new();
    for fmt in &formats {
        match *fmt {
            "json" => {
                let path = output.join(format!("{stem}.json"));
                report.save_json(&path)?;
                written.push(path);
            }
            "html" => {
                let path = output.join(format!("{stem}.html"));
                write_html_report(report, &path)?;
                written.push(path);
            }
            "markdown" | "md" => {
                let path = output.join(format!("{stem}.md"));
                write_markdown_report(report, &path)?;
                written.push(path);
            }
            _ => {
                eprintln!("Unknown format: {fmt}");
            }
        }
    }
    Ok(written)
}

/// Per-pillar score table.
pub(crate) fn summary_table(report: &AssessmentReport) -> comfy_table::Table {
    use comfy_table::{Cell, Table};

    let mut table = Table::new();
    table.set_header(vec!["Pillar", "Score", "Answered", "Status"]);
    for pillar in &report.pillars {
        table.add_row(vec![
            Cell::new(&pillar.name),
            Cell::new(format!("{}%", pillar.percent())),
            Cell::new(format!("{}/{}", pillar.answered, pillar.total)),
            Cell::new(pillar.band.label()),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use posture_core::model::ClientInfo;
    use posture_core::ResponseSet;

    fn full_report(level: u8) -> AssessmentReport {
        let catalog = Catalog::builtin();
        let responses: ResponseSet = catalog
            .pillars()
            .iter()
            .flat_map(|p| p.questions.iter().map(|q| (q.id.as_str(), level)))
            .collect();
        AssessmentReport::build(&catalog, &ClientInfo::default(), &responses, None)
    }

    #[test]
    fn all_writes_every_format() {
        let dir = tempfile::tempdir().unwrap();
        let written = write_reports(&full_report(4), dir.path(), "all").unwrap();

        let extensions: Vec<_> = written
            .iter()
            .filter_map(|p| p.extension().and_then(|e| e.to_str()))
            .collect();
        assert_eq!(extensions, ["json", "html", "md"]);
        assert!(written.iter().all(|p| p.exists()));
    }

    #[test]
    fn unknown_formats_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let written = write_reports(&full_report(2), dir.path(), "json, pdf").unwrap();
        assert_eq!(written.len(), 1);
    }

    #[test]
    fn summary_lists_every_pillar() {
        let table = summary_table(&full_report(4)).to_string();
        assert!(table.contains("Governance & Strategy"));
        assert!(table.contains("Recovery & Immutability"));
        assert_eq!(table.matches("100%").count(), 6);
        assert!(table.contains("3/3"));
    }

    #[test]
    fn builtin_catalog_is_the_fallback() {
        let config = PostureConfig::default();
        let catalog = load_catalog(None, &config).unwrap();
        assert_eq!(catalog.question_count(), 18);
    }
}
