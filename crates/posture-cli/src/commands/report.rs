//! The `posture report` command.

use std::path::{Path, PathBuf};

use anyhow::Result;

use posture_core::report::AssessmentReport;

pub fn execute(input: PathBuf, output: Option<PathBuf>, format: String) -> Result<()> {
    let report = AssessmentReport::load_json(&input)?;
    let output = output.unwrap_or_else(|| {
        input
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."))
            .to_path_buf()
    });

    println!(
        "{} ({}): {}% overall, {}",
        report.client_info.company,
        report.catalog.name,
        report.percent(),
        report.band.label()
    );
    println!("{}", super::summary_table(&report));

    for path in super::write_reports(&report, &output, &format)? {
        println!("Written: {}", path.display());
    }
    Ok(())
}
