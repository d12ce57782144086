//! The `posture validate` command.

use std::path::PathBuf;

use anyhow::Result;

use posture_core::parser::{load_catalog_directory, parse_catalog, validate_catalog};
use posture_core::Catalog;

pub fn execute(catalog_path: Option<PathBuf>) -> Result<()> {
    let catalogs = match &catalog_path {
        Some(path) if path.is_dir() => load_catalog_directory(path)?,
        Some(path) => vec![parse_catalog(path)?],
        None => vec![Catalog::builtin()],
    };

    if catalogs.is_empty() {
        anyhow::bail!("no catalogs found");
    }

    let mut total_warnings = 0;

    for catalog in &catalogs {
        println!(
            "Catalog: {} ({} pillars, {} questions, levels 1-{})",
            catalog.name(),
            catalog.pillar_count(),
            catalog.question_count(),
            catalog.max_level()
        );

        let warnings = validate_catalog(catalog);
        for w in &warnings {
            let prefix = w
                .item_id
                .as_ref()
                .map(|id| format!("  [{id}]"))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} WARNING: {}", w.message);
        }
        total_warnings += warnings.len();
    }

    if total_warnings == 0 {
        println!("All catalogs valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}
