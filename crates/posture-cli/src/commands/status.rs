//! The `posture status` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use posture_core::completion::Completion;
use posture_core::persistence::StoreOutcome;
use posture_core::scoring;
use posture_submit::load_config_from;

pub fn execute(catalog: Option<PathBuf>, config: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config.as_deref())?;
    let catalog = super::load_catalog(catalog.as_deref(), &config)?;
    let store = super::open_store(&config, catalog.clone());

    let snapshot = match store.load() {
        StoreOutcome::Done(snapshot) if snapshot.has_progress() => snapshot,
        StoreOutcome::Failed(e) => {
            println!("Saved progress could not be read: {e}");
            println!("Run `posture reset` to start fresh.");
            return Ok(());
        }
        _ => {
            println!("No saved progress.");
            return Ok(());
        }
    };

    let completion = Completion::new(&catalog, &snapshot.responses);
    let scores = scoring::score(&snapshot.responses, &catalog);
    let current = snapshot.current_pillar_index;

    println!(
        "Saved progress for {} ({})",
        snapshot.client_info.company, snapshot.client_info.cloud_provider
    );
    println!(
        "  Answered: {}/{}",
        completion.answered_count(),
        catalog.question_count()
    );
    println!(
        "  Current pillar: {}/{} {}",
        current + 1,
        catalog.pillar_count(),
        catalog.pillar(current).map_or("?", |p| p.name.as_str())
    );
    println!(
        "  Saved at: {}",
        snapshot.saved_at.format("%Y-%m-%d %H:%M:%S UTC")
    );

    let mut table = Table::new();
    table.set_header(vec!["Pillar", "Answered", "Score so far"]);
    for (i, pillar) in catalog.pillars().iter().enumerate() {
        let answered = pillar.questions.len() - completion.unanswered_count(i);
        table.add_row(vec![
            Cell::new(&pillar.name),
            Cell::new(format!("{answered}/{}", pillar.questions.len())),
            Cell::new(format!("{:.0}%", scores.get(&pillar.id).unwrap_or(0.0))),
        ]);
    }
    println!("\n{table}");

    Ok(())
}
