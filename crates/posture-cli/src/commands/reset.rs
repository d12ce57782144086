//! The `posture reset` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use posture_core::traits::SnapshotMedium;
use posture_store::FileMedium;
use posture_submit::load_config_from;

pub fn execute(config: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config.as_deref())?;
    let medium = FileMedium::new(&config.storage_dir);

    let existed = medium.path_for(&config.storage_key)?.exists();
    medium
        .remove(&config.storage_key)
        .context("could not clear saved progress")?;

    if existed {
        println!("Saved progress cleared.");
    } else {
        println!("No saved progress to clear.");
    }
    Ok(())
}
