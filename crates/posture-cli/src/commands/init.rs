//! The `posture init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    // Create posture.toml
    if std::path::Path::new("posture.toml").exists() {
        println!("posture.toml already exists, skipping.");
    } else {
        std::fs::write("posture.toml", SAMPLE_CONFIG)?;
        println!("Created posture.toml");
    }

    // Create example catalog
    std::fs::create_dir_all("catalogs")?;
    let example_path = std::path::Path::new("catalogs/example.toml");
    if example_path.exists() {
        println!("catalogs/example.toml already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_CATALOG)?;
        println!("Created catalogs/example.toml");
    }

    println!("\nNext steps:");
    println!("  1. Edit posture.toml (storage, submitter)");
    println!("  2. Run: posture validate --catalog catalogs/example.toml");
    println!("  3. Run: posture run --catalog catalogs/example.toml");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# posture configuration

# Where in-progress assessments are kept between runs.
storage_dir = ".posture"
storage_key = "assessment_progress"

# Reports written by `posture run`.
output_dir = "./posture-reports"

# Seconds to wait for a submission, 0 waits indefinitely.
submission_timeout_secs = 30

# catalog = "catalogs/example.toml"

[submitter]
type = "local"
delay_ms = 0
# outbox = "./outbox"

# [submitter]
# type = "http"
# url = "https://assessments.example.com/api/submissions"
# api_key = "${POSTURE_API_KEY}"
# timeout_secs = 30
"#;

const EXAMPLE_CATALOG: &str = r#"[catalog]
id = "example"
name = "Example Catalog"

[[levels]]
value = 1
label = "Nonexistent"
description = "Nothing in place."

[[levels]]
value = 2
label = "Initial"
description = "Ad hoc and undocumented."

[[levels]]
value = 3
label = "Defined"
description = "Documented and applied."

[[levels]]
value = 4
label = "Optimized"
description = "Measured and continuously improved."

[[pillars]]
id = "BACKUP"
name = "Backups"
icon = "database"

[[pillars.questions]]
id = "B1"
text = "Are backups taken automatically on a fixed schedule?"
weight = 3

[[pillars.questions]]
id = "B2"
text = "Are restores tested at least once a quarter?"
weight = 5

[[pillars]]
id = "ACCESS"
name = "Access Control"
icon = "key"

[[pillars.questions]]
id = "A1"
text = "Is multi-factor authentication required for administrators?"
weight = 5

[[pillars.questions]]
id = "A2"
text = "Are unused accounts disabled within 30 days?"
weight = 2
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn sample_config_parses() {
        let config: posture_submit::PostureConfig = toml::from_str(SAMPLE_CONFIG).unwrap();
        assert_eq!(config.storage_key, "assessment_progress");
        assert_eq!(config.submission_timeout_secs, 30);
    }

    #[test]
    fn example_catalog_is_valid() {
        let catalog =
            posture_core::parser::parse_catalog_str(EXAMPLE_CATALOG, Path::new("example.toml"))
                .unwrap();
        assert_eq!(catalog.pillar_count(), 2);
        assert_eq!(catalog.question_count(), 4);
        assert!(posture_core::parser::validate_catalog(&catalog).is_empty());
    }
}
