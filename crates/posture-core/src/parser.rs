//! TOML catalog parser.
//!
//! Loads question catalogs from TOML files and directories, and lints them.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::catalog::Catalog;
use crate::error::CatalogError;
use crate::model::{MaturityLevel, Pillar, Question};

/// Intermediate TOML structure for parsing catalog files.
#[derive(Debug, Deserialize)]
struct TomlCatalogFile {
    catalog: TomlCatalogHeader,
    #[serde(default)]
    levels: Vec<TomlLevel>,
    #[serde(default)]
    pillars: Vec<TomlPillar>,
}

#[derive(Debug, Deserialize)]
struct TomlCatalogHeader {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct TomlLevel {
    value: u8,
    label: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct TomlPillar {
    id: String,
    name: String,
    #[serde(default = "default_icon")]
    icon: String,
    #[serde(default)]
    questions: Vec<TomlQuestion>,
}

fn default_icon() -> String {
    "shield".to_string()
}

#[derive(Debug, Deserialize)]
struct TomlQuestion {
    id: String,
    text: String,
    /// Signed so that negative weights reach validation instead of failing
    /// as a type error.
    #[serde(default = "default_weight")]
    weight: i64,
}

fn default_weight() -> i64 {
    1
}

/// Parse a single TOML file into a `Catalog`.
pub fn parse_catalog(path: &Path) -> Result<Catalog> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read catalog file: {}", path.display()))?;

    parse_catalog_str(&content, path)
}

/// Parse a TOML string into a `Catalog` (useful for testing).
pub fn parse_catalog_str(content: &str, source_path: &Path) -> Result<Catalog> {
    let parsed: TomlCatalogFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let levels = parsed
        .levels
        .into_iter()
        .map(|l| MaturityLevel {
            value: l.value,
            label: l.label,
            description: l.description,
        })
        .collect();

    let pillars = parsed
        .pillars
        .into_iter()
        .map(|p| {
            let questions = p
                .questions
                .into_iter()
                .map(|q| {
                    let weight = u32::try_from(q.weight)
                        .ok()
                        .filter(|w| *w > 0)
                        .ok_or_else(|| CatalogError::InvalidWeight {
                            question: q.id.clone(),
                            weight: q.weight,
                        })?;
                    Ok(Question {
                        id: q.id,
                        text: q.text,
                        weight,
                    })
                })
                .collect::<Result<Vec<_>, CatalogError>>()?;

            Ok(Pillar {
                id: p.id,
                name: p.name,
                icon: p.icon,
                questions,
            })
        })
        .collect::<Result<Vec<_>, CatalogError>>()
        .with_context(|| format!("invalid catalog: {}", source_path.display()))?;

    let catalog = Catalog::new(parsed.catalog.id, parsed.catalog.name, pillars, levels)
        .with_context(|| format!("invalid catalog: {}", source_path.display()))?;

    tracing::debug!(
        catalog = catalog.id(),
        pillars = catalog.pillar_count(),
        questions = catalog.question_count(),
        "catalog parsed"
    );
    Ok(catalog)
}

/// Recursively load all `.toml` catalog files from a directory.
pub fn load_catalog_directory(dir: &Path) -> Result<Vec<Catalog>> {
    let mut catalogs = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
    {
        let entry = entry?;
        let path = entry.path();

        if path.is_dir() {
            catalogs.extend(load_catalog_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_catalog(&path) {
                Ok(catalog) => catalogs.push(catalog),
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", path.display(), e);
                }
            }
        }
    }

    Ok(catalogs)
}

/// A warning from catalog linting.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The pillar or question ID (if applicable).
    pub item_id: Option<String>,
    /// Warning message.
    pub message: String,
}

/// Lint a structurally valid catalog for things that are legal but suspect.
pub fn validate_catalog(catalog: &Catalog) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    for pillar in catalog.pillars() {
        if pillar.name.trim().is_empty() {
            warnings.push(ValidationWarning {
                item_id: Some(pillar.id.clone()),
                message: "pillar name is empty".into(),
            });
        }
        for question in &pillar.questions {
            if question.text.trim().is_empty() {
                warnings.push(ValidationWarning {
                    item_id: Some(question.id.clone()),
                    message: "question text is empty".into(),
                });
            }
        }
    }

    // Repeated text usually means a copy-paste slip.
    let mut seen_text = HashSet::new();
    for question in catalog.pillars().iter().flat_map(|p| &p.questions) {
        let text = question.text.trim().to_lowercase();
        if !text.is_empty() && !seen_text.insert(text) {
            warnings.push(ValidationWarning {
                item_id: Some(question.id.clone()),
                message: "question text repeats an earlier question".into(),
            });
        }
    }

    for level in catalog.levels() {
        if level.label.trim().is_empty() {
            warnings.push(ValidationWarning {
                item_id: None,
                message: format!("maturity level {} has no label", level.value),
            });
        }
    }

    if catalog.levels().len() < 2 {
        warnings.push(ValidationWarning {
            item_id: None,
            message: "a single maturity level cannot discriminate between answers".into(),
        });
    }

    warnings
}
