//! posture configuration and submitter factory.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use posture_core::persistence::DEFAULT_STORAGE_KEY;
use posture_core::traits::Submitter;

use crate::http::HttpSubmitter;
use crate::local::LocalSubmitter;

/// Where finished assessments are sent.
///
/// Note: Custom Debug impl masks API keys to prevent accidental exposure in logs.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SubmitterConfig {
    Local {
        /// Simulated processing time before accepting.
        #[serde(default)]
        delay_ms: u64,
        /// Directory accepted submissions are copied to.
        #[serde(default)]
        outbox: Option<PathBuf>,
    },
    Http {
        url: String,
        #[serde(default)]
        api_key: Option<String>,
        #[serde(default = "default_http_timeout")]
        timeout_secs: u64,
    },
}

impl Default for SubmitterConfig {
    fn default() -> Self {
        SubmitterConfig::Local {
            delay_ms: 0,
            outbox: None,
        }
    }
}

impl std::fmt::Debug for SubmitterConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubmitterConfig::Local { delay_ms, outbox } => f
                .debug_struct("Local")
                .field("delay_ms", delay_ms)
                .field("outbox", outbox)
                .finish(),
            SubmitterConfig::Http {
                url,
                api_key,
                timeout_secs,
            } => f
                .debug_struct("Http")
                .field("url", url)
                .field("api_key", &api_key.as_ref().map(|_| "***"))
                .field("timeout_secs", timeout_secs)
                .finish(),
        }
    }
}

fn default_http_timeout() -> u64 {
    30
}

/// Top-level posture configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostureConfig {
    /// Directory holding the progress snapshot.
    #[serde(default = "default_storage_dir")]
    pub storage_dir: PathBuf,
    /// Key (file stem) the snapshot is stored under.
    #[serde(default = "default_storage_key")]
    pub storage_key: String,
    /// Catalog file to use instead of the built-in one.
    #[serde(default)]
    pub catalog: Option<PathBuf>,
    /// Output directory for reports.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Upper bound on one submission attempt, 0 disables it.
    #[serde(default = "default_submission_timeout")]
    pub submission_timeout_secs: u64,
    #[serde(default)]
    pub submitter: SubmitterConfig,
}

fn default_storage_dir() -> PathBuf {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".local").join("state").join("posture"))
        .unwrap_or_else(|| PathBuf::from(".posture"))
}
fn default_storage_key() -> String {
    DEFAULT_STORAGE_KEY.to_string()
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("./posture-reports")
}
fn default_submission_timeout() -> u64 {
    30
}

impl Default for PostureConfig {
    fn default() -> Self {
        Self {
            storage_dir: default_storage_dir(),
            storage_key: default_storage_key(),
            catalog: None,
            output_dir: default_output_dir(),
            submission_timeout_secs: default_submission_timeout(),
            submitter: SubmitterConfig::default(),
        }
    }
}

impl PostureConfig {
    /// The wizard-level submission timeout, `None` when disabled.
    pub fn submission_timeout(&self) -> Option<Duration> {
        (self.submission_timeout_secs > 0).then(|| Duration::from_secs(self.submission_timeout_secs))
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_name = &result[start + 2..start + end];
            let value = std::env::var(var_name).unwrap_or_default();
            result = format!(
                "{}{}{}",
                &result[..start],
                value,
                &result[start + end + 1..]
            );
        } else {
            break;
        }
    }
    result
}

fn resolve_path(path: &Path) -> PathBuf {
    PathBuf::from(resolve_env_vars(&path.to_string_lossy()))
}

/// Resolve env vars in every string-valued setting.
fn resolve_config(config: PostureConfig) -> PostureConfig {
    let submitter = match config.submitter {
        SubmitterConfig::Local { delay_ms, outbox } => SubmitterConfig::Local {
            delay_ms,
            outbox: outbox.as_deref().map(resolve_path),
        },
        SubmitterConfig::Http {
            url,
            api_key,
            timeout_secs,
        } => SubmitterConfig::Http {
            url: resolve_env_vars(&url),
            api_key: api_key
                .as_deref()
                .map(resolve_env_vars)
                .filter(|k| !k.is_empty()),
            timeout_secs,
        },
    };
    PostureConfig {
        storage_dir: resolve_path(&config.storage_dir),
        storage_key: resolve_env_vars(&config.storage_key),
        catalog: config.catalog.as_deref().map(resolve_path),
        output_dir: resolve_path(&config.output_dir),
        submission_timeout_secs: config.submission_timeout_secs,
        submitter,
    }
}

/// Apply `POSTURE_*` overrides looked up through `var`.
fn apply_env_overrides(config: &mut PostureConfig, var: impl Fn(&str) -> Option<String>) {
    if let Some(dir) = var("POSTURE_STORAGE_DIR").filter(|d| !d.is_empty()) {
        config.storage_dir = PathBuf::from(dir);
    }

    if let Some(url) = var("POSTURE_SUBMIT_URL").filter(|u| !u.is_empty()) {
        match &mut config.submitter {
            SubmitterConfig::Http { url: current, .. } => *current = url,
            SubmitterConfig::Local { .. } => {
                config.submitter = SubmitterConfig::Http {
                    url,
                    api_key: None,
                    timeout_secs: default_http_timeout(),
                };
            }
        }
    }

    if let Some(key) = var("POSTURE_API_KEY").filter(|k| !k.is_empty()) {
        if let SubmitterConfig::Http { api_key, .. } = &mut config.submitter {
            *api_key = Some(key);
        }
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `posture.toml` in the current directory
/// 2. `~/.config/posture/config.toml`
///
/// Environment variable overrides: `POSTURE_STORAGE_DIR`, `POSTURE_SUBMIT_URL`,
/// `POSTURE_API_KEY`.
pub fn load_config() -> Result<PostureConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<PostureConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("posture.toml");
        if local.exists() {
            Some(local)
        } else if let Some(home) = dirs_path() {
            let global = home.join("config.toml");
            if global.exists() {
                Some(global)
            } else {
                None
            }
        } else {
            None
        }
    };

    let mut config = match &config_path {
        Some(path) => parse_config_file(path)?,
        None => PostureConfig::default(),
    };

    apply_env_overrides(&mut config, |name| std::env::var(name).ok());
    let config = resolve_config(config);

    tracing::debug!(
        source = %config_path.as_deref().map(|p| p.display().to_string()).unwrap_or_else(|| "defaults".into()),
        ?config,
        "configuration loaded"
    );
    Ok(config)
}

fn parse_config_file(path: &Path) -> Result<PostureConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config: {}", path.display()))?;
    toml::from_str::<PostureConfig>(&content)
        .with_context(|| format!("failed to parse config: {}", path.display()))
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("posture"))
}

/// Create a submitter instance from its configuration.
pub fn create_submitter(config: &SubmitterConfig) -> Result<Box<dyn Submitter>> {
    match config {
        SubmitterConfig::Local { delay_ms, outbox } => {
            let mut submitter = LocalSubmitter::new().with_delay(Duration::from_millis(*delay_ms));
            if let Some(dir) = outbox {
                submitter = submitter.with_outbox(dir);
            }
            Ok(Box::new(submitter))
        }
        SubmitterConfig::Http {
            url,
            api_key,
            timeout_secs,
        } => {
            let timeout = (*timeout_secs > 0).then(|| Duration::from_secs(*timeout_secs));
            Ok(Box::new(HttpSubmitter::new(url, api_key.clone(), timeout)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn resolve_env_vars_basic() {
        std::env::set_var("_POSTURE_TEST_VAR", "hello");
        assert_eq!(resolve_env_vars("${_POSTURE_TEST_VAR}"), "hello");
        assert_eq!(
            resolve_env_vars("prefix_${_POSTURE_TEST_VAR}_suffix"),
            "prefix_hello_suffix"
        );
        assert_eq!(resolve_env_vars("${_POSTURE_UNSET_VAR}x"), "x");
        assert_eq!(resolve_env_vars("no ${closing"), "no ${closing");
        std::env::remove_var("_POSTURE_TEST_VAR");
    }

    #[test]
    fn default_config() {
        let config = PostureConfig::default();
        assert_eq!(config.storage_key, "assessment_progress");
        assert_eq!(config.submission_timeout(), Some(Duration::from_secs(30)));
        assert!(config.catalog.is_none());
        assert!(matches!(
            config.submitter,
            SubmitterConfig::Local { delay_ms: 0, .. }
        ));
    }

    #[test]
    fn parse_full_config() {
        let toml_str = r#"
storage_dir = "/var/lib/posture"
storage_key = "team_a"
catalog = "catalogs/custom.toml"
output_dir = "out"
submission_timeout_secs = 0

[submitter]
type = "http"
url = "https://intake.example.com/assessments"
api_key = "sk-test"
"#;
        let config: PostureConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.storage_dir, PathBuf::from("/var/lib/posture"));
        assert_eq!(config.storage_key, "team_a");
        assert_eq!(config.submission_timeout(), None);
        match &config.submitter {
            SubmitterConfig::Http {
                url, timeout_secs, ..
            } => {
                assert_eq!(url, "https://intake.example.com/assessments");
                assert_eq!(*timeout_secs, 30);
            }
            other => panic!("unexpected submitter: {other:?}"),
        }
    }

    #[test]
    fn unknown_submitter_type_is_an_error() {
        let toml_str = "[submitter]\ntype = \"carrier-pigeon\"\n";
        assert!(toml::from_str::<PostureConfig>(toml_str).is_err());
    }

    #[test]
    fn env_overrides_switch_to_http() {
        let mut config = PostureConfig::default();
        apply_env_overrides(
            &mut config,
            env(&[
                ("POSTURE_STORAGE_DIR", "/tmp/state"),
                ("POSTURE_SUBMIT_URL", "http://localhost:8080/in"),
                ("POSTURE_API_KEY", "sk-env"),
            ]),
        );
        assert_eq!(config.storage_dir, PathBuf::from("/tmp/state"));
        assert_eq!(
            config.submitter,
            SubmitterConfig::Http {
                url: "http://localhost:8080/in".into(),
                api_key: Some("sk-env".into()),
                timeout_secs: 30,
            }
        );
    }

    #[test]
    fn api_key_alone_does_not_change_local_submitter() {
        let mut config = PostureConfig::default();
        apply_env_overrides(&mut config, env(&[("POSTURE_API_KEY", "sk-env")]));
        assert_eq!(config.submitter, SubmitterConfig::default());
    }

    #[test]
    fn resolve_config_expands_references() {
        std::env::set_var("_POSTURE_TEST_KEY", "sk-from-env");
        let config = resolve_config(PostureConfig {
            submitter: SubmitterConfig::Http {
                url: "http://localhost/in".into(),
                api_key: Some("${_POSTURE_TEST_KEY}".into()),
                timeout_secs: 5,
            },
            ..PostureConfig::default()
        });
        std::env::remove_var("_POSTURE_TEST_KEY");
        assert!(matches!(
            config.submitter,
            SubmitterConfig::Http { api_key: Some(ref k), .. } if k == "sk-from-env"
        ));
    }

    #[test]
    fn debug_output_masks_api_key() {
        let config = SubmitterConfig::Http {
            url: "http://localhost/in".into(),
            api_key: Some("sk-very-secret".into()),
            timeout_secs: 5,
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-very-secret"));
        assert!(debug.contains("***"));
    }

    #[test]
    fn load_from_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("posture.toml");
        std::fs::write(&path, "storage_key = \"from_file\"\n").unwrap();

        let config = load_config_from(Some(&path)).unwrap();
        assert_eq!(config.storage_key, "from_file");
        assert!(load_config_from(Some(&dir.path().join("missing.toml"))).is_err());
    }

    #[test]
    fn factory_builds_each_submitter() {
        let local = create_submitter(&SubmitterConfig::default()).unwrap();
        assert_eq!(local.name(), "local");

        let http = create_submitter(&SubmitterConfig::Http {
            url: "http://localhost/in".into(),
            api_key: None,
            timeout_secs: 0,
        })
        .unwrap();
        assert_eq!(http.name(), "http");
    }
}
