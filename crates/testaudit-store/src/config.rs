//! Configuration loading.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use testaudit_core::engine::ValidityEngineConfig;
use testaudit_core::report::DEFAULT_TREND_TOLERANCE;

/// Top-level testaudit configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestauditConfig {
    /// Directory holding `sessions.json`, `questions.json` and `assessments.json`.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Max sessions analyzed concurrently.
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,
    /// Default report period in days.
    #[serde(default = "default_report_days")]
    pub report_days: u32,
    /// Flagged-rate difference below which a trend is stable.
    #[serde(default = "default_trend_tolerance")]
    pub trend_tolerance: f64,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./testaudit-data")
}
fn default_parallelism() -> usize {
    4
}
fn default_report_days() -> u32 {
    30
}
fn default_trend_tolerance() -> f64 {
    DEFAULT_TREND_TOLERANCE
}

impl Default for TestauditConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            parallelism: default_parallelism(),
            report_days: default_report_days(),
            trend_tolerance: default_trend_tolerance(),
        }
    }
}

impl TestauditConfig {
    /// Engine settings derived from this configuration.
    pub fn engine_config(&self) -> ValidityEngineConfig {
        ValidityEngineConfig {
            parallelism: self.parallelism.max(1),
            trend_tolerance: self.trend_tolerance,
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    let mut pos = 0;
    while let Some(offset) = result[pos..].find("${") {
        let start = pos + offset;
        let Some(len) = result[start..].find('}') else {
            break;
        };
        let value = std::env::var(&result[start + 2..start + len]).unwrap_or_default();
        result.replace_range(start..start + len + 1, &value);
        // substituted text is not expanded again
        pos = start + value.len();
    }
    result
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `testaudit.toml` in the current directory
/// 2. `~/.config/testaudit/config.toml`
///
/// Environment variable overrides: `TESTAUDIT_DATA_DIR`, `TESTAUDIT_PARALLELISM`.
pub fn load_config() -> Result<TestauditConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<TestauditConfig> {
    let config_path = match path {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        Some(p) => anyhow::bail!("config file not found: {}", p.display()),
        None => {
            let local = PathBuf::from("testaudit.toml");
            if local.exists() {
                Some(local)
            } else {
                dirs_path()
                    .map(|dir| dir.join("config.toml"))
                    .filter(|global| global.exists())
            }
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            let config = toml::from_str::<TestauditConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?;
            tracing::debug!("loaded config from {}", path.display());
            config
        }
        None => TestauditConfig::default(),
    };

    if let Ok(dir) = std::env::var("TESTAUDIT_DATA_DIR") {
        config.data_dir = PathBuf::from(dir);
    }
    if let Ok(value) = std::env::var("TESTAUDIT_PARALLELISM") {
        config.parallelism = value
            .parse()
            .with_context(|| format!("invalid TESTAUDIT_PARALLELISM: {value}"))?;
    }

    config.data_dir = PathBuf::from(resolve_env_vars(&config.data_dir.to_string_lossy()));

    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("testaudit"))
}

/// Sample configuration written by `testaudit init`.
pub fn sample_config_toml(data_dir: &Path) -> String {
    format!(
        r#"# testaudit configuration

# Directory holding sessions.json, questions.json and assessments.json
data_dir = "{}"

# Sessions analyzed concurrently by `testaudit analyze --all`
parallelism = 4

# Default period for `testaudit report`
report_days = 30

# Flagged-rate difference (7d vs 30d) treated as a stable trend
trend_tolerance = 0.05
"#,
        data_dir.display()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_env_vars_basic() {
        std::env::set_var("_TESTAUDIT_TEST_VAR", "hello");
        assert_eq!(resolve_env_vars("${_TESTAUDIT_TEST_VAR}"), "hello");
        assert_eq!(
            resolve_env_vars("prefix_${_TESTAUDIT_TEST_VAR}_suffix"),
            "prefix_hello_suffix"
        );
        assert_eq!(resolve_env_vars("${unterminated"), "${unterminated");
        std::env::remove_var("_TESTAUDIT_TEST_VAR");
    }

    #[test]
    fn resolve_env_vars_does_not_expand_values() {
        std::env::set_var("_TESTAUDIT_NESTED_VAR", "${_TESTAUDIT_NESTED_VAR}");
        std::env::set_var("_TESTAUDIT_OTHER_VAR", "x");
        assert_eq!(
            resolve_env_vars("${_TESTAUDIT_NESTED_VAR}/${_TESTAUDIT_OTHER_VAR}"),
            "${_TESTAUDIT_NESTED_VAR}/x"
        );
        std::env::remove_var("_TESTAUDIT_NESTED_VAR");
        std::env::remove_var("_TESTAUDIT_OTHER_VAR");
    }

    #[test]
    fn default_config() {
        let config = TestauditConfig::default();
        assert_eq!(config.parallelism, 4);
        assert_eq!(config.report_days, 30);
        assert!((config.trend_tolerance - 0.05).abs() < 1e-12);
    }

    #[test]
    fn partial_file_uses_defaults() {
        let config: TestauditConfig = toml::from_str("report_days = 7\n").unwrap();
        assert_eq!(config.report_days, 7);
        assert_eq!(config.parallelism, 4);
        assert_eq!(config.data_dir, PathBuf::from("./testaudit-data"));
    }

    #[test]
    fn sample_config_parses() {
        let text = sample_config_toml(Path::new("data"));
        let config: TestauditConfig = toml::from_str(&text).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert_eq!(config.engine_config().parallelism, 4);
    }

    #[test]
    fn explicit_missing_path_is_an_error() {
        let err = load_config_from(Some(Path::new("/nonexistent/testaudit.toml"))).unwrap_err();
        assert!(err.to_string().contains("config file not found"));
    }

    #[test]
    fn explicit_path_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("testaudit.toml");
        std::fs::write(&path, "parallelism = 2\ntrend_tolerance = 0.1\n").unwrap();

        let config = load_config_from(Some(&path)).unwrap();
        assert!((config.trend_tolerance - 0.1).abs() < 1e-12);
    }
}
