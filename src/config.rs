//! Configuration file for renderscholar.
//!
//! ```toml
//! [search]
//! results_timeout_secs = 15
//! wait_for_operator = true
//! marker_dir = "."
//!
//! [ranking]
//! pool_size = 100
//! top_k = 10
//! mode = "balanced"
//! sort = "relevance"
//!
//! [ranking.posterior]
//! draws = 1000
//! tune = 500
//! chains = 2
//! ```
//!
//! Every section and field is optional. Command-line flags override file
//! values.

use crate::error::{RankError, Result};
use crate::ranking::{Mode, PosteriorSettings};
use scholar_search::{CollectorConfig, SortOrder};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable that overrides the config directory.
pub const CONFIG_DIR_ENV: &str = "RENDERSCHOLAR_CONFIG_DIR";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Collection settings.
    pub search: CollectorConfig,
    /// Ranking settings.
    pub ranking: RankingConfig,
}

/// `[ranking]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    /// Records to collect before ranking.
    pub pool_size: usize,
    /// Records to keep after ranking.
    pub top_k: usize,
    pub mode: Mode,
    pub sort: SortOrder,
    pub posterior: PosteriorSettings,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            pool_size: 100,
            top_k: 10,
            mode: Mode::default(),
            sort: SortOrder::default(),
            posterior: PosteriorSettings::default(),
        }
    }
}

impl RenderConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| RankError::Config(e.to_string()))
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| RankError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load `path` if given, else the default path if it exists, else defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicit `path` cannot be loaded, or the
    /// default file exists but is invalid.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let default = Self::default_config_path();
                if default.is_file() {
                    Self::from_file(&default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Validate every section.
    ///
    /// # Errors
    ///
    /// Returns [`RankError::Config`] naming the first invalid field.
    pub fn validate(&self) -> Result<()> {
        self.search
            .validate()
            .map_err(|e| RankError::Config(e.to_string()))?;
        self.ranking.posterior.validate()
    }

    /// Returns the default config file path:
    /// `<config dir>/renderscholar/config.toml`.
    ///
    /// `$RENDERSCHOLAR_CONFIG_DIR` replaces `<config dir>/renderscholar`.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV) {
            return PathBuf::from(dir).join("config.toml");
        }
        dirs::config_dir()
            .map(|d| d.join("renderscholar"))
            .unwrap_or_else(|| PathBuf::from("/tmp/renderscholar-config"))
            .join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[test]
    fn defaults() {
        let config = RenderConfig::default();
        assert_eq!(config.ranking.pool_size, 100);
        assert_eq!(config.ranking.top_k, 10);
        assert_eq!(config.ranking.mode, Mode::Balanced);
        assert_eq!(config.ranking.sort, SortOrder::Relevance);
        assert_eq!(config.search.results_timeout_secs, 15);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let config: RenderConfig = toml::from_str(
            r#"
            [ranking]
            mode = "famous"
            top_k = 3

            [search]
            wait_for_operator = false
            "#,
        )
        .unwrap();
        assert_eq!(config.ranking.mode, Mode::Famous);
        assert_eq!(config.ranking.top_k, 3);
        assert_eq!(config.ranking.pool_size, 100);
        assert!(!config.search.wait_for_operator);
        assert_eq!(config.search.politeness_delay_ms, 1000);
    }

    #[test]
    fn unknown_mode_in_file_is_rejected() {
        let result: std::result::Result<RenderConfig, _> =
            toml::from_str("[ranking]\nmode = \"trending\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = RenderConfig::default();
        config.ranking.mode = Mode::Bayesian;
        config.ranking.posterior.seed = Some(11);
        config.search.marker_dir = dir.path().to_path_buf();

        config.save_to_file(&path).unwrap();
        let loaded = RenderConfig::from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn from_file_nonexistent_returns_error() {
        let result = RenderConfig::from_file(Path::new("/nonexistent/path/config.toml"));
        assert!(matches!(result, Err(RankError::Io(_))));
    }

    #[test]
    fn from_file_invalid_toml_returns_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "this is not valid toml {{{").unwrap();
        assert!(matches!(
            RenderConfig::from_file(&path),
            Err(RankError::Config(_))
        ));
    }

    #[test]
    fn validate_reports_search_errors() {
        let mut config = RenderConfig::default();
        config.search.results_timeout_secs = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("results_timeout_secs"));
    }

    #[test]
    fn default_config_path_ends_with_config_toml() {
        let path = RenderConfig::default_config_path();
        assert!(path.to_string_lossy().ends_with("config.toml"));
    }
}
