//! Configuration loading and management.

use std::path::{Path, PathBuf};

use er_core::{ModelKind, Options, Params};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Model variant, `baseline` or `reply`.
    pub model: ModelKind,

    /// Recharge constant `G` in event time units (milliseconds).
    pub recharge: f64,

    /// Half-life constant `H` in event time units (milliseconds).
    pub half_life: f64,

    /// Flow fraction `f`.
    pub flow: f64,

    /// Group consecutive events with equal timestamps into buckets.
    pub bucket: bool,
}

impl Default for Config {
    fn default() -> Self {
        let params = Params::default();
        Self {
            model: params.model,
            recharge: params.recharge,
            half_life: params.half_life,
            flow: params.flow,
            bucket: true,
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (ER_*)
        figment = figment.merge(Env::prefixed("ER_"));

        figment.extract()
    }

    /// Model options for the given correspondents.
    pub fn options(&self, correspondents: Vec<String>, include: Vec<String>) -> Options {
        Options {
            correspondents: Some(correspondents),
            model: self.model,
            recharge: self.recharge,
            half_life: self.half_life,
            flow: self.flow,
            include: (!include.is_empty()).then(|| include.into_iter().collect()),
            ..Options::default()
        }
    }
}

/// Returns the platform-specific config directory for eventrank.
///
/// On Linux: `~/.config/eventrank`
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("eventrank"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dirs_config_path_ends_with_eventrank() {
        let path = dirs_config_path().unwrap();
        assert_eq!(path.file_name().unwrap(), "eventrank");
    }

    #[test]
    fn test_default_config_matches_model_defaults() {
        let config = Config::default();
        assert_eq!(config.model, ModelKind::Reply);
        assert!(config.bucket);
        assert!((config.flow - 0.8).abs() < f64::EPSILON);
    }

    #[test]
    fn test_config_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "model = \"baseline\"\nflow = 0.5\nbucket = false\n").unwrap();

        let config = Config::load_from(Some(&path)).unwrap();

        assert_eq!(config.model, ModelKind::Baseline);
        assert!((config.flow - 0.5).abs() < f64::EPSILON);
        assert!(!config.bucket);
    }

    #[test]
    fn test_config_rejects_unknown_model() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "model = \"pagerank\"\n").unwrap();

        assert!(Config::load_from(Some(&path)).is_err());
    }

    #[test]
    fn test_options_carry_parameters() {
        let config = Config {
            model: ModelKind::Baseline,
            recharge: 5.0,
            half_life: 3.0,
            flow: 0.4,
            bucket: true,
        };
        let options = config.options(vec!["a".into(), "b".into()], vec!["a".into()]);

        assert_eq!(options.model, ModelKind::Baseline);
        assert!((options.recharge - 5.0).abs() < f64::EPSILON);
        assert!((options.half_life - 3.0).abs() < f64::EPSILON);
        assert_eq!(options.correspondents.unwrap(), ["a", "b"]);
        assert_eq!(options.include.unwrap().len(), 1);
    }

    #[test]
    fn test_empty_include_means_everyone() {
        let options = Config::default().options(vec!["a".into()], Vec::new());
        assert!(options.include.is_none());
    }
}
