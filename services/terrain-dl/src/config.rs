//! Downloader configuration.
//!
//! Values come from an optional YAML file; explicit CLI flags override them.
//! Every key has a default, so an empty file is a valid configuration.

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tile_store::DEFAULT_TILE_URL;
use tracing::debug;

/// Name of the per-user cache subdirectory.
const CACHE_DIR_NAME: &str = "terrain-dl";

/// What to do when a tile cannot be fetched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Leave the tile's block at 0 and carry on.
    #[default]
    Skip,
    /// Fail the run once all fetches have finished.
    Abort,
}

/// Runtime configuration for one download.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloaderConfig {
    /// Tile cache root; resolved from the environment when unset.
    pub cache_dir: Option<PathBuf>,

    /// Base URL of the terrarium tile service.
    pub base_url: String,

    /// Maximum in-flight tile fetches, 0 for no limit.
    pub max_concurrent: usize,

    pub failure_policy: FailurePolicy,

    /// Per-request timeout; no timeout when unset.
    pub request_timeout_secs: Option<u64>,

    /// Output raster path (`.tif`, `.tiff` or `.png`).
    pub output: PathBuf,

    /// Show progress bars.
    pub progress: bool,
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            cache_dir: None,
            base_url: DEFAULT_TILE_URL.to_string(),
            max_concurrent: 32,
            failure_policy: FailurePolicy::Skip,
            request_timeout_secs: None,
            output: PathBuf::from("output.tiff"),
            progress: true,
        }
    }
}

impl DownloaderConfig {
    /// Parse a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        // An empty document deserializes to unit, not an empty mapping.
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(yaml).context("Invalid configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Load a YAML configuration file.
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config = Self::from_yaml_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            bail!("base_url must not be empty");
        }
        if self.request_timeout_secs == Some(0) {
            bail!("request_timeout_secs must be positive");
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    /// The configured cache directory, or the per-user default.
    pub fn resolve_cache_dir(&self) -> Result<PathBuf> {
        match &self.cache_dir {
            Some(dir) => Ok(dir.clone()),
            None => default_cache_dir(|key| env::var(key).ok()),
        }
    }
}

/// Per-user cache directory:
/// `$TERRAIN_CACHE_DIR`, else `$XDG_CACHE_HOME/terrain-dl`,
/// else `$HOME/.cache/terrain-dl`.
pub fn default_cache_dir(var: impl Fn(&str) -> Option<String>) -> Result<PathBuf> {
    let set = |key: &str| var(key).filter(|v| !v.is_empty());

    if let Some(dir) = set("TERRAIN_CACHE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Some(xdg) = set("XDG_CACHE_HOME") {
        return Ok(PathBuf::from(xdg).join(CACHE_DIR_NAME));
    }
    if let Some(home) = set("HOME") {
        return Ok(PathBuf::from(home).join(".cache").join(CACHE_DIR_NAME));
    }
    bail!("Cannot determine a cache directory: set TERRAIN_CACHE_DIR or HOME")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = DownloaderConfig::default();
        assert_eq!(config.base_url, DEFAULT_TILE_URL);
        assert_eq!(config.failure_policy, FailurePolicy::Skip);
        assert_eq!(config.output, PathBuf::from("output.tiff"));
        assert!(config.request_timeout().is_none());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = DownloaderConfig::from_yaml_str(
            "max_concurrent: 4\nfailure_policy: abort\nrequest_timeout_secs: 30\n",
        )
        .unwrap();
        assert_eq!(config.max_concurrent, 4);
        assert_eq!(config.failure_policy, FailurePolicy::Abort);
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.base_url, DEFAULT_TILE_URL);
    }

    #[test]
    fn test_empty_yaml() {
        assert_eq!(
            DownloaderConfig::from_yaml_str("  \n").unwrap(),
            DownloaderConfig::default()
        );
    }

    #[test]
    fn test_rejects_unknown_policy_and_zero_timeout() {
        assert!(DownloaderConfig::from_yaml_str("failure_policy: retry").is_err());
        assert!(DownloaderConfig::from_yaml_str("request_timeout_secs: 0").is_err());
    }

    #[test]
    fn test_cache_dir_precedence() {
        let dir = default_cache_dir(vars(&[
            ("TERRAIN_CACHE_DIR", "/tmp/tiles"),
            ("XDG_CACHE_HOME", "/xdg"),
            ("HOME", "/home/u"),
        ]))
        .unwrap();
        assert_eq!(dir, PathBuf::from("/tmp/tiles"));

        let dir = default_cache_dir(vars(&[("XDG_CACHE_HOME", "/xdg"), ("HOME", "/home/u")])).unwrap();
        assert_eq!(dir, PathBuf::from("/xdg/terrain-dl"));

        let dir = default_cache_dir(vars(&[("XDG_CACHE_HOME", ""), ("HOME", "/home/u")])).unwrap();
        assert_eq!(dir, PathBuf::from("/home/u/.cache/terrain-dl"));

        assert!(default_cache_dir(vars(&[])).is_err());
    }

    #[test]
    fn test_explicit_cache_dir_wins() {
        let config = DownloaderConfig {
            cache_dir: Some(PathBuf::from("/data/tiles")),
            ..Default::default()
        };
        assert_eq!(config.resolve_cache_dir().unwrap(), PathBuf::from("/data/tiles"));
    }
}
