//! Loading the shipped configuration file.

use std::path::PathBuf;

use terrain_dl::{DownloaderConfig, FailurePolicy, PipelineOptions};

fn shipped_config() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../config/terrain-dl.yaml")
}

#[test]
fn test_shipped_config_matches_defaults() {
    let config = DownloaderConfig::from_yaml_file(&shipped_config()).unwrap();
    assert_eq!(config, DownloaderConfig::default());
}

#[test]
fn test_missing_config_file() {
    let err = DownloaderConfig::from_yaml_file(&PathBuf::from("/nonexistent/terrain-dl.yaml"))
        .unwrap_err();
    assert!(err.to_string().contains("Failed to read config file"));
}

#[test]
fn test_config_file_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("custom.yaml");
    std::fs::write(
        &path,
        "cache_dir: /srv/tiles\nmax_concurrent: 0\nfailure_policy: abort\nprogress: false\n",
    )
    .unwrap();

    let config = DownloaderConfig::from_yaml_file(&path).unwrap();
    assert_eq!(config.resolve_cache_dir().unwrap(), PathBuf::from("/srv/tiles"));

    let options = PipelineOptions::from(&config);
    assert_eq!(options.max_concurrent, 0);
    assert_eq!(options.failure_policy, FailurePolicy::Abort);
    assert!(!options.show_progress);
}
