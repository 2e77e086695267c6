use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::file_svc;
use crate::mirror_service::folder_cache::CacheKeying;
use crate::remote_store::drive::{DEFAULT_API_URL, DEFAULT_UPLOAD_URL};
use crate::remote_store::drive_auth::DEFAULT_TOKEN_URL;

pub const DEFAULT_CONFIG_PATH: &str = "config.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {}: {}", .0.display(), .1)]
    Read(PathBuf, std::io::Error),
    #[error("cannot write {}: {}", .0.display(), .1)]
    Write(PathBuf, std::io::Error),
    #[error("{} already exists", .0.display())]
    AlreadyExists(PathBuf),
    #[error("malformed configuration: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
    #[error("local root: {0}")]
    LocalRoot(#[from] file_svc::error::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    #[serde(alias = "drive_folder_id")]
    pub backup_root_id: String,
    #[serde(alias = "local_folders")]
    pub local_roots: Vec<String>,
    pub days_to_keep: u32,
    #[serde(default)]
    pub folder_cache: CacheKeying,
    #[serde(default = "default_upload_concurrency")]
    pub upload_concurrency: usize,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StoreConfig {
    GoogleDrive(DriveSettings),
    Local { path: PathBuf },
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig::GoogleDrive(DriveSettings::default())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DriveSettings {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_upload_url")]
    pub upload_url: String,
    #[serde(default = "default_token_url")]
    pub token_url: String,
}

impl Default for DriveSettings {
    fn default() -> Self {
        Self { api_url: default_api_url(), upload_url: default_upload_url(), token_url: default_token_url() }
    }
}

fn default_upload_concurrency() -> usize {
    1
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_upload_url() -> String {
    DEFAULT_UPLOAD_URL.to_string()
}

fn default_token_url() -> String {
    DEFAULT_TOKEN_URL.to_string()
}

impl Config {
    pub fn new(backup_root_id: impl Into<String>, local_roots: Vec<String>, days_to_keep: u32) -> Self {
        Self {
            backup_root_id: backup_root_id.into(),
            local_roots,
            days_to_keep,
            folder_cache: CacheKeying::default(),
            upload_concurrency: default_upload_concurrency(),
            store: StoreConfig::default(),
            log_level: default_log_level(),
        }
    }

    ///
    /// Reads and validates the configuration at `path`
    ///
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read(path.to_path_buf(), e))?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    ///
    /// Writes the configuration to `path`, refusing to replace an existing file unless `force`
    ///
    pub fn write(&self, path: &Path, force: bool) -> Result<()> {
        if path.exists() && !force {
            return Err(ConfigError::AlreadyExists(path.to_path_buf()));
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| ConfigError::Write(path.to_path_buf(), e))
    }

    pub fn validate(&self) -> Result<()> {
        if self.backup_root_id.trim().is_empty() {
            return Err(ConfigError::Invalid("backup_root_id is empty".to_string()));
        }
        if self.local_roots.is_empty() {
            return Err(ConfigError::Invalid("local_roots lists no directories".to_string()));
        }
        if self.upload_concurrency == 0 {
            return Err(ConfigError::Invalid("upload_concurrency must be at least 1".to_string()));
        }
        if let StoreConfig::Local { path } = &self.store {
            if !path.is_dir() {
                return Err(ConfigError::Invalid(format!("local store {} is not a directory", path.display())));
            }
        }
        Ok(())
    }

    ///
    /// Expands `local_roots` into the directories to mirror, in configuration order
    ///
    pub fn local_root_dirs(&self) -> Result<Vec<PathBuf>> {
        Ok(file_svc::expand_dir_globs(self.local_roots.iter().cloned())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("config.json");
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_reads_legacy_keys_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), r#"{
            "drive_folder_id": "1AbC",
            "local_folders": ["/data/shop"],
            "days_to_keep": 7
        }"#);

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config, Config::new("1AbC", vec!["/data/shop".to_string()], 7));
        assert_eq!(config.folder_cache, CacheKeying::ByParent);
        assert_eq!(config.store, StoreConfig::GoogleDrive(DriveSettings::default()));
    }

    #[test]
    fn test_reads_full_config() {
        let dir = tempfile::tempdir().unwrap();
        let body = format!(r#"{{
            "backup_root_id": "BACKUP",
            "local_roots": ["/data/shop", "/srv/*"],
            "days_to_keep": 0,
            "folder_cache": "by_name",
            "upload_concurrency": 4,
            "store": {{ "kind": "local", "path": "{}" }},
            "log_level": "debug"
        }}"#, dir.path().display());
        let path = write_config(dir.path(), &body);

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.folder_cache, CacheKeying::ByName);
        assert_eq!(config.upload_concurrency, 4);
        assert_eq!(config.store, StoreConfig::Local { path: dir.path().to_path_buf() });
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_missing_key_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), r#"{ "backup_root_id": "x", "local_roots": ["/a"] }"#);
        assert!(matches!(Config::from_file(&path), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_negative_days_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), r#"{ "backup_root_id": "x", "local_roots": ["/a"], "days_to_keep": -1 }"#);
        assert!(matches!(Config::from_file(&path), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_empty_roots_and_root_id_are_rejected() {
        assert!(matches!(Config::new("x", vec![], 7).validate(), Err(ConfigError::Invalid(_))));
        assert!(matches!(Config::new(" ", vec!["/a".to_string()], 7).validate(), Err(ConfigError::Invalid(_))));

        let mut config = Config::new("x", vec!["/a".to_string()], 7);
        config.upload_concurrency = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(Config::from_file(&dir.path().join("nope.json")), Err(ConfigError::Read(..))));
    }

    #[test]
    fn test_write_round_trip_and_no_clobber() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let config = Config::new("BACKUP", vec!["/data/shop".to_string()], 30);

        config.write(&path, false).unwrap();
        assert_eq!(Config::from_file(&path).unwrap(), config);
        assert!(matches!(config.write(&path, false), Err(ConfigError::AlreadyExists(_))));
        config.write(&path, true).unwrap();
    }

    #[test]
    fn test_local_root_dirs() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("shop")).unwrap();
        let root = std::fs::canonicalize(dir.path()).unwrap();

        let config = Config::new("x", vec![format!("{}/shop", root.display())], 7);
        assert_eq!(config.local_root_dirs().unwrap(), vec![root.join("shop")]);

        let config = Config::new("x", vec![format!("{}/gone", root.display())], 7);
        assert!(matches!(config.local_root_dirs(), Err(ConfigError::LocalRoot(_))));
    }
}
