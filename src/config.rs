use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::{fs::read_to_string, path::Path, time::Duration};

use crate::{error::AttacheError, save::SaveOptions};

/// Tunables for the upload plugin, usually loaded from the host
/// application's config file under an `[uploads]` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// How long `save` waits for in-flight uploads before returning the
    /// timeout outcome.
    pub max_save_timeout_ms: u64,
    /// Files larger than this register an error record instead of starting a
    /// transport call. `None` means no limit.
    pub max_file_bytes: Option<u64>,
}

impl Default for UploadConfig {
    fn default() -> UploadConfig {
        UploadConfig {
            max_save_timeout_ms: 5_000,
            max_file_bytes: None,
        }
    }
}

impl UploadConfig {
    /// Read the `uploads` table from a TOML file. A missing file yields the
    /// defaults; a present file without an `uploads` table is a
    /// configuration mistake and fails.
    pub fn from_toml_path<P: AsRef<Path>>(path: P) -> Result<UploadConfig, AttacheError> {
        let path = path.as_ref();
        tracing::debug!("Attempting to read upload config from: {:?}", path);
        if !path.exists() {
            tracing::debug!("Config file not found, using default upload config.");
            return Ok(UploadConfig::default());
        }
        let content = read_to_string(path)?;
        let config: BTreeMap<String, UploadConfig> = toml::from_str(&content)?;
        config
            .get("uploads")
            .cloned()
            .ok_or_else(|| AttacheError::NotFound("uploads not found in config".to_string()))
    }

    pub fn save_options(&self) -> SaveOptions {
        SaveOptions::with_timeout(Duration::from_millis(self.max_save_timeout_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_apply_for_missing_fields() {
        let config: UploadConfig = toml::from_str("max_file_bytes = 1024").unwrap();
        assert_eq!(config.max_file_bytes, Some(1024));
        assert_eq!(config.max_save_timeout_ms, 5_000);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = UploadConfig::from_toml_path(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, UploadConfig::default());
    }

    #[test]
    fn reads_uploads_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "[uploads]\nmax_save_timeout_ms = 250\nmax_file_bytes = 8"
        )
        .unwrap();

        let config = UploadConfig::from_toml_path(&path).unwrap();
        assert_eq!(config.max_save_timeout_ms, 250);
        assert_eq!(config.max_file_bytes, Some(8));
        assert_eq!(
            config.save_options(),
            SaveOptions::with_timeout(Duration::from_millis(250))
        );
    }

    #[test]
    fn malformed_config_fails_with_serialization_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[uploads]\nmax_save_timeout_ms = \"soon\"\n").unwrap();
        let err = UploadConfig::from_toml_path(&path).unwrap_err();
        assert!(matches!(err, AttacheError::Serialization(_)));
    }

    #[test]
    fn missing_uploads_table_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[other]\nx = 1\n").unwrap();
        let err = UploadConfig::from_toml_path(&path).unwrap_err();
        assert!(matches!(err, AttacheError::NotFound(_)));
    }
}
