use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::domain::error::{AppError, Result};
use crate::domain::sheet::{ImportConfig, InferenceConfig};

pub const CONFIG_FILE_NAME: &str = "sheetlens.toml";
pub const ENV_PREFIX: &str = "SHEETLENS_";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding one JSON blob per stored dataset
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// `tracing` env-filter directive
    pub log_filter: String,
    pub inference: InferenceConfig,
    pub import: ImportConfig,
    pub storage: StorageConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_filter: "info".to_string(),
            inference: InferenceConfig::default(),
            import: ImportConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn validate(&self) -> Result<()> {
        self.inference
            .validate()
            .map_err(|e| AppError::ValidationError(format!("inference: {}", e)))?;
        self.import
            .validate()
            .map_err(|e| AppError::ValidationError(format!("import: {}", e)))?;
        if self.storage.data_dir.as_os_str().is_empty() {
            return Err(AppError::ValidationError(
                "storage: data_dir must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Layered configuration: defaults, then the TOML file, then
/// `SHEETLENS_` env vars (`__` separates nested keys, e.g.
/// `SHEETLENS_IMPORT__MAX_ROWS=5000`).
pub struct ConfigService {
    config_path: PathBuf,
}

impl ConfigService {
    pub fn new() -> Self {
        Self::with_path(CONFIG_FILE_NAME)
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
        }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    fn figment(&self) -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(&self.config_path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Load `.env` (if any) and extract the layered config
    pub fn load(&self) -> Result<AppConfig> {
        let _ = dotenvy::dotenv();
        self.load_without_dotenv()
    }

    pub fn load_without_dotenv(&self) -> Result<AppConfig> {
        let config: AppConfig = self.figment().extract()?;
        config.validate()?;
        debug!("Loaded configuration from {}", self.config_path.display());
        Ok(config)
    }
}

impl Default for ConfigService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::sheet::SheetSelection;
    use uuid::Uuid;

    #[test]
    fn test_defaults_without_file() {
        let path = std::env::temp_dir().join(format!("missing-{}.toml", Uuid::new_v4()));
        let config = ConfigService::with_path(path).load_without_dotenv().unwrap();
        assert_eq!(config.log_filter, "info");
        assert_eq!(config.import.max_rows, 20000);
        assert_eq!(config.inference.header_scan_rows, 10);
    }

    #[test]
    fn test_toml_overrides() {
        let dir = std::env::temp_dir().join(format!("sheetlens-config-{}", Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(CONFIG_FILE_NAME);
        std::fs::write(
            &path,
            "log_filter = \"debug\"\n\n[import]\nmax_rows = 500\nsheet_selection = \"most_rows\"\n\n[inference]\ncategory_max_distinct = 20\n",
        )
        .unwrap();

        let config = ConfigService::with_path(&path).load_without_dotenv().unwrap();
        assert_eq!(config.log_filter, "debug");
        assert_eq!(config.import.max_rows, 500);
        assert_eq!(config.import.sheet_selection, SheetSelection::MostRows);
        assert_eq!(config.inference.category_max_distinct, 20);
        assert_eq!(config.inference.header_scan_rows, 10);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let dir = std::env::temp_dir().join(format!("sheetlens-config-{}", Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[import]\nmax_rows = 0\n").unwrap();

        let err = ConfigService::with_path(&path).load_without_dotenv().unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
