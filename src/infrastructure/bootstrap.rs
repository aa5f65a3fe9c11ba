use std::path::Path;
use std::sync::Arc;

use tracing::{error, info};

use crate::application::{ParseOptions, SpreadsheetImporter};
use crate::domain::error::Result;
use crate::domain::sheet::Dataset;
use crate::infrastructure::config::{AppConfig, ConfigService};
use crate::infrastructure::logging::init_tracing;
use crate::infrastructure::storage::{DatasetRepository, FileDatasetStore};

/// Wired application services
pub struct AppState {
    pub config: AppConfig,
    pub importer: Arc<SpreadsheetImporter>,
    pub datasets: DatasetRepository,
}

impl AppState {
    /// Import a file from disk and persist the resulting dataset
    pub async fn import_file(&self, path: &Path, options: &ParseOptions) -> Result<Dataset> {
        let dataset = self.importer.parse_excel_file(path, options).await?;
        self.datasets.save(&dataset).await?;
        Ok(dataset)
    }
}

/// Load configuration, install logging and open the dataset store
pub async fn setup(config_service: &ConfigService) -> Result<AppState> {
    let config = config_service.load().map_err(|err| {
        error!(error = %err, path = %config_service.config_path().display(), "Failed to load config");
        err
    })?;
    init_tracing(&config.log_filter);
    setup_with_config(config).await
}

pub async fn setup_with_config(config: AppConfig) -> Result<AppState> {
    let importer = SpreadsheetImporter::new(config.inference.clone(), config.import.clone())?;

    let store = FileDatasetStore::open(&config.storage.data_dir)
        .await
        .map_err(|err| {
            error!(
                error = %err,
                data_dir = %config.storage.data_dir.display(),
                "Failed to open dataset store"
            );
            err
        })?;
    info!(data_dir = %store.root().display(), "Dataset store ready");

    Ok(AppState {
        config,
        importer: Arc::new(importer),
        datasets: DatasetRepository::new(Arc::new(store)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::config::StorageConfig;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_import_file_persists_dataset() {
        let root = std::env::temp_dir().join(format!("sheetlens-app-{}", Uuid::new_v4()));
        let config = AppConfig {
            storage: StorageConfig {
                data_dir: root.join("data"),
            },
            ..Default::default()
        };
        let state = setup_with_config(config).await.unwrap();

        let path = root.join("equipe.csv");
        std::fs::write(&path, "Nome,Setor\nAna,RH\nBia,TI\n").unwrap();

        let dataset = state
            .import_file(&path, &ParseOptions::default())
            .await
            .unwrap();
        let stored = state.datasets.load(&dataset.id).await.unwrap();
        assert_eq!(stored.total_rows, 2);
        assert_eq!(state.datasets.list_ids().await.unwrap(), vec![dataset.id]);

        let _ = std::fs::remove_dir_all(&root);
    }
}
