// ============================================================
// DATASET STORAGE
// ============================================================
// Key-value persistence of datasets as opaque JSON blobs.
// Last write wins; there are no transactions.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::domain::error::{AppError, Result};
use crate::domain::sheet::{Dataset, DATASET_KEY_PREFIX};

const BLOB_EXTENSION: &str = "json";

#[async_trait]
pub trait DatasetStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;
    async fn set(&self, key: &str, value: &[u8]) -> Result<()>;
    async fn del(&self, key: &str) -> Result<()>;
    async fn keys(&self) -> Result<Vec<String>>;
    async fn clear(&self) -> Result<()>;
}

fn validate_key(key: &str) -> Result<()> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(AppError::ValidationError(format!("Invalid storage key: {:?}", key)))
    }
}

// ============================================================
// FILE STORE
// ============================================================

/// One `<key>.json` file per entry under `root`
pub struct FileDatasetStore {
    root: PathBuf,
}

impl FileDatasetStore {
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root).await.map_err(|e| {
            AppError::IoError(format!("Failed to create {}: {}", root.display(), e))
        })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.{}", key, BLOB_EXTENSION))
    }
}

/// Write to a sibling temp file, then rename over the target
async fn atomic_write_bytes(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp_path = path.with_extension(format!("tmp-{}", Uuid::new_v4()));

    fs::write(&tmp_path, bytes).await.map_err(|e| {
        AppError::IoError(format!("Failed to write temp file {}: {}", tmp_path.display(), e))
    })?;

    if let Err(e) = fs::rename(&tmp_path, path).await {
        let _ = fs::remove_file(&tmp_path).await;
        return Err(AppError::IoError(format!(
            "Failed to rename temp file {} to {}: {}",
            tmp_path.display(),
            path.display(),
            e
        )));
    }
    Ok(())
}

#[async_trait]
impl DatasetStore for FileDatasetStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        validate_key(key)?;
        match fs::read(self.path_for(key)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::IoError(format!("Failed to read {}: {}", key, e))),
        }
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        validate_key(key)?;
        atomic_write_bytes(&self.path_for(key), value).await?;
        debug!("Stored {} ({} bytes)", key, value.len());
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<()> {
        validate_key(key)?;
        match fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::IoError(format!("Failed to delete {}: {}", key, e))),
        }
    }

    async fn keys(&self) -> Result<Vec<String>> {
        let mut entries = fs::read_dir(&self.root).await?;
        let mut keys = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(BLOB_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                keys.push(stem.to_string());
            }
        }
        keys.sort();
        Ok(keys)
    }

    async fn clear(&self) -> Result<()> {
        for key in self.keys().await? {
            self.del(&key).await?;
        }
        Ok(())
    }
}

// ============================================================
// MEMORY STORE
// ============================================================

#[derive(Default)]
pub struct MemoryDatasetStore {
    entries: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryDatasetStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DatasetStore for MemoryDatasetStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        validate_key(key)?;
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_vec());
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>> {
        let mut keys: Vec<String> = self.entries.read().await.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }

    async fn clear(&self) -> Result<()> {
        self.entries.write().await.clear();
        Ok(())
    }
}

// ============================================================
// DATASET REPOSITORY
// ============================================================

/// Typed access to datasets over any store
#[derive(Clone)]
pub struct DatasetRepository {
    store: Arc<dyn DatasetStore>,
}

impl DatasetRepository {
    pub fn new(store: Arc<dyn DatasetStore>) -> Self {
        Self { store }
    }

    pub async fn save(&self, dataset: &Dataset) -> Result<()> {
        let bytes = serde_json::to_vec(dataset)?;
        self.store.set(&dataset.storage_key(), &bytes).await
    }

    pub async fn load(&self, id: &str) -> Result<Dataset> {
        let key = Dataset::storage_key_for(id);
        let bytes = self
            .store
            .get(&key)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Dataset {} not found", id)))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.store.del(&Dataset::storage_key_for(id)).await
    }

    /// Ids of all stored datasets; other keys in the store are ignored
    pub async fn list_ids(&self) -> Result<Vec<String>> {
        Ok(self
            .store
            .keys()
            .await?
            .into_iter()
            .filter_map(|key| key.strip_prefix(DATASET_KEY_PREFIX).map(str::to_string))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::use_cases::structure_inference::DatasetAssembler;
    use crate::domain::sheet::RawCell;

    fn temp_root() -> PathBuf {
        std::env::temp_dir().join(format!("sheetlens-store-{}", Uuid::new_v4()))
    }

    fn sample_dataset() -> Dataset {
        let grid = vec![
            vec![RawCell::text("Nome"), RawCell::text("Valor")],
            vec![RawCell::text("Ana"), RawCell::from(10.0)],
            vec![RawCell::text("Bia"), RawCell::from(12.5)],
        ];
        DatasetAssembler::default().assemble(grid, "teste.csv")
    }

    #[tokio::test]
    async fn test_file_store_roundtrip() {
        let root = temp_root();
        let store = FileDatasetStore::open(&root).await.unwrap();

        store.set("dataset_a", b"{}").await.unwrap();
        store.set("dataset_a", b"[1]").await.unwrap();
        store.set("other", b"x").await.unwrap();

        assert_eq!(store.get("dataset_a").await.unwrap(), Some(b"[1]".to_vec()));
        assert_eq!(store.keys().await.unwrap(), vec!["dataset_a", "other"]);

        store.del("dataset_a").await.unwrap();
        store.del("dataset_a").await.unwrap();
        assert_eq!(store.get("dataset_a").await.unwrap(), None);

        store.clear().await.unwrap();
        assert!(store.keys().await.unwrap().is_empty());

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn test_rejects_path_like_keys() {
        let root = temp_root();
        let store = FileDatasetStore::open(&root).await.unwrap();
        let err = store.set("../escape", b"x").await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn test_repository_over_memory_store() {
        let repo = DatasetRepository::new(Arc::new(MemoryDatasetStore::new()));
        let dataset = sample_dataset();

        repo.save(&dataset).await.unwrap();
        let loaded = repo.load(&dataset.id).await.unwrap();
        assert_eq!(loaded.id, dataset.id);
        assert_eq!(loaded.rows, dataset.rows);
        assert_eq!(loaded.summary, dataset.summary);
        assert_eq!(repo.list_ids().await.unwrap(), vec![dataset.id.clone()]);

        repo.delete(&dataset.id).await.unwrap();
        let err = repo.load(&dataset.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_reload_keeps_dates_and_raw_text() {
        let grid = vec![
            vec![RawCell::text("Exportado em"), RawCell::text("2024-01-05T10:00:00")],
            vec![RawCell::text("Nome"), RawCell::text("Data")],
            vec![RawCell::text("Ana"), RawCell::text("01/02/2024")],
            vec![RawCell::text("Bia"), RawCell::text("02/02/2024")],
            vec![RawCell::text("Caio"), RawCell::text("03/02/2024")],
        ];
        let dataset = DatasetAssembler::default().assemble(grid, "agenda.csv");
        assert_eq!(dataset.detected_date_column.as_deref(), Some("Data"));

        let repo = DatasetRepository::new(Arc::new(MemoryDatasetStore::new()));
        repo.save(&dataset).await.unwrap();
        let loaded = repo.load(&dataset.id).await.unwrap();

        assert_eq!(loaded.rows, dataset.rows);
        assert_eq!(loaded.raw_grid, dataset.raw_grid);
        assert_eq!(
            loaded.rows[0].get("Data").and_then(|v| v.as_date()),
            Some("2024-02-01")
        );
        assert_eq!(loaded.raw_grid[0][1], RawCell::text("2024-01-05T10:00:00"));
    }

    #[tokio::test]
    async fn test_repository_over_file_store() {
        let root = temp_root();
        let store = FileDatasetStore::open(&root).await.unwrap();
        let repo = DatasetRepository::new(Arc::new(store));

        let mut dataset = sample_dataset();
        repo.save(&dataset).await.unwrap();

        dataset.replace_raw_grid(vec![vec![RawCell::text("editado")]]);
        repo.save(&dataset).await.unwrap();

        let loaded = repo.load(&dataset.id).await.unwrap();
        assert_eq!(loaded.raw_grid, vec![vec![RawCell::text("editado")]]);
        assert_eq!(loaded.updated_at, dataset.updated_at);

        let _ = std::fs::remove_dir_all(&root);
    }
}
