//! Small JSON documents persisted under the per-user store directory.

mod dir;
mod error;

use std::{
    marker::PhantomData,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use tokio::{fs, io::AsyncWriteExt, sync::RwLock};
use tracing::{debug, info};

pub use dir::default_store_dir;
pub use error::StoreError;

/// A single persisted document of type `T`.
#[async_trait]
pub trait Store<T>: Send + Sync {
    async fn read(&self) -> Result<T, StoreError>;
    async fn write(&self, value: &T) -> Result<(), StoreError>;
}

/// Document stored as `<dir>/<name>.json`.
///
/// Reads share the lock, writes hold it exclusively. Writes go to a sibling
/// temp file first and are renamed over the document.
pub struct JsonStore<T> {
    name: String,
    path: PathBuf,
    lock: RwLock<()>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonStore<T>
where
    T: Serialize + DeserializeOwned + Send + Sync,
{
    /// Opens the document, creating the directory and seeding the file with
    /// `default` when either is missing. Names must be unique per directory.
    pub async fn open(dir: &Path, name: &str, default: &T) -> Result<Self, StoreError> {
        create_dir(dir).await?;

        let store = Self {
            name: name.to_string(),
            path: dir.join(format!("{name}.json")),
            lock: RwLock::new(()),
            _marker: PhantomData,
        };

        let exists = fs::try_exists(&store.path)
            .await
            .map_err(|source| StoreError::Read {
                path: store.path.clone(),
                source,
            })?;
        if !exists {
            info!(path = %store.path.display(), "Creating store file");
            store.write(default).await?;
        }
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn write_file(&self, data: &[u8]) -> Result<(), StoreError> {
        let tmp = self.path.with_extension("json.tmp");
        let write_err = |source| StoreError::Write {
            path: self.path.clone(),
            source,
        };

        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(0o600);

        let mut file = options.open(&tmp).await.map_err(write_err)?;
        file.write_all(data).await.map_err(write_err)?;
        file.sync_all().await.map_err(write_err)?;
        drop(file);

        fs::rename(&tmp, &self.path).await.map_err(write_err)
    }
}

#[async_trait]
impl<T> Store<T> for JsonStore<T>
where
    T: Serialize + DeserializeOwned + Send + Sync,
{
    async fn read(&self) -> Result<T, StoreError> {
        let _guard = self.lock.read().await;
        let data = fs::read(&self.path)
            .await
            .map_err(|source| StoreError::Read {
                path: self.path.clone(),
                source,
            })?;
        serde_json::from_slice(&data).map_err(|source| StoreError::Unmarshal {
            path: self.path.clone(),
            source,
        })
    }

    async fn write(&self, value: &T) -> Result<(), StoreError> {
        let data = serde_json::to_vec(value).map_err(|source| StoreError::Marshal {
            name: self.name.clone(),
            source,
        })?;
        let _guard = self.lock.write().await;
        self.write_file(&data).await?;
        debug!(path = %self.path.display(), bytes = data.len(), "Store written");
        Ok(())
    }
}

async fn create_dir(dir: &Path) -> Result<(), StoreError> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    builder.mode(0o700);
    builder
        .create(dir)
        .await
        .map_err(|source| StoreError::CreateDir {
            path: dir.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
    struct Doc {
        #[serde(rename = "fieldA")]
        field_a: String,
        #[serde(rename = "fieldB")]
        field_b: i64,
    }

    #[tokio::test]
    async fn test_open_creates_file_with_default() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a").join("store");
        let store = JsonStore::<Vec<String>>::open(&nested, "boards", &Vec::new())
            .await
            .unwrap();

        assert!(store.path().is_file());
        assert_eq!(std::fs::read_to_string(store.path()).unwrap(), "[]");
        assert!(store.read().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_open_keeps_existing_content() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("test.json"), r#"{"fieldA":"A","fieldB":123}"#).unwrap();

        let store = JsonStore::open(dir.path(), "test", &Doc::default())
            .await
            .unwrap();
        let doc = store.read().await.unwrap();
        assert_eq!(
            doc,
            Doc {
                field_a: "A".to_string(),
                field_b: 123
            }
        );
    }

    #[tokio::test]
    async fn test_write_then_file_matches_json() {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::open(dir.path(), "test", &Doc::default())
            .await
            .unwrap();
        let doc = Doc {
            field_a: "A".to_string(),
            field_b: 123,
        };
        store.write(&doc).await.unwrap();

        let on_disk = std::fs::read(store.path()).unwrap();
        assert_eq!(on_disk, serde_json::to_vec(&doc).unwrap());
        assert!(!dir.path().join("test.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_read_corrupt_file_is_unmarshal_error() {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::<HashMap<String, String>>::open(dir.path(), "settings", &HashMap::new())
            .await
            .unwrap();
        std::fs::write(store.path(), "{not json").unwrap();

        let err = store.read().await.unwrap_err();
        assert!(matches!(err, StoreError::Unmarshal { .. }));
        assert!(err.to_string().contains("settings.json"));
    }

    #[tokio::test]
    async fn test_read_missing_file_is_read_error() {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::<Vec<String>>::open(dir.path(), "boards", &Vec::new())
            .await
            .unwrap();
        std::fs::remove_file(store.path()).unwrap();

        assert!(matches!(
            store.read().await,
            Err(StoreError::Read { .. })
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_permissions_are_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let root = dir.path().join("store");
        let store = JsonStore::<Vec<String>>::open(&root, "boards", &Vec::new())
            .await
            .unwrap();

        let file_mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(file_mode & 0o777, 0o600);
        let dir_mode = std::fs::metadata(&root).unwrap().permissions().mode();
        assert_eq!(dir_mode & 0o077, 0);
    }
}
