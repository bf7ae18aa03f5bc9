//! File-backed key-value storage, one JSON document per key.

use std::fmt::Write as _;
use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use kasboek_application::{KeyValueStorage, StorageChange};
use kasboek_core::{AppError, AppResult};
use tokio::sync::broadcast;

const CHANGE_CHANNEL_CAPACITY: usize = 256;

/// Stores each key as `<directory>/<encoded key>.json`.
///
/// Writes go to a temporary file that is renamed over the target, so readers
/// never observe a partially written document. Change notifications cover
/// writes made through this instance only.
pub struct JsonFileKeyValueStorage {
    directory: PathBuf,
    changes: broadcast::Sender<StorageChange>,
}

impl JsonFileKeyValueStorage {
    /// Opens (and creates when missing) the storage directory.
    pub async fn open(directory: impl Into<PathBuf>) -> AppResult<Self> {
        let directory = directory.into();
        tokio::fs::create_dir_all(&directory).await.map_err(|error| {
            AppError::Storage(format!(
                "failed to create storage directory '{}': {error}",
                directory.display()
            ))
        })?;

        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Ok(Self { directory, changes })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.directory.join(format!("{}.json", encode_key(key)))
    }
}

/// Encodes a key into a portable file name; `%XX` escapes everything except
/// ASCII alphanumerics, `-` and `_`.
fn encode_key(key: &str) -> String {
    let mut encoded = String::with_capacity(key.len());
    for byte in key.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
            encoded.push(char::from(byte));
        } else {
            let _ = write!(encoded, "%{byte:02X}");
        }
    }
    encoded
}

#[async_trait]
impl KeyValueStorage for JsonFileKeyValueStorage {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let path = self.path_for(key);
        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(None),
            Err(error) => Err(AppError::Storage(format!(
                "failed to read '{}': {error}",
                path.display()
            ))),
        }
    }

    async fn set(&self, key: &str, value: &str) -> AppResult<()> {
        let path = self.path_for(key);
        let temporary_path = path.with_extension(format!("json.{}.tmp", uuid::Uuid::new_v4()));

        tokio::fs::write(&temporary_path, value.as_bytes())
            .await
            .map_err(|error| {
                AppError::Storage(format!(
                    "failed to write '{}': {error}",
                    temporary_path.display()
                ))
            })?;

        if let Err(error) = tokio::fs::rename(&temporary_path, &path).await {
            let _ = tokio::fs::remove_file(&temporary_path).await;
            return Err(AppError::Storage(format!(
                "failed to replace '{}': {error}",
                path.display()
            )));
        }

        let _ = self.changes.send(StorageChange {
            key: key.to_owned(),
            value: Some(value.to_owned()),
        });
        Ok(())
    }

    async fn remove(&self, key: &str) -> AppResult<()> {
        let path = self.path_for(key);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                let _ = self.changes.send(StorageChange {
                    key: key.to_owned(),
                    value: None,
                });
                Ok(())
            }
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(()),
            Err(error) => Err(AppError::Storage(format!(
                "failed to remove '{}': {error}",
                path.display()
            ))),
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageChange> {
        self.changes.subscribe()
    }
}
