use std::{collections::HashMap, io, path::PathBuf, sync::Arc};

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use tokio::sync::Mutex;

use crate::config;

pub const KEY_LIKED_AUDIO_BLOCKS: &str = "likedAudioBlocks";
pub const KEY_PENDING_LIKE_OPERATIONS: &str = "pendingLikeOperations";
pub const KEY_LISTENING_TIME: &str = "listeningTime";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage I/O failed for `{key}`: {source}")]
    Io {
        key: String,
        #[source]
        source: io::Error,
    },
    #[error("cannot encode or decode `{key}`: {source}")]
    Serde {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Durable key-value storage for application state.
///
/// Implementations serialize writers internally; a `write` is either fully
/// visible to the next `read` or not at all.
#[async_trait]
pub trait Persistence: Send + Sync {
    async fn read(&self, key: &str) -> Result<Option<String>, StoreError>;
    async fn write(&self, key: &str, contents: &str) -> Result<(), StoreError>;
    async fn remove(&self, key: &str) -> Result<(), StoreError>;
}

#[async_trait]
impl<T: Persistence + ?Sized> Persistence for Arc<T> {
    async fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).read(key).await
    }

    async fn write(&self, key: &str, contents: &str) -> Result<(), StoreError> {
        (**self).write(key, contents).await
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        (**self).remove(key).await
    }
}

pub async fn load_json<T, P>(store: &P, key: &str) -> Result<Option<T>, StoreError>
where
    T: DeserializeOwned,
    P: Persistence + ?Sized,
{
    match store.read(key).await? {
        Some(json) => serde_json::from_str(&json)
            .map(Some)
            .map_err(|source| StoreError::Serde {
                key: key.to_string(),
                source,
            }),
        None => Ok(None),
    }
}

pub async fn save_json<T, P>(store: &P, key: &str, value: &T) -> Result<(), StoreError>
where
    T: Serialize + ?Sized,
    P: Persistence + ?Sized,
{
    let json = serde_json::to_string_pretty(value).map_err(|source| StoreError::Serde {
        key: key.to_string(),
        source,
    })?;
    store.write(key, &json).await
}

/// Stores every key as `<root>/<key>.json`.
pub struct FileStore {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            write_lock: Mutex::new(()),
        }
    }

    /// Store rooted at the configured state directory.
    pub fn default_location() -> Self {
        Self::new(config::state_dir())
    }

    fn get_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }
}

#[async_trait]
impl Persistence for FileStore {
    async fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.get_path(key);
        match async_fs::read_to_string(&path).await {
            Ok(json) => Ok(Some(json)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }

    async fn write(&self, key: &str, contents: &str) -> Result<(), StoreError> {
        let io_err = |source: io::Error| StoreError::Io {
            key: key.to_string(),
            source,
        };

        let _guard = self.write_lock.lock().await;
        async_fs::create_dir_all(&self.root).await.map_err(io_err)?;

        let path = self.get_path(key);
        // unique per write: the lock does not reach other processes
        let tmp = self.root.join(format!(
            ".{key}.{}.{}.tmp",
            std::process::id(),
            uuid::Uuid::new_v4().simple()
        ));
        async_fs::write(&tmp, contents).await.map_err(io_err)?;
        if let Err(e) = async_fs::rename(&tmp, &path).await {
            let _ = async_fs::remove_file(&tmp).await;
            return Err(io_err(e));
        }
        log::debug!("persisted {} ({} bytes)", path.display(), contents.len());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        match async_fs::remove_file(self.get_path(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }
}

/// Non-durable store, handy for dry runs and tests.
#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Persistence for MemoryStore {
    async fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.values.lock().await.get(key).cloned())
    }

    async fn write(&self, key: &str, contents: &str) -> Result<(), StoreError> {
        self.values
            .lock()
            .await
            .insert(key.to_string(), contents.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.values.lock().await.remove(key);
        Ok(())
    }
}
