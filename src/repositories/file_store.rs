use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::KeyValueStore;
use crate::models::{StorageError, StorageResult};

/// Stores each key as one JSON file inside a directory.
///
/// Writes go to a uniquely named temporary sibling which is then renamed over
/// the target, so a reader sees either the old file or the new one.
#[derive(Debug, Clone)]
pub struct FileKeyValueStore {
    root: PathBuf,
}

impl FileKeyValueStore {
    /// Open (and create if needed) the storage directory
    pub async fn open(root: impl Into<PathBuf>) -> StorageResult<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        info!(root = %root.display(), "File key-value store ready");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the file backing `key`
    pub fn path_for(&self, key: &str) -> StorageResult<PathBuf> {
        if key.is_empty() {
            return Err(StorageError::InvalidKey {
                key: key.to_string(),
            });
        }
        Ok(self.root.join(file_name_for_key(key)))
    }
}

/// Escaped names longer than this are shortened to a prefix plus a digest,
/// keeping temp file names well under common 255-byte limits
const MAX_ESCAPED_NAME_LEN: usize = 128;
const HASHED_NAME_PREFIX_LEN: usize = 64;

/// Keep ASCII alphanumerics, `-` and `_`; escape every other byte as `%XX`.
/// Long names become `{prefix}~{sha256}`; `~` never survives escaping, so
/// hashed names cannot clash with plain ones.
fn file_name_for_key(key: &str) -> String {
    let mut name = String::with_capacity(key.len() + 5);
    for byte in key.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
            name.push(byte as char);
        } else {
            name.push_str(&format!("%{:02X}", byte));
        }
    }

    if name.len() > MAX_ESCAPED_NAME_LEN {
        let digest = Sha256::digest(key.as_bytes());
        name.truncate(HASHED_NAME_PREFIX_LEN);
        name.push('~');
        for byte in digest {
            name.push_str(&format!("{:02x}", byte));
        }
    }

    name.push_str(".json");
    name
}

#[async_trait]
impl KeyValueStore for FileKeyValueStore {
    #[instrument(skip(self), fields(root = %self.root.display()))]
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let path = self.path_for(key)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(self, value), fields(root = %self.root.display(), value_len = value.len()))]
    async fn set(&self, key: &str, value: String) -> StorageResult<()> {
        let path = self.path_for(key)?;
        let temp_path = self
            .root
            .join(format!(".{}.{}.tmp", file_name_for_key(key), Uuid::new_v4()));

        let write_result = async {
            let mut file = tokio::fs::File::create(&temp_path).await?;
            file.write_all(value.as_bytes()).await?;
            file.sync_all().await?;
            tokio::fs::rename(&temp_path, &path).await
        }
        .await;

        if let Err(e) = write_result {
            warn!(error = %e, "Write failed, discarding temporary file");
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        debug!(path = %path.display(), "Value written");
        Ok(())
    }

    #[instrument(skip(self), fields(root = %self.root.display()))]
    async fn delete(&self, key: &str) -> StorageResult<()> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
