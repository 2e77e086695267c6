use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio_util::bytes::BytesMut;
use tracing::debug;

use super::{RemoteEntry, RemoteStore, Result, StoreError};

///
/// A `RemoteStore` backed by a plain directory (a mounted drive, a NAS share).
/// Ids are `/`-separated paths relative to `base_path`, the empty id being the root.
///
pub struct LocalStore {
    base_path: PathBuf,
}

impl LocalStore {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self { base_path: base_path.into() }
    }

    fn resolve(&self, id: &str) -> Result<PathBuf> {
        let rel = Path::new(id);
        if !rel.components().all(|c| matches!(c, Component::Normal(_))) {
            return Err(StoreError::InvalidId(id.to_string()));
        }
        Ok(self.base_path.join(rel))
    }

    fn child_id(parent_id: &str, name: &str) -> Result<String> {
        if name.is_empty() || name.contains('/') || name == "." || name == ".." {
            return Err(StoreError::InvalidId(name.to_string()));
        }
        Ok(if parent_id.is_empty() { name.to_string() } else { format!("{}/{}", parent_id, name) })
    }
}

#[async_trait]
impl RemoteStore for LocalStore {
    fn root_id(&self) -> String {
        String::new()
    }

    async fn get_folder(&self, id: &str) -> Result<Option<RemoteEntry>> {
        let path = self.resolve(id)?;
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_dir() => {
                let name = id.rsplit('/').next().unwrap_or_default();
                Ok(Some(RemoteEntry::folder(id, name)))
            }
            Ok(_) => Ok(None),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn list_folders(&self, parent_id: &str) -> Result<Vec<RemoteEntry>> {
        let mut dir = tokio::fs::read_dir(self.resolve(parent_id)?).await?;
        let mut folders = Vec::new();
        while let Some(entry) = dir.next_entry().await? {
            if !entry.file_type().await?.is_dir() { continue; }
            // Names that are not valid UTF-8 cannot be addressed by id
            let Ok(name) = entry.file_name().into_string() else { continue; };
            folders.push(RemoteEntry::folder(Self::child_id(parent_id, &name)?, name));
        }
        folders.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(folders)
    }

    async fn find_folder(&self, parent_id: &str, name: &str) -> Result<Option<RemoteEntry>> {
        let id = Self::child_id(parent_id, name)?;
        Ok(self.get_folder(&id).await?.map(|f| RemoteEntry { name: name.to_string(), ..f }))
    }

    async fn create_folder(&self, name: &str, parent_id: &str) -> Result<String> {
        let id = Self::child_id(parent_id, name)?;
        tokio::fs::create_dir(self.resolve(&id)?).await?;
        Ok(id)
    }

    async fn upload_file(&self, local_path: &Path, name: &str, parent_id: &str) -> Result<String> {
        let id = Self::child_id(parent_id, name)?;
        let to_path = self.resolve(&id)?;

        let from_file = tokio::fs::OpenOptions::new().read(true).open(local_path).await?;
        let mut from_file = BufReader::new(from_file);
        let to_file = tokio::fs::OpenOptions::new().write(true).create(true).truncate(true).open(&to_path).await?;
        let mut to_file = BufWriter::new(to_file);

        let mut bytes = BytesMut::with_capacity(64 * 1024);
        while from_file.read_buf(&mut bytes).await? > 0 {
            to_file.write_all(&bytes[..]).await?;
            bytes.clear();
        }
        to_file.flush().await?;

        debug!(path = %to_path.display(), "copied file into local store");
        Ok(id)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        if id.is_empty() {
            return Err(StoreError::InvalidId(id.to_string()));
        }
        let path = self.resolve(id)?;
        if tokio::fs::metadata(&path).await?.is_dir() {
            tokio::fs::remove_dir_all(path).await?;
        } else {
            tokio::fs::remove_file(path).await?;
        }
        Ok(())
    }
}
