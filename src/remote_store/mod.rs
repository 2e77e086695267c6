pub mod drive;
pub mod drive_auth;
pub mod error;
pub mod local;

use std::path::Path;

use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

pub use error::{Result, StoreError};

use crate::config::StoreConfig;
use self::{drive::DriveStore, local::LocalStore};

///
/// An object held by the remote store, as returned by a listing.
///
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoteEntry {
    pub id: String,
    pub name: String,
    pub is_folder: bool,
}

impl RemoteEntry {
    pub fn folder(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self { id: id.into(), name: name.into(), is_folder: true }
    }
}

///
/// The hierarchical object store snapshots are written to.
/// Implementations never return trashed objects.
///
#[cfg_attr(test, automock)]
#[async_trait]
pub trait RemoteStore : Send + Sync {
    ///
    /// Id of the store's own top-level folder
    ///
    fn root_id(&self) -> String;
    ///
    /// Retrieves the folder with the given `id`, if it exists
    ///
    async fn get_folder(&self, id: &str) -> Result<Option<RemoteEntry>>;
    ///
    /// Lists every folder directly under the folder with the given `parent_id`
    ///
    async fn list_folders(&self, parent_id: &str) -> Result<Vec<RemoteEntry>>;
    ///
    /// Finds a folder named exactly `name` directly under `parent_id`
    ///
    async fn find_folder(&self, parent_id: &str, name: &str) -> Result<Option<RemoteEntry>>;
    ///
    /// Creates a folder with the provided `name` under `parent_id`, returning its id
    ///
    async fn create_folder(&self, name: &str, parent_id: &str) -> Result<String>;
    ///
    /// Uploads the file at `local_path` as `name` into the folder `parent_id`,
    /// returning the id of the new remote file
    ///
    async fn upload_file(&self, local_path: &Path, name: &str, parent_id: &str) -> Result<String>;
    ///
    /// Deletes the object with the given `id`. Folders are removed with their contents.
    ///
    async fn delete(&self, id: &str) -> Result<()>;
}

///
/// Opens the store named by the configuration. Drive credentials are read here.
///
pub async fn open(config: &StoreConfig) -> Result<Box<dyn RemoteStore>> {
    Ok(match config {
        StoreConfig::GoogleDrive(settings) => Box::new(DriveStore::connect(settings).await?),
        StoreConfig::Local { path } => Box::new(LocalStore::new(path)),
    })
}
