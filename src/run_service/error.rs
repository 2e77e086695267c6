use thiserror::Error;

use crate::{remote_store::StoreError, retention_service, snapshot_service};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("backup folder {0} was not found on the remote store")]
    RootNotFound(String),
    #[error("cannot verify backup folder {0}: {1}")]
    RootLookup(String, StoreError),
    #[error(transparent)]
    Prune(#[from] retention_service::error::Error),
    #[error(transparent)]
    Snapshot(#[from] snapshot_service::error::Error),
    #[error("cannot set up backup folder {0}: {1}")]
    Setup(String, StoreError),
}
