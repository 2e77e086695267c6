use thiserror::Error;

use crate::remote_store::StoreError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot check for snapshot {0}: {1}")]
    List(String, StoreError),
    #[error("cannot create snapshot {0}: {1}")]
    Create(String, StoreError),
}
