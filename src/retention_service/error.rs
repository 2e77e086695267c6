use thiserror::Error;

use crate::remote_store::StoreError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot list snapshots: {0}")]
    List(StoreError),
}
