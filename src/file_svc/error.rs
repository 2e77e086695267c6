use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid pattern `{0}`: {1}")]
    Pattern(String, glob::PatternError),
    #[error(transparent)]
    Glob(#[from] glob::GlobError),
    #[error("`{0}` matches no directory")]
    NoMatch(String),
    #[error("{} is not a directory", .0.display())]
    NotADirectory(PathBuf),
    #[error("{} has no folder name", .0.display())]
    Unnamed(PathBuf),
    #[error("{}: {}", .0.display(), .1)]
    Io(PathBuf, std::io::Error),
}
