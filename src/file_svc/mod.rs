pub mod error;

use std::path::{Path, PathBuf};

use glob::glob;
use tracing::{debug, warn};

use self::error::*;

///
/// A directory entry found while walking a local tree
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocalEntry {
    Directory(PathBuf),
    File { path: PathBuf, size: u64 },
    /// Listed but could not be inspected, e.g. a dangling symlink
    Unreadable { path: PathBuf, error: String },
}

///
/// Expands each configured root into the directories it names, in order.
/// A pattern without glob metacharacters must name an existing directory;
/// a glob keeps only the directories it matches and must match at least one.
/// Every result is canonicalized.
///
pub fn expand_dir_globs(patterns: impl Iterator<Item = String>) -> Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for ptn in patterns {
        let matches: Vec<PathBuf> = if !ptn.contains(['*', '?', '[']) {
            let path = PathBuf::from(&ptn);
            if !path.exists() {
                return Err(Error::NoMatch(ptn));
            }
            if !path.is_dir() {
                return Err(Error::NotADirectory(path));
            }
            vec![path]
        } else {
            let found: Vec<PathBuf> = glob(&ptn).map_err(|e| Error::Pattern(ptn.clone(), e))?
                .collect::<std::result::Result<_, _>>()?;
            found.into_iter().filter(|p| p.is_dir()).collect()
        };
        if matches.is_empty() {
            return Err(Error::NoMatch(ptn));
        }

        for path in matches {
            let path = std::fs::canonicalize(&path).map_err(|e| Error::Io(path.clone(), e))?;
            if path.file_name().is_none() {
                return Err(Error::Unnamed(path));
            }
            dirs.push(path);
        }
    }
    Ok(dirs)
}

///
/// Reads the immediate children of `dir`, sorted by name.
/// Symlinked files are followed; symlinked directories and special files are left out.
/// Entries that cannot be inspected are returned as `Unreadable`.
///
pub async fn read_local_dir(dir: &Path) -> std::io::Result<Vec<LocalEntry>> {
    let mut read_dir = tokio::fs::read_dir(dir).await?;
    let mut entries = Vec::new();

    while let Some(entry) = read_dir.next_entry().await? {
        let path = entry.path();
        let file_type = entry.file_type().await?;

        if file_type.is_dir() {
            entries.push(LocalEntry::Directory(path));
            continue;
        }

        let meta = match tokio::fs::metadata(&path).await {
            Ok(meta) => meta,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot stat entry");
                entries.push(LocalEntry::Unreadable { path, error: e.to_string() });
                continue;
            }
        };
        if meta.is_file() {
            entries.push(LocalEntry::File { path, size: meta.len() });
        } else {
            debug!(path = %path.display(), "not descending into linked directory or special file");
        }
    }

    entries.sort_by(|a, b| entry_path(a).cmp(entry_path(b)));
    Ok(entries)
}

fn entry_path(entry: &LocalEntry) -> &Path {
    match entry {
        LocalEntry::Directory(path) => path,
        LocalEntry::File { path, .. } => path,
        LocalEntry::Unreadable { path, .. } => path,
    }
}
