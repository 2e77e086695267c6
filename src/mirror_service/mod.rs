pub mod folder_cache;

use std::path::Path;

use async_recursion::async_recursion;
use futures_util::{stream, StreamExt};
use tracing::{debug, info};

use crate::{
    context::RunContext,
    file_svc::{read_local_dir, LocalEntry},
    remote_store::{self, RemoteStore},
    report::{ItemKind, ItemOutcome},
};

///
/// Reproduces local directory trees as remote folders, uploading the files
/// found at each level. Folder and file faults are reported per item and
/// never stop the traversal.
///
pub struct FolderMirror<'a> {
    ctx: &'a RunContext<'a>,
}

impl<'a> FolderMirror<'a> {
    pub fn new(ctx: &'a RunContext<'a>) -> Self {
        Self { ctx }
    }

    ///
    /// Mirrors `local_root` as a child folder of `remote_parent_id`
    ///
    pub async fn mirror(&self, local_root: &Path, remote_parent_id: &str) -> Vec<ItemOutcome> {
        let mut outcomes = Vec::new();
        self.mirror_dir(local_root, remote_parent_id, &mut outcomes).await;
        outcomes
    }

    #[async_recursion]
    async fn mirror_dir(&self, dir: &Path, parent_id: &str, outcomes: &mut Vec<ItemOutcome>) {
        let subject = dir.display().to_string();
        let Some(name) = dir.file_name().and_then(|n| n.to_str()) else {
            outcomes.push(ItemOutcome::error(ItemKind::Folder, subject, "folder name is not valid UTF-8").logged());
            return;
        };
        info!(path = %subject, "uploading");

        let entries = match read_local_dir(dir).await {
            Ok(entries) => entries,
            Err(e) => {
                outcomes.push(ItemOutcome::error(ItemKind::Folder, subject, e).logged());
                return;
            }
        };
        let folder_id = match self.resolve_folder(name, parent_id).await {
            Ok(id) => id,
            Err(e) => {
                outcomes.push(ItemOutcome::error(ItemKind::Folder, subject, e).logged());
                return;
            }
        };

        let mut files = Vec::new();
        let mut sub_dirs = Vec::new();
        for entry in entries {
            match entry {
                LocalEntry::Directory(path) => sub_dirs.push(path),
                file => files.push(file),
            }
        }

        outcomes.extend(self.upload_files(files, &folder_id).await);
        for sub_dir in sub_dirs {
            self.mirror_dir(&sub_dir, &folder_id, outcomes).await;
        }
    }

    ///
    /// Gets the id of the folder `name` under `parent_id`: from the run's cache,
    /// else an existing remote folder, else a newly created one
    ///
    async fn resolve_folder(&self, name: &str, parent_id: &str) -> remote_store::Result<String> {
        let cached = self.ctx.folder_cache().get(parent_id, name);
        if let Some(id) = cached {
            debug!(name, parent_id, id = %id, "folder already resolved this run");
            return Ok(id);
        }

        let id = match self.ctx.store.find_folder(parent_id, name).await? {
            Some(existing) => existing.id,
            None => self.ctx.store.create_folder(name, parent_id).await?,
        };
        self.ctx.folder_cache().insert(parent_id, name, id.clone());
        Ok(id)
    }

    async fn upload_files(&self, files: Vec<LocalEntry>, folder_id: &str) -> Vec<ItemOutcome> {
        let store = self.ctx.store;
        stream::iter(files)
            .map(|file| upload_file(store, file, folder_id))
            .buffered(self.ctx.config.upload_concurrency.max(1))
            .collect()
            .await
    }
}

async fn upload_file(store: &dyn RemoteStore, file: LocalEntry, folder_id: &str) -> ItemOutcome {
    let (path, size) = match file {
        LocalEntry::File { path, size } => (path, size),
        LocalEntry::Unreadable { path, error } => {
            return ItemOutcome::error(ItemKind::Upload, path.display().to_string(), error).logged();
        }
        LocalEntry::Directory(path) => {
            return ItemOutcome::error(ItemKind::Upload, path.display().to_string(), "is a directory").logged();
        }
    };
    let subject = path.display().to_string();
    if size == 0 {
        return ItemOutcome::skipped(ItemKind::Upload, subject).logged();
    }
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return ItemOutcome::error(ItemKind::Upload, subject, "file name is not valid UTF-8").logged();
    };

    let outcome = match store.upload_file(&path, name, folder_id).await {
        Ok(_) => ItemOutcome::ok(ItemKind::Upload, subject),
        Err(e) => ItemOutcome::error(ItemKind::Upload, subject, e),
    };
    outcome.logged()
}
