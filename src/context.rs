use std::{path::PathBuf, sync::{Mutex, MutexGuard, PoisonError}};

use crate::{
    config::Config,
    mirror_service::folder_cache::FolderCache,
    remote_store::RemoteStore,
    time_provider::TimeProvider,
};

///
/// Everything one run needs, built once and handed to each component by reference
///
pub struct RunContext<'a> {
    pub config: &'a Config,
    pub local_roots: Vec<PathBuf>,
    pub store: &'a dyn RemoteStore,
    pub clock: &'a dyn TimeProvider,
    folder_cache: Mutex<FolderCache>,
}

impl<'a> RunContext<'a> {
    pub fn new(
        config: &'a Config,
        local_roots: Vec<PathBuf>,
        store: &'a dyn RemoteStore,
        clock: &'a dyn TimeProvider,
    ) -> Self {
        Self {
            config,
            local_roots,
            store,
            clock,
            folder_cache: Mutex::new(FolderCache::new(config.folder_cache)),
        }
    }

    ///
    /// Locks the run's folder cache. Never hold the guard across an `.await`.
    ///
    pub fn folder_cache(&self) -> MutexGuard<'_, FolderCache> {
        self.folder_cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
