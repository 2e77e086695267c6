pub mod error;

use tracing::{info, warn};

use crate::{
    context::RunContext,
    mirror_service::folder_cache::CacheKeying,
    remote_store::RemoteStore,
    report::RunReport,
    retention_service::{RetentionPolicy, RetentionPruner},
    snapshot_service::SnapshotPlanner,
};
use self::error::*;

pub const DEFAULT_ROOT_NAME: &str = "BACKUP";

///
/// One backup invocation: verify the backup root, prune expired snapshots,
/// then take today's snapshot. Nothing is retried; re-running is safe.
///
pub struct BackupRun<'a> {
    ctx: &'a RunContext<'a>,
}

impl<'a> BackupRun<'a> {
    pub fn new(ctx: &'a RunContext<'a>) -> Self {
        Self { ctx }
    }

    pub async fn run(&self) -> Result<RunReport> {
        let config = self.ctx.config;
        let root_id = config.backup_root_id.as_str();

        if config.folder_cache == CacheKeying::ByName {
            warn!("folder_cache is by_name: same-named folders anywhere in a tree are merged into one remote folder");
        }
        if config.days_to_keep == 0 {
            warn!("days_to_keep is 0: every existing snapshot, today's included, will be pruned");
        }

        self.verify_root(root_id).await?;

        let mut report = RunReport::default();
        let policy = RetentionPolicy::new(config.days_to_keep);
        report.items.extend(RetentionPruner::new(self.ctx).prune(root_id, policy).await?);

        let (snapshot, items) = SnapshotPlanner::new(self.ctx)
            .plan_and_run(&self.ctx.local_roots, root_id)
            .await?;
        report.items.extend(items);
        report.snapshot = Some(snapshot);

        info!(
            ok = report.ok_count(),
            skipped = report.skipped_count(),
            failed = report.error_count(),
            "backup run finished"
        );
        Ok(report)
    }

    async fn verify_root(&self, root_id: &str) -> Result<()> {
        info!(root_id, "checking backup folder");
        match self.ctx.store.get_folder(root_id).await {
            Ok(Some(_)) => Ok(()),
            Ok(None) => Err(Error::RootNotFound(root_id.to_string())),
            Err(e) => Err(Error::RootLookup(root_id.to_string(), e)),
        }
    }
}

///
/// Finds or creates the folder `name` at the top of the store, returning its id.
/// Used once, when a new configuration is written.
///
pub async fn init_backup_root(store: &dyn RemoteStore, name: &str) -> Result<String> {
    let root = store.root_id();
    let existing = store.find_folder(&root, name).await
        .map_err(|e| Error::Setup(name.to_string(), e))?;
    match existing {
        Some(folder) => {
            info!(name, id = %folder.id, "using existing backup folder");
            Ok(folder.id)
        }
        None => {
            let id = store.create_folder(name, &root).await
                .map_err(|e| Error::Setup(name.to_string(), e))?;
            info!(name, id = %id, "created backup folder");
            Ok(id)
        }
    }
}
