pub mod error;

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::{
    context::RunContext,
    remote_store::RemoteEntry,
    report::{ItemKind, ItemOutcome},
    snapshot_service::parse_snapshot_name,
};
use self::error::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    pub days_to_keep: u32,
}

impl RetentionPolicy {
    pub fn new(days_to_keep: u32) -> Self {
        Self { days_to_keep }
    }

    ///
    /// A snapshot expires once it is `days_to_keep` days old, the boundary day included
    ///
    pub fn is_expired(&self, age_days: i64) -> bool {
        age_days >= i64::from(self.days_to_keep)
    }
}

///
/// Deletes dated snapshots that fall outside the retention window
///
pub struct RetentionPruner<'a> {
    ctx: &'a RunContext<'a>,
}

impl<'a> RetentionPruner<'a> {
    pub fn new(ctx: &'a RunContext<'a>) -> Self {
        Self { ctx }
    }

    ///
    /// Removes every expired snapshot directly under `backup_root_id`, oldest first.
    /// Folders whose names are not snapshot dates are left alone.
    ///
    pub async fn prune(&self, backup_root_id: &str, policy: RetentionPolicy) -> Result<Vec<ItemOutcome>> {
        info!("looking for old backups");
        let folders = self.ctx.store.list_folders(backup_root_id).await.map_err(Error::List)?;
        let today = self.ctx.clock.naive_local_now().date();

        let mut expired: Vec<(NaiveDate, RemoteEntry)> = folders.into_iter()
            .filter_map(|folder| match parse_snapshot_name(&folder.name) {
                Some(date) => Some((date, folder)),
                None => {
                    debug!(name = %folder.name, "not a snapshot, ignoring");
                    None
                }
            })
            .filter(|(date, _)| policy.is_expired((today - *date).num_days()))
            .collect();
        expired.sort_by_key(|(date, _)| *date);

        let mut outcomes = Vec::with_capacity(expired.len());
        for (_, snapshot) in expired {
            let outcome = match self.ctx.store.delete(&snapshot.id).await {
                Ok(()) => ItemOutcome::ok(ItemKind::Prune, snapshot.name),
                Err(e) => ItemOutcome::error(ItemKind::Prune, snapshot.name, e),
            };
            outcomes.push(outcome.logged());
        }
        Ok(outcomes)
    }
}
