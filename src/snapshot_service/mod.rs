pub mod error;

use std::path::PathBuf;

use chrono::NaiveDate;
use tracing::info;

use crate::{
    context::RunContext,
    mirror_service::FolderMirror,
    report::{ItemOutcome, SnapshotOutcome},
};
use self::error::*;

/// Snapshot folders are named after the day they were taken, `DD-MM-YYYY`
pub const SNAPSHOT_DATE_FORMAT: &str = "%d-%m-%Y";

pub fn snapshot_name(date: NaiveDate) -> String {
    date.format(SNAPSHOT_DATE_FORMAT).to_string()
}

///
/// Reads a folder name as a snapshot date. Anything else is not a snapshot.
///
pub fn parse_snapshot_name(name: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(name, SNAPSHOT_DATE_FORMAT).ok()
}

///
/// Takes today's snapshot, at most once per calendar day
///
pub struct SnapshotPlanner<'a> {
    ctx: &'a RunContext<'a>,
}

impl<'a> SnapshotPlanner<'a> {
    pub fn new(ctx: &'a RunContext<'a>) -> Self {
        Self { ctx }
    }

    ///
    /// Creates today's snapshot under `backup_root_id` and mirrors every local
    /// root into it, in order. If the snapshot already exists nothing is mirrored.
    ///
    pub async fn plan_and_run(&self, local_roots: &[PathBuf], backup_root_id: &str) -> Result<(SnapshotOutcome, Vec<ItemOutcome>)> {
        let name = snapshot_name(self.ctx.clock.naive_local_now().date());
        info!("BACKUP {}", name);

        let existing = self.ctx.store.find_folder(backup_root_id, &name).await
            .map_err(|e| Error::List(name.clone(), e))?;
        if existing.is_some() {
            info!(snapshot = %name, "snapshot already exists, nothing to do");
            return Ok((SnapshotOutcome::AlreadyExists { name }, Vec::new()));
        }

        let id = self.ctx.store.create_folder(&name, backup_root_id).await
            .map_err(|e| Error::Create(name.clone(), e))?;
        info!(snapshot = %name, id = %id, "created snapshot folder");

        let mirror = FolderMirror::new(self.ctx);
        let mut outcomes = Vec::new();
        for root in local_roots {
            outcomes.extend(mirror.mirror(root, &id).await);
        }

        Ok((SnapshotOutcome::Created { name, id }, outcomes))
    }
}
