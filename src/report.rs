use std::fmt::{self, Display};

use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Folder,
    Upload,
    Prune,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemStatus {
    Ok,
    Skipped,
    Error(String),
}

///
/// The result of a single file, folder or snapshot operation.
/// Per-item faults end up here instead of aborting the run.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemOutcome {
    pub kind: ItemKind,
    pub subject: String,
    pub status: ItemStatus,
}

impl ItemOutcome {
    pub fn ok(kind: ItemKind, subject: impl Into<String>) -> Self {
        Self { kind, subject: subject.into(), status: ItemStatus::Ok }
    }

    pub fn skipped(kind: ItemKind, subject: impl Into<String>) -> Self {
        Self { kind, subject: subject.into(), status: ItemStatus::Skipped }
    }

    pub fn error(kind: ItemKind, subject: impl Into<String>, err: impl Display) -> Self {
        Self { kind, subject: subject.into(), status: ItemStatus::Error(err.to_string()) }
    }

    /// Emits the outcome as it happens, then hands it back for the report
    pub fn logged(self) -> Self {
        match &self.status {
            ItemStatus::Ok => info!(kind = ?self.kind, "{}\tOK", self.subject),
            ItemStatus::Skipped => info!(kind = ?self.kind, "{}\tSKIPPED", self.subject),
            ItemStatus::Error(e) => error!(kind = ?self.kind, "{}\tERROR: {}", self.subject, e),
        }
        self
    }
}

impl Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemStatus::Ok => write!(f, "OK"),
            ItemStatus::Skipped => write!(f, "SKIPPED"),
            ItemStatus::Error(e) => write!(f, "ERROR: {}", e),
        }
    }
}

impl Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ItemKind::Folder => "folder",
            ItemKind::Upload => "upload",
            ItemKind::Prune => "prune",
        };
        f.pad(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotOutcome {
    Created { name: String, id: String },
    AlreadyExists { name: String },
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub items: Vec<ItemOutcome>,
    pub snapshot: Option<SnapshotOutcome>,
}

impl RunReport {
    pub fn ok_count(&self) -> usize {
        self.items.iter().filter(|i| i.status == ItemStatus::Ok).count()
    }

    pub fn skipped_count(&self) -> usize {
        self.items.iter().filter(|i| i.status == ItemStatus::Skipped).count()
    }

    pub fn error_count(&self) -> usize {
        self.items.iter().filter(|i| matches!(i.status, ItemStatus::Error(_))).count()
    }

    pub fn is_partial(&self) -> bool {
        self.error_count() > 0
    }
}

impl Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for item in &self.items {
            writeln!(f, "{:<7} {}\t{}", item.kind, item.subject, item.status)?;
        }
        match &self.snapshot {
            Some(SnapshotOutcome::Created { name, .. }) => writeln!(f, "\nSnapshot {} created", name)?,
            Some(SnapshotOutcome::AlreadyExists { name }) => writeln!(f, "\nSnapshot {} already exists, nothing uploaded", name)?,
            None => {}
        }
        writeln!(f, "_________________")?;
        if self.is_partial() {
            write!(f, "BACKUP COMPLETED WITH ERRORS ({} ok, {} skipped, {} failed)",
                self.ok_count(), self.skipped_count(), self.error_count())
        } else {
            write!(f, "BACKUP COMPLETED ({} ok, {} skipped)", self.ok_count(), self.skipped_count())
        }
    }
}
