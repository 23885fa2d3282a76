pub mod json_file;
pub mod memory;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::model::item::{Person, Status, WorkItem};

/// Error type for repository operations
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("repository rejected the change: {0}")]
    Rejected(String),
    #[error("unknown item: {0}")]
    UnknownItem(String),
    #[error("malformed project data: {0}")]
    Malformed(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A partial update to one item — only the present fields change.
///
/// Structural fields (parent, position, level) travel here too so that
/// promote/demote/move commit as a single update.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub planned_start: Option<Option<NaiveDate>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub planned_end: Option<Option<NaiveDate>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_start: Option<Option<NaiveDate>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_end: Option<Option<NaiveDate>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignees: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deliverable_name: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deliverable_link: Option<Option<String>>,
    /// Reparent: outer None = untouched, inner None = become a root
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<crate::model::item::Level>,
    /// Sibling index under the (possibly new) parent; not an item field,
    /// consumed by stores that keep sibling order
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<usize>,
}

impl ItemPatch {
    /// Snapshot every patchable field of `item` — the shape used both
    /// for full commits and for rollback snapshots.
    pub fn full(item: &WorkItem) -> Self {
        ItemPatch {
            name: Some(item.name.clone()),
            description: Some(item.description.clone()),
            planned_start: Some(item.planned_start),
            planned_end: Some(item.planned_end),
            actual_start: Some(item.actual_start),
            actual_end: Some(item.actual_end),
            progress: Some(item.progress),
            weight: Some(item.weight),
            status: Some(item.status),
            assignees: Some(item.assignees.clone()),
            deliverable_name: Some(item.deliverable_name.clone()),
            deliverable_link: Some(item.deliverable_link.clone()),
            parent: Some(item.parent.clone()),
            level: Some(item.level),
            position: None,
        }
    }

    /// Apply this patch to an item in place
    pub fn apply(&self, item: &mut WorkItem) {
        if let Some(v) = &self.name {
            item.name = v.clone();
        }
        if let Some(v) = &self.description {
            item.description = v.clone();
        }
        if let Some(v) = self.planned_start {
            item.planned_start = v;
        }
        if let Some(v) = self.planned_end {
            item.planned_end = v;
        }
        if let Some(v) = self.actual_start {
            item.actual_start = v;
        }
        if let Some(v) = self.actual_end {
            item.actual_end = v;
        }
        if let Some(v) = self.progress {
            item.progress = v;
        }
        if let Some(v) = self.weight {
            item.weight = v;
        }
        if let Some(v) = self.status {
            item.status = v;
        }
        if let Some(v) = &self.assignees {
            item.assignees = v.clone();
        }
        if let Some(v) = &self.deliverable_name {
            item.deliverable_name = v.clone();
        }
        if let Some(v) = &self.deliverable_link {
            item.deliverable_link = v.clone();
        }
        if let Some(v) = &self.parent {
            item.parent = v.clone();
        }
        if let Some(v) = self.level {
            item.level = v;
        }
    }
}

/// Backing store for work items. The core assembles its tree from the
/// flat list `load` returns and commits every local mutation through
/// `create`/`update`/`delete`; a rejection means the caller rolls its
/// local copy back.
pub trait ItemRepository {
    fn load(&self, project_id: &str) -> Result<Vec<WorkItem>, RepoError>;
    /// Persist a new item; returns the id the store assigned to it
    fn create(&mut self, item: &WorkItem) -> Result<String, RepoError>;
    fn update(&mut self, id: &str, patch: &ItemPatch) -> Result<(), RepoError>;
    fn delete(&mut self, id: &str) -> Result<(), RepoError>;
}

/// Error type for task registration
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("only L4 items can be registered as tasks (got {0})")]
    NotSchedulable(String),
    #[error("task registration failed: {0}")]
    Failed(String),
}

/// Registers an L4 item as a schedulable work unit. Opaque to the core
/// beyond success or failure.
pub trait TaskRegistry {
    fn register_as_task(&mut self, item: &WorkItem) -> Result<(), RegistryError>;
}

/// Read-only source of assignable people
pub trait PersonDirectory {
    fn list(&self, project_id: &str) -> Result<Vec<Person>, RepoError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::item::Level;

    #[test]
    fn full_patch_round_trips_every_field() {
        let mut item = WorkItem::new("w1", Level::Level4, "leaf");
        item.planned_start = Some("2026-04-01".parse().unwrap());
        item.planned_end = Some("2026-04-10".parse().unwrap());
        item.progress = 40;
        item.assignees = vec!["p1".to_string()];
        item.deliverable_name = Some("report".to_string());

        let snapshot = ItemPatch::full(&item);
        let mut other = WorkItem::new("w1", Level::Level4, "different");
        snapshot.apply(&mut other);
        assert_eq!(item, other);
    }

    #[test]
    fn empty_patch_changes_nothing() {
        let mut item = WorkItem::new("w1", Level::Level4, "leaf");
        item.progress = 40;
        let before = item.clone();
        ItemPatch::default().apply(&mut item);
        assert_eq!(before, item);
    }

    #[test]
    fn patch_can_null_a_date() {
        let mut item = WorkItem::new("w1", Level::Level4, "leaf");
        item.planned_end = Some("2026-04-10".parse().unwrap());
        let patch = ItemPatch {
            planned_end: Some(None),
            ..Default::default()
        };
        patch.apply(&mut item);
        assert_eq!(item.planned_end, None);
    }
}
