use chrono::NaiveDate;

use crate::gantt::DragCommit;
use crate::model::config::WeightMode;
use crate::model::item::{Level, Person, Status, WorkItem};
use crate::model::tree::{TreeError, WbsTree};
use crate::ops::bulk_ops::{self, AssignReport, RegisterReport};
use crate::ops::level_ops::{self, EditError};
use crate::ops::rollup;
use crate::repo::{ItemPatch, ItemRepository, PersonDirectory, RepoError, TaskRegistry};

/// Error type for session operations: a local edit that failed its
/// validation, or a repository that refused the commit (in which case
/// the local tree has already been rolled back).
#[derive(Debug, thiserror::Error)]
pub enum CommitError {
    #[error(transparent)]
    Edit(#[from] EditError),
    #[error(transparent)]
    Tree(#[from] TreeError),
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error("{0}: dates and progress are derived from children; edit the leaves")]
    DerivedField(String),
    #[error("progress must be 0-100 (got {0})")]
    ProgressRange(u8),
    #[error("weight must be 1-100 (got {0})")]
    WeightRange(u8),
    #[error("planned start {0} is after planned end {1}")]
    InvertedDates(NaiveDate, NaiveDate),
    #[error("the store rejected a structural edit and undoing it failed ({0}); reload the project")]
    StoreDesync(String),
}

/// Parent, level, and sibling position of `id` exactly as `tree` holds
/// them, as a repository patch
fn placement_patch(tree: &WbsTree, id: &str) -> Option<ItemPatch> {
    let item = tree.get(id)?;
    let siblings = match &item.parent {
        Some(pid) => tree.children_of(pid),
        None => tree.roots(),
    };
    let position = siblings.iter().position(|s| s == id).unwrap_or(0);
    Some(ItemPatch {
        parent: Some(item.parent.clone()),
        level: Some(item.level),
        position: Some(position),
        ..Default::default()
    })
}

/// One open project: the hydrated tree plus the repository it came
/// from.
///
/// Every mutation is optimistic — the tree changes first, derived
/// fields re-roll, and the change is then committed through the
/// repository. A rejected commit rolls the tree back to its previous
/// state, so the session never drifts from what the caller can see.
pub struct Session<R: ItemRepository> {
    repo: R,
    tree: WbsTree,
    project_id: String,
    weight_mode: WeightMode,
}

impl<R: ItemRepository> Session<R> {
    /// Load the project's flat item list, assemble the tree, and roll
    /// up every derived field.
    pub fn open(repo: R, project_id: &str, weight_mode: WeightMode) -> Result<Self, CommitError> {
        let flat = repo.load(project_id)?;
        let mut tree = WbsTree::from_flat(flat)?;
        rollup::rollup_all(&mut tree);
        Ok(Session {
            repo,
            tree,
            project_id: project_id.to_string(),
            weight_mode,
        })
    }

    pub fn tree(&self) -> &WbsTree {
        &self.tree
    }

    pub fn repo(&self) -> &R {
        &self.repo
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn weight_mode(&self) -> WeightMode {
        self.weight_mode
    }

    /// Weighted progress over the Level1 roots, in percent
    pub fn project_progress(&self) -> u32 {
        rollup::project_progress(&self.tree, self.weight_mode)
    }

    // -----------------------------------------------------------------
    // Field edits
    // -----------------------------------------------------------------

    /// Set or clear a leaf's planned window
    pub fn set_schedule(
        &mut self,
        id: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<(), CommitError> {
        self.require_leaf(id)?;
        if let (Some(s), Some(e)) = (start, end)
            && s > e
        {
            return Err(CommitError::InvertedDates(s, e));
        }
        self.commit_field(
            id,
            ItemPatch {
                planned_start: Some(start),
                planned_end: Some(end),
                ..Default::default()
            },
        )
    }

    /// Record when work actually started / finished
    pub fn set_actual(
        &mut self,
        id: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<(), CommitError> {
        if let (Some(s), Some(e)) = (start, end)
            && s > e
        {
            return Err(CommitError::InvertedDates(s, e));
        }
        self.commit_field(
            id,
            ItemPatch {
                actual_start: Some(start),
                actual_end: Some(end),
                ..Default::default()
            },
        )
    }

    pub fn set_progress(&mut self, id: &str, progress: u8) -> Result<(), CommitError> {
        self.require_leaf(id)?;
        if progress > 100 {
            return Err(CommitError::ProgressRange(progress));
        }
        self.commit_field(
            id,
            ItemPatch {
                progress: Some(progress),
                ..Default::default()
            },
        )
    }

    pub fn set_status(&mut self, id: &str, status: Status) -> Result<(), CommitError> {
        self.commit_field(
            id,
            ItemPatch {
                status: Some(status),
                ..Default::default()
            },
        )
    }

    /// Set an L1 item's share of project progress
    pub fn set_weight(&mut self, id: &str, weight: u8) -> Result<(), CommitError> {
        if weight == 0 || weight > 100 {
            return Err(CommitError::WeightRange(weight));
        }
        let level = self
            .tree
            .get(id)
            .map(|i| i.level)
            .ok_or_else(|| EditError::NotFound(id.to_string()))?;
        if level != Level::Level1 {
            return Err(EditError::InvalidLevel(format!(
                "weight applies to L1 items only (got {})",
                level
            ))
            .into());
        }
        self.commit_field(
            id,
            ItemPatch {
                weight: Some(weight),
                ..Default::default()
            },
        )
    }

    pub fn rename(&mut self, id: &str, name: &str) -> Result<(), CommitError> {
        self.commit_field(
            id,
            ItemPatch {
                name: Some(name.to_string()),
                ..Default::default()
            },
        )
    }

    pub fn set_description(&mut self, id: &str, description: Option<String>) -> Result<(), CommitError> {
        self.commit_field(
            id,
            ItemPatch {
                description: Some(description),
                ..Default::default()
            },
        )
    }

    pub fn set_deliverable(
        &mut self,
        id: &str,
        name: Option<String>,
        link: Option<String>,
    ) -> Result<(), CommitError> {
        self.commit_field(
            id,
            ItemPatch {
                deliverable_name: Some(name),
                deliverable_link: Some(link),
                ..Default::default()
            },
        )
    }

    /// Apply a finished timeline gesture. The controller guarantees the
    /// target was a dated leaf when the gesture began.
    pub fn commit_drag(&mut self, commit: &DragCommit) -> Result<(), CommitError> {
        self.require_leaf(&commit.item_id)?;
        self.commit_field(
            &commit.item_id,
            ItemPatch {
                planned_start: Some(Some(commit.start)),
                planned_end: Some(Some(commit.end)),
                ..Default::default()
            },
        )
    }

    // -----------------------------------------------------------------
    // Structural edits
    // -----------------------------------------------------------------

    /// Create a new leaf under `parent` (or a new root). The repository
    /// assigns the id, so this one runs create-first rather than
    /// optimistically.
    pub fn add_child(
        &mut self,
        parent: Option<&str>,
        level: Level,
        name: &str,
    ) -> Result<String, CommitError> {
        level_ops::check_placement(&self.tree, parent, level)?;
        let mut item = WorkItem::new(self.tree.next_id(), level, name);
        item.parent = parent.map(str::to_string);

        let id = self.repo.create(&item)?;
        item.id = id.clone();
        let dirty = match self.tree.insert(parent, item) {
            Ok(dirty) => dirty,
            Err(e) => {
                // keep the store consistent with the tree we refused
                let _ = self.repo.delete(&id);
                return Err(e.into());
            }
        };
        rollup::refresh(&mut self.tree, &dirty);
        Ok(id)
    }

    /// Move `id` up one level (with its whole subtree)
    pub fn promote(&mut self, id: &str) -> Result<(), CommitError> {
        let snapshot = self.tree.clone();
        let dirty = level_ops::promote(&mut self.tree, id)?;
        rollup::refresh(&mut self.tree, &dirty);
        self.commit_structure(snapshot, id)
    }

    /// Move `id` down one level, under its preceding sibling
    pub fn demote(&mut self, id: &str) -> Result<(), CommitError> {
        let snapshot = self.tree.clone();
        let dirty = level_ops::demote(&mut self.tree, id)?;
        rollup::refresh(&mut self.tree, &dirty);
        self.commit_structure(snapshot, id)
    }

    /// Reparent/reorder `id` at its own level
    pub fn move_item(
        &mut self,
        id: &str,
        new_parent: Option<&str>,
        new_index: usize,
    ) -> Result<(), CommitError> {
        let snapshot = self.tree.clone();
        let dirty = self.tree.move_item(id, new_parent, new_index)?;
        rollup::refresh(&mut self.tree, &dirty);
        self.commit_structure(snapshot, id)
    }

    /// Delete `id` and its whole subtree. Returns the removed ids.
    pub fn delete(&mut self, id: &str) -> Result<Vec<String>, CommitError> {
        let snapshot = self.tree.clone();
        let (removed, dirty) = level_ops::delete(&mut self.tree, id)?;
        rollup::refresh(&mut self.tree, &dirty);
        if let Err(e) = self.repo.delete(id) {
            self.tree = snapshot;
            return Err(e.into());
        }
        Ok(removed)
    }

    // -----------------------------------------------------------------
    // Bulk operations
    // -----------------------------------------------------------------

    /// Assign every person to every item (set union), committing item
    /// by item. A rejected commit rolls back the not-yet-committed
    /// local changes; items committed before it stay assigned.
    pub fn assign(
        &mut self,
        item_ids: &[String],
        person_ids: &[String],
    ) -> Result<AssignReport, CommitError> {
        let before: Vec<(String, Vec<String>)> = item_ids
            .iter()
            .filter_map(|id| self.tree.get(id).map(|i| (id.clone(), i.assignees.clone())))
            .collect();

        let report = bulk_ops::assign(&mut self.tree, item_ids, person_ids)?;
        for (idx, id) in report.changed.iter().enumerate() {
            let assignees = self
                .tree
                .get(id)
                .map(|i| i.assignees.clone())
                .unwrap_or_default();
            let patch = ItemPatch {
                assignees: Some(assignees),
                ..Default::default()
            };
            if let Err(e) = self.repo.update(id, &patch) {
                for uncommitted in &report.changed[idx..] {
                    if let Some((_, old)) = before.iter().find(|(bid, _)| bid == uncommitted)
                        && let Some(item) = self.tree.item_mut(uncommitted)
                    {
                        item.assignees = old.clone();
                    }
                }
                return Err(e.into());
            }
        }
        Ok(report)
    }

    /// Register each L4 item in the selection as a schedulable task.
    /// The tree itself is untouched.
    pub fn register_tasks(&mut self, item_ids: &[String]) -> Result<RegisterReport, CommitError>
    where
        R: TaskRegistry,
    {
        Ok(bulk_ops::register(&self.tree, item_ids, &mut self.repo)?)
    }

    pub fn people(&self) -> Result<Vec<Person>, CommitError>
    where
        R: PersonDirectory,
    {
        Ok(self.repo.list(&self.project_id)?)
    }

    // -----------------------------------------------------------------
    // Commit plumbing
    // -----------------------------------------------------------------

    fn require_leaf(&self, id: &str) -> Result<(), CommitError> {
        let item = self
            .tree
            .get(id)
            .ok_or_else(|| EditError::NotFound(id.to_string()))?;
        if !item.is_leaf() {
            return Err(CommitError::DerivedField(id.to_string()));
        }
        Ok(())
    }

    /// Apply `patch` to the tree, re-roll the ancestor chain, and
    /// commit. On rejection the item and its ancestors are restored
    /// from a snapshot taken before the edit.
    fn commit_field(&mut self, id: &str, patch: ItemPatch) -> Result<(), CommitError> {
        let snapshot = self
            .tree
            .get(id)
            .map(ItemPatch::full)
            .ok_or_else(|| EditError::NotFound(id.to_string()))?;

        if let Some(item) = self.tree.item_mut(id) {
            patch.apply(item);
        }
        rollup::recompute_upward(&mut self.tree, id);

        if let Err(e) = self.repo.update(id, &patch) {
            if let Some(item) = self.tree.item_mut(id) {
                snapshot.apply(item);
            }
            rollup::recompute_upward(&mut self.tree, id);
            return Err(e.into());
        }
        Ok(())
    }

    /// Commit a structural edit that already happened in the tree: one
    /// patch carrying the moved item's parent, level, and sibling
    /// position, then level-only patches for its descendants. A
    /// rejection restores the pre-edit tree wholesale and undoes any
    /// patch the store already took, so the store never keeps half of
    /// a structural edit.
    fn commit_structure(&mut self, snapshot: WbsTree, id: &str) -> Result<(), CommitError> {
        let Some(moved) = placement_patch(&self.tree, id) else {
            self.tree = snapshot;
            return Err(EditError::NotFound(id.to_string()).into());
        };
        let mut updates = vec![(id.to_string(), moved)];
        for did in self.tree.descendants_of(id) {
            if let Some(d) = self.tree.get(&did) {
                updates.push((
                    did.clone(),
                    ItemPatch {
                        level: Some(d.level),
                        ..Default::default()
                    },
                ));
            }
        }

        for (idx, (uid, patch)) in updates.iter().enumerate() {
            if let Err(e) = self.repo.update(uid, patch) {
                for (done, _) in &updates[..idx] {
                    let Some(undo) = placement_patch(&snapshot, done) else {
                        continue;
                    };
                    if let Err(undo_err) = self.repo.update(done, &undo) {
                        self.tree = snapshot;
                        return Err(CommitError::StoreDesync(undo_err.to_string()));
                    }
                }
                self.tree = snapshot;
                return Err(e.into());
            }
        }
        Ok(())
    }
}
