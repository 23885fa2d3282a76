use indexmap::IndexMap;

use super::item::{Level, WorkItem};

/// Error type for structural tree operations
#[derive(Debug, thiserror::Error)]
pub enum TreeError {
    #[error("item not found: {0}")]
    NotFound(String),
    #[error("duplicate item id: {0}")]
    DuplicateId(String),
    #[error("level {child} cannot nest under level {parent}")]
    StructuralViolation { parent: Level, child: Level },
    #[error("only L1 items can be roots (got {0})")]
    RootLevel(Level),
    #[error("moving {0} under its own subtree would create a cycle")]
    Cycle(String),
    #[error("item {child} references unknown parent {parent}")]
    UnknownParent { child: String, parent: String },
}

/// The canonical in-memory WBS: an id-keyed arena of [`WorkItem`]s plus
/// an ordered root list.
///
/// All structural mutators validate level pairing and cycle-freeness
/// before touching anything, renumber codes afterwards, and return the
/// set of ancestor ids whose derived fields must be re-rolled. The tree
/// never talks to the repository.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WbsTree {
    items: IndexMap<String, WorkItem>,
    roots: Vec<String>,
}

impl WbsTree {
    pub fn new() -> Self {
        WbsTree::default()
    }

    /// Assemble a tree from the repository's flat item list.
    ///
    /// Sibling order is the order items appear in the list. Every
    /// parent reference must resolve, levels must pair correctly, and
    /// every item must be reachable from a root.
    pub fn from_flat(flat: Vec<WorkItem>) -> Result<Self, TreeError> {
        let mut tree = WbsTree::new();
        for mut item in flat {
            item.children.clear();
            if tree.items.contains_key(&item.id) {
                return Err(TreeError::DuplicateId(item.id));
            }
            tree.items.insert(item.id.clone(), item);
        }

        // Wire up children/roots in list order
        let ids: Vec<String> = tree.items.keys().cloned().collect();
        for id in &ids {
            let (level, parent) = {
                let item = &tree.items[id];
                (item.level, item.parent.clone())
            };
            match parent {
                None => {
                    if level != Level::Level1 {
                        return Err(TreeError::RootLevel(level));
                    }
                    tree.roots.push(id.clone());
                }
                Some(pid) => {
                    let parent_level = match tree.items.get(&pid) {
                        Some(p) => p.level,
                        None => {
                            return Err(TreeError::UnknownParent {
                                child: id.clone(),
                                parent: pid,
                            });
                        }
                    };
                    if parent_level.child() != Some(level) {
                        return Err(TreeError::StructuralViolation {
                            parent: parent_level,
                            child: level,
                        });
                    }
                    tree.items[&pid].children.push(id.clone());
                }
            }
        }

        tree.renumber();
        Ok(tree)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.items.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&WorkItem> {
        self.items.get(id)
    }

    /// Mutable access for the ops layer. Structural fields (parent,
    /// children, level, code) must not be edited through this.
    pub(crate) fn item_mut(&mut self, id: &str) -> Option<&mut WorkItem> {
        self.items.get_mut(id)
    }

    pub fn roots(&self) -> &[String] {
        &self.roots
    }

    pub fn children_of(&self, id: &str) -> &[String] {
        self.items.get(id).map_or(&[], |i| &i.children)
    }

    /// Ancestor ids from nearest parent to root
    pub fn ancestors_of(&self, id: &str) -> Vec<String> {
        let mut out = Vec::new();
        let mut cur = self.items.get(id).and_then(|i| i.parent.clone());
        while let Some(pid) = cur {
            if out.contains(&pid) {
                break; // malformed input; from_flat rejects this
            }
            cur = self.items.get(&pid).and_then(|i| i.parent.clone());
            out.push(pid);
        }
        out
    }

    /// Descendant ids in preorder, excluding `id` itself
    pub fn descendants_of(&self, id: &str) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_descendants(id, &mut out);
        out
    }

    fn collect_descendants(&self, id: &str, out: &mut Vec<String>) {
        for child in self.children_of(id).to_vec() {
            out.push(child.clone());
            self.collect_descendants(&child, out);
        }
    }

    /// All ids in display order (preorder over the root list)
    pub fn preorder(&self) -> Vec<String> {
        let mut out = Vec::new();
        for root in &self.roots {
            out.push(root.clone());
            self.collect_descendants(root, &mut out);
        }
        out
    }

    /// Allocate the next local item id ("w1", "w2", ...) by scanning
    /// for the highest existing numeric suffix.
    pub fn next_id(&self) -> String {
        let mut max = 0usize;
        for id in self.items.keys() {
            if let Some(num) = id.strip_prefix('w')
                && let Ok(n) = num.parse::<usize>()
                && n > max
            {
                max = n;
            }
        }
        format!("w{}", max + 1)
    }

    /// Insert `item` as the last child of `parent` (or as the last
    /// root). Returns the ancestor ids that need re-rollup.
    pub fn insert(&mut self, parent: Option<&str>, item: WorkItem) -> Result<Vec<String>, TreeError> {
        self.insert_at(parent, usize::MAX, item)
    }

    /// Insert `item` under `parent` at `index` (clamped to the end).
    pub fn insert_at(
        &mut self,
        parent: Option<&str>,
        index: usize,
        mut item: WorkItem,
    ) -> Result<Vec<String>, TreeError> {
        if self.items.contains_key(&item.id) {
            return Err(TreeError::DuplicateId(item.id));
        }
        match parent {
            None => {
                if item.level != Level::Level1 {
                    return Err(TreeError::RootLevel(item.level));
                }
            }
            Some(pid) => {
                let parent_level = self
                    .items
                    .get(pid)
                    .map(|p| p.level)
                    .ok_or_else(|| TreeError::NotFound(pid.to_string()))?;
                if parent_level.child() != Some(item.level) {
                    return Err(TreeError::StructuralViolation {
                        parent: parent_level,
                        child: item.level,
                    });
                }
            }
        }

        let id = item.id.clone();
        item.parent = parent.map(str::to_string);
        item.children.clear();
        self.items.insert(id.clone(), item);
        self.attach(&id, parent, index);
        self.renumber();
        Ok(self.ancestors_of(&id))
    }

    /// Remove `id` and its entire subtree. Returns the removed ids
    /// (preorder, `id` first) and the ancestors needing re-rollup.
    pub fn remove(&mut self, id: &str) -> Result<(Vec<String>, Vec<String>), TreeError> {
        if !self.items.contains_key(id) {
            return Err(TreeError::NotFound(id.to_string()));
        }
        let dirty = self.ancestors_of(id);
        let mut removed = vec![id.to_string()];
        removed.extend(self.descendants_of(id));

        self.detach(id);
        for rid in &removed {
            self.items.shift_remove(rid);
        }
        self.renumber();
        Ok((removed, dirty))
    }

    /// Reparent/reorder `id` under `new_parent` at `new_index`.
    ///
    /// The item keeps its level, so the destination parent must sit one
    /// level above it. Moving an item under itself or any of its
    /// descendants is rejected. Returns the union of old and new
    /// ancestor chains for re-rollup.
    pub fn move_item(
        &mut self,
        id: &str,
        new_parent: Option<&str>,
        new_index: usize,
    ) -> Result<Vec<String>, TreeError> {
        let level = self
            .items
            .get(id)
            .map(|i| i.level)
            .ok_or_else(|| TreeError::NotFound(id.to_string()))?;
        match new_parent {
            None => {
                if level != Level::Level1 {
                    return Err(TreeError::RootLevel(level));
                }
            }
            Some(pid) => {
                let parent_level = self
                    .items
                    .get(pid)
                    .map(|p| p.level)
                    .ok_or_else(|| TreeError::NotFound(pid.to_string()))?;
                if pid == id || self.descendants_of(id).iter().any(|d| d == pid) {
                    return Err(TreeError::Cycle(id.to_string()));
                }
                if parent_level.child() != Some(level) {
                    return Err(TreeError::StructuralViolation {
                        parent: parent_level,
                        child: level,
                    });
                }
            }
        }

        let mut dirty = self.ancestors_of(id);
        self.detach(id);
        self.attach(id, new_parent, new_index);
        self.renumber();
        for a in self.ancestors_of(id) {
            if !dirty.contains(&a) {
                dirty.push(a);
            }
        }
        Ok(dirty)
    }

    /// Unhook `id` from its parent's child list (or the root list).
    /// The item stays in the arena with a stale parent field until
    /// `attach` runs.
    pub(crate) fn detach(&mut self, id: &str) {
        let parent = self.items.get(id).and_then(|i| i.parent.clone());
        let list = match parent {
            Some(pid) => match self.items.get_mut(&pid) {
                Some(p) => &mut p.children,
                None => return,
            },
            None => &mut self.roots,
        };
        list.retain(|c| c != id);
    }

    /// Hook `id` under `parent` at `index` (clamped) and fix its parent
    /// field. Callers are responsible for level validity.
    pub(crate) fn attach(&mut self, id: &str, parent: Option<&str>, index: usize) {
        if let Some(item) = self.items.get_mut(id) {
            item.parent = parent.map(str::to_string);
        }
        let list = match parent {
            Some(pid) => match self.items.get_mut(pid) {
                Some(p) => &mut p.children,
                None => return,
            },
            None => &mut self.roots,
        };
        let index = index.min(list.len());
        list.insert(index, id.to_string());
    }

    /// Shift the level of `id` and its whole subtree by `delta`
    /// (depth-preserving). Callers must have checked the Level1/Level4
    /// bounds beforehand.
    pub(crate) fn shift_levels(&mut self, id: &str, delta: i8) {
        let mut ids = vec![id.to_string()];
        ids.extend(self.descendants_of(id));
        for sid in ids {
            if let Some(item) = self.items.get_mut(&sid) {
                let depth = (item.level.depth() as i8 + delta) as u8;
                if let Some(level) = Level::from_depth(depth) {
                    item.level = level;
                }
            }
        }
    }

    /// Recompute every code from tree position. Codes are a strict,
    /// gapless function of position, so re-running this on an unchanged
    /// tree produces identical codes.
    pub fn renumber(&mut self) {
        for (i, root) in self.roots.clone().into_iter().enumerate() {
            self.renumber_subtree(&root, &format!("{}", i + 1));
        }
    }

    fn renumber_subtree(&mut self, id: &str, code: &str) {
        let children = match self.items.get_mut(id) {
            Some(item) => {
                item.code = code.to_string();
                item.children.clone()
            }
            None => return,
        };
        for (i, child) in children.into_iter().enumerate() {
            self.renumber_subtree(&child, &format!("{}.{}", code, i + 1));
        }
    }

    /// Flatten the tree back into repository order (preorder)
    pub fn to_flat(&self) -> Vec<WorkItem> {
        self.preorder()
            .into_iter()
            .filter_map(|id| self.items.get(&id).cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn item(id: &str, level: Level, parent: Option<&str>) -> WorkItem {
        let mut it = WorkItem::new(id, level, format!("item {}", id));
        it.parent = parent.map(str::to_string);
        it
    }

    /// Two L1 roots; "a" has two L2 children, the first with an L3 child
    fn sample_tree() -> WbsTree {
        WbsTree::from_flat(vec![
            item("a", Level::Level1, None),
            item("b", Level::Level1, None),
            item("a1", Level::Level2, Some("a")),
            item("a2", Level::Level2, Some("a")),
            item("a1x", Level::Level3, Some("a1")),
        ])
        .unwrap()
    }

    #[test]
    fn hydration_builds_codes_and_order() {
        let tree = sample_tree();
        assert_eq!(tree.roots(), &["a".to_string(), "b".to_string()]);
        assert_eq!(tree.get("a").unwrap().code, "1");
        assert_eq!(tree.get("b").unwrap().code, "2");
        assert_eq!(tree.get("a1").unwrap().code, "1.1");
        assert_eq!(tree.get("a2").unwrap().code, "1.2");
        assert_eq!(tree.get("a1x").unwrap().code, "1.1.1");
    }

    #[test]
    fn hydration_rejects_unknown_parent() {
        let err = WbsTree::from_flat(vec![item("x", Level::Level2, Some("ghost"))]).unwrap_err();
        assert!(matches!(err, TreeError::UnknownParent { .. }));
    }

    #[test]
    fn hydration_rejects_non_l1_root() {
        let err = WbsTree::from_flat(vec![item("x", Level::Level3, None)]).unwrap_err();
        assert!(matches!(err, TreeError::RootLevel(Level::Level3)));
    }

    #[test]
    fn hydration_rejects_bad_level_pairing() {
        let err = WbsTree::from_flat(vec![
            item("a", Level::Level1, None),
            item("x", Level::Level3, Some("a")),
        ])
        .unwrap_err();
        assert!(matches!(err, TreeError::StructuralViolation { .. }));
    }

    #[test]
    fn ancestors_and_descendants() {
        let tree = sample_tree();
        assert_eq!(tree.ancestors_of("a1x"), vec!["a1".to_string(), "a".to_string()]);
        assert_eq!(
            tree.descendants_of("a"),
            vec!["a1".to_string(), "a1x".to_string(), "a2".to_string()]
        );
        assert!(tree.ancestors_of("b").is_empty());
    }

    #[test]
    fn insert_under_l4_is_rejected() {
        let mut tree = WbsTree::from_flat(vec![
            item("a", Level::Level1, None),
            item("b", Level::Level2, Some("a")),
            item("c", Level::Level3, Some("b")),
            item("d", Level::Level4, Some("c")),
        ])
        .unwrap();
        let err = tree
            .insert(Some("d"), item("e", Level::Level4, None))
            .unwrap_err();
        assert!(matches!(err, TreeError::StructuralViolation { .. }));
        assert_eq!(tree.len(), 4); // nothing mutated
    }

    #[test]
    fn insert_returns_dirty_ancestors() {
        let mut tree = sample_tree();
        let dirty = tree
            .insert(Some("a1"), item("a1y", Level::Level3, None))
            .unwrap();
        assert_eq!(dirty, vec!["a1".to_string(), "a".to_string()]);
        assert_eq!(tree.get("a1y").unwrap().code, "1.1.2");
    }

    #[test]
    fn remove_cascades_and_renumbers() {
        let mut tree = sample_tree();
        let (removed, dirty) = tree.remove("a1").unwrap();
        assert_eq!(removed, vec!["a1".to_string(), "a1x".to_string()]);
        assert_eq!(dirty, vec!["a".to_string()]);
        assert!(!tree.contains("a1x"));
        // Later sibling takes over the vacated code
        assert_eq!(tree.get("a2").unwrap().code, "1.1");
    }

    #[test]
    fn move_rejects_cycles() {
        let mut tree = sample_tree();
        // a1 under its own child a1x
        let err = tree.move_item("a1", Some("a1x"), 0).unwrap_err();
        assert!(matches!(err, TreeError::Cycle(_)));
        // unchanged
        assert_eq!(tree.get("a1").unwrap().parent.as_deref(), Some("a"));
    }

    #[test]
    fn move_reparents_and_reports_both_chains() {
        let mut tree = sample_tree();
        let dirty = tree.move_item("a2", Some("b"), 0).unwrap();
        assert!(dirty.contains(&"a".to_string()));
        assert!(dirty.contains(&"b".to_string()));
        assert_eq!(tree.get("a2").unwrap().code, "2.1");
        assert_eq!(tree.children_of("a"), &["a1".to_string()]);
    }

    #[test]
    fn reorder_renumbers_later_siblings() {
        let mut tree = sample_tree();
        tree.move_item("a2", Some("a"), 0).unwrap();
        assert_eq!(tree.get("a2").unwrap().code, "1.1");
        assert_eq!(tree.get("a1").unwrap().code, "1.2");
        assert_eq!(tree.get("a1x").unwrap().code, "1.2.1");
    }

    #[test]
    fn renumber_is_stable_on_consistent_tree() {
        let mut tree = sample_tree();
        let before: Vec<(String, String)> = tree
            .preorder()
            .into_iter()
            .map(|id| (id.clone(), tree.get(&id).unwrap().code.clone()))
            .collect();
        tree.renumber();
        let after: Vec<(String, String)> = tree
            .preorder()
            .into_iter()
            .map(|id| (id.clone(), tree.get(&id).unwrap().code.clone()))
            .collect();
        assert_eq!(before, after);
    }

    #[test]
    fn next_id_skips_existing() {
        let mut tree = WbsTree::new();
        tree.insert(None, item("w7", Level::Level1, None)).unwrap();
        assert_eq!(tree.next_id(), "w8");
        assert_eq!(WbsTree::new().next_id(), "w1");
    }

    #[test]
    fn to_flat_round_trips() {
        let tree = sample_tree();
        let rebuilt = WbsTree::from_flat(tree.to_flat()).unwrap();
        assert_eq!(tree, rebuilt);
    }
}
