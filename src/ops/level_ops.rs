use crate::model::item::{Level, WorkItem};
use crate::model::tree::{TreeError, WbsTree};

/// Error type for structural editor operations
#[derive(Debug, thiserror::Error)]
pub enum EditError {
    #[error("item not found: {0}")]
    NotFound(String),
    #[error("invalid level: {0}")]
    InvalidLevel(String),
    #[error("demoting {0} would push part of its subtree past L4")]
    MaxLevelExceeded(String),
    #[error("{0} has no preceding sibling to demote under")]
    NoPrecedingSibling(String),
    #[error(transparent)]
    Tree(#[from] TreeError),
}

/// Verify that a `level` item may be created under `parent`: roots must
/// be L1, everything else exactly one level below its parent.
pub fn check_placement(
    tree: &WbsTree,
    parent: Option<&str>,
    level: Level,
) -> Result<(), EditError> {
    match parent {
        None => {
            if level != Level::Level1 {
                return Err(EditError::InvalidLevel(format!(
                    "a {} item cannot be a root",
                    level
                )));
            }
        }
        Some(pid) => {
            let parent_level = tree
                .get(pid)
                .map(|p| p.level)
                .ok_or_else(|| EditError::NotFound(pid.to_string()))?;
            if parent_level.child() != Some(level) {
                return Err(EditError::InvalidLevel(format!(
                    "a {} item cannot be added under a {} parent",
                    level, parent_level
                )));
            }
        }
    }
    Ok(())
}

/// Create a new leaf under `parent` (or a new root). The level must be
/// exactly one below the parent's, and the parent must sit above L4.
/// Returns the new id and the ancestors needing re-rollup.
pub fn add_child(
    tree: &mut WbsTree,
    parent: Option<&str>,
    level: Level,
    name: &str,
) -> Result<(String, Vec<String>), EditError> {
    check_placement(tree, parent, level)?;

    let id = tree.next_id();
    let item = WorkItem::new(&id, level, name);
    let dirty = tree.insert(parent, item)?;
    Ok((id, dirty))
}

/// Move `id` up one level: it becomes the sibling immediately after its
/// former parent, and every descendant shifts up with it.
pub fn promote(tree: &mut WbsTree, id: &str) -> Result<Vec<String>, EditError> {
    let item = tree
        .get(id)
        .ok_or_else(|| EditError::NotFound(id.to_string()))?;
    let parent_id = match &item.parent {
        Some(p) => p.clone(),
        None => {
            return Err(EditError::InvalidLevel(
                "cannot promote a top-level item".to_string(),
            ));
        }
    };

    let grandparent = tree
        .get(&parent_id)
        .and_then(|p| p.parent.clone());
    let siblings = match &grandparent {
        Some(gp) => tree.children_of(gp),
        None => tree.roots(),
    };
    let parent_idx = siblings
        .iter()
        .position(|s| *s == parent_id)
        .unwrap_or(siblings.len());

    let mut dirty = tree.ancestors_of(id);
    tree.shift_levels(id, -1);
    tree.detach(id);
    tree.attach(id, grandparent.as_deref(), parent_idx + 1);
    tree.renumber();
    for a in tree.ancestors_of(id) {
        if !dirty.contains(&a) {
            dirty.push(a);
        }
    }
    Ok(dirty)
}

/// Move `id` down one level: it becomes the last child of its
/// immediately preceding sibling, and every descendant shifts down with
/// it. Rejected when there is no preceding sibling or when any
/// descendant would pass L4.
pub fn demote(tree: &mut WbsTree, id: &str) -> Result<Vec<String>, EditError> {
    let item = tree
        .get(id)
        .ok_or_else(|| EditError::NotFound(id.to_string()))?;
    let parent = item.parent.clone();
    let siblings = match &parent {
        Some(p) => tree.children_of(p),
        None => tree.roots(),
    };
    let idx = siblings
        .iter()
        .position(|s| s == id)
        .ok_or_else(|| EditError::NotFound(id.to_string()))?;
    if idx == 0 {
        return Err(EditError::NoPrecedingSibling(id.to_string()));
    }
    let new_parent = siblings[idx - 1].clone();

    let mut deepest = tree.get(id).map_or(0, |i| i.level.depth());
    for did in tree.descendants_of(id) {
        if let Some(d) = tree.get(&did) {
            deepest = deepest.max(d.level.depth());
        }
    }
    if deepest >= Level::Level4.depth() {
        return Err(EditError::MaxLevelExceeded(id.to_string()));
    }

    let mut dirty = tree.ancestors_of(id);
    tree.shift_levels(id, 1);
    tree.detach(id);
    tree.attach(id, Some(&new_parent), usize::MAX);
    tree.renumber();
    for a in tree.ancestors_of(id) {
        if !dirty.contains(&a) {
            dirty.push(a);
        }
    }
    Ok(dirty)
}

/// Delete `id` and its whole subtree. Returns the removed ids (for
/// cleanup of out-of-tree references) and the ancestors to re-roll.
pub fn delete(tree: &mut WbsTree, id: &str) -> Result<(Vec<String>, Vec<String>), EditError> {
    Ok(tree.remove(id)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::rollup;
    use pretty_assertions::assert_eq;

    fn node(id: &str, level: Level, parent: Option<&str>) -> WorkItem {
        let mut it = WorkItem::new(id, level, id);
        it.parent = parent.map(str::to_string);
        it
    }

    /// a > a1 > a1x(L3) > {t1, t2}(L4); a1 also has a2 sibling
    fn sample_tree() -> WbsTree {
        WbsTree::from_flat(vec![
            node("a", Level::Level1, None),
            node("a1", Level::Level2, Some("a")),
            node("a2", Level::Level2, Some("a")),
            node("a1x", Level::Level3, Some("a1")),
            node("t1", Level::Level4, Some("a1x")),
            node("t2", Level::Level4, Some("a1x")),
        ])
        .unwrap()
    }

    fn assert_level_invariant(tree: &WbsTree) {
        for id in tree.preorder() {
            let item = tree.get(&id).unwrap();
            match &item.parent {
                None => assert_eq!(item.level, Level::Level1, "root {} must be L1", id),
                Some(p) => {
                    let parent = tree.get(p).unwrap();
                    assert_eq!(
                        Some(item.level),
                        parent.level.child(),
                        "{} must sit one level under {}",
                        id,
                        p
                    );
                }
            }
            if item.level == Level::Level4 {
                assert!(item.children.is_empty(), "L4 item {} has children", id);
            }
        }
    }

    #[test]
    fn add_child_creates_pending_leaf() {
        let mut tree = sample_tree();
        let (id, dirty) = add_child(&mut tree, Some("a2"), Level::Level3, "new work").unwrap();
        let item = tree.get(&id).unwrap();
        assert_eq!(item.progress, 0);
        assert_eq!(item.status, crate::model::item::Status::Pending);
        assert!(item.is_leaf());
        assert_eq!(item.code, "1.2.1");
        assert_eq!(dirty, vec!["a2".to_string(), "a".to_string()]);
        assert_level_invariant(&tree);
    }

    #[test]
    fn add_child_rejects_level_gap() {
        let mut tree = sample_tree();
        let err = add_child(&mut tree, Some("a"), Level::Level4, "skip").unwrap_err();
        assert!(matches!(err, EditError::InvalidLevel(_)));
        let err = add_child(&mut tree, Some("t1"), Level::Level4, "under L4").unwrap_err();
        assert!(matches!(err, EditError::InvalidLevel(_)));
        let err = add_child(&mut tree, None, Level::Level2, "root").unwrap_err();
        assert!(matches!(err, EditError::InvalidLevel(_)));
    }

    #[test]
    fn promote_reparents_next_to_former_parent() {
        let mut tree = sample_tree();
        // The worked scenario: promoting an L3 with two L4 children
        promote(&mut tree, "a1x").unwrap();
        let a1x = tree.get("a1x").unwrap();
        assert_eq!(a1x.level, Level::Level2);
        assert_eq!(a1x.parent.as_deref(), Some("a"));
        assert_eq!(tree.get("t1").unwrap().level, Level::Level3);
        assert_eq!(tree.get("t2").unwrap().level, Level::Level3);
        // Sits immediately after its former parent a1
        assert_eq!(
            tree.children_of("a"),
            &["a1".to_string(), "a1x".to_string(), "a2".to_string()]
        );
        assert_eq!(a1x.code, "1.2");
        assert_level_invariant(&tree);
    }

    #[test]
    fn promote_root_fails() {
        let mut tree = sample_tree();
        let err = promote(&mut tree, "a").unwrap_err();
        assert!(matches!(err, EditError::InvalidLevel(_)));
    }

    #[test]
    fn promoted_root_lands_after_former_parent_root() {
        let mut tree = WbsTree::from_flat(vec![
            node("a", Level::Level1, None),
            node("b", Level::Level1, None),
            node("a1", Level::Level2, Some("a")),
        ])
        .unwrap();
        promote(&mut tree, "a1").unwrap();
        assert_eq!(tree.roots(), &["a".to_string(), "a1".to_string(), "b".to_string()]);
        assert_eq!(tree.get("a1").unwrap().level, Level::Level1);
        assert_level_invariant(&tree);
    }

    #[test]
    fn demote_moves_under_preceding_sibling() {
        let mut tree = sample_tree();
        let dirty = demote(&mut tree, "a2").unwrap();
        let a2 = tree.get("a2").unwrap();
        assert_eq!(a2.level, Level::Level3);
        assert_eq!(a2.parent.as_deref(), Some("a1"));
        // Last child of a1, after a1x
        assert_eq!(tree.children_of("a1"), &["a1x".to_string(), "a2".to_string()]);
        assert!(dirty.contains(&"a1".to_string()));
        assert_level_invariant(&tree);
    }

    #[test]
    fn demote_first_sibling_fails() {
        let mut tree = sample_tree();
        let err = demote(&mut tree, "a1").unwrap_err();
        assert!(matches!(err, EditError::NoPrecedingSibling(_)));
    }

    #[test]
    fn demote_past_l4_fails_without_mutation() {
        // b's subtree already reaches L4, so tucking b under a would
        // push its leaves past the bottom
        let mut tree = WbsTree::from_flat(vec![
            node("a", Level::Level1, None),
            node("b", Level::Level1, None),
            node("b1", Level::Level2, Some("b")),
            node("b1x", Level::Level3, Some("b1")),
            node("t", Level::Level4, Some("b1x")),
        ])
        .unwrap();
        let before = tree.clone();
        let err = demote(&mut tree, "b").unwrap_err();
        assert!(matches!(err, EditError::MaxLevelExceeded(_)));
        assert_eq!(before, tree);
    }

    #[test]
    fn delete_cascades_and_reports_removed_ids() {
        let mut tree = sample_tree();
        let (removed, dirty) = delete(&mut tree, "a1x").unwrap();
        assert_eq!(
            removed,
            vec!["a1x".to_string(), "t1".to_string(), "t2".to_string()]
        );
        assert_eq!(dirty, vec!["a1".to_string(), "a".to_string()]);
        assert!(!tree.contains("t1"));
        assert_level_invariant(&tree);
    }

    #[test]
    fn rollup_follows_structural_edits() {
        let mut tree = sample_tree();
        tree.item_mut("t1").unwrap().progress = 100;
        tree.item_mut("t2").unwrap().progress = 50;
        rollup::rollup_all(&mut tree);
        assert_eq!(tree.get("a1x").unwrap().progress, 75);

        // Deleting the subtree drains the parent back to its remaining input
        let (_, dirty) = delete(&mut tree, "a1x").unwrap();
        rollup::refresh(&mut tree, &dirty);
        assert_eq!(tree.get("a1").unwrap().progress, 0);
    }

    #[test]
    fn promote_demote_round_trip_preserves_levels() {
        let mut tree = sample_tree();
        promote(&mut tree, "a1x").unwrap();
        // a1x is now the sibling right after a1, so demote tucks it back
        demote(&mut tree, "a1x").unwrap();
        let a1x = tree.get("a1x").unwrap();
        assert_eq!(a1x.level, Level::Level3);
        assert_eq!(a1x.parent.as_deref(), Some("a1"));
        assert_eq!(tree.get("t1").unwrap().level, Level::Level4);
        assert_level_invariant(&tree);
    }
}
