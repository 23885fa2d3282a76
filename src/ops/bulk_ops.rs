use crate::model::item::Level;
use crate::model::tree::WbsTree;
use crate::ops::level_ops::EditError;
use crate::repo::TaskRegistry;

/// Result of a bulk assignment
#[derive(Debug, Default, PartialEq, Eq)]
pub struct AssignReport {
    /// Items whose assignee set actually grew
    pub changed: Vec<String>,
    /// Items that already had every requested person
    pub unchanged: Vec<String>,
}

/// Assign every person in `person_ids` to every item in `item_ids`.
///
/// Set-union semantics: existing assignees stay, duplicates are never
/// stored. Items are processed strictly in order, each one to
/// completion, so a failure partway leaves earlier items assigned and
/// later ones untouched (the caller decides whether to continue).
pub fn assign(
    tree: &mut WbsTree,
    item_ids: &[String],
    person_ids: &[String],
) -> Result<AssignReport, EditError> {
    for id in item_ids {
        if !tree.contains(id) {
            return Err(EditError::NotFound(id.clone()));
        }
    }

    let mut report = AssignReport::default();
    for id in item_ids {
        let item = tree
            .item_mut(id)
            .ok_or_else(|| EditError::NotFound(id.clone()))?;
        let before = item.assignees.len();
        for pid in person_ids {
            if !item.assignees.contains(pid) {
                item.assignees.push(pid.clone());
            }
        }
        if item.assignees.len() != before {
            report.changed.push(id.clone());
        } else {
            report.unchanged.push(id.clone());
        }
    }
    Ok(report)
}

/// Result of promoting a selection to schedulable work units
#[derive(Debug, Default)]
pub struct RegisterReport {
    pub registered: Vec<String>,
    /// Selection members that are not L4 (nothing to register)
    pub skipped: Vec<String>,
    pub failed: Vec<(String, String)>,
}

/// Register each L4 item in the selection with the task registry, one
/// at a time. Non-L4 members are skipped, not errors — a tree-wide
/// selection routinely includes ancestors.
pub fn register(
    tree: &WbsTree,
    item_ids: &[String],
    registry: &mut dyn TaskRegistry,
) -> Result<RegisterReport, EditError> {
    let mut report = RegisterReport::default();
    for id in item_ids {
        let item = tree.get(id).ok_or_else(|| EditError::NotFound(id.clone()))?;
        if item.level != Level::Level4 {
            report.skipped.push(id.clone());
            continue;
        }
        match registry.register_as_task(item) {
            Ok(()) => report.registered.push(id.clone()),
            Err(e) => report.failed.push((id.clone(), e.to_string())),
        }
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::item::WorkItem;
    use crate::repo::memory::InMemoryRepository;
    use pretty_assertions::assert_eq;

    fn node(id: &str, level: Level, parent: Option<&str>) -> WorkItem {
        let mut it = WorkItem::new(id, level, id);
        it.parent = parent.map(str::to_string);
        it
    }

    fn sample_tree() -> WbsTree {
        WbsTree::from_flat(vec![
            node("a", Level::Level1, None),
            node("a1", Level::Level2, Some("a")),
            node("a1x", Level::Level3, Some("a1")),
            node("t1", Level::Level4, Some("a1x")),
            node("t2", Level::Level4, Some("a1x")),
        ])
        .unwrap()
    }

    #[test]
    fn assign_unions_people_over_items() {
        let mut tree = sample_tree();
        tree.item_mut("t1").unwrap().assignees = vec!["p2".to_string()];

        let items = vec!["t1".to_string(), "t2".to_string()];
        let people = vec!["p1".to_string(), "p2".to_string()];
        let report = assign(&mut tree, &items, &people).unwrap();

        assert_eq!(report.changed, vec!["t1".to_string(), "t2".to_string()]);
        assert_eq!(
            tree.get("t1").unwrap().assignees,
            vec!["p2".to_string(), "p1".to_string()]
        );
        assert_eq!(
            tree.get("t2").unwrap().assignees,
            vec!["p1".to_string(), "p2".to_string()]
        );

        // Second run is a no-op
        let report = assign(&mut tree, &items, &people).unwrap();
        assert!(report.changed.is_empty());
        assert_eq!(report.unchanged.len(), 2);
    }

    #[test]
    fn assign_validates_before_mutating() {
        let mut tree = sample_tree();
        let before = tree.clone();
        let items = vec!["t1".to_string(), "ghost".to_string()];
        let err = assign(&mut tree, &items, &["p1".to_string()]).unwrap_err();
        assert!(matches!(err, EditError::NotFound(_)));
        assert_eq!(before, tree);
    }

    #[test]
    fn register_takes_l4_and_skips_the_rest() {
        let tree = sample_tree();
        let mut registry = InMemoryRepository::new();
        let selection = vec![
            "a".to_string(),
            "a1x".to_string(),
            "t1".to_string(),
            "t2".to_string(),
        ];
        let report = register(&tree, &selection, &mut registry).unwrap();
        assert_eq!(report.registered, vec!["t1".to_string(), "t2".to_string()]);
        assert_eq!(report.skipped, vec!["a".to_string(), "a1x".to_string()]);
        assert!(report.failed.is_empty());
        assert_eq!(registry.registered_tasks(), &["t1".to_string(), "t2".to_string()]);
    }
}
