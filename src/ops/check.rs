use crate::model::item::Level;
use crate::model::tree::WbsTree;
use crate::ops::rollup;

/// Result of a project integrity check. Errors are violated hard
/// invariants; warnings are soft ones the system tolerates and displays
/// (most notably Level1 weights that don't total 100).
#[derive(Debug, Default)]
pub struct CheckReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl CheckReport {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Validate every tree invariant: level pairing, L4 leaf-ness, gapless
/// codes, parent/child back-references, progress bounds, and freshness
/// of derived fields.
pub fn check_tree(tree: &WbsTree) -> CheckReport {
    let mut report = CheckReport::default();

    for id in tree.preorder() {
        let Some(item) = tree.get(&id) else { continue };

        match &item.parent {
            None => {
                if item.level != Level::Level1 {
                    report
                        .errors
                        .push(format!("{}: root item has level {}", id, item.level));
                }
            }
            Some(pid) => match tree.get(pid) {
                None => report
                    .errors
                    .push(format!("{}: parent {} does not exist", id, pid)),
                Some(parent) => {
                    if parent.level.child() != Some(item.level) {
                        report.errors.push(format!(
                            "{}: level {} under level {} parent {}",
                            id, item.level, parent.level, pid
                        ));
                    }
                    if !parent.children.contains(&id) {
                        report
                            .errors
                            .push(format!("{}: missing from parent {}'s child list", id, pid));
                    }
                }
            },
        }

        if item.level == Level::Level4 && !item.children.is_empty() {
            report
                .errors
                .push(format!("{}: L4 item has {} children", id, item.children.len()));
        }

        for cid in &item.children {
            match tree.get(cid) {
                None => report
                    .errors
                    .push(format!("{}: child {} does not exist", id, cid)),
                Some(child) => {
                    if child.parent.as_deref() != Some(id.as_str()) {
                        report
                            .errors
                            .push(format!("{}: child {} points at a different parent", id, cid));
                    }
                }
            }
        }

        if item.progress > 100 {
            report
                .errors
                .push(format!("{}: progress {} out of bounds", id, item.progress));
        }
        if let (Some(s), Some(e)) = (item.planned_start, item.planned_end)
            && s > e
        {
            report
                .errors
                .push(format!("{}: planned start {} after planned end {}", id, s, e));
        }
    }

    // Codes and derived fields must match a fresh recomputation
    let mut fresh = tree.clone();
    fresh.renumber();
    rollup::rollup_all(&mut fresh);
    for id in tree.preorder() {
        let (Some(item), Some(expect)) = (tree.get(&id), fresh.get(&id)) else {
            continue;
        };
        if item.code != expect.code {
            report.errors.push(format!(
                "{}: code {} should be {}",
                id, item.code, expect.code
            ));
        }
        if !item.children.is_empty()
            && (item.planned_start != expect.planned_start
                || item.planned_end != expect.planned_end
                || item.progress != expect.progress)
        {
            report
                .errors
                .push(format!("{}: derived fields are stale", id));
        }
    }

    // Soft invariant: Level1 weights should total 100
    if !tree.roots().is_empty() {
        let total: u32 = tree
            .roots()
            .iter()
            .filter_map(|id| tree.get(id))
            .map(|i| i.weight as u32)
            .sum();
        if total != 100 {
            report
                .warnings
                .push(format!("L1 weights total {} (expected 100)", total));
        }
    }
    for id in tree.roots() {
        if let Some(item) = tree.get(id)
            && (item.weight == 0 || item.weight > 100)
        {
            report
                .warnings
                .push(format!("{}: weight {} outside 1..=100", id, item.weight));
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::item::WorkItem;

    fn node(id: &str, level: Level, parent: Option<&str>) -> WorkItem {
        let mut it = WorkItem::new(id, level, id);
        it.parent = parent.map(str::to_string);
        it
    }

    fn sample_tree() -> WbsTree {
        let mut tree = WbsTree::from_flat(vec![
            node("a", Level::Level1, None),
            node("b", Level::Level1, None),
            node("a1", Level::Level2, Some("a")),
        ])
        .unwrap();
        tree.item_mut("a").unwrap().weight = 60;
        tree.item_mut("b").unwrap().weight = 40;
        rollup::rollup_all(&mut tree);
        tree
    }

    #[test]
    fn consistent_tree_passes() {
        let report = check_tree(&sample_tree());
        assert!(report.is_ok(), "{:?}", report.errors);
        assert!(report.warnings.is_empty(), "{:?}", report.warnings);
    }

    #[test]
    fn weight_violation_warns_but_does_not_error() {
        let mut tree = sample_tree();
        tree.item_mut("a").unwrap().weight = 90;
        let report = check_tree(&tree);
        assert!(report.is_ok());
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("130"));
    }

    #[test]
    fn stale_derived_fields_are_caught() {
        let mut tree = sample_tree();
        tree.item_mut("a").unwrap().progress = 55; // non-leaf, never rolled
        let report = check_tree(&tree);
        assert!(!report.is_ok());
        assert!(report.errors.iter().any(|e| e.contains("stale")));
    }

    #[test]
    fn inverted_dates_are_caught() {
        let mut tree = sample_tree();
        {
            let b = tree.item_mut("b").unwrap();
            b.planned_start = Some("2026-05-10".parse().unwrap());
            b.planned_end = Some("2026-05-01".parse().unwrap());
        }
        let report = check_tree(&tree);
        assert!(report.errors.iter().any(|e| e.contains("after planned end")));
    }
}
