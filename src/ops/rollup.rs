use chrono::NaiveDate;

use crate::model::config::WeightMode;
use crate::model::item::{DisplayStatus, WorkItem};
use crate::model::tree::WbsTree;

// ---------------------------------------------------------------------------
// Date + progress rollup
// ---------------------------------------------------------------------------

/// Recompute derived fields for the whole tree, children before parents.
/// Run once after hydration; afterwards the dirty-set variants keep the
/// tree current.
pub fn rollup_all(tree: &mut WbsTree) {
    // Reverse preorder visits every node after all of its descendants
    for id in tree.preorder().into_iter().rev() {
        recompute(tree, &id);
    }
}

/// Recompute `id` and then its whole ancestor chain, bottom-up
pub fn recompute_upward(tree: &mut WbsTree, id: &str) {
    recompute(tree, id);
    for ancestor in tree.ancestors_of(id) {
        recompute(tree, &ancestor);
    }
}

/// Recompute a set of dirty ancestor ids (as returned by the tree's
/// structural mutators). Deeper nodes are recomputed first so parents
/// always read fresh children.
///
/// A dirty id is always a node whose descendants changed; if the change
/// took its last child away, its derived fields reset to progress 0 and
/// null dates instead of going stale.
pub fn refresh(tree: &mut WbsTree, dirty: &[String]) {
    let mut ids: Vec<String> = dirty.iter().filter(|id| tree.contains(id)).cloned().collect();
    ids.sort_by_key(|id| std::cmp::Reverse(tree.get(id).map_or(0, |i| i.level.depth())));
    for id in ids {
        if tree.children_of(&id).is_empty() {
            if let Some(item) = tree.item_mut(&id) {
                item.planned_start = None;
                item.planned_end = None;
                item.progress = 0;
            }
        } else {
            recompute(tree, &id);
        }
    }
}

/// Derive one node's planned dates and progress from its immediate
/// children. Leaf items are authoritative input and are left alone.
///
/// A non-leaf with zero dated children gets null dates (not an epoch);
/// a non-leaf with zero children has progress 0. Everything here is a
/// pure function of the children, so re-running it never drifts.
fn recompute(tree: &mut WbsTree, id: &str) {
    let children = tree.children_of(id).to_vec();
    if children.is_empty() {
        return;
    }

    let mut start: Option<NaiveDate> = None;
    let mut end: Option<NaiveDate> = None;
    let mut sum: u32 = 0;
    let mut count: u32 = 0;
    for cid in &children {
        let Some(child) = tree.get(cid) else { continue };
        if let Some(s) = child.planned_start {
            start = Some(start.map_or(s, |cur| cur.min(s)));
        }
        if let Some(e) = child.planned_end {
            end = Some(end.map_or(e, |cur| cur.max(e)));
        }
        sum += child.progress as u32;
        count += 1;
    }

    let progress = if count == 0 {
        0
    } else {
        ((sum as f64 / count as f64).round() as u32).min(100) as u8
    };

    if let Some(item) = tree.item_mut(id) {
        item.planned_start = start;
        item.planned_end = end;
        item.progress = progress;
    }
}

// ---------------------------------------------------------------------------
// Project progress
// ---------------------------------------------------------------------------

/// Weighted project progress over the Level1 roots, in percent.
///
/// `Normalize` divides by the actual weight sum, so a weight set that
/// doesn't total 100 still reads as a true share. `Literal` divides by
/// 100 and can read over 100% when weights over-commit.
pub fn project_progress(tree: &WbsTree, mode: WeightMode) -> u32 {
    let mut weighted: u64 = 0;
    let mut weight_sum: u64 = 0;
    for id in tree.roots() {
        let Some(item) = tree.get(id) else { continue };
        weighted += item.progress as u64 * item.weight as u64;
        weight_sum += item.weight as u64;
    }
    let denom = match mode {
        WeightMode::Normalize => weight_sum,
        WeightMode::Literal => 100,
    };
    if denom == 0 {
        return 0;
    }
    ((weighted as f64 / denom as f64).round()) as u32
}

// ---------------------------------------------------------------------------
// Display status
// ---------------------------------------------------------------------------

/// The status shown to the user: `Delayed` when an open item's planned
/// end has passed, otherwise the stored status. `today` is explicit so
/// callers (and tests) control the clock.
pub fn display_status(item: &WorkItem, today: NaiveDate) -> DisplayStatus {
    if !item.status.is_closed()
        && let Some(end) = item.planned_end
        && end < today
    {
        return DisplayStatus::Delayed;
    }
    item.status.into()
}

/// Days overdue; only meaningful when the display status is Delayed
pub fn delay_days(item: &WorkItem, today: NaiveDate) -> Option<i64> {
    match display_status(item, today) {
        DisplayStatus::Delayed => item.planned_end.map(|end| (today - end).num_days()),
        _ => None,
    }
}
