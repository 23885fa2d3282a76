use chrono::NaiveDate;
use serde::Serialize;

use crate::model::item::{DisplayStatus, Person, WorkItem};
use crate::model::tree::WbsTree;
use crate::ops::rollup;

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct ItemJson {
    pub id: String,
    pub code: String,
    pub level: u8,
    pub name: String,
    pub status: DisplayStatus,
    pub progress: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub planned_start: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub planned_end: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_start: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_end: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay_days: Option<i64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub assignees: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deliverable_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deliverable_link: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ItemJson>,
}

#[derive(Serialize)]
pub struct TreeJson {
    pub project: String,
    pub progress: u32,
    pub items: Vec<ItemJson>,
}

#[derive(Serialize)]
pub struct StatsJson {
    pub project: String,
    pub progress: u32,
    pub items: usize,
    pub leaves: usize,
    pub delayed: usize,
    pub completed: usize,
    pub roots: Vec<RootStatsJson>,
}

#[derive(Serialize)]
pub struct RootStatsJson {
    pub id: String,
    pub code: String,
    pub name: String,
    pub weight: u8,
    pub progress: u8,
}

#[derive(Serialize)]
pub struct CheckJson {
    pub ok: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

#[derive(Serialize)]
pub struct PersonJson {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

/// Convert one item (and its subtree, down to `depth` levels) to JSON
pub fn item_to_json(tree: &WbsTree, id: &str, today: NaiveDate, depth: Option<u8>) -> Option<ItemJson> {
    let item = tree.get(id)?;
    let children = if depth.is_some_and(|d| item.level.depth() >= d) {
        Vec::new()
    } else {
        item.children
            .iter()
            .filter_map(|cid| item_to_json(tree, cid, today, depth))
            .collect()
    };
    Some(ItemJson {
        id: item.id.clone(),
        code: item.code.clone(),
        level: item.level.depth(),
        name: item.name.clone(),
        status: rollup::display_status(item, today),
        progress: item.progress,
        planned_start: item.planned_start,
        planned_end: item.planned_end,
        actual_start: item.actual_start,
        actual_end: item.actual_end,
        delay_days: rollup::delay_days(item, today),
        assignees: item.assignees.clone(),
        deliverable_name: item.deliverable_name.clone(),
        deliverable_link: item.deliverable_link.clone(),
        children,
    })
}

pub fn person_to_json(person: &Person) -> PersonJson {
    PersonJson {
        id: person.id.clone(),
        name: person.name.clone(),
        email: person.email.clone(),
    }
}

// ---------------------------------------------------------------------------
// Human-readable formatting
// ---------------------------------------------------------------------------

fn format_window(item: &WorkItem) -> String {
    match (item.planned_start, item.planned_end) {
        (Some(s), Some(e)) => format!("  {} → {}", s, e),
        (Some(s), None) => format!("  {} → ?", s),
        (None, Some(e)) => format!("  ? → {}", e),
        (None, None) => String::new(),
    }
}

/// One-line item summary: code, status marker, name, progress, window
pub fn format_item_line(item: &WorkItem, today: NaiveDate) -> String {
    let status = rollup::display_status(item, today);
    let delay = match rollup::delay_days(item, today) {
        Some(d) => format!("  +{}d", d),
        None => String::new(),
    };
    format!(
        "{:<10} {} {}  {:>3}%{}{}",
        item.code,
        status.symbol(),
        item.name,
        item.progress,
        format_window(item),
        delay
    )
}

/// Indented listing of a subtree, down to `depth` levels
pub fn format_subtree(
    tree: &WbsTree,
    id: &str,
    today: NaiveDate,
    depth: Option<u8>,
    lines: &mut Vec<String>,
) {
    let Some(item) = tree.get(id) else { return };
    let indent = "  ".repeat(item.level.depth() as usize - 1);
    lines.push(format!("{}{}", indent, format_item_line(item, today)));
    if depth.is_some_and(|d| item.level.depth() >= d) {
        return;
    }
    for child in &item.children {
        format_subtree(tree, child, today, depth, lines);
    }
}

/// Multi-line detail view for `show`
pub fn format_item_detail(tree: &WbsTree, item: &WorkItem, today: NaiveDate) -> Vec<String> {
    let status = rollup::display_status(item, today);
    let mut lines = vec![
        format!("{} {}  {}", status.symbol(), item.code, item.name),
        format!("  id:        {}", item.id),
        format!("  level:     {}", item.level),
        format!("  status:    {}", status),
        format!("  progress:  {}%", item.progress),
    ];
    if item.level == crate::model::item::Level::Level1 {
        lines.push(format!("  weight:    {}", item.weight));
    }
    if let Some(desc) = &item.description {
        lines.push(format!("  desc:      {}", desc));
    }
    if item.planned_start.is_some() || item.planned_end.is_some() {
        lines.push(format!(
            "  planned:   {}",
            format_window(item).trim_start()
        ));
    }
    match (item.actual_start, item.actual_end) {
        (None, None) => {}
        (s, e) => lines.push(format!(
            "  actual:    {} → {}",
            s.map_or("?".to_string(), |d| d.to_string()),
            e.map_or("?".to_string(), |d| d.to_string())
        )),
    }
    if let Some(d) = rollup::delay_days(item, today) {
        lines.push(format!("  delayed:   {} days", d));
    }
    if !item.assignees.is_empty() {
        lines.push(format!("  assignees: {}", item.assignees.join(", ")));
    }
    if let Some(name) = &item.deliverable_name {
        let link = item
            .deliverable_link
            .as_deref()
            .map(|l| format!(" ({})", l))
            .unwrap_or_default();
        lines.push(format!("  delivers:  {}{}", name, link));
    }
    if !item.children.is_empty() {
        lines.push(format!("  children:  {}", item.children.len()));
        for cid in &item.children {
            if let Some(child) = tree.get(cid) {
                lines.push(format!("    {}", format_item_line(child, today)));
            }
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::item::{Level, Status};

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn line_shows_code_marker_and_delay() {
        let mut item = WorkItem::new("w1", Level::Level4, "write report");
        item.code = "1.2.1.3".to_string();
        item.status = Status::InProgress;
        item.progress = 40;
        item.planned_start = Some(date("2026-03-01"));
        item.planned_end = Some(date("2026-03-10"));

        let line = format_item_line(&item, date("2026-03-12"));
        assert!(line.contains("1.2.1.3"));
        assert!(line.contains("[!]"));
        assert!(line.contains("write report"));
        assert!(line.contains("40%"));
        assert!(line.contains("+2d"));
    }

    #[test]
    fn json_depth_limit_prunes_children() {
        let mut root = WorkItem::new("a", Level::Level1, "a");
        root.code = "1".to_string();
        let mut child = WorkItem::new("a1", Level::Level2, "a1");
        child.parent = Some("a".to_string());
        let tree = WbsTree::from_flat(vec![root, child]).unwrap();

        let full = item_to_json(&tree, "a", date("2026-01-01"), None).unwrap();
        assert_eq!(full.children.len(), 1);
        let pruned = item_to_json(&tree, "a", date("2026-01-01"), Some(1)).unwrap();
        assert!(pruned.children.is_empty());
    }
}
