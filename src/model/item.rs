use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// WBS depth level. Level1 is the largest decomposition, Level4 the
/// smallest schedulable unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Level1,
    Level2,
    Level3,
    Level4,
}

impl Level {
    /// 1-based depth of this level
    pub fn depth(self) -> u8 {
        match self {
            Level::Level1 => 1,
            Level::Level2 => 2,
            Level::Level3 => 3,
            Level::Level4 => 4,
        }
    }

    pub fn from_depth(depth: u8) -> Option<Level> {
        match depth {
            1 => Some(Level::Level1),
            2 => Some(Level::Level2),
            3 => Some(Level::Level3),
            4 => Some(Level::Level4),
            _ => None,
        }
    }

    /// The level children of this level must have (None for Level4)
    pub fn child(self) -> Option<Level> {
        Level::from_depth(self.depth() + 1)
    }

    /// The level a parent of this level must have (None for Level1)
    pub fn parent_level(self) -> Option<Level> {
        match self {
            Level::Level1 => None,
            l => Level::from_depth(l.depth() - 1),
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "L{}", self.depth())
    }
}

/// Stored item status — set by the user, never auto-derived
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Pending,
    InProgress,
    Holding,
    Completed,
    Cancelled,
}

impl Status {
    /// True once the item no longer participates in delay detection
    pub fn is_closed(self) -> bool {
        matches!(self, Status::Completed | Status::Cancelled)
    }
}

/// Status as shown to the user — equals the stored status except when a
/// planned end date has passed on an open item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayStatus {
    Pending,
    InProgress,
    Holding,
    Completed,
    Cancelled,
    Delayed,
}

impl From<Status> for DisplayStatus {
    fn from(s: Status) -> Self {
        match s {
            Status::Pending => DisplayStatus::Pending,
            Status::InProgress => DisplayStatus::InProgress,
            Status::Holding => DisplayStatus::Holding,
            Status::Completed => DisplayStatus::Completed,
            Status::Cancelled => DisplayStatus::Cancelled,
        }
    }
}

impl DisplayStatus {
    /// Short marker used in listings and the tree pane
    pub fn symbol(self) -> &'static str {
        match self {
            DisplayStatus::Pending => "[ ]",
            DisplayStatus::InProgress => "[>]",
            DisplayStatus::Holding => "[~]",
            DisplayStatus::Completed => "[x]",
            DisplayStatus::Cancelled => "[/]",
            DisplayStatus::Delayed => "[!]",
        }
    }
}

impl std::fmt::Display for DisplayStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DisplayStatus::Pending => "pending",
            DisplayStatus::InProgress => "in_progress",
            DisplayStatus::Holding => "holding",
            DisplayStatus::Completed => "completed",
            DisplayStatus::Cancelled => "cancelled",
            DisplayStatus::Delayed => "delayed",
        };
        write!(f, "{}", s)
    }
}

/// A single WBS node.
///
/// Leaf items carry authoritative planned dates and progress; non-leaf
/// items have those fields recomputed from their children after every
/// mutation (see ops::rollup). `code` and `children` are derived from
/// tree position and are rebuilt on hydration, so they are not stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItem {
    pub id: String,
    /// Hierarchical display code like "1.2.3"
    #[serde(skip)]
    pub code: String,
    pub level: Level,
    pub parent: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub planned_start: Option<NaiveDate>,
    #[serde(default)]
    pub planned_end: Option<NaiveDate>,
    #[serde(default)]
    pub actual_start: Option<NaiveDate>,
    #[serde(default)]
    pub actual_end: Option<NaiveDate>,
    /// 0–100; derived for non-leaf items
    #[serde(default)]
    pub progress: u8,
    /// 1–100 share of project progress; meaningful on Level1 only
    #[serde(default = "default_weight")]
    pub weight: u8,
    pub status: Status,
    /// Person ids; order preserved, duplicates never stored
    #[serde(default)]
    pub assignees: Vec<String>,
    #[serde(default)]
    pub deliverable_name: Option<String>,
    #[serde(default)]
    pub deliverable_link: Option<String>,
    /// Ordered child ids
    #[serde(skip)]
    pub children: Vec<String>,
}

fn default_weight() -> u8 {
    1
}

impl WorkItem {
    /// Create a new leaf item with default progress 0 and status Pending
    pub fn new(id: impl Into<String>, level: Level, name: impl Into<String>) -> Self {
        WorkItem {
            id: id.into(),
            code: String::new(),
            level,
            parent: None,
            name: name.into(),
            description: None,
            planned_start: None,
            planned_end: None,
            actual_start: None,
            actual_end: None,
            progress: 0,
            weight: 1,
            status: Status::Pending,
            assignees: Vec::new(),
            deliverable_name: None,
            deliverable_link: None,
            children: Vec::new(),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// An assignable person, supplied by the person directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
}
