use chrono::{Duration, NaiveDate};

use crate::model::item::WorkItem;

use super::scale::TimeScale;

/// Error type for drag gestures
#[derive(Debug, thiserror::Error)]
pub enum DragError {
    #[error("cannot drag {0}: its dates are derived from its children")]
    NotDraggable(String),
    #[error("cannot drag {0}: it has no planned dates")]
    NoSchedule(String),
}

/// What part of the bar a gesture grabs, fixed for the whole gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragMode {
    /// Shift both dates, preserving duration
    Move,
    /// Shift only the start, never past end − 1 day
    ResizeStart,
    /// Shift only the end, never before start + 1 day
    ResizeEnd,
}

/// The uncommitted dates of the dragged bar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragPreview {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// A finished gesture, ready to write into the tree and commit to the
/// repository. Carries the originals so a rejected commit can revert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragCommit {
    pub item_id: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub original_start: NaiveDate,
    pub original_end: NaiveDate,
}

#[derive(Debug, Default)]
enum DragState {
    #[default]
    Idle,
    Dragging {
        item_id: String,
        mode: DragMode,
        origin_x: i64,
        original_start: NaiveDate,
        original_end: NaiveDate,
        preview: DragPreview,
    },
}

/// Converts pointer gestures on the timeline into day deltas.
///
/// One gesture at a time: `begin` captures the originals and the
/// pointer origin, `update` recomputes a local preview (the tree is
/// untouched), and `release`/`cancel` resolve the gesture. Only leaf
/// rows with both planned dates accept a gesture — non-leaf dates are
/// derived, so there is nothing authoritative to drag.
#[derive(Debug, Default)]
pub struct DragController {
    state: DragState,
}

impl DragController {
    pub fn new() -> Self {
        DragController::default()
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    pub fn dragging_id(&self) -> Option<&str> {
        match &self.state {
            DragState::Dragging { item_id, .. } => Some(item_id),
            DragState::Idle => None,
        }
    }

    /// The uncommitted dates for `id`, if it is the dragged row
    pub fn preview_for(&self, id: &str) -> Option<DragPreview> {
        match &self.state {
            DragState::Dragging { item_id, preview, .. } if item_id == id => Some(*preview),
            _ => None,
        }
    }

    /// Start a gesture on `item` at pointer cell `origin_x`. Any
    /// gesture already in flight is cancelled first.
    pub fn begin(&mut self, item: &WorkItem, mode: DragMode, origin_x: i64) -> Result<(), DragError> {
        if !item.is_leaf() {
            return Err(DragError::NotDraggable(item.id.clone()));
        }
        let (Some(start), Some(end)) = (item.planned_start, item.planned_end) else {
            return Err(DragError::NoSchedule(item.id.clone()));
        };
        self.state = DragState::Dragging {
            item_id: item.id.clone(),
            mode,
            origin_x,
            original_start: start,
            original_end: end,
            preview: DragPreview { start, end },
        };
        Ok(())
    }

    /// Pointer moved to cell `x`: recompute the preview. Returns the
    /// new preview while a gesture is active.
    pub fn update(&mut self, x: i64, scale: &TimeScale) -> Option<DragPreview> {
        let DragState::Dragging {
            mode,
            origin_x,
            original_start,
            original_end,
            preview,
            ..
        } = &mut self.state
        else {
            return None;
        };

        let delta = Duration::days(scale.delta_days(x - *origin_x));
        *preview = match mode {
            DragMode::Move => DragPreview {
                start: *original_start + delta,
                end: *original_end + delta,
            },
            DragMode::ResizeStart => {
                let latest = *original_end - Duration::days(1);
                DragPreview {
                    start: (*original_start + delta).min(latest),
                    end: *original_end,
                }
            }
            DragMode::ResizeEnd => {
                let earliest = *original_start + Duration::days(1);
                DragPreview {
                    start: *original_start,
                    end: (*original_end + delta).max(earliest),
                }
            }
        };
        Some(*preview)
    }

    /// Finish the gesture. Returns a commit when the preview actually
    /// moved; a zero-delta release resolves to nothing.
    pub fn release(&mut self) -> Option<DragCommit> {
        let state = std::mem::take(&mut self.state);
        let DragState::Dragging {
            item_id,
            original_start,
            original_end,
            preview,
            ..
        } = state
        else {
            return None;
        };
        if preview.start == original_start && preview.end == original_end {
            return None;
        }
        Some(DragCommit {
            item_id,
            start: preview.start,
            end: preview.end,
            original_start,
            original_end,
        })
    }

    /// Abandon the gesture; local deltas are discarded unseen
    pub fn cancel(&mut self) {
        self.state = DragState::Idle;
    }
}
