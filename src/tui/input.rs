use chrono::Duration;
use crossterm::event::{KeyCode, KeyEvent, MouseButton, MouseEvent, MouseEventKind};

use crate::gantt::DragMode;
use crate::repo::json_file::JsonFileRepository;

use super::app::{App, Mode};
use super::render::GANTT_HEADER_ROWS;

/// Handle a key press in the current mode
pub fn handle_key(app: &mut App<JsonFileRepository>, key: KeyEvent) {
    app.status_message = None;

    if app.show_help {
        app.show_help = false;
        return;
    }

    if let Mode::ConfirmDelete { id, count } = app.mode.clone() {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => {
                match app.session.delete(&id) {
                    Ok(removed) => {
                        for rid in &removed {
                            app.selection.remove(rid);
                            app.expanded.remove(rid);
                        }
                        app.say(format!("deleted {} item(s)", removed.len()));
                    }
                    Err(e) => app.say(format!("delete failed: {}", e)),
                }
                app.clamp_cursor();
            }
            _ => app.say(format!("kept {} item(s)", count)),
        }
        app.mode = Mode::Navigate;
        return;
    }

    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Char('?') => app.show_help = true,
        KeyCode::Esc => {
            if app.drag.is_dragging() {
                app.drag.cancel();
            } else {
                app.selection.clear();
            }
        }

        // Navigation
        KeyCode::Char('j') | KeyCode::Down => {
            let count = app.build_flat_rows().len();
            if app.cursor + 1 < count {
                app.cursor += 1;
            }
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.cursor = app.cursor.saturating_sub(1);
        }
        KeyCode::Char('g') => app.cursor = 0,
        KeyCode::Char('G') => {
            app.cursor = app.build_flat_rows().len().saturating_sub(1);
        }

        // Expand / collapse
        KeyCode::Char('l') | KeyCode::Right | KeyCode::Enter => {
            if let Some(row) = app.build_flat_rows().get(app.cursor).cloned()
                && row.has_children
            {
                if row.is_expanded {
                    app.expanded.remove(&row.id);
                } else {
                    app.expanded.insert(row.id);
                }
            }
        }
        KeyCode::Char('h') | KeyCode::Left => {
            if let Some(row) = app.build_flat_rows().get(app.cursor).cloned() {
                if row.is_expanded {
                    app.expanded.remove(&row.id);
                } else if let Some(parent) = app
                    .session
                    .tree()
                    .get(&row.id)
                    .and_then(|i| i.parent.clone())
                {
                    app.cursor_to(&parent);
                }
            }
        }
        KeyCode::Char('E') => {
            // Expand everything with children
            for id in app.session.tree().preorder() {
                if !app.session.tree().children_of(&id).is_empty() {
                    app.expanded.insert(id);
                }
            }
        }
        KeyCode::Char('C') => {
            app.expanded.clear();
            app.clamp_cursor();
        }

        // Selection
        KeyCode::Char(' ') => {
            if let Some(id) = app.cursor_id() {
                if !app.selection.remove(&id) {
                    app.selection.insert(id);
                }
            }
        }

        // Structural edits
        KeyCode::Char('<') => {
            if let Some(id) = app.cursor_id() {
                match app.session.promote(&id) {
                    Ok(()) => {
                        app.cursor_to(&id);
                        app.say(format!("promoted {}", id));
                    }
                    Err(e) => app.say(e.to_string()),
                }
            }
        }
        KeyCode::Char('>') => {
            if let Some(id) = app.cursor_id() {
                match app.session.demote(&id) {
                    Ok(()) => {
                        // The new parent must be open for the row to stay visible
                        if let Some(parent) =
                            app.session.tree().get(&id).and_then(|i| i.parent.clone())
                        {
                            app.expanded.insert(parent);
                        }
                        app.cursor_to(&id);
                        app.say(format!("demoted {}", id));
                    }
                    Err(e) => app.say(e.to_string()),
                }
            }
        }
        KeyCode::Char('d') => {
            if let Some(id) = app.cursor_id() {
                let count = 1 + app.session.tree().descendants_of(&id).len();
                app.mode = Mode::ConfirmDelete { id, count };
            }
        }

        // Timeline
        KeyCode::Char('+') | KeyCode::Char('=') => app.zoom = app.zoom.zoom_in(),
        KeyCode::Char('-') => app.zoom = app.zoom.zoom_out(),
        KeyCode::Char('[') => app.origin -= Duration::days(7),
        KeyCode::Char(']') => app.origin += Duration::days(7),
        KeyCode::Char('t') => app.origin = app.today - Duration::days(7),

        // Bulk
        KeyCode::Char('r') => app.register_selection(),

        _ => {}
    }
}

/// Handle mouse events: bar dragging lives in the timeline pane.
/// Releasing the button outside that pane drops the gesture instead of
/// committing it.
pub fn handle_mouse(app: &mut App<JsonFileRepository>, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            if let Some((row_idx, cell_x)) = gantt_hit(app, mouse.column, mouse.row) {
                app.cursor = row_idx;
                begin_drag(app, cell_x);
            } else if let Some(row_idx) = tree_hit(app, mouse.column, mouse.row) {
                app.cursor = row_idx;
            }
        }
        MouseEventKind::Drag(MouseButton::Left) => {
            if app.drag.is_dragging() {
                let cell_x = gantt_cell_x(app, mouse.column);
                let scale = app.scale();
                app.drag.update(cell_x, &scale);
            }
        }
        MouseEventKind::Up(MouseButton::Left) if app.drag.is_dragging() => {
            if !in_gantt_pane(app, mouse.column, mouse.row) {
                app.drag.cancel();
                app.say("drag cancelled");
            } else if let Some(commit) = app.drag.release() {
                match app.session.commit_drag(&commit) {
                    Ok(()) => app.say(format!(
                        "{}: {} → {}",
                        commit.item_id, commit.start, commit.end
                    )),
                    Err(e) => app.say(format!("drag rejected: {}", e)),
                }
            }
        }
        _ => {}
    }
}

fn begin_drag(app: &mut App<JsonFileRepository>, cell_x: i64) {
    let Some(row) = app.build_flat_rows().get(app.cursor).cloned() else {
        return;
    };
    let Some(item) = app.session.tree().get(&row.id) else {
        return;
    };
    let (Some(start), Some(end)) = (item.planned_start, item.planned_end) else {
        return; // nothing to grab
    };

    let scale = app.scale();
    let bar_start = scale.x_of(start);
    let bar_end = scale.x_of(end) + scale.cell_width as i64 - 1;
    if cell_x < bar_start || cell_x > bar_end {
        return;
    }
    let edge = scale.cell_width as i64;
    let mode = if cell_x < bar_start + edge && bar_end - bar_start >= 2 * edge {
        DragMode::ResizeStart
    } else if cell_x > bar_end - edge && bar_end - bar_start >= 2 * edge {
        DragMode::ResizeEnd
    } else {
        DragMode::Move
    };

    let item = item.clone();
    if let Err(e) = app.drag.begin(&item, mode, cell_x) {
        app.say(e.to_string());
    }
}

/// Map screen coordinates to (visible row index, timeline cell x)
fn gantt_hit(app: &App<JsonFileRepository>, column: u16, row: u16) -> Option<(usize, i64)> {
    let pane = app.gantt_pane;
    if column < pane.x
        || column >= pane.x + pane.width
        || row < pane.y + GANTT_HEADER_ROWS
        || row >= pane.y + pane.height
    {
        return None;
    }
    let row_idx = app.scroll_offset + (row - pane.y - GANTT_HEADER_ROWS) as usize;
    if row_idx >= app.build_flat_rows().len() {
        return None;
    }
    Some((row_idx, (column - pane.x) as i64))
}

/// Timeline cell under `column`, clamped to the pane so a gesture that
/// brushes past either edge keeps tracking
fn gantt_cell_x(app: &App<JsonFileRepository>, column: u16) -> i64 {
    let pane = app.gantt_pane;
    let right = pane.x + pane.width.saturating_sub(1);
    (column.clamp(pane.x, right) - pane.x) as i64
}

fn in_gantt_pane(app: &App<JsonFileRepository>, column: u16, row: u16) -> bool {
    let pane = app.gantt_pane;
    column >= pane.x && column < pane.x + pane.width && row >= pane.y && row < pane.y + pane.height
}

fn tree_hit(app: &App<JsonFileRepository>, column: u16, row: u16) -> Option<usize> {
    let pane = app.tree_pane;
    if column < pane.x
        || column >= pane.x + pane.width
        || row < pane.y + GANTT_HEADER_ROWS
        || row >= pane.y + pane.height
    {
        return None;
    }
    let row_idx = app.scroll_offset + (row - pane.y - GANTT_HEADER_ROWS) as usize;
    if row_idx >= app.build_flat_rows().len() {
        return None;
    }
    Some(row_idx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gantt::Zoom;
    use crate::model::config::ProjectConfig;
    use crate::model::item::{Level, WorkItem};
    use crate::repo::json_file::ProjectFile;
    use crate::session::Session;
    use chrono::NaiveDate;
    use crossterm::event::KeyModifiers;
    use pretty_assertions::assert_eq;
    use ratatui::layout::Rect;
    use tempfile::TempDir;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn node(id: &str, level: Level, parent: Option<&str>) -> WorkItem {
        let mut it = WorkItem::new(id, level, id);
        it.parent = parent.map(str::to_string);
        it
    }

    /// App over a throwaway on-disk project, panes placed as the
    /// renderer would: tree on the left, timeline on the right
    fn sample_app(dir: &TempDir) -> App<JsonFileRepository> {
        let mut t1 = node("t1", Level::Level4, Some("a1x"));
        t1.planned_start = Some(date("2026-01-05"));
        t1.planned_end = Some(date("2026-01-10"));
        let file = ProjectFile {
            items: vec![
                node("a", Level::Level1, None),
                node("a1", Level::Level2, Some("a")),
                node("a1x", Level::Level3, Some("a1")),
                t1,
            ],
            ..Default::default()
        };
        let repo = JsonFileRepository::init(dir.path(), file).unwrap();
        let config: ProjectConfig = toml::from_str("[project]\nname = \"demo\"\n").unwrap();
        let session = Session::open(repo, "demo", config.schedule.weight_mode).unwrap();
        let mut app = App::new(config, session, date("2026-01-01"));
        app.tree_pane = Rect::new(0, 1, 40, 20);
        app.gantt_pane = Rect::new(40, 1, 40, 20);
        app.zoom = Zoom::Day;
        app
    }

    fn left_up(column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind: MouseEventKind::Up(MouseButton::Left),
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    fn start_move(app: &mut App<JsonFileRepository>) {
        let item = app.session.tree().get("t1").unwrap().clone();
        app.drag.begin(&item, DragMode::Move, 0).unwrap();
        let scale = app.scale();
        app.drag.update(12, &scale).unwrap(); // +3 days at day zoom
    }

    #[test]
    fn release_in_the_timeline_commits_the_gesture() {
        let dir = TempDir::new().unwrap();
        let mut app = sample_app(&dir);
        start_move(&mut app);

        handle_mouse(&mut app, left_up(50, 5));
        assert!(!app.drag.is_dragging());
        let t1 = app.session.tree().get("t1").unwrap();
        assert_eq!(t1.planned_start, Some(date("2026-01-08")));
        assert_eq!(t1.planned_end, Some(date("2026-01-13")));
    }

    #[test]
    fn release_outside_the_timeline_cancels_the_gesture() {
        let dir = TempDir::new().unwrap();
        let mut app = sample_app(&dir);
        start_move(&mut app);

        // Pointer-up over the tree pane drops the gesture
        handle_mouse(&mut app, left_up(10, 5));
        assert!(!app.drag.is_dragging());
        let t1 = app.session.tree().get("t1").unwrap();
        assert_eq!(t1.planned_start, Some(date("2026-01-05")));
        assert_eq!(t1.planned_end, Some(date("2026-01-10")));
    }

    #[test]
    fn drag_columns_clamp_to_the_pane() {
        let dir = TempDir::new().unwrap();
        let app = sample_app(&dir);
        assert_eq!(gantt_cell_x(&app, 10), 0); // left of the pane
        assert_eq!(gantt_cell_x(&app, 40), 0);
        assert_eq!(gantt_cell_x(&app, 55), 15);
        assert_eq!(gantt_cell_x(&app, 200), 39); // right of the pane
    }
}
