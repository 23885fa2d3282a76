pub mod gantt_pane;
pub mod help_overlay;
pub mod status_row;
pub mod tree_pane;

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::Style;
use ratatui::text::Span;
use ratatui::widgets::{Block, Paragraph};

use crate::repo::json_file::JsonFileRepository;

use super::app::App;

/// Header rows above the scrolling rows (timeline scale)
pub const GANTT_HEADER_ROWS: u16 = 2;

/// Main render function — dispatches to the panes
pub fn render(frame: &mut Frame, app: &mut App<JsonFileRepository>) {
    let area = frame.area();

    // Background fill
    let bg_style = Style::default().bg(app.theme.background);
    frame.render_widget(Block::default().style(bg_style), area);

    // Layout: title row | panes | status row
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(area);

    let title = format!(
        " {}  {}%",
        app.config.project.name,
        app.session.project_progress()
    );
    frame.render_widget(
        Paragraph::new(Span::styled(
            title,
            Style::default()
                .fg(app.theme.text_bright)
                .bg(app.theme.background),
        )),
        rows[0],
    );

    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(46), Constraint::Min(20)])
        .split(rows[1]);
    app.tree_pane = panes[0];
    app.gantt_pane = panes[1];

    // Keep the cursor on screen before either pane draws
    let visible = rows[1].height.saturating_sub(GANTT_HEADER_ROWS) as usize;
    if visible > 0 {
        if app.cursor < app.scroll_offset {
            app.scroll_offset = app.cursor;
        } else if app.cursor >= app.scroll_offset + visible {
            app.scroll_offset = app.cursor + 1 - visible;
        }
    }

    tree_pane::render_tree_pane(frame, app, panes[0]);
    gantt_pane::render_gantt_pane(frame, app, panes[1]);
    status_row::render_status_row(frame, app, rows[2]);

    if app.show_help {
        help_overlay::render_help_overlay(frame, app, frame.area());
    }
}
