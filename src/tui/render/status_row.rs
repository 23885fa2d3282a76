use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::repo::json_file::JsonFileRepository;
use crate::tui::app::{App, Mode};

/// Bottom row: one-shot messages, confirmation prompts, key hints.
pub fn render_status_row(frame: &mut Frame, app: &App<JsonFileRepository>, area: Rect) {
    let bg = app.theme.background;
    let width = area.width as usize;

    let (left, left_color) = match &app.mode {
        Mode::ConfirmDelete { id, count } => (
            format!(" delete {} ({} item(s))? y/N", id, count),
            app.theme.red,
        ),
        Mode::Navigate => match &app.status_message {
            Some(msg) => (format!(" {}", msg), app.theme.text),
            None if app.config.ui.show_key_hints => (
                " j/k move  space select  </> level  d delete  r register  +/- zoom  ? help  q quit"
                    .to_string(),
                app.theme.dim,
            ),
            None => (String::new(), app.theme.dim),
        },
    };

    let right = if app.drag.is_dragging() {
        if let Some(id) = app.drag.dragging_id() {
            format!("dragging {} ", id)
        } else {
            String::new()
        }
    } else if !app.selection.is_empty() {
        format!("{} selected ", app.selection.len())
    } else {
        format!("{} ", app.zoom.name())
    };

    let pad = width.saturating_sub(left.chars().count() + right.chars().count());
    let line = Line::from(vec![
        Span::styled(left, Style::default().fg(left_color).bg(bg)),
        Span::styled(" ".repeat(pad), Style::default().bg(bg)),
        Span::styled(right, Style::default().fg(app.theme.dim).bg(bg)),
    ]);

    frame.render_widget(Paragraph::new(line).style(Style::default().bg(bg)), area);
}
