use chrono::Datelike;
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::ops::rollup;
use crate::repo::json_file::JsonFileRepository;
use crate::tui::app::App;

use super::GANTT_HEADER_ROWS;

/// Render the timeline: a date scale on top, then one bar row per
/// visible tree row. The bar under an active drag shows the preview
/// dates, not the committed ones.
pub fn render_gantt_pane(frame: &mut Frame, app: &App<JsonFileRepository>, area: Rect) {
    let bg = app.theme.background;
    let width = area.width as usize;
    let scale = app.scale();
    let today_x = scale.x_of(app.today);

    let mut lines: Vec<Line> = Vec::with_capacity(area.height as usize);
    lines.push(month_row(app, width));
    lines.push(day_row(app, width));

    let rows = app.build_flat_rows();
    let visible = area.height.saturating_sub(GANTT_HEADER_ROWS) as usize;
    for (idx, row) in rows
        .iter()
        .enumerate()
        .skip(app.scroll_offset)
        .take(visible)
    {
        let Some(item) = app.session.tree().get(&row.id) else {
            continue;
        };
        let is_cursor = idx == app.cursor;
        let row_bg = if is_cursor { app.theme.selection_bg } else { bg };

        let mut cells: Vec<(char, Color)> = vec![(' ', app.theme.dim); width];
        if today_x >= 0 && (today_x as usize) < width {
            cells[today_x as usize] = ('│', app.theme.today_marker);
        }

        // An in-flight gesture overrides the stored dates for its row
        let preview = app.drag.preview_for(&row.id);
        let (start, end) = match preview {
            Some(p) => (Some(p.start), Some(p.end)),
            None => (item.planned_start, item.planned_end),
        };

        if let (Some(start), Some(end)) = (start, end) {
            let x0 = scale.x_of(start);
            let x1 = scale.x_of(end) + scale.cell_width as i64 - 1;
            let status = rollup::display_status(item, app.today);
            let color = if preview.is_some() {
                app.theme.highlight
            } else {
                app.theme.status_color(status)
            };
            let glyph = if row.has_children { '▒' } else { '█' };
            for x in x0.max(0)..=x1.min(width as i64 - 1) {
                cells[x as usize] = (glyph, color);
            }
        }

        lines.push(cells_to_line(&cells, row_bg));
    }

    frame.render_widget(
        Paragraph::new(lines).style(Style::default().bg(bg)),
        area,
    );
}

/// Month names at the first visible cell of each month
fn month_row(app: &App<JsonFileRepository>, width: usize) -> Line<'static> {
    const MONTHS: [&str; 12] = [
        "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
    ];
    let scale = app.scale();
    let mut text = vec![' '; width];
    let mut x = 0usize;
    while x < width {
        let date = scale.date_at(x as i64);
        if x == 0 || date.day() == 1 {
            let label = format!("{} {}", MONTHS[date.month0() as usize], date.year());
            for (i, c) in label.chars().enumerate() {
                if x + i < width {
                    text[x + i] = c;
                }
            }
            x += label.len().max(1);
        } else {
            x += 1;
        }
    }
    Line::from(Span::styled(
        text.into_iter().collect::<String>(),
        Style::default()
            .fg(app.theme.text)
            .bg(app.theme.background),
    ))
}

/// Day-of-month ticks every seven days from the timeline origin
fn day_row(app: &App<JsonFileRepository>, width: usize) -> Line<'static> {
    let scale = app.scale();
    let mut text = vec![' '; width];
    let mut x = 0usize;
    while x < width {
        let date = scale.date_at(x as i64);
        let offset = (date - app.origin).num_days();
        if offset % 7 == 0 && scale.x_of(date) == x as i64 {
            let label = format!("{:02}", date.day());
            for (i, c) in label.chars().enumerate() {
                if x + i < width {
                    text[x + i] = c;
                }
            }
            x += label.len();
        } else {
            x += 1;
        }
    }
    Line::from(Span::styled(
        text.into_iter().collect::<String>(),
        Style::default()
            .fg(app.theme.dim)
            .bg(app.theme.background),
    ))
}

/// Collapse a cell buffer into spans, grouping runs of the same color
fn cells_to_line(cells: &[(char, Color)], bg: Color) -> Line<'static> {
    let mut spans = Vec::new();
    let mut run = String::new();
    let mut run_color: Option<Color> = None;
    for (c, color) in cells {
        if Some(*color) != run_color {
            if !run.is_empty() {
                spans.push(Span::styled(
                    std::mem::take(&mut run),
                    Style::default().fg(run_color.unwrap_or(bg)).bg(bg),
                ));
            }
            run_color = Some(*color);
        }
        run.push(*c);
    }
    if !run.is_empty() {
        spans.push(Span::styled(
            run,
            Style::default().fg(run_color.unwrap_or(bg)).bg(bg),
        ));
    }
    Line::from(spans)
}
