use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::ops::rollup;
use crate::repo::json_file::JsonFileRepository;
use crate::tui::app::App;
use crate::util::text::truncate_to_width;

use super::GANTT_HEADER_ROWS;

/// Render the WBS outline: code, expand marker, status symbol, name,
/// progress. Scrolls in lockstep with the timeline pane.
pub fn render_tree_pane(frame: &mut Frame, app: &App<JsonFileRepository>, area: Rect) {
    let bg = app.theme.background;
    let rows = app.build_flat_rows();
    let visible = area.height.saturating_sub(GANTT_HEADER_ROWS) as usize;

    let mut lines: Vec<Line> = Vec::with_capacity(visible + 2);

    // Column header, aligned with the timeline scale rows
    lines.push(Line::from(Span::styled(
        format!(" {:<9}{:<30}{:>5}", "code", "item", "%"),
        Style::default().fg(app.theme.dim).bg(bg),
    )));
    lines.push(Line::from(Span::styled(
        "─".repeat(area.width as usize),
        Style::default().fg(app.theme.grid).bg(bg),
    )));

    for (idx, row) in rows
        .iter()
        .enumerate()
        .skip(app.scroll_offset)
        .take(visible)
    {
        let Some(item) = app.session.tree().get(&row.id) else {
            continue;
        };
        let status = rollup::display_status(item, app.today);

        let is_cursor = idx == app.cursor;
        let is_selected = app.selection.contains(&row.id);
        let row_bg = if is_cursor { app.theme.selection_bg } else { bg };

        let marker = if row.has_children {
            if row.is_expanded { "▾ " } else { "▸ " }
        } else {
            "  "
        };
        let select_mark = if is_selected { "*" } else { " " };

        let indent = "  ".repeat(row.depth);
        let name_width = (area.width as usize)
            .saturating_sub(10 + indent.len() + marker.len() + 7);
        let name = truncate_to_width(&item.name, name_width);

        let name_style = if is_cursor {
            Style::default()
                .fg(app.theme.text_bright)
                .bg(row_bg)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(app.theme.text).bg(row_bg)
        };

        let mut spans = vec![
            Span::styled(
                format!("{}{:<9}", select_mark, item.code),
                Style::default().fg(app.theme.dim).bg(row_bg),
            ),
            Span::styled(
                format!("{}{}", indent, marker),
                Style::default().fg(app.theme.dim).bg(row_bg),
            ),
            Span::styled(
                format!("{} ", status.symbol()),
                Style::default().fg(app.theme.status_color(status)).bg(row_bg),
            ),
            Span::styled(name, name_style),
        ];

        // Right-align the progress cell
        let used: usize = spans.iter().map(|s| s.content.chars().count()).sum();
        let progress = format!("{:>3}%", item.progress);
        let pad = (area.width as usize).saturating_sub(used + progress.len());
        spans.push(Span::styled(
            " ".repeat(pad),
            Style::default().bg(row_bg),
        ));
        spans.push(Span::styled(
            progress,
            Style::default().fg(app.theme.status_color(status)).bg(row_bg),
        ));

        lines.push(Line::from(spans));
    }

    frame.render_widget(
        Paragraph::new(lines).style(Style::default().bg(bg)),
        area,
    );
}
