use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Clear, Paragraph};

use crate::repo::json_file::JsonFileRepository;
use crate::tui::app::App;

const BINDINGS: &[(&str, &str)] = &[
    ("j/k, ↓/↑", "move cursor"),
    ("g/G", "first / last row"),
    ("l, →, enter", "expand / collapse"),
    ("h, ←", "collapse or jump to parent"),
    ("E / C", "expand / collapse all"),
    ("space", "toggle selection"),
    ("<", "promote item one level"),
    (">", "demote item under its sibling"),
    ("d", "delete item (with confirmation)"),
    ("r", "register selection as tasks"),
    ("+/-", "zoom timeline in / out"),
    ("[ / ]", "pan timeline by a week"),
    ("t", "jump timeline to today"),
    ("drag bar", "move schedule"),
    ("drag bar edge", "resize schedule"),
    ("esc", "cancel drag / clear selection"),
    ("q", "quit"),
];

/// Centered key-binding reference, dismissed by any key.
pub fn render_help_overlay(frame: &mut Frame, app: &App<JsonFileRepository>, area: Rect) {
    let width = 44u16.min(area.width);
    let height = (BINDINGS.len() as u16 + 2).min(area.height);
    let popup = Rect {
        x: area.x + (area.width.saturating_sub(width)) / 2,
        y: area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height,
    };

    let lines: Vec<Line> = BINDINGS
        .iter()
        .map(|(key, action)| {
            Line::from(vec![
                Span::styled(
                    format!(" {:<14}", key),
                    Style::default()
                        .fg(app.theme.cyan)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(*action, Style::default().fg(app.theme.text)),
            ])
        })
        .collect();

    let block = Block::default()
        .title(" keys ")
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(app.theme.highlight))
        .style(Style::default().bg(app.theme.background));

    frame.render_widget(Clear, popup);
    frame.render_widget(Paragraph::new(lines).block(block), popup);
}
