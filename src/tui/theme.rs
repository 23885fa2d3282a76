use ratatui::style::Color;

use crate::model::config::UiConfig;
use crate::model::item::DisplayStatus;

/// Parsed color theme for the TUI
#[derive(Debug, Clone)]
pub struct Theme {
    pub background: Color,
    pub text: Color,
    pub text_bright: Color,
    pub highlight: Color,
    pub dim: Color,
    pub red: Color,
    pub yellow: Color,
    pub green: Color,
    pub cyan: Color,
    pub selection_bg: Color,
    pub today_marker: Color,
    pub grid: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Theme {
            background: Color::Rgb(0x10, 0x15, 0x21),
            text: Color::Rgb(0xC8, 0xD3, 0xF5),
            text_bright: Color::Rgb(0xFF, 0xFF, 0xFF),
            highlight: Color::Rgb(0xFF, 0xC7, 0x77),
            dim: Color::Rgb(0x54, 0x5C, 0x7E),
            red: Color::Rgb(0xFF, 0x75, 0x7F),
            yellow: Color::Rgb(0xFF, 0xC7, 0x77),
            green: Color::Rgb(0xC3, 0xE8, 0x8D),
            cyan: Color::Rgb(0x86, 0xE1, 0xFC),
            selection_bg: Color::Rgb(0x2F, 0x33, 0x4D),
            today_marker: Color::Rgb(0xFF, 0x75, 0x7F),
            grid: Color::Rgb(0x1E, 0x24, 0x36),
        }
    }
}

/// Parse a hex color string like "#FF4444" into an RGB Color
fn parse_hex_color(hex: &str) -> Option<Color> {
    let hex = hex.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some(Color::Rgb(r, g, b))
}

impl Theme {
    /// Create a theme from project UI config, falling back to defaults
    pub fn from_config(ui: &UiConfig) -> Self {
        let mut theme = Theme::default();
        for (key, value) in &ui.colors {
            if let Some(color) = parse_hex_color(value) {
                match key.as_str() {
                    "background" => theme.background = color,
                    "text" => theme.text = color,
                    "text_bright" => theme.text_bright = color,
                    "highlight" => theme.highlight = color,
                    "dim" => theme.dim = color,
                    "red" => theme.red = color,
                    "yellow" => theme.yellow = color,
                    "green" => theme.green = color,
                    "cyan" => theme.cyan = color,
                    "selection_bg" => theme.selection_bg = color,
                    "today_marker" => theme.today_marker = color,
                    "grid" => theme.grid = color,
                    _ => {}
                }
            }
        }
        theme
    }

    /// Get the color for a display status
    pub fn status_color(&self, status: DisplayStatus) -> Color {
        match status {
            DisplayStatus::Pending => self.dim,
            DisplayStatus::InProgress => self.cyan,
            DisplayStatus::Holding => self.yellow,
            DisplayStatus::Completed => self.green,
            DisplayStatus::Cancelled => self.dim,
            DisplayStatus::Delayed => self.red,
        }
    }
}
