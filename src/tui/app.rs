use std::collections::HashSet;
use std::io;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, NaiveDate};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Rect;

use crate::gantt::{DragController, TimeScale, Zoom};
use crate::model::config::ProjectConfig;
use crate::repo::json_file::{self, JsonFileRepository};
use crate::repo::{ItemRepository, TaskRegistry};
use crate::session::Session;

use super::input;
use super::render;
use super::theme::Theme;

/// Current interaction mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Navigate,
    /// Pending delete of the cursor row (y confirms)
    ConfirmDelete { id: String, count: usize },
}

/// One visible row of the tree pane — the collapsed-aware flattening of
/// the WBS in display order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatRow {
    pub id: String,
    pub depth: usize,
    pub has_children: bool,
    pub is_expanded: bool,
}

/// Main application state
pub struct App<R: ItemRepository = JsonFileRepository> {
    pub session: Session<R>,
    pub config: ProjectConfig,
    pub theme: Theme,
    pub mode: Mode,
    pub should_quit: bool,
    pub show_help: bool,
    /// The clock for delay detection; fixed at startup (or by --today)
    pub today: NaiveDate,
    /// Cursor index into the flat visible rows
    pub cursor: usize,
    /// First visible row of the panes
    pub scroll_offset: usize,
    /// Item ids whose children are visible
    pub expanded: HashSet<String>,
    /// Multi-selection for bulk operations
    pub selection: HashSet<String>,
    pub zoom: Zoom,
    /// Leftmost date of the timeline pane
    pub origin: NaiveDate,
    pub drag: DragController,
    /// One-shot message shown in the status row
    pub status_message: Option<String>,
    /// Pane geometry from the last draw, for mouse hit-testing
    pub tree_pane: Rect,
    pub gantt_pane: Rect,
}

impl<R: ItemRepository> App<R> {
    pub fn new(config: ProjectConfig, session: Session<R>, today: NaiveDate) -> Self {
        let theme = Theme::from_config(&config.ui);
        let zoom = Zoom::from_name(&config.schedule.zoom).unwrap_or(Zoom::Week);

        // Start the timeline a week before the earliest planned date
        let earliest = session
            .tree()
            .roots()
            .iter()
            .filter_map(|id| session.tree().get(id))
            .filter_map(|i| i.planned_start)
            .min()
            .unwrap_or(today);
        let origin = earliest - ChronoDuration::days(7);

        // Roots start expanded so the first screen shows structure
        let expanded: HashSet<String> = session.tree().roots().iter().cloned().collect();

        App {
            session,
            config,
            theme,
            mode: Mode::Navigate,
            should_quit: false,
            show_help: false,
            today,
            cursor: 0,
            scroll_offset: 0,
            expanded,
            selection: HashSet::new(),
            zoom,
            origin,
            drag: DragController::new(),
            status_message: None,
            tree_pane: Rect::default(),
            gantt_pane: Rect::default(),
        }
    }

    pub fn scale(&self) -> TimeScale {
        TimeScale::new(self.origin, self.zoom)
    }

    /// Build the visible rows: preorder over the roots, stopping at
    /// collapsed nodes. Cost is proportional to what is on screen-able
    /// rows, not to the whole tree.
    pub fn build_flat_rows(&self) -> Vec<FlatRow> {
        let mut rows = Vec::new();
        for root in self.session.tree().roots().to_vec() {
            self.flatten_into(&root, 0, &mut rows);
        }
        rows
    }

    fn flatten_into(&self, id: &str, depth: usize, rows: &mut Vec<FlatRow>) {
        let Some(item) = self.session.tree().get(id) else {
            return;
        };
        let has_children = !item.children.is_empty();
        let is_expanded = has_children && self.expanded.contains(id);
        rows.push(FlatRow {
            id: id.to_string(),
            depth,
            has_children,
            is_expanded,
        });
        if is_expanded {
            for child in item.children.clone() {
                self.flatten_into(&child, depth + 1, rows);
            }
        }
    }

    /// The item under the cursor, if any
    pub fn cursor_id(&self) -> Option<String> {
        self.build_flat_rows().get(self.cursor).map(|r| r.id.clone())
    }

    pub fn clamp_cursor(&mut self) {
        let count = self.build_flat_rows().len();
        if count == 0 {
            self.cursor = 0;
        } else if self.cursor >= count {
            self.cursor = count - 1;
        }
    }

    /// Keep the cursor on `id` after a structural change re-flattens
    pub fn cursor_to(&mut self, id: &str) {
        if let Some(idx) = self.build_flat_rows().iter().position(|r| r.id == id) {
            self.cursor = idx;
        } else {
            self.clamp_cursor();
        }
    }

    pub fn say(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
    }
}

impl<R: ItemRepository + TaskRegistry> App<R> {
    /// Register the selection (or the cursor row) as tasks
    pub fn register_selection(&mut self) {
        let ids: Vec<String> = if self.selection.is_empty() {
            self.cursor_id().into_iter().collect()
        } else {
            // Selection in display order
            let selected = self.selection.clone();
            self.build_flat_rows()
                .into_iter()
                .map(|r| r.id)
                .filter(|id| selected.contains(id))
                .collect()
        };
        if ids.is_empty() {
            return;
        }
        match self.session.register_tasks(&ids) {
            Ok(report) => self.say(format!(
                "registered {} task(s), skipped {}, {} failed",
                report.registered.len(),
                report.skipped.len(),
                report.failed.len()
            )),
            Err(e) => self.say(format!("register failed: {}", e)),
        }
    }
}

/// Run the TUI application
pub fn run(
    project_dir: Option<&str>,
    today: Option<NaiveDate>,
) -> Result<(), Box<dyn std::error::Error>> {
    let start = match project_dir {
        Some(dir) => std::fs::canonicalize(dir)?,
        None => std::env::current_dir()?,
    };
    let root = json_file::discover_root(&start)
        .ok_or("no beam project found (beam.toml missing; run `beam init`)")?;
    let config = json_file::load_config(&root)?;
    let repo = JsonFileRepository::open(&root)?;
    let session = Session::open(repo, config.project_id(), config.schedule.weight_mode)?;
    let today = today.unwrap_or_else(|| chrono::Local::now().date_naive());

    let mut app = App::new(config, session, today);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    // Install panic hook to restore terminal on panic
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
        original_hook(panic_info);
    }));

    let result = run_event_loop(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        terminal.draw(|frame| render::render(frame, app))?;

        if event::poll(Duration::from_millis(250))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    input::handle_key(app, key);
                }
                Event::Mouse(mouse) => {
                    input::handle_mouse(app, mouse);
                }
                _ => {}
            }
        }

        if app.should_quit {
            break;
        }
    }
    Ok(())
}
