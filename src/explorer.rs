use std::io;
use std::panic;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use chrono::Local;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};

use treesnap::config::{SnapConfig, DEFAULT_OUTPUT_DIR};
use treesnap::engine::{
    default_output_path, export_snapshot, format_languages, list_directory, list_projects,
    project_name,
};
use treesnap::error::SnapError;
use treesnap::filters::FilterRules;
use treesnap::models::{ExportReport, SkippedFile, SnapshotMode};

const FILE_PREVIEW: usize = 10;

enum InputMode {
    Browsing,
    ShowingSkipped,
}

struct App {
    config: SnapConfig,
    filters: FilterRules,
    output_dir_name: String,

    root: PathBuf,
    current: PathBuf,
    dirs: Vec<PathBuf>,
    files: Vec<PathBuf>,
    state: ListState,

    input_mode: InputMode,
    is_processing: bool,
    status_msg: String,
    spinner_tick: u64,

    last_skipped: Vec<SkippedFile>,
    receiver: Option<mpsc::Receiver<Result<ExportReport, SnapError>>>,
}

impl App {
    fn new(config: SnapConfig, root: PathBuf) -> Self {
        let filters = config.filter_rules();
        let output_dir_name = config
            .output_root()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| DEFAULT_OUTPUT_DIR.to_string());

        let mut app = App {
            config,
            filters,
            output_dir_name,
            root: root.clone(),
            current: root.clone(),
            dirs: vec![],
            files: vec![],
            state: ListState::default(),
            input_mode: InputMode::Browsing,
            is_processing: false,
            status_msg: "Ready.".into(),
            spinner_tick: 0,
            last_skipped: vec![],
            receiver: None,
        };

        if let Err(e) = app.open(root) {
            app.status_msg = format!("❌ {e}");
        }
        app
    }

    /// Lists `dir` and makes it current. On failure nothing changes.
    fn open(&mut self, dir: PathBuf) -> Result<(), SnapError> {
        let (dirs, files) = if dir == self.root {
            // The root level behaves as the project picker.
            (list_projects(&dir, &self.output_dir_name)?, vec![])
        } else {
            let listing = list_directory(&dir, &self.filters)?;
            (listing.dirs, listing.files)
        };

        self.current = dir;
        self.dirs = dirs;
        self.files = files;
        self.state.select(if self.dirs.is_empty() { None } else { Some(0) });
        Ok(())
    }

    fn next(&mut self) {
        if self.dirs.is_empty() {
            return;
        }
        let i = match self.state.selected() {
            Some(i) if i + 1 < self.dirs.len() => i + 1,
            _ => 0,
        };
        self.state.select(Some(i));
    }

    fn previous(&mut self) {
        if self.dirs.is_empty() {
            return;
        }
        let i = match self.state.selected() {
            Some(0) | None => self.dirs.len() - 1,
            Some(i) => i - 1,
        };
        self.state.select(Some(i));
    }

    fn enter_selected(&mut self) {
        let Some(target) = self.state.selected().and_then(|i| self.dirs.get(i)).cloned() else {
            return;
        };
        match self.open(target) {
            Ok(()) => self.status_msg = "Ready.".into(),
            Err(e) => self.status_msg = format!("❌ Permission denied: {e}"),
        }
    }

    fn go_back(&mut self) {
        if self.current == self.root || !self.current.starts_with(&self.root) {
            self.status_msg = "⚠ Cannot go back further!".into();
            return;
        }
        let Some(parent) = self.current.parent().map(Path::to_path_buf) else {
            return;
        };
        if let Err(e) = self.open(parent) {
            self.status_msg = format!("❌ {e}");
        }
    }

    /// Exports run from inside a project, never from the picker itself.
    fn can_export(&self) -> bool {
        self.current != self.root
    }

    fn action_export(&mut self, mode: SnapshotMode) {
        if !self.can_export() {
            self.status_msg = "⚠ Open a project before exporting.".into();
            return;
        }
        let folder = project_name(&self.current);
        let output = default_output_path(&self.config.output_root(), &folder, mode);

        self.is_processing = true;
        self.status_msg = format!("Exporting {} snapshot of {folder}...", mode.as_str().to_uppercase());

        let (tx, rx) = mpsc::channel();
        self.receiver = Some(rx);
        let cfg = self.config.clone();
        let source = self.current.clone();

        thread::spawn(move || {
            tx.send(export_snapshot(&source, &output, mode, &cfg)).ok();
        });
    }

    fn check_progress(&mut self) {
        let Some(rx) = &self.receiver else {
            return;
        };
        let outcome = match rx.try_recv() {
            Ok(outcome) => outcome,
            Err(mpsc::TryRecvError::Empty) => return,
            Err(mpsc::TryRecvError::Disconnected) => Err(SnapError::io(
                &self.current,
                io::Error::new(io::ErrorKind::Other, "export worker stopped"),
            )),
        };

        self.is_processing = false;
        self.receiver = None;

        match outcome {
            Ok(report) => {
                self.status_msg = format!(
                    "✅ {} | exported {} files ({}) to {}",
                    Local::now().format("%H:%M:%S"),
                    report.stats.total_files,
                    format_languages(&report.stats),
                    report.output.display()
                );
                self.last_skipped = report.skipped;
                if !self.last_skipped.is_empty() {
                    self.input_mode = InputMode::ShowingSkipped;
                }
            }
            Err(e) => self.status_msg = format!("❌ Export failed: {e}"),
        }
    }
}

// ------------------------- UI helpers ------------------------------

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn draw(f: &mut Frame, app: &mut App) {
    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(8),
            Constraint::Length(3),
        ])
        .split(f.size());

    let header = Paragraph::new(format!(" -- TREESNAP -- {}", app.current.display()))
        .style(Style::default().fg(Color::Black).bg(Color::White));
    f.render_widget(header, main_chunks[0]);

    let split = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(main_chunks[1]);

    let dirs_title = if app.current == app.root { " Projects " } else { " Directories " };
    let dir_items: Vec<ListItem> = if app.dirs.is_empty() {
        vec![ListItem::new("(none)")]
    } else {
        app.dirs
            .iter()
            .map(|d| ListItem::new(format!("{}/", display_name(d))))
            .collect()
    };
    let list = List::new(dir_items)
        .block(Block::default().borders(Borders::ALL).title(dirs_title))
        .highlight_style(Style::default().bg(Color::Blue).add_modifier(Modifier::BOLD));
    f.render_stateful_widget(list, split[0], &mut app.state);

    let mut file_lines: Vec<Line> = app
        .files
        .iter()
        .take(FILE_PREVIEW)
        .map(|p| Line::from(vec![Span::raw("• "), Span::raw(display_name(p))]))
        .collect();
    if app.files.len() > FILE_PREVIEW {
        file_lines.push(Line::from(Span::styled(
            format!("... and {} more", app.files.len() - FILE_PREVIEW),
            Style::default().fg(Color::DarkGray),
        )));
    }
    if file_lines.is_empty() {
        file_lines.push(Line::from("(none)"));
    }
    f.render_widget(
        Paragraph::new(file_lines)
            .block(Block::default().borders(Borders::ALL).title(" Files "))
            .wrap(Wrap { trim: true }),
        split[1],
    );

    let footer = if app.is_processing {
        let blink = if (app.spinner_tick / 5) % 2 == 0 { "ƒ" } else { " " };
        format!("{} {blink}", app.status_msg)
    } else {
        match app.input_mode {
            InputMode::Browsing => format!(
                "{} | [Enter] Open | [B] Back | [F] Full | [S] Skeleton | [Q] Quit",
                app.status_msg
            ),
            InputMode::ShowingSkipped => "SKIPPED FILES: [Esc]/[Enter] close".into(),
        }
    };
    f.render_widget(
        Paragraph::new(footer)
            .block(Block::default().borders(Borders::ALL))
            .wrap(Wrap { trim: true }),
        main_chunks[2],
    );

    if let InputMode::ShowingSkipped = app.input_mode {
        let r = centered_rect(70, 50, f.size());
        f.render_widget(Clear, r);
        let lines: Vec<Line> = app
            .last_skipped
            .iter()
            .map(|s| {
                Line::from(vec![
                    Span::styled(s.path.clone(), Style::default().fg(Color::Yellow)),
                    Span::raw(format!(": {}", s.reason)),
                ])
            })
            .collect();
        f.render_widget(
            Paragraph::new(lines)
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .title(format!(" {} entries skipped ", app.last_skipped.len()))
                        .style(Style::default().fg(Color::Red)),
                )
                .wrap(Wrap { trim: true }),
            r,
        );
    }
}

pub fn run(config: SnapConfig, root: PathBuf) -> io::Result<()> {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    let mut app = App::new(config, root);

    loop {
        terminal.draw(|f| draw(f, &mut app))?;

        app.check_progress();
        app.spinner_tick = app.spinner_tick.wrapping_add(1);

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                match app.input_mode {
                    InputMode::ShowingSkipped => {
                        if matches!(key.code, KeyCode::Esc | KeyCode::Enter) {
                            app.input_mode = InputMode::Browsing;
                        }
                    }
                    InputMode::Browsing => match key.code {
                        KeyCode::Char('q') => break,
                        _ if app.is_processing => {}
                        KeyCode::Down => app.next(),
                        KeyCode::Up => app.previous(),
                        KeyCode::Enter => app.enter_selected(),
                        KeyCode::Char('b') | KeyCode::Backspace => app.go_back(),
                        KeyCode::Char('f') => app.action_export(SnapshotMode::Full),
                        KeyCode::Char('s') => app.action_export(SnapshotMode::Skeleton),
                        _ => {}
                    },
                }
            }
        }
    }

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    Ok(())
}
