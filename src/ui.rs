use anyhow::Result;
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
    widgets::{Block, Borders, Paragraph},
    Frame, Terminal,
};
use std::io;
use std::path::Path;

use barcode_catalog::{DeleteOutcome, Session};

/// Rows moved by PgUp/PgDn
const PAGE: u16 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    Open,
    Delete,
}

impl PromptKind {
    pub fn title(&self) -> &str {
        match self {
            PromptKind::Open => "Enter the spreadsheet path to open:",
            PromptKind::Delete => "Enter the barcode to delete:",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub kind: PromptKind,
    pub input: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub kind: StatusKind,
}

pub struct App {
    pub session: Session,
    /// Text panel contents; empty until something is printed
    pub panel: Vec<String>,
    pub scroll: u16,
    pub prompt: Option<Prompt>,
    pub status: Option<StatusMessage>,
}

impl App {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            panel: Vec::new(),
            scroll: 0,
            prompt: None,
            status: None,
        }
    }

    fn info(&mut self, text: impl Into<String>) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind: StatusKind::Info,
        });
    }

    fn error(&mut self, text: impl Into<String>) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind: StatusKind::Error,
        });
    }

    /// Fill the panel with the current listing
    pub fn print_list(&mut self) {
        self.panel = self.session.list().lines();
        self.scroll = 0;
    }

    /// Load a file typed into the open prompt
    pub fn open_file(&mut self, input: &str) {
        let input = input.trim();
        if input.is_empty() {
            self.error("No file selected.");
            return;
        }

        match self.session.load(Path::new(input)) {
            Ok(summary) => {
                let mut text = format!("Loaded {} entries from {}", summary.entries, input);
                if summary.rows_skipped > 0 {
                    text.push_str(&format!(", {} rows skipped", summary.rows_skipped));
                }
                if let Some(first) = summary.warnings.first() {
                    text.push_str(&format!(
                        ", {} invalid prices (row {}: {})",
                        summary.warnings.len(),
                        first.line,
                        first.error
                    ));
                }
                self.info(text);
                self.panel.clear();
                self.scroll = 0;
            }
            Err(err) => self.error(format!("Error: {}", err)),
        }
    }

    /// Delete the barcode typed into the delete prompt. Exact match.
    pub fn delete_entry(&mut self, key: &str) -> DeleteOutcome {
        let outcome = self.session.delete(key);
        self.info(outcome.message());

        if outcome.found() && !self.panel.is_empty() {
            self.print_list();
        }
        outcome
    }

    pub fn reload(&mut self) {
        match self.session.reload() {
            Ok(summary) => {
                let state = if summary.unchanged { "unchanged" } else { "changed" };
                self.info(format!("Reloaded {} entries (file {})", summary.entries, state));
                if !self.panel.is_empty() {
                    self.print_list();
                }
            }
            Err(err) => self.error(format!("Error: {}", err)),
        }
    }

    pub fn scroll_down(&mut self, rows: u16) {
        let max = self.panel.len().saturating_sub(1).min(u16::MAX as usize) as u16;
        self.scroll = self.scroll.saturating_add(rows).min(max);
    }

    pub fn scroll_up(&mut self, rows: u16) {
        self.scroll = self.scroll.saturating_sub(rows);
    }

    fn submit_prompt(&mut self) {
        let Some(prompt) = self.prompt.take() else {
            return;
        };

        match prompt.kind {
            PromptKind::Open => self.open_file(&prompt.input),
            PromptKind::Delete => {
                self.delete_entry(&prompt.input);
            }
        }
    }

    fn cancel_prompt(&mut self) {
        if let Some(prompt) = self.prompt.take() {
            match prompt.kind {
                PromptKind::Open => self.status = None,
                // Cancelling the delete dialog deletes nothing
                PromptKind::Delete => self.info(DeleteOutcome::NotFound.message()),
            }
        }
    }

    /// Handle one key press. Returns `true` when the app should quit.
    pub fn handle_key(&mut self, code: KeyCode) -> bool {
        if self.prompt.is_some() {
            match code {
                KeyCode::Enter => self.submit_prompt(),
                KeyCode::Esc => self.cancel_prompt(),
                KeyCode::Backspace => {
                    if let Some(prompt) = self.prompt.as_mut() {
                        prompt.input.pop();
                    }
                }
                KeyCode::Char(c) => {
                    if let Some(prompt) = self.prompt.as_mut() {
                        prompt.input.push(c);
                    }
                }
                _ => {}
            }
            return false;
        }

        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Char('o') => {
                self.prompt = Some(Prompt {
                    kind: PromptKind::Open,
                    input: String::new(),
                })
            }
            KeyCode::Char('p') => self.print_list(),
            KeyCode::Char('d') => {
                self.prompt = Some(Prompt {
                    kind: PromptKind::Delete,
                    input: String::new(),
                })
            }
            KeyCode::Char('r') => self.reload(),
            KeyCode::Down | KeyCode::Char('j') => self.scroll_down(1),
            KeyCode::Up | KeyCode::Char('k') => self.scroll_up(1),
            KeyCode::PageDown => self.scroll_down(PAGE),
            KeyCode::PageUp => self.scroll_up(PAGE),
            KeyCode::Home => self.scroll = 0,
            _ => {}
        }
        false
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if app.handle_key(key.code) {
                return Ok(());
            }
        }
    }
}

fn ui(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Text panel
            Constraint::Length(3), // Status bar / prompt
        ])
        .split(f.size());

    render_header(f, chunks[0], app);
    render_panel(f, chunks[1], app);

    match &app.prompt {
        Some(prompt) => render_prompt(f, chunks[2], prompt),
        None => render_status_bar(f, chunks[2], app),
    }
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let mut spans = vec![
        Span::styled(
            "Barcode Scanner",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  |  "),
        Span::styled(
            format!("Entries: {}", app.session.catalog().len()),
            Style::default().fg(Color::White),
        ),
        Span::raw("  |  "),
    ];

    match app.session.source() {
        Some(source) => {
            spans.push(Span::styled(
                source.path.display().to_string(),
                Style::default().fg(Color::Green),
            ));
            spans.push(Span::styled(
                format!(
                    "  ({}, sha {}, {})",
                    source.source_type.name(),
                    source.short_fingerprint(),
                    source.loaded_at.format("%H:%M:%S")
                ),
                Style::default().fg(Color::DarkGray),
            ));
        }
        None => spans.push(Span::styled("No file loaded", Style::default().fg(Color::DarkGray))),
    }

    let header = Paragraph::new(vec![Line::from(spans)])
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Cyan)));

    f.render_widget(header, area);
}

fn render_panel(f: &mut Frame, area: Rect, app: &App) {
    let lines: Vec<Line> = app.panel.iter().map(|l| Line::from(l.as_str())).collect();

    let panel = Paragraph::new(lines).scroll((app.scroll, 0)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Products "),
    );

    f.render_widget(panel, area);
}

fn render_prompt(f: &mut Frame, area: Rect, prompt: &Prompt) {
    let line = Line::from(vec![
        Span::styled(
            format!(" {} ", prompt.kind.title()),
            Style::default().fg(Color::Yellow),
        ),
        Span::raw(prompt.input.as_str()),
        Span::styled("_", Style::default().add_modifier(Modifier::SLOW_BLINK)),
    ]);

    let widget = Paragraph::new(vec![line]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(" Enter: confirm | Esc: cancel "),
    );

    f.render_widget(widget, area);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let mut status_spans = Vec::new();

    if let Some(status) = &app.status {
        let color = match status.kind {
            StatusKind::Info => Color::Green,
            StatusKind::Error => Color::Red,
        };
        status_spans.push(Span::styled(
            format!(" {} ", status.text),
            Style::default().fg(color),
        ));
        status_spans.push(Span::raw(" | "));
    }

    status_spans.push(Span::styled("o", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Open | "));
    status_spans.push(Span::styled("p", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Print List | "));
    status_spans.push(Span::styled("d", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Delete | "));
    status_spans.push(Span::styled("r", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Reload | "));
    status_spans.push(Span::styled("↑/↓", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Scroll | "));
    status_spans.push(Span::styled("q", Style::default().fg(Color::Red)));
    status_spans.push(Span::raw(" Quit"));

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}
