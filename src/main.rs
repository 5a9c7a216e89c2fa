mod chart;
mod config;
mod error;
mod logging;
mod models;
mod storage;

use crate::chart::PieChart;
use crate::config::{Cli, Command, Settings};
use crate::error::TrackerResult;
use crate::models::{Summary, Tracker, format_currency, round_cents};
use crate::storage::Storage;
use anyhow::{Context, Result};
use clap::Parser;
use crossterm::ExecutableCommand;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, Paragraph, Tabs, Wrap};
use std::io::{Stdout, stdout};
use std::time::Duration;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = cli.settings()?;
    logging::init_tracing(&settings.log_file)?;
    let storage = Storage::new(settings.data_file.clone());

    let res = match cli.command {
        Some(command) => run_command(&settings, &storage, command),
        None => App::new(storage).and_then(|mut app| run(&mut app)),
    };
    if let Err(err) = res {
        tracing::error!("{err:#}");
        eprintln!("Application error: {err:?}");
        std::process::exit(1);
    }
    Ok(())
}

fn run_command(settings: &Settings, storage: &Storage, command: Command) -> Result<()> {
    match command {
        Command::Path => {
            println!("data: {}", settings.data_file.display());
            println!("log:  {}", settings.log_file.display());
        }
        Command::Add { category, amount } => {
            let mut tracker = storage.load()?;
            let record = tracker.add_entry(&category, &amount)?.to_string();
            storage.save(&tracker)?;
            println!("Added {record}");
        }
        Command::Summary => print!("{}", summary_report(&storage.load()?)?),
        Command::Records => {
            for entry in storage.load()?.records_newest_first() {
                println!("{entry}");
            }
        }
        Command::Target { value } => {
            let mut tracker = storage.load()?;
            let target = tracker.set_target(&value)?;
            storage.save(&tracker)?;
            println!("Monthly target set to ${target}");
        }
        Command::Reset => {
            let mut tracker = storage.load()?;
            storage.reset(&mut tracker)?;
            println!("All data has been reset.");
        }
    }
    Ok(())
}

fn summary_lines(summary: &Summary) -> [String; 3] {
    let remaining = match summary.remaining {
        Some(value) => format_currency(value),
        None => "NAN".to_string(),
    };
    [
        format!("Total Expense: {}", format_currency(summary.total)),
        format!("Remaining Budget: {remaining}"),
        format!("Mean: {:.2}", round_cents(summary.mean)),
    ]
}

fn summary_report(tracker: &Tracker) -> TrackerResult<String> {
    let summary = tracker.summary()?;
    let mut report = summary_lines(&summary).join("\n");
    report.push_str("\nBy category:\n");
    for slice in chart::slices(tracker.category_breakdown()?) {
        report.push_str(&format!(
            "  {}: {} ({:.1}%)\n",
            slice.label,
            format_currency(slice.amount),
            slice.share * 100.0
        ));
    }
    report.push_str(&format!("{} records\n", summary.count));
    Ok(report)
}

fn run(app: &mut App) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    stdout
        .execute(EnterAlternateScreen)
        .context("failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, app);

    disable_raw_mode()?;
    terminal
        .backend_mut()
        .execute(LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor()?;

    result
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tab {
    Records,
    Analysis,
    AddNew,
    Reports,
    Account,
}

impl Tab {
    const ALL: [Tab; 5] = [
        Tab::Records,
        Tab::Analysis,
        Tab::AddNew,
        Tab::Reports,
        Tab::Account,
    ];

    fn title(self) -> &'static str {
        match self {
            Tab::Records => "Records",
            Tab::Analysis => "Analysis",
            Tab::AddNew => "Add New",
            Tab::Reports => "Reports",
            Tab::Account => "Account",
        }
    }

    fn index(self) -> usize {
        Self::ALL.iter().position(|t| *t == self).unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Message {
    Info(String),
    Warning(String),
}

impl Message {
    fn style(&self) -> Style {
        match self {
            Message::Info(_) => Style::default().fg(Color::Yellow),
            Message::Warning(_) => Style::default()
                .fg(Color::Red)
                .add_modifier(Modifier::BOLD),
        }
    }

    fn text(&self) -> &str {
        match self {
            Message::Info(text) | Message::Warning(text) => text,
        }
    }
}

struct App {
    tracker: Tracker,
    storage: Storage,
    active_tab: Tab,
    form: Option<Form>,
    confirm_reset: bool,
    last_message: Message,
}

impl App {
    fn new(storage: Storage) -> Result<Self> {
        let tracker = storage.load()?;
        Ok(Self {
            tracker,
            storage,
            active_tab: Tab::AddNew,
            form: None,
            confirm_reset: false,
            last_message: Message::Info("Loaded data".to_string()),
        })
    }

    fn save(&mut self) -> Result<()> {
        self.storage
            .save(&self.tracker)
            .context("saving expense data failed")?;
        self.last_message = Message::Info(format!("Saved to {}", self.storage.path().display()));
        Ok(())
    }

    /// Persists after a successful edit and reports `done` to the user.
    fn commit(&mut self, done: String) {
        match self.save() {
            Ok(()) => self.last_message = Message::Info(done),
            Err(err) => {
                tracing::warn!("{err:#}");
                self.last_message = Message::Warning(format!("{done} Not saved: {err:#}"));
            }
        }
    }

    fn select_tab(&mut self, tab: Tab) {
        self.active_tab = tab;
        if tab == Tab::Analysis && self.tracker.is_empty() {
            self.last_message = Message::Warning("No records available for analysis.".into());
        }
    }

    fn open_form(&mut self, form: Form) {
        self.active_tab = form.kind.tab();
        self.form = Some(form);
    }

    fn reset(&mut self) {
        match self.storage.reset(&mut self.tracker) {
            Ok(()) => self.last_message = Message::Info("All data has been reset.".into()),
            Err(err) => {
                tracing::error!("{err:#}");
                self.last_message = Message::Warning(format!("Reset not saved: {err:#}"));
            }
        }
    }

    fn reload(&mut self) {
        match self.storage.load() {
            Ok(tracker) => {
                self.tracker = tracker;
                self.last_message = Message::Info("Reloaded data".into());
            }
            Err(err) => self.last_message = Message::Warning(format!("{err:#}")),
        }
    }

    /// Saves and reports whether it is safe to exit.
    fn quit(&mut self) -> bool {
        match self.save() {
            Ok(()) => true,
            Err(err) => {
                tracing::error!("{err:#}");
                self.last_message = Message::Warning(format!("Not quitting: {err:#}"));
                false
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FormKind {
    Expense,
    Target,
    Notes,
    Account,
}

impl FormKind {
    fn tab(self) -> Tab {
        match self {
            FormKind::Expense => Tab::AddNew,
            FormKind::Target | FormKind::Notes => Tab::Reports,
            FormKind::Account => Tab::Account,
        }
    }
}

#[derive(Clone)]
struct Field {
    label: &'static str,
    value: String,
}

impl Field {
    fn new(label: &'static str, value: impl Into<String>) -> Self {
        Self {
            label,
            value: value.into(),
        }
    }
}

struct Form {
    kind: FormKind,
    fields: Vec<Field>,
    index: usize,
}

impl Form {
    fn expense() -> Self {
        Self::with_fields(
            FormKind::Expense,
            vec![Field::new("Amount", ""), Field::new("Category", "")],
        )
    }

    fn target(tracker: &Tracker) -> Self {
        let current = tracker
            .monthly_target()
            .map(|t| t.to_string())
            .unwrap_or_default();
        Self::with_fields(FormKind::Target, vec![Field::new("Monthly Target", current)])
    }

    fn notes(tracker: &Tracker) -> Self {
        Self::with_fields(
            FormKind::Notes,
            vec![Field::new("Main Expenses Notes", tracker.budget.notes.clone())],
        )
    }

    fn account(tracker: &Tracker) -> Self {
        Self::with_fields(
            FormKind::Account,
            vec![
                Field::new("Name", tracker.profile.name.clone()),
                Field::new("Phone", tracker.profile.phone.clone()),
            ],
        )
    }

    fn with_fields(kind: FormKind, fields: Vec<Field>) -> Self {
        Self {
            kind,
            fields,
            index: 0,
        }
    }

    fn title(&self) -> &'static str {
        match self.kind {
            FormKind::Expense => "Add New Expense",
            FormKind::Target => "Set Target",
            FormKind::Notes => "Save Notes",
            FormKind::Account => "Account",
        }
    }

    fn value(&self, index: usize) -> &str {
        &self.fields[index].value
    }

    fn current_mut(&mut self) -> &mut Field {
        &mut self.fields[self.index]
    }

    fn next(&mut self) {
        if self.index + 1 < self.fields.len() {
            self.index += 1;
        }
    }

    fn prev(&mut self) {
        if self.index > 0 {
            self.index -= 1;
        }
    }

    fn push_char(&mut self, c: char) {
        self.current_mut().value.push(c);
    }

    fn backspace(&mut self) {
        self.current_mut().value.pop();
    }

    /// Applies the form to `tracker`, returning the confirmation to show.
    fn apply(&self, tracker: &mut Tracker) -> TrackerResult<String> {
        match self.kind {
            FormKind::Expense => {
                tracker.add_entry(self.value(1), self.value(0))?;
                Ok("Expense added successfully!".into())
            }
            FormKind::Target => {
                let target = tracker.set_target(self.value(0))?;
                Ok(format!("Monthly target set to ${target}"))
            }
            FormKind::Notes => {
                tracker.set_notes(self.value(0));
                Ok("Notes saved successfully!".into())
            }
            FormKind::Account => {
                tracker.set_profile(self.value(0), self.value(1));
                Ok("Account information saved successfully!".into())
            }
        }
    }
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| draw(f, app))?;
        if event::poll(Duration::from_millis(200))?
            && let Event::Key(key) = event::read()?
            && handle_key(app, key)
        {
            return Ok(());
        }
    }
}

/// Alt-Enter or Ctrl-J; plain Enter submits.
fn inserts_newline(key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Enter => key.modifiers.contains(KeyModifiers::ALT),
        KeyCode::Char('j') => key.modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}

/// Returns `true` once the app should exit.
fn handle_key(app: &mut App, key: KeyEvent) -> bool {
    if key.kind != KeyEventKind::Press {
        return false;
    }
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return app.quit();
    }

    if app.confirm_reset {
        app.confirm_reset = false;
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => app.reset(),
            _ => app.last_message = Message::Info("Reset cancelled".into()),
        }
        return false;
    }

    if let Some(form) = &mut app.form {
        match key.code {
            KeyCode::Esc => {
                app.form = None;
                app.last_message = Message::Info("Cancelled".into());
            }
            KeyCode::Tab | KeyCode::Down => form.next(),
            KeyCode::BackTab | KeyCode::Up => form.prev(),
            KeyCode::Enter | KeyCode::Char('j')
                if form.kind == FormKind::Notes && inserts_newline(key) =>
            {
                form.push_char('\n');
            }
            KeyCode::Enter => {
                if form.index + 1 < form.fields.len() {
                    form.next();
                } else {
                    match form.apply(&mut app.tracker) {
                        Ok(done) => {
                            let kind = form.kind;
                            app.form = None;
                            app.commit(done);
                            if kind == FormKind::Expense {
                                app.active_tab = Tab::Records;
                            }
                        }
                        Err(err) => {
                            tracing::debug!(form = form.title(), "rejected input: {err}");
                            app.last_message = Message::Warning(err.to_string());
                        }
                    }
                }
            }
            KeyCode::Backspace => form.backspace(),
            KeyCode::Char(c) => form.push_char(c),
            _ => {}
        }
        return false;
    }

    match key.code {
        KeyCode::Char('q') => return app.quit(),
        KeyCode::Char('h') | KeyCode::Left => {
            let idx = app.active_tab.index();
            if idx > 0 {
                app.select_tab(Tab::ALL[idx - 1]);
            }
        }
        KeyCode::Char('l') | KeyCode::Right | KeyCode::Tab => {
            let idx = app.active_tab.index();
            if idx + 1 < Tab::ALL.len() {
                app.select_tab(Tab::ALL[idx + 1]);
            }
        }
        KeyCode::Char(c @ '1'..='5') => {
            let idx = c as usize - '1' as usize;
            app.select_tab(Tab::ALL[idx]);
        }
        KeyCode::Char('a') => app.open_form(Form::expense()),
        KeyCode::Char('t') => app.open_form(Form::target(&app.tracker)),
        KeyCode::Char('n') => app.open_form(Form::notes(&app.tracker)),
        KeyCode::Enter | KeyCode::Char('e') => match app.active_tab {
            Tab::AddNew => app.open_form(Form::expense()),
            Tab::Reports => app.open_form(Form::target(&app.tracker)),
            Tab::Account => app.open_form(Form::account(&app.tracker)),
            Tab::Records | Tab::Analysis => {}
        },
        KeyCode::Char('s') => {
            if let Err(err) = app.save() {
                tracing::warn!("{err:#}");
                app.last_message = Message::Warning(format!("{err:#}"));
            }
        }
        KeyCode::Char('r') => app.reload(),
        KeyCode::Char('R') => {
            app.confirm_reset = true;
            app.last_message =
                Message::Warning("Reset ALL data? Press y to confirm, any other key to cancel".into());
        }
        _ => {}
    }
    false
}

fn draw(f: &mut ratatui::Frame, app: &App) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Min(10),
            Constraint::Length(3),
        ])
        .split(f.size());

    let top = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(3)])
        .split(layout[0]);

    render_header(f, top[0], app);

    let tab_titles = Tab::ALL
        .iter()
        .map(|t| Line::from(t.title()))
        .collect::<Vec<_>>();
    let tabs = Tabs::new(tab_titles)
        .block(Block::default().borders(Borders::BOTTOM))
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
        .select(app.active_tab.index());
    f.render_widget(tabs, top[1]);

    let mut body = layout[1];
    if let Some(form) = &app.form {
        let split = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(3),
                Constraint::Length(form.fields.len() as u16 + 3),
            ])
            .split(body);
        body = split[0];
        render_form(f, split[1], form);
    }

    match app.active_tab {
        Tab::Records => render_records(f, body, &app.tracker),
        Tab::Analysis => render_analysis(f, body, &app.tracker),
        Tab::AddNew => render_add_new(f, body),
        Tab::Reports => render_reports(f, body, &app.tracker),
        Tab::Account => render_account(f, body, &app.tracker),
    }

    render_footer(f, layout[2], app);
}

fn render_header(f: &mut ratatui::Frame, area: Rect, app: &App) {
    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            "Expense Tracker",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!("  | {} ", app.tracker.profile.name)),
        Span::raw(" | data "),
        Span::styled(
            app.storage.path().to_string_lossy(),
            Style::default().fg(Color::Gray),
        ),
    ]))
    .wrap(Wrap { trim: true });
    f.render_widget(header, area);
}

fn render_records(f: &mut ratatui::Frame, area: Rect, tracker: &Tracker) {
    let block = Block::default().title("Records").borders(Borders::ALL);
    if tracker.is_empty() {
        let empty = Paragraph::new("No expenses recorded yet. Press a to add one.").block(block);
        f.render_widget(empty, area);
        return;
    }
    let items: Vec<String> = tracker
        .records_newest_first()
        .map(|entry| entry.to_string())
        .collect();
    f.render_widget(List::new(items).block(block), area);
}

fn render_analysis(f: &mut ratatui::Frame, area: Rect, tracker: &Tracker) {
    let summary = match tracker.summary() {
        Ok(summary) => summary,
        Err(err) => {
            let warning = Paragraph::new(Span::styled(
                err.to_string(),
                Style::default().fg(Color::Red),
            ))
            .block(Block::default().title("Analysis").borders(Borders::ALL));
            f.render_widget(warning, area);
            return;
        }
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(5), Constraint::Min(6)])
        .split(area);

    let stats: Vec<Line> = summary_lines(&summary).into_iter().map(Line::from).collect();
    let stats = Paragraph::new(stats).block(Block::default().title("Analysis").borders(Borders::ALL));
    f.render_widget(stats, chunks[0]);

    let slices = tracker
        .category_breakdown()
        .map(|breakdown| chart::slices(breakdown))
        .unwrap_or_default();
    let pie = PieChart::new(&slices).block(
        Block::default()
            .title("Expense Distribution by Category")
            .borders(Borders::ALL),
    );
    f.render_widget(pie, chunks[1]);
}

fn render_add_new(f: &mut ratatui::Frame, area: Rect) {
    let hint = Paragraph::new(vec![
        Line::from("Press Enter to record a new expense."),
        Line::from("Amount is a plain number; category is any label."),
    ])
    .block(Block::default().title("Add New Expense").borders(Borders::ALL));
    f.render_widget(hint, area);
}

fn render_reports(f: &mut ratatui::Frame, area: Rect, tracker: &Tracker) {
    let target = match tracker.monthly_target() {
        Some(target) => format_currency(target),
        None => "not set".to_string(),
    };
    let mut lines = vec![
        Line::from(format!("Monthly Target: {target}")),
        Line::from(" "),
        Line::from("Main Expenses Notes:"),
    ];
    lines.extend(tracker.budget.notes.lines().map(|l| Line::from(l.to_string())));
    lines.push(Line::from(" "));
    lines.push(Line::from(Span::styled(
        "t set target   n edit notes",
        Style::default().fg(Color::Gray),
    )));
    let paragraph = Paragraph::new(lines)
        .block(Block::default().title("Reports").borders(Borders::ALL))
        .wrap(Wrap { trim: false });
    f.render_widget(paragraph, area);
}

fn render_account(f: &mut ratatui::Frame, area: Rect, tracker: &Tracker) {
    let lines = vec![
        Line::from(format!("Name:  {}", tracker.profile.name)),
        Line::from(format!("Phone: {}", tracker.profile.phone)),
        Line::from(" "),
        Line::from(Span::styled("e edit", Style::default().fg(Color::Gray))),
    ];
    let paragraph =
        Paragraph::new(lines).block(Block::default().title("Account").borders(Borders::ALL));
    f.render_widget(paragraph, area);
}

fn render_footer(f: &mut ratatui::Frame, area: Rect, app: &App) {
    let keys = if app.form.is_some() {
        "Enter: next/submit   Tab: next   Esc: cancel  "
    } else {
        "q quit  h/l tabs  a add  e edit  s save  r reload  R reset  "
    };
    let footer = Paragraph::new(Line::from(vec![
        Span::raw(keys),
        Span::styled(app.last_message.text(), app.last_message.style()),
    ]))
    .wrap(Wrap { trim: true })
    .block(Block::default().borders(Borders::TOP));
    f.render_widget(footer, area);
}

fn render_form(f: &mut ratatui::Frame, area: Rect, form: &Form) {
    let mut lines: Vec<Line> = Vec::new();
    for (i, field) in form.fields.iter().enumerate() {
        let label = if i == form.index {
            Span::styled(
                field.label,
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
        } else {
            Span::raw(field.label)
        };
        lines.push(Line::from(vec![
            label,
            Span::raw(": "),
            Span::raw(field.value.replace('\n', " ⏎ ")),
        ]));
    }
    lines.push(Line::from("Enter: next/submit   Tab: next   Esc: cancel"));
    if form.kind == FormKind::Notes {
        lines.push(Line::from("Alt-Enter / Ctrl-J: new line"));
    }
    let block = Block::default()
        .title(form.title())
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green));
    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });
    f.render_widget(paragraph, area);
}
