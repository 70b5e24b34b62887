use crate::controller::{ListView, Outcome, UiEvent, ViewController};
use crate::form::FormMode;
use crate::storage::Storage;
use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::io;
use tracing::error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Description,
    Amount,
    Category,
    List,
}

impl Focus {
    pub fn next(&self) -> Self {
        match self {
            Focus::Description => Focus::Amount,
            Focus::Amount => Focus::Category,
            Focus::Category => Focus::List,
            Focus::List => Focus::Description,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Focus::Description => Focus::List,
            Focus::Amount => Focus::Description,
            Focus::Category => Focus::Amount,
            Focus::List => Focus::Category,
        }
    }
}

pub struct App<S: Storage> {
    pub controller: ViewController<S>,
    pub state: TableState,
    pub focus: Focus,
    pub currency: String,
    pub status: Option<String>,
    pub should_quit: bool,
}

impl<S: Storage> App<S> {
    pub fn new(controller: ViewController<S>, currency: String) -> Self {
        let mut app = Self {
            controller,
            state: TableState::default(),
            focus: Focus::Description,
            currency,
            status: None,
            should_quit: false,
        };
        app.sync_selection();
        app
    }

    /// Id of the highlighted row
    pub fn selected_id(&self) -> Option<i64> {
        self.state
            .selected()
            .and_then(|i| self.controller.view().id_at(i))
    }

    pub fn next(&mut self) {
        let len = self.controller.view().len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) => {
                if i >= len - 1 {
                    0
                } else {
                    i + 1
                }
            }
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.controller.view().len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) => {
                if i == 0 {
                    len - 1
                } else {
                    i - 1
                }
            }
            None => 0,
        };
        self.state.select(Some(i));
    }

    /// Keep the highlight on a row that still exists
    fn sync_selection(&mut self) {
        let len = self.controller.view().len();
        let selected = match (len, self.state.selected()) {
            (0, _) => None,
            (_, None) => Some(0),
            (len, Some(i)) => Some(i.min(len - 1)),
        };
        self.state.select(selected);
    }

    fn dispatch(&mut self, event: UiEvent) {
        match self.controller.handle(event) {
            Ok(Outcome::Added(expense)) => {
                self.status = Some(format!("Added \"{}\"", expense.description));
                self.state.select(Some(self.controller.view().len() - 1));
                self.focus = Focus::Description;
            }
            Ok(Outcome::Updated { found, .. }) => {
                if found {
                    self.status = Some("Changes saved".to_string());
                }
                self.focus = Focus::Description;
            }
            Ok(Outcome::Deleted { found, .. }) => {
                if found {
                    self.status = Some("Expense deleted".to_string());
                }
            }
            Ok(Outcome::EditStarted(_)) => {
                self.status = None;
                self.focus = Focus::Description;
            }
            Ok(Outcome::Ignored) => {}
            Err(err) => {
                error!(error = %err, "Failed to save expenses");
                self.status = Some(format!("Error: {:#}", err));
            }
        }
        self.sync_selection();
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        // A message lasts until the next key; then the hints come back
        self.status = None;

        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true;
                return;
            }
            KeyCode::Esc => {
                self.should_quit = true;
                return;
            }
            KeyCode::Tab => {
                self.focus = self.focus.next();
                return;
            }
            KeyCode::BackTab => {
                self.focus = self.focus.previous();
                return;
            }
            _ => {}
        }

        match self.focus {
            Focus::List => self.handle_list_key(key),
            Focus::Category => match key.code {
                KeyCode::Right | KeyCode::Down => self.controller.form.next_category(),
                KeyCode::Left | KeyCode::Up => self.controller.form.previous_category(),
                KeyCode::Enter => self.dispatch(UiEvent::Submit),
                _ => {}
            },
            Focus::Description | Focus::Amount => {
                if key.code == KeyCode::Enter {
                    self.dispatch(UiEvent::Submit);
                    return;
                }
                let field = if self.focus == Focus::Description {
                    &mut self.controller.form.description
                } else {
                    &mut self.controller.form.amount
                };
                match key.code {
                    KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                        field.push(c)
                    }
                    KeyCode::Backspace => {
                        field.pop();
                    }
                    _ => {}
                }
            }
        }
    }

    fn handle_list_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Down | KeyCode::Char('j') => self.next(),
            KeyCode::Up | KeyCode::Char('k') => self.previous(),
            KeyCode::Home => self.select_first(),
            KeyCode::End => {
                let len = self.controller.view().len();
                if len > 0 {
                    self.state.select(Some(len - 1));
                }
            }
            KeyCode::Char('e') | KeyCode::Enter => {
                if let Some(id) = self.selected_id() {
                    self.dispatch(UiEvent::Edit(id));
                }
            }
            KeyCode::Char('d') | KeyCode::Delete => {
                if let Some(id) = self.selected_id() {
                    self.dispatch(UiEvent::Delete(id));
                }
            }
            _ => {}
        }
    }

    fn select_first(&mut self) {
        if !self.controller.view().is_empty() {
            self.state.select(Some(0));
        }
    }
}

pub fn run_ui<S: Storage>(app: &mut App<S>) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res.map_err(Into::into)
}

fn run_app<B: ratatui::backend::Backend, S: Storage>(
    terminal: &mut Terminal<B>,
    app: &mut App<S>,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            app.handle_key(key);
        }
        if app.should_quit {
            return Ok(());
        }
    }
}

pub fn ui<S: Storage>(f: &mut Frame, app: &mut App<S>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with totals
            Constraint::Min(0),    // Form + list
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(chunks[1]);

    render_form(f, body[0], app);
    render_list(f, body[1], app);
    render_status_bar(f, chunks[2], app);
}

fn render_header<S: Storage>(f: &mut Frame, area: Rect, app: &App<S>) {
    let stats = app.controller.stats();

    let mut spans = vec![
        Span::styled(
            "Expense Tracker",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  |  "),
        Span::styled(
            format!("{} expenses", stats.count),
            Style::default().fg(Color::White),
        ),
        Span::raw("  |  "),
        Span::styled(
            format!("Total: {}{:.2}", app.currency, stats.total),
            Style::default().fg(Color::Green),
        ),
    ];
    for (category, _, total) in &stats.by_category {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            format!("{} {:.2}", category, total),
            Style::default().fg(Color::DarkGray),
        ));
    }

    let header = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Cyan)));
    f.render_widget(header, area);
}

fn field_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::White)
    }
}

fn render_form<S: Storage>(f: &mut Frame, area: Rect, app: &App<S>) {
    let form = &app.controller.form;
    let mode = form.mode();

    let category = match form.category {
        Some(c) => format!("< {} >", c),
        None => "< Select category >".to_string(),
    };
    let cursor = |focus: Focus| if app.focus == focus { "_" } else { "" };

    let lines = vec![
        Line::from(vec![
            Span::styled("Description: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!("{}{}", form.description, cursor(Focus::Description)),
                field_style(app.focus == Focus::Description),
            ),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("Amount:      ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!("{}{}", form.amount, cursor(Focus::Amount)),
                field_style(app.focus == Focus::Amount),
            ),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("Category:    ", Style::default().fg(Color::Gray)),
            Span::styled(category, field_style(app.focus == Focus::Category)),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            format!("[ {} ]", mode.submit_label()),
            Style::default()
                .fg(Color::Black)
                .bg(match mode {
                    FormMode::Create => Color::Blue,
                    FormMode::Edit(_) => Color::Cyan,
                }),
        )),
    ];

    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(format!(" {} ", mode.title())),
    );
    f.render_widget(paragraph, area);
}

fn render_list<S: Storage>(f: &mut Frame, area: Rect, app: &mut App<S>) {
    let border = if app.focus == Focus::List {
        Color::Yellow
    } else {
        Color::White
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
        .title(" Expenses ");

    let rows = match app.controller.view() {
        ListView::Empty => {
            let placeholder = Paragraph::new(Line::from(Span::styled(
                ListView::PLACEHOLDER,
                Style::default().fg(Color::DarkGray),
            )))
            .block(block);
            f.render_widget(placeholder, area);
            return;
        }
        ListView::Rows(rows) => rows,
    };

    let header_cells = ["Description", "Category", "Amount"].iter().map(|h| {
        Cell::from(*h).style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
    });
    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let table_rows = rows.iter().map(|row| {
        Row::new(vec![
            Cell::from(truncate(&row.description, 30)),
            Cell::from(row.category.clone()).style(Style::default().fg(Color::Gray)),
            Cell::from(format!("{}{}", app.currency, row.amount))
                .style(Style::default().fg(Color::Green)),
        ])
        .height(1)
    });

    let table = Table::new(
        table_rows,
        [
            Constraint::Min(12),
            Constraint::Length(15),
            Constraint::Length(14),
        ],
    )
    .header(header)
    .block(block)
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol(">> ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_status_bar<S: Storage>(f: &mut Frame, area: Rect, app: &App<S>) {
    let text = match &app.status {
        Some(status) => Line::from(Span::styled(status.clone(), Style::default().fg(Color::Cyan))),
        None => {
            let hints = match app.focus {
                Focus::List => "↑↓ select | e edit | d delete | Tab form | q/Esc quit",
                Focus::Category => "←→ category | Enter submit | Tab next | Esc quit",
                Focus::Description | Focus::Amount => "type to edit | Enter submit | Tab next | Esc quit",
            };
            Line::from(Span::styled(hints, Style::default().fg(Color::DarkGray)))
        }
    };

    let status = Paragraph::new(text).block(Block::default().borders(Borders::ALL));
    f.render_widget(status, area);
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expense::Category;
    use crate::storage::MemoryStorage;
    use crate::store::ExpenseStore;
    use ratatui::backend::TestBackend;

    fn app() -> App<MemoryStorage> {
        let store = ExpenseStore::load(MemoryStorage::new()).unwrap();
        App::new(ViewController::new(store), "₹".to_string())
    }

    fn press(app: &mut App<MemoryStorage>, code: KeyCode) {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn type_text(app: &mut App<MemoryStorage>, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    /// Fill the form from the description field and submit
    fn enter_expense(app: &mut App<MemoryStorage>, description: &str, amount: &str) {
        app.focus = Focus::Description;
        type_text(app, description);
        press(app, KeyCode::Tab);
        type_text(app, amount);
        press(app, KeyCode::Tab);
        press(app, KeyCode::Right);
        press(app, KeyCode::Enter);
    }

    fn screen(app: &mut App<MemoryStorage>) -> String {
        let mut terminal = Terminal::new(TestBackend::new(110, 20)).unwrap();
        terminal.draw(|f| ui(f, app)).unwrap();

        let buffer = terminal.backend().buffer();
        let width = buffer.area.width as usize;
        buffer
            .content
            .chunks(width)
            .map(|line| line.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_typing_and_submit_adds_expense() {
        let mut app = app();

        enter_expense(&mut app, "Coffee", "4.50");

        let list = app.controller.store().list();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].description, "Coffee");
        assert_eq!(list[0].category, Category::Food);
        assert_eq!(app.state.selected(), Some(0));
        assert_eq!(app.focus, Focus::Description);
        assert!(app.controller.form.description.is_empty());
    }

    #[test]
    fn test_invalid_submit_keeps_input_and_is_silent() {
        let mut app = app();
        press(&mut app, KeyCode::Tab);
        type_text(&mut app, "12");
        press(&mut app, KeyCode::Enter);

        assert!(app.controller.store().is_empty());
        assert_eq!(app.controller.form.amount, "12");
        assert_eq!(app.status, None);
    }

    #[test]
    fn test_edit_from_list_then_save() {
        let mut app = app();
        enter_expense(&mut app, "Coffee", "4.50");
        enter_expense(&mut app, "Bus", "2");

        app.focus = Focus::List;
        press(&mut app, KeyCode::Home);
        press(&mut app, KeyCode::Char('e'));

        assert_eq!(app.focus, Focus::Description);
        assert!(matches!(app.controller.mode(), FormMode::Edit(_)));
        type_text(&mut app, " beans");
        press(&mut app, KeyCode::Enter);

        let list = app.controller.store().list();
        assert_eq!(list[0].description, "Coffee beans");
        assert_eq!(list[1].description, "Bus");
        assert_eq!(app.controller.mode(), FormMode::Create);
    }

    #[test]
    fn test_delete_clamps_selection() {
        let mut app = app();
        enter_expense(&mut app, "Coffee", "4.50");
        enter_expense(&mut app, "Bus", "2");

        app.focus = Focus::List;
        press(&mut app, KeyCode::End);
        press(&mut app, KeyCode::Char('d'));

        assert_eq!(app.controller.store().len(), 1);
        assert_eq!(app.state.selected(), Some(0));

        press(&mut app, KeyCode::Delete);
        assert!(app.controller.store().is_empty());
        assert_eq!(app.state.selected(), None);

        // Nothing selected, nothing to delete
        press(&mut app, KeyCode::Char('d'));
        assert!(app.controller.store().is_empty());
    }

    #[test]
    fn test_q_types_into_fields_but_quits_from_list() {
        let mut app = app();
        press(&mut app, KeyCode::Char('q'));
        assert!(!app.should_quit);
        assert_eq!(app.controller.form.description, "q");

        app.focus = Focus::List;
        press(&mut app, KeyCode::Char('q'));
        assert!(app.should_quit);
    }

    #[test]
    fn test_status_clears_on_next_key() {
        let mut app = app();
        enter_expense(&mut app, "Coffee", "4.50");
        assert_eq!(app.status.as_deref(), Some("Added \"Coffee\""));

        press(&mut app, KeyCode::Tab);

        assert_eq!(app.status, None);
        assert!(screen(&mut app).contains("Enter submit"));
    }

    #[test]
    fn test_ctrl_c_quits() {
        let mut app = app();
        app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(app.should_quit);
        assert!(app.controller.form.description.is_empty());
    }

    #[test]
    fn test_render_placeholder_when_empty() {
        let mut app = app();
        let text = screen(&mut app);

        assert!(text.contains(ListView::PLACEHOLDER));
        assert!(text.contains("Add New Expense"));
        assert!(text.contains("[ Add Expense ]"));
    }

    #[test]
    fn test_render_rows_with_two_decimal_amounts() {
        let mut app = app();
        enter_expense(&mut app, "Coffee", "4.5");

        let text = screen(&mut app);

        assert!(!text.contains(ListView::PLACEHOLDER));
        assert!(text.contains("Coffee"));
        assert!(text.contains("₹4.50"));
        assert!(text.contains("Food"));
    }

    #[test]
    fn test_render_edit_mode_labels() {
        let mut app = app();
        enter_expense(&mut app, "Coffee", "4.50");
        app.focus = Focus::List;
        press(&mut app, KeyCode::Char('e'));

        let text = screen(&mut app);

        assert!(text.contains("Edit Expense"));
        assert!(text.contains("[ Save Changes ]"));
    }

    #[test]
    fn test_truncate_long_descriptions() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a very long description", 10), "a very ...");
    }
}
