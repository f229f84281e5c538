use std::io::Stdout;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers,
};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::widgets::ListState;
use ratatui::Terminal;
use time::OffsetDateTime;

use crate::config::AppConfig;
use crate::store::StoreHandle;
use crate::ui;

mod actions;
pub mod state;

pub use state::{AppState, DatePickerOverlay, OverlayState};

enum Action {
    Quit,
    SelectNext,
    SelectPrevious,
    TagNext,
    TagPrevious,
    ToggleTag,
    OpenDatePicker,
    ClearFilters,
    ToggleTitle,
    OpenLink,
    Refresh,
}

pub struct App {
    pub config: Arc<AppConfig>,
    pub store: StoreHandle,
    state: AppState,
    list_state: ListState,
    should_quit: bool,
    tick_rate: Duration,
}

impl App {
    /// The initial fetch happens here, blocking until the store answers or
    /// fails; a failed fetch just leaves the state empty.
    pub fn new(config: Arc<AppConfig>, store: StoreHandle) -> Self {
        let state = AppState::load(&store, &config);
        let mut list_state = ListState::default();
        if state.visible_len() > 0 {
            list_state.select(Some(state.selected));
        }
        Self {
            config,
            store,
            state,
            list_state,
            should_quit: false,
            tick_rate: Duration::from_millis(250),
        }
    }

    pub fn run(&mut self) -> Result<()> {
        let mut terminal = setup_terminal()?;
        let result = self.event_loop(&mut terminal);
        restore_terminal(&mut terminal)?;
        result
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        let mut last_tick = Instant::now();
        loop {
            terminal
                .draw(|frame| {
                    if self.state.visible_len() > 0 {
                        self.list_state.select(Some(self.state.selected));
                    } else {
                        self.list_state.select(None);
                    }
                    ui::draw_app(frame, &self.state, &mut self.list_state);
                })
                .context("rendering frame")?;

            if self.should_quit {
                break;
            }

            let timeout = self
                .tick_rate
                .checked_sub(last_tick.elapsed())
                .unwrap_or_else(|| Duration::from_millis(0));

            if event::poll(timeout).context("polling for terminal events")? {
                match event::read().context("reading terminal event")? {
                    Event::Key(key) => self.handle_key(key),
                    Event::Resize(_, _) => {
                        // no-op: next draw will naturally adapt to the new size
                    }
                    _ => {}
                }
            }

            if last_tick.elapsed() >= self.tick_rate {
                self.on_tick();
                last_tick = Instant::now();
            }
        }
        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }

        if self.handle_overlay_key(key) {
            return;
        }

        let action = match key.code {
            KeyCode::Char('q') => Some(Action::Quit),
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                Some(Action::Quit)
            }
            KeyCode::Char('j') | KeyCode::Down => Some(Action::SelectNext),
            KeyCode::Char('k') | KeyCode::Up => Some(Action::SelectPrevious),
            KeyCode::Char('l') | KeyCode::Right => Some(Action::TagNext),
            KeyCode::Char('h') | KeyCode::Left => Some(Action::TagPrevious),
            KeyCode::Char(' ') | KeyCode::Char('t') => Some(Action::ToggleTag),
            KeyCode::Char('d')
                if !key.modifiers.intersects(
                    KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SUPER,
                ) =>
            {
                Some(Action::OpenDatePicker)
            }
            KeyCode::Char('c')
                if !key.modifiers.intersects(
                    KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SUPER,
                ) =>
            {
                Some(Action::ClearFilters)
            }
            KeyCode::Enter | KeyCode::Char('e') => Some(Action::ToggleTitle),
            KeyCode::Char('o')
                if !key.modifiers.intersects(
                    KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SUPER,
                ) =>
            {
                Some(Action::OpenLink)
            }
            KeyCode::Char('r')
                if !key.modifiers.intersects(
                    KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SUPER,
                ) =>
            {
                Some(Action::Refresh)
            }
            _ => None,
        };

        if let Some(action) = action {
            self.handle_action(action);
        }
    }

    fn handle_action(&mut self, action: Action) {
        match action {
            Action::Quit => self.should_quit = true,
            Action::SelectNext => self.state.move_selection(1),
            Action::SelectPrevious => self.state.move_selection(-1),
            Action::TagNext => self.state.move_tag_cursor(1),
            Action::TagPrevious => self.state.move_tag_cursor(-1),
            Action::ToggleTag => self.handle_toggle_tag(),
            Action::OpenDatePicker => self.handle_open_date_picker(),
            Action::ClearFilters => {
                self.state.clear_filters();
                self.state.set_status_message(Some("Filters cleared"));
            }
            Action::ToggleTitle => self.handle_toggle_title(),
            Action::OpenLink => self.handle_open_link(),
            Action::Refresh => {
                self.refresh_feed();
                self.state.set_status_message(Some(format!(
                    "Refreshed — {} item(s)",
                    self.state.items.len()
                )));
            }
        }
    }

    fn on_tick(&mut self) {
        let interval = self.config.fetch.refresh_interval();
        let due = match self.state.last_fetch {
            Some(fetched_at) => OffsetDateTime::now_utc() - fetched_at >= interval,
            None => true,
        };
        if due {
            tracing::info!("refresh interval elapsed, refetching feed");
            self.refresh_feed();
        }
    }

    fn refresh_feed(&mut self) {
        self.state.refresh(&self.store, self.config.fetch.limit);
    }

    fn handle_overlay_key(&mut self, key: KeyEvent) -> bool {
        match self.state.overlay() {
            Some(OverlayState::DatePicker(_)) => {
                match key.code {
                    KeyCode::Esc => {
                        self.state.close_overlay();
                        self.state.set_status_message(Some("Date filter unchanged"));
                    }
                    KeyCode::Enter => {
                        if let Some(choice) = self.state.date_picker_commit() {
                            let message = match choice {
                                Some(date) => format!("Date filter: {date}"),
                                None => "Date filter cleared".to_string(),
                            };
                            self.state.set_status_message(Some(message));
                        }
                    }
                    KeyCode::Char('j') | KeyCode::Down => self.state.date_picker_move(1),
                    KeyCode::Char('k') | KeyCode::Up => self.state.date_picker_move(-1),
                    KeyCode::PageDown => self.state.date_picker_move(5),
                    KeyCode::PageUp => self.state.date_picker_move(-5),
                    _ => {}
                }
                true
            }
            None => false,
        }
    }

    fn handle_toggle_tag(&mut self) {
        match self.state.toggle_tag_under_cursor() {
            Some(tag) => {
                let message = if self.state.filter.selected_tag.as_deref() == Some(tag.as_str()) {
                    format!("Tag filter: #{tag}")
                } else {
                    "Tag filter cleared".to_string()
                };
                self.state.set_status_message(Some(message));
            }
            None => {
                self.state.set_status_message(Some("No tags in this batch"));
            }
        }
    }

    fn handle_open_date_picker(&mut self) {
        if self.state.overlay().is_some() {
            return;
        }
        self.state.open_date_picker();
        self.state.set_status_message(Some(
            "Date filter: j/k choose • Enter apply • Esc cancel",
        ));
    }

    fn handle_toggle_title(&mut self) {
        match self.state.toggle_selected_expanded() {
            Some(true) => self.state.set_status_message(Some("Title expanded")),
            Some(false) => self.state.set_status_message(Some("Title collapsed")),
            None => self.state.set_status_message(Some("No card selected")),
        }
    }

    fn handle_open_link(&mut self) {
        let Some(url) = self.state.selected_item().map(|item| item.original_url.clone()) else {
            self.state.set_status_message(Some("No card selected"));
            return;
        };
        match actions::open_in_browser(&url) {
            Ok(()) => {
                self.state
                    .set_status_message(Some(format!("Opening {url}")));
            }
            Err(err) => {
                tracing::error!(?err, %url, "failed to open original link");
                self.state
                    .set_status_message(Some("Failed to open the link; see logs"));
            }
        }
    }
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode().context("enabling raw mode")?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
        .context("switching to alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("creating terminal backend")?;
    terminal.hide_cursor().context("hiding cursor")?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    terminal.show_cursor().ok();
    disable_raw_mode().context("disabling raw mode")?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )
    .context("restoring screen state")?;
    Ok(())
}
