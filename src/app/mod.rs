use std::io::Stdout;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossbeam_channel::Receiver;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::widgets::ListState;
use ratatui::Terminal;

use crate::catalog::{Clock, PresetKey};
use crate::config::AppConfig;
use crate::picker::{CalendarView, CalendarWidget, DateRangePicker, RangeChange};
use crate::ui;

pub mod state;

pub use state::{AppState, FocusPane};

enum Action {
    Quit,
    Open,
    Apply,
    Cancel,
}

pub struct App {
    pub config: Arc<AppConfig>,
    picker: DateRangePicker<CalendarView>,
    changes: Receiver<RangeChange>,
    state: AppState,
    list_state: ListState,
    should_quit: bool,
    tick_rate: Duration,
}

impl App {
    pub fn new(config: Arc<AppConfig>, clock: Box<dyn Clock>) -> Self {
        let today = clock.now().date();
        let mut picker = DateRangePicker::new(&config.picker, clock);
        picker.attach_widget(CalendarView::new(&config.calendar, today));
        let changes = picker.subscribe();

        let mut state = AppState::new(today);
        state.point_preset_cursor_at(picker.state().applied().key);
        state.sync_inputs(picker.state());
        Self {
            config,
            picker,
            changes,
            state,
            list_state: ListState::default(),
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

    pub fn picker(&self) -> &DateRangePicker<CalendarView> {
        &self.picker
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn is_open(&self) -> bool {
        self.picker.widget().is_some_and(CalendarView::is_open)
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        let mut last_tick = Instant::now();
        loop {
            terminal
                .draw(|frame| {
                    self.list_state.select(Some(self.state.preset_cursor));
                    ui::draw_app(
                        frame,
                        &self.picker,
                        &self.state,
                        &self.config.picker,
                        &mut self.list_state,
                    );
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
                let event = event::read().context("reading terminal event")?;
                self.handle_event(event);
            }

            if last_tick.elapsed() >= self.tick_rate {
                self.on_tick();
                last_tick = Instant::now();
            }
        }
        Ok(())
    }

    /// Drains range changes the picker emitted since the last tick.
    pub fn on_tick(&mut self) {
        while let Ok(change) = self.changes.try_recv() {
            self.state.set_status_message(Some(format!(
                "Applied {}",
                change.selected_key.label()
            )));
            self.state.last_change = Some(change);
        }
    }

    /// Only key presses drive the picker; mouse capture stays off so the
    /// terminal keeps its own text selection.
    pub fn handle_event(&mut self, event: Event) {
        if let Event::Key(key) = event {
            self.handle_key(key);
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.handle_action(Action::Quit);
            return;
        }

        if !self.is_open() {
            let action = match key.code {
                KeyCode::Char('q') => Some(Action::Quit),
                KeyCode::Char('o') | KeyCode::Enter | KeyCode::Char(' ') => Some(Action::Open),
                _ => None,
            };
            if let Some(action) = action {
                self.handle_action(action);
            }
            return;
        }

        match key.code {
            KeyCode::Esc => return self.handle_action(Action::Cancel),
            KeyCode::Tab => return self.state.cycle_focus(true),
            KeyCode::BackTab => return self.state.cycle_focus(false),
            _ => {}
        }

        match self.state.focus {
            FocusPane::Presets => self.handle_preset_key(key),
            FocusPane::Calendar => self.handle_calendar_key(key),
            FocusPane::StartInput | FocusPane::EndInput => self.handle_input_key(key),
        }
    }

    fn handle_action(&mut self, action: Action) {
        match action {
            Action::Quit => self.should_quit = true,
            Action::Open => {
                self.picker.open();
                if let Some(start) = self.picker.state().custom_start() {
                    self.state.day_cursor = start;
                }
                self.state.focus = FocusPane::Presets;
                self.state.sync_inputs(self.picker.state());
                self.state.set_status_message(None::<String>);
            }
            Action::Apply => {
                self.picker.apply();
                self.picker.set_hover(None);
                self.on_tick();
            }
            Action::Cancel => {
                self.picker.cancel();
                self.picker.set_hover(None);
                self.state.set_status_message(Some("Selection canceled"));
            }
        }
    }

    fn handle_preset_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => self.state.move_preset_cursor(1),
            KeyCode::Char('k') | KeyCode::Up => self.state.move_preset_cursor(-1),
            KeyCode::Enter | KeyCode::Char(' ') => {
                let Some(preset) = PresetKey::from_index(self.state.preset_cursor) else {
                    return;
                };
                self.picker.select_preset(preset);
                if let Some(start) = self.picker.state().custom_start() {
                    self.state.day_cursor = start;
                }
                self.state.sync_inputs(self.picker.state());
            }
            KeyCode::Char('a') => self.handle_action(Action::Apply),
            KeyCode::Char('c') => self.handle_action(Action::Cancel),
            _ => {}
        }
    }

    fn handle_calendar_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Left | KeyCode::Char('h') => self.move_day_cursor(-1),
            KeyCode::Right | KeyCode::Char('l') => self.move_day_cursor(1),
            KeyCode::Up | KeyCode::Char('k') => self.move_day_cursor(-7),
            KeyCode::Down | KeyCode::Char('j') => self.move_day_cursor(7),
            KeyCode::PageUp | KeyCode::Char('<') => {
                if let Some(calendar) = self.picker.widget_mut() {
                    calendar.previous_month();
                }
            }
            KeyCode::PageDown | KeyCode::Char('>') => {
                if let Some(calendar) = self.picker.widget_mut() {
                    calendar.next_month();
                }
            }
            KeyCode::Enter | KeyCode::Char(' ') => {
                self.picker.on_day_clicked(self.state.day_cursor);
                self.state.sync_inputs(self.picker.state());
            }
            KeyCode::Char('a') => self.handle_action(Action::Apply),
            KeyCode::Char('c') => self.handle_action(Action::Cancel),
            _ => {}
        }
    }

    fn move_day_cursor(&mut self, days: i64) {
        self.state.move_day_cursor(days);
        let cursor = self.state.day_cursor;
        self.picker.set_hover(Some(cursor));
        if let Some(calendar) = self.picker.widget_mut() {
            calendar.focus_date(cursor);
        }
    }

    fn handle_input_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => {
                let focus = self.state.focus;
                match focus {
                    FocusPane::StartInput => {
                        let text = self.state.start_input.clone();
                        self.picker.type_start_date(&text);
                    }
                    FocusPane::EndInput => {
                        let text = self.state.end_input.clone();
                        self.picker.type_end_date(&text);
                    }
                    _ => return,
                }
                self.state.sync_inputs(self.picker.state());
            }
            KeyCode::Backspace => {
                if let Some(input) = self.state.active_input_mut() {
                    input.pop();
                }
            }
            KeyCode::Char(ch)
                if !key.modifiers.intersects(
                    KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SUPER,
                ) =>
            {
                if let Some(input) = self.state.active_input_mut() {
                    if input.len() < 10 {
                        input.push(ch);
                    }
                }
            }
            _ => {}
        }
    }
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode().context("enabling raw mode")?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen).context("switching to alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("creating terminal backend")?;
    terminal.hide_cursor().context("hiding cursor")?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    terminal.show_cursor().ok();
    disable_raw_mode().context("disabling raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("restoring screen state")?;
    Ok(())
}
