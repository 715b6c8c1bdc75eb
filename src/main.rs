pub mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{DisableFocusChange, EnableFocusChange, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Frame, Terminal,
};
use std::{
    error::Error,
    fs::File,
    io::{self, stdin},
    path::PathBuf,
    time::{Duration, Instant},
};

use typeamp::{
    app_dirs::AppDirs,
    config::{ConfigPatch, ConfigStore, Difficulty, FileConfigStore, TestConfig, TestMode},
    controller::SessionController,
    countdown::Countdown,
    history::{HistorySink, InMemoryHistory, SqliteHistory, TestResult, DEFAULT_HISTORY_CAPACITY},
    logging,
    runtime::{AppEvent, CrosstermEventSource, FixedTicker, Runner},
    session::{GameStatus, KeyInput},
    text::EmbeddedWordLists,
};

const TICK_RATE_MS: u64 = 100;
const HISTORY_SCREEN_ROWS: usize = 20;

/// typing speed practice in the terminal
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Typing speed practice with time, words and quote modes, difficulty levels and a persisted result history."
)]
pub struct Cli {
    /// completion criterion: fixed time, fixed word count, or one quote
    #[clap(short = 'm', long, value_enum)]
    mode: Option<TestMode>,

    /// seconds per test in time mode
    #[clap(short = 's', long, value_parser = clap::value_parser!(u32).range(1..))]
    duration: Option<u32>,

    /// words per test in words mode
    #[clap(short = 'w', long)]
    words: Option<usize>,

    /// normal, expert (a finished word with a mistake ends the test) or master (any mistake ends it)
    #[clap(short = 'd', long, value_enum)]
    difficulty: Option<Difficulty>,

    /// word list to draw from
    #[clap(short = 'l', long)]
    list: Option<String>,

    /// add capitalization and punctuation to word lists
    #[clap(long, overrides_with = "no_punctuation")]
    punctuation: bool,

    /// plain lowercase words
    #[clap(long, overrides_with = "punctuation")]
    no_punctuation: bool,

    /// type this text instead of a word list or quote
    #[clap(short = 'p', long = "text")]
    text: Option<String>,

    /// print the most recent results and exit
    #[clap(long, num_args = 0..=1, default_missing_value = "10")]
    history: Option<usize>,

    /// write all stored results to a CSV file and exit
    #[clap(long, value_name = "PATH")]
    export_csv: Option<PathBuf>,

    /// log filter, e.g. `debug` or `typeamp=trace` (default: $TYPEAMP_LOG or info)
    #[clap(long)]
    log_level: Option<String>,
}

impl Cli {
    fn to_patch(&self) -> ConfigPatch {
        let punctuation = if self.punctuation {
            Some(true)
        } else if self.no_punctuation {
            Some(false)
        } else {
            None
        };

        ConfigPatch {
            mode: self.mode,
            duration_secs: self.duration,
            word_count: self.words,
            difficulty: self.difficulty,
            text_source: self.list.clone(),
            punctuation,
            custom_text: Some(self.text.clone()),
        }
    }

    fn is_offline_command(&self) -> bool {
        self.history.is_some() || self.export_csv.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AppState {
    Typing,
    Results,
    History,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Action {
    Continue,
    Quit,
}

#[derive(Debug)]
pub struct App {
    pub controller: SessionController,
    pub countdown: Option<Countdown>,
    pub state: AppState,
    pub history_rows: Vec<TestResult>,
}

impl App {
    pub fn new(controller: SessionController) -> Self {
        let mut app = Self {
            controller,
            countdown: None,
            state: AppState::Typing,
            history_rows: Vec::new(),
        };
        app.arm_countdown();
        app
    }

    fn arm_countdown(&mut self) {
        if let Some(old) = self.countdown.as_mut() {
            old.cancel();
        }
        let config = self.controller.config();
        self.countdown =
            (config.mode == TestMode::Time).then(|| Countdown::from_secs(config.duration_secs));
    }

    pub fn restart(&mut self) {
        self.controller.reset_game();
        self.arm_countdown();
        self.state = AppState::Typing;
    }

    pub fn new_text(&mut self) {
        self.controller.reload_text();
        self.arm_countdown();
        self.state = AppState::Typing;
    }

    fn on_key(&mut self, key: KeyEvent) -> Action {
        if key.code == KeyCode::Esc
            || (key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c'))
        {
            return Action::Quit;
        }
        if key.code == KeyCode::Tab {
            self.restart();
            return Action::Continue;
        }

        match self.state {
            AppState::Typing => {
                let was_ready = self.controller.session().status() == GameStatus::Ready;
                self.controller.handle_key(KeyInput::from(key));

                let status = self.controller.session().status();
                if was_ready && status == GameStatus::Running {
                    if let Some(countdown) = self.countdown.as_mut() {
                        countdown.tick(Instant::now());
                    }
                }
                if status == GameStatus::Finished {
                    self.state = AppState::Results;
                }
            }
            AppState::Results => match key.code {
                KeyCode::Char('r') => self.restart(),
                KeyCode::Char('n') => self.new_text(),
                KeyCode::Char('h') => self.show_history(),
                _ => {}
            },
            AppState::History => match key.code {
                KeyCode::Char('b') | KeyCode::Backspace => self.state = AppState::Results,
                KeyCode::Char('r') => self.restart(),
                KeyCode::Char('n') => self.new_text(),
                _ => {}
            },
        }
        Action::Continue
    }

    fn show_history(&mut self) {
        match self.controller.history().recent(HISTORY_SCREEN_ROWS) {
            Ok(rows) => self.history_rows = rows,
            Err(err) => {
                tracing::warn!(%err, "could not read history");
                self.history_rows.clear();
            }
        }
        self.state = AppState::History;
    }

    fn on_tick(&mut self, now: Instant) {
        if self.controller.session().status() != GameStatus::Running {
            return;
        }
        let Some(countdown) = self.countdown.as_mut() else {
            return;
        };
        countdown.tick(now);
        if countdown.is_expired() {
            self.controller.complete_game();
            self.state = AppState::Results;
        }
    }

    fn on_focus_lost(&mut self) {
        if self.controller.pause() {
            if let Some(countdown) = self.countdown.as_mut() {
                countdown.pause();
            }
        }
    }

    fn on_focus_gained(&mut self, now: Instant) {
        if self.controller.resume() {
            if let Some(countdown) = self.countdown.as_mut() {
                countdown.resume();
                countdown.tick(now);
            }
        }
    }

    pub fn seconds_remaining(&self) -> Option<f64> {
        self.countdown.as_ref().map(|c| c.remaining().as_secs_f64())
    }
}

impl Drop for App {
    fn drop(&mut self) {
        if let Some(countdown) = self.countdown.as_mut() {
            countdown.cancel();
        }
    }
}

fn open_history() -> Box<dyn HistorySink> {
    let opened = AppDirs::history_db_path()
        .ok_or_else(|| "no state directory".to_string())
        .and_then(|path| {
            SqliteHistory::open(&path, DEFAULT_HISTORY_CAPACITY).map_err(|e| e.to_string())
        });

    match opened {
        Ok(history) => Box::new(history),
        Err(err) => {
            tracing::warn!(%err, "history database unavailable, results kept in memory only");
            Box::new(InMemoryHistory::default())
        }
    }
}

fn run_offline_command(cli: &Cli) -> Result<(), Box<dyn Error>> {
    let path = AppDirs::history_db_path().ok_or("could not determine the state directory")?;
    let history = SqliteHistory::open(&path, DEFAULT_HISTORY_CAPACITY)?;

    if let Some(target) = &cli.export_csv {
        let written = history.export_csv(File::create(target)?)?;
        println!("exported {written} results to {}", target.display());
    }

    if let Some(limit) = cli.history {
        let results = history.recent(limit)?;
        if results.is_empty() {
            println!("no results yet");
        }
        for result in &results {
            println!("{}", format_history_line(result));
        }
    }

    Ok(())
}

fn format_history_line(result: &TestResult) -> String {
    format!(
        "{:<18} {:<6} {:<10} {:>4} wpm {:>4}% acc  {}",
        ui::history::relative_age(result.timestamp, chrono::Utc::now()),
        result.mode,
        ui::history::length_label(result),
        result.wpm,
        result.accuracy,
        result.difficulty
    )
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if cli.is_offline_command() {
        logging::init_stderr_logging(cli.log_level.as_deref());
        return run_offline_command(&cli);
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let _log_guard = AppDirs::log_dir()
        .and_then(|dir| logging::init_file_logging(&dir, cli.log_level.as_deref()));

    let store = FileConfigStore::new();
    let mut config = store.load();
    config.apply(cli.to_patch());
    tracing::info!(?config, "starting");

    let controller = SessionController::new(config, EmbeddedWordLists, open_history());
    let mut app = App::new(controller);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableFocusChange)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableFocusChange,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    let saved = TestConfig {
        custom_text: None,
        ..app.controller.config().clone()
    };
    if let Err(err) = store.save(&saved) {
        tracing::warn!(%err, path = %store.path().display(), "could not save config");
    }

    result
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );

    terminal.draw(|f| ui(app, f))?;

    loop {
        match runner.step() {
            AppEvent::Tick => {
                let was_running = app.controller.session().status() == GameStatus::Running;
                app.on_tick(Instant::now());
                if was_running {
                    terminal.draw(|f| ui(app, f))?;
                }
            }
            AppEvent::Resize => {
                terminal.draw(|f| ui(app, f))?;
            }
            AppEvent::FocusLost => {
                app.on_focus_lost();
                terminal.draw(|f| ui(app, f))?;
            }
            AppEvent::FocusGained => {
                app.on_focus_gained(Instant::now());
                terminal.draw(|f| ui(app, f))?;
            }
            AppEvent::Key(key) => {
                if app.on_key(key) == Action::Quit {
                    break;
                }
                terminal.draw(|f| ui(app, f))?;
            }
        }
    }

    Ok(())
}

fn ui(app: &App, f: &mut Frame) {
    f.render_widget(app, f.area());
}
