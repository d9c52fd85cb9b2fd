pub mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{
        DisableMouseCapture, EnableMouseCapture, KeyCode, KeyEvent, KeyEventKind, KeyModifiers,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Frame, Terminal,
};
use reflex::{
    app_dirs::AppDirs,
    clock::{Clock, MonotonicClock},
    config::{Config, ConfigStore, FileConfigStore},
    runtime::{CrosstermEventSource, FixedTicker, ReflexEvent, Runner},
    session::Session,
};
use std::{
    error::Error,
    fs::{self, OpenOptions},
    io::{self, stdin},
    sync::Arc,
    time::Duration,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

const TICK_RATE_MS: u64 = 5;

/// reaction time trainer for the terminal
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Wait for the screen to turn green, then press space (or click) as fast as you can. Tracks your best, average and recent reaction times for the session."
)]
pub struct Cli {
    /// shortest wait before the stimulus, in milliseconds
    #[clap(long)]
    min_delay: Option<u64>,

    /// longest wait before the stimulus, in milliseconds
    #[clap(long)]
    max_delay: Option<u64>,

    /// store the effective delay range as the new default
    #[clap(long)]
    save_config: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Flow {
    Continue,
    Quit,
}

#[derive(Debug)]
pub struct App<C: Clock = MonotonicClock> {
    pub session: Session<C>,
}

impl App {
    pub fn new(config: Config) -> Self {
        Self {
            session: Session::new(config),
        }
    }
}

impl<C: Clock> App<C> {
    pub fn on_key(&mut self, key: KeyEvent) -> Flow {
        if key.kind != KeyEventKind::Press {
            return Flow::Continue;
        }

        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => Flow::Quit,
            // ctrl+c to quit
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Flow::Quit,
            KeyCode::Char(' ') | KeyCode::Enter => {
                self.session.press();
                Flow::Continue
            }
            KeyCode::Char('r') => {
                self.session.reset();
                Flow::Continue
            }
            KeyCode::Char('s') => {
                self.session.reset_stats();
                Flow::Continue
            }
            _ => Flow::Continue,
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let store = FileConfigStore::new();
    let config = store.load().with_overrides(cli.min_delay, cli.max_delay);
    if let Err(e) = config.validate() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::ValueValidation, e).exit();
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    init_logging();

    if cli.save_config {
        store.save(&config)?;
        info!(path = %store.path().display(), "config saved");
    }

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(config);
    let result = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

/// Send tracing output to a file; the terminal belongs to the UI
fn init_logging() {
    let Some(path) = AppDirs::log_path() else {
        return;
    };
    if let Some(parent) = path.parent() {
        if fs::create_dir_all(parent).is_err() {
            return;
        }
    }
    let Ok(log_file) = OpenOptions::new().create(true).append(true).open(&path) else {
        return;
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Arc::new(log_file))
        .with_ansi(false)
        .try_init();
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );

    info!("session started");
    terminal.draw(|f| ui(app, f))?;

    loop {
        let mut redraw = match runner.step() {
            ReflexEvent::Tick => false,
            ReflexEvent::Resize => true,
            ReflexEvent::Press => {
                app.session.press();
                true
            }
            ReflexEvent::Key(key) => match app.on_key(key) {
                Flow::Quit => break,
                Flow::Continue => true,
            },
        };

        // a steady stream of input must not starve the stimulus
        redraw |= app.session.on_tick();

        if redraw {
            terminal.draw(|f| ui(app, f))?;
        }
    }

    let stats = app.session.game().stats();
    info!(
        attempts = stats.total_attempts,
        best = ?stats.best_time,
        average = ?stats.average_time,
        "session finished"
    );
    Ok(())
}

fn ui<C: Clock>(app: &App<C>, f: &mut Frame) {
    f.render_widget(app, f.area());
}
