mod ui;

use chrono::{DateTime, Local};
use clap::{error::ErrorKind, CommandFactory, Parser, ValueEnum};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use rand::{rngs::StdRng, SeedableRng};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use reflex::{
    app_dirs::AppDirs,
    clock::SystemClock,
    config::{Config, ConfigStore, FileConfigStore},
    runtime::{map_key, CrosstermEventSource, FixedTicker, GameEvent, Input, Runner},
    Command, GameVariant, RoundEngine,
};
use std::{
    error::Error,
    io::{self, stdin},
    path::PathBuf,
    time::Duration,
};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

const TICK_RATE_MS: u64 = 50;

/// reaction-time mini-games in the terminal
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Stroop, fruit stroop, rock-paper-scissors and whack-a-mole reflex games played against a two minute countdown."
)]
pub struct Cli {
    /// game to play
    #[clap(short = 'g', long, value_enum)]
    game: Option<GameArg>,

    /// difficulty level; higher levels shorten the exposure delay
    #[clap(short = 'l', long, value_parser = clap::value_parser!(u8).range(1..=7))]
    level: Option<u8>,

    /// session length in seconds
    #[clap(short = 's', long, value_parser = clap::value_parser!(u32).range(1..=120))]
    seconds: Option<u32>,

    /// seed for rule and stimulus selection, for repeatable sessions
    #[clap(long)]
    seed: Option<u64>,

    /// config file to use instead of the default location
    #[clap(short = 'c', long)]
    config: Option<PathBuf>,

    /// write the effective settings back to the config file
    #[clap(long)]
    save_config: bool,
}

#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum GameArg {
    Stroop,
    Fruit,
    Rps,
    Mole,
}

impl GameArg {
    fn as_variant(&self) -> GameVariant {
        match self {
            GameArg::Stroop => GameVariant::WordColor,
            GameArg::Fruit => GameVariant::WordColorPicture,
            GameArg::Rps => GameVariant::RockPaperScissors,
            GameArg::Mole => GameVariant::WhackAMole,
        }
    }
}

impl Cli {
    /// Command-line flags win over the config file.
    fn apply_to(&self, mut config: Config) -> Config {
        if let Some(game) = self.game {
            config.variant = game.as_variant();
        }
        if let Some(level) = self.level {
            config.level = level;
        }
        if let Some(seconds) = self.seconds {
            config.session_secs = seconds;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        config
    }

    fn config_store(&self) -> FileConfigStore {
        match &self.config {
            Some(path) => FileConfigStore::with_path(path),
            None => FileConfigStore::new(),
        }
    }
}

pub struct App {
    pub engine: RoundEngine<SystemClock, StdRng>,
    pub finished_at: Option<DateTime<Local>>,
}

impl App {
    pub fn new(config: &Config) -> Result<Self, Box<dyn Error>> {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let engine = RoundEngine::with_embedded_stimuli(config, SystemClock::new(), rng)?;

        Ok(Self {
            engine,
            finished_at: None,
        })
    }

    fn note_game_over(&mut self) {
        if self.engine.is_game_over() && self.finished_at.is_none() {
            self.finished_at = Some(Local::now());
        }
    }
}

fn init_tracing() -> Option<WorkerGuard> {
    let dir = AppDirs::log_dir()?;
    std::fs::create_dir_all(&dir).ok()?;

    let appender = tracing_appender::rolling::never(dir, "reflex.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(writer)
        .with_ansi(false)
        .init();

    Some(guard)
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let _log_guard = init_tracing();

    let store = cli.config_store();
    let config = cli.apply_to(store.load());
    if let Err(err) = config.validate() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::InvalidValue, err.to_string()).exit();
    }
    if cli.save_config {
        if let Err(err) = store.save(&config) {
            warn!(path = %store.path().display(), %err, "could not save config");
        }
    }
    info!(variant = %config.variant, level = config.level, "starting");

    let mut app = App::new(&config)?;

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen,)?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );
    let variant = app.engine.variant();

    terminal.draw(|f| f.render_widget(&*app, f.area()))?;

    loop {
        let redraw = match runner.step() {
            GameEvent::Tick => {
                let changed = app.engine.poll();
                app.note_game_over();
                changed
            }
            GameEvent::Resize => true,
            GameEvent::Key(key) => match map_key(&key, variant) {
                Some(Input::Quit) => break,
                Some(Input::Engine(command)) => {
                    if command == Command::Start || command == Command::Reset {
                        app.finished_at = None;
                    }
                    app.engine.apply(command);
                    app.note_game_over();
                    true
                }
                None => false,
            },
        };

        if redraw {
            terminal.draw(|f| f.render_widget(&*app, f.area()))?;
        }
    }

    Ok(())
}
