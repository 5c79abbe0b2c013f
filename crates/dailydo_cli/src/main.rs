//! Command-line front end for the dailydo board.
//!
//! # Responsibility
//! - Parse commands and route them to `TaskBoard` operations.
//! - Render the board after every mutation.
//! - Host the reset schedule in `watch` mode.

mod render;

use chrono::Local;
use clap::{Parser, Subcommand, ValueEnum};
use dailydo_core::{
    init_logging, open_db, run_reset_schedule, AppConfig, BoardError, ConfigError,
    ConfigOverrides, DbError, ListKind, ResetSchedule, ResetTrigger, SqliteKvStore, StoreError,
    SystemClock, TaskBoard, Theme,
};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

type Board = TaskBoard<SqliteKvStore, SystemClock>;

/// dailydo - a daily list that empties itself at midnight, and a general one that doesn't
#[derive(Parser, Debug)]
#[command(name = "dailydo")]
#[command(version, about, long_about = None)]
#[command(
    after_help = "ENVIRONMENT:\n    DAILYDO_DB_PATH     Database file\n    DAILYDO_LOG_LEVEL   trace|debug|info|warn|error\n    DAILYDO_LOG_DIR     Log directory"
)]
struct Cli {
    /// Database file (defaults to the platform data directory)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Log level
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Log directory
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
enum Command {
    /// Show both lists (default)
    List,

    /// Add a task
    Add {
        /// daily | general
        list: ListKind,
        /// Task text; words are joined with spaces
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },

    /// Flip a task between done and not done
    Toggle { list: ListKind, index: usize },

    /// Delete a task
    Delete { list: ListKind, index: usize },

    /// Move a task within or between lists
    Move {
        from: ListKind,
        index: usize,
        to: ListKind,
        /// Position in the target list, counted without the moved task
        target_index: usize,
    },

    /// Show or change the theme
    Theme {
        #[arg(value_enum)]
        action: Option<ThemeAction>,
    },

    /// Clear the daily list if the date changed since the last reset
    ResetCheck,

    /// Keep running and clear the daily list at midnight
    Watch {
        /// Seconds between date checks
        #[arg(long, default_value_t = 60)]
        poll_secs: u64,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum ThemeAction {
    Toggle,
    Dark,
    Light,
}

#[derive(Debug)]
enum CliError {
    Config(ConfigError),
    Db(DbError),
    Store(StoreError),
    Board(BoardError),
    Runtime(std::io::Error),
}

impl Display for CliError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
            Self::Board(err) => write!(f, "{err}"),
            Self::Runtime(err) => write!(f, "failed to start async runtime: {err}"),
        }
    }
}

impl Error for CliError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Store(err) => Some(err),
            Self::Board(err) => Some(err),
            Self::Runtime(err) => Some(err),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<DbError> for CliError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<StoreError> for CliError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<BoardError> for CliError {
    fn from(value: BoardError) -> Self {
        Self::Board(value)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config = AppConfig::resolve(ConfigOverrides {
        db_path: cli.db,
        log_level: cli.log_level,
        log_dir: cli.log_dir,
    });
    config.ensure_dirs()?;

    // Logging is best-effort; the board works without it.
    if let Err(err) = init_logging(&config.log_level, &config.log_dir.to_string_lossy()) {
        eprintln!("warning: logging disabled: {err}");
    }

    let kv = SqliteKvStore::try_new(open_db(&config.db_path)?)?;
    let mut board = TaskBoard::open(kv, SystemClock)?;

    match cli.command.unwrap_or(Command::List) {
        Command::List => {}
        Command::Add { list, text } => {
            if board.add_task(list, &text.join(" "))?.is_none() {
                eprintln!("nothing to add: task text is blank");
            }
        }
        Command::Toggle { list, index } => {
            board.toggle_at(list, index)?;
        }
        Command::Delete { list, index } => {
            board.delete_at(list, index)?;
        }
        Command::Move {
            from,
            index,
            to,
            target_index,
        } => {
            board.move_task(from, index, to, target_index)?;
        }
        Command::Theme { action } => {
            match action {
                None => {}
                Some(ThemeAction::Toggle) => {
                    board.toggle_theme()?;
                }
                Some(ThemeAction::Dark) => {
                    board.set_theme(Theme::Dark)?;
                }
                Some(ThemeAction::Light) => {
                    board.set_theme(Theme::Light)?;
                }
            }
            println!("{}", board.theme());
            return Ok(());
        }
        Command::ResetCheck => {
            let reset = board.check_for_reset()?;
            println!("{}", if reset { "daily list cleared" } else { "up to date" });
        }
        Command::Watch { poll_secs } => {
            let mut schedule = config.schedule;
            schedule.poll_interval = Duration::from_secs(poll_secs.max(1));
            return watch(board, schedule);
        }
    }

    print_board(&board);
    Ok(())
}

fn print_board(board: &Board) {
    print!(
        "{}",
        render::render_board(board.daily(), board.general(), board.theme(), &Local)
    );
}

fn watch(board: Board, schedule: ResetSchedule) -> Result<(), CliError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;

    print_board(&board);
    let board = Arc::new(Mutex::new(board));
    let cancel = CancellationToken::new();

    runtime.block_on(async {
        let shutdown = cancel.clone();
        tokio::spawn(async move {
            if let Err(err) = tokio::signal::ctrl_c().await {
                warn!("event=watch module=cli status=error error={err}");
            }
            shutdown.cancel();
        });

        info!("event=watch module=cli status=start");
        let render_board = Arc::clone(&board);
        run_reset_schedule(board, schedule, cancel, move |trigger: ResetTrigger| {
            println!("\n-- daily list cleared ({}) --", trigger.as_str());
            let guard = render_board
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            print_board(&guard);
        })
        .await;
        info!("event=watch module=cli status=stopped");
    });

    Ok(())
}
