pub mod punch;
pub mod session;
pub mod shutdown;

use std::{io::IsTerminal, path::PathBuf, sync::Arc};

use anyhow::Result;
use chrono::Local;
use clap::{Parser, Subcommand};
use tokio::io::BufReader;
use tokio_util::sync::CancellationToken;
use tracing::{info, level_filters::LevelFilter, warn};

use crate::{
    config::Settings,
    ledger::{entities::PunchKind, HydrateOutcome, PunchLedger},
    storage::{file_store::FileStore, memory_store::MemoryStore, KeyValueStore},
    ticker::ClockTicker,
    utils::{
        clock::{Clock, DefaultClock},
        dir::resolve_application_path,
        logging::{enable_logging, COMMAND_PREFIX, SESSION_PREFIX},
    },
    view::render_links,
};

use session::SessionView;

#[derive(Parser, Debug)]
#[command(name = "punchclock", version, long_about = None)]
#[command(about = "Punch clock-in and clock-out times from the terminal", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Option<Commands>,
    #[arg(
        long,
        global = true,
        help = "Application directory. By default uses $XDG_STATE_HOME/punchclock or $HOME/.local/state/punchclock"
    )]
    dir: Option<PathBuf>,
    #[arg(long, global = true, help = "Storage key holding the punch history")]
    key: Option<String>,
    #[arg(
        long,
        global = true,
        help = "Keep punches in memory only. Nothing is read from or written to disk"
    )]
    ephemeral: bool,
    #[arg(long = "no-color", global = true, help = "Disable coloured output")]
    no_color: bool,
    #[arg(long, global = true, help = "Enable logging to stdout")]
    log: bool,
    #[arg(long = "log-filter", global = true, help = "Log level written to the log files")]
    log_filter: Option<LevelFilter>,
}

#[derive(Subcommand, Debug, Clone, Copy)]
#[command(version, about, long_about = None)]
enum Commands {
    #[command(about = "Show the live clock and history, punch with i / o. Default command")]
    Session,
    #[command(about = "Punch a clock-in and print the history")]
    In,
    #[command(about = "Punch a clock-out and print the history")]
    Out,
    #[command(about = "Print the punch history, newest first")]
    History,
    #[command(about = "Print the calendar, mail and weather links")]
    Links,
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();
    let command = args.commands.unwrap_or(Commands::Session);

    let app_dir = resolve_application_path(args.dir.clone())?;
    let logging_level = if args.log {
        Some(LevelFilter::TRACE)
    } else {
        args.log_filter
    };
    let prefix = match command {
        Commands::Session => SESSION_PREFIX,
        _ => COMMAND_PREFIX,
    };
    enable_logging(prefix, &app_dir, logging_level, args.log)?;

    let mut settings = Settings::load(&app_dir)?;
    if let Some(key) = args.key {
        settings.storage_key = key;
    }
    if args.no_color || !std::io::stdout().is_terminal() {
        settings.colors = false;
    }
    info!("Running {command:?} in {app_dir:?}");

    match command {
        Commands::Links => {
            print!("{}", render_links(&settings.links));
            Ok(())
        }
        Commands::In | Commands::Out | Commands::History => {
            let ledger = open_ledger(app_dir, &settings, args.ephemeral).await?;
            let mut stdout = std::io::stdout();
            match command {
                Commands::In => {
                    punch::punch(ledger, PunchKind::ClockIn, &mut stdout, &settings, &Local).await
                }
                Commands::Out => {
                    punch::punch(ledger, PunchKind::ClockOut, &mut stdout, &settings, &Local).await
                }
                _ => punch::print_history(&ledger, &mut stdout, &settings, &Local),
            }
        }
        Commands::Session => {
            let ledger = open_ledger(app_dir, &settings, args.ephemeral).await?;
            start_session(ledger, &settings).await
        }
    }
}

async fn open_ledger(app_dir: PathBuf, settings: &Settings, ephemeral: bool) -> Result<PunchLedger> {
    let store: Box<dyn KeyValueStore> = if ephemeral {
        Box::new(MemoryStore::new())
    } else {
        Box::new(FileStore::new(app_dir.join("store"))?)
    };
    let ledger = PunchLedger::hydrate(store, &settings.storage_key, Arc::new(DefaultClock)).await;
    match ledger.hydrate_outcome() {
        HydrateOutcome::Absent | HydrateOutcome::Loaded(_) => {
            info!("Opened {:?} with {} punches", settings.storage_key, ledger.len())
        }
        outcome => warn!("Opened {:?} after {outcome:?}", settings.storage_key),
    }
    Ok(ledger)
}

async fn start_session(ledger: PunchLedger, settings: &Settings) -> Result<()> {
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let ticker = ClockTicker::start(clock, settings.tick_interval());
    let shutdown_token = CancellationToken::new();

    let view = SessionView {
        out: std::io::stdout(),
        clear_screen: std::io::stdout().is_terminal(),
        colors: settings.colors,
        links: settings.links.clone(),
    };
    let input = BufReader::new(tokio::io::stdin());

    let (_, session_result) = tokio::join!(shutdown::detect_shutdown(shutdown_token.clone()), async {
        let result =
            session::run_session(ledger, ticker, input, view, &Local, shutdown_token.clone()).await;
        // Lets detect_shutdown return once the user quits on their own.
        shutdown_token.cancel();
        result
    });

    let ledger = session_result?;
    info!("Session ended with {} punches", ledger.len());
    Ok(())
}
