#![warn(clippy::all)]

use clap::{Args, Parser, Subcommand};
use log::{error, info, LevelFilter};
use skbhook::commands::{self, RunReport};
use skbhook::settings::Settings;
use skbhook::{Result, SkbHookError};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "skbhook", version, about = "Packet hook registry simulator")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Push synthetic traffic through a hooked driver
    Run(RunArgs),
    /// Write a settings file populated with defaults
    InitConfig {
        /// Target file (defaults to the per-user config location)
        #[arg(long)]
        path: Option<PathBuf>,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the effective settings as TOML
    ShowConfig {
        /// Settings file to read
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Read settings from a file instead of flags; without a value the
    /// per-user config location is used
    #[arg(long, num_args = 0..=1, value_name = "FILE")]
    config: Option<Option<PathBuf>>,

    /// Print the final report as JSON on stdout
    #[arg(long)]
    json: bool,

    #[command(flatten)]
    settings: Settings,
}

/// Initialize the application logger
///
/// `RUST_LOG` overrides `level` when set.
fn init_logger(level: LevelFilter) -> Result<()> {
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] {} - {}: {}",
                chrono::Local::now().format("%H:%M:%S%.3f"),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .try_init()
        .map_err(|e| SkbHookError::InvalidSettings(format!("logger: {}", e)))
}

fn run(args: RunArgs) -> Result<()> {
    let settings = commands::resolve_settings(
        args.config.as_ref().map(|path| path.as_deref()),
        args.settings,
    )?;
    init_logger(settings.log_level_filter()?)?;

    info!("skbhook starting up");

    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .map_err(|e| SkbHookError::Signal(e.to_string()))?;

    let report: RunReport = commands::run(&settings, running)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    info!("skbhook finished in {} ms", report.elapsed_ms);
    Ok(())
}

fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Run(args) => run(args),
        Command::InitConfig { path, force } => {
            init_logger(LevelFilter::Info)?;
            let path = commands::init_config(path.as_deref(), force)?;
            println!("{}", path.display());
            Ok(())
        }
        Command::ShowConfig { config } => {
            init_logger(LevelFilter::Warn)?;
            print!("{}", commands::show_config(config.as_deref())?);
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match dispatch(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if log::log_enabled!(log::Level::Error) {
                error!("{}", e);
            } else {
                eprintln!("Error: {}", e);
            }
            ExitCode::FAILURE
        }
    }
}
