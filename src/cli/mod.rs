pub mod watch;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::level_filters::LevelFilter;
use watch::{process_watch_command, WatchCommand};

use crate::{
    idle::{GenericIdleSource, IdleSource},
    utils::{
        dir::create_application_default_path, logging::enable_logging,
        runtime::single_thread_runtime,
    },
};

#[derive(Parser, Debug)]
#[command(name = "afkwatch", version, long_about = None)]
#[command(about = "Reports when you go away from and come back to your computer", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(long, help = "Mirror logs to the console")]
    log: bool,
    #[arg(long = "log-filter", help = "Log level, overrides RUST_LOG")]
    log_filter: Option<LevelFilter>,
    #[arg(
        long,
        help = "Application directory for logs. By default $XDG_STATE_HOME/afkwatch or $HOME/.local/state/afkwatch"
    )]
    dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
#[command(version, about, long_about = None)]
enum Commands {
    #[command(about = "Track presence and print subscribed events until interrupted")]
    Watch {
        #[command(flatten)]
        command: WatchCommand,
    },
    #[command(about = "Print the current system idle time")]
    Idle {},
}

pub fn run_cli() -> Result<()> {
    let args = Args::parse();

    let app_dir = args.dir.map_or_else(create_application_default_path, Ok)?;
    enable_logging(&app_dir, args.log_filter, args.log)?;

    match args.commands {
        Commands::Watch { command } => {
            single_thread_runtime()?.block_on(process_watch_command(command))
        }
        Commands::Idle {} => {
            let idle = GenericIdleSource::new()?.idle_time()?;
            println!("{} ms", idle.as_millis());
            Ok(())
        }
    }
}
