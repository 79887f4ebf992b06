//! rrdsense - version 0.1.0
//!
//! Host sensor collector feeding RRD databases. This is the main entry
//! point that initializes logging and dispatches subcommands. Invoked by
//! cron (collect-all) and the container entrypoint (init-all).

use clap::Parser;
use rrdsense::cli::{Args, Commands, LogLevel};
use rrdsense::commands::{
    command_check, command_collect, command_collect_all, command_init, command_init_all,
};
use rrdsense::config::{load_config, show_config};
use tracing::{error, Level};

/// Initializes tracing logging subsystem with configured log level.
fn setup_logging(args: &Args) {
    let log_level = match args.log_level {
        LogLevel::Off => Level::ERROR,
        LogLevel::Error => Level::ERROR,
        LogLevel::Warn => Level::WARN,
        LogLevel::Info => Level::INFO,
        LogLevel::Debug => Level::DEBUG,
        LogLevel::Trace => Level::TRACE,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

fn main() {
    let args = Args::parse();
    setup_logging(&args);

    let result = match &args.command {
        Some(Commands::Collect { config }) => {
            command_collect(config, &args.sys_mount, &args.disks_ini)
        }
        Some(Commands::CollectAll) | None => {
            command_collect_all(&args.config_dir, &args.sys_mount, &args.disks_ini)
        }
        Some(Commands::Init { config }) => command_init(config),
        Some(Commands::InitAll) => command_init_all(&args.config_dir),
        Some(Commands::Check { config }) => command_check(config),
        Some(Commands::Show { config, format }) => {
            load_config(config).and_then(|cfg| show_config(&cfg, *format))
        }
    };

    if let Err(e) = result {
        error!("{}", e);
        std::process::exit(1);
    }
}
