//! CLI arguments and subcommands for rrdsense.
//!
//! This module defines the command-line interface structure using the clap
//! library. The binary is invoked by cron (collect-all every minute) and by
//! the container entrypoint (init-all at startup).

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Log level options for CLI parsing
#[derive(Debug, Clone, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Configuration format options for output
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

/// Main CLI arguments structure
#[derive(Parser, Debug)]
#[command(
    name = "rrdsense",
    about = "Host sensor collector feeding RRD databases",
    long_about = "Host sensor collector feeding RRD databases.\n\n\
                  Resolves hwmon chips by name (hwmon indices are unstable across \
                  reboots), reads disk state from Unraid's disks.ini snapshot, applies \
                  per-sensor arithmetic transforms, and submits one positionally \
                  ordered update per RRD.",
    author = "Michael Moll <exporter@herakles.now> - Herakles",
    version = "0.1.0",
    propagate_version = true
)]
pub struct Args {
    /// Defaults to collect-all when no subcommand is given (cron usage)
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Log level
    #[arg(long, value_enum, default_value = "info")]
    pub log_level: LogLevel,

    /// Directory holding per-RRD config files (YAML/JSON/TOML)
    #[arg(long, default_value = "/config")]
    pub config_dir: PathBuf,

    /// Where the host /sys tree is mounted inside the container
    #[arg(long, default_value = "/hostsys")]
    pub sys_mount: PathBuf,

    /// Path to the host disks.ini snapshot
    #[arg(long, default_value = "/var/local/emhttp/disks.ini")]
    pub disks_ini: PathBuf,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Collect all sensors from one config and update its RRD
    Collect {
        /// Path to the config file
        #[arg(short = 'c', long)]
        config: PathBuf,
    },

    /// Collect for every enabled config in the config directory
    CollectAll,

    /// Create the RRD database for one config if it does not exist yet
    Init {
        /// Path to the config file
        #[arg(short = 'c', long)]
        config: PathBuf,
    },

    /// Create RRD databases for every enabled config in the config directory
    InitAll,

    /// Validate a config file (schema plus transform expressions) and exit
    Check {
        /// Path to the config file
        #[arg(short = 'c', long)]
        config: PathBuf,
    },

    /// Print a parsed config in the requested format
    Show {
        /// Path to the config file
        #[arg(short = 'c', long)]
        config: PathBuf,

        /// Output format
        #[arg(long, value_enum, default_value = "yaml")]
        format: ConfigFormat,
    },
}
