/// CLI argument parsing

use clap::{Parser, Subcommand};

use crate::core::filter::StatusFilter;

// Build timestamp injected at compile time by build.rs
pub const VERSION_WITH_BUILD: &str = concat!(env!("CARGO_PKG_VERSION"), " (built: ", env!("BUILD_TIMESTAMP"), ")");

#[derive(Parser)]
#[command(name = "localplace-cli")]
#[command(author, version = VERSION_WITH_BUILD, about, long_about = None)]
pub struct Cli {
    /// Base URL of the LocalPlace API (overrides config and LOCALPLACE_API_URL)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Log info-level events to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List containers
    Status {
        /// Only containers whose name contains this text (case-insensitive)
        #[arg(short, long)]
        search: Option<String>,

        /// all, running or stopped
        #[arg(long, default_value_t = StatusFilter::All)]
        status: StatusFilter,
    },

    /// Start a container
    Start {
        /// Container to start
        #[arg(required_unless_present = "all", conflicts_with = "all")]
        name: Option<String>,

        /// Start every stopped container
        #[arg(short, long)]
        all: bool,
    },

    /// Stop a container
    Stop {
        /// Container to stop
        #[arg(required_unless_present = "all", conflicts_with = "all")]
        name: Option<String>,

        /// Stop every running container
        #[arg(short, long)]
        all: bool,
    },

    /// Restart a container
    Restart {
        /// Container to restart
        #[arg(required_unless_present = "all", conflicts_with = "all")]
        name: Option<String>,

        /// Restart every container
        #[arg(short, long)]
        all: bool,
    },

    /// Rebuild a container's image and restart it
    Rebuild { name: String },

    /// Show recent log lines
    Logs {
        /// Container name
        name: String,

        /// Number of lines to show (1-1000)
        #[arg(short = 'n', long)]
        tail: Option<usize>,
    },

    /// Show resource usage of one container
    Stats { name: String },

    /// Check API and Docker connectivity
    Health,

    /// Show host CPU, memory and disk usage
    Metrics,

    /// Configuration management
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the resolved settings
    View,

    /// Save the API base URL to the config file
    SetUrl { url: String },

    /// Print the config file location
    Path,
}
