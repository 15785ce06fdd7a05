use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "napp")]
#[command(about = "Install, enable and publish Kytos Network Applications")]
#[command(version)]
pub struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Quiet output (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Base directory (default: ~/.napp)
    #[arg(long, global = true)]
    pub base_dir: Option<PathBuf>,

    /// Installed NApps root (skips asking the controller)
    #[arg(long, global = true, requires = "enabled_path")]
    pub installed_path: Option<PathBuf>,

    /// Enabled NApps root (skips asking the controller)
    #[arg(long, global = true, requires = "installed_path")]
    pub enabled_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Install NApps from the working directory or the NApps Server, then enable them
    Install {
        /// NApps to install (e.g., kytos/of_core or kytos/of_core:2017.1)
        #[arg(required = true)]
        napps: Vec<String>,
    },

    /// Disable and remove installed NApps
    Uninstall {
        #[arg(required = true)]
        napps: Vec<String>,
    },

    /// Enable installed NApps
    Enable {
        #[arg(required = true)]
        napps: Vec<String>,
    },

    /// Disable enabled NApps
    Disable {
        #[arg(required = true)]
        napps: Vec<String>,
    },

    /// Show installed NApps and whether they are enabled
    List,

    /// Search the NApps Server by name, description or tag
    Search {
        /// Text to look for (case-insensitive)
        query: String,

        /// Treat the query as a regular expression matched from the start
        #[arg(long)]
        regex: bool,
    },

    /// Reload NApps code in the running controller (all when none given)
    Reload {
        napps: Vec<String>,
    },

    /// Package the NApp in the current directory and publish it
    Upload {
        /// NApps Server user
        #[arg(short, long)]
        user: Option<String>,

        /// NApps Server password (prompted when missing)
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Delete NApps from the NApps Server
    Delete {
        #[arg(required = true)]
        napps: Vec<String>,

        /// NApps Server user
        #[arg(short, long)]
        user: Option<String>,

        /// NApps Server password (prompted when missing)
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Bootstrap a new NApp in the current directory
    Create {
        /// Owner (NApps Server user)
        #[arg(long)]
        username: Option<String>,

        /// NApp name
        #[arg(long)]
        name: Option<String>,

        /// One-line description
        #[arg(long)]
        description: Option<String>,

        /// Create a meta package (metadata only, no code)
        #[arg(long)]
        meta: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a config value
    Get {
        /// Config key (e.g., napps.repo)
        key: String,
    },

    /// Set a config value
    Set {
        /// Config key (e.g., kytos.api)
        key: String,

        /// Value to set (empty clears optional keys)
        value: String,
    },

    /// List all config values
    List,

    /// Show config file path
    Path,

    /// Initialize config file with defaults
    Init,
}
