//! Command-line interface.

pub mod check;
pub mod completions;
pub mod get;
pub mod output;
pub mod status;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::core::config::{Overrides, Settings};
use crate::core::constants::env;
use crate::core::resolver::Resolver;
use crate::error::Result;

/// envsecrets - Resolve configuration from env vars or a cached secret store.
#[derive(Parser)]
#[command(
    name = "envsecrets",
    about = "Resolve configuration from env vars locally or a cached secret store elsewhere",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Path to config file (default: .envsecrets.toml if present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Active environment (e.g. dev, staging, prod)
    #[arg(long = "env", global = true, env = env::ENVIRONMENT)]
    pub environment: Option<String>,

    /// Environment that reads secrets from local env vars
    #[arg(long, global = true, env = env::LOCAL_ENV)]
    pub local_env: Option<String>,

    /// Remote secret id holding the JSON blob
    #[arg(long, global = true, env = env::SECRET_ID)]
    pub secret_id: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Top-level commands.
#[derive(Subcommand)]
pub enum Command {
    /// Print the value of a secret
    Get {
        /// Secret key (e.g., DATABASE_URL)
        key: String,
    },

    /// Show the active environment and resolution mode
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Verify that every listed key resolves
    Check {
        /// Secret keys to verify
        #[arg(required = true)]
        keys: Vec<String>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completions.
#[derive(clap::ValueEnum, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

/// Options shared by every command that needs settings.
pub struct Context {
    config: Option<PathBuf>,
    overrides: Overrides,
}

impl Context {
    /// Layered settings for this invocation.
    pub fn settings(&self) -> Result<Settings> {
        Settings::load(self.config.as_deref(), &self.overrides)
    }

    /// Build the resolver for this invocation.
    pub fn resolver(&self) -> Result<Resolver> {
        Resolver::new(self.settings()?)
    }
}

/// Execute a command.
pub fn execute(cli: Cli) -> Result<()> {
    let ctx = Context {
        config: cli.config,
        overrides: Overrides {
            environment: cli.environment,
            local_environment: cli.local_env,
            secret_id: cli.secret_id,
        },
    };

    match cli.command {
        Command::Get { key } => get::execute(&ctx, &key),
        Command::Status { json } => status::execute(&ctx, json),
        Command::Check { keys } => check::execute(&ctx, &keys),
        Command::Completions { shell } => completions::execute(shell),
    }
}
