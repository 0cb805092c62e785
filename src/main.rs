//! envsecrets - Resolve configuration from env vars or a cached secret store.

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use envsecrets::cli::output;
use envsecrets::cli::{execute, Cli};
use envsecrets::core::constants::env;
use envsecrets::error::{ConfigError, Error};

fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber with env-filter support; logs go to stderr
    // so `get` output stays clean on stdout
    let filter = EnvFilter::try_from_env(env::LOG).unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("envsecrets=debug")
        } else {
            EnvFilter::new("envsecrets=warn")
        }
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time(),
        )
        .init();

    if let Err(e) = execute(cli) {
        let suggestion = match &e {
            Error::Config(ConfigError::MissingEnvironment) => {
                Some("pass --env or set ENVSECRETS_ENV")
            }
            Error::Config(ConfigError::MissingSecretId { .. }) => {
                Some("pass --secret-id or set ENVSECRETS_SECRET_ID")
            }
            Error::MissingSecret { .. } => Some("run: envsecrets status"),
            _ => None,
        };

        output::error(&e.to_string());
        if let Some(hint) = suggestion {
            output::hint(hint);
        }
        std::process::exit(1);
    }
}
