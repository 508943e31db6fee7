//! Command-Line Interface (CLI) argument parsing.
//!
//! This module defines the command-line arguments for the application using the
//! `clap` crate. The parsed `Cli` doubles as a `figment` provider, so flags are
//! merged on top of the configuration file and environment variables.

use clap::{Parser, Subcommand};
use figment::{
    value::{Dict, Map, Value},
    Error, Metadata, Profile, Provider,
};
use std::path::PathBuf;

/// Wait for a condition by polling it, instead of sleeping and hoping.
#[derive(Parser, Debug, Clone, Default)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Log level used when RUST_LOG is not set (e.g. "debug").
    #[arg(long, value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Time between checks in milliseconds.
    #[arg(long, value_name = "MS", global = true)]
    pub interval_ms: Option<u64>,

    /// Total time budget in milliseconds.
    #[arg(long, value_name = "MS", global = true)]
    pub timeout_ms: Option<u64>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Poll a URL until it answers with the expected status.
    Wait {
        /// URL to poll.
        #[arg(long)]
        url: Option<String>,
    },
    /// Run the greeting server until interrupted.
    Serve {
        /// Address to listen on.
        #[arg(long, value_name = "ADDR")]
        listen: Option<String>,
        /// Answer 503 for this long before becoming ready.
        #[arg(long, value_name = "MS")]
        startup_delay_ms: Option<u64>,
    },
    /// Start a slow greeting server and wait for it by polling.
    Demo {
        /// Answer 503 for this long before becoming ready.
        #[arg(long, value_name = "MS")]
        startup_delay_ms: Option<u64>,
    },
}

impl Cli {
    /// The command to run; `demo` when none was given.
    pub fn command(&self) -> Command {
        self.command
            .clone()
            .unwrap_or(Command::Demo { startup_delay_ms: None })
    }
}

impl Provider for Cli {
    fn metadata(&self) -> Metadata {
        Metadata::named("Command-Line Arguments")
    }

    fn data(&self) -> Result<Map<Profile, Dict>, Error> {
        let mut dict = Dict::new();
        let mut poll = Dict::new();
        let mut server = Dict::new();
        let mut probe = Dict::new();

        if let Some(level) = &self.log_level {
            dict.insert("log_level".into(), Value::from(level.clone()));
        }
        if let Some(ms) = self.interval_ms {
            poll.insert("interval_ms".into(), Value::from(ms));
        }
        if let Some(ms) = self.timeout_ms {
            poll.insert("timeout_ms".into(), Value::from(ms));
        }

        match &self.command {
            Some(Command::Wait { url }) => {
                if let Some(url) = url {
                    probe.insert("url".into(), Value::from(url.clone()));
                }
            }
            Some(Command::Serve {
                listen,
                startup_delay_ms,
            }) => {
                if let Some(listen) = listen {
                    server.insert("listen_addr".into(), Value::from(listen.clone()));
                }
                if let Some(ms) = startup_delay_ms {
                    server.insert("startup_delay_ms".into(), Value::from(*ms));
                }
            }
            Some(Command::Demo { startup_delay_ms }) => {
                if let Some(ms) = startup_delay_ms {
                    server.insert("startup_delay_ms".into(), Value::from(*ms));
                }
            }
            None => {}
        }

        // Nested sections are merged key by key, so only present flags override.
        for (name, section) in [("poll", poll), ("server", server), ("probe", probe)] {
            if !section.is_empty() {
                dict.insert(name.into(), Value::from(section));
            }
        }

        let mut map = Map::new();
        map.insert(Profile::Default, dict);
        Ok(map)
    }
}
