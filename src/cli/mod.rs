//! Command-line interface for adboard.

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// adboard - classifieds web service
#[derive(Parser)]
#[command(name = "adboard")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Read configuration from this file instead of the default locations
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP server (default)
    Serve,

    /// Create an admin account, or promote an existing user to admin
    CreateAdmin {
        username: String,
        password: String,
    },

    /// Write a default config file with a fresh signing secret
    #[command(alias = "init")]
    InitConfig {
        #[arg(default_value = "config.toml")]
        path: PathBuf,
    },
}

pub use commands::*;
