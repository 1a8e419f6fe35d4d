//! Command-line interface.

mod commands;

use clap::{Parser, Subcommand};

/// Chemical/metal compatibility and product catalogue API server
#[derive(Parser)]
#[command(name = "compatd")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP API server (default)
    Serve,

    /// Create a default config file
    Init,

    /// Create an administrator account
    CreateAdmin {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
    },
}

pub use commands::*;
