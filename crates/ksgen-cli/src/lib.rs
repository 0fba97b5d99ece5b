//! ksgen CLI library

pub mod commands;
pub mod config;
pub mod error;
pub mod writer;

pub use error::{Error, Result};

use clap::{Parser, Subcommand};

/// ksgen - KubeSaw admin manifest generator
#[derive(Parser, Debug)]
#[command(name = "ksgen")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate the manifest tree for an admins spec
    Generate(commands::generate::GenerateArgs),
}

impl Cli {
    /// Run the CLI command
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Generate(args) => commands::generate::run(args),
        }
    }
}
