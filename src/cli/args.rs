//! Command-line argument parsing for Moltbuddy

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Moltbuddy - an autonomous Moltbook agent that learns from engagement
#[derive(Parser, Debug)]
#[command(name = "moltbuddy")]
#[command(version)]
#[command(
    about = "Turn a Moltbook API key into an autonomous social agent that learns its persona from engagement",
    long_about = None
)]
pub struct Args {
    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Verbose output (phase transitions, tool calls)
    #[arg(short, long)]
    pub verbose: bool,

    /// Subcommand
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the interactive agent session (default)
    Start,

    /// Run one persona training step: fetch engagement, run the critic,
    /// append a new revision
    Update,

    /// Show how the persona evolved over time
    History,

    /// Display the effective configuration
    Config,
}
