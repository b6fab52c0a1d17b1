//! CLI argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Map entity relationships in TypeScript and JavaScript codebases
#[derive(Parser, Debug)]
#[command(name = "surveyor")]
#[command(about = "Map entity relationships in TypeScript and JavaScript codebases")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

impl Args {
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Analyze a project and print its relationship graph
    Analyze {
        /// Path to the project root
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Write the result here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format (json, mermaid)
        #[arg(long, default_value = "json")]
        format: String,

        /// Directory names to exclude (can be repeated)
        #[arg(long)]
        exclude: Vec<String>,

        /// File extensions to analyze, without the dot (can be repeated)
        #[arg(long = "ext")]
        extensions: Vec<String>,

        /// Config file path
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Query the relationship graph with filters
    Query {
        /// Path to the project root
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Keep nodes whose directory contains this substring
        #[arg(short, long)]
        directory: Option<String>,

        /// Keep nodes whose name contains this substring
        #[arg(short, long)]
        name: Option<String>,

        /// Also include nodes one relationship away from a match
        #[arg(long)]
        related: bool,

        /// Output format (json, mermaid)
        #[arg(long, default_value = "json")]
        format: String,

        /// Config file path
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Re-analyze the project whenever its files change
    Watch {
        /// Path to the project root
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Quiet period in milliseconds before re-analysis
        #[arg(long)]
        debounce: Option<u64>,

        /// Config file path
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Show version information
    Version,
}
