//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod categories;
mod check;
mod classify;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use doclassify::config::Config;
use doclassify::discovery::FileTypeFilter;
use doclassify::llm::Provider;

#[derive(Parser)]
#[command(name = "doclassify")]
#[command(about = "Classify PDF, DOCX and PPTX documents into product categories using LLMs")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

fn parse_provider(s: &str) -> Result<Provider, String> {
    Provider::from_str(s).ok_or_else(|| {
        let names: Vec<&str> = Provider::ALL.iter().map(|p| p.as_str()).collect();
        format!("unknown provider '{}' (expected one of: {})", s, names.join(", "))
    })
}

fn parse_file_type(s: &str) -> Result<FileTypeFilter, String> {
    FileTypeFilter::from_str(s)
        .ok_or_else(|| format!("unknown file type '{}' (expected pdf, docx, pptx or all)", s))
}

#[derive(Subcommand)]
enum Commands {
    /// Extract, summarize and classify every document under the input directory
    Classify {
        /// Type of files to process: pdf, docx, pptx, or all
        #[arg(short = 't', long, default_value = "all", value_parser = parse_file_type)]
        file_type: FileTypeFilter,
        /// Directory to search for documents (overrides config)
        #[arg(short = 'd', long)]
        input_dir: Option<PathBuf>,
        /// Directory to save the output file
        #[arg(short = 'o', long, default_value = ".")]
        output_dir: PathBuf,
        /// Name of the output CSV file
        #[arg(short = 'f', long, default_value = "classification_results.csv")]
        output_filename: String,
        /// LLM provider to use for classification: ollama, deepseek, or nvidia_nim
        #[arg(short, long, default_value = "ollama", value_parser = parse_provider)]
        provider: Provider,
        /// Record failed backend calls as ClassificationFailed instead of aborting
        #[arg(long)]
        isolate_failures: bool,
    },

    /// Check tool availability and provider credentials
    Check,

    /// Show the configured categories and the classification prompt
    Categories,
}

/// Run the CLI.
pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Classify {
            file_type,
            input_dir,
            output_dir,
            output_filename,
            provider,
            isolate_failures,
        } => classify::cmd_classify(
            &config,
            classify::ClassifyArgs {
                file_type,
                input_dir,
                output_dir,
                output_filename,
                provider,
                isolate_failures,
            },
        ),
        Commands::Check => check::cmd_check(&config),
        Commands::Categories => categories::cmd_categories(&config),
    }
}
