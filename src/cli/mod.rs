//! CLI module for PMP LLM Cache
//!
//! Provides subcommands for working with the tiered cache:
//! - `query`: answer one query through the layers
//! - `ingest`: add files to the document cache
//! - `clear`, `health`, `providers`: cache administration
//! - `repl`, `demo`: several queries against one process, useful with `--in-memory`

pub mod admin;
pub mod demo;
pub mod ingest;
pub mod query;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;

use crate::config::AppConfig;
use crate::infrastructure::logging::init_logging;
use crate::{create_orchestrator_with_config, BackendMode, CacheOrchestrator};

/// PMP LLM Cache - tiered response cache in front of LLM providers
#[derive(Parser)]
#[command(name = "pmp-llm-cache")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Use process-local stores, hashing embeddings and the offline `demo` provider
    #[arg(long, global = true)]
    pub in_memory: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Answer a query from the cache or an LLM
    Query(query::QueryArgs),

    /// Add files to the document cache
    Ingest(ingest::IngestArgs),

    /// Empty one cache layer, or all of them
    Clear(admin::ClearArgs),

    /// Report reachability of every layer
    Health,

    /// List registered LLM providers
    Providers,

    /// Read queries from stdin, one per line
    Repl(query::ReplArgs),

    /// Ingest sample documents and walk a query through every layer
    Demo,
}

impl Cli {
    pub fn backend_mode(&self) -> BackendMode {
        // The demo has no external dependencies
        if self.in_memory || matches!(self.command, Command::Demo) {
            BackendMode::InMemory
        } else {
            BackendMode::External
        }
    }
}

/// Loads configuration, initializes logging and runs the selected command
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let mut config = AppConfig::load().context("Invalid configuration")?;
    init_logging(&config.logging);

    if let Command::Ingest(ref args) = cli.command {
        if args.no_chunking {
            config.chunking = config.chunking.clone().disabled();
        }
    }

    let mode = cli.backend_mode();

    match cli.command {
        Command::Query(args) => query::run(&build(&config, mode).await?, args).await,
        Command::Ingest(args) => ingest::run(&build(&config, mode).await?, args).await,
        Command::Clear(args) => admin::clear(&build(&config, mode).await?, args).await,
        Command::Health => admin::health(&build(&config, mode).await?).await,
        Command::Providers => admin::providers(&build(&config, mode).await?),
        Command::Repl(args) => query::repl(&build(&config, mode).await?, args).await,
        Command::Demo => demo::run(&build(&config, mode).await?).await,
    }
}

async fn build(config: &AppConfig, mode: BackendMode) -> anyhow::Result<CacheOrchestrator> {
    create_orchestrator_with_config(config, mode).await
}

/// Writes a value to stdout as pretty JSON
pub(crate) fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_query_with_provider() {
        let cli = Cli::parse_from(["pmp-llm-cache", "query", "What is Rust?", "--provider", "gemini"]);

        assert_eq!(cli.backend_mode(), BackendMode::External);
        match cli.command {
            Command::Query(args) => {
                assert_eq!(args.text, "What is Rust?");
                assert_eq!(args.provider.as_deref(), Some("gemini"));
            }
            _ => panic!("expected query command"),
        }
    }

    #[test]
    fn test_global_in_memory_flag_after_subcommand() {
        let cli = Cli::parse_from(["pmp-llm-cache", "health", "--in-memory"]);
        assert_eq!(cli.backend_mode(), BackendMode::InMemory);
    }

    #[test]
    fn test_demo_always_in_memory() {
        let cli = Cli::parse_from(["pmp-llm-cache", "demo"]);
        assert_eq!(cli.backend_mode(), BackendMode::InMemory);
    }

    #[test]
    fn test_clear_layer_parsing() {
        let cli = Cli::parse_from(["pmp-llm-cache", "clear", "--layer", "semantic"]);
        match cli.command {
            Command::Clear(args) => {
                assert_eq!(args.layer, Some(crate::domain::tiering::CacheLayer::Semantic))
            }
            _ => panic!("expected clear command"),
        }

        assert!(Cli::try_parse_from(["pmp-llm-cache", "clear", "--layer", "7"]).is_err());
    }

    #[test]
    fn test_ingest_requires_files() {
        assert!(Cli::try_parse_from(["pmp-llm-cache", "ingest"]).is_err());
    }
}
