//! Query and repl commands

use clap::Args;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;

use super::print_json;
use crate::domain::tiering::Query;
use crate::CacheOrchestrator;

#[derive(Args, Clone)]
pub struct QueryArgs {
    /// Query text
    pub text: String,

    /// Provider to call on a full miss (defaults to the registry default)
    #[arg(long)]
    pub provider: Option<String>,
}

#[derive(Args, Clone)]
pub struct ReplArgs {
    /// Provider to call on a full miss (defaults to the registry default)
    #[arg(long)]
    pub provider: Option<String>,
}

pub async fn run(orchestrator: &CacheOrchestrator, args: QueryArgs) -> anyhow::Result<()> {
    let result = orchestrator
        .query(build_query(args.text, args.provider.as_deref()))
        .await
        .map_err(|e| anyhow::anyhow!("Error processing query: {}", e.public_message()))?;

    print_json(&result)
}

/// One query per stdin line; failures are reported and the loop continues
pub async fn repl(orchestrator: &CacheOrchestrator, args: ReplArgs) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let text = line.trim();
        if text.is_empty() {
            continue;
        }

        match orchestrator.query(build_query(text, args.provider.as_deref())).await {
            Ok(result) => print_json(&result)?,
            Err(e) => {
                warn!(stage = %e.stage(), "Query failed: {}", e);
                print_json(&serde_json::json!({
                    "query": text,
                    "error": e.public_message(),
                }))?;
            }
        }
    }

    Ok(())
}

fn build_query(text: impl Into<String>, provider: Option<&str>) -> Query {
    let query = Query::new(text);
    match provider {
        Some(name) => query.with_provider(name),
        None => query,
    }
}
