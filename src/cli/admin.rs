//! Cache administration commands

use clap::Args;
use serde::Serialize;

use super::print_json;
use crate::domain::tiering::{CacheLayer, HealthStatus};
use crate::CacheOrchestrator;

#[derive(Args, Clone)]
pub struct ClearArgs {
    /// Layer to clear: 0/exact, 1/semantic or 2/document (all when omitted)
    #[arg(long)]
    pub layer: Option<CacheLayer>,
}

#[derive(Debug, Serialize)]
struct ProviderEntry {
    name: String,
    display_name: String,
    kind: String,
    default: bool,
}

/// Prints the per-layer report; exits non-zero when any layer failed
pub async fn clear(orchestrator: &CacheOrchestrator, args: ClearArgs) -> anyhow::Result<()> {
    let report = orchestrator.clear(args.layer).await;
    print_json(&report)?;

    if !report.is_complete() {
        anyhow::bail!("Error clearing cache layers {:?}", report.failed());
    }
    Ok(())
}

/// Prints the report; exits non-zero when no provider is registered
pub async fn health(orchestrator: &CacheOrchestrator) -> anyhow::Result<()> {
    let report = orchestrator.health().await;
    print_json(&report)?;

    if report.status == HealthStatus::Unhealthy {
        anyhow::bail!("Cache is unhealthy");
    }
    Ok(())
}

pub fn providers(orchestrator: &CacheOrchestrator) -> anyhow::Result<()> {
    let registry = orchestrator.providers();
    let default = registry.default_provider();

    let entries: Vec<ProviderEntry> = registry
        .describe()
        .into_iter()
        .map(|descriptor| ProviderEntry {
            default: default.as_deref() == Some(descriptor.name.as_str()),
            display_name: descriptor.display_name(),
            kind: descriptor.kind.to_string(),
            name: descriptor.name,
        })
        .collect();

    print_json(&entries)
}
