//! Stats command handler.

use super::{build_service, print_stats};
use clap::Args;
use ragdesk_core::{config::AppConfig, AppResult};

/// Build the index and show its statistics
#[derive(Args, Debug)]
pub struct StatsCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl StatsCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing stats command");

        let service = build_service(config)?;

        // A failed build is still reported through the status field
        if let Err(e) = service.bootstrap_dir().await {
            tracing::warn!("Index build failed: {}", e);
        }

        let stats = service.stats().await;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&stats)?);
        } else {
            print_stats(&stats);
        }

        Ok(())
    }
}
