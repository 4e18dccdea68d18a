//! Ingest command handler.
//!
//! Builds the index, then uploads each given file into it.

use super::{build_service, error_json};
use clap::Args;
use ragdesk_core::{config::AppConfig, AppResult};
use std::path::PathBuf;

/// Add files to the index after building it from the documents directory
#[derive(Args, Debug)]
pub struct IngestCommand {
    /// Files to ingest (.txt, .md, .pdf)
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl IngestCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ingest command for {} files", self.files.len());

        let service = build_service(config)?;
        service.bootstrap_dir().await?;

        let mut results = Vec::with_capacity(self.files.len());
        let mut failed = 0usize;

        for path in &self.files {
            let filename = path.to_string_lossy().to_string();

            let outcome = match tokio::fs::read(path).await {
                Ok(bytes) => service.upload(bytes, &filename).await,
                Err(e) => Err(e.into()),
            };

            match outcome {
                Ok(chunks) => {
                    if self.json {
                        results.push(serde_json::json!({ "file": filename, "chunks": chunks }));
                    } else {
                        println!("{}: {} chunks", filename, chunks);
                    }
                }
                Err(e) => {
                    failed += 1;
                    tracing::warn!("Failed to ingest {}: {}", filename, e);
                    if self.json {
                        let mut value = error_json(&e);
                        value["file"] = serde_json::Value::String(filename);
                        results.push(value);
                    } else {
                        println!("{}: {} [{}]", filename, e, e.kind());
                    }
                }
            }
        }

        if self.json {
            println!("{}", serde_json::to_string_pretty(&results)?);
        }

        tracing::info!(
            "Ingested {} of {} files",
            self.files.len() - failed,
            self.files.len()
        );

        Ok(())
    }
}
