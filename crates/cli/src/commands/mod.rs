//! Command handlers for the ragdesk CLI.

pub mod ask;
pub mod chat;
pub mod ingest;
pub mod stats;

// Re-export command types for convenience
pub use ask::AskCommand;
pub use chat::ChatCommand;
pub use ingest::IngestCommand;
pub use stats::StatsCommand;

use ragdesk_core::{config::AppConfig, AppError, AppResult};
use ragdesk_knowledge::{KnowledgeStats, RagResponse, RagService};
use std::sync::Arc;

/// Create the service for one CLI invocation.
pub fn build_service(config: &AppConfig) -> AppResult<Arc<RagService>> {
    let service = RagService::from_config(config.clone())?;
    Ok(Arc::new(service))
}

/// Print an answer with its sources.
pub fn print_response(response: &RagResponse) {
    println!("Answer:");
    println!("{}", response.answer.trim());
    println!();

    if response.sources.is_empty() {
        println!("Sources: (none)");
        return;
    }

    println!("Sources:");
    for (i, source) in response.sources.iter().enumerate() {
        println!("[{}] {}", i + 1, source.title);
        println!("    {}", source.excerpt.replace('\n', " "));
    }
}

/// Print index statistics.
pub fn print_stats(stats: &KnowledgeStats) {
    println!("Status:     {}", stats.status);
    println!(
        "Embeddings: {} ({}, {} dimensions)",
        stats.embedding_provider, stats.embedding_model, stats.dimensions
    );
    println!("Chunks:     {}", stats.chunk_count);
    println!("Sources:    {}", stats.sources.len());

    for source in &stats.sources {
        println!(
            "  - {} ({} chunks, {} bytes, indexed {})",
            source.filename,
            source.chunk_count,
            source.byte_count,
            source.indexed_at.format("%Y-%m-%d %H:%M:%S")
        );
    }
}

/// JSON shape for a failed operation.
pub fn error_json(err: &AppError) -> serde_json::Value {
    serde_json::json!({
        "error": err.kind(),
        "message": err.to_string(),
    })
}
