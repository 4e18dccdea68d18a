//! Ask command handler.
//!
//! Builds the index from the documents directory and answers one question.

use super::{build_service, print_response};
use clap::Args;
use ragdesk_core::{config::AppConfig, AppError, AppResult};

/// Answer a question from the indexed documents
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    #[arg(required = true)]
    pub question: Vec<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");

        let question = self.question.join(" ");
        if question.trim().is_empty() {
            return Err(AppError::InvalidArgument("No question provided".to_string()));
        }

        let service = build_service(config)?;
        service.bootstrap_dir().await?;

        let response = service.ask(&question).await?;

        tracing::debug!(
            "Answered with {} sources (max score: {:.3})",
            response.sources.len(),
            response.max_score
        );

        if self.json {
            println!("{}", serde_json::to_string_pretty(&response)?);
        } else {
            print_response(&response);
        }

        Ok(())
    }
}
