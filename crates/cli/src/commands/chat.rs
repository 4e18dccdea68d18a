//! Interactive chat command handler.
//!
//! The index builds in the background while the prompt is already open, so
//! early questions report that the index is not ready yet.

use super::{build_service, print_response, print_stats};
use clap::Args;
use ragdesk_core::{config::AppConfig, AppError, AppResult};
use ragdesk_knowledge::RagService;
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

/// Interactive question answering over the documents directory
#[derive(Args, Debug)]
pub struct ChatCommand {}

/// One line of chat input.
#[derive(Debug, PartialEq, Eq)]
enum ChatInput<'a> {
    Quit,
    Stats,
    Upload(&'a str),
    Question(&'a str),
    Empty,
}

impl<'a> ChatInput<'a> {
    fn parse(line: &'a str) -> Self {
        let line = line.trim();

        match line {
            "" => Self::Empty,
            "/quit" | "/exit" => Self::Quit,
            "/stats" => Self::Stats,
            _ => match line.strip_prefix("/upload") {
                Some(rest) => Self::Upload(rest.trim()),
                None => Self::Question(line),
            },
        }
    }
}

impl ChatCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing chat command");

        let service = build_service(config)?;

        let builder = {
            let service = Arc::clone(&service);
            tokio::spawn(async move {
                if let Err(e) = service.bootstrap_dir().await {
                    tracing::error!("Index build failed: {}", e);
                }
            })
        };

        println!("Type a question, /upload <path>, /stats or /quit.");

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut stdout = tokio::io::stdout();

        loop {
            stdout.write_all(b"> ").await?;
            stdout.flush().await?;

            let Some(line) = lines.next_line().await? else {
                break;
            };

            match ChatInput::parse(&line) {
                ChatInput::Empty => continue,
                ChatInput::Quit => break,
                ChatInput::Stats => print_stats(&service.stats().await),
                ChatInput::Upload(path) => report(upload_file(&service, path).await),
                ChatInput::Question(question) => match service.ask(question).await {
                    Ok(response) => print_response(&response),
                    Err(e) => report::<String>(Err(e)),
                },
            }
        }

        builder.abort();
        Ok(())
    }
}

async fn upload_file(service: &RagService, path: &str) -> AppResult<String> {
    if path.is_empty() {
        return Err(AppError::InvalidArgument("usage: /upload <path>".to_string()));
    }

    let bytes = tokio::fs::read(Path::new(path)).await?;
    let chunks = service.upload(bytes, path).await?;
    Ok(format!("Indexed {} ({} chunks)", path, chunks))
}

fn report<T: std::fmt::Display>(result: AppResult<T>) {
    match result {
        Ok(message) => println!("{}", message),
        Err(AppError::NotReady) => println!("The index is still being built, try again shortly."),
        Err(e) => println!("Error [{}]: {}", e.kind(), e),
    }
}
