//! Retrieval orchestration.
//!
//! Embeds the question, retrieves the closest chunks, renders the answer
//! prompt and calls the generation model once.

use crate::knowledge_base::KnowledgeBase;
use crate::rag::types::{RagResponse, RagSourceRef};
use crate::vector_index::ScoredChunk;
use ragdesk_core::config::GenerationSettings;
use ragdesk_core::{AppError, AppResult};
use ragdesk_llm::{LlmClient, LlmRequest};
use ragdesk_prompt::{build_prompt, PromptDefinition};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// Template context for the answer prompt.
#[derive(Debug, Serialize)]
struct AnswerContext<'a> {
    question: &'a str,
    documents: Vec<ContextDocument<'a>>,
}

#[derive(Debug, Serialize)]
struct ContextDocument<'a> {
    index: usize,
    source: &'a str,
    text: &'a str,
}

/// Answers questions against a ready knowledge base.
pub struct RetrievalOrchestrator {
    llm: Arc<dyn LlmClient>,
    prompt: PromptDefinition,
    model: String,
    temperature: f32,
    max_tokens: u32,
    timeout: Duration,
    top_k: usize,
}

impl RetrievalOrchestrator {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        generation: &GenerationSettings,
        prompt: PromptDefinition,
        top_k: usize,
    ) -> Self {
        Self {
            llm,
            prompt,
            model: generation.model.clone(),
            temperature: generation.temperature,
            max_tokens: generation.max_tokens,
            timeout: Duration::from_secs(generation.timeout_secs),
            top_k,
        }
    }

    /// Override the generation deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Answer `query` from the `top_k` closest chunks.
    ///
    /// # Errors
    /// - `AppError::InvalidArgument` for a blank query
    /// - `AppError::Embedding` if the query cannot be embedded
    /// - `AppError::Generation` if the model fails or exceeds its deadline
    pub async fn answer(&self, kb: &KnowledgeBase, query: &str) -> AppResult<RagResponse> {
        if query.trim().is_empty() {
            return Err(AppError::InvalidArgument("query must not be empty".to_string()));
        }

        tracing::info!("Answering query: {}", query);

        let hits = kb.search(query, self.top_k).await?;
        let max_score = hits.first().map(|h| h.score).unwrap_or(0.0);

        tracing::debug!(
            "Retrieved {} chunks (max score: {:.3})",
            hits.len(),
            max_score
        );

        let request = self.build_request(query, &hits)?;
        let answer = self.generate(&request).await?;
        let sources = hits
            .iter()
            .map(|hit| RagSourceRef::new(&hit.chunk.source, &hit.chunk.text))
            .collect();

        Ok(RagResponse::new(answer, sources, max_score))
    }

    fn build_request(&self, query: &str, hits: &[ScoredChunk]) -> AppResult<LlmRequest> {
        let context = AnswerContext {
            question: query,
            documents: hits
                .iter()
                .enumerate()
                .map(|(i, hit)| ContextDocument {
                    index: i + 1,
                    source: &hit.chunk.source,
                    text: &hit.chunk.text,
                })
                .collect(),
        };

        let built = build_prompt(&self.prompt, &context)?;

        let mut request = LlmRequest::new(built.user, self.model.clone())
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens);
        if let Some(system) = built.system {
            request = request.with_system(system);
        }

        Ok(request)
    }

    async fn generate(&self, request: &LlmRequest) -> AppResult<String> {
        tracing::debug!(
            "Calling generation provider '{}' (model: {})",
            self.llm.provider_name(),
            request.model
        );

        let response = tokio::time::timeout(self.timeout, self.llm.complete(request))
            .await
            .map_err(|_| {
                AppError::Generation(format!(
                    "generation timed out after {}s",
                    self.timeout.as_secs_f64()
                ))
            })??;

        Ok(response.content)
    }
}
