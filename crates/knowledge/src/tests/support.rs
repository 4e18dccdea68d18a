//! Test doubles shared by unit and service tests.

use crate::embeddings::providers::TrigramProvider;
use crate::embeddings::EmbeddingProvider;
use ragdesk_core::{AppError, AppResult};
use ragdesk_llm::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::{watch, Notify};

/// Generation client that records requests and returns a canned outcome.
pub(crate) struct FakeLlm {
    outcome: Result<String, String>,
    delay: Option<Duration>,
    requests: Mutex<Vec<LlmRequest>>,
}

impl FakeLlm {
    pub(crate) fn answering(answer: &str) -> Self {
        Self {
            outcome: Ok(answer.to_string()),
            delay: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn failing(message: &str) -> Self {
        Self {
            outcome: Err(message.to_string()),
            delay: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) fn requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl LlmClient for FakeLlm {
    fn provider_name(&self) -> &str {
        "fake"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        self.requests.lock().unwrap().push(request.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match &self.outcome {
            Ok(answer) => Ok(LlmResponse {
                content: answer.clone(),
                model: request.model.clone(),
                usage: LlmUsage::new(10, 5),
                done: true,
            }),
            Err(message) => Err(AppError::Generation(message.clone())),
        }
    }
}

/// Trigram embedder that blocks every call until released.
#[derive(Debug)]
pub(crate) struct GatedProvider {
    inner: TrigramProvider,
    open: watch::Sender<bool>,
    entered: Notify,
}

impl GatedProvider {
    pub(crate) fn new() -> Self {
        let (open, _) = watch::channel(false);
        Self {
            inner: TrigramProvider::new(384),
            open,
            entered: Notify::new(),
        }
    }

    /// Resolves once some call has reached the gate.
    pub(crate) async fn entered(&self) {
        self.entered.notified().await;
    }

    pub(crate) fn release(&self) {
        self.open.send_replace(true);
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for GatedProvider {
    fn provider_name(&self) -> &str {
        "gated"
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        self.entered.notify_one();

        let mut rx = self.open.subscribe();
        rx.wait_for(|open| *open)
            .await
            .map_err(|_| AppError::Embedding("gate closed".to_string()))?;

        self.inner.embed_batch(texts).await
    }
}

/// Embedder that always fails.
#[derive(Debug)]
pub(crate) struct BrokenProvider;

#[async_trait::async_trait]
impl EmbeddingProvider for BrokenProvider {
    fn provider_name(&self) -> &str {
        "broken"
    }

    fn model_name(&self) -> &str {
        "missing-model"
    }

    fn dimensions(&self) -> usize {
        384
    }

    async fn embed_batch(&self, _texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        Err(AppError::Embedding("model 'missing-model' not found".to_string()))
    }
}
