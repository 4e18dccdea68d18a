//! The RAG service: lifecycle-gated ingestion and question answering.

use crate::chunk::Chunker;
use crate::embeddings::{create_provider, EmbeddingProvider};
use crate::knowledge_base::KnowledgeBase;
use crate::lifecycle::IndexLifecycle;
use crate::loader::{self, base_filename, read_corpus_dir, Document, DocumentFormat, RawDocument};
use crate::rag::{RagResponse, RetrievalOrchestrator};
use crate::types::{KnowledgeStats, LifecycleStatus};
use futures::stream::{self, StreamExt};
use ragdesk_core::{AppConfig, AppError, AppResult};
use ragdesk_llm::{create_client, LlmClient};
use ragdesk_prompt::{load_prompt, RAG_ANSWER_PROMPT_ID};
use std::sync::Arc;
use std::time::Duration;

/// Files extracted in parallel while bootstrapping.
const LOAD_CONCURRENCY: usize = 4;

/// Owns the knowledge base lifecycle and everything needed to build and
/// query it.
pub struct RagService {
    config: AppConfig,
    lifecycle: IndexLifecycle<KnowledgeBase>,
    orchestrator: RetrievalOrchestrator,
    chunker: Chunker,
    embedder: Option<Arc<dyn EmbeddingProvider>>,
}

impl RagService {
    /// Create a service from validated configuration and a generation client.
    ///
    /// The embedding provider is created when the index is built, so a
    /// missing embedding model surfaces as a failed build.
    pub fn new(config: AppConfig, llm: Arc<dyn LlmClient>) -> AppResult<Self> {
        config.validate()?;

        let chunker = Chunker::from_settings(&config.knowledge)?;
        let prompt = load_prompt(config.knowledge.prompts_dir.as_deref(), RAG_ANSWER_PROMPT_ID)?;
        let orchestrator =
            RetrievalOrchestrator::new(llm, &config.generation, prompt, config.knowledge.top_k);

        Ok(Self {
            config,
            lifecycle: IndexLifecycle::new(),
            orchestrator,
            chunker,
            embedder: None,
        })
    }

    /// Create a service with the generation client named in `config`.
    pub fn from_config(config: AppConfig) -> AppResult<Self> {
        let llm = create_client(&config.generation)?;
        Self::new(config, llm)
    }

    /// Use `provider` instead of the configured embedding provider.
    pub fn with_embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedder = Some(provider);
        self
    }

    /// Override the generation deadline.
    pub fn with_generation_timeout(mut self, timeout: Duration) -> Self {
        self.orchestrator = self.orchestrator.with_timeout(timeout);
        self
    }

    /// Build the index from the configured documents directory.
    ///
    /// Only the first call builds; concurrent and later callers receive the
    /// same knowledge base or the same error.
    pub async fn bootstrap_dir(&self) -> AppResult<Arc<KnowledgeBase>> {
        let dir = self.config.knowledge.documents_dir.clone();

        self.lifecycle
            .initialize(|| async move {
                tracing::info!("Loading documents from {:?}", dir);
                let raw = read_corpus_dir(&dir).await?;
                self.build_index(raw).await
            })
            .await
    }

    /// Build the index from files already in memory.
    pub async fn bootstrap(&self, raw: Vec<RawDocument>) -> AppResult<Arc<KnowledgeBase>> {
        self.lifecycle.initialize(|| self.build_index(raw)).await
    }

    async fn build_index(&self, raw: Vec<RawDocument>) -> AppResult<KnowledgeBase> {
        let total = raw.len();

        let loaded: Vec<AppResult<Document>> = stream::iter(raw)
            .map(|file| async move { loader::load(file.bytes, &file.filename).await })
            .buffered(LOAD_CONCURRENCY)
            .collect()
            .await;

        let mut documents = Vec::with_capacity(loaded.len());
        for result in loaded {
            match result {
                Ok(document) => documents.push(document),
                Err(e) => tracing::warn!("Skipping document: {}", e),
            }
        }

        tracing::info!("Loaded {} of {} documents", documents.len(), total);

        if documents.is_empty() {
            return Err(AppError::EmptyCorpus);
        }

        let embedder = match &self.embedder {
            Some(provider) => Arc::clone(provider),
            None => create_provider(&self.config.embedding).await?,
        };

        KnowledgeBase::build(
            documents,
            embedder,
            self.chunker,
            Duration::from_secs(self.config.embedding.timeout_secs),
        )
        .await
    }

    /// Ingest one uploaded file and return the number of chunks added.
    ///
    /// Checks run in order: readiness, size, format, duplicate name. The
    /// index is unchanged unless every step succeeds.
    pub async fn upload(&self, bytes: Vec<u8>, filename: &str) -> AppResult<usize> {
        let kb = self.lifecycle.ready()?;
        let name = base_filename(filename);

        let limit = self.config.knowledge.max_upload_bytes;
        if bytes.len() > limit {
            return Err(AppError::InvalidArgument(format!(
                "{} is {} bytes, upload limit is {} bytes",
                name,
                bytes.len(),
                limit
            )));
        }

        if DocumentFormat::from_filename(name).is_none() {
            return Err(AppError::UnsupportedFormat(name.to_string()));
        }

        let reservation = kb.reserve(name)?;
        let document = loader::load(bytes, name).await?;
        kb.ingest(reservation, document).await
    }

    /// Answer a question from the indexed documents.
    pub async fn ask(&self, query: &str) -> AppResult<RagResponse> {
        let kb = self.lifecycle.ready()?;
        self.orchestrator.answer(&kb, query).await
    }

    pub fn status(&self) -> LifecycleStatus {
        self.lifecycle.status()
    }

    /// The knowledge base, if ready.
    pub fn knowledge_base(&self) -> AppResult<Arc<KnowledgeBase>> {
        self.lifecycle.ready()
    }

    /// Statistics for the index; counts are zero until it is ready.
    pub async fn stats(&self) -> KnowledgeStats {
        match self.lifecycle.ready() {
            Ok(kb) => kb.stats().await,
            Err(_) => KnowledgeStats {
                status: self.lifecycle.status(),
                sources: Vec::new(),
                chunk_count: 0,
                dimensions: 0,
                embedding_provider: self.config.embedding.provider.clone(),
                embedding_model: self.config.embedding.model.clone(),
            },
        }
    }
}
