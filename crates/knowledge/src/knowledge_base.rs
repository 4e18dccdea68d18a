//! The ready-state knowledge base: vector index, ingested sources and the
//! embedding provider that produced every stored vector.

use crate::chunk::{Chunk, Chunker};
use crate::embeddings::{embed_with_timeout, EmbeddingProvider};
use crate::loader::Document;
use crate::memory_index::MemoryIndex;
use crate::types::{KnowledgeStats, LifecycleStatus, SourceRecord};
use crate::vector_index::{EmbeddedChunk, ScoredChunk, VectorIndex};
use chrono::Utc;
use ragdesk_core::{AppError, AppResult};
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::RwLock;

/// Index entries and per-source records, always changed together.
#[derive(Debug)]
struct IndexState {
    index: MemoryIndex,
    sources: BTreeMap<String, SourceRecord>,
}

/// Filenames that are indexed or currently being ingested.
#[derive(Debug, Default)]
struct FilenameRegistry {
    known: HashSet<String>,
    pending: HashSet<String>,
}

/// A searchable, append-only knowledge base.
#[derive(Debug)]
pub struct KnowledgeBase {
    state: RwLock<IndexState>,
    registry: Mutex<FilenameRegistry>,
    embedder: Arc<dyn EmbeddingProvider>,
    chunker: Chunker,
    embed_timeout: Duration,
}

/// Exclusive claim on a filename while its document is being ingested.
///
/// Dropping an uncommitted reservation releases the name.
#[derive(Debug)]
pub struct Reservation<'a> {
    registry: &'a Mutex<FilenameRegistry>,
    filename: String,
    committed: bool,
}

impl Reservation<'_> {
    pub fn filename(&self) -> &str {
        &self.filename
    }

    fn commit(mut self) {
        let mut registry = self.registry.lock().unwrap_or_else(PoisonError::into_inner);
        registry.pending.remove(&self.filename);
        registry.known.insert(self.filename.clone());
        self.committed = true;
    }
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        let mut registry = self.registry.lock().unwrap_or_else(PoisonError::into_inner);
        registry.pending.remove(&self.filename);
        tracing::debug!("Released reservation for {}", self.filename);
    }
}

impl KnowledgeBase {
    /// Chunk, embed and index an initial set of documents.
    ///
    /// # Errors
    /// - `AppError::EmptyCorpus` when the documents produce no chunks
    /// - `AppError::Embedding` when the provider fails or times out
    pub async fn build(
        documents: Vec<Document>,
        embedder: Arc<dyn EmbeddingProvider>,
        chunker: Chunker,
        embed_timeout: Duration,
    ) -> AppResult<Self> {
        let mut entries = Vec::new();
        let mut sources = BTreeMap::new();

        for document in &documents {
            if sources.contains_key(&document.source) {
                tracing::warn!("Skipping duplicate source {}", document.source);
                continue;
            }

            let chunks = chunker.split(document);
            if chunks.is_empty() {
                continue;
            }

            let embedded = embed_chunks(embedder.as_ref(), chunks, embed_timeout).await?;
            sources.insert(
                document.source.clone(),
                source_record(document, embedded.len()),
            );
            entries.extend(embedded);
        }

        let index = MemoryIndex::build(entries)?;

        if index.dimensions() != embedder.dimensions() {
            tracing::warn!(
                "Provider '{}' declares {} dimensions but produced {}",
                embedder.provider_name(),
                embedder.dimensions(),
                index.dimensions()
            );
        }

        tracing::info!(
            "Knowledge base built: {} sources, {} chunks (provider: {}, model: {})",
            sources.len(),
            index.len(),
            embedder.provider_name(),
            embedder.model_name()
        );

        let registry = FilenameRegistry {
            known: sources.keys().cloned().collect(),
            pending: HashSet::new(),
        };

        Ok(Self {
            state: RwLock::new(IndexState { index, sources }),
            registry: Mutex::new(registry),
            embedder,
            chunker,
            embed_timeout,
        })
    }

    /// Claim `filename` for ingestion.
    ///
    /// # Errors
    /// Returns `AppError::DuplicateFilename` if the name is already indexed
    /// or reserved by an ingestion in flight.
    pub fn reserve(&self, filename: &str) -> AppResult<Reservation<'_>> {
        let mut registry = self.registry.lock().unwrap_or_else(PoisonError::into_inner);

        if registry.known.contains(filename) || registry.pending.contains(filename) {
            return Err(AppError::DuplicateFilename(filename.to_string()));
        }

        registry.pending.insert(filename.to_string());

        Ok(Reservation {
            registry: &self.registry,
            filename: filename.to_string(),
            committed: false,
        })
    }

    /// Chunk, embed and append a document under an existing reservation.
    ///
    /// Returns the number of chunks added. On any error the index is left
    /// unchanged and the reservation is released.
    pub async fn ingest(&self, reservation: Reservation<'_>, document: Document) -> AppResult<usize> {
        if reservation.filename() != document.source {
            return Err(AppError::InvalidArgument(format!(
                "reservation for '{}' used for '{}'",
                reservation.filename(),
                document.source
            )));
        }

        let chunks = self.chunker.split(&document);
        if chunks.is_empty() {
            return Err(AppError::extraction(&document.source, "no text"));
        }

        let embedded = embed_chunks(self.embedder.as_ref(), chunks, self.embed_timeout).await?;
        let count = embedded.len();

        let mut state = self.state.write().await;
        state.index.append(embedded)?;
        state
            .sources
            .insert(document.source.clone(), source_record(&document, count));
        reservation.commit();
        drop(state);

        tracing::info!("Indexed {} ({} chunks)", document.source, count);

        Ok(count)
    }

    /// Reserve and ingest in one step.
    pub async fn add_document(&self, document: Document) -> AppResult<usize> {
        let reservation = self.reserve(&document.source)?;
        self.ingest(reservation, document).await
    }

    /// Embed `query` with the indexing provider and return the `top_k` closest chunks.
    pub async fn search(&self, query: &str, top_k: usize) -> AppResult<Vec<ScoredChunk>> {
        let mut vectors =
            embed_with_timeout(self.embedder.as_ref(), &[query.to_string()], self.embed_timeout)
                .await?;
        let query_vector = vectors
            .pop()
            .ok_or_else(|| AppError::Embedding("No embedding returned for query".to_string()))?;

        let state = self.state.read().await;
        state.index.search(&query_vector, top_k)
    }

    /// Whether a filename is indexed.
    pub fn contains(&self, filename: &str) -> bool {
        self.registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .known
            .contains(filename)
    }

    /// Number of indexed chunks.
    pub async fn len(&self) -> usize {
        self.state.read().await.index.len()
    }

    /// Indexed filenames in sorted order.
    pub async fn filenames(&self) -> Vec<String> {
        self.state.read().await.sources.keys().cloned().collect()
    }

    pub async fn stats(&self) -> KnowledgeStats {
        let state = self.state.read().await;

        KnowledgeStats {
            status: LifecycleStatus::Ready,
            sources: state.sources.values().cloned().collect(),
            chunk_count: state.index.len(),
            dimensions: state.index.dimensions(),
            embedding_provider: self.embedder.provider_name().to_string(),
            embedding_model: self.embedder.model_name().to_string(),
        }
    }
}

async fn embed_chunks(
    embedder: &dyn EmbeddingProvider,
    chunks: Vec<Chunk>,
    timeout: Duration,
) -> AppResult<Vec<EmbeddedChunk>> {
    let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
    let vectors = embed_with_timeout(embedder, &texts, timeout).await?;

    Ok(chunks
        .into_iter()
        .zip(vectors)
        .map(|(chunk, vector)| EmbeddedChunk::new(chunk, vector))
        .collect())
}

fn source_record(document: &Document, chunk_count: usize) -> SourceRecord {
    SourceRecord {
        filename: document.source.clone(),
        chunk_count,
        byte_count: document.text.len(),
        indexed_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::providers::TrigramProvider;

    /// Trigram vectors, delayed per text.
    #[derive(Debug)]
    struct PacedProvider {
        inner: TrigramProvider,
        per_text: Duration,
    }

    #[async_trait::async_trait]
    impl EmbeddingProvider for PacedProvider {
        fn provider_name(&self) -> &str {
            "paced"
        }

        fn model_name(&self) -> &str {
            self.inner.model_name()
        }

        fn dimensions(&self) -> usize {
            self.inner.dimensions()
        }

        async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
            tokio::time::sleep(self.per_text * texts.len() as u32).await;
            self.inner.embed_batch(texts).await
        }
    }

    fn doc(source: &str, text: &str) -> Document {
        Document {
            text: text.to_string(),
            source: source.to_string(),
        }
    }

    async fn knowledge_base(documents: Vec<Document>) -> AppResult<KnowledgeBase> {
        KnowledgeBase::build(
            documents,
            Arc::new(TrigramProvider::new(384)),
            Chunker::new(1000, 200).unwrap(),
            Duration::from_secs(5),
        )
        .await
    }

    #[tokio::test]
    async fn test_build_tracks_sources() {
        let kb = knowledge_base(vec![
            doc("policy.txt", "Refunds are processed within 30 days."),
            doc("shipping.md", "Shipping takes five business days."),
        ])
        .await
        .unwrap();

        assert_eq!(kb.len().await, 2);
        assert_eq!(kb.filenames().await, vec!["policy.txt", "shipping.md"]);
        assert!(kb.contains("policy.txt"));
        assert!(!kb.contains("other.txt"));

        let stats = kb.stats().await;
        assert_eq!(stats.chunk_count, 2);
        assert_eq!(stats.dimensions, 384);
        assert_eq!(stats.embedding_provider, "trigram");
        assert_eq!(stats.sources[0].chunk_count, 1);
    }

    #[tokio::test]
    async fn test_long_document_is_not_limited_by_total_embedding_time() {
        // 60 paragraphs of 40 chars, one chunk each at size 50
        let text: Vec<String> = (0..60)
            .map(|i| format!("{:<38}.", format!("Paragraph {}", i)))
            .collect();
        let document = doc("manual.txt", &text.join("\n\n"));

        let kb = KnowledgeBase::build(
            vec![document],
            Arc::new(PacedProvider {
                inner: TrigramProvider::new(64),
                per_text: Duration::from_millis(10),
            }),
            Chunker::new(50, 0).unwrap(),
            Duration::from_millis(300),
        )
        .await
        .unwrap();

        assert_eq!(kb.len().await, 60);
    }

    #[tokio::test]
    async fn test_build_without_chunks_is_empty_corpus() {
        let err = knowledge_base(vec![doc("blank.txt", "   ")]).await.unwrap_err();
        assert!(matches!(err, AppError::EmptyCorpus));

        let err = knowledge_base(Vec::new()).await.unwrap_err();
        assert!(matches!(err, AppError::EmptyCorpus));
    }

    #[tokio::test]
    async fn test_add_document_and_duplicate() {
        let kb = knowledge_base(vec![doc("policy.txt", "Refunds within 30 days.")])
            .await
            .unwrap();

        let added = kb
            .add_document(doc("faq.md", &"Frequently asked question. ".repeat(60)))
            .await
            .unwrap();
        assert!(added > 1);
        let size = kb.len().await;
        assert_eq!(size, 1 + added);

        let err = kb
            .add_document(doc("policy.txt", "Another policy."))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DuplicateFilename(ref name) if name == "policy.txt"));
        assert_eq!(kb.len().await, size);
    }

    #[tokio::test]
    async fn test_pending_reservation_blocks_duplicates() {
        let kb = knowledge_base(vec![doc("policy.txt", "Refunds within 30 days.")])
            .await
            .unwrap();

        let reservation = kb.reserve("notes.txt").unwrap();
        assert!(matches!(
            kb.reserve("notes.txt"),
            Err(AppError::DuplicateFilename(_))
        ));
        assert!(!kb.contains("notes.txt"));

        drop(reservation);
        assert!(kb.reserve("notes.txt").is_ok());
    }

    #[tokio::test]
    async fn test_failed_ingest_releases_name() {
        let kb = knowledge_base(vec![doc("policy.txt", "Refunds within 30 days.")])
            .await
            .unwrap();

        let reservation = kb.reserve("blank.txt").unwrap();
        let err = kb.ingest(reservation, doc("blank.txt", " \n ")).await.unwrap_err();
        assert_eq!(err.kind(), "extraction_error");

        assert!(!kb.contains("blank.txt"));
        assert!(kb.reserve("blank.txt").is_ok());
        assert_eq!(kb.len().await, 1);
    }

    #[tokio::test]
    async fn test_known_filenames_match_index_sources() {
        let kb = knowledge_base(vec![doc("a.txt", "alpha text here")]).await.unwrap();
        kb.add_document(doc("b.txt", "beta text here")).await.unwrap();

        let stats = kb.stats().await;
        let names: Vec<_> = stats.sources.iter().map(|s| s.filename.clone()).collect();
        assert_eq!(names, kb.filenames().await);
        assert!(names.iter().all(|n| kb.contains(n)));
    }

    #[tokio::test]
    async fn test_search_ranks_refund_chunk_first() {
        let kb = knowledge_base(vec![
            doc("shipping.md", "Shipping takes five business days."),
            doc("policy.txt", "Refunds are processed within 30 days."),
            doc("hours.txt", "Our office is open Monday to Friday."),
        ])
        .await
        .unwrap();

        let hits = kb.search("What is the refund policy?", 3).await.unwrap();
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].chunk.source, "policy.txt");
    }
}
