//! Document knowledge base and retrieval-augmented answering.
//!
//! Documents are loaded, split into overlapping chunks, embedded and kept in
//! an in-memory vector index. Questions are answered by retrieving the
//! closest chunks and passing them to a generation model.
//!
//! [`RagService`] ties the pieces together behind a one-shot build
//! lifecycle: reads fail fast with `NotReady` until the index exists.

pub mod chunk;
pub mod embeddings;
pub mod knowledge_base;
pub mod lifecycle;
pub mod loader;
pub mod memory_index;
pub mod rag;
pub mod service;
pub mod types;
pub mod vector_index;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use chunk::{Chunk, Chunker};
pub use embeddings::{create_provider, EmbeddingProvider};
pub use knowledge_base::KnowledgeBase;
pub use lifecycle::{IndexLifecycle, LifecycleState};
pub use loader::{Document, DocumentFormat, RawDocument};
pub use memory_index::MemoryIndex;
pub use rag::{RagResponse, RagSourceRef, RetrievalOrchestrator};
pub use service::RagService;
pub use types::{KnowledgeStats, LifecycleStatus, SourceRecord};
pub use vector_index::{EmbeddedChunk, ScoredChunk, VectorIndex};
