//! RAG (Retrieval-Augmented Generation) answering.
//!
//! Retrieves the closest chunks for a question and asks the generation model
//! to answer from them.

pub mod ask;
pub mod types;

pub use ask::RetrievalOrchestrator;
pub use types::{excerpt, RagResponse, RagSourceRef};
