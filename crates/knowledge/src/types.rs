//! Knowledge system type definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An ingested file as tracked by the index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceRecord {
    /// Base filename, unique within the index
    pub filename: String,

    /// Number of chunks contributed
    pub chunk_count: usize,

    /// Size of the extracted text in bytes
    pub byte_count: usize,

    /// When this source was indexed
    pub indexed_at: DateTime<Utc>,
}

/// Lifecycle state of the knowledge index, without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleStatus {
    Uninitialized,
    Initializing,
    Ready,
    Failed,
}

impl LifecycleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Initializing => "initializing",
            Self::Ready => "ready",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for LifecycleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Statistics for a ready knowledge base.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeStats {
    pub status: LifecycleStatus,
    pub sources: Vec<SourceRecord>,
    pub chunk_count: usize,
    pub dimensions: usize,
    pub embedding_provider: String,
    pub embedding_model: String,
}
