//! Trigram embedding provider using hashed words and character trigrams.

use crate::embeddings::provider::EmbeddingProvider;
use ragdesk_core::{AppError, AppResult};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use unicode_segmentation::UnicodeSegmentation;

const MODEL_NAME: &str = "trigram-v1";

/// Words ignored when building lexical features.
const STOP_WORDS: &[&str] = &[
    "the", "is", "at", "which", "on", "a", "an", "as", "are", "was", "were", "for", "to", "of",
    "in", "and", "or", "but", "with", "by", "from", "this", "that", "be", "have", "has", "had",
    "it", "its", "their", "they", "them", "what", "how", "does", "do", "our", "your",
];

/// Trigram-based embedding provider for local, offline operation.
///
/// Each Unicode word (lowercased, stop words removed) adds weight to one
/// hashed dimension for the whole word and one per padded character
/// trigram, so "refund" and "refunds" land close together. The vector is
/// L2-normalized. Text without any features maps to the zero vector.
#[derive(Debug, Clone)]
pub struct TrigramProvider {
    dimensions: usize,
    stop_words: Arc<HashSet<&'static str>>,
}

impl TrigramProvider {
    /// Create a new trigram provider with specified dimensions.
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
            stop_words: Arc::new(STOP_WORDS.iter().copied().collect()),
        }
    }

    fn bucket(&self, feature: &str, seed: u64) -> usize {
        (fnv1a(feature.as_bytes(), seed) % self.dimensions as u64) as usize
    }

    fn generate_embedding(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0f32; self.dimensions];

        // BTreeMap keeps accumulation order stable across runs
        let mut word_freq: BTreeMap<String, u32> = BTreeMap::new();
        for word in text.unicode_words() {
            let word = word.to_lowercase();
            if word.chars().count() < 2 || self.stop_words.contains(word.as_str()) {
                continue;
            }
            *word_freq.entry(word).or_insert(0) += 1;
        }

        for (word, freq) in &word_freq {
            let weight = (*freq as f32).sqrt();

            embedding[self.bucket(word, WORD_SEED)] += weight;

            let padded: Vec<char> = std::iter::once('^')
                .chain(word.chars())
                .chain(std::iter::once('$'))
                .collect();
            for window in padded.windows(3) {
                let trigram: String = window.iter().collect();
                embedding[self.bucket(&trigram, TRIGRAM_SEED)] += weight * 0.5;
            }
        }

        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut embedding {
                *v /= norm;
            }
        }

        embedding
    }
}

const WORD_SEED: u64 = 0xcbf2_9ce4_8422_2325;
const TRIGRAM_SEED: u64 = 0x8422_2325_cbf2_9ce4;

/// 64-bit FNV-1a, stable across platforms and releases.
fn fnv1a(bytes: &[u8], seed: u64) -> u64 {
    bytes.iter().fold(seed, |hash, &b| {
        (hash ^ b as u64).wrapping_mul(0x0000_0100_0000_01b3)
    })
}

#[async_trait::async_trait]
impl EmbeddingProvider for TrigramProvider {
    fn provider_name(&self) -> &str {
        "trigram"
    }

    fn model_name(&self) -> &str {
        MODEL_NAME
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        let provider = self.clone();
        let texts = texts.to_vec();

        // Hashing is CPU-bound and scales with upload size
        tokio::task::spawn_blocking(move || {
            texts
                .iter()
                .map(|text| provider.generate_embedding(text))
                .collect()
        })
        .await
        .map_err(|e| AppError::Embedding(format!("trigram embedding aborted: {}", e)))
    }
}
