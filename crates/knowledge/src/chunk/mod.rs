//! Recursive chunking with overlap.
//!
//! Text is cut at the coarsest separator that occurs in it (paragraphs,
//! then lines, sentences, words and finally grapheme clusters). Pieces are
//! then merged greedily up to the chunk size, carrying trailing pieces of
//! each emitted chunk into the next one as overlap.

mod merging;
mod splitter;

pub use splitter::SEPARATORS;

use crate::loader::Document;
use ragdesk_core::config::KnowledgeSettings;
use ragdesk_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// A bounded-length segment of one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Chunk text content
    pub text: String,

    /// Base filename of the originating document
    pub source: String,

    /// Chunk position in document (0-indexed)
    pub position: usize,
}

/// Splits documents into overlapping chunks.
///
/// Lengths are measured in chars. Construction fails when the overlap would
/// not leave room for new text in each chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl Chunker {
    /// Create a chunker.
    ///
    /// # Errors
    /// Returns `AppError::Config` if `chunk_size` is zero or
    /// `chunk_overlap >= chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> AppResult<Self> {
        if chunk_size == 0 {
            return Err(AppError::Config(
                "chunk size must be greater than zero".to_string(),
            ));
        }

        if chunk_overlap >= chunk_size {
            return Err(AppError::Config(format!(
                "chunk overlap ({}) must be smaller than chunk size ({})",
                chunk_overlap, chunk_size
            )));
        }

        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    /// Create a chunker from knowledge settings.
    pub fn from_settings(settings: &KnowledgeSettings) -> AppResult<Self> {
        Self::new(settings.chunk_size, settings.chunk_overlap)
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Split a document into ordered chunks tagged with its source.
    pub fn split(&self, document: &Document) -> Vec<Chunk> {
        let chunks: Vec<Chunk> = self
            .split_text(&document.text)
            .into_iter()
            .enumerate()
            .map(|(position, text)| Chunk {
                text,
                source: document.source.clone(),
                position,
            })
            .collect();

        tracing::debug!(
            "Split {} ({} chars) into {} chunks",
            document.source,
            document.text.chars().count(),
            chunks.len()
        );

        chunks
    }

    /// Split raw text into chunk strings.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        if text.chars().count() <= self.chunk_size {
            return vec![text.to_string()];
        }

        splitter::split_recursive(text, SEPARATORS, self.chunk_size, self.chunk_overlap)
            .into_iter()
            .filter(|chunk| !chunk.trim().is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(text: &str) -> Document {
        Document {
            text: text.to_string(),
            source: "notes.txt".to_string(),
        }
    }

    fn char_len(s: &str) -> usize {
        s.chars().count()
    }

    fn prefix(s: &str, n: usize) -> String {
        s.chars().take(n).collect()
    }

    fn suffix(s: &str, n: usize) -> String {
        let len = char_len(s);
        s.chars().skip(len.saturating_sub(n)).collect()
    }

    /// Longest suffix of `a` that is also a prefix of `b`.
    fn shared_boundary(a: &str, b: &str) -> usize {
        let max = char_len(a).min(char_len(b));
        (0..=max)
            .rev()
            .find(|&n| suffix(a, n) == prefix(b, n))
            .unwrap_or(0)
    }

    #[test]
    fn test_invalid_configuration() {
        assert!(matches!(Chunker::new(0, 0), Err(AppError::Config(_))));
        assert!(matches!(Chunker::new(100, 100), Err(AppError::Config(_))));
        assert!(matches!(Chunker::new(100, 150), Err(AppError::Config(_))));
        assert!(Chunker::new(100, 99).is_ok());
    }

    #[test]
    fn test_from_default_settings() {
        let chunker = Chunker::from_settings(&KnowledgeSettings::default()).unwrap();
        assert_eq!(chunker.chunk_size(), 1000);
        assert_eq!(chunker.chunk_overlap(), 200);
    }

    #[test]
    fn test_empty_document_yields_no_chunks() {
        let chunker = Chunker::new(1000, 200).unwrap();
        assert!(chunker.split(&document("")).is_empty());
        assert!(chunker.split(&document("   \n\n  ")).is_empty());
    }

    #[test]
    fn test_short_document_yields_single_chunk() {
        let chunker = Chunker::new(1000, 200).unwrap();
        let text = "Refunds are processed within 30 days.";

        let chunks = chunker.split(&document(text));
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, text);
        assert_eq!(chunks[0].source, "notes.txt");
        assert_eq!(chunks[0].position, 0);

        let exact = "x".repeat(1000);
        assert_eq!(chunker.split_text(&exact), vec![exact.clone()]);
    }

    #[test]
    fn test_word_scenario_three_chunks_with_exact_overlap() {
        let chunker = Chunker::new(1000, 200).unwrap();
        let text = "word ".repeat(500);
        assert_eq!(char_len(&text), 2500);

        let chunks = chunker.split_text(&text);
        assert_eq!(chunks.len(), 3);
        assert_eq!(char_len(&chunks[0]), 1000);
        assert_eq!(char_len(&chunks[1]), 1000);
        assert_eq!(char_len(&chunks[2]), 900);

        for pair in chunks.windows(2) {
            assert_eq!(suffix(&pair[0], 200), prefix(&pair[1], 200));
        }
    }

    #[test]
    fn test_deterministic() {
        let chunker = Chunker::new(120, 30).unwrap();
        let text = "First paragraph has a few sentences. It goes on. And on!\n\n\
                    Second paragraph is here. Does it split? Yes it does.\n\
                    A new line follows with more words to push past the limit."
            .repeat(4);

        assert_eq!(chunker.split_text(&text), chunker.split_text(&text));
    }

    #[test]
    fn test_length_and_overlap_invariants() {
        let chunker = Chunker::new(200, 50).unwrap();
        let text = (0..60)
            .map(|i| format!("Sentence number {} talks about topic {}. ", i, i % 7))
            .collect::<String>()
            + "\n\n"
            + &(0..40)
                .map(|i| format!("trailing{} ", i))
                .collect::<String>();

        let chunks = chunker.split_text(&text);
        assert!(chunks.len() > 2);

        for chunk in &chunks {
            assert!(char_len(chunk) <= 200, "chunk too long: {}", char_len(chunk));
        }

        for pair in chunks.windows(2) {
            assert!(shared_boundary(&pair[0], &pair[1]) <= 50);
        }
    }

    #[test]
    fn test_paragraphs_preferred_over_words() {
        let chunker = Chunker::new(60, 0).unwrap();
        let text = format!("{}\n\n{}", "alpha ".repeat(8), "beta ".repeat(8));

        let chunks = chunker.split_text(&text);
        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].starts_with("alpha"));
        assert!(chunks[0].ends_with("\n\n"));
        assert!(chunks[1].starts_with("beta"));
    }

    #[test]
    fn test_unbroken_text_falls_back_to_graphemes() {
        let chunker = Chunker::new(100, 20).unwrap();
        let text = "a".repeat(250);

        let chunks = chunker.split_text(&text);
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| char_len(c) <= 100));
        assert_eq!(suffix(&chunks[0], 20), prefix(&chunks[1], 20));
    }

    #[test]
    fn test_multibyte_text_is_split_on_char_boundaries() {
        let chunker = Chunker::new(50, 10).unwrap();
        let text = "Reembolsos são processados em até trinta dias úteis 🎮. ".repeat(10);

        let chunks = chunker.split_text(&text);
        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| char_len(c) <= 50));
    }

    #[test]
    fn test_positions_are_sequential() {
        let chunker = Chunker::new(100, 10).unwrap();
        let chunks = chunker.split(&document(&"lorem ipsum dolor ".repeat(40)));

        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.position, i);
            assert_eq!(chunk.source, "notes.txt");
        }
    }
}
