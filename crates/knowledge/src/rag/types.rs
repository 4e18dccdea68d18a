//! RAG response types.

use serde::{Deserialize, Serialize};

/// Characters of chunk text kept in a source excerpt.
pub const EXCERPT_CHARS: usize = 200;

/// A retrieved chunk as shown to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RagSourceRef {
    /// Filename the chunk came from
    pub title: String,

    /// Leading text of the chunk, always followed by "..."
    pub excerpt: String,

    /// Currently the filename as well
    pub url: String,
}

impl RagSourceRef {
    pub fn new(filename: &str, chunk_text: &str) -> Self {
        Self {
            title: filename.to_string(),
            excerpt: excerpt(chunk_text),
            url: filename.to_string(),
        }
    }
}

/// Answer from the generation model plus the chunks it was given.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagResponse {
    /// Model output, unmodified
    pub answer: String,

    /// One entry per retrieved chunk, in retrieval order
    pub sources: Vec<RagSourceRef>,

    /// Internal: highest similarity score from retrieval, used for logging
    #[serde(skip)]
    pub max_score: f32,
}

impl RagResponse {
    pub fn new(answer: String, sources: Vec<RagSourceRef>, max_score: f32) -> Self {
        Self {
            answer,
            sources,
            max_score,
        }
    }
}

/// First [`EXCERPT_CHARS`] characters of `text` followed by "...".
pub fn excerpt(text: &str) -> String {
    let mut out: String = text.chars().take(EXCERPT_CHARS).collect();
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_excerpt_truncates_long_text() {
        let text = "x".repeat(500);
        let result = excerpt(&text);
        assert_eq!(result.chars().count(), EXCERPT_CHARS + 3);
        assert!(result.ends_with("..."));
    }

    #[test]
    fn test_excerpt_always_appends_ellipsis() {
        assert_eq!(excerpt("Short text"), "Short text...");
    }

    #[test]
    fn test_excerpt_counts_characters_not_bytes() {
        let text = "é".repeat(250);
        let result = excerpt(&text);
        assert_eq!(result, format!("{}...", "é".repeat(200)));
    }

    #[test]
    fn test_source_ref_uses_filename_for_title_and_url() {
        let source = RagSourceRef::new("policy.txt", "Refunds are processed within 30 days.");
        assert_eq!(source.title, "policy.txt");
        assert_eq!(source.url, "policy.txt");
        assert_eq!(source.excerpt, "Refunds are processed within 30 days....");
    }

    #[test]
    fn test_response_serialization_hides_score() {
        let response = RagResponse::new(
            "Thirty days.".to_string(),
            vec![RagSourceRef::new("policy.txt", "Refunds")],
            0.82,
        );

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["answer"], "Thirty days.");
        assert_eq!(json["sources"][0]["title"], "policy.txt");
        assert!(json.get("max_score").is_none());
    }
}
