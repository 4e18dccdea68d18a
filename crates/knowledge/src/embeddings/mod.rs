//! Embedding engine for the knowledge base.
//!
//! Provides provider-agnostic embedding generation. One provider instance
//! embeds both the indexed chunks and every query against them.

pub mod provider;
pub mod providers;

pub use provider::{create_provider, EmbeddingProvider};

use ragdesk_core::{AppError, AppResult};
use std::time::Duration;

/// Embed `texts` with `provider`, one text per call, giving up on any call
/// that takes longer than `timeout`.
///
/// # Errors
/// Returns `AppError::Embedding` on timeout or if the provider returns a
/// different number of vectors than texts.
pub async fn embed_with_timeout(
    provider: &dyn EmbeddingProvider,
    texts: &[String],
    timeout: Duration,
) -> AppResult<Vec<Vec<f32>>> {
    if texts.is_empty() {
        return Ok(Vec::new());
    }

    tracing::debug!(
        "Embedding {} texts using provider '{}' (model: {})",
        texts.len(),
        provider.provider_name(),
        provider.model_name()
    );

    let mut embeddings = Vec::with_capacity(texts.len());

    for (i, text) in texts.iter().enumerate() {
        let call = provider.embed_batch(std::slice::from_ref(text));
        let mut vectors = tokio::time::timeout(timeout, call)
            .await
            .map_err(|_| {
                AppError::Embedding(format!(
                    "embedding text {} of {} timed out after {}s",
                    i + 1,
                    texts.len(),
                    timeout.as_secs_f64()
                ))
            })??;

        if vectors.len() != 1 {
            return Err(AppError::Embedding(format!(
                "provider returned {} embeddings for 1 text",
                vectors.len()
            )));
        }
        embeddings.extend(vectors.pop());
    }

    Ok(embeddings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::providers::TrigramProvider;

    #[derive(Debug)]
    struct SlowProvider;

    #[async_trait::async_trait]
    impl EmbeddingProvider for SlowProvider {
        fn provider_name(&self) -> &str {
            "slow"
        }

        fn model_name(&self) -> &str {
            "slow-v1"
        }

        fn dimensions(&self) -> usize {
            4
        }

        async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(vec![vec![0.0; 4]; texts.len()])
        }
    }

    #[derive(Debug)]
    struct ShortProvider;

    #[async_trait::async_trait]
    impl EmbeddingProvider for ShortProvider {
        fn provider_name(&self) -> &str {
            "short"
        }

        fn model_name(&self) -> &str {
            "short-v1"
        }

        fn dimensions(&self) -> usize {
            4
        }

        async fn embed_batch(&self, _texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
            Ok(Vec::new())
        }
    }

    /// Sleeps a fixed time for every text it is given.
    #[derive(Debug)]
    struct PerTextDelayProvider {
        delay: Duration,
    }

    #[async_trait::async_trait]
    impl EmbeddingProvider for PerTextDelayProvider {
        fn provider_name(&self) -> &str {
            "per-text"
        }

        fn model_name(&self) -> &str {
            "per-text-v1"
        }

        fn dimensions(&self) -> usize {
            4
        }

        async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
            tokio::time::sleep(self.delay * texts.len() as u32).await;
            Ok(vec![vec![1.0, 0.0, 0.0, 0.0]; texts.len()])
        }
    }

    #[tokio::test]
    async fn test_timeout_applies_to_each_call() {
        let provider = PerTextDelayProvider {
            delay: Duration::from_millis(10),
        };
        let texts: Vec<String> = (0..60).map(|i| format!("chunk {}", i)).collect();

        // 60 texts take ~600ms in total, each call ~10ms
        let embeddings = embed_with_timeout(&provider, &texts, Duration::from_millis(300))
            .await
            .unwrap();
        assert_eq!(embeddings.len(), 60);
    }

    #[tokio::test]
    async fn test_large_text_respects_timeout() {
        let provider = TrigramProvider::new(384);
        let texts = vec!["refund policy shipping window ".repeat(200_000)];

        let err = embed_with_timeout(&provider, &texts, Duration::from_millis(1))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("timed out"));
    }

    #[tokio::test]
    async fn test_embed_with_timeout_preserves_order() {
        let provider = TrigramProvider::new(64);
        let texts = vec!["refund policy".to_string(), "shipping times".to_string()];

        let embeddings = embed_with_timeout(&provider, &texts, Duration::from_secs(5))
            .await
            .unwrap();

        assert_eq!(embeddings.len(), 2);
        assert_eq!(embeddings[0], provider.embed("refund policy").await.unwrap());
        assert_eq!(embeddings[1], provider.embed("shipping times").await.unwrap());
    }

    #[tokio::test]
    async fn test_embed_timeout_is_embedding_error() {
        let texts = vec!["anything".to_string()];
        let err = embed_with_timeout(&SlowProvider, &texts, Duration::from_millis(50))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "embedding_error");
        assert!(err.to_string().contains("timed out"));
    }

    #[tokio::test]
    async fn test_count_mismatch_is_embedding_error() {
        let texts = vec!["one".to_string()];
        let err = embed_with_timeout(&ShortProvider, &texts, Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Embedding(_)));
    }

    #[tokio::test]
    async fn test_empty_input_skips_provider() {
        let embeddings = embed_with_timeout(&SlowProvider, &[], Duration::from_millis(1))
            .await
            .unwrap();
        assert!(embeddings.is_empty());
    }
}
