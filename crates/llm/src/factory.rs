//! LLM provider factory.
//!
//! Builds a generation client from configuration values.

use crate::client::LlmClient;
use crate::providers::OllamaClient;
use ragdesk_core::config::GenerationSettings;
use ragdesk_core::{AppError, AppResult};
use std::sync::Arc;
use std::time::Duration;

/// Create an LLM client for the configured provider.
///
/// # Errors
/// Returns `AppError::Config` if the provider is unknown, or
/// `AppError::Generation` if the HTTP client cannot be built.
pub fn create_client(settings: &GenerationSettings) -> AppResult<Arc<dyn LlmClient>> {
    match settings.provider.to_lowercase().as_str() {
        "ollama" => {
            let client = OllamaClient::with_timeout(
                settings.endpoint.as_str(),
                Duration::from_secs(settings.timeout_secs),
            )?;
            tracing::debug!(
                "Created Ollama generation client (endpoint: {}, model: {})",
                settings.endpoint,
                settings.model
            );
            Ok(Arc::new(client))
        }
        other => Err(AppError::Config(format!(
            "Unknown generation provider: {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_ollama_client() {
        let client = create_client(&GenerationSettings::default()).unwrap();
        assert_eq!(client.provider_name(), "ollama");
    }

    #[test]
    fn test_provider_name_is_case_insensitive() {
        let settings = GenerationSettings {
            provider: "Ollama".to_string(),
            ..Default::default()
        };
        assert!(create_client(&settings).is_ok());
    }

    #[test]
    fn test_unknown_provider() {
        let settings = GenerationSettings {
            provider: "unknown".to_string(),
            ..Default::default()
        };
        match create_client(&settings) {
            Err(err) => assert!(err.to_string().contains("Unknown generation provider")),
            Ok(_) => panic!("Expected error for unknown provider"),
        }
    }
}
