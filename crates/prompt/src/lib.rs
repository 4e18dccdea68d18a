//! Prompt templates for ragdesk.
//!
//! This crate provides:
//! - YAML-based prompt definitions with a built-in `rag.answer` default
//! - Optional per-deployment overrides loaded from a prompts directory
//! - Handlebars template rendering

pub mod builder;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::build_prompt;
pub use loader::{builtin_prompt, list_prompts, load_prompt, RAG_ANSWER_PROMPT_ID};
pub use types::{BuiltPrompt, PromptDefinition};
