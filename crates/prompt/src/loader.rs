//! Prompt loader for built-in and directory-provided prompt definitions.

use crate::types::PromptDefinition;
use ragdesk_core::{AppError, AppResult};
use std::path::Path;

/// Identifier of the grounded question-answering prompt.
pub const RAG_ANSWER_PROMPT_ID: &str = "rag.answer";

const RAG_ANSWER_YAML: &str = r#"
id: rag.answer
title: Grounded answer
apiVersion: "1.0"
createdBy: ragdesk
system: |
  You are a knowledge assistant answering questions from the user's private documents.
  Use only the context provided to answer the question.
  If the context does not contain the answer, say that you don't know instead of making one up.
  Keep your answer concise and factual.
template: |
  Context:
  {{#each documents}}
  [Document {{this.index}}: {{this.source}}]
  {{this.text}}

  {{/each}}
  Question: {{question}}
  Answer:
"#;

/// Return a built-in prompt definition by ID.
pub fn builtin_prompt(prompt_id: &str) -> Option<PromptDefinition> {
    let yaml = match prompt_id {
        RAG_ANSWER_PROMPT_ID => RAG_ANSWER_YAML,
        _ => return None,
    };

    serde_yaml::from_str(yaml).ok()
}

/// Load a prompt definition by ID.
///
/// Looks for `<id>.yml` in `prompts_dir` first, then falls back to the
/// built-in definitions.
///
/// # Example
/// ```no_run
/// use ragdesk_prompt::{load_prompt, RAG_ANSWER_PROMPT_ID};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let prompt = load_prompt(None, RAG_ANSWER_PROMPT_ID)?;
/// println!("Loaded prompt: {}", prompt.title);
/// # Ok(())
/// # }
/// ```
pub fn load_prompt(prompts_dir: Option<&Path>, prompt_id: &str) -> AppResult<PromptDefinition> {
    if let Some(dir) = prompts_dir {
        let prompt_file = dir.join(format!("{}.yml", prompt_id));

        if prompt_file.exists() {
            tracing::debug!("Loading prompt from: {:?}", prompt_file);

            let contents = std::fs::read_to_string(&prompt_file).map_err(|e| {
                AppError::Prompt(format!(
                    "Failed to read prompt file {:?}: {}",
                    prompt_file, e
                ))
            })?;

            let definition: PromptDefinition = serde_yaml::from_str(&contents).map_err(|e| {
                AppError::Prompt(format!(
                    "Failed to parse prompt YAML {:?}: {}",
                    prompt_file, e
                ))
            })?;

            validate_prompt(&definition)?;

            tracing::info!("Loaded prompt override: {} ({})", definition.id, definition.title);
            return Ok(definition);
        }
    }

    builtin_prompt(prompt_id)
        .ok_or_else(|| AppError::Prompt(format!("Prompt not found: {}", prompt_id)))
}

/// List prompt IDs overridden in a prompts directory.
pub fn list_prompts(prompts_dir: &Path) -> AppResult<Vec<String>> {
    if !prompts_dir.exists() {
        return Ok(Vec::new());
    }

    let mut prompt_ids = Vec::new();

    for entry in walkdir::WalkDir::new(prompts_dir)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("yml") {
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                prompt_ids.push(stem.to_string());
            }
        }
    }

    Ok(prompt_ids)
}

/// Validate a prompt definition.
fn validate_prompt(def: &PromptDefinition) -> AppResult<()> {
    if def.id.is_empty() {
        return Err(AppError::Prompt("Prompt ID cannot be empty".to_string()));
    }

    if def.title.is_empty() {
        return Err(AppError::Prompt("Prompt title cannot be empty".to_string()));
    }

    if def.template.trim().is_empty() {
        return Err(AppError::Prompt(
            "Prompt template cannot be empty".to_string(),
        ));
    }

    if !def.api_version.contains('.') {
        return Err(AppError::Prompt(format!(
            "Invalid apiVersion format: {}. Expected format: 'x.y'",
            def.api_version
        )));
    }

    Ok(())
}
