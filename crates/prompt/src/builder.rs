//! Prompt builder for rendering templates with retrieved context.

use crate::types::{BuiltPrompt, PromptDefinition};
use handlebars::Handlebars;
use ragdesk_core::{AppError, AppResult};
use serde::Serialize;

/// Build a prompt from a definition and a serializable context.
///
/// Both the system message (if present) and the user template are rendered
/// with the same context. For `rag.answer` the context carries `question`
/// and a `documents` array of `{index, source, text}` entries.
///
/// # Example
/// ```no_run
/// use ragdesk_prompt::{build_prompt, load_prompt, RAG_ANSWER_PROMPT_ID};
/// use serde_json::json;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let def = load_prompt(None, RAG_ANSWER_PROMPT_ID)?;
/// let built = build_prompt(&def, &json!({
///     "question": "What is the refund window?",
///     "documents": [{"index": 1, "source": "policy.txt", "text": "Refunds within 30 days."}],
/// }))?;
/// println!("User prompt: {}", built.user);
/// # Ok(())
/// # }
/// ```
pub fn build_prompt<C: Serialize>(definition: &PromptDefinition, context: &C) -> AppResult<BuiltPrompt> {
    tracing::debug!("Building prompt: {}", definition.id);

    let mut handlebars = Handlebars::new();

    // Plain text output, not HTML
    handlebars.register_escape_fn(handlebars::no_escape);

    let system = definition
        .system
        .as_deref()
        .map(|template| render(&mut handlebars, "system", template, context))
        .transpose()?
        .map(|s| s.trim_end().to_string());

    let user = render(&mut handlebars, "user", &definition.template, context)?;

    Ok(BuiltPrompt {
        system,
        user,
        source_prompt_id: definition.id.clone(),
    })
}

fn render<C: Serialize>(
    handlebars: &mut Handlebars<'_>,
    name: &str,
    template: &str,
    context: &C,
) -> AppResult<String> {
    handlebars
        .register_template_string(name, template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

    handlebars
        .render(name, context)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))
}
