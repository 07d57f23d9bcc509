// Prompt template rendering for `AgentSession::prompt`

use crate::error::{AgentError, AgentResult};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;
use tera::{Context, Tera};

fn to_tera_context(vars: &Map<String, Value>) -> Context {
    let mut context = Context::new();
    for (key, value) in vars {
        context.insert(key.as_str(), value);
    }
    context
}

/// Render a template string with `{{ var }}` placeholders (no autoescaping)
pub fn render_prompt(content: &str, vars: &Map<String, Value>) -> AgentResult<String> {
    Tera::one_off(content, &to_tera_context(vars), false)
        .map_err(|e| AgentError::Template(format!("Failed to render prompt: {}", e)))
}

/// Read a prompt file and render it
pub fn render_prompt_file(path: &Path, vars: &Map<String, Value>) -> AgentResult<String> {
    let content = fs::read_to_string(path).map_err(|e| {
        AgentError::Template(format!(
            "Failed to read prompt file {}: {}",
            path.display(),
            e
        ))
    })?;

    log::debug!(
        "[Templates] Rendering {} with {} variable(s)",
        path.display(),
        vars.len()
    );
    render_prompt(&content, vars)
}
