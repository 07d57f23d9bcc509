// Claude Code CLI provider

use crate::agents::providers::ProviderPlugin;
use crate::models::ProviderKind;

/// Provider for the Claude Code CLI
///
/// Runs in print mode with plain text output:
/// `claude -p <prompt> --output-format text [--model X] [--file path]*`
pub struct ClaudeProvider;

impl ClaudeProvider {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ClaudeProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderPlugin for ClaudeProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Claude
    }

    fn build_args(&self, prompt: &str, attachments: &[String], model: Option<&str>) -> Vec<String> {
        let mut args = vec![
            "-p".to_string(),
            prompt.to_string(),
            "--output-format".to_string(),
            "text".to_string(),
        ];

        if let Some(model) = model {
            args.push("--model".to_string());
            args.push(model.to_string());
        }

        for path in attachments {
            args.push("--file".to_string());
            args.push(path.clone());
        }

        args
    }
}
