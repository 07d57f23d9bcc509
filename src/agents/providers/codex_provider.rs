// Codex CLI provider

use crate::agents::providers::ProviderPlugin;
use crate::models::ProviderKind;

/// Provider for the Codex CLI
///
/// `codex --quiet <prompt> [--model X] [--file path]*`
pub struct CodexProvider;

impl CodexProvider {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CodexProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderPlugin for CodexProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Codex
    }

    fn build_args(&self, prompt: &str, attachments: &[String], model: Option<&str>) -> Vec<String> {
        let mut args = vec!["--quiet".to_string(), prompt.to_string()];

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
