// Command shaping for the provider CLIs

mod claude_provider;
mod codex_provider;

use crate::agents::path_resolver::CliPathResolver;
use crate::models::ProviderKind;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

pub use claude_provider::ClaudeProvider;
pub use codex_provider::CodexProvider;

/// A provider CLI the pipeline can shell out to
pub trait ProviderPlugin: Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// Installed binary for this provider, if one can be found
    fn resolve_program(&self) -> Option<PathBuf> {
        CliPathResolver::resolve(self.kind())
    }

    /// Arguments for one invocation; attachments must already be filtered
    fn build_args(&self, prompt: &str, attachments: &[String], model: Option<&str>) -> Vec<String>;

    /// Full command running `program` with piped output and no stdin
    fn build_command(
        &self,
        program: &Path,
        prompt: &str,
        attachments: &[String],
        model: Option<&str>,
    ) -> Command {
        let mut cmd = Command::new(program);
        cmd.args(self.build_args(prompt, attachments, model))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        #[cfg(windows)]
        {
            const CREATE_NO_WINDOW: u32 = 0x0800_0000;
            cmd.creation_flags(CREATE_NO_WINDOW);
        }

        cmd
    }
}

/// Get the appropriate provider for a provider kind
pub fn get_provider(kind: ProviderKind) -> Box<dyn ProviderPlugin> {
    match kind {
        ProviderKind::Claude => Box::new(ClaudeProvider::new()),
        ProviderKind::Codex => Box::new(CodexProvider::new()),
    }
}
