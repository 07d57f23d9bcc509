// CLI binary path resolution for provider tools

use crate::models::ProviderKind;
use std::path::PathBuf;

pub struct CliPathResolver;

impl CliPathResolver {
    /// Resolve the binary for a provider, if installed
    pub fn resolve(provider: ProviderKind) -> Option<PathBuf> {
        Self::resolve_cli(provider.as_str())
    }

    /// Resolve a CLI binary by checking common install paths then PATH
    fn resolve_cli(name: &str) -> Option<PathBuf> {
        let standard_paths = [
            dirs::home_dir().map(|h| h.join(format!(".npm-global/bin/{}", name))),
            dirs::home_dir().map(|h| h.join(format!(".local/bin/{}", name))),
            Some(PathBuf::from(format!("/usr/local/bin/{}", name))),
            Some(PathBuf::from(format!("/opt/homebrew/bin/{}", name))),
        ];

        for path in standard_paths.iter().flatten() {
            if path.is_file() {
                log::debug!("[CliPathResolver] Found {} at: {:?}", name, path);
                return Some(path.clone());
            }
        }

        match which::which(name) {
            Ok(path) => {
                log::debug!("[CliPathResolver] Found {} via PATH at: {:?}", name, path);
                Some(path)
            }
            Err(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolved_path_names_the_provider() {
        if let Some(program) = CliPathResolver::resolve(ProviderKind::Codex) {
            let file_name = program.file_name().and_then(|n| n.to_str()).unwrap_or("");
            assert!(file_name.starts_with("codex"));
        }
    }

    #[test]
    fn test_resolve_nonexistent_returns_none() {
        assert!(CliPathResolver::resolve_cli("this-command-definitely-does-not-exist-12345").is_none());
    }
}
