// Pipeline configuration and file loading

use crate::error::{AgentError, AgentResult};
use crate::models::{ErrorMode, ProviderKind};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable naming a config file to load at startup
pub const CONFIG_ENV_VAR: &str = "AGENT_PIPELINE_CONFIG";

/// Highest accepted debug level
pub const MAX_DEBUG_LEVEL: u8 = 3;

/// Session-wide settings read by every step execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// 0 = silent, 3 = most verbose
    #[serde(rename = "debugLevel", alias = "debug_level", default)]
    pub debug_level: u8,
    /// Retries after the first attempt of a step
    #[serde(default = "default_retries")]
    pub retries: u32,
    /// Advisory only, never consulted by the executor
    #[serde(rename = "budgetUSD", alias = "budget_usd", default)]
    pub budget_usd: f64,
    #[serde(rename = "sessionId", alias = "session_id", default = "default_session_id")]
    pub session_id: String,
    #[serde(rename = "cacheEnabled", alias = "cache_enabled", alias = "cache", default)]
    pub cache_enabled: bool,
    /// Per provider invocation, not per step
    #[serde(rename = "timeoutMs", alias = "timeout_ms", default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Minimum spacing between provider calls; 0 disables throttling
    #[serde(rename = "rateLimitMs", alias = "rate_limit_ms", default)]
    pub rate_limit_ms: u64,
    #[serde(rename = "fallbackProvider", alias = "fallback_provider", alias = "fallback", default)]
    pub fallback_provider: Option<ProviderKind>,
    #[serde(rename = "onError", alias = "on_error", default)]
    pub on_error: ErrorMode,
    #[serde(rename = "dryRun", alias = "dry_run", default)]
    pub dry_run: bool,
    #[serde(rename = "keepTemp", alias = "keep_temp", default)]
    pub keep_temp: bool,
    #[serde(rename = "defaultModel", alias = "default_model", alias = "model", default)]
    pub default_model: Option<String>,
}

fn default_retries() -> u32 { 2 }
fn default_timeout_ms() -> u64 { 300_000 }
fn default_session_id() -> String { uuid::Uuid::new_v4().to_string() }

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            debug_level: 0,
            retries: default_retries(),
            budget_usd: 0.0,
            session_id: default_session_id(),
            cache_enabled: false,
            timeout_ms: default_timeout_ms(),
            rate_limit_ms: 0,
            fallback_provider: None,
            on_error: ErrorMode::Throw,
            dry_run: false,
            keep_temp: false,
            default_model: None,
        }
    }
}

impl PipelineConfig {
    /// Load config from a TOML file
    pub fn load(path: &Path) -> AgentResult<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            AgentError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        let config: PipelineConfig = toml::from_str(&contents).map_err(|e| {
            AgentError::Config(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        config.validate()?;
        log::info!("[Config] Loaded pipeline config from {}", path.display());
        Ok(config)
    }

    /// Load config from `path` if it exists, defaults otherwise
    pub fn load_or_default(path: &Path) -> AgentResult<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            log::debug!(
                "[Config] No config at {}, using defaults",
                path.display()
            );
            Ok(Self::default())
        }
    }

    /// Path of the per-user config file, `~/.config/agent-pipeline/config.toml`
    pub fn global_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("agent-pipeline").join("config.toml"))
    }

    /// Save config as TOML, creating parent directories
    pub fn save(&self, path: &Path) -> AgentResult<()> {
        self.validate()?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| {
                    AgentError::Config(format!(
                        "Failed to create config directory '{}': {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| AgentError::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, contents).map_err(|e| {
            AgentError::Config(format!(
                "Failed to write config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        log::info!("[Config] Saved pipeline config to {}", path.display());
        Ok(())
    }

    /// Validate config values
    pub fn validate(&self) -> AgentResult<()> {
        if self.debug_level > MAX_DEBUG_LEVEL {
            return Err(AgentError::Config(format!(
                "debugLevel must be between 0 and {}, got {}",
                MAX_DEBUG_LEVEL, self.debug_level
            )));
        }

        if self.timeout_ms == 0 {
            return Err(AgentError::Config(
                "timeoutMs must be greater than 0".to_string(),
            ));
        }

        if !self.budget_usd.is_finite() || self.budget_usd < 0.0 {
            return Err(AgentError::Config(
                "budgetUSD must be a non-negative number".to_string(),
            ));
        }

        Ok(())
    }
}
