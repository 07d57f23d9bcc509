//! Agent session - the state every pipeline call shares
//!
//! A session owns the configuration, response cache, conversation contexts,
//! step history, rate-limit clock and debug sink. Each lives behind its own
//! mutex and no lock is held across an `.await`, so an `Arc<AgentSession>`
//! can be shared between tasks. Sessions are independent of each other.

use crate::agents::cache::ResponseCache;
use crate::agents::clock::{Clock, TokioClock};
use crate::agents::context::{ContextAction, ContextOptions, ContextOutcome, ContextStore};
use crate::agents::debug_log::DebugLog;
use crate::agents::guard::{guard, GuardRules};
use crate::agents::history::StepHistory;
use crate::agents::invoker::{CliInvoker, ProviderInvoker};
use crate::agents::rate_limiter::RateLimiter;
use crate::agents::executor::StepOptions;
use crate::config::{PipelineConfig, PipelineOptions, MAX_DEBUG_LEVEL};
use crate::error::AgentResult;
use crate::models::{CostReport, NotifyConfig, ProviderKind, StepRecord};
use crate::templates;
use crate::utils::lock_mutex_recover;
use serde_json::{Map, Value};
use std::path::Path;
use std::sync::{Arc, Mutex};

pub struct AgentSession {
    pub(crate) config: Mutex<PipelineConfig>,
    pub(crate) cache: Mutex<ResponseCache>,
    pub(crate) contexts: Mutex<ContextStore>,
    pub(crate) history: Mutex<StepHistory>,
    pub(crate) debug_log: Mutex<DebugLog>,
    pub(crate) rate_limiter: RateLimiter,
    pub(crate) invoker: Arc<dyn ProviderInvoker>,
    pub(crate) clock: Arc<dyn Clock>,
    notify: Mutex<NotifyConfig>,
}

impl AgentSession {
    /// Session with default config that shells out to the real provider CLIs
    pub fn new() -> Self {
        Self {
            config: Mutex::new(PipelineConfig::default()),
            cache: Mutex::new(ResponseCache::new()),
            contexts: Mutex::new(ContextStore::new()),
            history: Mutex::new(StepHistory::new()),
            debug_log: Mutex::new(DebugLog::new()),
            rate_limiter: RateLimiter::new(),
            invoker: Arc::new(CliInvoker::new()),
            clock: Arc::new(TokioClock),
            notify: Mutex::new(NotifyConfig::default()),
        }
    }

    /// Replace the starting configuration
    pub fn with_config(self, config: PipelineConfig) -> Self {
        *lock_mutex_recover(&self.config) = config;
        self
    }

    /// Replace the provider invoker (e.g. with a scripted one in tests)
    pub fn with_invoker(mut self, invoker: Arc<dyn ProviderInvoker>) -> Self {
        self.invoker = invoker;
        self
    }

    /// Replace the time source used for throttling and backoff
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Snapshot of the live configuration
    pub fn config(&self) -> PipelineConfig {
        lock_mutex_recover(&self.config).clone()
    }

    /// Apply configuration overrides in place and return the result
    pub fn pipeline(&self, options: PipelineOptions) -> PipelineConfig {
        let mut config = lock_mutex_recover(&self.config);
        options.apply_to(&mut config);
        log::info!(
            "[AgentSession] Pipeline configured: retries={}, cache={}, rateLimitMs={}, onError={}",
            config.retries,
            config.cache_enabled,
            config.rate_limit_ms,
            config.on_error.as_str()
        );
        config.clone()
    }

    /// Run a step on the Claude CLI
    pub async fn claude(&self, step_name: &str, options: StepOptions) -> AgentResult<Value> {
        self.run_step(ProviderKind::Claude, step_name, options).await
    }

    /// Run a step on the Codex CLI
    pub async fn codex(&self, step_name: &str, options: StepOptions) -> AgentResult<Value> {
        self.run_step(ProviderKind::Codex, step_name, options).await
    }

    /// Set the debug level (clamped to 0..=3)
    pub fn debug(&self, level: u8) {
        lock_mutex_recover(&self.config).debug_level = level.min(MAX_DEBUG_LEVEL);
    }

    /// Also append debug messages to `path`
    pub fn log(&self, path: &Path) {
        lock_mutex_recover(&self.debug_log).set_path(path);
    }

    /// Aggregate timing and outcome report over all recorded steps
    pub fn cost(&self) -> CostReport {
        lock_mutex_recover(&self.history).cost_report()
    }

    /// Copy of the step history
    pub fn history(&self) -> Vec<StepRecord> {
        lock_mutex_recover(&self.history).records().to_vec()
    }

    pub fn notify(&self, config: NotifyConfig) {
        *lock_mutex_recover(&self.notify) = config;
    }

    pub fn notify_config(&self) -> NotifyConfig {
        lock_mutex_recover(&self.notify).clone()
    }

    /// Set the default model when `name` is given; returns the current default
    pub fn model(&self, name: Option<&str>) -> Option<String> {
        let mut config = lock_mutex_recover(&self.config);
        if let Some(name) = name {
            config.default_model = Some(name.to_string());
        }
        config.default_model.clone()
    }

    /// Render a prompt template file with `vars`
    pub fn prompt(&self, path: &Path, vars: &Map<String, Value>) -> AgentResult<String> {
        templates::render_prompt_file(path, vars)
    }

    /// Create, inspect or discard a conversation context
    pub fn context(
        &self,
        action: ContextAction,
        options: ContextOptions,
    ) -> AgentResult<ContextOutcome> {
        lock_mutex_recover(&self.contexts).apply(action, options)
    }

    /// Validate a value against guard rules
    pub fn guard(&self, value: Value, rules: &GuardRules) -> AgentResult<Value> {
        guard(value, rules)
    }

    /// Emit a debug message at `level` if the session's debug level allows it
    pub(crate) fn debug_message(&self, level: u8, message: &str) {
        let configured = lock_mutex_recover(&self.config).debug_level;
        lock_mutex_recover(&self.debug_log).emit(configured, level, message);
    }
}

impl Default for AgentSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ErrorMode;

    #[test]
    fn test_pipeline_updates_live_config() {
        let session = AgentSession::new();
        let config = session.pipeline(PipelineOptions {
            retries: Some(1),
            cache: Some(true),
            on_error: Some(ErrorMode::Skip),
            ..Default::default()
        });

        assert_eq!(config.retries, 1);
        assert!(session.config().cache_enabled);
        assert_eq!(session.config().on_error, ErrorMode::Skip);
    }

    #[test]
    fn test_model_get_and_set() {
        let session = AgentSession::new();
        assert_eq!(session.model(None), None);
        assert_eq!(session.model(Some("sonnet")).as_deref(), Some("sonnet"));
        assert_eq!(session.model(None).as_deref(), Some("sonnet"));
    }

    #[test]
    fn test_debug_level_clamped() {
        let session = AgentSession::new();
        session.debug(7);
        assert_eq!(session.config().debug_level, MAX_DEBUG_LEVEL);
    }

    #[test]
    fn test_notify_is_stored() {
        let session = AgentSession::new();
        session.notify(NotifyConfig {
            enabled: true,
            on_error: true,
            transport: Some("email".to_string()),
            to: Some("ops@example.com".to_string()),
            ..Default::default()
        });
        let stored = session.notify_config();
        assert!(stored.enabled);
        assert_eq!(stored.to.as_deref(), Some("ops@example.com"));
    }

    #[test]
    fn test_new_session_has_empty_cost_report() {
        let report = AgentSession::new().cost();
        assert_eq!(report.steps, 0);
        assert!(report.history.is_empty());
    }
}
