//! Step Executor - retry, cache and fallback orchestration for one step
//!
//! A step runs through these stages:
//! 1. Condition check (falsy condition: `Null`, nothing recorded)
//! 2. Input validation (empty question always fails)
//! 3. Dry run (placeholder string, nothing recorded)
//! 4. Cache lookup
//! 5. Rate limiting
//! 6. Attempts with exponential backoff, escalating the prompt on retries
//! 7. Error policy once retries are exhausted (fallback provider, skip, throw)

use crate::agents::cache::cache_key;
use crate::agents::invoker::InvocationRequest;
use crate::agents::prompt_builder::{build_prompt, render_context_prefix};
use crate::agents::session::AgentSession;
use crate::config::PipelineConfig;
use crate::error::{AgentError, AgentResult};
use crate::models::{ErrorMode, OutputFormat, ProviderKind, StepRecord, SKIPPED_SENTINEL};
use crate::parsers::parse_response;
use crate::utils::{lock_mutex_recover, truncate_chars};
use chrono::Utc;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::time::{Duration, Instant};

/// Base delay before the first retry; doubles on every further retry
pub const BACKOFF_BASE_MS: u64 = 1000;

/// Options for a single step
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepOptions {
    pub question: String,
    #[serde(default, alias = "format")]
    pub expected_output: OutputFormat,
    #[serde(default)]
    pub attachments: Vec<String>,
    #[serde(default)]
    pub model: Option<String>,
    /// Overrides the session's retry count
    #[serde(default)]
    pub retries: Option<u32>,
    /// Overrides the session's error mode
    #[serde(default)]
    pub on_error: Option<ErrorMode>,
    /// Step only runs when this is `true`, `"true"` or `1`; an explicit null skips
    #[serde(
        default,
        deserialize_with = "deserialize_present",
        skip_serializing_if = "Option::is_none"
    )]
    pub condition: Option<Value>,
    /// Conversation context to prefix and extend
    #[serde(default)]
    pub context: Option<String>,
}

/// Keep a field that is present as `Some`, even when it is JSON null
fn deserialize_present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl StepOptions {
    pub fn new(question: impl Into<String>, expected_output: OutputFormat) -> Self {
        Self {
            question: question.into(),
            expected_output,
            ..Default::default()
        }
    }
}

/// Delay before retry `attempt` (1-based): 1s, 2s, 4s, ...
pub fn backoff_delay(attempt: u32) -> Duration {
    if attempt == 0 {
        return Duration::ZERO;
    }
    let factor = 2u64.saturating_pow(attempt - 1);
    Duration::from_millis(BACKOFF_BASE_MS.saturating_mul(factor))
}

/// Whether a condition value lets the step run
pub fn condition_passes(condition: &Value) -> bool {
    match condition {
        Value::Bool(b) => *b,
        Value::String(s) => s == "true",
        Value::Number(n) => n.as_f64() == Some(1.0),
        _ => false,
    }
}

/// Everything one retry loop needs, shared by steps and batch items
pub(crate) struct AttemptPlan<'a> {
    pub provider: ProviderKind,
    pub step_name: &'a str,
    pub question: &'a str,
    pub format: OutputFormat,
    pub attachments: &'a [String],
    pub model: Option<String>,
    pub max_retries: u32,
    pub context_id: Option<&'a str>,
}

/// Successful outcome of a retry loop
pub(crate) struct AttemptSuccess {
    pub value: Value,
    pub attempt: u32,
}

type StepFuture<'a> = Pin<Box<dyn Future<Output = AgentResult<Value>> + Send + 'a>>;

impl AgentSession {
    /// Run a named step against `provider`
    ///
    /// Returns `Value::Null` when the condition fails, the parsed response on
    /// success, or the skip sentinel when retries run out under `skip`.
    pub fn run_step<'a>(
        &'a self,
        provider: ProviderKind,
        step_name: &'a str,
        options: StepOptions,
    ) -> StepFuture<'a> {
        Box::pin(async move {
            if let Some(ref condition) = options.condition {
                if !condition_passes(condition) {
                    self.debug_message(1, &format!("Step \"{}\" skipped by condition", step_name));
                    return Ok(Value::Null);
                }
            }

            if options.question.trim().is_empty() {
                return Err(AgentError::Validation(format!(
                    "Step \"{}\" requires a non-empty question",
                    step_name
                )));
            }

            let config = self.config();
            let format = options.expected_output;

            if config.dry_run {
                self.debug_message(
                    1,
                    &format!("[DRY RUN] {} step \"{}\" ({})", provider, step_name, format),
                );
                return Ok(Value::String(format!(
                    "[DRY RUN] {} response for step \"{}\"",
                    format, step_name
                )));
            }

            let key = cache_key(&options.question, &options.attachments);
            if let Some(value) = self.cached_value(&config, &key) {
                self.debug_message(2, &format!("Cache hit for step \"{}\"", step_name));
                self.record(StepRecord {
                    step_name: step_name.to_string(),
                    provider,
                    question: options.question.clone(),
                    format,
                    duration_ms: 0,
                    cached: true,
                    retries_used: 0,
                    error: None,
                    timestamp: Utc::now(),
                });
                return Ok(value);
            }

            self.rate_limiter
                .throttle(config.rate_limit_ms, self.clock.as_ref())
                .await;

            let max_retries = options.retries.unwrap_or(config.retries);
            let plan = AttemptPlan {
                provider,
                step_name,
                question: &options.question,
                format,
                attachments: &options.attachments,
                model: options.model.clone().or_else(|| config.default_model.clone()),
                max_retries,
                context_id: options.context.as_deref(),
            };

            let started = self.clock.now();
            let last_error = match self.attempt_with_retries(&config, &plan).await {
                Ok(success) => {
                    self.cache_value(&config, key, &success.value);
                    self.record(StepRecord {
                        step_name: step_name.to_string(),
                        provider,
                        question: options.question.clone(),
                        format,
                        duration_ms: self.elapsed_ms(started),
                        cached: false,
                        retries_used: success.attempt,
                        error: None,
                        timestamp: Utc::now(),
                    });
                    return Ok(success.value);
                }
                Err(last_error) => last_error,
            };

            self.record(StepRecord {
                step_name: step_name.to_string(),
                provider,
                question: options.question.clone(),
                format,
                duration_ms: self.elapsed_ms(started),
                cached: false,
                retries_used: max_retries,
                error: Some(last_error.clone()),
                timestamp: Utc::now(),
            });

            let error_mode = options.on_error.unwrap_or(config.on_error);
            log::warn!(
                "[StepExecutor] Step \"{}\" on {} exhausted {} attempt(s): {}",
                step_name,
                provider,
                max_retries + 1,
                last_error
            );

            // A configured fallback is tried under `throw` as well as `fallback`.
            // The inner call is forced to `throw` so it cannot fall back again.
            if matches!(error_mode, ErrorMode::Fallback | ErrorMode::Throw) {
                if let Some(fallback) = config.fallback_provider.filter(|f| *f != provider) {
                    let fallback_name = format!("{}:fallback", step_name);
                    let mut fallback_options = options.clone();
                    fallback_options.on_error = Some(ErrorMode::Throw);

                    self.debug_message(
                        1,
                        &format!("Falling back to {} for step \"{}\"", fallback, step_name),
                    );
                    match self.run_step(fallback, &fallback_name, fallback_options).await {
                        Ok(value) => return Ok(value),
                        Err(e) => {
                            log::warn!(
                                "[StepExecutor] Fallback {} for step \"{}\" failed: {}",
                                fallback,
                                step_name,
                                e
                            );
                        }
                    }
                }
            }

            if error_mode == ErrorMode::Skip {
                self.debug_message(1, &format!("Step \"{}\" skipped after errors", step_name));
                return Ok(Value::String(SKIPPED_SENTINEL.to_string()));
            }

            Err(AgentError::Exhausted {
                provider: provider.to_string(),
                step: step_name.to_string(),
                attempts: max_retries + 1,
                last_error,
            })
        })
    }

    /// Attempt loop with backoff; returns the last error message when exhausted
    pub(crate) async fn attempt_with_retries(
        &self,
        config: &PipelineConfig,
        plan: &AttemptPlan<'_>,
    ) -> Result<AttemptSuccess, String> {
        let mut last_error = String::from("no attempts made");

        for attempt in 0..=plan.max_retries {
            if attempt > 0 {
                let delay = backoff_delay(attempt);
                self.debug_message(
                    2,
                    &format!(
                        "Retry {}/{} for step \"{}\" in {}ms",
                        attempt,
                        plan.max_retries,
                        plan.step_name,
                        delay.as_millis()
                    ),
                );
                self.clock.sleep(delay).await;
            }

            let mut prompt = build_prompt(plan.question, plan.format, attempt);
            if let Some(context_id) = plan.context_id {
                let prefix = lock_mutex_recover(&self.contexts)
                    .messages(context_id)
                    .map(render_context_prefix)
                    .unwrap_or_default();
                prompt.insert_str(0, &prefix);
            }
            self.debug_message(3, &format!("Prompt for \"{}\": {}", plan.step_name, prompt));

            let request = InvocationRequest {
                provider: plan.provider,
                prompt,
                attachments: plan.attachments.to_vec(),
                model: plan.model.clone(),
                timeout_ms: config.timeout_ms,
            };

            let outcome = match self.invoker.invoke(&request).await {
                Ok(raw) => {
                    self.debug_message(
                        3,
                        &format!("Raw response for \"{}\": {}", plan.step_name, truncate_chars(&raw, 500)),
                    );
                    parse_response(&raw, plan.format).map(|value| (raw, value))
                }
                Err(e) => Err(e),
            };

            match outcome {
                Ok((raw, value)) => {
                    if let Some(context_id) = plan.context_id {
                        lock_mutex_recover(&self.contexts).append_exchange(
                            context_id,
                            plan.question,
                            raw.trim(),
                        );
                    }
                    log::info!(
                        "[StepExecutor] Step \"{}\" succeeded on {} (attempt {})",
                        plan.step_name,
                        plan.provider,
                        attempt + 1
                    );
                    return Ok(AttemptSuccess { value, attempt });
                }
                Err(e) => {
                    log::warn!(
                        "[StepExecutor] Attempt {}/{} for step \"{}\" failed: {}",
                        attempt + 1,
                        plan.max_retries + 1,
                        plan.step_name,
                        e
                    );
                    last_error = e.to_string();
                }
            }
        }

        Err(last_error)
    }

    pub(crate) fn cached_value(&self, config: &PipelineConfig, key: &str) -> Option<Value> {
        if !config.cache_enabled {
            return None;
        }
        lock_mutex_recover(&self.cache).get(key).cloned()
    }

    pub(crate) fn cache_value(&self, config: &PipelineConfig, key: String, value: &Value) {
        if config.cache_enabled {
            lock_mutex_recover(&self.cache).insert(key, value.clone());
        }
    }

    pub(crate) fn record(&self, record: StepRecord) {
        lock_mutex_recover(&self.history).push(record);
    }

    pub(crate) fn elapsed_ms(&self, started: Instant) -> u64 {
        let elapsed = self.clock.now().saturating_duration_since(started);
        u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_backoff_schedule() {
        assert_eq!(backoff_delay(0), Duration::ZERO);
        assert_eq!(backoff_delay(1), Duration::from_millis(1000));
        assert_eq!(backoff_delay(2), Duration::from_millis(2000));
        assert_eq!(backoff_delay(3), Duration::from_millis(4000));
        assert_eq!(backoff_delay(4), Duration::from_millis(8000));
    }

    #[test]
    fn test_backoff_saturates() {
        assert_eq!(backoff_delay(200), Duration::from_millis(u64::MAX));
    }

    #[test]
    fn test_condition_values() {
        assert!(condition_passes(&json!(true)));
        assert!(condition_passes(&json!("true")));
        assert!(condition_passes(&json!(1)));
        assert!(!condition_passes(&json!(false)));
        assert!(!condition_passes(&json!("yes")));
        assert!(!condition_passes(&json!(0)));
        assert!(!condition_passes(&json!(2)));
        assert!(!condition_passes(&Value::Null));
    }

    #[test]
    fn test_step_options_deserialize() {
        let options: StepOptions = serde_json::from_str(
            r#"{"question": "2+2?", "expectedOutput": "NUMBER", "retries": 1, "onError": "skip"}"#,
        )
        .unwrap();
        assert_eq!(options.question, "2+2?");
        assert_eq!(options.expected_output, OutputFormat::Number);
        assert_eq!(options.retries, Some(1));
        assert_eq!(options.on_error, Some(ErrorMode::Skip));
        assert!(options.attachments.is_empty());
        assert!(options.condition.is_none());
    }

    #[test]
    fn test_explicit_null_condition_is_present() {
        let options: StepOptions =
            serde_json::from_value(json!({"question": "q", "condition": null})).unwrap();
        assert_eq!(options.condition, Some(Value::Null));
        assert!(!condition_passes(&Value::Null));
    }
}
