//! Batch Runner - apply one question template to every item of a list
//!
//! Items run strictly one after another. Each item goes through the same
//! cache, rate-limit and retry path as a step but never falls back to another
//! provider. On exhaustion `skip` stores the sentinel for that item; any other
//! mode aborts the whole batch and drops the results gathered so far.

use crate::agents::cache::cache_key;
use crate::agents::executor::AttemptPlan;
use crate::agents::session::AgentSession;
use crate::error::{AgentError, AgentResult};
use crate::models::{ErrorMode, OutputFormat, ProviderKind, StepRecord, SKIPPED_SENTINEL};
use chrono::Utc;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::OnceLock;

static PLACEHOLDER_REGEX: OnceLock<Regex> = OnceLock::new();

fn placeholder_regex() -> &'static Regex {
    PLACEHOLDER_REGEX
        .get_or_init(|| Regex::new(r"\{\{\s*(item(?:\.[A-Za-z0-9_]+)*|index)\s*\}\}").unwrap())
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchOptions {
    pub items: Vec<Value>,
    /// Question template with `{{item}}`, `{{index}}` and `{{item.field}}` placeholders
    #[serde(alias = "template")]
    pub question: String,
    #[serde(default, alias = "format")]
    pub expected_output: OutputFormat,
    #[serde(default)]
    pub provider: ProviderKind,
    #[serde(default)]
    pub attachments: Vec<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub retries: Option<u32>,
    #[serde(default)]
    pub on_error: Option<ErrorMode>,
    /// Accepted for compatibility; items always run sequentially
    #[serde(default)]
    pub concurrency: Option<usize>,
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Substitute the per-item placeholders of a batch question template
///
/// Unknown fields of an object item render as an empty string. Field
/// placeholders are left untouched when the item is not an object.
pub fn render_item_template(template: &str, item: &Value, index: usize) -> String {
    placeholder_regex()
        .replace_all(template, |caps: &Captures| {
            let name = &caps[1];
            if name == "index" {
                return index.to_string();
            }
            if name != "item" && !item.is_object() {
                return caps[0].to_string();
            }

            let mut current = item;
            for field in name.split('.').skip(1) {
                match current.get(field) {
                    Some(next) => current = next,
                    None => return String::new(),
                }
            }
            render_value(current)
        })
        .into_owned()
}

impl AgentSession {
    /// Run `options.question` once per item and collect the parsed results
    pub async fn batch(&self, step_name: &str, options: BatchOptions) -> AgentResult<Vec<Value>> {
        if options.question.trim().is_empty() {
            return Err(AgentError::Validation(format!(
                "Batch \"{}\" requires a non-empty question template",
                step_name
            )));
        }

        if let Some(concurrency) = options.concurrency {
            log::debug!(
                "[BatchRunner] Ignoring concurrency={} for \"{}\"; items run sequentially",
                concurrency,
                step_name
            );
        }

        let config = self.config();
        let format = options.expected_output;
        let provider = options.provider;
        let max_retries = options.retries.unwrap_or(config.retries);
        let error_mode = options.on_error.unwrap_or(config.on_error);
        let model = options.model.clone().or_else(|| config.default_model.clone());

        log::info!(
            "[BatchRunner] Batch \"{}\": {} item(s) on {}",
            step_name,
            options.items.len(),
            provider
        );

        let mut results = Vec::with_capacity(options.items.len());

        for (index, item) in options.items.iter().enumerate() {
            let question = render_item_template(&options.question, item, index);
            let item_name = format!("{}[{}]", step_name, index);

            let key = cache_key(&question, &options.attachments);
            if let Some(value) = self.cached_value(&config, &key) {
                self.debug_message(2, &format!("Cache hit for batch item \"{}\"", item_name));
                self.record(StepRecord {
                    step_name: item_name,
                    provider,
                    question,
                    format,
                    duration_ms: 0,
                    cached: true,
                    retries_used: 0,
                    error: None,
                    timestamp: Utc::now(),
                });
                results.push(value);
                continue;
            }

            self.rate_limiter
                .throttle(config.rate_limit_ms, self.clock.as_ref())
                .await;

            let started = self.clock.now();
            let outcome = {
                let plan = AttemptPlan {
                    provider,
                    step_name: &item_name,
                    question: &question,
                    format,
                    attachments: &options.attachments,
                    model: model.clone(),
                    max_retries,
                    context_id: None,
                };
                self.attempt_with_retries(&config, &plan).await
            };

            match outcome {
                Ok(success) => {
                    self.cache_value(&config, key, &success.value);
                    self.record(StepRecord {
                        step_name: item_name,
                        provider,
                        question,
                        format,
                        duration_ms: self.elapsed_ms(started),
                        cached: false,
                        retries_used: success.attempt,
                        error: None,
                        timestamp: Utc::now(),
                    });
                    results.push(success.value);
                }
                Err(last_error) => {
                    self.record(StepRecord {
                        step_name: item_name.clone(),
                        provider,
                        question,
                        format,
                        duration_ms: self.elapsed_ms(started),
                        cached: false,
                        retries_used: max_retries,
                        error: Some(last_error.clone()),
                        timestamp: Utc::now(),
                    });

                    if error_mode == ErrorMode::Skip {
                        self.debug_message(1, &format!("Batch item \"{}\" skipped", item_name));
                        results.push(Value::String(SKIPPED_SENTINEL.to_string()));
                        continue;
                    }

                    log::warn!(
                        "[BatchRunner] Aborting batch \"{}\" at item {}: {}",
                        step_name,
                        index,
                        last_error
                    );
                    return Err(AgentError::Exhausted {
                        provider: provider.to_string(),
                        step: item_name,
                        attempts: max_retries + 1,
                        last_error,
                    });
                }
            }
        }

        Ok(results)
    }
}
