// Classification and field extraction built on top of the step executor

use crate::agents::executor::StepOptions;
use crate::agents::session::AgentSession;
use crate::error::{AgentError, AgentResult};
use crate::models::{ErrorMode, OutputFormat, ProviderKind};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifyOptions {
    /// Text to classify
    #[serde(alias = "text")]
    pub input: String,
    pub categories: Vec<String>,
    #[serde(default)]
    pub provider: ProviderKind,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub retries: Option<u32>,
    #[serde(default)]
    pub on_error: Option<ErrorMode>,
    #[serde(default)]
    pub attachments: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractOptions {
    /// Text to extract from
    #[serde(alias = "text")]
    pub input: String,
    pub fields: Vec<String>,
    #[serde(default)]
    pub provider: ProviderKind,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub retries: Option<u32>,
    #[serde(default)]
    pub on_error: Option<ErrorMode>,
    #[serde(default)]
    pub attachments: Vec<String>,
}

pub fn build_classify_question(input: &str, categories: &[String]) -> String {
    format!(
        "Classify the following input into exactly one of these categories: {}.\n\
         Respond with only the category name.\n\nInput:\n{}",
        categories.join(", "),
        input
    )
}

pub fn build_extract_question(input: &str, fields: &[String]) -> String {
    format!(
        "Extract the following fields from the input: {}.\n\
         Return a JSON object with exactly these keys. Use null for any field that is not present.\n\n\
         Input:\n{}",
        fields.join(", "),
        input
    )
}

/// Map a free-form response onto one of `categories`
///
/// Case-insensitive; an exact match or a response containing the category
/// both count, and the first category in list order wins. Returns `None`
/// when nothing matches.
pub fn match_category<'a>(response: &str, categories: &'a [String]) -> Option<&'a str> {
    let normalized = response.trim().to_lowercase();
    categories
        .iter()
        .find(|category| {
            let category = category.to_lowercase();
            normalized == category || normalized.contains(&category)
        })
        .map(String::as_str)
}

impl AgentSession {
    /// Ask the provider to pick one of `options.categories` for `options.input`
    pub async fn classify(&self, step_name: &str, options: ClassifyOptions) -> AgentResult<Value> {
        if options.categories.is_empty() {
            return Err(AgentError::Validation(format!(
                "Classify step \"{}\" requires at least one category",
                step_name
            )));
        }

        let step = StepOptions {
            question: build_classify_question(&options.input, &options.categories),
            expected_output: OutputFormat::Text,
            attachments: options.attachments,
            model: options.model,
            retries: options.retries,
            on_error: options.on_error,
            ..Default::default()
        };

        let value = self.run_step(options.provider, step_name, step).await?;

        // Null (condition skip) and the skip sentinel pass through untouched
        let Some(raw) = value.as_str() else {
            return Ok(value);
        };
        if raw == crate::models::SKIPPED_SENTINEL {
            return Ok(value);
        }

        match match_category(raw, &options.categories) {
            Some(category) => Ok(Value::String(category.to_string())),
            None => {
                log::debug!(
                    "[Classify] No category matched for \"{}\"; returning raw response",
                    step_name
                );
                Ok(Value::String(raw.trim().to_string()))
            }
        }
    }

    /// Ask the provider for a JSON object holding `options.fields`
    pub async fn extract(&self, step_name: &str, options: ExtractOptions) -> AgentResult<Value> {
        if options.fields.is_empty() {
            return Err(AgentError::Validation(format!(
                "Extract step \"{}\" requires at least one field",
                step_name
            )));
        }

        let step = StepOptions {
            question: build_extract_question(&options.input, &options.fields),
            expected_output: OutputFormat::Json,
            attachments: options.attachments,
            model: options.model,
            retries: options.retries,
            on_error: options.on_error,
            ..Default::default()
        };

        self.run_step(options.provider, step_name, step).await
    }
}
