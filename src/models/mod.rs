// Shared data models for pipeline steps

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Value returned for steps whose retries ran out under `ErrorMode::Skip`
pub const SKIPPED_SENTINEL: &str = "__SKIPPED__";

/// Supported AI provider CLIs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Claude,
    Codex,
}

impl ProviderKind {
    /// Returns the string representation of this provider
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Claude => "claude",
            ProviderKind::Codex => "codex",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "claude" => Ok(ProviderKind::Claude),
            "codex" => Ok(ProviderKind::Codex),
            _ => Err(format!(
                "Invalid provider: '{}'. Expected 'claude' or 'codex'",
                s
            )),
        }
    }
}

/// Expected shape of a provider response
///
/// Drives both the prompt instructions and the response parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Array,
    Number,
    Boolean,
    Csv,
    Markdown,
    Code,
    Html,
    Xml,
    Yaml,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Text => "TEXT",
            OutputFormat::Json => "JSON",
            OutputFormat::Array => "ARRAY",
            OutputFormat::Number => "NUMBER",
            OutputFormat::Boolean => "BOOLEAN",
            OutputFormat::Csv => "CSV",
            OutputFormat::Markdown => "MARKDOWN",
            OutputFormat::Code => "CODE",
            OutputFormat::Html => "HTML",
            OutputFormat::Xml => "XML",
            OutputFormat::Yaml => "YAML",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "TEXT" => Ok(OutputFormat::Text),
            "JSON" => Ok(OutputFormat::Json),
            "ARRAY" => Ok(OutputFormat::Array),
            "NUMBER" => Ok(OutputFormat::Number),
            "BOOLEAN" => Ok(OutputFormat::Boolean),
            "CSV" => Ok(OutputFormat::Csv),
            "MARKDOWN" => Ok(OutputFormat::Markdown),
            "CODE" => Ok(OutputFormat::Code),
            "HTML" => Ok(OutputFormat::Html),
            "XML" => Ok(OutputFormat::Xml),
            "YAML" => Ok(OutputFormat::Yaml),
            _ => Err(format!("Invalid output format: '{}'", s)),
        }
    }
}

/// What to do once a step has exhausted its retries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ErrorMode {
    #[default]
    Throw,
    Skip,
    Fallback,
}

impl ErrorMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorMode::Throw => "throw",
            ErrorMode::Skip => "skip",
            ErrorMode::Fallback => "fallback",
        }
    }
}

impl std::str::FromStr for ErrorMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "throw" => Ok(ErrorMode::Throw),
            "skip" => Ok(ErrorMode::Skip),
            "fallback" => Ok(ErrorMode::Fallback),
            _ => Err(format!(
                "Invalid error mode: '{}'. Expected 'throw', 'skip' or 'fallback'",
                s
            )),
        }
    }
}

/// Speaker of a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A single turn stored in a conversation context
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextMessage {
    pub role: Role,
    pub content: String,
}

impl ContextMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Telemetry for one terminal outcome of a step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepRecord {
    pub step_name: String,
    pub provider: ProviderKind,
    pub question: String,
    pub format: OutputFormat,
    pub duration_ms: u64,
    pub cached: bool,
    pub retries_used: u32,
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Aggregate view over the step history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostReport {
    pub steps: usize,
    pub total_ms: u64,
    pub total_retries: u64,
    pub cache_hits: usize,
    pub errors: usize,
    pub history: Vec<StepRecord>,
}

/// Notification settings
///
/// Stored on the session only; nothing dispatches notifications yet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotifyConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(rename = "onError", alias = "on_error", default)]
    pub on_error: bool,
    #[serde(rename = "onComplete", alias = "on_complete", default)]
    pub on_complete: bool,
    #[serde(default)]
    pub transport: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_from_str_is_case_insensitive() {
        assert_eq!("Claude".parse::<ProviderKind>().unwrap(), ProviderKind::Claude);
        assert_eq!("CODEX".parse::<ProviderKind>().unwrap(), ProviderKind::Codex);
        assert!("gemini".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn test_output_format_round_trips_through_str() {
        for format in [
            OutputFormat::Text,
            OutputFormat::Json,
            OutputFormat::Csv,
            OutputFormat::Yaml,
        ] {
            assert_eq!(format.as_str().parse::<OutputFormat>().unwrap(), format);
        }
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
    }

    #[test]
    fn test_output_format_serializes_uppercase() {
        let json = serde_json::to_string(&OutputFormat::Boolean).unwrap();
        assert_eq!(json, "\"BOOLEAN\"");
    }

    #[test]
    fn test_step_record_serializes_camel_case() {
        let record = StepRecord {
            step_name: "s".to_string(),
            provider: ProviderKind::Codex,
            question: "q".to_string(),
            format: OutputFormat::Text,
            duration_ms: 12,
            cached: false,
            retries_used: 1,
            error: None,
            timestamp: Utc::now(),
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["stepName"], "s");
        assert_eq!(value["provider"], "codex");
        assert_eq!(value["durationMs"], 12);
        assert_eq!(value["retriesUsed"], 1);
    }
}
