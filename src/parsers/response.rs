// Response parser - turns raw provider text into typed values

use crate::error::{AgentError, AgentResult};
use crate::models::OutputFormat;
use crate::parsers::csv::parse_csv;
use crate::utils::truncate_chars;
use regex::Regex;
use serde_json::{Number, Value};
use std::sync::OnceLock;

/// Characters of unparsable text kept in a parse error
pub const PARSE_SNIPPET_CHARS: usize = 100;

static FENCE_REGEX: OnceLock<Regex> = OnceLock::new();
static NUMBER_REGEX: OnceLock<Regex> = OnceLock::new();
static EMBEDDED_JSON_REGEX: OnceLock<Regex> = OnceLock::new();
static EMBEDDED_ARRAY_REGEX: OnceLock<Regex> = OnceLock::new();

fn fence_regex() -> &'static Regex {
    // Either a language tag followed by a newline, or no tag at all
    FENCE_REGEX.get_or_init(|| Regex::new(r"^```(?:\w+[ \t]*\r?\n|\s*)([\s\S]*?)\s*```$").unwrap())
}

fn number_regex() -> &'static Regex {
    NUMBER_REGEX.get_or_init(|| Regex::new(r"-?\d+(?:\.\d+)?").unwrap())
}

fn embedded_json_regex() -> &'static Regex {
    EMBEDDED_JSON_REGEX.get_or_init(|| Regex::new(r"(?s)(\{.*\}|\[.*\])").unwrap())
}

fn embedded_array_regex() -> &'static Regex {
    EMBEDDED_ARRAY_REGEX.get_or_init(|| Regex::new(r"(?s)\[.*\]").unwrap())
}

/// Remove one pair of triple-backtick fences wrapping the whole response
pub fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    match fence_regex().captures(trimmed).and_then(|caps| caps.get(1)) {
        Some(inner) => inner.as_str().trim(),
        None => trimmed,
    }
}

/// Parse a raw provider response according to `format`
pub fn parse_response(raw: &str, format: OutputFormat) -> AgentResult<Value> {
    let cleaned = strip_code_fences(raw);

    match format {
        OutputFormat::Text
        | OutputFormat::Markdown
        | OutputFormat::Code
        | OutputFormat::Html
        | OutputFormat::Xml
        | OutputFormat::Yaml => Ok(Value::String(cleaned.to_string())),
        OutputFormat::Number => parse_number(cleaned),
        OutputFormat::Boolean => parse_boolean(cleaned),
        OutputFormat::Json => parse_json(cleaned),
        OutputFormat::Array => parse_array(cleaned),
        OutputFormat::Csv => Ok(csv_to_value(cleaned)),
    }
}

fn parse_error(message: &str, text: &str) -> AgentError {
    AgentError::Parse {
        message: message.to_string(),
        snippet: truncate_chars(text, PARSE_SNIPPET_CHARS).to_string(),
    }
}

fn parse_number(text: &str) -> AgentResult<Value> {
    let matched = number_regex()
        .find(text)
        .map(|m| m.as_str())
        .ok_or_else(|| parse_error("No number found in response", text))?;

    if !matched.contains('.') {
        if let Ok(int) = matched.parse::<i64>() {
            return Ok(Value::Number(int.into()));
        }
    }

    matched
        .parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .ok_or_else(|| parse_error("Response is not a valid number", text))
}

fn parse_boolean(text: &str) -> AgentResult<Value> {
    match text.to_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(Value::Bool(true)),
        "false" | "no" | "0" => Ok(Value::Bool(false)),
        _ => Err(parse_error("Response is not a boolean", text)),
    }
}

fn parse_json(text: &str) -> AgentResult<Value> {
    if let Ok(value) = serde_json::from_str::<Value>(text) {
        return Ok(value);
    }

    // Providers often wrap the payload in prose; take the outermost object or array
    embedded_json_regex()
        .find(text)
        .and_then(|m| serde_json::from_str::<Value>(m.as_str()).ok())
        .ok_or_else(|| parse_error("Response is not valid JSON", text))
}

fn parse_array(text: &str) -> AgentResult<Value> {
    let parsed = match serde_json::from_str::<Value>(text) {
        Ok(value) => value,
        Err(_) => embedded_array_regex()
            .find(text)
            .and_then(|m| serde_json::from_str::<Value>(m.as_str()).ok())
            .ok_or_else(|| parse_error("Response is not a valid JSON array", text))?,
    };

    if parsed.is_array() {
        Ok(parsed)
    } else {
        Err(parse_error("Response is not a JSON array", text))
    }
}

fn csv_to_value(text: &str) -> Value {
    Value::Array(
        parse_csv(text)
            .into_iter()
            .map(|row| Value::Array(row.into_iter().map(Value::String).collect()))
            .collect(),
    )
}
