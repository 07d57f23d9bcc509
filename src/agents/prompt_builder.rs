//! Prompt Builder - Appends format instructions to a step's question
//!
//! Every attempt gets the format's instruction suffix. Retries add a stricter
//! "CRITICAL" sentence for the machine-readable formats; the wording does not
//! escalate further after the first retry.

use crate::models::{ContextMessage, OutputFormat, Role};

/// Instruction appended on every attempt
pub fn format_instruction(format: OutputFormat) -> &'static str {
    match format {
        OutputFormat::Text => "",
        OutputFormat::Json => {
            "\n\nRespond ONLY with valid JSON. No markdown, no code fences, no explanation."
        }
        OutputFormat::Array => {
            "\n\nRespond ONLY with a valid JSON array. No markdown, no code fences, no explanation."
        }
        OutputFormat::Number => "\n\nRespond ONLY with a single number. No units, no explanation.",
        OutputFormat::Boolean => "\n\nRespond ONLY with true or false. No explanation.",
        OutputFormat::Csv => {
            "\n\nRespond ONLY with CSV data, one row per line, comma-separated. No code fences, no explanation."
        }
        OutputFormat::Markdown => "\n\nFormat your response as Markdown.",
        OutputFormat::Code => "\n\nRespond ONLY with code. No explanation.",
        OutputFormat::Html => "\n\nRespond ONLY with HTML. No explanation.",
        OutputFormat::Xml => "\n\nRespond ONLY with valid XML. No explanation.",
        OutputFormat::Yaml => "\n\nRespond ONLY with valid YAML. No explanation.",
    }
}

/// Extra instruction appended on retries, for formats the parser can reject
pub fn retry_instruction(format: OutputFormat) -> Option<&'static str> {
    match format {
        OutputFormat::Json => Some(
            "\n\nCRITICAL: Your previous response could not be parsed. Your response MUST start with { or [ and contain nothing but valid JSON.",
        ),
        OutputFormat::Array => Some(
            "\n\nCRITICAL: Your previous response could not be parsed. Your response MUST start with [ and end with ] and contain nothing else.",
        ),
        OutputFormat::Boolean => Some(
            "\n\nCRITICAL: Your previous response could not be parsed. Reply with exactly one word: true or false.",
        ),
        OutputFormat::Number => Some(
            "\n\nCRITICAL: Your previous response could not be parsed. Reply with a single number and nothing else.",
        ),
        OutputFormat::Csv => Some(
            "\n\nCRITICAL: Your previous response could not be parsed. Reply with raw CSV rows only.",
        ),
        _ => None,
    }
}

/// Build the prompt for one attempt of a step
pub fn build_prompt(question: &str, format: OutputFormat, retry_attempt: u32) -> String {
    let mut prompt = String::with_capacity(question.len() + 256);
    prompt.push_str(question);
    prompt.push_str(format_instruction(format));

    if retry_attempt > 0 {
        if let Some(critical) = retry_instruction(format) {
            prompt.push_str(critical);
        }
    }

    prompt
}

/// Render prior turns as a transcript that the next prompt continues
///
/// Returns an empty string when there is no history.
pub fn render_context_prefix(messages: &[ContextMessage]) -> String {
    if messages.is_empty() {
        return String::new();
    }

    let mut prefix = String::new();
    for message in messages {
        let speaker = match message.role {
            Role::User => "User",
            Role::Assistant => "Assistant",
        };
        prefix.push_str(speaker);
        prefix.push_str(": ");
        prefix.push_str(&message.content);
        prefix.push('\n');
    }
    prefix.push_str("\nUser: ");

    prefix
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_prompt_is_question_verbatim() {
        assert_eq!(build_prompt("Hello?", OutputFormat::Text, 0), "Hello?");
        assert_eq!(build_prompt("Hello?", OutputFormat::Text, 3), "Hello?");
    }

    #[test]
    fn test_json_first_attempt_has_no_critical() {
        let prompt = build_prompt("List users", OutputFormat::Json, 0);
        assert!(prompt.starts_with("List users"));
        assert!(prompt.contains("valid JSON"));
        assert!(!prompt.contains("CRITICAL"));
    }

    #[test]
    fn test_retry_adds_critical_once() {
        let prompt = build_prompt("List users", OutputFormat::Json, 1);
        assert!(prompt.contains("CRITICAL"));
        assert!(prompt.contains("MUST start with { or ["));
        assert_eq!(prompt.matches("CRITICAL").count(), 1);
    }

    #[test]
    fn test_later_retries_repeat_first_retry_wording() {
        assert_eq!(
            build_prompt("q", OutputFormat::Number, 1),
            build_prompt("q", OutputFormat::Number, 4)
        );
    }

    #[test]
    fn test_markdown_retry_not_escalated() {
        assert!(!build_prompt("q", OutputFormat::Markdown, 2).contains("CRITICAL"));
    }

    #[test]
    fn test_context_prefix_rendering() {
        let messages = vec![
            ContextMessage::user("Hi"),
            ContextMessage::assistant("Hello!"),
        ];
        assert_eq!(
            render_context_prefix(&messages),
            "User: Hi\nAssistant: Hello!\n\nUser: "
        );
        assert_eq!(render_context_prefix(&[]), "");
    }
}
