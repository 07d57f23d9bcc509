// Error taxonomy for pipeline steps

use thiserror::Error;

/// Errors surfaced by the agent pipeline.
///
/// `Provider` and `Parse` are transient inside the retry loop and only escape
/// wrapped in `Exhausted`. `Validation` always escapes, whatever the error mode.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Parse error: {message} (response: \"{snippet}\")")]
    Parse { message: String, snippet: String },

    #[error("Guard failed: {}", violations.join("; "))]
    Guard { violations: Vec<String> },

    #[error("[{provider}] step \"{step}\" failed after {attempts} attempt(s): {last_error}")]
    Exhausted {
        provider: String,
        step: String,
        attempts: u32,
        last_error: String,
    },

    #[error("Template error: {0}")]
    Template(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Context error: {0}")]
    Context(String),
}

pub type AgentResult<T> = Result<T, AgentError>;
