//! Conversation contexts
//!
//! Named, append-only histories that prefix later prompts with prior turns.
//! Ids are chosen by the caller; reusing an id for an unrelated conversation
//! simply mixes the histories.

use crate::error::{AgentError, AgentResult};
use crate::models::ContextMessage;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Reply recorded after a framing system message
pub const SYSTEM_ACKNOWLEDGEMENT: &str = "Understood. I will follow these instructions.";

/// Operations accepted by `context(action, options)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextAction {
    Create,
    Append,
    Get,
    List,
    Clear,
    Delete,
}

/// Arguments for a context action
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContextOptions {
    #[serde(default)]
    pub id: Option<String>,
    /// Framing instructions recorded on `create`
    #[serde(default)]
    pub system: Option<String>,
    /// Message recorded on `append`
    #[serde(default)]
    pub message: Option<ContextMessage>,
}

/// Result of a context action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContextOutcome {
    Created(String),
    Appended,
    Messages(Vec<ContextMessage>),
    Ids(Vec<String>),
    Cleared(bool),
    Deleted(bool),
}

/// Owner of every conversation history in a session
#[derive(Debug, Default)]
pub struct ContextStore {
    contexts: HashMap<String, Vec<ContextMessage>>,
}

impl ContextStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a (possibly replacing) context, optionally framed by a system message
    pub fn create(&mut self, id: &str, system: Option<&str>) {
        let mut messages = Vec::new();
        if let Some(system) = system.filter(|s| !s.trim().is_empty()) {
            messages.push(ContextMessage::user(system));
            messages.push(ContextMessage::assistant(SYSTEM_ACKNOWLEDGEMENT));
        }
        self.contexts.insert(id.to_string(), messages);
    }

    /// Append a message, creating the context on first use
    pub fn append(&mut self, id: &str, message: ContextMessage) {
        self.contexts.entry(id.to_string()).or_default().push(message);
    }

    /// Record one completed question/answer exchange
    pub fn append_exchange(&mut self, id: &str, question: &str, answer: &str) {
        let messages = self.contexts.entry(id.to_string()).or_default();
        messages.push(ContextMessage::user(question));
        messages.push(ContextMessage::assistant(answer));
    }

    pub fn messages(&self, id: &str) -> Option<&[ContextMessage]> {
        self.contexts.get(id).map(Vec::as_slice)
    }

    /// Context ids in sorted order
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.contexts.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Empty a context but keep its id; false if unknown
    pub fn clear(&mut self, id: &str) -> bool {
        match self.contexts.get_mut(id) {
            Some(messages) => {
                messages.clear();
                true
            }
            None => false,
        }
    }

    pub fn delete(&mut self, id: &str) -> bool {
        self.contexts.remove(id).is_some()
    }

    /// Dispatch a string-named action
    pub fn apply(
        &mut self,
        action: ContextAction,
        options: ContextOptions,
    ) -> AgentResult<ContextOutcome> {
        if action == ContextAction::List {
            return Ok(ContextOutcome::Ids(self.ids()));
        }

        let id = options
            .id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| AgentError::Validation(format!("context {:?} requires an id", action)))?;

        match action {
            ContextAction::Create => {
                self.create(&id, options.system.as_deref());
                Ok(ContextOutcome::Created(id))
            }
            ContextAction::Append => {
                let message = options.message.ok_or_else(|| {
                    AgentError::Validation("context append requires a message".to_string())
                })?;
                self.append(&id, message);
                Ok(ContextOutcome::Appended)
            }
            ContextAction::Get => self
                .messages(&id)
                .map(|messages| ContextOutcome::Messages(messages.to_vec()))
                .ok_or_else(|| AgentError::Context(format!("Unknown context '{}'", id))),
            ContextAction::Clear => Ok(ContextOutcome::Cleared(self.clear(&id))),
            ContextAction::Delete => Ok(ContextOutcome::Deleted(self.delete(&id))),
            ContextAction::List => Ok(ContextOutcome::Ids(self.ids())),
        }
    }
}
