// Scripted provider used by the integration tests

#![allow(dead_code)]

use agent_pipeline::agents::{InvocationRequest, ManualClock, ProviderInvoker};
use agent_pipeline::{AgentError, AgentResult, AgentSession, ProviderKind};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

/// Replays queued responses per provider and records every request
#[derive(Default)]
pub struct ScriptedInvoker {
    scripts: Mutex<HashMap<ProviderKind, VecDeque<Result<String, String>>>>,
    calls: Mutex<Vec<InvocationRequest>>,
}

impl ScriptedInvoker {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, provider: ProviderKind, text: &str) {
        self.push(provider, Ok(text.to_string()));
    }

    pub fn fail(&self, provider: ProviderKind, message: &str) {
        self.push(provider, Err(message.to_string()));
    }

    fn push(&self, provider: ProviderKind, outcome: Result<String, String>) {
        self.scripts
            .lock()
            .unwrap()
            .entry(provider)
            .or_default()
            .push_back(outcome);
    }

    pub fn calls(&self) -> Vec<InvocationRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, provider: ProviderKind) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.provider == provider)
            .count()
    }
}

#[async_trait]
impl ProviderInvoker for ScriptedInvoker {
    async fn invoke(&self, request: &InvocationRequest) -> AgentResult<String> {
        self.calls.lock().unwrap().push(request.clone());
        let next = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(&request.provider)
            .and_then(VecDeque::pop_front);

        match next {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(AgentError::Provider(message)),
            None => Err(AgentError::Provider(format!(
                "{} has no scripted response",
                request.provider
            ))),
        }
    }
}

/// Session wired to a scripted provider and a manual clock
pub fn scripted_session() -> (AgentSession, Arc<ScriptedInvoker>, Arc<ManualClock>) {
    let invoker = ScriptedInvoker::new();
    let clock = Arc::new(ManualClock::new());
    let session = AgentSession::new()
        .with_invoker(invoker.clone())
        .with_clock(clock.clone());
    (session, invoker, clock)
}
