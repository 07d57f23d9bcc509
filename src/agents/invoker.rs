//! Provider invocation boundary
//!
//! The step executor only sees `ProviderInvoker`; `CliInvoker` is the real
//! implementation that runs the provider CLI and captures stdout.

use crate::agents::providers::get_provider;
use crate::error::{AgentError, AgentResult};
use crate::models::ProviderKind;
use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::time::{timeout, Duration};

/// Largest stdout accepted from a provider (10 MiB)
pub const MAX_OUTPUT_BYTES: usize = 10 * 1024 * 1024;

/// Everything needed for a single provider call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationRequest {
    pub provider: ProviderKind,
    pub prompt: String,
    pub attachments: Vec<String>,
    pub model: Option<String>,
    pub timeout_ms: u64,
}

/// Capability to send a prompt to a provider and get raw text back
#[async_trait]
pub trait ProviderInvoker: Send + Sync {
    async fn invoke(&self, request: &InvocationRequest) -> AgentResult<String>;
}

/// Keep only attachment paths that exist on disk
pub fn existing_attachments(attachments: &[String]) -> Vec<String> {
    attachments
        .iter()
        .filter(|path| {
            let exists = Path::new(path.as_str()).exists();
            if !exists {
                log::debug!("[CliInvoker] Dropping missing attachment: {}", path);
            }
            exists
        })
        .cloned()
        .collect()
}

/// Read until EOF or until `limit + 1` bytes arrived
///
/// A result longer than `limit` means the stream overflowed.
pub(crate) async fn read_capped<R>(reader: R, limit: usize) -> io::Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::new();
    reader.take(limit as u64 + 1).read_to_end(&mut buf).await?;
    Ok(buf)
}

fn kill_child(child: &mut Child, label: &str) {
    if let Err(e) = child.start_kill() {
        log::debug!("[CliInvoker] Could not kill {}: {}", label, e);
    }
}

/// Spawn `cmd` and collect its stdout, killing it on timeout or overflow
///
/// `cmd` must have piped stdout and stderr.
pub(crate) async fn run_capped(
    mut cmd: Command,
    label: &str,
    timeout_ms: u64,
    max_bytes: usize,
) -> AgentResult<String> {
    let mut child = cmd
        .spawn()
        .map_err(|e| AgentError::Provider(format!("Failed to spawn {}: {}", label, e)))?;
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| AgentError::Provider(format!("{} stdout is not piped", label)))?;
    let stderr_task = child
        .stderr
        .take()
        .map(|stderr| tokio::spawn(read_capped(stderr, max_bytes)));

    let finished = timeout(Duration::from_millis(timeout_ms), async {
        let stdout = read_capped(stdout, max_bytes).await.map_err(|e| {
            AgentError::Provider(format!("Failed to read {} output: {}", label, e))
        })?;
        if stdout.len() > max_bytes {
            return Err(AgentError::Provider(format!(
                "{} output exceeded {} bytes",
                label, max_bytes
            )));
        }
        let status = child
            .wait()
            .await
            .map_err(|e| AgentError::Provider(format!("Failed to wait for {}: {}", label, e)))?;
        Ok::<_, AgentError>((stdout, status))
    })
    .await;

    let (stdout, status) = match finished {
        Ok(Ok(done)) => done,
        Ok(Err(e)) => {
            kill_child(&mut child, label);
            return Err(e);
        }
        Err(_) => {
            kill_child(&mut child, label);
            return Err(AgentError::Provider(format!(
                "{} timed out after {}ms",
                label, timeout_ms
            )));
        }
    };

    if !status.success() {
        let stderr = match stderr_task {
            Some(task) => task.await.ok().and_then(|read| read.ok()).unwrap_or_default(),
            None => Vec::new(),
        };
        return Err(AgentError::Provider(format!(
            "{} failed ({}): {}",
            label,
            status,
            String::from_utf8_lossy(&stderr).trim()
        )));
    }

    Ok(String::from_utf8_lossy(&stdout).into_owned())
}

/// Runs the provider CLI as a subprocess
#[derive(Debug, Default, Clone, Copy)]
pub struct CliInvoker;

impl CliInvoker {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProviderInvoker for CliInvoker {
    async fn invoke(&self, request: &InvocationRequest) -> AgentResult<String> {
        let provider = get_provider(request.provider);
        let program = provider.resolve_program().unwrap_or_else(|| {
            log::warn!(
                "[CliInvoker] {} not found in install paths or PATH, trying bare name",
                request.provider
            );
            PathBuf::from(request.provider.as_str())
        });
        let attachments = existing_attachments(&request.attachments);
        let cmd = provider.build_command(
            &program,
            &request.prompt,
            &attachments,
            request.model.as_deref(),
        );

        log::info!(
            "[CliInvoker] Running {} ({} attachment(s), timeout {}ms)",
            program.display(),
            attachments.len(),
            request.timeout_ms
        );

        run_capped(cmd, request.provider.as_str(), request.timeout_ms, MAX_OUTPUT_BYTES).await
    }
}
