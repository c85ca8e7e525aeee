use std::fmt;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use pancho_core::{ClientConfig, SignedEvent, SignerConfig, UnsignedEvent};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::Command;
use tracing::debug;

use crate::{ClientError, Result};

// ─── ConsentSigner ────────────────────────────────────────────────────────

/// An external agent holding the user's key, able to sign events on the
/// user's behalf after the user consents.
#[async_trait]
pub trait ConsentSigner: Send + Sync {
    /// Cheap check that the signer can be reached at all. A signer that
    /// reports `false` is treated exactly like an absent one.
    fn is_available(&self) -> bool;

    /// Hex public key of the identity this signer signs for.
    async fn public_key(&self) -> Result<String>;

    async fn sign_event(&self, event: &UnsignedEvent) -> Result<SignedEvent>;
}

// ─── ConsentMode ──────────────────────────────────────────────────────────

/// How approvals are authorized: by identifier alone, or with a pair of
/// externally signed events.
#[derive(Clone, Default)]
pub enum ConsentMode {
    #[default]
    Direct,
    ExternalSignature(Arc<dyn ConsentSigner>),
}

impl ConsentMode {
    /// `ExternalSignature` backed by a [`CommandSigner`] when the config names
    /// a signer, `Direct` otherwise.
    pub fn from_config(config: &ClientConfig) -> Self {
        match &config.signer {
            Some(signer) => {
                ConsentMode::ExternalSignature(Arc::new(CommandSigner::from_config(signer)))
            }
            None => ConsentMode::Direct,
        }
    }

    pub fn signer(&self) -> Option<&Arc<dyn ConsentSigner>> {
        match self {
            ConsentMode::Direct => None,
            ConsentMode::ExternalSignature(signer) => Some(signer),
        }
    }
}

impl fmt::Debug for ConsentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsentMode::Direct => f.write_str("Direct"),
            ConsentMode::ExternalSignature(_) => f.write_str("ExternalSignature(..)"),
        }
    }
}

// ─── CommandSigner ────────────────────────────────────────────────────────

/// A signer executable driven over stdin/stdout.
///
/// `<command> <args..> sign` receives one unsigned event as a JSON line on
/// stdin and prints the signed event as one JSON line. `<command> <args..>
/// pubkey` prints the public key. Stderr is captured and surfaced when the
/// process exits unsuccessfully.
#[derive(Debug, Clone)]
pub struct CommandSigner {
    command: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandSigner {
    pub fn new(command: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            command: command.into(),
            args,
            timeout,
        }
    }

    pub fn from_config(config: &SignerConfig) -> Self {
        Self::new(config.command.clone(), config.args.clone(), config.timeout())
    }

    fn resolve(&self) -> Option<PathBuf> {
        which::which(&self.command).ok()
    }

    /// Run one subcommand, optionally feeding a single JSON line on stdin,
    /// and return the first non-empty stdout line.
    async fn invoke(&self, subcommand: &str, input: Option<String>) -> Result<String> {
        let program = self.resolve().ok_or_else(|| {
            ClientError::CapabilityUnavailable(format!("'{}' not found on PATH", self.command))
        })?;

        let mut cmd = Command::new(program);
        cmd.args(&self.args)
            .arg(subcommand)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn()?;
        debug!(command = %self.command, subcommand, "signer spawned");

        let stderr_buf = Arc::new(Mutex::new(String::new()));
        let mut stderr_task = None;
        if let Some(stderr) = child.stderr.take() {
            let buf = Arc::clone(&stderr_buf);
            stderr_task = Some(tokio::spawn(async move {
                let mut reader = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = reader.next_line().await {
                    if let Ok(mut b) = buf.lock() {
                        if !b.is_empty() {
                            b.push('\n');
                        }
                        b.push_str(&line);
                    }
                }
            }));
        }

        if let Some(mut stdin) = child.stdin.take() {
            if let Some(mut line) = input {
                line.push('\n');
                // A signer that exits without reading reports through its
                // exit status instead.
                match stdin.write_all(line.as_bytes()).await {
                    Err(e) if e.kind() != std::io::ErrorKind::BrokenPipe => return Err(e.into()),
                    _ => {}
                }
            }
        }

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ClientError::Signer("stdout not captured".into()))?;

        let run = async {
            let mut lines = BufReader::new(stdout).lines();
            let mut answer = None;
            while let Some(line) = lines.next_line().await? {
                let trimmed = line.trim();
                if !trimmed.is_empty() && answer.is_none() {
                    answer = Some(trimmed.to_string());
                }
            }
            let status = child.wait().await?;
            if let Some(task) = stderr_task {
                let _ = task.await;
            }
            Ok::<_, std::io::Error>((status, answer))
        };

        let (status, answer) = tokio::time::timeout(self.timeout, run)
            .await
            .map_err(|_| {
                ClientError::Signer(format!(
                    "'{} {}' timed out after {}s",
                    self.command,
                    subcommand,
                    self.timeout.as_secs_f32()
                ))
            })??;

        if !status.success() {
            let stderr = stderr_buf.lock().map(|b| b.clone()).unwrap_or_default();
            let code = status
                .code()
                .map(|c| c.to_string())
                .unwrap_or_else(|| "signal".into());
            return Err(ClientError::Signer(if stderr.is_empty() {
                format!("'{} {}' exited with {code}", self.command, subcommand)
            } else {
                format!("'{} {}' exited with {code}: {stderr}", self.command, subcommand)
            }));
        }

        answer.ok_or_else(|| {
            ClientError::Signer(format!("'{} {}' produced no output", self.command, subcommand))
        })
    }
}

#[async_trait]
impl ConsentSigner for CommandSigner {
    fn is_available(&self) -> bool {
        self.resolve().is_some()
    }

    async fn public_key(&self) -> Result<String> {
        self.invoke("pubkey", None).await
    }

    async fn sign_event(&self, event: &UnsignedEvent) -> Result<SignedEvent> {
        let line = serde_json::to_string(event)
            .map_err(|e| ClientError::Signer(format!("failed to serialize event: {e}")))?;
        let out = self.invoke("sign", Some(line)).await?;
        serde_json::from_str(&out)
            .map_err(|e| ClientError::Signer(format!("signer returned an invalid event: {e}")))
    }
}
