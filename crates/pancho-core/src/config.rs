use crate::error::{CoreError, Result};
use crate::types::OnMiss;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "pancho.yaml";

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// SignerConfig
// ---------------------------------------------------------------------------

/// External signer executable used for signed approvals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignerConfig {
    pub command: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    #[serde(default = "default_signer_timeout")]
    pub timeout_secs: u64,
}

fn default_signer_timeout() -> u64 {
    120
}

impl SignerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// ---------------------------------------------------------------------------
// ClientConfig (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Opaque session identity sent as `x-session-id`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_ms: u64,
    #[serde(default = "default_refresh_concurrency")]
    pub refresh_concurrency: usize,
    #[serde(default)]
    pub strict_transitions: bool,
    #[serde(default = "default_verify_hash")]
    pub verify_action_hash: bool,
    #[serde(default)]
    pub unknown_action_policy: OnMiss,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signer: Option<SignerConfig>,
}

fn default_base_url() -> String {
    "http://127.0.0.1:8787".to_string()
}

fn default_request_timeout() -> u64 {
    10
}

fn default_refresh_interval() -> u64 {
    1000
}

fn default_refresh_concurrency() -> usize {
    1
}

fn default_verify_hash() -> bool {
    true
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            session_id: None,
            request_timeout_secs: default_request_timeout(),
            refresh_interval_ms: default_refresh_interval(),
            refresh_concurrency: default_refresh_concurrency(),
            strict_transitions: false,
            verify_action_hash: default_verify_hash(),
            unknown_action_policy: OnMiss::default(),
            signer: None,
        }
    }
}

impl ClientConfig {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound(path.display().to_string()));
        }
        let data = std::fs::read_to_string(path)?;
        let cfg: ClientConfig = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    /// Like [`ClientConfig::load`], but a missing file yields the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Err(CoreError::ConfigNotFound(_)) => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                Ok(Self::default())
            }
            other => other,
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(path, data.as_bytes())
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!(
                    "base_url '{}' must start with http:// or https://",
                    self.base_url
                ),
            });
        }

        if self.request_timeout_secs == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "request_timeout_secs must be greater than 0".to_string(),
            });
        }

        if self.refresh_interval_ms == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "refresh_interval_ms must be greater than 0".to_string(),
            });
        } else if self.refresh_interval_ms < 250 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "refresh_interval_ms={} (<250 polls the service very aggressively)",
                    self.refresh_interval_ms
                ),
            });
        }

        if self.refresh_concurrency == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "refresh_concurrency must be at least 1".to_string(),
            });
        }

        if let Some(signer) = &self.signer {
            if signer.command.trim().is_empty() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: "signer has an empty command".to_string(),
                });
            }
            if signer.timeout_secs == 0 {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: "signer.timeout_secs=0 leaves no time for a human to consent"
                        .to_string(),
                });
            }
        }

        if self.strict_transitions && self.unknown_action_policy == OnMiss::Append {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "unknown_action_policy=append with strict_transitions may track \
                          actions this session never proposed"
                    .to_string(),
            });
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
