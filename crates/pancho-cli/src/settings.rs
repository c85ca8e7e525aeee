use anyhow::Context;
use pancho_core::config::DEFAULT_CONFIG_FILE;
use pancho_core::ClientConfig;
use std::path::{Path, PathBuf};

/// Command-line values that win over the config file.
#[derive(Debug, Default)]
pub struct Overrides {
    pub base_url: Option<String>,
    pub session: Option<String>,
}

impl Overrides {
    pub fn apply(&self, config: &mut ClientConfig) {
        if let Some(url) = &self.base_url {
            config.base_url = url.clone();
        }
        if let Some(session) = &self.session {
            config.session_id = Some(session.clone());
        }
    }
}

/// Resolve the config file path.
///
/// Priority:
/// 1. `--config` flag / `PANCHO_CONFIG` env var (passed in as `explicit`)
/// 2. `pancho.yaml` in the current directory
pub fn config_path(explicit: Option<&Path>) -> PathBuf {
    match explicit {
        Some(p) => p.to_path_buf(),
        None => PathBuf::from(DEFAULT_CONFIG_FILE),
    }
}

/// Load the config (defaults when the file is missing) and apply overrides.
pub fn resolve(path: &Path, overrides: &Overrides) -> anyhow::Result<ClientConfig> {
    let mut config = ClientConfig::load_or_default(path)
        .with_context(|| format!("failed to load config from {}", path.display()))?;
    overrides.apply(&mut config);
    Ok(config)
}
