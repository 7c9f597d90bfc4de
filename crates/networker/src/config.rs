use std::{fs, path::Path, time::Duration};

use serde::Deserialize;

use crate::error::{NetError, Result};

pub const DEFAULT_CONFIG_FILE: &str = "networker.toml";

/// Pool shape and transport settings. Read once when the pool is built and
/// never changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetConfig {
    pub worker_count: usize,
    /// Workers `0..interactive_workers` serve interactive traffic; the rest
    /// serve background traffic.
    pub interactive_workers: usize,
    pub idle_wait: Duration,
    pub user_agent: String,
    pub default_host: Option<String>,
    pub request_timeout: Option<Duration>,
    pub accept_invalid_certs: bool,
}

impl Default for NetConfig {
    fn default() -> Self {
        Self {
            worker_count: 8,
            interactive_workers: 4,
            idle_wait: Duration::from_millis(100),
            user_agent: concat!("networker/", env!("CARGO_PKG_VERSION")).to_string(),
            default_host: None,
            request_timeout: Some(Duration::from_secs(30)),
            accept_invalid_certs: false,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    worker_count: Option<usize>,
    interactive_workers: Option<usize>,
    idle_wait_ms: Option<u64>,
    user_agent: Option<String>,
    default_host: Option<String>,
    request_timeout_secs: Option<u64>,
    accept_invalid_certs: Option<bool>,
}

impl NetConfig {
    pub fn background_workers(&self) -> usize {
        self.worker_count.saturating_sub(self.interactive_workers)
    }

    pub fn validate(&self) -> Result<()> {
        if self.interactive_workers == 0 {
            return Err(NetError::InvalidConfig(
                "at least one interactive worker is required".into(),
            ));
        }
        if self.background_workers() == 0 {
            return Err(NetError::InvalidConfig(format!(
                "worker_count ({}) must exceed interactive_workers ({})",
                self.worker_count, self.interactive_workers
            )));
        }
        if self.idle_wait.is_zero() {
            return Err(NetError::InvalidConfig("idle_wait must be non-zero".into()));
        }
        Ok(())
    }

    /// Overlay values from TOML text.
    pub fn apply_toml(&mut self, raw: &str) -> Result<()> {
        let file: FileConfig = toml::from_str(raw)
            .map_err(|err| NetError::InvalidConfig(format!("malformed config: {err}")))?;

        if let Some(v) = file.worker_count {
            self.worker_count = v;
        }
        if let Some(v) = file.interactive_workers {
            self.interactive_workers = v;
        }
        if let Some(v) = file.idle_wait_ms {
            self.idle_wait = Duration::from_millis(v);
        }
        if let Some(v) = file.user_agent {
            self.user_agent = v;
        }
        if let Some(v) = file.default_host {
            self.default_host = Some(v);
        }
        if let Some(v) = file.request_timeout_secs {
            self.request_timeout = (v > 0).then(|| Duration::from_secs(v));
        }
        if let Some(v) = file.accept_invalid_certs {
            self.accept_invalid_certs = v;
        }
        Ok(())
    }

    /// Overlay `APP__NET_*` variables. Unparseable numbers are ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("APP__NET_WORKERS").and_then(|v| v.parse().ok()) {
            self.worker_count = v;
        }
        if let Some(v) = lookup("APP__NET_INTERACTIVE_WORKERS").and_then(|v| v.parse().ok()) {
            self.interactive_workers = v;
        }
        if let Some(v) = lookup("APP__NET_IDLE_WAIT_MS").and_then(|v| v.parse().ok()) {
            self.idle_wait = Duration::from_millis(v);
        }
        if let Some(v) = lookup("APP__NET_USER_AGENT") {
            self.user_agent = v;
        }
        if let Some(v) = lookup("APP__NET_DEFAULT_HOST") {
            self.default_host = (!v.is_empty()).then_some(v);
        }
        if let Some(v) = lookup("APP__NET_TIMEOUT_SECS").and_then(|v| v.parse::<u64>().ok()) {
            self.request_timeout = (v > 0).then(|| Duration::from_secs(v));
        }
        if let Some(v) = lookup("APP__NET_ACCEPT_INVALID_CERTS").and_then(|v| v.parse().ok()) {
            self.accept_invalid_certs = v;
        }
    }
}

/// Defaults, then the config file, then the environment.
///
/// An explicit `path` must be readable; without one, `networker.toml` in the
/// working directory is used when present.
pub fn load_config(path: Option<&Path>) -> Result<NetConfig> {
    let mut config = NetConfig::default();

    match path {
        Some(path) => {
            let raw = fs::read_to_string(path).map_err(|err| {
                NetError::InvalidConfig(format!("cannot read '{}': {err}", path.display()))
            })?;
            config.apply_toml(&raw)?;
        }
        None => {
            if let Ok(raw) = fs::read_to_string(DEFAULT_CONFIG_FILE) {
                config.apply_toml(&raw)?;
            }
        }
    }

    config.apply_env(|key| std::env::var(key).ok());
    config.validate()?;
    Ok(config)
}
