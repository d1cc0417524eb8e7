//! Engine configuration, read from a YAML file.
//!
//! Every field has a default, so a missing file or a partial one still
//! yields a runnable configuration.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context};
use control_actors::SaveMode;
use panel_protocol::DEFAULT_FIXTURE_COUNT;
use panel_transport::{ConnectOptions, DEFAULT_KEEP_ALIVE};
use serde::{Deserialize, Serialize};

/// Which session implementation the URL scheme selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionKind {
    Broker,
    Bridge,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PanelConfig {
    pub broker: BrokerConfig,
    /// Topic every fixture command is published on.
    pub topic: String,
    pub save_mode: SaveMode,
    /// How many fixtures to provision at startup.
    pub fixtures: u16,
    /// Preset file to load; the built-in table applies when absent.
    pub presets_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BrokerConfig {
    pub url: String,
    pub client_id: String,
    pub keep_alive_secs: u64,
    /// Abort a connect attempt after this long; absent waits indefinitely.
    pub connect_timeout_ms: Option<u64>,
}

impl Default for PanelConfig {
    fn default() -> Self {
        PanelConfig {
            broker: BrokerConfig::default(),
            topic: "lights/control".to_string(),
            save_mode: SaveMode::default(),
            fixtures: DEFAULT_FIXTURE_COUNT,
            presets_file: None,
        }
    }
}

impl Default for BrokerConfig {
    fn default() -> Self {
        BrokerConfig {
            url: "mqtt://localhost:1883".to_string(),
            client_id: "panel".to_string(),
            keep_alive_secs: DEFAULT_KEEP_ALIVE.as_secs(),
            connect_timeout_ms: Some(5_000),
        }
    }
}

impl BrokerConfig {
    pub fn connect_options(&self) -> ConnectOptions {
        let mut options = ConnectOptions::new(self.url.clone());
        options.client_id = self.client_id.clone();
        options.keep_alive = Duration::from_secs(self.keep_alive_secs);
        options.connect_timeout = self.connect_timeout_ms.map(Duration::from_millis);
        options
    }
}

impl PanelConfig {
    /// Read the configuration file, falling back to defaults when it does
    /// not exist.
    pub fn load(path: &Path) -> anyhow::Result<PanelConfig> {
        if !path.exists() {
            return Ok(PanelConfig::default());
        }
        let text = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let config: PanelConfig = serde_yaml::from_str(&text)
            .with_context(|| format!("parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Replace the broker URL from the command line and re-check the
    /// resulting configuration.
    pub fn override_url(&mut self, url: &str) -> anyhow::Result<()> {
        self.broker.url = url.to_string();
        self.validate()
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.broker.url.trim().is_empty() {
            bail!("broker.url must not be empty");
        }
        self.session_kind()?;
        if self.fixtures == 0 {
            bail!("fixtures must be at least 1");
        }
        if self.broker.keep_alive_secs == 0 {
            bail!("broker.keepAliveSecs must be at least 1");
        }
        Ok(())
    }

    /// Pick the session implementation from the URL scheme.
    pub fn session_kind(&self) -> anyhow::Result<SessionKind> {
        let url = self.broker.url.trim();
        if url.starts_with("mqtt://") || url.starts_with("tcp://") {
            Ok(SessionKind::Broker)
        } else if url.starts_with("http://") || url.starts_with("https://") {
            Ok(SessionKind::Bridge)
        } else {
            bail!(
                "unsupported URL scheme in '{url}'; expected mqtt://, tcp://, http:// or https://"
            )
        }
    }
}
