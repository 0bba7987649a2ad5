//! Relay settings
//!
//! Settings live in a YAML file, by default `~/.config/sourcelink.yaml`.
//! The `SOURCELINK_CONFIG` environment variable points at a different file.
//! Missing keys fall back to defaults, and a missing file is created with the
//! defaults on first run.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::RelayError;

/// Environment variable overriding the settings file location
pub const CONFIG_ENV: &str = "SOURCELINK_CONFIG";

const CONFIG_FILE_NAME: &str = "sourcelink.yaml";

/// Largest response buffer a connection may allocate
pub const MAX_RESPONSE_BYTES_LIMIT: usize = i32::MAX as usize;

/// Port at which the `Host` header carries no port suffix
const DEFAULT_HTTP_PORT: u16 = 80;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Host name or IP address to listen on. Empty binds all interfaces.
    pub listen_address: Option<String>,

    /// TCP port to listen on
    pub listen_port: u16,

    /// Upper bound on the bytes relayed back for a single response
    pub max_response_bytes: usize,

    /// Value written into the `Cookie` header, cookies separated by `;`
    pub cookie_header_value: String,

    /// Upstream provider host
    pub upstream_host: String,

    /// Upstream provider port
    pub upstream_port: u16,

    /// How long the upstream may stay silent once it started answering
    pub response_idle_timeout_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            listen_address: None,
            listen_port: 7080,
            max_response_bytes: 1024 * 300,
            cookie_header_value: "_gitlab_session=".to_string(),
            upstream_host: "gitlab.local".to_string(),
            upstream_port: DEFAULT_HTTP_PORT,
            response_idle_timeout_ms: 250,
        }
    }
}

impl Settings {
    /// Load settings from the default location, writing defaults there if the
    /// file does not exist yet.
    pub fn load() -> anyhow::Result<Self> {
        let path = Self::config_path().context("could not determine home directory")?;
        Self::load_from(&path)
    }

    /// `$SOURCELINK_CONFIG`, or `~/.config/sourcelink.yaml`
    pub fn config_path() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            if !path.is_empty() {
                return Some(PathBuf::from(path));
            }
        }
        dirs::home_dir().map(|home| home.join(".config").join(CONFIG_FILE_NAME))
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let settings = match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_yaml(&contents)
                .with_context(|| format!("failed to parse settings file {}", path.display()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let settings = Self::default();
                settings.persist(path)?;
                tracing::info!(path = %path.display(), "Wrote default settings");
                settings
            }
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("failed to read settings file {}", path.display()));
            }
        };

        settings.validate()?;
        Ok(settings)
    }

    pub fn from_yaml(contents: &str) -> anyhow::Result<Self> {
        // An empty document deserializes to unit, not to a map.
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(contents)?)
    }

    pub fn persist(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)
            .with_context(|| format!("failed to write settings file {}", path.display()))?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), RelayError> {
        if self.max_response_bytes == 0 {
            return Err(RelayError::Config(
                "max_response_bytes must be greater than zero".to_string(),
            ));
        }
        if self.max_response_bytes > MAX_RESPONSE_BYTES_LIMIT {
            return Err(RelayError::Config(format!(
                "max_response_bytes must not exceed {}",
                MAX_RESPONSE_BYTES_LIMIT
            )));
        }
        if self.upstream_host.trim().is_empty() {
            return Err(RelayError::Config("upstream_host must not be empty".to_string()));
        }
        Ok(())
    }

    /// Address the listener binds to, all interfaces when unset
    pub fn listen_host(&self) -> &str {
        match self.listen_address.as_deref().map(str::trim) {
            Some(addr) if !addr.is_empty() => addr,
            _ => "0.0.0.0",
        }
    }

    /// `host:port` form of the listen address, for logs and errors
    pub fn listen_display(&self) -> String {
        format_host_port(self.listen_host(), self.listen_port)
    }

    /// `host:port` form of the upstream address
    pub fn upstream_display(&self) -> String {
        format_host_port(&self.upstream_host, self.upstream_port)
    }

    /// Value for the rewritten `Host` header
    pub fn host_header_value(&self) -> String {
        if self.upstream_port == DEFAULT_HTTP_PORT {
            self.upstream_host.clone()
        } else {
            format!("{}:{}", self.upstream_host, self.upstream_port)
        }
    }

    pub fn response_idle_timeout(&self) -> Duration {
        Duration::from_millis(self.response_idle_timeout_ms)
    }
}

/// `host:port`, with IPv6 literals bracketed
pub(crate) fn format_host_port(host: &str, port: u16) -> String {
    if host.contains(':') {
        format!("[{}]:{}", host, port)
    } else {
        format!("{}:{}", host, port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_header_omits_default_port() {
        let settings = Settings {
            upstream_host: "api.example.com".to_string(),
            ..Settings::default()
        };
        assert_eq!(settings.host_header_value(), "api.example.com");
    }

    #[test]
    fn host_header_includes_other_ports() {
        let settings = Settings {
            upstream_host: "api.example.com".to_string(),
            upstream_port: 8080,
            ..Settings::default()
        };
        assert_eq!(settings.host_header_value(), "api.example.com:8080");
    }

    #[test]
    fn empty_listen_address_binds_all_interfaces() {
        let mut settings = Settings::default();
        assert_eq!(settings.listen_host(), "0.0.0.0");

        settings.listen_address = Some("  ".to_string());
        assert_eq!(settings.listen_host(), "0.0.0.0");

        settings.listen_address = Some("127.0.0.1".to_string());
        assert_eq!(settings.listen_display(), "127.0.0.1:7080");
    }

    #[test]
    fn ipv6_addresses_are_bracketed() {
        let settings = Settings {
            listen_address: Some("::1".to_string()),
            ..Settings::default()
        };
        assert_eq!(settings.listen_display(), "[::1]:7080");
    }
}
