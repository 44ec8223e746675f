//! Gateway configuration, loaded from defaults, code, or environment.

use chatgate_channel::{default_channels, ChannelConfig};
use chatgate_protocol::DEFAULT_MAX_LINE_LEN;
use serde::{Deserialize, Serialize};

/// Everything the gateway needs to know at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listen host.
    pub host: String,
    /// Listen port.
    pub port: u16,
    /// Name the gateway uses as the source of its own replies.
    pub server_name: String,
    /// Echo every received line at `info` and lower the default log level.
    pub debug: bool,
    /// Message-of-the-day lines sent after login.
    pub motd: Vec<String>,
    /// Longest accepted line, in bytes, before the terminator.
    pub max_line_len: usize,
    /// Channels registered at startup.
    pub channels: Vec<ChannelConfig>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 6667,
            server_name: "chatgate".to_string(),
            debug: false,
            motd: vec!["- Visit localhost".to_string()],
            max_line_len: DEFAULT_MAX_LINE_LEN,
            channels: default_channels(),
        }
    }
}

/// A configuration value that is present but unusable.
#[derive(Debug, thiserror::Error)]
#[error("invalid value {value:?} for {key}: {reason}")]
pub struct ConfigError {
    pub key: &'static str,
    pub value: String,
    pub reason: String,
}

impl GatewayConfig {
    /// Loads configuration from `CHATGATE_*` environment variables.
    ///
    /// Missing variables fall back to the defaults; a variable that is set
    /// but can't be parsed is an error.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env), reading from `lookup`.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(host) = lookup("CHATGATE_HOST").filter(|s| !s.is_empty()) {
            config.host = host;
        }
        if let Some(port) = lookup("CHATGATE_PORT") {
            config.port = parse("CHATGATE_PORT", &port)?;
        }
        if let Some(name) = lookup("CHATGATE_SERVER_NAME").filter(|s| !s.is_empty()) {
            config.server_name = name;
        }
        if let Some(flag) = lookup("CHATGATE_DEBUG") {
            config.debug = parse_flag("CHATGATE_DEBUG", &flag)?;
        }
        if let Some(motd) = lookup("CHATGATE_MOTD") {
            config.motd = motd.split('|').map(str::to_string).collect();
        }
        if let Some(len) = lookup("CHATGATE_MAX_LINE_LEN") {
            config.max_line_len = parse("CHATGATE_MAX_LINE_LEN", &len)?;
            if config.max_line_len == 0 {
                return Err(ConfigError {
                    key: "CHATGATE_MAX_LINE_LEN",
                    value: len,
                    reason: "must be greater than zero".to_string(),
                });
            }
        }
        Ok(config)
    }

    /// `host:port`, ready for binding.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse<T>(key: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError {
        key,
        value: value.to_string(),
        reason: e.to_string(),
    })
}

fn parse_flag(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError {
            key,
            value: value.to_string(),
            reason: "expected a boolean flag".to_string(),
        }),
    }
}
