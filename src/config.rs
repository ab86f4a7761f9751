use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("BOT_TOKEN missing: set it in the environment, a .env file, or [telegram] bot_token")]
    MissingToken,
    #[error("invalid PORT value {0:?}")]
    InvalidPort(String),
    #[error("failed to read config file {path}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub keep_alive: KeepAliveConfig,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: String,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct KeepAliveConfig {
    /// Public URL of this service. Pings are skipped when unset.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    #[serde(default = "default_pings")]
    pub pings: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for KeepAliveConfig {
    fn default() -> Self {
        Self {
            url: None,
            interval_secs: default_interval_secs(),
            pings: default_pings(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_port() -> u16 {
    3000
}

fn default_interval_secs() -> u64 {
    10
}

fn default_pings() -> u32 {
    10
}

fn default_timeout_secs() -> u64 {
    10
}

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

impl Config {
    /// Load from a TOML file, then apply environment overrides.
    ///
    /// An explicit `path` must exist. Without one, `config.toml` is read if
    /// present and otherwise the environment alone is used.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let default_path = Path::new(DEFAULT_CONFIG_PATH);
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None if default_path.exists() => Self::from_file(default_path)?,
            None => Config::empty(),
        };

        config.with_overrides(|key| std::env::var(key).ok())
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    fn empty() -> Self {
        Self {
            telegram: TelegramConfig::default(),
            server: ServerConfig::default(),
            keep_alive: KeepAliveConfig::default(),
        }
    }

    /// Apply overrides from `lookup` (the process environment in production)
    /// and check that the result is usable.
    fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(token) = non_empty("BOT_TOKEN") {
            self.telegram.bot_token = token;
        }

        if let Some(port) = non_empty("PORT") {
            self.server.port = port
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidPort(port.clone()))?;
        }

        if let Some(url) = non_empty("KEEP_ALIVE_URL").or_else(|| non_empty("RENDER_EXTERNAL_URL")) {
            self.keep_alive.url = Some(url);
        }

        if self.telegram.bot_token.trim().is_empty() {
            return Err(ConfigError::MissingToken);
        }

        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_with_token_from_env() {
        let config = Config::empty()
            .with_overrides(env(&[("BOT_TOKEN", "123:abc")]))
            .unwrap();

        assert_eq!(config.telegram.bot_token, "123:abc");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.keep_alive.url, None);
        assert_eq!(config.keep_alive.interval_secs, 10);
        assert_eq!(config.keep_alive.pings, 10);
    }

    #[test]
    fn test_missing_token_is_fatal() {
        let err = Config::empty().with_overrides(env(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingToken));

        let err = Config::empty()
            .with_overrides(env(&[("BOT_TOKEN", "  ")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingToken));
    }

    #[test]
    fn test_invalid_port() {
        let err = Config::empty()
            .with_overrides(env(&[("BOT_TOKEN", "t"), ("PORT", "eighty")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPort(ref p) if p == "eighty"));
    }

    #[test]
    fn test_env_overrides_file() {
        let file: Config = toml::from_str(
            r#"
[telegram]
bot_token = "from-file"

[server]
port = 8080

[keep_alive]
url = "https://file.example.com/"
pings = 3
"#,
        )
        .unwrap();

        let config = file
            .with_overrides(env(&[
                ("PORT", "9090"),
                ("RENDER_EXTERNAL_URL", "https://render.example.com/"),
            ]))
            .unwrap();

        assert_eq!(config.telegram.bot_token, "from-file");
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.keep_alive.url.as_deref(), Some("https://render.example.com/"));
        assert_eq!(config.keep_alive.pings, 3);
        assert_eq!(config.keep_alive.interval_secs, 10);
    }

    #[test]
    fn test_keep_alive_url_prefers_explicit_variable() {
        let config = Config::empty()
            .with_overrides(env(&[
                ("BOT_TOKEN", "t"),
                ("KEEP_ALIVE_URL", "https://explicit.example.com/"),
                ("RENDER_EXTERNAL_URL", "https://render.example.com/"),
            ]))
            .unwrap();
        assert_eq!(config.keep_alive.url.as_deref(), Some("https://explicit.example.com/"));
    }

    #[test]
    fn test_load_explicit_missing_file_is_an_error() {
        let path = Path::new("/nonexistent/findid-bot/config.toml");
        let err = Config::load(Some(path)).unwrap_err();
        match err {
            ConfigError::Read { path, source } => {
                assert_eq!(path, "/nonexistent/findid-bot/config.toml");
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_load_without_path_tolerates_missing_default() {
        // No config.toml lives in the crate root, so only the environment
        // is consulted and the outcome depends on BOT_TOKEN alone.
        match Config::load(None) {
            Ok(_) | Err(ConfigError::MissingToken) => {}
            Err(e) => panic!("unexpected error: {e}"),
        }
    }
}
