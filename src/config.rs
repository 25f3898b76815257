use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Default API base when nothing is configured.
const DEFAULT_API_BASE: &str = "http://localhost:8000";

/// Default fixed delay between status-stream reconnection attempts.
const DEFAULT_RECONNECT_DELAY_MS: u64 = 5000;

/// Runtime configuration for the restyle client.
///
/// Values are resolved in precedence order: CLI flags, then environment
/// (`RESTYLE_API_BASE`, `RESTYLE_WS_URL`), then an optional `restyle.toml`
/// file, then defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the design API, without a trailing slash.
    pub api_base: String,
    /// Statically configured status-stream base URL. When set, endpoint
    /// discovery is skipped entirely.
    pub ws_base: Option<String>,
    /// Fixed delay between reconnection attempts on the status stream.
    pub reconnect_delay: Duration,
    pub verbose: bool,
}

/// On-disk shape of `restyle.toml`. All fields optional.
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    api_base: Option<String>,
    ws_url: Option<String>,
    reconnect_delay_ms: Option<u64>,
}

impl ConfigFile {
    fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&raw)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }
}

impl Config {
    /// Resolve the configuration from CLI flags, environment, and an optional
    /// config file.
    pub fn resolve(
        api_base_flag: Option<&str>,
        config_file: Option<&Path>,
        verbose: bool,
    ) -> Result<Self> {
        let file = match config_file {
            Some(path) => ConfigFile::load(path)?,
            None => {
                let default_path = Path::new("restyle.toml");
                if default_path.exists() {
                    ConfigFile::load(default_path)?
                } else {
                    ConfigFile::default()
                }
            }
        };

        let api_base = api_base_flag
            .map(str::to_string)
            .or_else(|| std::env::var("RESTYLE_API_BASE").ok())
            .or(file.api_base)
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        let ws_base = std::env::var("RESTYLE_WS_URL").ok().or(file.ws_url);

        let reconnect_delay = Duration::from_millis(
            file.reconnect_delay_ms.unwrap_or(DEFAULT_RECONNECT_DELAY_MS),
        );

        Ok(Self {
            api_base: normalize_base(&api_base),
            ws_base: ws_base.as_deref().map(normalize_base),
            reconnect_delay,
            verbose,
        })
    }

    /// A config pointing at the default loopback API, for tests.
    #[cfg(test)]
    pub fn for_tests(api_base: &str) -> Self {
        Self {
            api_base: normalize_base(api_base),
            ws_base: None,
            reconnect_delay: Duration::from_millis(DEFAULT_RECONNECT_DELAY_MS),
            verbose: false,
        }
    }
}

/// Strip trailing slashes so path joins don't produce `//`.
fn normalize_base(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn trailing_slash_is_stripped() {
        assert_eq!(normalize_base("http://localhost:8000/"), "http://localhost:8000");
        assert_eq!(normalize_base("http://localhost:8000"), "http://localhost:8000");
    }

    #[test]
    fn flag_overrides_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("restyle.toml");
        fs::write(&path, r#"api_base = "http://file:1234""#).unwrap();
        let config = Config::resolve(Some("http://flag:9999"), Some(&path), false).unwrap();
        assert_eq!(config.api_base, "http://flag:9999");
    }

    #[test]
    fn file_values_are_used_when_no_flag() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("restyle.toml");
        fs::write(
            &path,
            "api_base = \"http://file:1234/\"\nws_url = \"ws://file:1234/ws\"\nreconnect_delay_ms = 250\n",
        )
        .unwrap();
        let config = Config::resolve(None, Some(&path), false).unwrap();
        assert_eq!(config.api_base, "http://file:1234");
        assert_eq!(config.ws_base.as_deref(), Some("ws://file:1234/ws"));
        assert_eq!(config.reconnect_delay, Duration::from_millis(250));
    }

    #[test]
    fn defaults_apply_without_any_source() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("restyle.toml");
        fs::write(&path, "").unwrap();
        let config = Config::resolve(None, Some(&path), true).unwrap();
        assert_eq!(config.api_base, DEFAULT_API_BASE);
        assert_eq!(config.reconnect_delay, Duration::from_millis(5000));
        assert!(config.verbose);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("restyle.toml");
        fs::write(&path, "api_base = [not toml").unwrap();
        let result = Config::resolve(None, Some(&path), false);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("parse"));
    }
}
