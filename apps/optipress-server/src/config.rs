//! Server configuration, read from the environment

use anyhow::{bail, Context, Result};
use optipress_domain::optimization::{Quality, DEFAULT_MAX_UPLOAD_SIZE};
use std::{path::PathBuf, str::FromStr, time::Duration};

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Runtime settings for the HTTP server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_upload_bytes: usize,
    pub default_quality: Quality,
    pub rate_limit_max: u32,
    pub rate_limit_window: Duration,
    pub static_dir: Option<PathBuf>,
    pub log_format: LogFormat,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_SIZE,
            default_quality: Quality::DEFAULT,
            rate_limit_max: 100,
            rate_limit_window: Duration::from_secs(15 * 60),
            static_dir: None,
            log_format: LogFormat::Text,
        }
    }
}

impl ServerConfig {
    /// Read the configuration from process environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let port_var = ["OPTIPRESS_PORT", "PORT"]
            .into_iter()
            .find_map(|key| get(key).map(|raw| (key, raw)));
        let port = match port_var {
            Some((key, raw)) => parse(key, &raw)?,
            None => defaults.port,
        };

        let default_quality = match get("OPTIPRESS_DEFAULT_QUALITY") {
            Some(raw) => {
                let value: i64 = parse("OPTIPRESS_DEFAULT_QUALITY", &raw)?;
                Quality::new(value).context("OPTIPRESS_DEFAULT_QUALITY is out of range")?
            }
            None => defaults.default_quality,
        };

        let max_upload_bytes = match get("OPTIPRESS_MAX_UPLOAD_BYTES") {
            Some(raw) => parse("OPTIPRESS_MAX_UPLOAD_BYTES", &raw)?,
            None => defaults.max_upload_bytes,
        };
        if max_upload_bytes == 0 {
            bail!("OPTIPRESS_MAX_UPLOAD_BYTES must be greater than zero");
        }

        let rate_limit_max = match get("OPTIPRESS_RATE_LIMIT_MAX") {
            Some(raw) => parse("OPTIPRESS_RATE_LIMIT_MAX", &raw)?,
            None => defaults.rate_limit_max,
        };

        let rate_limit_window = match get("OPTIPRESS_RATE_LIMIT_WINDOW_SECS") {
            Some(raw) => Duration::from_secs(parse("OPTIPRESS_RATE_LIMIT_WINDOW_SECS", &raw)?),
            None => defaults.rate_limit_window,
        };
        if rate_limit_window.is_zero() {
            bail!("OPTIPRESS_RATE_LIMIT_WINDOW_SECS must be greater than zero");
        }

        let log_format = match get("OPTIPRESS_LOG_FORMAT").as_deref().map(str::to_ascii_lowercase) {
            None => defaults.log_format,
            Some(format) if format == "text" => LogFormat::Text,
            Some(format) if format == "json" => LogFormat::Json,
            Some(other) => bail!("OPTIPRESS_LOG_FORMAT must be 'text' or 'json', got '{}'", other),
        };

        Ok(Self {
            host: get("OPTIPRESS_HOST").unwrap_or(defaults.host),
            port,
            max_upload_bytes,
            default_quality,
            rate_limit_max,
            rate_limit_window,
            static_dir: get("OPTIPRESS_STATIC_DIR").map(PathBuf::from),
            log_format,
        })
    }

    /// `host:port` string to bind to
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.trim()
        .parse()
        .with_context(|| format!("{} has an invalid value: '{}'", key, raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<ServerConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();

        assert_eq!(config.bind_addr(), "0.0.0.0:3000");
        assert_eq!(config.max_upload_bytes, 10 * 1024 * 1024);
        assert_eq!(config.default_quality.value(), 80);
        assert_eq!(config.rate_limit_max, 100);
        assert_eq!(config.rate_limit_window, Duration::from_secs(900));
        assert!(config.static_dir.is_none());
        assert_eq!(config.log_format, LogFormat::Text);
    }

    #[test]
    fn test_plain_port_variable_is_honoured() {
        let config = config_from(&[("PORT", "8080")]).unwrap();
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn test_prefixed_port_wins() {
        let config = config_from(&[("PORT", "8080"), ("OPTIPRESS_PORT", "9090")]).unwrap();
        assert_eq!(config.port, 9090);
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("OPTIPRESS_HOST", "127.0.0.1"),
            ("OPTIPRESS_MAX_UPLOAD_BYTES", "2048"),
            ("OPTIPRESS_DEFAULT_QUALITY", "70"),
            ("OPTIPRESS_RATE_LIMIT_MAX", "5"),
            ("OPTIPRESS_RATE_LIMIT_WINDOW_SECS", "60"),
            ("OPTIPRESS_STATIC_DIR", "public"),
            ("OPTIPRESS_LOG_FORMAT", "JSON"),
        ])
        .unwrap();

        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.max_upload_bytes, 2048);
        assert_eq!(config.default_quality.value(), 70);
        assert_eq!(config.rate_limit_max, 5);
        assert_eq!(config.rate_limit_window, Duration::from_secs(60));
        assert_eq!(config.static_dir, Some(PathBuf::from("public")));
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_invalid_values_fail() {
        assert!(config_from(&[("OPTIPRESS_PORT", "not-a-port")]).is_err());
        assert!(config_from(&[("OPTIPRESS_PORT", "70000")]).is_err());
        assert!(config_from(&[("OPTIPRESS_DEFAULT_QUALITY", "5")]).is_err());
        assert!(config_from(&[("OPTIPRESS_MAX_UPLOAD_BYTES", "0")]).is_err());
        assert!(config_from(&[("OPTIPRESS_RATE_LIMIT_WINDOW_SECS", "0")]).is_err());
        assert!(config_from(&[("OPTIPRESS_LOG_FORMAT", "xml")]).is_err());
    }

    #[test]
    fn test_invalid_port_names_its_variable() {
        let err = config_from(&[("PORT", "eighty")]).unwrap_err();
        assert!(err.to_string().starts_with("PORT "), "{}", err);

        let err = config_from(&[("OPTIPRESS_PORT", "eighty")]).unwrap_err();
        assert!(err.to_string().starts_with("OPTIPRESS_PORT "), "{}", err);
    }

    #[test]
    fn test_blank_values_use_defaults() {
        let config = config_from(&[("OPTIPRESS_PORT", "  "), ("OPTIPRESS_HOST", "")]).unwrap();
        assert_eq!(config.bind_addr(), "0.0.0.0:3000");
    }
}
