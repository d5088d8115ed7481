//! Configuration loaded from environment variables.
//!
//! `main` loads `.env` with dotenvy first, so every value can live in either
//! place. Values are read through a lookup function so tests never have to
//! touch the process environment.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

/// Official nuclei-templates statistics file listing every template tag.
pub const DEFAULT_TAGS_URL: &str = "https://raw.githubusercontent.com/projectdiscovery/nuclei-templates/refs/heads/main/TEMPLATES-STATS.json";

const DEFAULT_BIND: &str = "127.0.0.1:3000";
const DEFAULT_NUCLEI_BIN: &str = "nuclei";
const DEFAULT_TAGS_TIMEOUT_SECS: u64 = 30;

/// Top-level configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub scanner: ScannerConfig,
    pub catalog: CatalogConfig,
    /// Emit logs as JSON lines instead of the human-readable format.
    pub log_json: bool,
}

/// How MCP clients reach the server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the HTTP transport binds to.
    pub bind: SocketAddr,
    pub transport: Transport,
}

/// Transport used to serve MCP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Transport {
    /// JSON responses over `POST /mcp`.
    #[default]
    Http,
    /// Newline-delimited JSON-RPC over stdin/stdout.
    Stdio,
}

impl FromStr for Transport {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "http" | "streamable-http" => Ok(Transport::Http),
            "stdio" => Ok(Transport::Stdio),
            _ => Err(format!(
                "invalid transport '{}', expected 'http' or 'stdio'",
                s
            )),
        }
    }
}

/// Settings for launching the scanner executable.
#[derive(Debug, Clone)]
pub struct ScannerConfig {
    /// Executable name (resolved on PATH) or path.
    pub binary: String,
    /// Deadline for a single scan. `None` lets a scan run until nuclei exits.
    pub timeout: Option<Duration>,
    /// Per-stream capture limit in bytes. `None` buffers everything.
    pub max_output_bytes: Option<usize>,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            binary: DEFAULT_NUCLEI_BIN.to_string(),
            timeout: None,
            max_output_bytes: None,
        }
    }
}

/// Settings for the template tag catalog.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub url: String,
    /// HTTP client timeout for the catalog request.
    pub timeout: Duration,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_TAGS_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TAGS_TIMEOUT_SECS),
        }
    }
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    ///
    /// Empty values count as unset. A zero scan timeout or output cap
    /// disables that limit.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind = parse_or(&get, "NUCLEI_MCP_BIND", DEFAULT_BIND)?;
        let transport = parse_or(&get, "NUCLEI_MCP_TRANSPORT", "http")?;

        let binary = get("NUCLEI_BIN").unwrap_or_else(|| DEFAULT_NUCLEI_BIN.to_string());
        let timeout = parse_optional::<u64, _>(&get, "NUCLEI_SCAN_TIMEOUT_SECS")?
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);
        let max_output_bytes = parse_optional::<usize, _>(&get, "NUCLEI_MAX_OUTPUT_BYTES")?
            .filter(|bytes| *bytes > 0);

        let url = get("NUCLEI_TAGS_URL").unwrap_or_else(|| DEFAULT_TAGS_URL.to_string());
        reqwest::Url::parse(&url).map_err(|e| ConfigError::InvalidValue {
            key: "NUCLEI_TAGS_URL".to_string(),
            message: e.to_string(),
        })?;
        let tags_timeout_secs: u64 = parse_or(
            &get,
            "NUCLEI_TAGS_TIMEOUT_SECS",
            &DEFAULT_TAGS_TIMEOUT_SECS.to_string(),
        )?;

        let log_json = get("NUCLEI_MCP_LOG_JSON")
            .map(|v| parse_bool("NUCLEI_MCP_LOG_JSON", &v))
            .transpose()?
            .unwrap_or(false);

        Ok(Self {
            server: ServerConfig { bind, transport },
            scanner: ScannerConfig {
                binary,
                timeout,
                max_output_bytes,
            },
            catalog: CatalogConfig {
                url,
                timeout: Duration::from_secs(tags_timeout_secs),
            },
            log_json,
        })
    }
}

fn parse_optional<T, G>(get: &G, key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    get(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: format!("'{}': {}", raw, e),
                })
        })
        .transpose()
}

fn parse_or<T, G>(get: &G, key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    let raw = get(key).unwrap_or_else(|| default.to_string());
    raw.trim().parse::<T>().map_err(|e| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("'{}': {}", raw, e),
    })
}

fn parse_bool(key: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("'{}' is not a boolean", raw),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();

        assert_eq!(config.server.bind, "127.0.0.1:3000".parse().unwrap());
        assert_eq!(config.server.transport, Transport::Http);
        assert_eq!(config.scanner.binary, "nuclei");
        assert!(config.scanner.timeout.is_none());
        assert!(config.scanner.max_output_bytes.is_none());
        assert_eq!(config.catalog.url, DEFAULT_TAGS_URL);
        assert_eq!(config.catalog.timeout, Duration::from_secs(30));
        assert!(!config.log_json);
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("NUCLEI_MCP_BIND", "0.0.0.0:8080"),
            ("NUCLEI_MCP_TRANSPORT", "stdio"),
            ("NUCLEI_BIN", "/opt/nuclei/nuclei"),
            ("NUCLEI_SCAN_TIMEOUT_SECS", "300"),
            ("NUCLEI_MAX_OUTPUT_BYTES", "1048576"),
            ("NUCLEI_TAGS_URL", "https://mirror.example.com/stats.json"),
            ("NUCLEI_TAGS_TIMEOUT_SECS", "5"),
            ("NUCLEI_MCP_LOG_JSON", "true"),
        ])
        .unwrap();

        assert_eq!(config.server.bind.port(), 8080);
        assert_eq!(config.server.transport, Transport::Stdio);
        assert_eq!(config.scanner.binary, "/opt/nuclei/nuclei");
        assert_eq!(config.scanner.timeout, Some(Duration::from_secs(300)));
        assert_eq!(config.scanner.max_output_bytes, Some(1_048_576));
        assert_eq!(config.catalog.url, "https://mirror.example.com/stats.json");
        assert_eq!(config.catalog.timeout, Duration::from_secs(5));
        assert!(config.log_json);
    }

    #[test]
    fn test_zero_limits_disable() {
        let config = load(&[
            ("NUCLEI_SCAN_TIMEOUT_SECS", "0"),
            ("NUCLEI_MAX_OUTPUT_BYTES", "0"),
        ])
        .unwrap();

        assert!(config.scanner.timeout.is_none());
        assert!(config.scanner.max_output_bytes.is_none());
    }

    #[test]
    fn test_empty_value_counts_as_unset() {
        let config = load(&[("NUCLEI_BIN", "  ")]).unwrap();
        assert_eq!(config.scanner.binary, "nuclei");
    }

    #[test]
    fn test_invalid_values_name_the_key() {
        let err = load(&[("NUCLEI_SCAN_TIMEOUT_SECS", "soon")]).unwrap_err();
        assert!(err.to_string().contains("NUCLEI_SCAN_TIMEOUT_SECS"));

        let err = load(&[("NUCLEI_MCP_BIND", "not-an-addr")]).unwrap_err();
        assert!(err.to_string().contains("NUCLEI_MCP_BIND"));

        let err = load(&[("NUCLEI_MCP_TRANSPORT", "carrier-pigeon")]).unwrap_err();
        assert!(err.to_string().contains("expected 'http' or 'stdio'"));

        let err = load(&[("NUCLEI_TAGS_URL", "not a url")]).unwrap_err();
        assert!(err.to_string().contains("NUCLEI_TAGS_URL"));

        let err = load(&[("NUCLEI_MCP_LOG_JSON", "maybe")]).unwrap_err();
        assert!(err.to_string().contains("not a boolean"));
    }

    #[test]
    fn test_transport_from_str() {
        assert_eq!("HTTP".parse::<Transport>().unwrap(), Transport::Http);
        assert_eq!("streamable-http".parse::<Transport>().unwrap(), Transport::Http);
        assert_eq!("stdio".parse::<Transport>().unwrap(), Transport::Stdio);
        assert!("ws".parse::<Transport>().is_err());
    }
}
