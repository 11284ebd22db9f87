use std::time::Duration;

use covalent_core::tuning::{
    ListTuning, DEFAULT_NOTICE_DURATION_MS, DEFAULT_PAGE_SIZE, DEFAULT_REFRESH_COOLDOWN_MS,
    DEFAULT_SEARCH_DEBOUNCE_MS, DEFAULT_SEARCH_MIN_LEN,
};

/// Configuration errors surfaced at startup instead of panicking.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} must be {expected}, got {value:?}")]
    Invalid {
        var: &'static str,
        value: String,
        expected: &'static str,
    },
}

/// Output format of the stderr log layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Dashboard configuration loaded from environment variables.
///
/// All fields default to a dispatcher running on the local machine.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// REST base URL of the dispatcher.
    pub api_url: String,
    /// Live channel base URL of the dispatcher.
    pub socket_url: String,
    /// Serve bundled fixtures and disable the live channel.
    pub demo_mode: bool,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    pub log_format: LogFormat,
    pub tuning: ListTuning,
}

impl DashboardConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                  |
    /// |------------------------|--------------------------|
    /// | `COVALENT_API_URL`     | `http://localhost:48008` |
    /// | `COVALENT_SOCKET_URL`  | `ws://localhost:48008`   |
    /// | `COVALENT_DEMO_MODE`   | `false`                  |
    /// | `COVALENT_PAGE_SIZE`   | `10`                     |
    /// | `COVALENT_LOG_FORMAT`  | `text`                   |
    /// | `SEARCH_DEBOUNCE_MS`   | `1000`                   |
    /// | `SEARCH_MIN_LENGTH`    | `3`                      |
    /// | `REFRESH_COOLDOWN_MS`  | `3000`                   |
    /// | `NOTICE_DURATION_MS`   | `3000`                   |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                     |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Same as [`DashboardConfig::from_env`] with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = lookup("COVALENT_API_URL").unwrap_or_else(|| "http://localhost:48008".into());
        let socket_url =
            lookup("COVALENT_SOCKET_URL").unwrap_or_else(|| "ws://localhost:48008".into());

        let demo_mode = match lookup("COVALENT_DEMO_MODE") {
            Some(value) => parse_bool("COVALENT_DEMO_MODE", &value)?,
            None => false,
        };

        let log_format = match lookup("COVALENT_LOG_FORMAT").as_deref() {
            None | Some("text") => LogFormat::Text,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    var: "COVALENT_LOG_FORMAT",
                    value: other.to_string(),
                    expected: "`text` or `json`",
                })
            }
        };

        let page_size: u32 = parse_number(&lookup, "COVALENT_PAGE_SIZE", DEFAULT_PAGE_SIZE)?;
        if page_size == 0 {
            return Err(ConfigError::Invalid {
                var: "COVALENT_PAGE_SIZE",
                value: page_size.to_string(),
                expected: "at least 1",
            });
        }

        let defaults = ListTuning::default();
        let tuning = ListTuning {
            page_size,
            search_debounce: Duration::from_millis(parse_number(
                &lookup,
                "SEARCH_DEBOUNCE_MS",
                DEFAULT_SEARCH_DEBOUNCE_MS,
            )?),
            search_min_len: parse_number(&lookup, "SEARCH_MIN_LENGTH", DEFAULT_SEARCH_MIN_LEN)?,
            refresh_cooldown: Duration::from_millis(parse_number(
                &lookup,
                "REFRESH_COOLDOWN_MS",
                DEFAULT_REFRESH_COOLDOWN_MS,
            )?),
            notice_duration: Duration::from_millis(parse_number(
                &lookup,
                "NOTICE_DURATION_MS",
                DEFAULT_NOTICE_DURATION_MS,
            )?),
            tick_interval: defaults.tick_interval,
        };

        let request_timeout_secs: u64 = parse_number(&lookup, "REQUEST_TIMEOUT_SECS", 30)?;

        Ok(Self {
            api_url,
            socket_url,
            demo_mode,
            request_timeout_secs,
            log_format,
            tuning,
        })
    }
}

fn parse_number<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(var) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid {
            var,
            value,
            expected: "a non-negative integer",
        }),
    }
}

fn parse_bool(var: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::Invalid {
            var,
            value: value.to_string(),
            expected: "a boolean",
        }),
    }
}
