use anyhow::{bail, Context, Result};

const DEFAULT_NAME: &str = "dispatcher";

/// Dispatcher settings. Only affects logging; dispatch semantics are fixed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatcherConfig {
    /// Label attached to every log line the dispatcher emits.
    pub name: String,
    /// Emit each payload's `Debug` form at trace level when a cycle starts.
    pub log_payloads: bool,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            log_payloads: false,
        }
    }
}

impl DispatcherConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_log_payloads(mut self, enabled: bool) -> Self {
        self.log_payloads = enabled;
        self
    }

    /// Load from `FLUX_DISPATCHER_NAME` and `FLUX_LOG_PAYLOADS`, reading a
    /// `.env` file first if one exists. Unset variables fall back to defaults.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let name =
            std::env::var("FLUX_DISPATCHER_NAME").unwrap_or_else(|_| DEFAULT_NAME.to_string());
        let log_payloads = match std::env::var("FLUX_LOG_PAYLOADS") {
            Ok(raw) => parse_flag(&raw).context("FLUX_LOG_PAYLOADS must be a boolean")?,
            Err(_) => false,
        };

        Ok(Self { name, log_payloads })
    }
}

fn parse_flag(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => bail!("unrecognised flag value {other:?}"),
    }
}
