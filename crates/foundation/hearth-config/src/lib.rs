//! # Hearth Config
//!
//! Layered configuration: built-in defaults, then a YAML file, then
//! `HEARTH_*` environment variables. Command-line flags are applied on top
//! by the binary.
//!
//! ```yaml
//! endpoint: http://localhost:5000/predict
//! timeout_secs: 30
//! resubmit: cancel-on-resubmit
//! display:
//!   locale: en-US
//!   currency_symbol: "﷼"
//!   currency_code: SAR
//! ```

use hearth_core::{DisplayStyle, Error, NumberLocale, ResubmitPolicy, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:5000/predict";

pub const ENV_ENDPOINT: &str = "HEARTH_ENDPOINT";
pub const ENV_TIMEOUT_SECS: &str = "HEARTH_TIMEOUT_SECS";
pub const ENV_RESUBMIT: &str = "HEARTH_RESUBMIT";
pub const ENV_LOCALE: &str = "HEARTH_LOCALE";

/// Effective client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HearthConfig {
    /// Prediction endpoint (`POST`)
    pub endpoint: String,
    /// Request timeout; `None` waits for the transport to give up
    pub timeout_secs: Option<u64>,
    /// Overlapping-submission behavior
    pub resubmit: ResubmitPolicy,
    /// Price presentation
    pub display: DisplayStyle,
}

impl Default for HearthConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout_secs: None,
            resubmit: ResubmitPolicy::LastWriterWins,
            display: DisplayStyle::default(),
        }
    }
}

impl HearthConfig {
    /// `<config_dir>/hearth/config.yaml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("hearth").join("config.yaml"))
    }

    /// Load defaults, the given file (or the default path when it exists),
    /// and the process environment, then validate.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = Self::layered_with(path, |key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Same layers as [`HearthConfig::load`] with variables read through
    /// `lookup`, and no validation: callers stack their own overrides before
    /// calling [`HearthConfig::validate`].
    pub fn layered_with<F>(path: Option<&Path>, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path().filter(|p| p.exists()) {
                Some(path) => Self::from_file(&path)?,
                None => Self::default(),
            },
        };

        config.apply_env(lookup)?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {}", path.display(), e)))?;
        let config = Self::from_yaml(&text)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        tracing::debug!(path = %path.display(), "loaded config file");
        Ok(config)
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text).map_err(|e| Error::Config(e.to_string()))
    }

    /// Override fields from `HEARTH_*` variables found through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(endpoint) = lookup(ENV_ENDPOINT) {
            self.endpoint = endpoint;
        }

        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            let secs = raw
                .trim()
                .parse::<u64>()
                .map_err(|e| Error::Config(format!("{}={:?}: {}", ENV_TIMEOUT_SECS, raw, e)))?;
            self.timeout_secs = Some(secs);
        }

        if let Some(raw) = lookup(ENV_RESUBMIT) {
            self.resubmit = raw
                .parse::<ResubmitPolicy>()
                .map_err(|e| Error::Config(format!("{}: {}", ENV_RESUBMIT, e)))?;
        }

        if let Some(raw) = lookup(ENV_LOCALE) {
            self.display.locale = raw
                .parse::<NumberLocale>()
                .map_err(|e| Error::Config(format!("{}: {}", ENV_LOCALE, e)))?;
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.endpoint_url()?;
        if self.timeout_secs == Some(0) {
            return Err(Error::Config("timeout_secs must be greater than zero".into()));
        }
        Ok(())
    }

    pub fn endpoint_url(&self) -> Result<Url> {
        parse_endpoint(&self.endpoint)
    }

    /// Sibling `health` resource of the prediction endpoint.
    pub fn health_url(&self) -> Result<Url> {
        let endpoint = self.endpoint_url()?;
        endpoint.join("health").map_err(|e| Error::InvalidEndpoint {
            url: self.endpoint.clone(),
            reason: e.to_string(),
        })
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// Parse and check an endpoint URL: absolute, `http` or `https`.
pub fn parse_endpoint(raw: &str) -> Result<Url> {
    let url = Url::parse(raw).map_err(|e| Error::InvalidEndpoint {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(Error::InvalidEndpoint {
            url: raw.to_string(),
            reason: format!("unsupported scheme {:?}", other),
        }),
    }
}
