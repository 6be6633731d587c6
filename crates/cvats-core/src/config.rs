use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{CvatsError, Result};

const DEFAULT_API_BASE: &str = "http://localhost:8080";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Endpoint names exposed by the screening backend, relative to the API base.
pub const PRESIGN_ENDPOINT: &str = "presign";
pub const EXTRACT_ENDPOINT: &str = "extract";
pub const PARSE_ENDPOINT: &str = "parse";
pub const SCORE_ENDPOINT: &str = "score";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    pub api_base: Url,
    pub http_timeout_secs: u64,
    pub user_agent: String,
}

impl ClientConfig {
    pub fn new(api_base: Url) -> Self {
        Self {
            api_base,
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            user_agent: default_user_agent(),
        }
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the config from any variable source; unset variables take their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let raw_base = lookup("CVATS_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.into());
        let api_base = Url::parse(&raw_base)
            .map_err(|e| CvatsError::Config(format!("CVATS_API_BASE '{raw_base}': {e}")))?;
        if api_base.cannot_be_a_base() {
            return Err(CvatsError::Config(format!(
                "CVATS_API_BASE '{raw_base}' must be an http(s) URL"
            )));
        }

        let http_timeout_secs = match lookup("CVATS_HTTP_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse().map_err(|_| {
                CvatsError::Config(format!(
                    "CVATS_HTTP_TIMEOUT_SECS must be a number, got '{raw}'"
                ))
            })?,
            None => DEFAULT_HTTP_TIMEOUT_SECS,
        };

        Ok(Self {
            api_base,
            http_timeout_secs,
            user_agent: lookup("CVATS_USER_AGENT").unwrap_or_else(default_user_agent),
        })
    }

    /// Resolve an endpoint under the API base, keeping any path prefix the base carries
    /// (e.g. an API gateway stage such as `/prod`).
    pub fn endpoint(&self, name: &str) -> Result<Url> {
        let mut base = self.api_base.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        base.join(name)
            .map_err(|e| CvatsError::Config(format!("invalid endpoint '{name}': {e}")))
    }
}

fn default_user_agent() -> String {
    format!("cvats/{}", env!("CARGO_PKG_VERSION"))
}
