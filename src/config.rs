//! Startup configuration for the relay.
//!
//! Two values are required and resolved exactly once, before the listener
//! binds: the upstream completion endpoint URL and the API key sent with
//! every upstream call. Missing either is fatal.

use anyhow::{bail, Result};

/// Environment variable holding the upstream completion endpoint URL.
pub const ENDPOINT_VAR: &str = "ENDPOINT";

/// Environment variable holding the upstream API key.
pub const API_KEY_VAR: &str = "API_KEY";

/// Resolved process configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Upstream completion API endpoint URL.
    pub endpoint: String,
    /// Key sent as the `api-key` header on every upstream call.
    pub api_key: String,
}

impl Config {
    /// Resolve configuration from the environment.
    ///
    /// A `.env` file in the working directory is honored when present.
    /// The error names every missing variable so a misconfigured process
    /// fails with one actionable message.
    pub fn from_env() -> Result<Self> {
        // A missing .env file is fine; the variables may be set directly.
        let _ = dotenvy::dotenv();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let endpoint = read(&get, ENDPOINT_VAR);
        let api_key = read(&get, API_KEY_VAR);

        match (endpoint, api_key) {
            (Some(endpoint), Some(api_key)) => Ok(Self { endpoint, api_key }),
            (endpoint, api_key) => {
                let mut missing = Vec::new();
                if endpoint.is_none() {
                    missing.push(ENDPOINT_VAR);
                }
                if api_key.is_none() {
                    missing.push(API_KEY_VAR);
                }
                bail!(
                    "missing required environment variable(s): {}",
                    missing.join(", ")
                );
            }
        }
    }
}

/// Blank values count as missing; a variable exported as an empty string
/// is a misconfiguration, not a usable setting.
fn read(get: &impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    get(name).filter(|v| !v.trim().is_empty())
}
