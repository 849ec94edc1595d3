//! Gateway preferences.
//!
//! Mirrors the preference set a store administrator fills in for the PayPal
//! payment method. Every field has a default so a partial TOML file (or none
//! at all) still yields a usable sandbox configuration.

use crate::error::{GatewayError, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::Path;

pub const SANDBOX_NVP_ENDPOINT: &str = "https://api-3t.sandbox.paypal.com/nvp";
pub const LIVE_NVP_ENDPOINT: &str = "https://api-3t.paypal.com/nvp";
pub const DEFAULT_API_VERSION: &str = "204.0";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Server {
    #[default]
    Sandbox,
    Live,
}

impl Server {
    /// Only `"live"` selects production; blank or unknown values stay on sandbox.
    pub fn parse(value: &str) -> Server {
        if value.trim().eq_ignore_ascii_case("live") {
            Server::Live
        } else {
            Server::Sandbox
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Server::Sandbox => "sandbox",
            Server::Live => "live",
        }
    }

    pub fn nvp_endpoint(&self) -> &'static str {
        match self {
            Server::Sandbox => SANDBOX_NVP_ENDPOINT,
            Server::Live => LIVE_NVP_ENDPOINT,
        }
    }
}

impl<'de> Deserialize<'de> for Server {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(Server::parse(&raw))
    }
}

/// API signature credentials.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub login: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub signature: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("login", &self.login)
            .field("password", &"***")
            .field("signature", &"***")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(flatten)]
    pub credentials: Credentials,
    #[serde(default)]
    pub server: Server,
    #[serde(default = "default_solution")]
    pub solution: String,
    #[serde(default = "default_landing_page")]
    pub landing_page: String,
    #[serde(default)]
    pub logourl: String,
    #[serde(default = "default_true")]
    pub use_new_layout: bool,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Overrides the NVP endpoint derived from `server`.
    #[serde(default)]
    pub endpoint: Option<String>,
}

fn default_solution() -> String {
    "Mark".to_string()
}

fn default_landing_page() -> String {
    "Billing".to_string()
}

fn default_true() -> bool {
    true
}

fn default_api_version() -> String {
    DEFAULT_API_VERSION.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for GatewayConfig {
    fn default() -> Self {
        GatewayConfig {
            credentials: Credentials::default(),
            server: Server::default(),
            solution: default_solution(),
            landing_page: default_landing_page(),
            logourl: String::new(),
            use_new_layout: true,
            api_version: default_api_version(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            endpoint: None,
        }
    }
}

impl GatewayConfig {
    pub fn from_toml_str(input: &str) -> Result<GatewayConfig> {
        toml::from_str(input).map_err(|err| GatewayError::Config(err.to_string()))
    }

    pub fn from_toml_file(path: &Path) -> Result<GatewayConfig> {
        let contents = std::fs::read_to_string(path).map_err(|err| {
            GatewayError::Config(format!("cannot read {}: {}", path.display(), err))
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn is_sandbox(&self) -> bool {
        self.server == Server::Sandbox
    }

    pub fn nvp_endpoint(&self) -> &str {
        match self.endpoint.as_deref() {
            Some(endpoint) if !endpoint.trim().is_empty() => endpoint,
            _ => self.server.nvp_endpoint(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_payment_method_preferences() {
        let config = GatewayConfig::from_toml_str("").unwrap();
        assert_eq!(config.server, Server::Sandbox);
        assert_eq!(config.solution, "Mark");
        assert_eq!(config.landing_page, "Billing");
        assert_eq!(config.logourl, "");
        assert!(config.use_new_layout);
        assert_eq!(config.api_version, DEFAULT_API_VERSION);
        assert_eq!(config, GatewayConfig::default());
    }

    #[test]
    fn reads_credentials_and_server() {
        let config = GatewayConfig::from_toml_str(
            r#"
login = "merchant_api1.example.com"
password = "secret"
signature = "sig"
server = "live"
use_new_layout = false
"#,
        )
        .unwrap();
        assert_eq!(config.credentials.login, "merchant_api1.example.com");
        assert_eq!(config.server, Server::Live);
        assert!(!config.use_new_layout);
        assert_eq!(config.nvp_endpoint(), LIVE_NVP_ENDPOINT);
    }

    #[test]
    fn blank_server_falls_back_to_sandbox() {
        let config = GatewayConfig::from_toml_str("server = \"\"").unwrap();
        assert_eq!(config.server, Server::Sandbox);
        assert!(config.is_sandbox());
        assert_eq!(config.nvp_endpoint(), SANDBOX_NVP_ENDPOINT);
    }

    #[test]
    fn endpoint_override_wins() {
        let config = GatewayConfig {
            endpoint: Some("http://127.0.0.1:9000/nvp".to_string()),
            ..GatewayConfig::default()
        };
        assert_eq!(config.nvp_endpoint(), "http://127.0.0.1:9000/nvp");
    }

    #[test]
    fn debug_redacts_secrets() {
        let creds = Credentials {
            login: "api_user".to_string(),
            password: "hunter2".to_string(),
            signature: "AbCdEf".to_string(),
        };
        let rendered = format!("{:?}", creds);
        assert!(rendered.contains("api_user"));
        assert!(!rendered.contains("hunter2"));
        assert!(!rendered.contains("AbCdEf"));
    }

    #[test]
    fn rejects_wrong_types() {
        let err = GatewayConfig::from_toml_str("use_new_layout = \"yes\"").unwrap_err();
        assert!(matches!(err, GatewayError::Config(_)));
    }
}
