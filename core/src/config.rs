//! Client configuration.
//!
//! A `ClientConfig` is immutable once built and owned by the `Vault` built
//! from it. `from_env` reads the `OBSIDIAN_*` variables; `from_lookup` takes
//! any key lookup so tests need not touch the process environment.

use std::path::PathBuf;

use crate::error::ApiError;

/// Address the REST plugin listens on over HTTPS by default.
pub const DEFAULT_BASE_URL: &str = "https://127.0.0.1:27124";

pub const ENV_BASE_URL: &str = "OBSIDIAN_API_URL";
pub const ENV_TOKEN: &str = "OBSIDIAN_API_TOKEN";
pub const ENV_CLIENT_CERT: &str = "OBSIDIAN_CLIENT_CERT";
pub const ENV_CLIENT_KEY: &str = "OBSIDIAN_CLIENT_KEY";
pub const ENV_VERIFY_TLS: &str = "OBSIDIAN_VERIFY_TLS";

/// PEM files presented as the client certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientCertPaths {
    pub cert: PathBuf,
    pub key: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub token: String,
    pub client_cert: Option<ClientCertPaths>,
    /// Verify the server certificate. Off by default: the plugin serves a
    /// self-signed certificate.
    pub verify_tls: bool,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: token.into(),
            client_cert: None,
            verify_tls: false,
        }
    }

    pub fn with_client_cert(mut self, cert: impl Into<PathBuf>, key: impl Into<PathBuf>) -> Self {
        self.client_cert = Some(ClientCertPaths {
            cert: cert.into(),
            key: key.into(),
        });
        self
    }

    pub fn with_verify_tls(mut self, verify: bool) -> Self {
        self.verify_tls = verify;
        self
    }

    pub fn from_env() -> Result<Self, ApiError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ApiError> {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let token = get(ENV_TOKEN)
            .ok_or_else(|| ApiError::Config(format!("{ENV_TOKEN} is not set")))?;
        let base_url = get(ENV_BASE_URL).unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let client_cert = match (get(ENV_CLIENT_CERT), get(ENV_CLIENT_KEY)) {
            (Some(cert), Some(key)) => Some(ClientCertPaths {
                cert: cert.into(),
                key: key.into(),
            }),
            (None, None) => None,
            _ => {
                return Err(ApiError::Config(format!(
                    "{ENV_CLIENT_CERT} and {ENV_CLIENT_KEY} must be set together"
                )))
            }
        };

        let verify_tls = match get(ENV_VERIFY_TLS) {
            None => false,
            Some(value) => parse_flag(&value).ok_or_else(|| {
                ApiError::Config(format!("{ENV_VERIFY_TLS} must be a boolean, got {value:?}"))
            })?,
        };

        Ok(Self {
            base_url,
            token,
            client_cert,
            verify_tls,
        })
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
