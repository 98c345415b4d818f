//! Gateway configuration: partner environment and credentials.
//!
//! Configuration is an explicit, constructed value with process-wide
//! lifetime. There is no module-level state; the transport factory takes a
//! `Credentials` at construction and nothing mutates it afterwards.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Partner environment selector.
///
/// Chooses which Visa host the transport binds to; nothing else differs
/// between the two.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Sandbox,
    Production,
}

impl Environment {
    /// Base URL of the partner API for this environment.
    #[must_use]
    pub fn base_url(self) -> &'static str {
        match self {
            Environment::Sandbox => "https://sandbox.api.visa.com",
            Environment::Production => "https://api.visa.com",
        }
    }

    /// Interpret a `VISA_ENV` selector value.
    ///
    /// `"sandbox"` selects the sandbox host; any other value selects
    /// production.
    #[must_use]
    pub fn from_env_value(value: &str) -> Self {
        if value == "sandbox" {
            Environment::Sandbox
        } else {
            Environment::Production
        }
    }
}

/// Immutable partner credentials, loaded once at startup.
///
/// The basic-auth pair authenticates at the HTTP layer; the certificate and
/// key paths hold the mutual-TLS client identity the partner authenticates
/// at the transport layer.
#[derive(Clone)]
pub struct Credentials {
    /// HTTP basic-auth user id.
    pub user_id: String,
    /// HTTP basic-auth password.
    pub password: String,
    /// Path to the mTLS client certificate (PEM).
    pub cert_path: PathBuf,
    /// Path to the mTLS client private key (PEM).
    pub key_path: PathBuf,
    /// Which partner host to call.
    pub environment: Environment,
}

impl Credentials {
    /// Read credentials from the process environment (`VISA_USER_ID`,
    /// `VISA_PASSWORD`, `VISA_CERT_PATH`, `VISA_KEY_PATH`, `VISA_ENV`).
    ///
    /// Missing basic-auth credentials are not an error here: the partner
    /// rejects the first call instead, and that surfaces through the normal
    /// error path.
    #[must_use]
    pub fn from_env() -> Self {
        let var = |name: &str, default: &str| {
            std::env::var(name).unwrap_or_else(|_| default.to_string())
        };
        Self {
            user_id: var("VISA_USER_ID", ""),
            password: var("VISA_PASSWORD", ""),
            cert_path: PathBuf::from(var("VISA_CERT_PATH", "./certs/cert.pem")),
            key_path: PathBuf::from(var("VISA_KEY_PATH", "./certs/key.pem")),
            environment: Environment::from_env_value(&var("VISA_ENV", "sandbox")),
        }
    }
}

// Manual impl: the password must never reach a log line or an error message.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user_id", &self.user_id)
            .field("password", &"<redacted>")
            .field("cert_path", &self.cert_path)
            .field("key_path", &self.key_path)
            .field("environment", &self.environment)
            .finish()
    }
}
