//! Authenticated transport to the partner API.
//!
//! One factory per process, one client per invocation. The factory owns the
//! resolved base URL, the basic-auth material, and the mTLS identity paths;
//! `new_client` produces a connection-capable handle that is dropped at the
//! end of the call. The TLS material is read at client construction, so a
//! bad certificate fails that invocation only and the next one retries.

use crate::config::Credentials;
use crate::error::{GatewayError, Result};
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Client, Identity, Method, RequestBuilder};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Fixed request timeout for partner calls.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Builds authenticated HTTP clients bound to one partner host.
#[derive(Clone)]
pub struct TransportFactory {
    base_url: Url,
    user_id: String,
    password: String,
    identity: Option<IdentityPaths>,
    timeout: Duration,
}

// Manual impl: the password must never reach a log line.
impl std::fmt::Debug for TransportFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportFactory")
            .field("base_url", &self.base_url.as_str())
            .field("user_id", &self.user_id)
            .field("password", &"<redacted>")
            .field("identity", &self.identity)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Debug, Clone)]
struct IdentityPaths {
    cert_path: PathBuf,
    key_path: PathBuf,
}

impl TransportFactory {
    /// Build a factory from partner credentials.
    ///
    /// The certificate and key are not read here; every `new_client` call
    /// loads them fresh, so a failure is scoped to one invocation.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the environment's base URL does not
    /// parse (which would indicate a broken build, not bad user input).
    pub fn from_credentials(credentials: &Credentials) -> Result<Self> {
        let mut factory = Self::new(
            credentials.environment.base_url(),
            &credentials.user_id,
            &credentials.password,
        )?;
        factory.identity = Some(IdentityPaths {
            cert_path: credentials.cert_path.clone(),
            key_path: credentials.key_path.clone(),
        });
        Ok(factory)
    }

    /// Build a factory with no client identity attached.
    ///
    /// Intended for tests and local stubs that do not terminate mutual TLS.
    /// The credential-driven path (`from_credentials`) always carries an
    /// identity; there is no fallback between the two.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `base_url` does not parse.
    pub fn without_identity(base_url: &str, user_id: &str, password: &str) -> Result<Self> {
        Self::new(base_url, user_id, password)
    }

    fn new(base_url: &str, user_id: &str, password: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| GatewayError::Config(format!("invalid base URL '{base_url}': {e}")))?;
        Ok(Self {
            base_url,
            user_id: user_id.to_string(),
            password: password.to_string(),
            identity: None,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Replace the fixed request timeout. Tests use this to bound the
    /// timeout behavior in milliseconds instead of 30 seconds.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Base URL this factory is bound to.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Construct a client for a single invocation: JSON content headers,
    /// the fixed timeout, and the mTLS identity when one is configured.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the certificate or key file is
    /// unreadable or the combined PEM material does not parse as a client
    /// identity, and a transport error if the client itself cannot be built.
    pub fn new_client(&self) -> Result<Client> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let mut builder = Client::builder()
            .default_headers(headers)
            .timeout(self.timeout);

        if let Some(paths) = &self.identity {
            builder = builder.identity(load_identity(&paths.cert_path, &paths.key_path)?);
        }

        builder
            .build()
            .map_err(|e| GatewayError::Transport(sanitize_reqwest_error(&e)))
    }

    /// Start a basic-authenticated request against a partner path.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if joining `path` onto the base URL
    /// does not produce a valid URL.
    pub fn request(&self, client: &Client, method: Method, path: &str) -> Result<RequestBuilder> {
        let url = self.url_for(path)?;
        Ok(client
            .request(method, url)
            .basic_auth(&self.user_id, Some(&self.password)))
    }

    fn url_for(&self, path: &str) -> Result<Url> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{path}")
        };
        Url::parse(&format!("{base}{path}"))
            .map_err(|e| GatewayError::Config(format!("invalid request URL for '{path}': {e}")))
    }
}

fn load_identity(cert_path: &Path, key_path: &Path) -> Result<Identity> {
    let read = |p: &Path| {
        std::fs::read(p)
            .map_err(|e| GatewayError::Config(format!("read TLS material {}: {e}", p.display())))
    };
    let mut pem = read(cert_path)?;
    pem.push(b'\n');
    pem.extend_from_slice(&read(key_path)?);
    Identity::from_pem(&pem)
        .map_err(|e| GatewayError::Config(format!("parse mTLS client identity: {e}")))
}

/// Render a URL with credentials, query, and fragment stripped.
#[must_use]
pub fn redact_url(url: &Url) -> String {
    let mut u = url.clone();
    let _ = u.set_username("");
    let _ = u.set_password(None);
    u.set_query(None);
    u.set_fragment(None);
    u.to_string()
}

/// Render a reqwest error without leaking URL material into the message.
#[must_use]
pub fn sanitize_reqwest_error(e: &reqwest::Error) -> String {
    let mut msg = e.to_string();
    if let Some(u) = e.url() {
        msg = msg.replace(u.as_str(), &redact_url(u));
    }
    msg
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Environment;
    use std::io::Write as _;

    fn plain_factory(base: &str) -> TransportFactory {
        TransportFactory::without_identity(base, "u", "p").expect("valid base url")
    }

    #[test]
    fn url_for_joins_paths() {
        let factory = plain_factory("http://127.0.0.1:9/");
        let url = factory.url_for("/vdp/helloworld").expect("url");
        assert_eq!(url.as_str(), "http://127.0.0.1:9/vdp/helloworld");

        let url = factory.url_for("vdp/helloworld").expect("url");
        assert_eq!(url.as_str(), "http://127.0.0.1:9/vdp/helloworld");
    }

    #[test]
    fn missing_cert_fails_client_construction() {
        let credentials = Credentials {
            user_id: "u".to_string(),
            password: "p".to_string(),
            cert_path: "/nonexistent/cert.pem".into(),
            key_path: "/nonexistent/key.pem".into(),
            environment: Environment::Sandbox,
        };
        let factory = TransportFactory::from_credentials(&credentials).expect("factory");
        let err = factory.new_client().unwrap_err();
        assert!(matches!(err, GatewayError::Config(_)), "got {err:?}");
        assert!(err.to_string().contains("/nonexistent/cert.pem"));
    }

    #[test]
    fn garbage_pem_fails_client_construction() {
        let mut cert = tempfile::NamedTempFile::new().expect("tempfile");
        let mut key = tempfile::NamedTempFile::new().expect("tempfile");
        cert.write_all(b"not a certificate").expect("write");
        key.write_all(b"not a key").expect("write");

        let credentials = Credentials {
            user_id: "u".to_string(),
            password: "p".to_string(),
            cert_path: cert.path().to_path_buf(),
            key_path: key.path().to_path_buf(),
            environment: Environment::Sandbox,
        };
        let factory = TransportFactory::from_credentials(&credentials).expect("factory");
        let err = factory.new_client().unwrap_err();
        assert!(matches!(err, GatewayError::Config(_)), "got {err:?}");
    }

    #[test]
    fn redact_url_strips_sensitive_parts() {
        let url = Url::parse("https://user:pw@api.example.com/a/b?token=x#frag").expect("url");
        let redacted = redact_url(&url);
        assert_eq!(redacted, "https://api.example.com/a/b");
    }
}
