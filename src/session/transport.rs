use crate::error::LogError;
use reqwest::blocking::{Client, Response};
use reqwest::{StatusCode, Url};
use std::fmt;
use std::io::Read;
use std::sync::Once;
use std::time::Duration;

pub const TEXT_SIZE_HEADER: &str = "X-Text-Size";
pub const MORE_DATA_HEADER: &str = "X-More-Data";

/// Basic-auth credentials: a Jenkins user name and API token.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub user: String,
    pub key: String,
}

impl Credentials {
    pub fn new(user: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            key: key.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("key", &"<redacted>")
            .finish()
    }
}

/// One progressive-text response: the headers the session cares about plus
/// the still-unread body.
pub struct Chunk {
    pub text_size: Option<String>,
    pub more_data: Option<String>,
    pub body: Box<dyn Read + Send>,
}

impl Chunk {
    pub fn new(
        text_size: Option<String>,
        more_data: Option<String>,
        body: impl Read + Send + 'static,
    ) -> Self {
        Self {
            text_size,
            more_data,
            body: Box::new(body),
        }
    }

    pub fn has_more_data(&self) -> bool {
        self.more_data.as_deref() == Some("true")
    }
}

impl fmt::Debug for Chunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chunk")
            .field("text_size", &self.text_size)
            .field("more_data", &self.more_data)
            .finish_non_exhaustive()
    }
}

/// The two HTTP exchanges a log session needs.
#[cfg_attr(test, mockall::automock)]
pub trait Transport {
    /// Sends a HEAD request and returns the status once the body is drained.
    fn head(&self, url: &Url, credentials: &Credentials) -> Result<StatusCode, LogError>;

    /// Sends a GET request and hands back the response without reading its body.
    fn get(&self, url: &Url, credentials: &Credentials) -> Result<Chunk, LogError>;
}

/// Client-side knobs for the HTTP transport.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub insecure: bool,
    pub connect_timeout: Duration,
    pub timeout: Option<Duration>,
    pub poll_interval: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            insecure: false,
            connect_timeout: Duration::from_secs(30),
            timeout: None,
            poll_interval: Duration::from_millis(500),
        }
    }
}

impl From<&crate::config::Config> for SessionOptions {
    fn from(config: &crate::config::Config) -> Self {
        Self {
            insecure: config.http.insecure,
            connect_timeout: config.http.connect_timeout(),
            timeout: config.http.timeout(),
            poll_interval: config.stream.poll_interval(),
        }
    }
}

/// [`Transport`] backed by reqwest's blocking client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn build(options: &SessionOptions) -> Result<Self, LogError> {
        ensure_rustls_provider_installed();

        if options.insecure {
            tracing::warn!("TLS certificate verification is disabled");
        }

        let client = Client::builder()
            .user_agent(crate::core::user_agent())
            .danger_accept_invalid_certs(options.insecure)
            .connect_timeout(options.connect_timeout)
            .timeout(options.timeout)
            .build()
            .map_err(|e| LogError::network("building the HTTP client", e))?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn head(&self, url: &Url, credentials: &Credentials) -> Result<StatusCode, LogError> {
        let mut response = self
            .client
            .head(url.clone())
            .basic_auth(&credentials.user, Some(&credentials.key))
            .send()
            .map_err(|e| LogError::network("sending HEAD request", e))?;

        response
            .copy_to(&mut std::io::sink())
            .map_err(|e| LogError::network("draining HEAD response", e))?;
        Ok(response.status())
    }

    fn get(&self, url: &Url, credentials: &Credentials) -> Result<Chunk, LogError> {
        let response = self
            .client
            .get(url.clone())
            .basic_auth(&credentials.user, Some(&credentials.key))
            .send()
            .map_err(|e| LogError::network("fetching log chunk", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LogError::Access {
                method: "GET",
                status: status.to_string(),
            });
        }

        Ok(Chunk::new(
            header(&response, TEXT_SIZE_HEADER),
            header(&response, MORE_DATA_HEADER),
            response,
        ))
    }
}

fn header(response: &Response, name: &str) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
}

fn ensure_rustls_provider_installed() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        // Another part of the process may already own the provider slot.
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}
