//! Blocking HTTP access for the harvester.
//!
//! Uses async reqwest internally on a shared tokio runtime, but presents a
//! sync interface: the harvest loop is strictly sequential and one request
//! is fully answered before the next one starts.

use std::sync::LazyLock;
use std::time::Duration;

/// Connect timeout. There is deliberately no read timeout on the request.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Failure to obtain a response body from the remote service.
///
/// Both variants are fatal for a harvest run.
#[derive(Debug)]
pub enum FetchError {
    /// The server answered with a non-success status
    Status { status: u16, message: String },
    /// Connection, TLS or body transfer failed before a status was known
    Transport { message: String },
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Status { status, message } => write!(f, "HTTP {status}: {message}"),
            Self::Transport { message } => write!(f, "transport error: {message}"),
        }
    }
}

impl std::error::Error for FetchError {}

impl FetchError {
    /// Classify a reqwest error.
    ///
    /// The URL is stripped so query strings do not end up in logs.
    pub fn from_reqwest(e: reqwest::Error) -> Self {
        let status = e.status().map(|s| s.as_u16());
        let message = e.without_url().to_string();
        match status {
            Some(status) => Self::Status { status, message },
            None => Self::Transport { message },
        }
    }
}

/// Shared async HTTP client with connection pooling.
static SHARED_CLIENT: LazyLock<reqwest::Client> = LazyLock::new(|| {
    reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .user_agent(concat!("harvest/", env!("CARGO_PKG_VERSION")))
        .build()
        .expect("failed to build HTTP client")
});

/// Get shared HTTP client.
pub fn http_client() -> &'static reqwest::Client {
    &SHARED_CLIENT
}

/// Shared tokio runtime for HTTP operations.
pub static SHARED_RUNTIME: LazyLock<tokio::runtime::Runtime> = LazyLock::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .expect("failed to build tokio runtime")
});

/// HTTP GET with query parameters, returning the body as text.
///
/// Blocks the calling thread until the whole body has arrived.
pub fn get_text(url: &str, params: &[(&str, String)]) -> Result<String, FetchError> {
    SHARED_RUNTIME.handle().block_on(async {
        let resp = http_client()
            .get(url)
            .query(params)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(FetchError::from_reqwest)?;
        resp.text().await.map_err(FetchError::from_reqwest)
    })
}
