//! HTTP transport — the blocking "perform request" seam beneath the
//! client.
//!
//! Everything above this module deals in `(url, headers, body)` in and
//! `(status, headers, body)` out, so the whole client can be exercised
//! against an in-process backend. The production backend wraps a
//! blocking reqwest client that is exclusively owned by one
//! [`crate::CloudClient`] and reused serially across calls.

use std::collections::HashMap;
use std::sync::Once;

use thiserror::Error;

/// Network and HTTP-layer failures. Propagated unchanged — retry policy
/// belongs to callers.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected http status {0}")]
    Status(u16),
}

/// A completed HTTP exchange. Header names are normalized to lowercase.
#[derive(Debug, Default)]
pub struct HttpReply {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl HttpReply {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }
}

/// The pluggable "perform request" collaborator.
pub trait HttpBackend: Send {
    /// POST `body` to `url` with the given headers, blocking until the
    /// full response is available.
    fn post(
        &mut self,
        url: &str,
        headers: &[(String, String)],
        body: &[u8],
    ) -> Result<HttpReply, TransportError>;
}

static TRANSPORT_INIT: Once = Once::new();

/// One-time process-wide transport initialization.
///
/// Must run before any client performs I/O; safe to invoke redundantly
/// from every client construction — only the first caller does the work.
pub fn global_init() {
    TRANSPORT_INIT.call_once(|| {
        // The first client build loads the TLS root store; pay that cost
        // here once rather than inside a caller's first exchange.
        let _ = reqwest::blocking::Client::builder().build();
    });
}

/// Production backend over a blocking reqwest client.
///
/// Redirects are not followed: the protocol accepts 302 as a terminal
/// status and everything else non-200 is a failure.
pub struct HttpClient {
    client: reqwest::blocking::Client,
}

impl HttpClient {
    pub fn new() -> Result<Self, TransportError> {
        global_init();
        let client = reqwest::blocking::Client::builder()
            .gzip(true)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(Self { client })
    }
}

impl HttpBackend for HttpClient {
    fn post(
        &mut self,
        url: &str,
        headers: &[(String, String)],
        body: &[u8],
    ) -> Result<HttpReply, TransportError> {
        let mut request = self.client.post(url).body(body.to_vec());
        for (name, value) in headers {
            request = request.header(name, value);
        }

        let response = request.send()?;
        let status = response.status().as_u16();
        if status != 200 && status != 302 {
            return Err(TransportError::Status(status));
        }

        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_ascii_lowercase(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = response.bytes()?.to_vec();

        Ok(HttpReply {
            status,
            headers,
            body,
        })
    }
}
