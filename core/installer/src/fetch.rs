//! HTTP fetching for release artifacts.
//!
//! Archives and their checksum files are small enough to hold in memory, so
//! the fetcher materializes the whole body instead of writing a temporary
//! file. The body is read in bounded chunks to keep the read loop's peak
//! allocation predictable.
//!
//! ## Features
//!
//! - Blocking GET with a per-request timeout
//! - Chunked body reads (512 KiB by default)
//! - Undoes `Content-Encoding: gzip` applied by proxies or CDNs
//! - No retries; the caller decides whether to re-run the install

use std::io::Read;
use std::time::Duration;

use flate2::read::GzDecoder;
use reqwest::header::CONTENT_ENCODING;
use thiserror::Error;
use tracing::debug;

/// Default size of a single body read.
pub const DEFAULT_CHUNK_SIZE: usize = 512 * 1024;

/// Largest accepted read chunk size; larger values are clamped.
pub const MAX_CHUNK_SIZE: usize = 64 * 1024 * 1024;

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// User agent sent with every request.
const USER_AGENT: &str = concat!("tyup/", env!("CARGO_PKG_VERSION"));

/// Failure while downloading a resource.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The HTTP client could not be constructed.
    #[error("failed to create HTTP client")]
    Client(#[source] reqwest::Error),

    /// DNS, TLS or connection failure.
    #[error("failed to connect to {url}")]
    Request {
        /// The requested URL.
        url: String,
        /// The transport error.
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status.
    #[error("HTTP error {status}: {url}")]
    Status {
        /// The requested URL.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The connection broke while reading the body.
    #[error("failed to read response body from {url}")]
    Read {
        /// The requested URL.
        url: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The body claimed gzip encoding but did not decode.
    #[error("failed to decode gzip response from {url}")]
    Decode {
        /// The requested URL.
        url: String,
        /// The underlying decoder error.
        #[source]
        source: std::io::Error,
    },
}

impl FetchError {
    /// Returns the HTTP status code for status failures.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Source of remote bytes.
///
/// The installer only ever needs "give me the body at this URL", which keeps
/// the network out of unit tests.
pub trait Fetch {
    /// Downloads the full body at `url`.
    ///
    /// # Errors
    ///
    /// Returns a [`FetchError`] on transport failure or non-2xx status.
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// Blocking HTTP fetcher backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
    chunk_size: usize,
}

impl HttpFetcher {
    /// Creates a fetcher with the given timeout and read chunk size.
    ///
    /// A zero `chunk_size` falls back to [`DEFAULT_CHUNK_SIZE`]; anything above
    /// [`MAX_CHUNK_SIZE`] is clamped to it.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Client`] if the TLS backend fails to initialize.
    pub fn new(timeout: Duration, chunk_size: usize) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(FetchError::Client)?;

        Ok(Self {
            client,
            chunk_size: if chunk_size == 0 {
                DEFAULT_CHUNK_SIZE
            } else {
                chunk_size.min(MAX_CHUNK_SIZE)
            },
        })
    }

    /// Returns the configured read chunk size.
    #[must_use]
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }
}

impl Fetch for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        debug!(%url, "sending GET request");

        let mut response = self
            .client
            .get(url)
            .send()
            .map_err(|source| FetchError::Request {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let gzipped = response
            .headers()
            .get(CONTENT_ENCODING)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.trim().eq_ignore_ascii_case("gzip"));

        let data =
            read_chunked(&mut response, self.chunk_size).map_err(|source| FetchError::Read {
                url: url.to_string(),
                source,
            })?;

        debug!(%url, bytes = data.len(), gzipped, "response body received");

        if gzipped {
            return gunzip(&data).map_err(|source| FetchError::Decode {
                url: url.to_string(),
                source,
            });
        }

        Ok(data)
    }
}

/// Reads `reader` to exhaustion using reads of at most `chunk_size` bytes.
fn read_chunked<R: Read>(reader: &mut R, chunk_size: usize) -> std::io::Result<Vec<u8>> {
    let mut data = Vec::new();
    let mut chunk = vec![0u8; chunk_size.max(1)];

    loop {
        match reader.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => data.extend_from_slice(&chunk[..n]),
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }

    Ok(data)
}

fn gunzip(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut decoded = Vec::new();
    GzDecoder::new(data).read_to_end(&mut decoded)?;
    Ok(decoded)
}
