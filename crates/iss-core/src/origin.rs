//! Sources of the raw OEM document.
//!
//! The production origin is NASA's public ISS ephemeris file, fetched
//! with a single HTTP GET. A static origin serves a document held in
//! memory; it backs offline runs (document read from disk at startup)
//! and tests.
//!
//! No retries happen here. A failed fetch surfaces as
//! [`StoreError::OriginUnavailable`] and the caller decides what to do.

use std::path::Path;
use std::time::Duration;

use crate::error::StoreError;

/// Public ISS trajectory data in CCSDS OEM XML form (J2000 frame).
pub const DEFAULT_ORIGIN_URL: &str =
    "https://nasa-public-data.s3.amazonaws.com/iss-coords/current/ISS_OEM/ISS.OEM_J2K_EPH.xml";

/// Where the raw dataset comes from.
///
/// Uses enum dispatch instead of a trait object because async methods
/// are not dyn-compatible.
pub enum Origin {
    /// Fetched over HTTP.
    Http(HttpOrigin),
    /// Held in memory.
    Static(StaticOrigin),
}

impl Origin {
    /// Retrieve the raw document text.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::OriginUnavailable`] if the document cannot be
    /// retrieved.
    pub async fn fetch(&self) -> Result<String, StoreError> {
        match self {
            Self::Http(origin) => origin.fetch().await,
            Self::Static(origin) => Ok(origin.payload.clone()),
        }
    }

    /// Human-readable description for logging.
    pub fn describe(&self) -> String {
        match self {
            Self::Http(origin) => origin.url.clone(),
            Self::Static(_) => "static document".to_owned(),
        }
    }
}

impl From<HttpOrigin> for Origin {
    fn from(origin: HttpOrigin) -> Self {
        Self::Http(origin)
    }
}

impl From<StaticOrigin> for Origin {
    fn from(origin: StaticOrigin) -> Self {
        Self::Static(origin)
    }
}

/// Origin reached with one HTTP GET to a fixed URL.
pub struct HttpOrigin {
    client: reqwest::Client,
    url: String,
}

impl HttpOrigin {
    /// Create an origin for `url` whose requests give up after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::OriginUnavailable`] if the HTTP client cannot
    /// be constructed.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::OriginUnavailable(format!("HTTP client setup failed: {e}")))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    async fn fetch(&self) -> Result<String, StoreError> {
        let response = self.client.get(&self.url).send().await.map_err(|e| {
            StoreError::OriginUnavailable(format!("request to {} failed: {e}", self.url))
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::OriginUnavailable(format!(
                "{} returned {status}",
                self.url
            )));
        }

        let body = response.text().await.map_err(|e| {
            StoreError::OriginUnavailable(format!("reading body from {} failed: {e}", self.url))
        })?;

        tracing::info!(url = %self.url, bytes = body.len(), "Dataset retrieved from origin");
        Ok(body)
    }
}

/// Origin whose document is already in memory.
pub struct StaticOrigin {
    payload: String,
}

impl StaticOrigin {
    /// Serve `payload` as the document.
    pub fn new(payload: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
        }
    }

    /// Read the document from a local file.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::OriginUnavailable`] if the file cannot be read.
    pub async fn from_file(path: &Path) -> Result<Self, StoreError> {
        let payload = tokio::fs::read_to_string(path).await.map_err(|e| {
            StoreError::OriginUnavailable(format!("reading {} failed: {e}", path.display()))
        })?;
        Ok(Self { payload })
    }
}
