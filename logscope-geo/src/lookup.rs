use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GeoError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Lookup service answered with status {0}")]
    Status(u16),

    #[error("Invalid lookup URL: {0}")]
    Url(String),

    /// No lookup service is configured; the answer is unknown, not failed.
    #[error("Geolocation is offline")]
    Offline,
}

/// Resolves an IP address to an ISO 3166-1 alpha-2 country code.
#[async_trait]
pub trait CountryLookup: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    async fn lookup(&self, ip: &str) -> Result<String, GeoError>;
}

/// Lookup used when no API token is available. Only cached answers are used.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineLookup;

#[async_trait]
impl CountryLookup for OfflineLookup {
    fn name(&self) -> &str {
        "offline"
    }

    async fn lookup(&self, _ip: &str) -> Result<String, GeoError> {
        Err(GeoError::Offline)
    }
}
