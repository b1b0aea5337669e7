use crate::lookup::{CountryLookup, GeoError};
use async_trait::async_trait;
use logscope_core::config::{GeoConfig, GeoEndpoint};
use reqwest::Url;
use std::time::Duration;
use tracing::debug;

/// Host of the IPinfo Lite API.
pub const LITE_BASE_URL: &str = "https://api.ipinfo.io";
/// Host of the standard IPinfo API.
pub const STANDARD_BASE_URL: &str = "https://ipinfo.io";

/// IPinfo client.
///
/// Lite:     `GET {base}/lite/{ip}` → `{"country_code": "US", ...}`
/// Standard: `GET {base}/{ip}/json` → `{"country": "US", ...}`
///
/// A 2xx answer without the country field resolves to `"Unknown"`.
pub struct IpInfoClient {
    client: reqwest::Client,
    token: String,
    base_url: String,
    endpoint: GeoEndpoint,
}

impl IpInfoClient {
    pub fn new(
        token: impl Into<String>,
        endpoint: GeoEndpoint,
        timeout: Duration,
    ) -> Result<Self, GeoError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let base_url = match endpoint {
            GeoEndpoint::Lite => LITE_BASE_URL,
            GeoEndpoint::Standard => STANDARD_BASE_URL,
        };
        Ok(Self {
            client,
            token: token.into(),
            base_url: base_url.to_string(),
            endpoint,
        })
    }

    /// Build from configuration. A configured `base_url` must parse as a URL.
    pub fn from_config(config: &GeoConfig, token: &str) -> Result<Self, GeoError> {
        let client = Self::new(
            token,
            config.endpoint,
            Duration::from_secs(config.timeout_secs),
        )?;
        let client = match &config.base_url {
            Some(url) => client.with_base_url(url),
            None => client,
        };
        Url::parse(&client.base_url)
            .map_err(|e| GeoError::Url(format!("{}: {e}", client.base_url)))?;
        Ok(client)
    }

    /// Point the client at another host (a proxy or a local mock).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    fn url(&self, ip: &str) -> Result<Url, GeoError> {
        let mut url = Url::parse(&self.base_url).map_err(|e| GeoError::Url(e.to_string()))?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| GeoError::Url(format!("{} cannot be a base URL", self.base_url)))?;
            segments.pop_if_empty();
            match self.endpoint {
                GeoEndpoint::Lite => segments.push("lite").push(ip),
                GeoEndpoint::Standard => segments.push(ip).push("json"),
            };
        }
        Ok(url)
    }

    fn country_field(&self) -> &'static str {
        match self.endpoint {
            GeoEndpoint::Lite => "country_code",
            GeoEndpoint::Standard => "country",
        }
    }
}

#[async_trait]
impl CountryLookup for IpInfoClient {
    fn name(&self) -> &str {
        match self.endpoint {
            GeoEndpoint::Lite => "ipinfo-lite",
            GeoEndpoint::Standard => "ipinfo",
        }
    }

    async fn lookup(&self, ip: &str) -> Result<String, GeoError> {
        let url = self.url(ip)?;
        let resp = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(GeoError::Status(status.as_u16()));
        }

        let body: serde_json::Value = resp.json().await?;
        let country = body
            .get(self.country_field())
            .and_then(|v| v.as_str())
            .unwrap_or(crate::enricher::UNKNOWN_COUNTRY)
            .to_string();
        debug!(ip = ip, country = %country, "IPinfo lookup");
        Ok(country)
    }
}
