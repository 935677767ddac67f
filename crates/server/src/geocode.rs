//! City coordinate lookup.
//!
//! Coordinates only decorate the geographic distribution; a failed lookup is
//! never fatal. The engine substitutes [`Coordinates::ZERO`] for any error.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;
use tracing::instrument;
use url::Url;

use crate::config::GeocoderConfig;

/// Errors that can occur when resolving a city.
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// The API found nothing for the query.
    #[error("no result for {0:?}")]
    NoResult(String),

    /// The lookup did not finish in time.
    #[error("lookup timed out")]
    Timeout,

    /// Geocoding is not configured.
    #[error("geocoding disabled (MAP_API not set)")]
    Disabled,

    /// The base URL could not be combined with the request path.
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

/// Latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    /// Fallback used whenever a lookup fails.
    pub const ZERO: Self = Self { lat: 0.0, lng: 0.0 };
}

/// Resolves a city name to coordinates.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn resolve_city(&self, name: &str) -> Result<Coordinates, GeocodeError>;
}

/// Geocoder used when no API key is configured; every lookup fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledGeocoder;

#[async_trait]
impl Geocoder for DisabledGeocoder {
    async fn resolve_city(&self, _name: &str) -> Result<Coordinates, GeocodeError> {
        Err(GeocodeError::Disabled)
    }
}

/// `OpenCage` forward-geocoding client.
#[derive(Clone)]
pub struct OpenCageClient {
    client: reqwest::Client,
    endpoint: Url,
    api_key: SecretString,
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    geometry: Coordinates,
}

impl OpenCageClient {
    /// Create a client against `{base_url}/geocode/v1/json`.
    ///
    /// # Errors
    ///
    /// Returns error if the base URL is invalid or the HTTP client fails to build.
    pub fn new(base_url: &str, api_key: SecretString, timeout: Duration) -> Result<Self, GeocodeError> {
        let endpoint = Url::parse(&format!("{}/geocode/v1/json", base_url.trim_end_matches('/')))?;
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            endpoint,
            api_key,
        })
    }

    fn request_url(&self, name: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("q", name)
            .append_pair("key", self.api_key.expose_secret());
        url
    }
}

#[async_trait]
impl Geocoder for OpenCageClient {
    #[instrument(skip(self))]
    async fn resolve_city(&self, name: &str) -> Result<Coordinates, GeocodeError> {
        // The request URL carries the API key; keep it out of error messages
        let response = self
            .client
            .get(self.request_url(name))
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GeocodeError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: GeocodeResponse = response.json().await.map_err(reqwest::Error::without_url)?;
        body.results
            .into_iter()
            .next()
            .map(|result| result.geometry)
            .ok_or_else(|| GeocodeError::NoResult(name.to_string()))
    }
}

/// Build the geocoder the configuration asks for.
///
/// A missing API key yields [`DisabledGeocoder`]; so does a client that fails
/// to build, after logging the reason.
#[must_use]
pub fn from_config(config: &GeocoderConfig) -> Arc<dyn Geocoder> {
    let Some(api_key) = config.api_key.clone() else {
        tracing::warn!("MAP_API not set; city coordinates will default to (0, 0)");
        return Arc::new(DisabledGeocoder);
    };

    match OpenCageClient::new(&config.base_url, api_key, config.timeout) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            tracing::error!("Failed to create geocoding client: {e}");
            Arc::new(DisabledGeocoder)
        }
    }
}
