//! Google Maps Elevation API client

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use crate::coords::GeoCoord;
use crate::elevation::{ElevationProvider, ElevationResult, ElevationSample};
use crate::error::ElevationError;

/// Public endpoint of the JSON elevation service
pub const DEFAULT_ENDPOINT: &str = "https://maps.googleapis.com/maps/api/elevation/json";

/// Largest `samples` value the service accepts per request
pub const MAX_SAMPLES_PER_REQUEST: usize = 512;

/// Configuration for [`GoogleElevationClient`]
#[derive(Debug, Clone)]
pub struct GoogleElevationConfig {
    pub api_key: Option<String>,
    pub endpoint: String,
    pub timeout: Duration,
}

impl Default for GoogleElevationConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl GoogleElevationConfig {
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Debug, Deserialize)]
struct ElevationResponse {
    #[serde(default)]
    results: Vec<ElevationSample>,
    status: String,
    #[serde(default)]
    error_message: Option<String>,
}

impl ElevationResponse {
    fn into_samples(self) -> ElevationResult<Vec<ElevationSample>> {
        if self.status != "OK" {
            return Err(ElevationError::Rejected {
                message: self.error_message.unwrap_or_else(|| self.status.clone()),
                status: self.status,
            });
        }
        Ok(self.results)
    }
}

/// Elevation lookups against the Google Maps Elevation API
#[derive(Debug, Clone)]
pub struct GoogleElevationClient {
    http: reqwest::Client,
    api_key: String,
    endpoint: String,
}

impl GoogleElevationClient {
    pub fn new(config: GoogleElevationConfig) -> ElevationResult<Self> {
        let api_key = config.api_key.ok_or(ElevationError::MissingApiKey)?;
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            http,
            api_key,
            endpoint: config.endpoint,
        })
    }
}

/// `lat,lng|lat,lng` path parameter
fn encode_path(path: &[GeoCoord; 2]) -> String {
    format!(
        "{},{}|{},{}",
        path[0].lat, path[0].lng, path[1].lat, path[1].lng
    )
}

#[async_trait]
impl ElevationProvider for GoogleElevationClient {
    fn name(&self) -> &str {
        "google"
    }

    async fn elevation_along_path(
        &self,
        path: [GeoCoord; 2],
        samples: usize,
    ) -> ElevationResult<Vec<ElevationSample>> {
        tracing::trace!(samples, path = %encode_path(&path), "Requesting elevation batch");

        let response = self
            .http
            .get(&self.endpoint)
            .query(&[
                ("path", encode_path(&path)),
                ("samples", samples.to_string()),
                ("key", self.api_key.clone()),
            ])
            .send()
            .await?
            .error_for_status()?;

        let body: ElevationResponse = response.json().await?;
        body.into_samples()
    }
}
