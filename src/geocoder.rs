use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

pub const UNKNOWN_LOCATION: &str = "Unknown location";

/// Reverse geocoding: coordinates to a human-readable address.
///
/// Implementations never fail. Any problem degrades to [`UNKNOWN_LOCATION`].
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn resolve(&self, latitude: f64, longitude: f64) -> String;
}

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    display_name: Option<String>,
}

/// Client for a Nominatim-compatible `/reverse` endpoint.
pub struct NominatimGeocoder {
    client: reqwest::Client,
    base_url: String,
}

impl NominatimGeocoder {
    pub fn new(base_url: &str, user_agent: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn lookup(&self, latitude: f64, longitude: f64) -> anyhow::Result<String> {
        let url = format!("{}/reverse", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("format", "jsonv2".to_string()),
                ("lat", latitude.to_string()),
                ("lon", longitude.to_string()),
            ])
            .send()
            .await?
            .error_for_status()?;

        let body: ReverseResponse = response.json().await?;
        body.display_name
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| anyhow::anyhow!("response has no display_name"))
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn resolve(&self, latitude: f64, longitude: f64) -> String {
        match self.lookup(latitude, longitude).await {
            Ok(address) => {
                debug!(latitude, longitude, %address, "Resolved address");
                address
            }
            Err(e) => {
                warn!(latitude, longitude, "Reverse geocoding failed: {:#}", e);
                UNKNOWN_LOCATION.to_string()
            }
        }
    }
}
