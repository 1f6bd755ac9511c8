use crate::domain::model::{CoordinatePair, GeocodeResult, GeocodeStatus};
use crate::domain::ports::ReverseGeocoder;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const LOCATIONIQ_REVERSE_URL: &str = "https://us1.locationiq.com/v1/reverse.php";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    display_name: Option<String>,
    address: Option<Address>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
struct Address {
    municipality: Option<String>,
    town: Option<String>,
    city: Option<String>,
    district: Option<String>,
    suburb: Option<String>,
    state: Option<String>,
    country: Option<String>,
    postcode: Option<String>,
    #[serde(flatten)]
    other: serde_json::Map<String, serde_json::Value>,
}

impl Address {
    /// municipality → town → city → district，全部缺少時為 "Unknown"
    fn commune(&self) -> String {
        [&self.municipality, &self.town, &self.city, &self.district]
            .into_iter()
            .flatten()
            .find(|value| !value.is_empty())
            .cloned()
            .unwrap_or_else(|| "Unknown".to_string())
    }
}

fn text(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

/// LocationIQ reverse-geocoding client. One GET per call, no retries.
#[derive(Debug, Clone)]
pub struct LocationIqClient {
    client: Client,
    endpoint: String,
    api_key: String,
    timeout: Duration,
}

impl LocationIqClient {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn parse_success(body: &str) -> Result<GeocodeResult, serde_json::Error> {
        let response: ReverseResponse = serde_json::from_str(body)?;
        let address = response.address.unwrap_or_default();
        let address_debug = serde_json::to_string(&address)?;

        Ok(GeocodeResult {
            commune: address.commune(),
            full_address: response
                .display_name
                .unwrap_or_else(|| "Unknown Address".to_string()),
            country: text(&address.country),
            state: text(&address.state),
            city: text(&address.city),
            postcode: text(&address.postcode),
            municipality: text(&address.municipality),
            town: text(&address.town),
            district: text(&address.district),
            suburb: text(&address.suburb),
            status: GeocodeStatus::Success,
            address_debug: Some(address_debug),
        })
    }
}

#[async_trait]
impl ReverseGeocoder for LocationIqClient {
    async fn reverse_geocode(&self, coordinates: CoordinatePair) -> GeocodeResult {
        let query = [
            ("key", self.api_key.clone()),
            ("lat", coordinates.latitude.to_string()),
            ("lon", coordinates.longitude.to_string()),
            ("format", "json".to_string()),
            ("addressdetails", "1".to_string()),
        ];

        tracing::debug!("Making reverse geocoding request for {}", coordinates);

        let response = match self
            .client
            .get(&self.endpoint)
            .query(&query)
            .timeout(self.timeout)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) if e.is_builder() => {
                return GeocodeResult::failure("Processing Error", format!("Error: {}", e));
            }
            Err(e) => {
                tracing::debug!("Network failure for {}: {}", coordinates, e);
                return GeocodeResult::failure("Network Error", format!("Error: {}", e));
            }
        };

        let status = response.status();
        tracing::debug!("API response status: {}", status);

        if status != StatusCode::OK {
            return GeocodeResult::failure("API Error", format!("Error: {}", status.as_u16()));
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => return GeocodeResult::failure("Network Error", format!("Error: {}", e)),
        };

        match Self::parse_success(&body) {
            Ok(result) => result,
            Err(e) => {
                tracing::debug!("Unexpected response body for {}: {}", coordinates, e);
                GeocodeResult::failure("Processing Error", format!("Error: {}", e))
            }
        }
    }
}
