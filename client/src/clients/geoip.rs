use log::{error, info};
use serde::{Deserialize, Serialize};

use super::error::ClientError;

pub const GEOIP_URL: &str = "http://ip-api.com/json/";

/// Approximate location of the caller
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub city: Option<String>,
    pub country: Option<String>,
    pub country_code: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeoIpResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    country: Option<String>,
    #[serde(default)]
    country_code: Option<String>,
}

impl GeoIpResponse {
    fn into_location(self) -> Result<Location, ClientError> {
        if self.status == "fail" {
            return Err(ClientError::Backend {
                status: 200,
                message: format!(
                    "GeoIP API error: {}",
                    self.message.as_deref().unwrap_or("Unknown")
                ),
            });
        }
        Ok(Location {
            city: self.city.filter(|c| !c.is_empty()),
            country: self.country.filter(|c| !c.is_empty()),
            country_code: self.country_code.filter(|c| !c.is_empty()),
        })
    }
}

/// IP geolocation lookup. Unauthenticated, no credential is ever sent.
pub struct GeoIpClient {
    http: reqwest::Client,
    url: String,
}

impl GeoIpClient {
    pub fn new(http: reqwest::Client) -> Self {
        Self::with_url(http, GEOIP_URL)
    }

    pub fn with_url(http: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
        }
    }

    pub async fn locate(&self) -> Result<Location, ClientError> {
        let response = self.http.get(&self.url).send().await.map_err(|e| {
            error!("GeoIP request error: {}", e);
            ClientError::from(e)
        })?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ClientError::from_response(status, &body));
        }

        let parsed: GeoIpResponse =
            serde_json::from_str(&body).map_err(|e| ClientError::Decode(e.to_string()))?;
        let location = parsed.into_location()?;
        info!(
            "Located caller: {}, {}",
            location.city.as_deref().unwrap_or("N/A"),
            location.country.as_deref().unwrap_or("N/A")
        );
        Ok(location)
    }
}
