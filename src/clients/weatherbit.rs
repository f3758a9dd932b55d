use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ProviderConfig;

#[derive(Debug, Error)]
pub enum WeatherbitError {
    #[error("city not found")]
    CityNotFound,

    #[error("rate limited by provider")]
    RateLimited,

    #[error("provider rejected the API key")]
    Unauthorized,

    #[error("provider request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider error: {status} - {body}")]
    Api { status: StatusCode, body: String },
}

/// Weatherbit wraps every payload in a `data` envelope.
#[derive(Debug, Deserialize)]
struct WeatherbitResponse<T> {
    data: T,
}

/// Current-conditions snapshot, passed through verbatim from the provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentWeather {
    pub city_name: String,
    pub country_code: String,
    pub temp: f64,
    pub app_temp: f64,
    pub weather: WeatherCondition,
    pub wind_spd: f64,
    pub rh: f64,
    pub aqi: Option<f64>,
    pub ob_time: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherCondition {
    pub description: String,
}

/// One day of the daily forecast.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastDay {
    pub datetime: String,
    pub max_temp: f64,
    pub min_temp: f64,
    pub weather: WeatherCondition,
    pub precip: f64,
    pub uv: f64,
    pub wind_cdir_full: String,
    pub wind_spd: f64,
}

#[derive(Clone)]
pub struct WeatherbitClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl WeatherbitClient {
    #[must_use]
    pub fn new(config: &ProviderConfig) -> Self {
        Self::with_shared_client(Client::new(), config)
    }

    #[must_use]
    pub fn with_shared_client(client: Client, config: &ProviderConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        }
    }

    /// GET /current for a (city, country) pair.
    /// The provider returns a single-element `data` array; an empty array
    /// on 200 means the place is unknown.
    pub async fn current(
        &self,
        city: &str,
        country: &str,
    ) -> Result<CurrentWeather, WeatherbitError> {
        let url = format!("{}/current", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("city", city), ("country", country), ("key", &self.api_key)])
            .send()
            .await?;

        let response = Self::check_status(response).await?;

        let envelope: WeatherbitResponse<Vec<CurrentWeather>> = response.json().await?;

        envelope
            .data
            .into_iter()
            .next()
            .ok_or(WeatherbitError::CityNotFound)
    }

    /// GET /forecast/daily for a (city, country) pair.
    pub async fn forecast_daily(
        &self,
        city: &str,
        country: &str,
        days: u32,
    ) -> Result<Vec<ForecastDay>, WeatherbitError> {
        let url = format!("{}/forecast/daily", self.base_url);
        let days = days.to_string();
        let response = self
            .client
            .get(&url)
            .query(&[
                ("city", city),
                ("country", country),
                ("key", &self.api_key),
                ("days", days.as_str()),
            ])
            .send()
            .await?;

        let response = Self::check_status(response).await?;

        let envelope: WeatherbitResponse<Vec<ForecastDay>> = response.json().await?;

        Ok(envelope.data)
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, WeatherbitError> {
        match response.status() {
            StatusCode::NOT_FOUND | StatusCode::NO_CONTENT => Err(WeatherbitError::CityNotFound),
            StatusCode::TOO_MANY_REQUESTS => Err(WeatherbitError::RateLimited),
            StatusCode::FORBIDDEN | StatusCode::UNAUTHORIZED => Err(WeatherbitError::Unauthorized),
            status if !status.is_success() => {
                let body = response.text().await.unwrap_or_default();
                Err(WeatherbitError::Api { status, body })
            }
            _ => Ok(response),
        }
    }
}
