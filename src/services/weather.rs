use std::sync::Arc;

use chrono::Duration;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::clients::weatherbit::{CurrentWeather, ForecastDay, WeatherbitClient, WeatherbitError};
use crate::db::Store;

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("{0}")]
    Validation(String),

    #[error("search {0} not found")]
    SearchNotFound(i32),

    #[error("city not found")]
    CityNotFound,

    #[error("rate limited by weather provider")]
    RateLimited,

    #[error("weather provider unavailable: {0}")]
    Provider(String),

    #[error(transparent)]
    Database(#[from] anyhow::Error),
}

impl From<WeatherbitError> for LookupError {
    fn from(err: WeatherbitError) -> Self {
        match err {
            WeatherbitError::CityNotFound => Self::CityNotFound,
            WeatherbitError::RateLimited => Self::RateLimited,
            WeatherbitError::Unauthorized | WeatherbitError::Http(_) | WeatherbitError::Api { .. } => {
                Self::Provider(err.to_string())
            }
        }
    }
}

/// Combined provider payload, serialized as-is into the cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherPayload {
    pub current_weather: CurrentWeather,
    pub forecast: Vec<ForecastDay>,
}

/// What a lookup returns to the API layer.
#[derive(Debug, Clone, Serialize)]
pub struct WeatherReport {
    pub search_id: i32,
    pub current_weather: CurrentWeather,
    pub forecast: Vec<ForecastDay>,
}

/// Fetch-or-cache orchestration around the provider and the store.
pub struct WeatherService {
    store: Store,
    client: Arc<WeatherbitClient>,
    freshness: Duration,
    forecast_days: u32,
}

impl WeatherService {
    #[must_use]
    pub fn new(
        store: Store,
        client: Arc<WeatherbitClient>,
        freshness_minutes: i64,
        forecast_days: u32,
    ) -> Self {
        Self {
            store,
            client,
            freshness: Duration::minutes(freshness_minutes),
            forecast_days,
        }
    }

    /// Look up weather for a (city, country) pair, recording the search.
    ///
    /// A repeat search bumps the existing record's timestamp instead of
    /// inserting a duplicate; the cache is keyed on the record's id.
    pub async fn lookup(
        &self,
        user_id: i32,
        city: &str,
        country: &str,
    ) -> Result<WeatherReport, LookupError> {
        let city = city.trim();
        let country = country.trim();

        if city.is_empty() {
            return Err(LookupError::Validation("City is required".to_string()));
        }
        if country.is_empty() {
            return Err(LookupError::Validation("Country is required".to_string()));
        }

        let search_id = self.store.save_search(user_id, city, country).await?;

        self.fetch_or_cache(search_id, city, country).await
    }

    /// Re-run a lookup for an existing history entry. Scoped to the owner;
    /// does not bump the search timestamp.
    pub async fn lookup_saved(
        &self,
        user_id: i32,
        search_id: i32,
    ) -> Result<WeatherReport, LookupError> {
        let record = self
            .store
            .get_search_for_user(user_id, search_id)
            .await?
            .ok_or(LookupError::SearchNotFound(search_id))?;

        self.fetch_or_cache(record.id, &record.city, &record.country)
            .await
    }

    /// Reuse a cache entry younger than the freshness window, otherwise
    /// fetch current conditions plus the daily forecast and overwrite it.
    /// Provider failures are surfaced, never retried.
    async fn fetch_or_cache(
        &self,
        search_id: i32,
        city: &str,
        country: &str,
    ) -> Result<WeatherReport, LookupError> {
        if let Some(raw) = self.store.get_fresh_cache(search_id, self.freshness).await? {
            match serde_json::from_str::<WeatherPayload>(&raw) {
                Ok(payload) => {
                    debug!("Cache hit for search {search_id} ({city}, {country})");
                    return Ok(WeatherReport {
                        search_id,
                        current_weather: payload.current_weather,
                        forecast: payload.forecast,
                    });
                }
                Err(e) => {
                    // Treat an undecodable entry as absent and refetch.
                    warn!("Discarding corrupt cache entry for search {search_id}: {e}");
                }
            }
        }

        info!("Fetching weather for ({city}, {country}), search {search_id}");

        let current_weather = self.client.current(city, country).await?;
        let forecast = self
            .client
            .forecast_daily(city, country, self.forecast_days)
            .await?;

        let payload = WeatherPayload {
            current_weather,
            forecast,
        };

        let raw = serde_json::to_string(&payload).map_err(anyhow::Error::from)?;
        self.store.upsert_cache(search_id, &raw).await?;

        Ok(WeatherReport {
            search_id,
            current_weather: payload.current_weather,
            forecast: payload.forecast,
        })
    }
}
